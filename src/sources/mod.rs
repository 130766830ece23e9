//! Content sources.
//!
//! Sources provide file content and directory listings to the frontend:
//! named local sources of an invocation, and the outputs of solved graphs.

pub mod path;
pub mod source;

pub use path::PathSource;
pub use source::{ContentSource, DirEntry, LocalSource};
