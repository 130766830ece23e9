//! Build parameter resolution.
//!
//! Every parameter is resolved from an ordered chain: invocation option, then
//! manifest, then a computed value (configured default, project inference or
//! the metadata probe). The resolver is pure apart from the computed layers,
//! which are only evaluated when every earlier layer is empty.

pub mod fallback;
pub mod resolve;

pub use fallback::{Fallbacks, Origin, Resolved};
pub use resolve::Resolver;
