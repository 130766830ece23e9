//! Core data structures for the frontend.
//!
//! This module contains the foundational types used throughout the frontend:
//! - The build manifest
//! - Invocation options
//! - Resolved build parameters
//! - The error taxonomy

pub mod error;
pub mod manifest;
pub mod options;
pub mod params;

pub use error::{BuildFailure, FrontendError, Stage};
pub use manifest::Manifest;
pub use options::BuildOpts;
pub use params::ResolvedBuildParameters;
