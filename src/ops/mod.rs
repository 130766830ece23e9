//! High-level operations.
//!
//! This module contains the implementation of a frontend build invocation.

pub mod netapp_build;

pub use netapp_build::{build, resolve, resolve_parameters, BuildResult, EXPORTER_IMAGE_CONFIG_KEY};
