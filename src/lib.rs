//! netapp - a container build frontend for .NET applications
//!
//! This crate turns a small YAML manifest into a multi-stage build graph
//! (restore, compile, publish, package) for an external graph executor, and
//! synthesizes the runtime configuration of the produced image.

pub mod builder;
pub mod core;
pub mod ops;
pub mod resolver;
pub mod sources;
pub mod util;

/// Test utilities and mocks for frontend unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides an in-memory gateway standing in for the
/// external executor.
#[cfg(test)]
pub mod test_support;

pub use builder::{Definition, Gateway, LocalGateway, Session};
pub use core::{BuildFailure, BuildOpts, FrontendError, Manifest, ResolvedBuildParameters};
pub use ops::{build, BuildResult};
pub use util::config::FrontendConfig;
pub use util::context::GlobalContext;
