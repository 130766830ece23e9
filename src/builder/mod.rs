//! Stage graph construction and execution plumbing.
//!
//! This module builds the restore/compile/publish/package graph, the metadata
//! probe, and the final image config, and defines the gateway they are
//! submitted through.

pub mod executor;
pub mod graph;
pub mod image;
pub mod plan;
pub mod probe;
pub mod template;
pub mod toolchain;

pub use executor::{Gateway, GatewayError, LocalGateway, LocalRef, Session};
pub use graph::{Definition, GraphError, Platform, State};
pub use image::{synthesize, ImageConfig};
pub use plan::StagePlan;
pub use probe::MetadataProbe;
pub use toolchain::{CommandSpec, DotnetCli};
