//! Shared utilities

pub mod config;
pub mod context;
pub mod diagnostic;
pub mod hash;

pub use config::FrontendConfig;
pub use context::GlobalContext;
pub use diagnostic::Diagnostic;
