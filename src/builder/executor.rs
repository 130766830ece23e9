//! Gateway to the external build-graph executor.
//!
//! The frontend never executes anything itself. It resolves sources, submits
//! definitions and fetches image configs through a [`Gateway`], and every call
//! goes through a [`Session`] so a cancelled invocation stops before the next
//! external request.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::builder::graph::{Definition, Op, Platform, SourceOp};
use crate::sources::{ContentSource, DirEntry, LocalSource, PathSource};

/// Error reported by the external executor.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request cancelled")]
    Cancelled,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Failed(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The executor the frontend talks to.
pub trait Gateway {
    /// Reference to solved or resolved content.
    type Ref: ContentSource;

    /// Resolve a named local source of the invocation.
    fn resolve_local(&self, source: &LocalSource) -> Result<Self::Ref, GatewayError>;

    /// Submit a definition and wait for its result.
    fn solve(&self, definition: &Definition) -> Result<Self::Ref, GatewayError>;

    /// Fetch the raw config JSON of an image for a platform.
    fn resolve_image_config(
        &self,
        image: &str,
        platform: &Platform,
    ) -> Result<Vec<u8>, GatewayError>;
}

/// A single build invocation.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    cancelled: Arc<AtomicBool>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Session {
            id: id.into(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Request cancellation. Clones of the session observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fail with [`GatewayError::Cancelled`] once cancellation was requested.
    pub fn check(&self) -> Result<(), GatewayError> {
        if self.is_cancelled() {
            tracing::debug!(session = %self.id, "session cancelled");
            Err(GatewayError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Reference returned by [`LocalGateway`].
#[derive(Debug, Clone)]
pub enum LocalRef {
    /// A directory on disk
    Path(PathSource),

    /// A definition that was recorded but not executed
    Planned { terminal: String },
}

impl ContentSource for LocalRef {
    fn read_file(&self, path: &str) -> Result<Vec<u8>, GatewayError> {
        match self {
            LocalRef::Path(source) => source.read_file(path),
            LocalRef::Planned { terminal } => Err(GatewayError::Unsupported(format!(
                "`{}` was planned but not executed, cannot read `{}`",
                terminal, path
            ))),
        }
    }

    fn read_dir(&self, path: &str, include_pattern: &str) -> Result<Vec<DirEntry>, GatewayError> {
        match self {
            LocalRef::Path(source) => source.read_dir(path, include_pattern),
            LocalRef::Planned { terminal } => Err(GatewayError::Unsupported(format!(
                "`{}` was planned but not executed, cannot list `{}`",
                terminal, path
            ))),
        }
    }
}

/// A dry-run gateway backed by local directories.
///
/// Local sources map onto directories and image configs onto JSON files.
/// Definitions are recorded, and graphs that only copy local content are
/// materialized as the copied directory. Anything that runs a command is
/// planned, never executed.
#[derive(Debug, Default)]
pub struct LocalGateway {
    locals: HashMap<String, PathBuf>,
    image_configs: HashMap<String, PathBuf>,
    solved: Mutex<Vec<Definition>>,
}

impl LocalGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve a local source from a directory.
    pub fn register_local(mut self, name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        self.locals.insert(name.into(), dir.into());
        self
    }

    /// Serve the config of an image from a JSON file.
    pub fn register_image_config(
        mut self,
        image: impl Into<String>,
        file: impl Into<PathBuf>,
    ) -> Self {
        self.image_configs.insert(image.into(), file.into());
        self
    }

    /// Every definition submitted so far.
    pub fn solved(&self) -> Vec<Definition> {
        match self.solved.lock() {
            Ok(solved) => solved.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Gateway for LocalGateway {
    type Ref = LocalRef;

    fn resolve_local(&self, source: &LocalSource) -> Result<LocalRef, GatewayError> {
        let dir = self.locals.get(&source.name).ok_or_else(|| {
            GatewayError::NotFound(format!("no local source named `{}`", source.name))
        })?;

        if !dir.is_dir() {
            return Err(GatewayError::NotFound(format!(
                "local source `{}` ({}) is not a directory",
                source.name,
                dir.display()
            )));
        }

        Ok(LocalRef::Path(PathSource::new(dir, source.clone())))
    }

    fn solve(&self, definition: &Definition) -> Result<LocalRef, GatewayError> {
        tracing::debug!(
            terminal = %definition.terminal,
            nodes = definition.len(),
            "recording definition"
        );

        match self.solved.lock() {
            Ok(mut solved) => solved.push(definition.clone()),
            Err(poisoned) => poisoned.into_inner().push(definition.clone()),
        }

        // A bare local source needs no execution.
        if let Some(node) = definition.terminal_node() {
            if let Op::Source {
                source: SourceOp::Local(ref local),
            } = node.op
            {
                return self.resolve_local(local);
            }
        }

        Ok(LocalRef::Planned {
            terminal: definition.terminal.clone(),
        })
    }

    fn resolve_image_config(
        &self,
        image: &str,
        _platform: &Platform,
    ) -> Result<Vec<u8>, GatewayError> {
        let file = self
            .image_configs
            .get(image)
            .ok_or_else(|| GatewayError::NotFound(format!("no config registered for `{}`", image)))?;

        fs::read(file).map_err(GatewayError::from)
    }
}
