//! Global context for frontend invocations.
//!
//! Provides centralized access to configuration locations and the working
//! directory the CLI was started from.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::BaseDirs;

use crate::util::config::{load_config, ConfigFile, FrontendConfig};

/// Name of the per-user and per-project configuration directory.
pub const CONFIG_DIR_NAME: &str = ".netapp";

/// Global context shared by CLI commands.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// User configuration directory (~/.netapp), if a home directory exists
    home_dir: Option<PathBuf>,
}

impl GlobalContext {
    /// Create a context rooted at the process working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a context rooted at an explicit directory.
    pub fn with_cwd(cwd: impl Into<PathBuf>) -> Self {
        GlobalContext {
            cwd: cwd.into(),
            home_dir: BaseDirs::new().map(|b| b.home_dir().join(CONFIG_DIR_NAME)),
        }
    }

    /// Override the user configuration directory.
    pub fn with_home_dir(mut self, home_dir: Option<PathBuf>) -> Self {
        self.home_dir = home_dir;
        self
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Path to the global config file (~/.netapp/config.toml).
    pub fn config_path(&self) -> Option<PathBuf> {
        self.home_dir.as_ref().map(|dir| dir.join("config.toml"))
    }

    /// Path to the project config file (.netapp/config.toml).
    pub fn project_config_path(&self) -> PathBuf {
        self.cwd.join(CONFIG_DIR_NAME).join("config.toml")
    }

    /// Resolve a possibly relative path against the working directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    /// Load the effective configuration.
    ///
    /// An explicitly named file must exist and parse; it is applied last.
    pub fn load_config(&self, explicit: Option<&Path>) -> Result<FrontendConfig> {
        let global = self.config_path();
        let mut config = load_config(global.as_deref(), &self.project_config_path());

        if let Some(path) = explicit {
            let path = self.resolve_path(path);
            config.merge(ConfigFile::load(&path)?);
            tracing::debug!("applied config overrides from {}", path.display());
        }

        Ok(config)
    }
}
