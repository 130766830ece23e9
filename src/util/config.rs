//! Frontend configuration.
//!
//! Every fixed value the frontend relies on (base images, well-known paths,
//! default configuration, option defaults) lives in [`FrontendConfig`] and is
//! passed explicitly into each component.
//!
//! Configuration files are layered:
//! - Global: `~/.netapp/config.toml` - User-wide defaults
//! - Project: `.netapp/config.toml` - Project-specific overrides
//! - Explicit: `--config <file>` - Highest precedence
//!
//! A layer only overrides the fields it sets.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::graph::Platform;

/// .NET SDK image used for restore/build/publish stages.
pub const DEFAULT_SDK_IMAGE: &str = "mcr.microsoft.com/dotnet/sdk:5.0";

/// ASP.NET runtime image used for the final package stage.
pub const DEFAULT_RUNTIME_IMAGE: &str = "mcr.microsoft.com/dotnet/aspnet:5.0";

/// Build configuration used when neither options nor manifest name one.
pub const DEFAULT_CONFIGURATION: &str = "Release";

/// Effective configuration for a build invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontendConfig {
    /// Image providing the .NET SDK
    pub sdk_image: String,

    /// Slim image the application runs on
    pub runtime_image: String,

    /// Application directory in the runtime image
    pub app_dir: String,

    /// Directory receiving the probe's MSBuild extension file
    pub meta_dir: String,

    /// Working directory for restore and compile stages
    pub source_dir: String,

    /// Fallback build configuration
    pub default_configuration: String,

    /// Command that launches the published assembly
    pub launcher: String,

    /// Port always exposed by the produced image
    pub exposed_port: String,

    /// Pattern used to infer the project file
    pub project_pattern: String,

    /// Target platform for every marshalled graph
    pub platform: Platform,

    /// Source name used when `contextkey` is not given
    pub default_context_name: String,

    /// Source name used when `dockerfilekey` is not given
    pub default_dockerfile_name: String,

    /// Manifest filename used when `filename` is not given
    pub default_filename: String,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        FrontendConfig {
            sdk_image: DEFAULT_SDK_IMAGE.to_string(),
            runtime_image: DEFAULT_RUNTIME_IMAGE.to_string(),
            app_dir: "/app".to_string(),
            meta_dir: "/meta".to_string(),
            source_dir: "/src".to_string(),
            default_configuration: DEFAULT_CONFIGURATION.to_string(),
            launcher: "dotnet".to_string(),
            exposed_port: "80/tcp".to_string(),
            project_pattern: "*.*proj".to_string(),
            platform: Platform::linux_amd64(),
            default_context_name: "context".to_string(),
            default_dockerfile_name: "dockerfile".to_string(),
            default_filename: "Dockerfile".to_string(),
        }
    }
}

impl FrontendConfig {
    /// Output directory of the compile stage.
    pub fn build_dir(&self) -> String {
        join(&self.app_dir, "build")
    }

    /// Output directory of the publish stage.
    pub fn publish_dir(&self) -> String {
        join(&self.app_dir, "publish")
    }

    /// Location of the injected MSBuild extension file.
    pub fn probe_targets_path(&self) -> String {
        join(&self.meta_dir, "GetProjectProperties.targets")
    }

    /// File the probe writes its metadata to.
    pub fn probe_output_path(&self) -> String {
        join(&self.app_dir, "meta.out")
    }

    /// Apply a configuration file layer on top of this config.
    pub fn merge(&mut self, other: ConfigFile) {
        // Images
        if let Some(sdk) = other.images.sdk {
            self.sdk_image = sdk;
        }
        if let Some(runtime) = other.images.runtime {
            self.runtime_image = runtime;
        }

        // Paths
        if let Some(app) = other.paths.app {
            self.app_dir = app;
        }
        if let Some(meta) = other.paths.meta {
            self.meta_dir = meta;
        }
        if let Some(source) = other.paths.source {
            self.source_dir = source;
        }

        // Build settings
        if let Some(configuration) = other.build.configuration {
            self.default_configuration = configuration;
        }
        if let Some(launcher) = other.build.launcher {
            self.launcher = launcher;
        }
        if let Some(port) = other.build.port {
            self.exposed_port = port;
        }
        if let Some(pattern) = other.build.project_pattern {
            self.project_pattern = pattern;
        }
        if let Some(platform) = other.build.platform {
            self.platform = platform;
        }

        // Source names
        if let Some(context) = other.sources.context {
            self.default_context_name = context;
        }
        if let Some(dockerfile) = other.sources.dockerfile {
            self.default_dockerfile_name = dockerfile;
        }
        if let Some(filename) = other.sources.filename {
            self.default_filename = filename;
        }
    }
}

/// One configuration file, as written on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Base images
    pub images: ImagesConfig,

    /// Well-known paths inside the build and runtime images
    pub paths: PathsConfig,

    /// Build settings
    pub build: BuildConfig,

    /// Source names and manifest filename
    pub sources: SourcesConfig,
}

/// `[images]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    pub sdk: Option<String>,
    pub runtime: Option<String>,
}

/// `[paths]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub app: Option<String>,
    pub meta: Option<String>,
    pub source: Option<String>,
}

/// `[build]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildConfig {
    /// Default build configuration (e.g. "Release")
    pub configuration: Option<String>,

    /// Launcher command placed first in the entrypoint
    pub launcher: Option<String>,

    /// Port exposed by the produced image (e.g. "80/tcp")
    pub port: Option<String>,

    /// Glob used for project inference
    pub project_pattern: Option<String>,

    /// Target platform, written as `os/arch[/variant]`
    pub platform: Option<Platform>,
}

/// `[sources]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub context: Option<String>,
    pub dockerfile: Option<String>,
    pub filename: Option<String>,
}

impl ConfigFile {
    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.netapp/config.toml)
/// 2. Global config (~/.netapp/config.toml)
/// 3. Built-in defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> FrontendConfig {
    let mut config = FrontendConfig::default();

    if let Some(global_path) = global_path {
        config.merge(ConfigFile::load_or_default(global_path));
    }

    config.merge(ConfigFile::load_or_default(project_path));

    config
}

fn join(base: &str, name: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), name)
}
