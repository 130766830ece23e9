//! Build manifest parsing and loading.
//!
//! The manifest takes the place of a Dockerfile in the build's dockerfile
//! source. It is a small YAML mapping:
//!
//! ```yaml
//! project: src/MyApp/MyApp.csproj
//! configuration: Release
//! assembly: MyApp.dll
//! ```
//!
//! Every field is optional and unknown keys are ignored. Each key may also be
//! written capitalized (`Project:`), but giving both spellings of the same key
//! is a parse error.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::builder::executor::{Gateway, Session};
use crate::core::error::{FrontendError, Result};
use crate::core::options::BuildOpts;
use crate::sources::{ContentSource, LocalSource};
use crate::util::config::FrontendConfig;

/// Parsed build manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Manifest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assembly: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

/// Raw manifest as read from YAML.
#[derive(Debug, Default, Deserialize)]
struct RawManifest {
    #[serde(default, alias = "Assembly")]
    assembly: Option<Value>,

    #[serde(default, alias = "Configuration")]
    configuration: Option<Value>,

    #[serde(default, alias = "Project")]
    project: Option<Value>,
}

impl Manifest {
    /// Fetch and parse the manifest named by the invocation options.
    pub fn fetch<G: Gateway>(
        gateway: &G,
        session: &Session,
        opts: &BuildOpts,
        config: &FrontendConfig,
    ) -> Result<Self> {
        let source_name = opts.dockerfile_name(config);
        let filename = opts.filename(config);
        let unavailable = |reason: String| FrontendError::SourceUnavailable {
            source_name: source_name.to_string(),
            reason,
        };

        tracing::debug!(source = source_name, filename, "loading manifest");

        let source = LocalSource::new(source_name, session.id()).follow_paths([filename]);

        session.check().map_err(|_| FrontendError::Cancelled)?;
        let reference = gateway
            .resolve_local(&source)
            .map_err(|e| FrontendError::from_gateway(e, |e| unavailable(e.to_string())))?;

        session.check().map_err(|_| FrontendError::Cancelled)?;
        let content = reference.read_file(filename).map_err(|e| {
            FrontendError::from_gateway(e, |e| {
                unavailable(format!("failed to read `{}`: {}", filename, e))
            })
        })?;

        Self::parse(&content, filename)
    }

    /// Parse manifest bytes.
    ///
    /// Zero bytes is an error, whitespace alone yields an empty manifest.
    pub fn parse(content: &[u8], filename: &str) -> Result<Self> {
        if content.is_empty() {
            return Err(FrontendError::EmptyManifest {
                filename: filename.to_string(),
            });
        }

        let parse_error = |reason: String| FrontendError::ManifestParseError {
            filename: filename.to_string(),
            reason,
        };

        let value: Value = serde_yaml::from_slice(content).map_err(|e| parse_error(e.to_string()))?;

        let raw = match value {
            Value::Null => RawManifest::default(),
            Value::Mapping(_) => {
                serde_yaml::from_value(value).map_err(|e| parse_error(e.to_string()))?
            }
            other => {
                return Err(parse_error(format!(
                    "expected a mapping, found {}",
                    describe(&other)
                )))
            }
        };

        Ok(Manifest {
            assembly: scalar(raw.assembly, "assembly").map_err(parse_error)?,
            configuration: scalar(raw.configuration, "configuration").map_err(parse_error)?,
            project: scalar(raw.project, "project").map_err(parse_error)?,
        })
    }

    pub fn assembly(&self) -> Option<&str> {
        self.assembly.as_deref()
    }

    pub fn configuration(&self) -> Option<&str> {
        self.configuration.as_deref()
    }

    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }
}

/// Convert a YAML scalar to its string form.
fn scalar(value: Option<Value>, field: &str) -> std::result::Result<Option<String>, String> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(format!(
            "`{}` must be a string, found {}",
            field,
            describe(&other)
        )),
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
