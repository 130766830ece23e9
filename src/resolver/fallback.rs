//! Ordered precedence chains.
//!
//! A value is resolved by walking layers from highest to lowest precedence.
//! The first [`layer`](Fallbacks::layer) holding a non-empty value wins, so
//! `--opt project=` falls through to the manifest.
//!
//! An [`overriding`](Fallbacks::overriding) layer settles the chain as soon as
//! its value is present. When that value is empty the remaining plain layers
//! are skipped and the final default or computation supplies the value.
//!
//! ```ignore
//! let project = Fallbacks::new("project")
//!     .layer(Origin::Option, opts.project())
//!     .layer(Origin::Manifest, manifest.project())
//!     .or_else_try(Origin::Inferred, || infer())?;
//!
//! let configuration = Fallbacks::new("configuration")
//!     .overriding(Origin::Option, opts.configuration())
//!     .layer(Origin::Manifest, manifest.configuration())
//!     .or_default(Origin::Default, "Release");
//! ```

use std::fmt;

use serde::Serialize;

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// An invocation option
    Option,
    /// The manifest
    Manifest,
    /// A configured default
    Default,
    /// Inferred from the build context
    Inferred,
    /// Reported by the metadata probe
    Probe,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Origin::Option => "option",
            Origin::Manifest => "manifest",
            Origin::Default => "default",
            Origin::Inferred => "inferred",
            Origin::Probe => "probe",
        };
        f.write_str(name)
    }
}

/// A value together with its origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolved {
    pub value: String,
    pub origin: Origin,
}

impl Resolved {
    pub fn new(value: impl Into<String>, origin: Origin) -> Self {
        Resolved {
            value: value.into(),
            origin,
        }
    }
}

/// A precedence chain for a single field.
#[derive(Debug, Clone)]
pub struct Fallbacks {
    field: &'static str,
    found: Option<Resolved>,
    settled: bool,
}

impl Fallbacks {
    /// Start a chain for the named field.
    pub fn new(field: &'static str) -> Self {
        Fallbacks {
            field,
            found: None,
            settled: false,
        }
    }

    /// Add a layer. Ignored once an earlier layer settled the chain.
    pub fn layer(mut self, origin: Origin, value: Option<&str>) -> Self {
        if !self.settled {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                self.found = Some(Resolved::new(value, origin));
                self.settled = true;
            }
        }
        self
    }

    /// Add a layer that settles the chain whenever its value is present.
    ///
    /// A present but empty value skips every later plain layer.
    pub fn overriding(mut self, origin: Origin, value: Option<&str>) -> Self {
        if !self.settled {
            if let Some(value) = value {
                if value.is_empty() {
                    tracing::debug!(field = self.field, %origin, "empty override skips lower layers");
                } else {
                    self.found = Some(Resolved::new(value, origin));
                }
                self.settled = true;
            }
        }
        self
    }

    /// End the chain with an infallible default.
    pub fn or_default(self, origin: Origin, default: &str) -> Resolved {
        let field = self.field;
        let resolved = self
            .found
            .unwrap_or_else(|| Resolved::new(default, origin));
        log_resolved(field, &resolved);
        resolved
    }

    /// End the chain with a lazy, fallible computation.
    ///
    /// `compute` only runs when no earlier layer supplied a value. An empty
    /// computed value is returned as-is; callers decide whether that is an error.
    pub fn or_else_try<E>(
        self,
        origin: Origin,
        compute: impl FnOnce() -> Result<String, E>,
    ) -> Result<Resolved, E> {
        let field = self.field;
        let resolved = match self.found {
            Some(found) => found,
            None => {
                tracing::debug!(field, %origin, "falling back to computed value");
                Resolved::new(compute()?, origin)
            }
        };
        log_resolved(field, &resolved);
        Ok(resolved)
    }

    /// End the chain without a final layer.
    pub fn finish(self) -> Option<Resolved> {
        if let Some(ref resolved) = self.found {
            log_resolved(self.field, resolved);
        }
        self.found
    }
}

fn log_resolved(field: &str, resolved: &Resolved) {
    tracing::debug!(
        field,
        value = %resolved.value,
        origin = %resolved.origin,
        "resolved build parameter"
    );
}
