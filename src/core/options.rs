//! Invocation options.

use std::collections::BTreeMap;

use crate::util::config::FrontendConfig;

/// Option naming the build-context source.
pub const KEY_CONTEXT: &str = "contextkey";
/// Option naming the source holding the manifest.
pub const KEY_DOCKERFILE: &str = "dockerfilekey";
/// Option naming the manifest file.
pub const KEY_FILENAME: &str = "filename";
pub const KEY_PROJECT: &str = "project";
pub const KEY_CONFIGURATION: &str = "configuration";
pub const KEY_ASSEMBLY: &str = "assembly";

/// Every option the frontend reads.
pub const KNOWN_KEYS: [&str; 6] = [
    KEY_CONTEXT,
    KEY_DOCKERFILE,
    KEY_FILENAME,
    KEY_PROJECT,
    KEY_CONFIGURATION,
    KEY_ASSEMBLY,
];

/// Whether the frontend reads the named option.
pub fn is_known_key(key: &str) -> bool {
    KNOWN_KEYS.contains(&key)
}

/// Options supplied by the invoker, plus the session they belong to.
///
/// Source names, `filename` and `project` treat an empty value as missing.
/// `configuration` and `assembly` report any present value, empty or not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOpts {
    session_id: String,
    values: BTreeMap<String, String>,
}

impl BuildOpts {
    pub fn new(session_id: impl Into<String>) -> Self {
        BuildOpts {
            session_id: session_id.into(),
            values: BTreeMap::new(),
        }
    }

    /// Set an option.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Set several options.
    pub fn extend<K, V>(mut self, values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values
            .extend(values.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Get a non-empty option value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Get an option value if present, even when empty.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Name of the build-context source.
    pub fn context_name<'a>(&'a self, config: &'a FrontendConfig) -> &'a str {
        self.get(KEY_CONTEXT)
            .unwrap_or(config.default_context_name.as_str())
    }

    /// Name of the source holding the manifest.
    pub fn dockerfile_name<'a>(&'a self, config: &'a FrontendConfig) -> &'a str {
        self.get(KEY_DOCKERFILE)
            .unwrap_or(config.default_dockerfile_name.as_str())
    }

    /// Manifest filename.
    pub fn filename<'a>(&'a self, config: &'a FrontendConfig) -> &'a str {
        self.get(KEY_FILENAME)
            .unwrap_or(config.default_filename.as_str())
    }

    pub fn project(&self) -> Option<&str> {
        self.get(KEY_PROJECT)
    }

    /// Present `configuration` option, possibly empty.
    pub fn configuration(&self) -> Option<&str> {
        self.raw(KEY_CONFIGURATION)
    }

    /// Present `assembly` option, possibly empty.
    pub fn assembly(&self) -> Option<&str> {
        self.raw(KEY_ASSEMBLY)
    }
}

/// Parse a `key=value` option argument.
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected `key=value`, got `{}`", s)),
    }
}
