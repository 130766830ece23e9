//! Test utilities and mocks for frontend unit tests.
//!
//! [`MockGateway`] stands in for the external executor: it serves in-memory
//! local sources and image configs, and records every resolved source,
//! directory listing and submitted definition so tests can assert on what the
//! frontend asked for.
//!
//! # Example
//!
//! ```rust,ignore
//! use netapp::test_support::MockGateway;
//!
//! let gateway = MockGateway::new()
//!     .with_file("dockerfile", "Dockerfile", "project: app.csproj\n")
//!     .with_solve_output("/app/meta.out", "assembly: \"app.dll\"\n");
//! ```

pub mod fixtures;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use crate::builder::executor::{Gateway, GatewayError};
use crate::builder::graph::{Definition, Platform};
use crate::sources::{ContentSource, DirEntry, LocalSource};

// Re-export fixtures for convenience
pub use fixtures::*;

fn lock<T: Clone>(m: &Mutex<T>) -> T {
    match m.lock() {
        Ok(v) => v.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

fn push<T>(m: &Mutex<Vec<T>>, value: T) {
    match m.lock() {
        Ok(mut v) => v.push(value),
        Err(poisoned) => poisoned.into_inner().push(value),
    }
}

/// In-memory content source.
#[derive(Debug, Clone, Default)]
pub struct MockSource {
    files: BTreeMap<String, Vec<u8>>,
    entries: Option<Vec<DirEntry>>,
    scope: Option<LocalSource>,
    listed: Arc<Mutex<Vec<String>>>,
}

/// Reference type returned by [`MockGateway`].
pub type MockRef = MockSource;

fn normalize(path: &str) -> &str {
    path.strip_prefix("./").unwrap_or(path)
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file.
    pub fn with_file(mut self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.files.insert(normalize(path).to_string(), content.into());
        self
    }

    /// Set the listing returned for any directory.
    ///
    /// Entries are returned as given, the way an executor returns an
    /// already-filtered listing.
    pub fn with_entries(mut self, entries: Vec<DirEntry>) -> Self {
        self.entries = Some(entries);
        self
    }
}

impl ContentSource for MockSource {
    fn read_file(&self, path: &str) -> Result<Vec<u8>, GatewayError> {
        if let Some(ref scope) = self.scope {
            if !scope.is_followed(path) {
                return Err(GatewayError::NotFound(path.to_string()));
            }
        }
        self.files
            .get(normalize(path))
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(path.to_string()))
    }

    fn read_dir(&self, path: &str, include_pattern: &str) -> Result<Vec<DirEntry>, GatewayError> {
        push(&self.listed, include_pattern.to_string());
        self.entries
            .clone()
            .ok_or_else(|| GatewayError::NotFound(path.to_string()))
    }
}

/// Mock executor for testing build invocations.
#[derive(Debug, Default)]
pub struct MockGateway {
    sources: HashMap<String, MockSource>,
    image_configs: HashMap<String, Vec<u8>>,
    solve_output: MockSource,
    solve_error: Option<String>,
    solved: Mutex<Vec<Definition>>,
    resolved: Mutex<Vec<LocalSource>>,
    listed: Arc<Mutex<Vec<String>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn source_mut(&mut self, name: &str) -> &mut MockSource {
        let listed = Arc::clone(&self.listed);
        self.sources
            .entry(name.to_string())
            .or_insert_with(|| MockSource {
                listed,
                ..MockSource::default()
            })
    }

    /// Add a file to a local source.
    pub fn with_file(mut self, source: &str, path: &str, content: impl Into<Vec<u8>>) -> Self {
        let src = self.source_mut(source);
        *src = std::mem::take(src).with_file(path, content);
        self
    }

    /// Set the directory listing of a local source.
    pub fn with_entries(mut self, source: &str, entries: Vec<DirEntry>) -> Self {
        let src = self.source_mut(source);
        *src = std::mem::take(src).with_entries(entries);
        self
    }

    /// Add a file to the output of every solve.
    pub fn with_solve_output(mut self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.solve_output = std::mem::take(&mut self.solve_output).with_file(path, content);
        self
    }

    /// Make every solve fail.
    pub fn fail_solve(mut self, message: impl Into<String>) -> Self {
        self.solve_error = Some(message.into());
        self
    }

    /// Serve the config of an image.
    pub fn with_image_config(mut self, image: &str, config: impl Into<Vec<u8>>) -> Self {
        self.image_configs.insert(image.to_string(), config.into());
        self
    }

    /// Definitions submitted so far.
    pub fn solved(&self) -> Vec<Definition> {
        lock(&self.solved)
    }

    /// Local sources resolved so far.
    pub fn resolved_locals(&self) -> Vec<LocalSource> {
        lock(&self.resolved)
    }

    /// Include patterns of every directory listing so far.
    pub fn listed_patterns(&self) -> Vec<String> {
        lock(&self.listed)
    }
}

impl Gateway for MockGateway {
    type Ref = MockRef;

    fn resolve_local(&self, source: &LocalSource) -> Result<MockRef, GatewayError> {
        push(&self.resolved, source.clone());

        let found = self
            .sources
            .get(&source.name)
            .ok_or_else(|| GatewayError::NotFound(format!("local source `{}`", source.name)))?;

        let mut scoped = found.clone();
        scoped.scope = Some(source.clone());
        Ok(scoped)
    }

    fn solve(&self, definition: &Definition) -> Result<MockRef, GatewayError> {
        push(&self.solved, definition.clone());

        match self.solve_error {
            Some(ref message) => Err(GatewayError::Failed(message.clone())),
            None => Ok(self.solve_output.clone()),
        }
    }

    fn resolve_image_config(
        &self,
        image: &str,
        _platform: &Platform,
    ) -> Result<Vec<u8>, GatewayError> {
        self.image_configs
            .get(image)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("image `{}`", image)))
    }
}

/// Assertion helpers for testing.
pub mod assertions {
    use crate::core::error::{BuildFailure, Stage};

    /// Assert that a build failed at the given stage and return the failure.
    pub fn assert_failed_at<T: std::fmt::Debug>(
        result: Result<T, BuildFailure>,
        stage: Stage,
    ) -> BuildFailure {
        match result {
            Ok(v) => panic!("expected failure at {}, got Ok: {:?}", stage, v),
            Err(e) => {
                assert_eq!(e.stage, stage, "failed at the wrong stage: {}", e);
                e
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::graph::State;

    #[test]
    fn test_mock_source_scope() {
        let gateway = MockGateway::new()
            .with_file("dockerfile", "Dockerfile", "a")
            .with_file("dockerfile", "other", "b");

        let scoped = gateway
            .resolve_local(&LocalSource::new("dockerfile", "s").follow_paths(["Dockerfile"]))
            .unwrap();
        assert_eq!(scoped.read_file("./Dockerfile").unwrap(), b"a");
        assert!(scoped.read_file("other").is_err());

        let all = gateway
            .resolve_local(&LocalSource::new("dockerfile", "s"))
            .unwrap();
        assert_eq!(all.read_file("other").unwrap(), b"b");
        assert_eq!(gateway.resolved_locals().len(), 2);
    }

    #[test]
    fn test_mock_listing_is_recorded() {
        let gateway = MockGateway::new().with_entries("ctx", vec![DirEntry::file("a.csproj")]);
        let src = gateway.resolve_local(&LocalSource::new("ctx", "s")).unwrap();
        assert_eq!(src.read_dir(".", "*.*proj").unwrap().len(), 1);
        assert_eq!(gateway.listed_patterns(), vec!["*.*proj"]);
    }

    #[test]
    fn test_mock_solve() {
        let gateway = MockGateway::new().with_solve_output("/out", "x");
        let def = Definition::marshal(&State::image("a"), &Platform::linux_amd64()).unwrap();
        let out = gateway.solve(&def).unwrap();
        assert_eq!(out.read_file("/out").unwrap(), b"x");

        let failing = MockGateway::new().fail_solve("boom");
        assert!(matches!(failing.solve(&def), Err(GatewayError::Failed(_))));
        assert_eq!(failing.solved().len(), 1);
    }
}
