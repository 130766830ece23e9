//! Path source - a local directory served as a content source.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use glob::Pattern;

use crate::builder::executor::GatewayError;
use crate::sources::source::{ContentSource, DirEntry, LocalSource};

/// A content source backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct PathSource {
    /// The root path
    root: PathBuf,

    /// The local source this directory serves
    source: LocalSource,
}

impl PathSource {
    /// Serve `root` as the given local source.
    pub fn new(root: impl Into<PathBuf>, source: LocalSource) -> Self {
        PathSource {
            root: root.into(),
            source,
        }
    }

    /// Get the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a source-relative path onto the filesystem, refusing escapes.
    fn host_path(&self, path: &str) -> Result<PathBuf, GatewayError> {
        let mut resolved = self.root.clone();

        for component in Path::new(path).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir | Component::RootDir => {}
                Component::ParentDir | Component::Prefix(_) => {
                    return Err(GatewayError::Failed(format!(
                        "path `{}` escapes source `{}`",
                        path, self.source.name
                    )));
                }
            }
        }

        Ok(resolved)
    }
}

impl ContentSource for PathSource {
    fn read_file(&self, path: &str) -> Result<Vec<u8>, GatewayError> {
        if !self.source.is_followed(path) {
            return Err(GatewayError::NotFound(format!(
                "{} (not included in source `{}`)",
                path, self.source.name
            )));
        }

        let host = self.host_path(path)?;
        fs::read(&host).map_err(|e| io_error(e, path))
    }

    fn read_dir(&self, path: &str, include_pattern: &str) -> Result<Vec<DirEntry>, GatewayError> {
        let pattern = if include_pattern.is_empty() {
            None
        } else {
            Some(Pattern::new(include_pattern).map_err(|e| {
                GatewayError::Failed(format!("invalid include pattern `{}`: {}", include_pattern, e))
            })?)
        };

        let host = self.host_path(path)?;
        let prefix = path.trim_start_matches("./").trim_matches('/');
        let prefix = if prefix == "." { "" } else { prefix };

        let mut entries = Vec::new();
        for entry in fs::read_dir(&host).map_err(|e| io_error(e, path))? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();

            if let Some(ref pattern) = pattern {
                if !pattern.matches(&name) {
                    continue;
                }
            }

            let relative = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", prefix, name)
            };
            if !self.source.is_followed(&relative) {
                continue;
            }

            let metadata = fs::symlink_metadata(entry.path())?;
            entries.push(DirEntry {
                path: name,
                mode: file_mode(&metadata),
            });
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}

fn io_error(err: io::Error, path: &str) -> GatewayError {
    if err.kind() == io::ErrorKind::NotFound {
        GatewayError::NotFound(path.to_string())
    } else {
        GatewayError::Io(err)
    }
}

#[cfg(unix)]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    metadata.mode()
}

#[cfg(not(unix))]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    use crate::sources::source::{S_IFDIR, S_IFREG};

    if metadata.is_dir() {
        S_IFDIR | 0o755
    } else if metadata.is_file() {
        S_IFREG | 0o644
    } else {
        0o120777
    }
}
