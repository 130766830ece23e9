//! ContentSource trait - common interface for all content providers.
//!
//! A content source is anything the frontend can read files from: a named
//! local source of the invocation (context, dockerfile directory) or the
//! output of a solved stage graph.

use serde::{Deserialize, Serialize};

use crate::builder::executor::GatewayError;

/// File type mask of a unix mode.
pub const S_IFMT: u32 = 0o170000;

/// Regular file type bits.
pub const S_IFREG: u32 = 0o100000;

/// Directory type bits.
pub const S_IFDIR: u32 = 0o040000;

/// A single entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Path relative to the listed directory
    pub path: String,

    /// Unix mode bits, including the file type
    pub mode: u32,
}

impl DirEntry {
    /// Create a regular file entry with mode 0644.
    pub fn file(path: impl Into<String>) -> Self {
        DirEntry {
            path: path.into(),
            mode: S_IFREG | 0o644,
        }
    }

    /// Create a directory entry with mode 0755.
    pub fn dir(path: impl Into<String>) -> Self {
        DirEntry {
            path: path.into(),
            mode: S_IFDIR | 0o755,
        }
    }

    /// Whether the entry is a regular file (not a directory, symlink, device...).
    pub fn is_regular(&self) -> bool {
        self.mode & S_IFMT == S_IFREG
    }

    /// Whether the entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.mode & S_IFMT == S_IFDIR
    }
}

/// A readable tree of content.
pub trait ContentSource {
    /// Read the exact bytes of a file.
    fn read_file(&self, path: &str) -> Result<Vec<u8>, GatewayError>;

    /// List the entries of a directory whose names match `include_pattern`.
    ///
    /// Entries are returned in the source's own listing order.
    fn read_dir(&self, path: &str, include_pattern: &str) -> Result<Vec<DirEntry>, GatewayError>;
}

/// Reference to a named local source of the invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSource {
    /// Logical name of the source (e.g. "context")
    pub name: String,

    /// Session the source belongs to
    pub session_id: String,

    /// Restrict the source to these paths (empty = everything)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub follow_paths: Vec<String>,
}

impl LocalSource {
    /// Create a reference to a whole local source.
    pub fn new(name: impl Into<String>, session_id: impl Into<String>) -> Self {
        LocalSource {
            name: name.into(),
            session_id: session_id.into(),
            follow_paths: Vec::new(),
        }
    }

    /// Restrict the source to the given paths.
    pub fn follow_paths(mut self, paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.follow_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Whether a path is visible through the follow-path filter.
    pub fn is_followed(&self, path: &str) -> bool {
        if self.follow_paths.is_empty() {
            return true;
        }
        let path = path.trim_start_matches("./");
        self.follow_paths.iter().any(|p| {
            let p = p.trim_start_matches("./");
            path == p || path.starts_with(&format!("{}/", p.trim_end_matches('/')))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_entry_kinds() {
        assert!(DirEntry::file("app.csproj").is_regular());
        assert!(!DirEntry::file("app.csproj").is_dir());
        assert!(DirEntry::dir("tools.csproj").is_dir());
        assert!(!DirEntry::dir("tools.csproj").is_regular());

        let symlink = DirEntry {
            path: "link.csproj".to_string(),
            mode: 0o120777,
        };
        assert!(!symlink.is_regular());
    }

    #[test]
    fn test_follow_paths() {
        let all = LocalSource::new("dockerfile", "s1");
        assert!(all.is_followed("anything"));

        let only = LocalSource::new("dockerfile", "s1").follow_paths(["Dockerfile"]);
        assert!(only.is_followed("Dockerfile"));
        assert!(only.is_followed("./Dockerfile"));
        assert!(!only.is_followed("Dockerfile.bak"));

        let dir = LocalSource::new("context", "s1").follow_paths(["src/"]);
        assert!(dir.is_followed("src/app.csproj"));
        assert!(!dir.is_followed("srcfoo"));
    }
}
