//! Test fixtures for common test scenarios.

use std::path::Path;

use tempfile::TempDir;

use crate::test_support::MockGateway;
use crate::util::config::DEFAULT_RUNTIME_IMAGE;

/// Config of the default runtime image, trimmed to what the frontend reads.
pub const RUNTIME_CONFIG: &str = r#"{
    "architecture": "amd64",
    "os": "linux",
    "config": {
        "Env": [
            "PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin",
            "ASPNETCORE_URLS=http://+:80",
            "DOTNET_RUNNING_IN_CONTAINER=true"
        ]
    }
}"#;

/// A minimal SDK-style project file.
pub const PROJECT_FILE: &str = r#"<Project Sdk="Microsoft.NET.Sdk.Web">
  <PropertyGroup>
    <TargetFramework>net5.0</TargetFramework>
  </PropertyGroup>
</Project>
"#;

/// A gateway serving the default runtime image config.
pub fn runtime_gateway() -> MockGateway {
    MockGateway::new().with_image_config(DEFAULT_RUNTIME_IMAGE, RUNTIME_CONFIG)
}

/// Create a temporary directory holding the given files.
pub fn source_dir(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().expect("failed to create temp dir");
    for (path, content) in files {
        write_file(tmp.path(), path, content);
    }
    tmp
}

/// Write a file, creating parent directories.
pub fn write_file(root: &Path, path: &str, content: &str) {
    let full = root.join(path);
    if let Some(parent) = full.parent() {
        std::fs::create_dir_all(parent).expect("failed to create parent dir");
    }
    std::fs::write(&full, content).expect("failed to write fixture file");
}
