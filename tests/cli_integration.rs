//! CLI integration tests for netapp.
//!
//! These tests drive the binary against temporary source directories, the
//! way a developer checks a manifest before handing it to an executor.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

const RUNTIME_CONFIG: &str = r#"{
    "architecture": "amd64",
    "os": "linux",
    "config": {
        "Env": ["PATH=/usr/bin", "ASPNETCORE_URLS=http://+:80"],
        "ExposedPorts": {"8080/tcp": {}}
    }
}"#;

const PROJECT_FILE: &str = "<Project Sdk=\"Microsoft.NET.Sdk.Web\"></Project>\n";

/// Get the netapp binary command, isolated from the user's config.
fn netapp(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("netapp").unwrap();
    cmd.current_dir(dir).env("HOME", dir).env_remove("NETAPP_CONFIG");
    cmd
}

/// Create a context directory with the given files.
fn context(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (path, content) in files {
        let full = tmp.path().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }
    tmp
}

// ============================================================================
// netapp resolve
// ============================================================================

#[test]
fn test_resolve_from_manifest() {
    let tmp = context(&[
        ("Dockerfile", "project: app.csproj\nassembly: MyApp.dll\n"),
        ("app.csproj", PROJECT_FILE),
    ]);

    netapp(tmp.path())
        .arg("resolve")
        .assert()
        .success()
        .stdout(predicate::str::contains("app.csproj (manifest)"))
        .stdout(predicate::str::contains("Release (default)"))
        .stdout(predicate::str::contains("MyApp.dll (manifest)"));
}

#[test]
fn test_resolve_options_override_manifest() {
    let tmp = context(&[("Dockerfile", "project: app.csproj\nconfiguration: Debug\nassembly: A.dll\n")]);

    let output = netapp(tmp.path())
        .args(["resolve", "--json", "--assembly", "MyApp", "-c", "Staging"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["project"]["value"], "app.csproj");
    assert_eq!(json["configuration"]["value"], "Staging");
    assert_eq!(json["configuration"]["origin"], "option");
    assert_eq!(json["assembly"]["value"], "MyApp");
}

#[test]
fn test_resolve_empty_configuration_option() {
    let tmp = context(&[("Dockerfile", "project: app.csproj\nconfiguration: Debug\nassembly: A.dll\n")]);

    netapp(tmp.path())
        .args(["resolve", "--opt", "configuration="])
        .assert()
        .success()
        .stdout(predicate::str::contains("Release (default)"));
}

#[test]
fn test_resolve_infers_project() {
    let tmp = context(&[
        ("Dockerfile", "\n"),
        ("web.csproj", PROJECT_FILE),
        ("README.md", "# web\n"),
    ]);

    netapp(tmp.path())
        .args(["resolve", "--assembly", "Web.dll"])
        .assert()
        .success()
        .stdout(predicate::str::contains("web.csproj (inferred)"));
}

#[test]
fn test_resolve_custom_filename() {
    let tmp = context(&[("netapp.yaml", "Project: svc.fsproj\nAssembly: Svc.dll\n")]);

    netapp(tmp.path())
        .args(["resolve", "--opt", "filename=netapp.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("svc.fsproj (manifest)"));
}

#[test]
fn test_resolve_warns_on_unused_option() {
    let tmp = context(&[("Dockerfile", "project: app.csproj\nassembly: A.dll\n")]);

    netapp(tmp.path())
        .args(["resolve", "--opt", "build-arg:FOO=1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("warning: unused option `build-arg:FOO`"));
}

#[test]
fn test_resolve_separate_dockerfile_dir() {
    let tmp = context(&[
        ("build/Dockerfile", "assembly: Api.dll\n"),
        ("build/api.csproj", PROJECT_FILE),
        ("src/other.csproj", PROJECT_FILE),
    ]);

    netapp(tmp.path())
        .args(["resolve", "--context", "src", "--dockerfile", "build"])
        .assert()
        .success()
        .stdout(predicate::str::contains("api.csproj (inferred)"));
}

#[test]
fn test_resolve_empty_manifest() {
    let tmp = context(&[("Dockerfile", "")]);

    netapp(tmp.path())
        .arg("resolve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("manifest: manifest `Dockerfile` is empty"));
}

#[test]
fn test_resolve_rejects_conventional_dockerfile() {
    let tmp = context(&[("Dockerfile", "FROM ubuntu:20.04\nRUN make\n")]);

    netapp(tmp.path())
        .arg("resolve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse manifest"));
}

#[test]
fn test_resolve_no_project() {
    let tmp = context(&[("Dockerfile", "assembly: A.dll\n"), ("README.md", "")]);

    netapp(tmp.path())
        .arg("resolve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no project could be inferred"))
        .stderr(predicate::str::contains("--project"));
}

#[test]
fn test_resolve_cannot_probe_locally() {
    let tmp = context(&[("Dockerfile", "project: app.csproj\n"), ("app.csproj", PROJECT_FILE)]);

    netapp(tmp.path())
        .arg("resolve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("probe:"))
        .stderr(predicate::str::contains("--assembly"));
}

#[test]
fn test_resolve_missing_context() {
    let tmp = context(&[]);

    netapp(tmp.path())
        .args(["resolve", "--context", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

// ============================================================================
// netapp plan
// ============================================================================

#[test]
fn test_plan_prints_graph_and_image() {
    let tmp = context(&[
        ("Dockerfile", "project: app.csproj\nassembly: MyApp.dll\n"),
        ("app.csproj", PROJECT_FILE),
        ("runtime.json", RUNTIME_CONFIG),
    ]);

    let output = netapp(tmp.path())
        .args(["plan", "--runtime-config", "runtime.json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let image = &json["image"];
    assert_eq!(image["config"]["Entrypoint"], serde_json::json!(["dotnet", "MyApp.dll"]));
    assert_eq!(image["config"]["Env"][1], "ASPNETCORE_URLS=http://+:80");
    assert_eq!(image["config"]["ExposedPorts"]["80/tcp"], serde_json::json!({}));
    assert_eq!(image["config"]["ExposedPorts"]["8080/tcp"], serde_json::json!({}));
    assert_eq!(image["config"]["WorkingDir"], "/app");

    let definition = &json["definition"];
    assert_eq!(definition["platform"], "linux/amd64");
    let commands: Vec<String> = definition["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|n| n["type"] == "exec")
        .map(|n| n["exec"]["args"][1].as_str().unwrap().to_string())
        .collect();
    assert_eq!(commands, vec!["restore", "build", "publish"]);
}

#[test]
fn test_plan_with_config_file() {
    let tmp = context(&[
        ("Dockerfile", "project: app.csproj\nassembly: MyApp.dll\n"),
        ("runtime.json", RUNTIME_CONFIG),
        (
            "netapp.toml",
            "[images]\nruntime = \"registry.local/aspnet:8.0\"\n\n[build]\nconfiguration = \"Debug\"\nport = \"8080/tcp\"\n",
        ),
    ]);

    let output = netapp(tmp.path())
        .args(["plan", "--runtime-config", "runtime.json", "--config", "netapp.toml"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["parameters"]["configuration"]["value"], "Debug");
    assert!(json["image"]["config"]["ExposedPorts"].get("80/tcp").is_none());

    let plan = String::from_utf8_lossy(&output.stdout);
    assert!(plan.contains("registry.local/aspnet:8.0"));
}

#[test]
fn test_plan_project_config() {
    let tmp = context(&[
        ("Dockerfile", "project: app.csproj\nassembly: MyApp.dll\n"),
        ("runtime.json", RUNTIME_CONFIG),
        (".netapp/config.toml", "[paths]\napp = \"/srv\"\n"),
    ]);

    let output = netapp(tmp.path())
        .args(["plan", "--runtime-config", "runtime.json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["image"]["config"]["WorkingDir"], "/srv");
}

#[test]
fn test_plan_missing_runtime_config() {
    let tmp = context(&[("Dockerfile", "project: app.csproj\nassembly: MyApp.dll\n")]);

    netapp(tmp.path())
        .args(["plan", "--runtime-config", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("runtime config"));
}

#[test]
fn test_plan_bad_runtime_config() {
    let tmp = context(&[
        ("Dockerfile", "project: app.csproj\nassembly: MyApp.dll\n"),
        ("runtime.json", "not json"),
    ]);

    netapp(tmp.path())
        .args(["plan", "--runtime-config", "runtime.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("image config:"));
}

// ============================================================================
// netapp completions
// ============================================================================

#[test]
fn test_completions_bash() {
    let tmp = context(&[]);

    netapp(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("netapp"));
}
