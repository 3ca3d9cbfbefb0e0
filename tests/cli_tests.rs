//! Integration tests for the tfcw CLI
//!
//! These tests verify CLI commands work correctly end-to-end. Commands that
//! need a remote API or a terraform binary are exercised only up to the
//! point where those collaborators would be contacted.

use std::io::Write;
use std::process::Command;

/// Get the path to the tfcw binary
fn tfcw_binary() -> std::path::PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test executable name
    path.pop(); // Remove deps directory

    path.push("tfcw");

    if cfg!(windows) {
        path.set_extension("exe");
    }

    path
}

/// Run tfcw and return output
fn run_tfcw(args: &[&str]) -> std::process::Output {
    Command::new(tfcw_binary())
        .args(args)
        .env_remove("TFE_TOKEN")
        .output()
        .expect("Failed to execute tfcw")
}

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_tfcw_version() {
    let output = run_tfcw(&["--version"]);

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("tfcw"));
}

#[test]
fn test_tfcw_help() {
    let output = run_tfcw(&["--help"]);

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("render"));
    assert!(stdout.contains("run"));
}

#[test]
fn test_render_writes_module_document() {
    let config = write_config(
        r#"
name: acme
organization: acme-org
workspaces:
  - staging
  - production
variables:
  - key: foo
    value: bar
"#,
    );
    let out_dir = tempfile::tempdir().unwrap();

    let output = run_tfcw(&[
        "render",
        "--config",
        config.path().to_str().unwrap(),
        "--out",
        out_dir.path().to_str().unwrap(),
    ]);

    assert!(output.status.success());

    let module_path = out_dir.path().join("main.tf.json");
    let written = std::fs::read_to_string(module_path).unwrap();
    let module: serde_json::Value = serde_json::from_str(&written).unwrap();

    assert_eq!(
        module["resource"]["tfe_workspace"]["workspace"]["for_each"]["staging"],
        "acme-staging"
    );
    assert_eq!(
        module["resource"]["tfe_variable"]["staging-foo"]["key"],
        "foo"
    );
    assert_eq!(
        module["terraform"]["required_providers"]["tfe"]["source"],
        "hashicorp/tfe"
    );
}

#[test]
fn test_render_fails_on_unknown_workspace_reference() {
    let config = write_config(
        r#"
name: acme
organization: acme-org
workspaces:
  - staging
workspace_variables:
  missing:
    - key: foo
      value: bar
"#,
    );

    let output = run_tfcw(&["render", "--config", config.path().to_str().unwrap()]);

    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing"));
    assert!(stderr.contains("staging"));
}

#[test]
fn test_render_fails_on_contradictory_team_access() {
    let config = write_config(
        r#"
name: acme
organization: acme-org
team_access:
  - team_name: devs
    team_id: team-abc
    access: write
"#,
    );

    let output = run_tfcw(&["render", "--config", config.path().to_str().unwrap()]);

    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("team_name or team_id"));
}

#[test]
fn test_run_requires_token() {
    let config = write_config(
        r#"
name: acme
organization: acme-org
"#,
    );
    let out_dir = tempfile::tempdir().unwrap();

    let output = run_tfcw(&[
        "run",
        "--config",
        config.path().to_str().unwrap(),
        "--out",
        out_dir.path().to_str().unwrap(),
    ]);

    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("token"));
}

#[test]
fn test_missing_config_file_fails() {
    let output = run_tfcw(&["render", "--config", "/nonexistent/tfcw.yaml"]);

    assert!(!output.status.success());
}
