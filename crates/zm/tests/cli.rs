//! Tests that drive the `zm` binary for commands that never reach Zendesk.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Runs `zm` in `dir` with a private config path and no inherited credentials.
fn zm(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_zm"))
        .args(args)
        .current_dir(dir)
        .env("ZM_CONFIG", dir.join("config.toml"))
        .env("NO_COLOR", "1")
        .env_remove("ZENDESK_SUBDOMAIN")
        .env_remove("ZENDESK_EMAIL")
        .env_remove("ZENDESK_API_TOKEN")
        .env_remove("ZM_LOG")
        .output()
        .expect("failed to run zm")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_check_prints_rpn() {
    let dir = TempDir::new().unwrap();
    let output = zm(dir.path(), &["check", "status", "open OR (pending AND hold)"]);

    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("status (open OR (pending AND hold))"), "{out}");
    assert!(out.contains("RPN: open pending hold AND OR"), "{out}");
}

#[test]
fn test_check_invalid_value_exits_with_filter_code() {
    let dir = TempDir::new().unwrap();
    let output = zm(dir.path(), &["check", "status", "opne"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Did you mean 'open'?"));
}

#[test]
fn test_fields_include_configured_custom_fields() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "version = 1\n\n[[custom_fields]]\nname = \"source_ip\"\nid = 900001\nkind = \"ipv4\"\n",
    )
    .unwrap();

    let output = zm(dir.path(), &["fields"]);

    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.starts_with("FIELD"));
    assert!(out
        .lines()
        .any(|l| l.starts_with("source_ip") && l.contains("custom_fields[900001]")));
}

#[test]
fn test_harvest_without_credentials_is_config_error() {
    let dir = TempDir::new().unwrap();
    let output = zm(dir.path(), &["harvest", "--yes"]);

    assert_eq!(output.status.code(), Some(5));
    let err = stderr(&output);
    assert!(err.contains("ZENDESK_SUBDOMAIN"), "{err}");
    assert!(err.contains("ZENDESK_API_TOKEN"), "{err}");
}

#[test]
fn test_bad_filter_fails_before_credentials_are_used() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("credentials.env"),
        "ZENDESK_SUBDOMAIN=acme\nZENDESK_EMAIL=agent@example.com\nZENDESK_API_TOKEN=secret\n",
    )
    .unwrap();

    let output = zm(dir.path(), &["harvest", "-f", "priority=high"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("unknown filter field: priority"));
}

#[test]
fn test_config_path_honours_override() {
    let dir = TempDir::new().unwrap();
    let output = zm(dir.path(), &["config", "path"]);

    assert!(output.status.success());
    assert_eq!(
        stdout(&output).trim(),
        dir.path().join("config.toml").display().to_string()
    );
}
