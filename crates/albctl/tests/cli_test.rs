//! Integration tests for the `albctl` binary.
//!
//! Argument parsing, help output, completions, local config handling and
//! the offline ControlScript paths; no controller is contacted.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

const ISOLATED_VARS: &[&str] = &[
    "ALBCTL_PROFILE",
    "ALBCTL_CONTROLLER",
    "ALBCTL_USER",
    "ALBCTL_PASSWORD",
    "ALBCTL_TOKEN",
    "ALBCTL_TENANT",
    "ALBCTL_API_VERSION",
    "ALBCTL_OUTPUT",
    "ALBCTL_INSECURE",
    "ALBCTL_CA_CERT",
    "ALBCTL_TIMEOUT",
    "ALBCTL_PASSPHRASE",
    "ALBCTL_TERRAFORM",
    "API_TOKEN",
    "DOCKER_GATEWAY",
    "TENANT",
];

/// `albctl` with every `ALBCTL_*` variable removed and the config file
/// pointed at `config`.
fn albctl_with_config(config: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("albctl");
    cmd.env("HOME", "/tmp/albctl-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/albctl-test-nonexistent")
        .env("ALBCTL_CONFIG", config);
    for var in ISOLATED_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn albctl() -> assert_cmd::Command {
    albctl_with_config(Path::new("/tmp/albctl-test-nonexistent/config.toml"))
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = albctl().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_lists_workflows() {
    albctl().arg("--help").assert().success().stdout(
        predicate::str::contains("licenses")
            .and(predicate::str::contains("inventory"))
            .and(predicate::str::contains("backup"))
            .and(predicate::str::contains("terraform")),
    );
}

#[test]
fn test_version_flag() {
    albctl()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("albctl"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    albctl()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    albctl()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_fish() {
    albctl()
        .args(["completions", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Argument validation ─────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = albctl().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(text.contains("unrecognized") || text.contains("foobar"), "{text}");
}

#[test]
fn test_token_lifetime_out_of_range() {
    let output = albctl()
        .args(["tokens", "create", "svc-bot", "--expires", "87601"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("87601"));
}

#[test]
fn test_unknown_inventory_kind() {
    let output = albctl().args(["inventory", "clouds"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("possible values"));
}

#[test]
fn test_unknown_analytics_action() {
    let output = albctl()
        .args(["analytics", "reset", "--action", "everything"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_terraform_search_conflicts_with_names() {
    let output = albctl()
        .args([
            "terraform", "export", "pool", "out.tf", "--search", "web", "--names", "a,b",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_logs_export_help_states_utc_default() {
    albctl()
        .args(["logs", "export", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("UTC unless"));
}

// ── No controller configured ────────────────────────────────────────

#[test]
fn test_licenses_list_no_controller() {
    let output = albctl().args(["licenses", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(text.contains("No controller configured"), "{text}");
}

#[test]
fn test_global_flags_parse_before_config_error() {
    albctl()
        .args([
            "--output", "json", "-vv", "--insecure", "--timeout", "30", "--tenant", "*",
            "waf", "report",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No controller configured"));
}

#[test]
fn test_unknown_profile() {
    let output = albctl()
        .args(["--profile", "lab", "licenses", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("Profile 'lab' not found"));
}

// ── Config commands ─────────────────────────────────────────────────

#[test]
fn test_config_show_without_file() {
    albctl().args(["config", "show"]).assert().success();
}

#[test]
fn test_config_profiles_when_empty() {
    albctl()
        .args(["config", "profiles"])
        .assert()
        .success()
        .stderr(predicate::str::contains("No profiles configured"));
}

#[test]
fn test_config_set_then_use() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("albctl/config.toml");

    albctl_with_config(&config)
        .args(["config", "set", "controller", "10.0.0.1"])
        .assert()
        .success();
    albctl_with_config(&config)
        .args(["--profile", "lab", "config", "set", "password", "hunter2"])
        .assert()
        .success();

    albctl_with_config(&config)
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default *").and(predicate::str::contains("lab")));

    albctl_with_config(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("10.0.0.1")
                .and(predicate::str::contains("********"))
                .and(predicate::str::contains("hunter2").not()),
        );

    albctl_with_config(&config)
        .args(["config", "use", "lab"])
        .assert()
        .success();
    albctl_with_config(&config)
        .args(["config", "profiles"])
        .assert()
        .stdout(predicate::str::contains("lab *"));

    albctl_with_config(&config)
        .args(["config", "use", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let output = albctl_with_config(&config)
        .args(["config", "set", "site", "default"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(!config.exists());
}

// ── ControlScripts without work to do ───────────────────────────────

#[test]
fn test_clear_alerts_without_vs_up_event() {
    albctl()
        .args([
            "controlscript",
            "clear-alerts",
            r#"{"events": [{"event_id": "VS_DOWN", "obj_uuid": "virtualservice-1"}]}"#,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("No VS_UP Event found in alert data"));
}

#[test]
fn test_sticky_pool_group_without_events() {
    albctl()
        .args(["controlscript", "sticky-pool-group", r#"{"events": []}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("No event data for ControlScript"));
}

#[test]
fn test_controlscript_rejects_bad_payload() {
    let output = albctl()
        .args(["controlscript", "clear-alerts", "not json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("invalid alert payload"));
}
