//! Integration tests for the `sconnect` binary.
//!
//! Offline commands run against an isolated environment; controller-bound
//! commands run against a wiremock server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NOWHERE: &str = "/tmp/sconnect-cli-test-nonexistent";

// ── Helpers ─────────────────────────────────────────────────────────

/// The `sconnect` binary with no ambient profile, realm, or credentials.
fn sconnect_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("sconnect");
    cmd.env("HOME", NOWHERE)
        .env("XDG_CONFIG_HOME", NOWHERE)
        .env("SCONNECT_CONFIG", format!("{NOWHERE}/config.toml"))
        .env_remove("SCONNECT_PROFILE")
        .env_remove("SCONNECT_REALM")
        .env_remove("SCONNECT_OUTPUT")
        .env_remove("SCONNECT_INSECURE")
        .env_remove("SCONNECT_USERNAME")
        .env_remove("SCONNECT_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/scm.config/1.0/orgs"))
        .and(header("Authorization", "Basic YWRtaW46c2VjcmV0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": "org-1", "name": "Acme"}, {"id": "org-2", "name": "Beta"}]
        })))
        .mount(server)
        .await;
}

fn logged_in(server: &MockServer) -> assert_cmd::Command {
    let mut cmd = sconnect_cmd();
    cmd.env("SCONNECT_USERNAME", "admin")
        .env("SCONNECT_PASSWORD", "secret")
        .args(["--realm", &server.uri()]);
    cmd
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = sconnect_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "expected usage text:\n{text}");
}

#[test]
fn test_help_flag() {
    sconnect_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("SteelConnect Manager")
            .and(predicate::str::contains("lookup"))
            .and(predicate::str::contains("image")),
    );
}

#[test]
fn test_version_flag() {
    sconnect_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sconnect"));
}

#[test]
fn test_completions_bash() {
    sconnect_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sconnect"));
}

#[test]
fn test_invalid_error_policy_is_usage_error() {
    let output = sconnect_cmd()
        .args(["--on-error", "explode", "get", "orgs"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Offline commands ────────────────────────────────────────────────

#[test]
fn test_lookup_model_both_directions() {
    sconnect_cmd()
        .args(["lookup", "model", "yogi", "-o", "plain"])
        .assert()
        .success()
        .stdout("SDI-VGW\n");
    sconnect_cmd()
        .args(["lookup", "model", "SDI-VGW", "-o", "plain"])
        .assert()
        .success()
        .stdout("yogi\n");
}

#[test]
fn test_lookup_model_list_prints_table() {
    let output = sconnect_cmd()
        .args(["lookup", "model", "--list", "-o", "plain"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 22);
    assert!(stdout.lines().any(|line| line == "yogi\tSDI-VGW"));

    sconnect_cmd()
        .args(["lookup", "model", "--list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"panda\": \"SDI-130\""));
}

#[test]
fn test_lookup_model_requires_value_or_list() {
    let output = sconnect_cmd().args(["lookup", "model"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_lookup_unknown_model_echoes_input() {
    sconnect_cmd()
        .args(["lookup", "model", "mystery"])
        .assert()
        .success()
        .stdout("\"mystery\"\n");
}

#[test]
fn test_about_needs_no_controller() {
    sconnect_cmd()
        .arg("about")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"package\": \"sconnect\"")
                .and(predicate::str::contains("\"api_version\": \"1.0\"")),
        );
}

#[test]
fn test_config_path_honors_override() {
    sconnect_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(NOWHERE));
}

#[test]
fn test_config_show_redacts_passwords() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "default_profile = \"lab\"\n\n[profiles.lab]\nrealm = \"lab.riverbed.cc\"\nusername = \"admin\"\npassword = \"hunter2\"\n",
    )
    .unwrap();

    sconnect_cmd()
        .env("SCONNECT_CONFIG", &path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("lab.riverbed.cc")
                .and(predicate::str::contains("********"))
                .and(predicate::str::contains("hunter2").not()),
        );
}

#[test]
fn test_missing_profile_is_usage_error() {
    let output = sconnect_cmd()
        .args(["--profile", "lab", "get", "orgs"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Profile 'lab' not found"));
}

#[test]
fn test_unreachable_realm_exits_with_connection_code() {
    let output = sconnect_cmd()
        .args(["--realm", "http://127.0.0.1:1", "--attempts", "0", "get", "orgs"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7));
}

// ── Controller-bound commands ───────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_get_prints_unwrapped_items() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    logged_in(&server)
        .args(["get", "orgs", "-o", "plain"])
        .assert()
        .success()
        .stdout("org-1\norg-2\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_passes_query_params() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/scm.reporting/1.0/nodes"))
        .and(query_param("org", "org-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": "node-1", "state": "online"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    logged_in(&server)
        .args(["status", "nodes", "-P", "org=org-1", "-o", "json-compact"])
        .assert()
        .success()
        .stdout("[{\"id\":\"node-1\",\"state\":\"online\"}]\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_lookup_org_miss_is_not_found() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let output = logged_in(&server)
        .args(["lookup", "org", "Gamma"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("org 'Gamma' not found"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_request_maps_to_exit_code() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/scm.config/1.0/node/missing"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"error": {"code": 404, "message": "no such node"}})),
        )
        .mount(&server)
        .await;

    let output = logged_in(&server)
        .args(["get", "node/missing"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_terminate_policy_prints_diagnostic_and_exits() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/scm.config/1.0/nonesuch"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"error": {"code": 404, "message": "no such resource"}})),
        )
        .mount(&server)
        .await;

    let output = logged_in(&server)
        .args(["--on-error", "terminate", "get", "nonesuch"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.lines().any(|line| line.starts_with("Status: 404 - Not Found")),
        "expected diagnostic on stderr:\n{stderr}"
    );
    assert!(stderr.contains("Error: no such resource"));
    assert!(!stderr.contains("panicked"));
}
