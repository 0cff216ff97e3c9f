//! Integration tests for the `erpdesk` CLI binary.
//!
//! Argument parsing, help output, completions, config handling, and exit
//! codes run without a backend; the session tests stand one up with
//! wiremock.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command for the `erpdesk` binary with env isolation.
///
/// Clears all `ERPDESK_*` env vars and points config and data
/// directories into `home` so tests never touch the real configuration.
fn erpdesk_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("erpdesk");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("ERPDESK_PROFILE")
        .env_remove("ERPDESK_API_URL")
        .env_remove("ERPDESK_DEFAULT_PROFILE")
        .env_remove("ERPDESK_OUTPUT")
        .env_remove("ERPDESK_INSECURE")
        .env_remove("ERPDESK_TIMEOUT")
        .env_remove("ERPDESK_PASSWORD");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn user_json() -> serde_json::Value {
    json!({ "id": "u1", "email": "ada@example.com", "name": "Ada", "role": "admin" })
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn no_args_shows_help() {
    let home = TempDir::new().unwrap();
    let output = erpdesk_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn help_lists_sections() {
    let home = TempDir::new().unwrap();
    erpdesk_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("payroll")
                .and(predicate::str::contains("budget"))
                .and(predicate::str::contains("staff"))
                .and(predicate::str::contains("login")),
        );
}

#[test]
fn version_flag() {
    let home = TempDir::new().unwrap();
    erpdesk_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("erpdesk"));
}

#[test]
fn invalid_subcommand_is_usage_error() {
    let home = TempDir::new().unwrap();
    erpdesk_cmd(home.path())
        .arg("frobnicate")
        .assert()
        .code(2);
}

#[test]
fn completions_zsh() {
    let home = TempDir::new().unwrap();
    erpdesk_cmd(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("erpdesk"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn config_path_points_into_config_home() {
    let home = TempDir::new().unwrap();
    erpdesk_cmd(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn config_set_then_show() {
    let home = TempDir::new().unwrap();
    erpdesk_cmd(home.path())
        .args(["config", "set", "profiles.prod.api_url", "https://erp.example.com"])
        .assert()
        .success();
    erpdesk_cmd(home.path())
        .args(["config", "use", "prod"])
        .assert()
        .success();

    let output = erpdesk_cmd(home.path())
        .args(["config", "show", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let cfg: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(cfg["default_profile"], "prod");
    assert_eq!(cfg["profiles"]["prod"]["api_url"], "https://erp.example.com");
}

#[test]
fn config_use_unknown_profile_fails() {
    let home = TempDir::new().unwrap();
    let output = erpdesk_cmd(home.path())
        .args(["config", "use", "nowhere"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("nowhere"));
}

#[test]
fn config_set_rejects_unknown_key() {
    let home = TempDir::new().unwrap();
    erpdesk_cmd(home.path())
        .args(["config", "set", "colour", "blue"])
        .assert()
        .code(2);
}

#[test]
fn unknown_profile_flag_fails_before_network() {
    let home = TempDir::new().unwrap();
    let output = erpdesk_cmd(home.path())
        .args(["--profile", "ghost", "whoami"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("ghost"));
}

#[test]
fn refresh_list_needs_no_session() {
    let home = TempDir::new().unwrap();
    erpdesk_cmd(home.path())
        .args(["--api-url", "http://127.0.0.1:1", "refresh", "--list"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("payroll.kpis").and(predicate::str::contains("budget.entries")),
        );
}

#[test]
fn refresh_rejects_unknown_view() {
    let home = TempDir::new().unwrap();
    erpdesk_cmd(home.path())
        .args(["--api-url", "http://127.0.0.1:1", "refresh", "payroll.bonus"])
        .assert()
        .code(2);
}

// ── Session ─────────────────────────────────────────────────────────

#[test]
fn protected_command_without_backend_is_not_signed_in() {
    let home = TempDir::new().unwrap();
    erpdesk_cmd(home.path())
        .args(["--api-url", "http://127.0.0.1:1", "--timeout", "2", "payroll", "kpis"])
        .assert()
        .code(3);
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_session_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let mut cmd = erpdesk_cmd(home.path());
    cmd.args(["--api-url", &server.uri(), "budget", "list"]);
    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();

    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("erpdesk login"));
}

#[tokio::test(flavor = "multi_thread")]
async fn login_token_is_reused_by_later_commands() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/sign-in"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "token": "tok-123", "user": user_json() })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/payroll/kpis"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "gross": 1000.0, "net": 800.0, "tax": 150.0, "loan": 50.0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let uri = server.uri();

    let mut login = erpdesk_cmd(home.path());
    login.args([
        "--api-url",
        &uri,
        "login",
        "--email",
        "ada@example.com",
        "--password",
        "hunter2",
    ]);
    let out = tokio::task::spawn_blocking(move || login.output().unwrap())
        .await
        .unwrap();
    assert!(out.status.success(), "{}", combined_output(&out));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Signed in as Ada"));

    let mut kpis = erpdesk_cmd(home.path());
    kpis.args(["--api-url", &uri, "payroll", "kpis", "-o", "json"]);
    let out = tokio::task::spawn_blocking(move || kpis.output().unwrap())
        .await
        .unwrap();
    assert!(out.status.success(), "{}", combined_output(&out));
    let body: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(body["gross"], 1000.0);
    assert_eq!(body["loan"], 50.0);
}

// ── Mutations refresh the views they touch ──────────────────────────

async fn mount_session(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn budget_approve_refreshes_entries_and_kpis() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    Mock::given(method("PATCH"))
        .and(path("/api/budget/entries/b1/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "b1", "title": "Laptops", "amount": 1200.0, "status": "approved"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/budget/entries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [], "total": 0 })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/budget/kpis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let mut cmd = erpdesk_cmd(home.path());
    cmd.args(["--api-url", &server.uri(), "budget", "approve", "b1"]);
    let out = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();
    assert!(out.status.success(), "{}", combined_output(&out));
    assert!(String::from_utf8_lossy(&out.stdout).contains("Laptops"));

    server.verify().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn payslip_create_refreshes_only_the_payslip_list() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/payroll/payslips"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p1", "staffId": "s1", "period": "2024-06"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/payroll/payslips"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .expect(1)
        .mount(&server)
        .await;
    for untouched in ["/api/payroll/kpis", "/api/payroll/summary"] {
        Mock::given(method("GET"))
            .and(path(untouched))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;
    }

    let home = TempDir::new().unwrap();
    let mut cmd = erpdesk_cmd(home.path());
    cmd.args([
        "--api-url",
        &server.uri(),
        "payroll",
        "payslips",
        "create",
        "--staff",
        "s1",
        "--period",
        "2024-06",
    ]);
    let out = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();
    assert!(out.status.success(), "{}", combined_output(&out));

    server.verify().await;
}
