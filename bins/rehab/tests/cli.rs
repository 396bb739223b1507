//! End-to-end tests of the `rehab` binary against an unreachable backend

use assert_cmd::Command;
use predicates::prelude::*;
use std::net::TcpListener;
use tempfile::TempDir;

/// Base URL of a local port nobody listens on
fn closed_backend() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/api")
}

fn rehab(session: &TempDir) -> Command {
    rehab_at(session, &closed_backend())
}

fn rehab_at(session: &TempDir, api_url: &str) -> Command {
    let mut cmd = Command::cargo_bin("rehab").unwrap();
    for var in [
        "REHAB_API_URL",
        "REHAB_ENV",
        "REHAB_TIMEOUT_SECS",
        "REHAB_CACHE_TTL_SECS",
        "REHAB_MAX_RETRIES",
        "REHAB_SESSION_FILE",
        "REHAB_PASSWORD",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.arg("--api-url")
        .arg(api_url)
        .arg("--session")
        .arg(session.path().join("session.json"))
        .arg("--retries")
        .arg("1");
    cmd
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("rehab")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("centers"))
        .stdout(predicate::str::contains("bookings"))
        .stdout(predicate::str::contains("health"));
}

#[test]
fn test_health_reports_unreachable_backend() {
    let session = TempDir::new().unwrap();

    rehab(&session)
        .arg("health")
        .assert()
        .code(5)
        .stderr(predicate::str::contains("Server unreachable after 1 attempt(s)"));
}

#[test]
fn test_profile_without_session_fails_locally() {
    let session = TempDir::new().unwrap();

    rehab(&session)
        .arg("profile")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Authentication required"));
}

#[test]
fn test_json_errors_use_envelope() {
    let session = TempDir::new().unwrap();

    rehab(&session)
        .args(["--format", "json", "profile"])
        .assert()
        .code(4)
        .stdout(predicate::str::contains(r#""ok": false"#))
        .stdout(predicate::str::contains("Authentication required"));
}

#[test]
fn test_stored_session_reaches_network() {
    let session = TempDir::new().unwrap();
    std::fs::write(
        session.path().join("session.json"),
        r#"{"auth_token": "jwt-1"}"#,
    )
    .unwrap();

    rehab(&session)
        .args(["bookings", "list"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("Server unreachable"));
}

#[test]
fn test_logout_works_offline() {
    let session = TempDir::new().unwrap();
    let file = session.path().join("session.json");
    std::fs::write(&file, r#"{"auth_token": "jwt-1"}"#).unwrap();

    rehab(&session)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed out"));

    let remaining = std::fs::read_to_string(&file).unwrap();
    assert!(!remaining.contains("jwt-1"));
}

#[test]
fn test_invalid_api_url_is_a_config_error() {
    let session = TempDir::new().unwrap();

    rehab_at(&session, "ftp://example.com")
        .arg("health")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_logout_recovers_from_corrupted_session() {
    let session = TempDir::new().unwrap();
    let file = session.path().join("session.json");
    std::fs::write(&file, "{ not json").unwrap();

    rehab(&session).arg("logout").assert().success();

    assert_eq!(std::fs::read_to_string(&file).unwrap().trim(), "{}");
}

#[test]
fn test_verbose_json_logs_include_metrics() {
    let session = TempDir::new().unwrap();

    rehab(&session)
        .args(["--verbose", "--log-json", "health"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains(r#""message":"Session metrics""#))
        .stderr(predicate::str::contains("api.requests"));
}
