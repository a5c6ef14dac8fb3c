use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

/// The binary with a clean environment, run from `dir` so no stray `.env`
/// is picked up.
fn tally(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tally").unwrap();
    cmd.current_dir(dir)
        .env_remove("TALLY_API_URL")
        .env_remove("TALLY_TIMEZONE")
        .env_remove("TALLY_TIMEOUT_SECS")
        .env_remove("RUST_LOG");
    cmd
}

fn json_stdout(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("stdout is JSON")
}

// ── Offline commands ────────────────────────────────────────────────────────

#[test]
fn test_period_weekly() {
    let dir = tempfile::tempdir().unwrap();
    let out = tally(dir.path())
        .args(["period", "weekly", "--today", "2024-03-15"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = json_stdout(&out);
    assert_eq!(json["period"], "WEEKLY");
    assert_eq!(json["startDate"], "2024-03-10");
    assert_eq!(json["endDate"], "2024-03-16");
    assert_eq!(json["days"], 7);
}

#[test]
fn test_period_weekly_across_new_year() {
    let dir = tempfile::tempdir().unwrap();
    let out = tally(dir.path())
        .args(["period", "WEEKLY", "--today", "2024-01-02"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = json_stdout(&out);
    assert_eq!(json["startDate"], "2023-12-31");
    assert_eq!(json["endDate"], "2024-01-06");
}

#[test]
fn test_period_weekly_monday_start() {
    let dir = tempfile::tempdir().unwrap();
    let out = tally(dir.path())
        .args(["period", "weekly", "--today", "2024-03-15", "--week-start", "monday"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = json_stdout(&out);
    assert_eq!(json["startDate"], "2024-03-11");
    assert_eq!(json["endDate"], "2024-03-17");
}

#[test]
fn test_period_monthly_leap_february() {
    let dir = tempfile::tempdir().unwrap();
    tally(dir.path())
        .args(["period", "monthly", "--today", "2024-02-20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"endDate\": \"2024-02-29\""));
    tally(dir.path())
        .args(["period", "monthly", "--today", "2023-02-20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"endDate\": \"2023-02-28\""));
}

#[test]
fn test_period_yearly() {
    let dir = tempfile::tempdir().unwrap();
    let out = tally(dir.path())
        .args(["period", "yearly", "--today", "2024-07-04"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = json_stdout(&out);
    assert_eq!(json["startDate"], "2024-01-01");
    assert_eq!(json["endDate"], "2024-12-31");
    assert_eq!(json["days"], 366);
}

#[test]
fn test_period_custom_keeps_given_dates() {
    let dir = tempfile::tempdir().unwrap();
    let out = tally(dir.path())
        .args([
            "period", "custom", "--today", "2024-03-15", "--start", "2024-01-05", "--end",
            "2024-01-20",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = json_stdout(&out);
    assert_eq!(json["period"], "CUSTOM");
    assert_eq!(json["startDate"], "2024-01-05");
    assert_eq!(json["endDate"], "2024-01-20");
}

#[test]
fn test_period_custom_without_dates_fails() {
    let dir = tempfile::tempdir().unwrap();
    tally(dir.path())
        .args(["period", "custom"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("needs --start and --end"));
}

#[test]
fn test_period_custom_inverted_range_fails() {
    let dir = tempfile::tempdir().unwrap();
    tally(dir.path())
        .args(["period", "custom", "--start", "2024-02-01", "--end", "2024-01-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid date range"));
}

#[test]
fn test_period_explicit_dates_override_prefill() {
    let dir = tempfile::tempdir().unwrap();
    let out = tally(dir.path())
        .args(["period", "monthly", "--today", "2024-02-20", "--start", "2024-02-05"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json = json_stdout(&out);
    assert_eq!(json["period"], "MONTHLY");
    assert_eq!(json["startDate"], "2024-02-05");
    assert_eq!(json["endDate"], "2024-02-29");
    assert_eq!(json["days"], 25);
}

#[test]
fn test_period_custom_with_only_start_fails() {
    let dir = tempfile::tempdir().unwrap();
    tally(dir.path())
        .args(["period", "custom", "--start", "2024-02-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("needs --start and --end"));
}

#[test]
fn test_period_unknown_name_rejected() {
    let dir = tempfile::tempdir().unwrap();
    tally(dir.path())
        .args(["period", "fortnightly"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown period"));
}

#[test]
fn test_check_start_today_rejected() {
    let dir = tempfile::tempdir().unwrap();
    tally(dir.path())
        .args(["check-start", "2024-03-15", "--today", "2024-03-15"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Start date must be tomorrow or later"));
}

#[test]
fn test_check_start_tomorrow_accepted() {
    let dir = tempfile::tempdir().unwrap();
    tally(dir.path())
        .args(["check-start", "2024-03-16", "--today", "2024-03-15"])
        .assert()
        .success()
        .stdout("ok\n");
}

#[test]
fn test_check_start_reads_configured_timezone() {
    let dir = tempfile::tempdir().unwrap();
    tally(dir.path())
        .args(["check-start", "2999-01-01", "--timezone", "Nowhere/Land"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid timezone"));

    tally(dir.path())
        .env("TALLY_TIMEZONE", "Nowhere/Land")
        .args(["period", "weekly"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid timezone"));

    tally(dir.path())
        .env("TALLY_TIMEZONE", "Pacific/Kiritimati")
        .args(["check-start", "2999-01-01"])
        .assert()
        .success()
        .stdout("ok\n");
}

#[test]
fn test_next_monthly_clamps_to_month_end() {
    let dir = tempfile::tempdir().unwrap();
    tally(dir.path())
        .args(["next", "monthly", "2024-01-31"])
        .assert()
        .success()
        .stdout("2024-02-29\n");
}

#[test]
fn test_next_weekly_several() {
    let dir = tempfile::tempdir().unwrap();
    tally(dir.path())
        .args(["next", "weekly", "2024-03-15", "--count", "3"])
        .assert()
        .success()
        .stdout("2024-03-22\n2024-03-29\n2024-04-05\n");
}

// ── Backend commands ────────────────────────────────────────────────────────

#[test]
fn test_missing_api_url() {
    let dir = tempfile::tempdir().unwrap();
    tally(dir.path())
        .args(["budgets", "list", "--session-file"])
        .arg(dir.path().join("session.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("TALLY_API_URL is not set"));
}

#[test]
fn test_not_logged_in() {
    let dir = tempfile::tempdir().unwrap();
    tally(dir.path())
        .args(["budgets", "list", "--api-url", "http://127.0.0.1:9", "--session-file"])
        .arg(dir.path().join("session.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"))
        .stderr(predicate::str::contains("tally login"));
}

#[test]
fn test_login_then_list_uses_cached_session() {
    let dir = tempfile::tempdir().unwrap();
    let session_file = dir.path().join("session.json");
    let mut server = mockito::Server::new();
    let url = server.url();

    let login = server
        .mock("POST", "/auth/login")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"accessToken":"a1","refreshToken":"r1"}"#)
        .create();
    let budgets = server
        .mock("GET", "/budgets")
        .match_header("authorization", "Bearer a1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create();

    tally(dir.path())
        .args(["login", "--email", "me@example.com", "--password", "pw"])
        .args(["--api-url", url.as_str()])
        .arg("--session-file")
        .arg(&session_file)
        .assert()
        .success()
        .stderr(predicate::str::contains("Logged in as me@example.com"));
    assert!(std::fs::read_to_string(&session_file).unwrap().contains("a1"));

    tally(dir.path())
        .args(["budgets", "list", "--api-url", url.as_str()])
        .arg("--session-file")
        .arg(&session_file)
        .assert()
        .success()
        .stdout("[]\n");

    login.assert();
    budgets.assert();
}

#[test]
fn test_expired_session_removes_cache() {
    let dir = tempfile::tempdir().unwrap();
    let session_file = dir.path().join("session.json");
    std::fs::write(&session_file, r#"{"access_token":"stale","refresh_token":"r0"}"#).unwrap();

    let mut server = mockito::Server::new();
    let url = server.url();
    let _budgets = server.mock("GET", "/budgets").with_status(401).create();
    let _refresh = server.mock("POST", "/auth/refresh").with_status(401).create();

    tally(dir.path())
        .args(["budgets", "list", "--api-url", url.as_str()])
        .arg("--session-file")
        .arg(&session_file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Session expired"));
    assert!(!session_file.exists());
}

#[test]
fn test_login_wrong_password_is_not_an_expired_session() {
    let dir = tempfile::tempdir().unwrap();
    let session_file = dir.path().join("session.json");
    let mut server = mockito::Server::new();
    let url = server.url();

    let _login = server
        .mock("POST", "/auth/login")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":"Invalid credentials"}"#)
        .create();
    let refresh = server.mock("POST", "/auth/refresh").expect(0).create();

    tally(dir.path())
        .args(["login", "--email", "me@example.com", "--password", "wrong"])
        .args(["--api-url", url.as_str()])
        .arg("--session-file")
        .arg(&session_file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid credentials"))
        .stderr(predicate::str::contains("Session expired").not());

    refresh.assert();
    assert!(!session_file.exists());
}
