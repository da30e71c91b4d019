//! Integration tests for the `nrgym` CLI binary.
//!
//! Argument parsing, help output, completions and error exit codes run
//! offline. The portal-backed cases point `--portal-url` at a wiremock
//! server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `nrgym` binary with env isolation.
///
/// Clears the `NRGYM_*` and `NRG_*` variables and points config
/// directories at a throwaway path so tests never touch real settings.
fn nrgym_cmd(home: &tempfile::TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("nrgym");
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .env_remove("RUST_LOG")
        .env_remove("NRGYM_PROFILE")
        .env_remove("NRGYM_EMAIL")
        .env_remove("NRGYM_PORTAL_URL")
        .env_remove("NRGYM_CLUB_ID")
        .env_remove("NRGYM_USER_ID")
        .env_remove("NRGYM_OUTPUT")
        .env_remove("NRGYM_TIMEOUT")
        .env_remove("NRG_EMAIL")
        .env_remove("NRG_PASSWORD");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn home() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

fn portal(suffix: &str) -> String {
    format!("/clientportal2/{suffix}")
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(portal("Auth/Login")))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "CpAuthToken=tok-cli; Path=/; HttpOnly")
                .set_body_json(json!({ "User": { "Member": { "Id": 41 } } })),
        )
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = home();
    let output = nrgym_cmd(&home).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let home = home();
    nrgym_cmd(&home).arg("--help").assert().success().stdout(
        predicate::str::contains("gym portal")
            .and(predicate::str::contains("bookings"))
            .and(predicate::str::contains("occupancy"))
            .and(predicate::str::contains("contracts"))
            .and(predicate::str::contains("entities")),
    );
}

#[test]
fn test_version_flag() {
    let home = home();
    nrgym_cmd(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("nrgym"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    let home = home();
    nrgym_cmd(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    let home = home();
    nrgym_cmd(&home)
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_points_at_toml() {
    let home = home();
    nrgym_cmd(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_show_no_config() {
    // Missing file means defaults, not an error.
    let home = home();
    nrgym_cmd(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[defaults]"));
}

#[test]
fn test_config_subcommands_exist() {
    let home = home();
    nrgym_cmd(&home)
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("init")
                .and(predicate::str::contains("show"))
                .and(predicate::str::contains("path"))
                .and(predicate::str::contains("set-password")),
        );
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let home = home();
    let output = nrgym_cmd(&home).arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_invalid_output_format() {
    let home = home();
    let output = nrgym_cmd(&home)
        .args(["--output", "invalid", "occupancy"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("possible values"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_missing_credentials_exit_code() {
    let home = home();
    nrgym_cmd(&home)
        .arg("occupancy")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("No credentials"));
}

#[test]
fn test_unknown_profile_exit_code() {
    let home = home();
    nrgym_cmd(&home)
        .args(["--profile", "work", "bookings"])
        .assert()
        .code(9)
        .stderr(predicate::str::contains("work"));
}

#[test]
fn test_watch_rejects_short_interval() {
    let home = home();
    nrgym_cmd(&home)
        .env("NRG_PASSWORD", "hunter2")
        .args([
            "--email",
            "member@example.com",
            "--portal-url",
            "http://127.0.0.1:9",
            "watch",
            "--interval",
            "60",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("update_interval"));
}

// ── Portal-backed ───────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_occupancy_json_against_mock_portal() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path(portal("Clubs/Clubs/GetMembersInClubs")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "UsersInClubList": [
                { "ClubId": 5, "ClubName": "Manchester", "UsersCountCurrentlyInClub": 57 },
                { "ClubId": 9, "ClubName": "Leeds", "UsersCountCurrentlyInClub": 21 }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let home = home();
    let output = nrgym_cmd(&home)
        .env("NRG_PASSWORD", "hunter2")
        .args([
            "--portal-url",
            &server.uri(),
            "--email",
            "member@example.com",
            "--club-id",
            "5",
            "-o",
            "json",
            "occupancy",
        ])
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    let body: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["total"], 78);
    assert_eq!(body["clubs"][1]["name"], "Leeds");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_adopts_home_club() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path(portal("Auth/Login/Identity")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Member": { "Id": 41, "FirstName": "Jane", "HomeClubId": 9 }
        })))
        .mount(&server)
        .await;

    let home = home();
    let output = nrgym_cmd(&home)
        .env("NRG_PASSWORD", "hunter2")
        .args([
            "--portal-url",
            &server.uri(),
            "--email",
            "member@example.com",
            "-o",
            "json-compact",
            "login",
        ])
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    let body: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["user_id"], 41);
    assert_eq!(body["club_id"], 9);
    assert!(String::from_utf8_lossy(&output.stderr).contains("Logged in as Jane"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_login_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(portal("Auth/Login")))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid login"))
        .mount(&server)
        .await;

    let home = home();
    let output = nrgym_cmd(&home)
        .env("NRG_PASSWORD", "wrong")
        .args([
            "--portal-url",
            &server.uri(),
            "--email",
            "member@example.com",
            "--club-id",
            "5",
            "occupancy",
        ])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
}
