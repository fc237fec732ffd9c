#![allow(deprecated)]
use assert_cmd::Command;
use chrono::Utc;
use predicates::prelude::*;
use rei_core::activity::{ActivityDb, ActivityEntry, ActivitySink};
use rei_core::token::TokenSigner;
use rei_core::types::{Outcome, Reason, Source};
use tempfile::TempDir;

fn rei(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("rei").unwrap();
    cmd.current_dir(dir.path())
        .env("REI_DATA_DIR", dir.path().join(".rei"))
        .env_remove("REI_TOKEN_SECRET")
        .env_remove("SLACK_SIGNING_SECRET")
        .env_remove("SLACK_BOT_TOKEN");
    cmd
}

fn init(dir: &TempDir) {
    rei(dir).arg("init").assert().success();
}

fn data(dir: &TempDir, file: &str) -> String {
    std::fs::read_to_string(dir.path().join(".rei").join(file)).unwrap()
}

/// Add a user and return its generated id.
fn add_user(dir: &TempDir, name: &str, role: &str, email: &str) -> String {
    let out = rei(dir)
        .args(["--json", "user", "add", name, "--role", role, "--email", email])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let user: serde_json::Value = serde_json::from_slice(&out).unwrap();
    user["id"].as_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// rei init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_config_and_users() {
    let dir = TempDir::new().unwrap();
    rei(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("created: rei.yaml"));

    let cfg: serde_yaml::Value = serde_yaml::from_str(&data(&dir, "rei.yaml")).unwrap();
    let secret = cfg["auth"]["token_secret"].as_str().unwrap();
    assert_eq!(secret.len(), 64);
    assert!(data(&dir, "users.yaml").contains("users"));
}

#[test]
fn init_keeps_existing_secret() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    let before = data(&dir, "rei.yaml");
    rei(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists:  rei.yaml"));
    assert_eq!(before, data(&dir, "rei.yaml"));
}

#[test]
fn commands_require_init() {
    let dir = TempDir::new().unwrap();
    rei(&dir)
        .args(["user", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("rei init"));
}

// ---------------------------------------------------------------------------
// rei user
// ---------------------------------------------------------------------------

#[test]
fn user_lifecycle() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    let id = add_user(&dir, "Dana", "acquisitions", "dana@example.com");

    rei(&dir)
        .args(["user", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dana"))
        .stdout(predicate::str::contains("acquisitions"));

    rei(&dir)
        .args(["user", "set-role", "dana@example.com", "manager"])
        .assert()
        .success()
        .stdout(predicate::str::contains("role=manager"));

    rei(&dir)
        .args(["user", "disable", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("disabled"));

    rei(&dir)
        .args(["user", "link-slack", &id, "U123ABC"])
        .assert()
        .success();

    let out = rei(&dir)
        .args(["--json", "user", "list"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let users: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(users[0]["role"], "manager");
    assert_eq!(users[0]["active"], false);
    assert_eq!(users[0]["slack_user_id"], "U123ABC");

    rei(&dir).args(["user", "enable", &id]).assert().success();
    assert!(data(&dir, "users.yaml").contains("active: true"));
}

#[test]
fn duplicate_email_is_rejected() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    add_user(&dir, "Dana", "member", "dana@example.com");
    rei(&dir)
        .args(["user", "add", "Other", "--email", "DANA@example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn unknown_role_is_rejected() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    rei(&dir)
        .args(["user", "add", "Dana", "--role", "intern"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid role 'intern'"));
}

#[test]
fn unknown_user_is_an_error() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    rei(&dir)
        .args(["user", "disable", "nobody"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("user not found: nobody"));
}

// ---------------------------------------------------------------------------
// rei token
// ---------------------------------------------------------------------------

#[test]
fn issued_token_verifies_with_configured_secret() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    let id = add_user(&dir, "Dana", "dispositions", "dana@example.com");

    let out = rei(&dir)
        .args(["token", "issue", "dana@example.com", "--hours", "2"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let token = String::from_utf8(out).unwrap().trim().to_string();

    let cfg: serde_yaml::Value = serde_yaml::from_str(&data(&dir, "rei.yaml")).unwrap();
    let secret = cfg["auth"]["token_secret"].as_str().unwrap();
    let claims = TokenSigner::new(secret).verify(&token, Utc::now()).unwrap();
    assert_eq!(claims.sub, id);
    assert_eq!(claims.exp - claims.iat, 2 * 3600);
}

#[test]
fn token_for_unknown_user_fails() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    rei(&dir)
        .args(["token", "issue", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("user not found"));
}

// ---------------------------------------------------------------------------
// rei policy / check
// ---------------------------------------------------------------------------

#[test]
fn policy_lists_every_role() {
    let dir = TempDir::new().unwrap();
    rei(&dir)
        .arg("policy")
        .assert()
        .success()
        .stdout(predicate::str::contains("dispositions"))
        .stdout(predicate::str::contains("lookup, buyers"));
}

#[test]
fn check_reports_allow_and_deny() {
    let dir = TempDir::new().unwrap();
    rei(&dir)
        .args(["check", "member", "skip"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("deny"));
    rei(&dir)
        .args(["check", "manager", "activity"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("allow"));
    rei(&dir)
        .args(["check", "member", "frobnicate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown tool"));
}

// ---------------------------------------------------------------------------
// rei activity
// ---------------------------------------------------------------------------

#[test]
fn activity_reads_the_log() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    {
        let db = ActivityDb::open(&dir.path().join(".rei/activity.redb")).unwrap();
        db.append(ActivityEntry::new(
            "u1",
            "skip",
            "123 Main St",
            Source::Slack,
            Outcome::Denied,
            Some(Reason::InsufficientRole),
        ))
        .unwrap();
        db.append(ActivityEntry::new(
            "u2",
            "lookup",
            "1 Elm St",
            Source::Api,
            Outcome::Success,
            None,
        ))
        .unwrap();
    }

    rei(&dir)
        .arg("activity")
        .assert()
        .success()
        .stdout(predicate::str::contains("insufficient_role"))
        .stdout(predicate::str::contains("1 Elm St"));

    let out = rei(&dir)
        .args(["--json", "activity", "--actor", "u1", "--since", "1h"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let entries: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(entries.as_array().unwrap().len(), 1);
    assert_eq!(entries[0]["tool"], "skip");
}

#[test]
fn activity_rejects_bad_times() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    rei(&dir)
        .args(["activity", "--since", "yesterday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("yesterday"));
}
