//! Error scenario integration tests

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn voicenote(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("voicenote").expect("binary builds");
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env("HOME", config_home.path())
        .env_remove("OPENAI_API_KEY");
    cmd
}

#[test]
fn config_get_unknown_key() {
    let home = TempDir::new().unwrap();
    voicenote(&home)
        .args(["config", "get", "unknown_key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown key"))
        .stderr(predicate::str::contains("upload_format"));
}

#[test]
fn config_set_unknown_key() {
    let home = TempDir::new().unwrap();
    voicenote(&home)
        .args(["config", "set", "duration", "30s"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown key"));
}

#[test]
fn config_set_invalid_duration() {
    let home = TempDir::new().unwrap();
    voicenote(&home)
        .args(["config", "set", "max_duration", "forever"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid duration format"));
}

#[test]
fn config_set_invalid_frame_rate() {
    let home = TempDir::new().unwrap();
    voicenote(&home)
        .args(["config", "set", "frame_rate", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("frame_rate"));
}

#[test]
fn config_set_invalid_upload_format() {
    let home = TempDir::new().unwrap();
    voicenote(&home)
        .args(["config", "set", "upload_format", "mp3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid upload format"));
}

#[test]
fn config_list_with_no_file() {
    let home = TempDir::new().unwrap();
    voicenote(&home)
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("api_key: (not set)"));
}

#[test]
fn broken_config_file_is_reported_and_ignored() {
    let home = TempDir::new().unwrap();
    let dir = home.path().join("voicenote");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), "frame_rate = \"fast\"\n").unwrap();

    voicenote(&home)
        .write_stdin("quit\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Ignoring config file"));
}

#[test]
fn invalid_max_duration_flag_is_usage_error() {
    let home = TempDir::new().unwrap();
    voicenote(&home)
        .args(["--max-duration", "soon"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid max duration"));
}

#[test]
fn invalid_frame_rate_flag_is_usage_error() {
    let home = TempDir::new().unwrap();
    voicenote(&home)
        .args(["--frame-rate", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid frame rate"));
}

#[test]
fn invalid_upload_format_flag_is_rejected_by_clap() {
    let home = TempDir::new().unwrap();
    voicenote(&home)
        .args(["--upload-format", "ogg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ogg"));
}
