//! CLI integration tests
//!
//! Every run points XDG_CONFIG_HOME at a temporary directory so the user's
//! real config is never read or written.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn voicenote(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("voicenote").expect("binary builds");
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env("HOME", config_home.path())
        .env_remove("OPENAI_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_output() {
    let home = TempDir::new().unwrap();
    voicenote(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--max-duration"))
        .stdout(predicate::str::contains("--frame-rate"))
        .stdout(predicate::str::contains("--upload-format"))
        .stdout(predicate::str::contains("--language"));
}

#[test]
fn version_output() {
    let home = TempDir::new().unwrap();
    voicenote(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("voicenote"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn config_path_uses_xdg_home() {
    let home = TempDir::new().unwrap();
    voicenote(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("voicenote"))
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn config_init_then_list() {
    let home = TempDir::new().unwrap();
    voicenote(&home).args(["config", "init"]).assert().success();

    voicenote(&home)
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("max_duration: 3m"))
        .stdout(predicate::str::contains("frame_rate: 60"))
        .stdout(predicate::str::contains("model: whisper-1"))
        .stdout(predicate::str::contains("upload_format: flac"));

    voicenote(&home)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn config_set_then_get() {
    let home = TempDir::new().unwrap();
    voicenote(&home)
        .args(["config", "set", "max_duration", "90s"])
        .assert()
        .success();

    voicenote(&home)
        .args(["config", "get", "max_duration"])
        .assert()
        .success()
        .stdout(predicate::str::contains("90s"));

    voicenote(&home)
        .args(["config", "get", "language"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(not set)"));
}

#[test]
fn config_get_masks_api_key() {
    let home = TempDir::new().unwrap();
    voicenote(&home)
        .args(["config", "set", "api_key", "sk-test-1234567890"])
        .assert()
        .success();

    voicenote(&home)
        .args(["config", "get", "api_key"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sk-t...7890"))
        .stdout(predicate::str::contains("1234567890").not());
}

#[test]
fn session_reports_idle_status_and_quits() {
    let home = TempDir::new().unwrap();
    voicenote(&home)
        .write_stdin("help\nstatus\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("state: idle"));
}

#[test]
fn session_ends_at_end_of_input() {
    let home = TempDir::new().unwrap();
    voicenote(&home).write_stdin("").assert().success();
}

#[test]
fn session_transcribe_json_without_key_reports_failure() {
    let home = TempDir::new().unwrap();
    voicenote(&home)
        .write_stdin("transcribe --json\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"success\": false"))
        .stdout(predicate::str::contains("OPENAI_API_KEY is not set"));
}

#[test]
fn session_transcribe_json_without_recording_reports_failure() {
    let home = TempDir::new().unwrap();
    voicenote(&home)
        .env("OPENAI_API_KEY", "sk-test")
        .write_stdin("transcribe --json\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"success\": false"))
        .stdout(predicate::str::contains("No audio recorded"));
}

#[test]
fn session_rejects_unknown_command_and_continues() {
    let home = TempDir::new().unwrap();
    voicenote(&home)
        .write_stdin("rewind\nstatus\nquit\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Unknown command"))
        .stdout(predicate::str::contains("state: idle"));
}

#[test]
fn session_playback_commands_are_noops_while_idle() {
    let home = TempDir::new().unwrap();
    voicenote(&home)
        .write_stdin("play\nseek 50\nskip -10\nscrub begin\nscrub end\ndelete\nstop\nstatus\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("state: idle"));
}

#[test]
fn session_honours_max_duration_flag() {
    let home = TempDir::new().unwrap();
    voicenote(&home)
        .args(["--max-duration", "90s"])
        .write_stdin("quit\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Max recording 1:30"));
}
