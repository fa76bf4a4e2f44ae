use assert_cmd::Command;

// CLI smoke tests for the flows that work without a TTY.

#[test]
fn help_lists_workout_flags() {
    let mut cmd = Command::cargo_bin("hitr").unwrap();
    let assert = cmd.arg("--help").assert().success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(output.contains("--rounds"));
    assert!(output.contains("--round-length"));
    assert!(output.contains("--difficulty"));
    assert!(output.contains("--history"));
}

#[test]
fn history_flag_works_without_a_tty() {
    // HOME redirected so the run cannot see (or touch) a real history db
    let home = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("hitr").unwrap();
    let assert = cmd
        .env("HOME", home.path())
        .arg("--history")
        .assert()
        .success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(output.contains("No workouts recorded yet."));
}

#[test]
fn interactive_mode_requires_a_tty() {
    let mut cmd = Command::cargo_bin("hitr").unwrap();
    cmd.write_stdin("").assert().failure();
}

#[test]
fn invalid_difficulty_is_rejected() {
    let mut cmd = Command::cargo_bin("hitr").unwrap();
    let assert = cmd.args(["-d", "extreme"]).assert().failure();
    let stderr = String::from_utf8(assert.get_output().stderr.clone()).unwrap();
    assert!(stderr.contains("invalid value"));
}
