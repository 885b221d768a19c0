use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn validate_rejects_a_missing_reference_url() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("submission.zip");
    std::fs::write(&archive, b"not a zip").unwrap();

    let mut cmd = Command::cargo_bin("planval").unwrap();
    cmd.args([
        "validate",
        "--archive",
        archive.to_str().unwrap(),
        "--category",
        "c1",
    ]);
    // No --reference-url and no PLANVAL_REFERENCE_URL: clap should reject
    // the invocation before the pipeline ever runs.
    cmd.env_remove("PLANVAL_REFERENCE_URL");
    cmd.assert().failure();
}

#[test]
fn help_lists_both_subcommands() {
    let mut cmd = Command::cargo_bin("planval").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("latest-version"));
}
