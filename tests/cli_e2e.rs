//! End-to-end CLI tests for the postgrab binary.

use assert_cmd::Command;
use predicates::prelude::*;

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    let mut cmd = Command::cargo_bin("postgrab").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Extract the text and media"))
        .stdout(predicate::str::contains("--download"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    let mut cmd = Command::cargo_bin("postgrab").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("postgrab"));
}

/// A post URL is required.
#[test]
fn test_binary_missing_url_returns_error() {
    let mut cmd = Command::cargo_bin("postgrab").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("<POST_URL>"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    let mut cmd = Command::cargo_bin("postgrab").unwrap();
    cmd.args(["--invalid-flag", "https://www.linkedin.com/posts/a"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

/// Unsupported URLs are rejected before any network call, with their own exit code.
#[test]
fn test_binary_unsupported_url_exits_with_invalid_url_code() {
    let mut cmd = Command::cargo_bin("postgrab").unwrap();
    cmd.args(["-q", "https://example.com/posts/a"])
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("supported post link"));
}

/// Plain-http post links count as unsupported too.
#[test]
fn test_binary_insecure_url_rejected() {
    let mut cmd = Command::cargo_bin("postgrab").unwrap();
    cmd.args(["--no-retry", "http://www.linkedin.com/posts/a"])
        .env("RUST_LOG", "off")
        .assert()
        .code(2);
}

/// Out-of-range limits are rejected by argument parsing.
#[test]
fn test_binary_out_of_range_limits_rejected() {
    let mut cmd = Command::cargo_bin("postgrab").unwrap();
    cmd.args(["--max-downloads", "0", "https://www.linkedin.com/posts/a"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--max-downloads"));

    let mut cmd = Command::cargo_bin("postgrab").unwrap();
    cmd.args(["--timeout", "121", "https://www.linkedin.com/posts/a"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--timeout"));
}
