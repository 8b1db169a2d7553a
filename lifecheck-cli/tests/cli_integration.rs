//! CLI integration tests for lifecheck-cli.
//!
//! These tests run the actual binary and check outputs and exit codes.
//! Liveness checks use the process backend with small shell scripts, or an
//! unreachable HTTP endpoint.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get a Command for the lifecheck binary with a clean liveness environment.
fn lifecheck() -> Command {
    let mut cmd = Command::cargo_bin("lifecheck").unwrap();
    for var in [
        "LIVENESS_BACKEND",
        "LIVENESS_API_URL",
        "LIVENESS_API_TOKEN",
        "LIVENESS_PROGRAM",
        "LIVENESS_SCRIPT",
        "LIVENESS_TIMEOUT_SECS",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Reference photo and clip in a fresh temp dir.
fn media_fixture() -> (TempDir, PathBuf, PathBuf) {
    let temp = TempDir::new().unwrap();
    let photo = temp.path().join("me.jpg");
    let video = temp.path().join("clip.mp4");
    fs::write(&photo, b"\xFF\xD8\xFF\xE0 fake jpeg").unwrap();
    fs::write(&video, b"fake mp4 frames").unwrap();
    (temp, photo, video)
}

fn write_script(dir: &Path, body: &str) -> PathBuf {
    let script = dir.join("liveness.sh");
    fs::write(&script, body).unwrap();
    script
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_displays_usage() {
    lifecheck()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Liveness verification for registered users",
        ))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn test_version_displays_version() {
    lifecheck()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("lifecheck"));
}

#[test]
fn test_help_shows_exit_codes() {
    lifecheck()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exit codes:"))
        .stdout(predicate::str::contains("65"))
        .stdout(predicate::str::contains("69"));
}

#[test]
fn test_check_help_shows_options() {
    lifecheck()
        .args(["check", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--photo"))
        .stdout(predicate::str::contains("--video"))
        .stdout(predicate::str::contains("--backend"))
        .stdout(predicate::str::contains("--json"));
}

#[test]
fn test_check_requires_photo_and_video() {
    lifecheck()
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--photo"));
}

// ============================================================================
// Status Tests
// ============================================================================

#[test]
fn test_status_never_verified_is_required() {
    lifecheck()
        .args(["status", "--at", "2026-10-16T00:00:00Z"])
        .assert()
        .code(65)
        .stdout(predicate::str::contains("never"))
        .stdout(predicate::str::contains("RE-VERIFICATION REQUIRED"));
}

#[test]
fn test_status_recent_verification_is_up_to_date() {
    lifecheck()
        .args([
            "status",
            "--last",
            "2026-06-01T00:00:00Z",
            "--at",
            "2026-10-16T00:00:00Z",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("up to date"));
}

#[test]
fn test_status_json_at_window_boundary() {
    // Exactly 180 days old is stale
    let output = lifecheck()
        .args([
            "status",
            "--last",
            "2026-01-01T00:00:00Z",
            "--at",
            "2026-06-30T00:00:00Z",
            "--json",
        ])
        .assert()
        .code(65)
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["verificationRequired"], true);
    assert_eq!(json["freshnessWindowDays"], 180);
}

#[test]
fn test_status_invalid_timestamp_is_usage_error() {
    lifecheck()
        .args(["status", "--last", "last tuesday"])
        .assert()
        .code(64)
        .stderr(predicate::str::contains("Invalid RFC 3339 timestamp"));
}

// ============================================================================
// Check Tests
// ============================================================================

#[test]
fn test_check_missing_video_returns_input_error() {
    let (temp, photo, _) = media_fixture();

    lifecheck()
        .args([
            "check",
            "--photo",
            path_str(&photo),
            "--video",
            path_str(&temp.path().join("missing.mp4")),
        ])
        .assert()
        .code(66)
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn test_check_non_video_returns_input_error() {
    let (temp, photo, _) = media_fixture();
    let notes = temp.path().join("notes.txt");
    fs::write(&notes, b"not a clip").unwrap();

    lifecheck()
        .args([
            "check",
            "--photo",
            path_str(&photo),
            "--video",
            path_str(&notes),
        ])
        .assert()
        .code(66)
        .stderr(predicate::str::contains("Please upload a video file"));
}

#[test]
fn test_check_unreachable_http_backend() {
    let (temp, photo, video) = media_fixture();

    lifecheck()
        .env("LIVENESS_API_URL", "http://127.0.0.1:1")
        .env("LIVENESS_TIMEOUT_SECS", "5")
        .args([
            "check",
            "--photo",
            path_str(&photo),
            "--video",
            path_str(&video),
            "--backend",
            "http",
            "--temp-dir",
            path_str(&temp.path().join("staging")),
        ])
        .assert()
        .code(69)
        .stderr(predicate::str::contains("Liveness check failed"));

    // Staged clip is gone even when the backend fails
    let leftovers = fs::read_dir(temp.path().join("staging")).unwrap().count();
    assert_eq!(leftovers, 0);
}

#[cfg(unix)]
#[test]
fn test_check_process_backend_verified() {
    let (temp, photo, video) = media_fixture();
    let script = write_script(
        temp.path(),
        "[ -f \"$1\" ] && [ -f \"$2\" ] || exit 3\necho \"blink detected\"\nexit 0\n",
    );

    lifecheck()
        .env("LIVENESS_PROGRAM", "/bin/sh")
        .env("LIVENESS_SCRIPT", path_str(&script))
        .args([
            "check",
            "--photo",
            path_str(&photo),
            "--video",
            path_str(&video),
            "--backend",
            "process",
            "--temp-dir",
            path_str(&temp.path().join("staging")),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("VERIFIED"))
        .stdout(predicate::str::contains("Liveness check passed: blink detected"));
}

#[cfg(unix)]
#[test]
fn test_check_process_backend_rejected_json() {
    let (temp, photo, video) = media_fixture();
    let script = write_script(temp.path(), "echo \"no motion\" >&2\nexit 1\n");

    let output = lifecheck()
        .env("LIVENESS_BACKEND", "process")
        .env("LIVENESS_PROGRAM", "/bin/sh")
        .env("LIVENESS_SCRIPT", path_str(&script))
        .args([
            "check",
            "--photo",
            path_str(&photo),
            "--video",
            path_str(&video),
            "--temp-dir",
            path_str(&temp.path().join("staging")),
            "--json",
        ])
        .assert()
        .code(65)
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["verified"], false);
    assert_eq!(json["reason"], "Liveness check failed: no motion");
    assert_eq!(json["details"]["exitCode"], 1.0);
}
