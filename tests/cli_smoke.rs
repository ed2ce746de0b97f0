use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

// nothing listens on port 1, so every request is refused immediately
const UNREACHABLE: &str = "http://127.0.0.1:1";

fn offline(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("obsidian-stats").unwrap();
    cmd.env_remove("GITHUB_TOKEN")
        .env_remove("RUST_LOG")
        .args(["--api-base", UNREACHABLE, "--raw-base", UNREACHABLE])
        .args(["--theme-stats-url", UNREACHABLE, "--timeout", "2s", "--headless"])
        .arg("--data-dir")
        .arg(data_dir);
    cmd
}

#[test]
fn help_lists_kind_flags() {
    let mut cmd = Command::cargo_bin("obsidian-stats").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--plugins").and(predicate::str::contains("--history")));
}

#[test]
fn cached_history_renders_headless_charts() {
    let dir = tempdir().unwrap();
    let saved = dir.path().join("saved_plugins");
    fs::create_dir_all(&saved).unwrap();
    fs::write(
        saved.join("monthly_plugin_counts.json"),
        r#"{"2024-01": 1200, "2024-02": 1250, "2024-03": 1302}"#,
    )
    .unwrap();
    fs::write(
        saved.join("monthly_plugin_downloads.json"),
        r#"{"2024-01": 31000000, "2024-02": 32500000, "2024-03": 34000000}"#,
    )
    .unwrap();

    offline(dir.path())
        .args(["-p", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Monthly Plugin Counts"))
        .stdout(predicate::str::contains("Monthly Plugin Growth Rate"))
        .stderr(predicate::str::contains("using saved data"));

    // cached series are not rewritten
    let counts = fs::read_to_string(saved.join("monthly_plugin_counts.json")).unwrap();
    assert_eq!(counts, r#"{"2024-01": 1200, "2024-02": 1250, "2024-03": 1302}"#);
}

#[test]
fn missing_cache_skips_with_warning() {
    let dir = tempdir().unwrap();
    offline(dir.path())
        .args(["-t", "-H"])
        .assert()
        .success()
        .stderr(predicate::str::contains("skipping themes history"));
    assert!(!dir.path().join("saved_themes").exists());
}

#[test]
fn unreachable_releases_are_skipped() {
    let dir = tempdir().unwrap();
    offline(dir.path())
        .arg("-r")
        .assert()
        .success()
        .stderr(predicate::str::contains("skipping releases"));
}

#[test]
fn no_kind_selected_is_a_noop() {
    let dir = tempdir().unwrap();
    offline(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("nothing selected"));
}

#[test]
fn bad_color_fails_with_one_line() {
    let dir = tempdir().unwrap();
    offline(dir.path())
        .args(["-p", "--base-color", "purple"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:").and(predicate::str::contains("purple")));
}
