//! Integration tests for the eventline binary

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// Run eventline and return (success, stdout, stderr)
fn run_eventline(args: &[&str]) -> (bool, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_eventline"))
        .args(args)
        .output()
        .expect("Failed to execute eventline");

    (
        output.status.success(),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

/// Write a tweet file with a burst in the sixth minute
fn write_tweets(dir: &Path) -> PathBuf {
    let mut lines = Vec::new();
    let mut id = 0;
    let mut push = |ts: i64, text: &str| {
        id += 1;
        lines.push(format!(
            r#"{{"id_str": "{}", "text": "{}", "timestamp_ms": "{}"}}"#,
            id,
            text,
            ts * 1000
        ));
    };
    for window in 0..5 {
        for i in 0..3 {
            push(window * 60 + 10 + i, "referee whistle match");
        }
    }
    for i in 0..5 {
        push(310 + i, "goal france scores");
    }
    push(330, "referee whistle match");
    lines.push("not json".to_string());

    let path = dir.join("tweets.jsonl");
    std::fs::write(&path, lines.join("\n")).unwrap();
    path
}

fn init_config(dir: &Path) -> PathBuf {
    let path = dir.join("eventline.toml");
    let (success, stdout, stderr) =
        run_eventline(&["init-config", "--output", path.to_str().unwrap()]);
    assert!(success, "init-config failed: {}", stderr);
    assert!(stdout.contains("eventline.toml"));
    path
}

#[test]
fn test_version() {
    let (success, stdout, _) = run_eventline(&["--version"]);
    assert!(success);
    assert!(stdout.contains("eventline"));
}

#[test]
fn test_init_config_refuses_overwrite() {
    let dir = TempDir::new().unwrap();
    let path = init_config(dir.path());
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("[window]"));
    assert!(content.contains("algorithm = \"eld\""));

    let (success, _, stderr) = run_eventline(&["init-config", "--output", path.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("already exists"));

    let (success, _, _) = run_eventline(&[
        "init-config",
        "--output",
        path.to_str().unwrap(),
        "--force",
    ]);
    assert!(success);
}

#[test]
fn test_replay_prints_developments() {
    let dir = TempDir::new().unwrap();
    let config = init_config(dir.path());
    let input = write_tweets(dir.path());

    let (success, stdout, stderr) = run_eventline(&[
        "replay",
        "--input",
        input.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);
    assert!(success, "replay failed: {}", stderr);
    assert!(stderr.contains("invalid JSON"));

    let developments: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(developments.len(), 1);
    assert_eq!(developments[0]["timestamp"], 360);
}

#[test]
fn test_replay_to_file() {
    let dir = TempDir::new().unwrap();
    let config = init_config(dir.path());
    let input = write_tweets(dir.path());
    let output = dir.path().join("developments.jsonl");

    let (success, stdout, _) = run_eventline(&[
        "replay",
        "--input",
        input.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
        "--summary",
    ]);
    assert!(success);
    assert!(stdout.is_empty());
    let written = std::fs::read_to_string(&output).unwrap();
    assert_eq!(written.lines().count(), 1);
}

#[test]
fn test_compare_counts_per_detector() {
    let dir = TempDir::new().unwrap();
    let config = init_config(dir.path());
    let input = write_tweets(dir.path());

    let (success, stdout, stderr) = run_eventline(&[
        "compare",
        "--input",
        input.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--detectors",
        "eld,cataldi",
    ]);
    assert!(success, "compare failed: {}", stderr);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["eld\t1", "cataldi\t1"]);
}

#[test]
fn test_unknown_detector_fails() {
    let dir = TempDir::new().unwrap();
    let config = init_config(dir.path());
    let input = write_tweets(dir.path());

    let (success, _, stderr) = run_eventline(&[
        "compare",
        "--input",
        input.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--detectors",
        "kleinberg",
    ]);
    assert!(!success);
    assert!(stderr.contains("Unknown detector"));
}

#[test]
fn test_missing_config_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_tweets(dir.path());
    let (success, _, stderr) = run_eventline(&[
        "replay",
        "--input",
        input.to_str().unwrap(),
        "--config",
        dir.path().join("absent.toml").to_str().unwrap(),
    ]);
    assert!(!success);
    assert!(stderr.contains("Config file not found"));
}
