//! Integration tests for the `leakscope` binary

use assert_cmd::Command;
use leak_analysis_disposer::DisposerConfig;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

/// Disposer registry with an empty tree and one disposed editor that a
/// static cache field still holds.
const LEAKING_SNAPSHOT: &str = r#"{
    "classes": [
        { "id": 1, "name": "com.intellij.openapi.util.Disposer", "static_fields": { "ourTree": 20 } },
        { "id": 2, "name": "com.intellij.openapi.util.ObjectTree" },
        { "id": 3, "name": "com.intellij.openapi.util.ObjectNode" },
        { "id": 4, "name": "java.util.Collections$EmptyList" },
        { "id": 5, "name": "com.intellij.util.containers.WeakHashMap" },
        { "id": 6, "name": "com.intellij.util.containers.RefHashMap$MyMap" },
        { "id": 7, "name": "com.intellij.util.containers.WeakHashMap$WeakKey", "weak": true },
        { "id": 8, "name": "[Ljava.lang.ref.Reference;" },
        { "id": 9, "name": "com.example.Editor" },
        { "id": 10, "name": "com.example.Cache", "static_fields": { "EDITOR": 30 } }
    ],
    "objects": [
        { "id": 20, "class": 2, "size": 4, "fields": { "myRootNode": 21, "myDisposedObjects": 23 } },
        { "id": 21, "class": 3, "size": 4, "fields": { "myObject": 0, "myChildren": 22 } },
        { "id": 22, "class": 4, "size": 2 },
        { "id": 23, "class": 5, "size": 4, "fields": { "myMap": 24 } },
        { "id": 24, "class": 6, "size": 4, "fields": { "keys": 25 } },
        { "id": 25, "class": 8, "size": 5, "elements": [26] },
        { "id": 26, "class": 7, "size": 4, "fields": { "referent": 30 } },
        { "id": 30, "class": 9, "size": 8 }
    ]
}"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("heap.json"), LEAKING_SNAPSHOT).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> String {
        self.dir.path().join(name).display().to_string()
    }
}

fn leakscope() -> Command {
    let mut cmd = Command::cargo_bin("leakscope").unwrap();
    cmd.env_remove("RUST_LOG").env_remove("LOG_FORMAT");
    cmd
}

#[test]
fn test_analyze_prints_report_to_stdout() {
    let ws = Workspace::new();

    let output = leakscope()
        .args(["analyze", "--snapshot", &ws.path("heap.json")])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        stdout.lines().collect::<Vec<_>>(),
        vec![
            "Count of disposed-but-strong-referenced objects: 1",
            "  1 com.example.Editor",
            "",
            "Disposed-but-strong-referenced dominator object count: 1",
            "Disposed-but-strong-referenced dominator sub-graph size: 32B",
            "     32B - 1 com.example.Editor",
            "",
            "Disposed but still strong-referenced objects: 1 com.example.Editor, most common paths from GC-roots:",
            "[     1/100%] (root) class com.example.Cache",
            "  [     1/100%] static EDITOR com.example.Editor",
        ]
    );
}

#[test]
fn test_analyze_writes_report_to_output_file() {
    let ws = Workspace::new();
    let report_path = ws.path("report.txt");

    leakscope()
        .args(["analyze", "--snapshot", &ws.path("heap.json"), "--output", &report_path])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let report = fs::read_to_string(&report_path).unwrap();
    assert!(report.starts_with("Count of disposed-but-strong-referenced objects: 1\n"));
}

#[test]
fn test_flags_switch_off_sections() {
    let ws = Workspace::new();

    leakscope()
        .args([
            "analyze",
            "--snapshot",
            &ws.path("heap.json"),
            "--no-summary",
            "--no-details",
        ])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_config_file_is_applied() {
    let ws = Workspace::new();
    fs::write(
        ws.path("leakscope.toml"),
        "include_disposed_objects_details = false\nword_size_bytes = 8\n",
    )
    .unwrap();

    leakscope()
        .args([
            "analyze",
            "--snapshot",
            &ws.path("heap.json"),
            "--config",
            &ws.path("leakscope.toml"),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("sub-graph size: 64B"))
        .stdout(predicate::str::contains("most common paths").not());
}

#[test]
fn test_missing_snapshot_fails_with_exit_code_1() {
    let ws = Workspace::new();

    leakscope()
        .args(["analyze", "--snapshot", &ws.path("missing.json")])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to read heap snapshot"));
}

#[test]
fn test_invalid_config_fails() {
    let ws = Workspace::new();
    fs::write(ws.path("bad.toml"), "max_tree_depth = \"deep\"\n").unwrap();

    leakscope()
        .args([
            "analyze",
            "--snapshot",
            &ws.path("heap.json"),
            "--config",
            &ws.path("bad.toml"),
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid config file"));
}

#[test]
fn test_default_config_round_trips() {
    let output = leakscope().arg("default-config").output().unwrap();

    assert!(output.status.success());
    let config: DisposerConfig = toml::from_str(&String::from_utf8(output.stdout).unwrap()).unwrap();
    assert_eq!(config, DisposerConfig::default());
}

#[test]
fn test_rust_log_overrides_log_level() {
    let ws = Workspace::new();

    leakscope()
        .env("RUST_LOG", "info")
        .args(["analyze", "--snapshot", &ws.path("heap.json"), "--log-format", "json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Indexed heap snapshot"));

    leakscope()
        .args(["analyze", "--snapshot", &ws.path("heap.json"), "--log-format", "json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Indexed heap snapshot").not());
}
