//! Integration tests for headless mode.

use super::common::run_headless;

#[test]
fn test_headless_basic_execution() {
    let dir = tempfile::tempdir().unwrap();
    let run = run_headless(dir.path(), &["--events", "key:esc"]);

    assert_eq!(run.code, 0, "stderr: {}", run.stderr);
    assert!(run.stdout.contains("Events: 1 executed"));
    assert!(run.stdout.contains("Welcome to the Query Editor"));
}

#[test]
fn test_headless_run_query() {
    let dir = tempfile::tempdir().unwrap();
    let run = run_headless(
        dir.path(),
        &[
            "-d",
            "shop",
            "--mock-response",
            r#"[{"a":1}]"#,
            "--events",
            "type:SELECT 1,key:f5,assert:contains:Query Ran Successfully,assert:state:row_count=1",
            "--output",
            "json",
        ],
    );

    assert_eq!(run.code, 0, "stdout: {}", run.stdout);
    let output: serde_json::Value = serde_json::from_str(&run.stdout).unwrap();
    assert_eq!(output["assertions"]["passed"], 2);
    assert_eq!(output["state"]["view"], "results");
    assert_eq!(output["state"]["database"], "shop");
    assert_eq!(output["state"]["requests_sent"], 1);
    assert_eq!(output["state"]["query_text"], "SELECT 1");
}

#[test]
fn test_headless_blank_query_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let run = run_headless(
        dir.path(),
        &[
            "--events",
            "key:f5,assert:contains:Please Enter Query,assert:state:requests_sent=0,assert:state:view=empty",
        ],
    );

    assert_eq!(run.code, 0, "stdout: {}", run.stdout);
    assert!(run.stdout.contains("3 passed, 0 failed"));
}

#[test]
fn test_headless_assertion_fail() {
    let dir = tempfile::tempdir().unwrap();
    let run = run_headless(
        dir.path(),
        &["--events", "type:hello,assert:contains:goodbye", "--output", "json"],
    );

    assert_eq!(run.code, 1, "Should exit with code 1 on assertion failure");
    assert!(run.stdout.contains(r#""passed": 0"#));
    assert!(run.stdout.contains(r#""failed": 1"#));
}

#[test]
fn test_headless_export_csv() {
    let dir = tempfile::tempdir().unwrap();
    let run = run_headless(
        dir.path(),
        &[
            "--mock-response",
            r#"[{"x":1,"y":2}]"#,
            "--events",
            "type:SELECT x,key:f5,key:f3,assert:contains:Exported data.csv",
        ],
    );

    assert_eq!(run.code, 0, "stdout: {}", run.stdout);
    let csv = std::fs::read_to_string(dir.path().join("downloads/data.csv")).unwrap();
    assert_eq!(csv, "x,y\n1,2");
}

#[test]
fn test_headless_type_with_escaped_comma() {
    let dir = tempfile::tempdir().unwrap();
    let run = run_headless(
        dir.path(),
        &[
            "--mock-response",
            r#"[{"x":1,"y":2}]"#,
            "--events",
            r"type:SELECT x\, y FROM t,key:f5,key:f2",
            "--output",
            "json",
        ],
    );

    assert_eq!(run.code, 0, "stdout: {}", run.stdout);
    let output: serde_json::Value = serde_json::from_str(&run.stdout).unwrap();
    assert_eq!(output["state"]["query_text"], "SELECT x, y FROM t");
    let sql = std::fs::read_to_string(dir.path().join("downloads/query.sql")).unwrap();
    assert_eq!(sql, "SELECT x, y FROM t");
}

#[test]
fn test_headless_export_without_data() {
    let dir = tempfile::tempdir().unwrap();
    let run = run_headless(
        dir.path(),
        &["--events", "key:f4,assert:contains:No data to export"],
    );

    assert_eq!(run.code, 0, "stdout: {}", run.stdout);
    assert!(!dir.path().join("downloads/data.json").exists());
}

#[test]
fn test_headless_tabs() {
    let dir = tempfile::tempdir().unwrap();
    let run = run_headless(
        dir.path(),
        &[
            "--events",
            "type:one,key:ctrl+t,assert:state:tab_count=2,assert:state:query_text=,key:ctrl+left,assert:state:query_text=one",
        ],
    );

    assert_eq!(run.code, 0, "stdout: {}", run.stdout);
    assert!(run.stdout.contains("Query 2"));
}

#[test]
fn test_headless_frames_output() {
    let dir = tempfile::tempdir().unwrap();
    let run = run_headless(
        dir.path(),
        &["--events", "type:SELECT 1,key:f5", "--output", "frames"],
    );

    assert_eq!(run.code, 0);
    assert!(run.stdout.contains("=== FRAME 0 (initial) ==="));
    assert!(run.stdout.contains("=== FRAME 2 (key:f5) ==="));
}

#[test]
fn test_headless_custom_size() {
    let dir = tempfile::tempdir().unwrap();
    let run = run_headless(
        dir.path(),
        &["--size", "120x40", "--events", "key:esc", "--output", "json"],
    );

    assert_eq!(run.code, 0);
    let output: serde_json::Value = serde_json::from_str(&run.stdout).unwrap();
    let lines = output["screen_lines"].as_array().unwrap();
    assert!(lines.len() <= 40);
    assert!(lines.iter().all(|l| l.as_str().unwrap().chars().count() <= 120));
}

#[test]
fn test_headless_requires_events() {
    let dir = tempfile::tempdir().unwrap();
    let run = run_headless(dir.path(), &[]);

    assert_eq!(run.code, 1);
    assert!(run.stderr.contains("requires --events or --script"));
}

#[test]
fn test_headless_script_file() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("run.txt");
    std::fs::write(
        &script,
        "# run a query\ntype:SELECT * FROM users\nkey:f5\n\n# sample rows\nassert:contains:alice@example.com\n",
    )
    .unwrap();

    let run = run_headless(
        dir.path(),
        &["--size", "100x24", "--script", script.to_str().unwrap()],
    );

    assert_eq!(run.code, 0, "stdout: {}", run.stdout);
    assert!(run.stdout.contains("1 passed, 0 failed"));
}
