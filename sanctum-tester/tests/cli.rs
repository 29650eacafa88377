use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "sanctum-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_writes_json_report() {
    let exe = env!("CARGO_BIN_EXE_sanctum-tester");
    let output_path = temp_path("json");
    let status = Command::new(exe)
        .args([
            "--runs",
            "2",
            "--days",
            "4",
            "--start-date",
            "2026-01-01",
            "--strategy",
            "balanced,idle",
            "--report",
            "json",
            "--output",
        ])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(&output_path).expect("read output");
    let report: serde_json::Value = serde_json::from_str(&content).expect("valid json");
    assert_eq!(report["runs"].as_array().map(Vec::len), Some(4));
    assert_eq!(report["summaries"][1]["strategy"], "Idle");
    let _ = std::fs::remove_file(output_path);
}

#[test]
fn cli_rejects_unknown_strategy() {
    let exe = env!("CARGO_BIN_EXE_sanctum-tester");
    let output = Command::new(exe)
        .args(["--strategy", "greedy", "--runs", "1", "--days", "1", "--report", "csv"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown strategy"));
}

#[test]
fn identical_invocations_match() {
    let exe = env!("CARGO_BIN_EXE_sanctum-tester");
    let run = || {
        let output = Command::new(exe)
            .args([
                "--runs",
                "1",
                "--days",
                "5",
                "--start-date",
                "20260315",
                "--strategy",
                "random",
                "--report",
                "csv",
            ])
            .output()
            .expect("run cli");
        assert!(output.status.success());
        String::from_utf8_lossy(&output.stdout).into_owned()
    };
    assert_eq!(run(), run());
}
