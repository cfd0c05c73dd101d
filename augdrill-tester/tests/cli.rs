use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "augdrill-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_augdrill-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
    assert!(content.contains("reveal-rules"));
}

#[test]
fn cli_runs_all_scenarios_with_json_report() {
    let exe = env!("CARGO_BIN_EXE_augdrill-tester");
    let output_path = temp_path("run");
    let output = Command::new(exe)
        .args([
            "--report",
            "json",
            "--scenarios",
            "all",
            "--iterations",
            "1",
            "--seeds",
            "1,0x539",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Augment Drill Automated Tester"));

    let content = std::fs::read_to_string(output_path).expect("read output");
    let report: serde_json::Value = serde_json::from_str(&content).expect("json report");
    let scenarios = report["scenarios"].as_array().expect("scenario list");
    assert_eq!(scenarios.len(), 11 * 2);
    assert!(scenarios.iter().all(|s| s["passed"] == true));
}

#[test]
fn cli_strategy_csv_is_reproducible() {
    let exe = env!("CARGO_BIN_EXE_augdrill-tester");
    let run = |label: &str| {
        let output_path = temp_path(label);
        let status = Command::new(exe)
            .args([
                "--report",
                "csv",
                "--scenarios",
                "",
                "--strategies",
                "all",
                "--tier-mode",
                "gold",
                "--training-mode",
                "3-2",
                "--iterations",
                "2",
                "--seeds",
                "7",
                "--output",
            ])
            .arg(&output_path)
            .status()
            .expect("run cli");
        assert!(status.success());
        std::fs::read_to_string(output_path).expect("read output")
    };

    let first = run("csv-a");
    let second = run("csv-b");
    assert_eq!(first, second);
    let lines: Vec<&str> = first.lines().collect();
    assert_eq!(lines.len(), 1 + 4 * 2);
    assert!(lines[1..].iter().all(|line| line.contains(",gold,augment_3_2,")));
    assert!(
        lines
            .iter()
            .any(|line| line.starts_with("\"Oracle") && line.contains(",100.0,0,"))
    );
}

#[test]
fn cli_rejects_bad_catalog_and_modes() {
    let exe = env!("CARGO_BIN_EXE_augdrill-tester");
    let missing = Command::new(exe)
        .args(["--catalog", "/definitely/not/here.json", "--iterations", "1"])
        .output()
        .expect("run cli");
    assert!(!missing.status.success());
    assert!(String::from_utf8_lossy(&missing.stderr).contains("failed to load catalog"));

    let bad_mode = Command::new(exe)
        .args(["--tier-mode", "bronze", "--iterations", "1"])
        .output()
        .expect("run cli");
    assert!(!bad_mode.status.success());
    assert!(String::from_utf8_lossy(&bad_mode.stderr).contains("--tier-mode"));
}
