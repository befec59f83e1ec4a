use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "wayfare-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_wayfare-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(&output_path).expect("read output");
    std::fs::remove_file(&output_path).ok();
    assert!(content.contains("Available scenarios"));
    assert!(content.contains("smoke"));
    assert!(content.contains("difficulty-ladder"));
}

#[test]
fn cli_runs_smoke_with_a_json_report() {
    let exe = env!("CARGO_BIN_EXE_wayfare-tester");
    let output_path = temp_path("smoke-json");
    let status = Command::new(exe)
        .args([
            "--scenarios",
            "smoke",
            "--report",
            "json",
            "--iterations",
            "1",
            "--seeds",
            "7",
            "--output",
        ])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(&output_path).expect("read output");
    std::fs::remove_file(&output_path).ok();
    assert!(content.contains("\"scenario_name\": \"smoke\""));
    assert!(content.contains("\"passed\": true"));
}

#[test]
fn cli_rejects_garbage_seeds() {
    let exe = env!("CARGO_BIN_EXE_wayfare-tester");
    let output = Command::new(exe)
        .args(["--seeds", "not-a-seed"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("seed"));
}
