use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "cgu-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_companion-gear-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
    assert!(content.contains("picker-rollback"));
}

#[test]
fn cli_runs_all_scenarios_with_json_report() {
    let exe = env!("CARGO_BIN_EXE_companion-gear-tester");
    let output_path = temp_path("all.json");
    let output = Command::new(exe)
        .args(["--scenarios", "all", "--report", "json", "--output"])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Companion Gear Tester"));

    let content = std::fs::read_to_string(output_path).expect("read output");
    let json_end = content.rfind(']').expect("json array");
    let results: serde_json::Value =
        serde_json::from_str(&content[..=json_end]).expect("json report");
    let results = results.as_array().expect("array");
    assert!(results.len() >= 10);
    assert!(results.iter().all(|r| r["passed"] == true));
}

#[test]
fn cli_runs_against_saved_overrides() {
    let exe = env!("CARGO_BIN_EXE_companion-gear-tester");
    let overrides_path = temp_path("overrides.json");
    std::fs::write(
        &overrides_path,
        r#"{
            "_cgu_override_costs_v1": {"2:2": 100, "bogus": 3},
            "_cgu_override_slots_v1": {"2:2:10": "vlandia_horse"}
        }"#,
    )
    .expect("write overrides");
    let output_path = temp_path("overrides.md");
    let output = Command::new(exe)
        .args([
            "--scenarios",
            "smoke,no-op-commit,companion-dialog",
            "--report",
            "markdown",
            "--overrides",
        ])
        .arg(&overrides_path)
        .arg("--output")
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("# Companion Gear Scenario Results"));
    assert!(content.contains("Companion Dialog Purchase"));
    assert!(!content.contains("❌"));
}

#[test]
fn cli_fails_on_unreadable_overrides() {
    let exe = env!("CARGO_BIN_EXE_companion-gear-tester");
    let overrides_path = temp_path("broken.json");
    std::fs::write(&overrides_path, "{ nope").expect("write overrides");
    let output = Command::new(exe)
        .arg("--overrides")
        .arg(&overrides_path)
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid overrides document"));
}
