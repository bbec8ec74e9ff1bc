use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn temp_file(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "healthdata-cli-{}-{}",
        std::process::id(),
        name
    ));
    fs::write(&path, content).unwrap();
    path
}

fn healthdata(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_healthdata"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn test_inspect_stdout_is_json() {
    let csv = temp_file("inspect.csv", "a,b\n1,x\n2,y\n");
    let output = healthdata(&["inspect", csv.to_str().unwrap()]);
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["schema"]["shape"], serde_json::json!([2, 2]));
    assert!(report["summary"]["basic_statistics"].is_array());

    // the load is logged, just not on stdout
    assert!(String::from_utf8_lossy(&output.stderr).contains("dataset loaded"));

    fs::remove_file(csv).unwrap();
}

#[test]
fn test_unparsable_config_is_logged() {
    let csv = temp_file("config.csv", "a\n1\n");
    let config = temp_file("bad.toml", "[server\nport = ");
    let output = healthdata(&[
        "--config",
        config.to_str().unwrap(),
        "inspect",
        csv.to_str().unwrap(),
    ]);
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to parse config"), "stderr: {}", stderr);
    assert!(serde_json::from_slice::<serde_json::Value>(&output.stdout).is_ok());

    fs::remove_file(csv).unwrap();
    fs::remove_file(config).unwrap();
}
