use std::path::PathBuf;
use std::process::{Command, Output};

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("highway_sim_{}_{}", std::process::id(), name))
}

fn run_headless(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_highway_sim"))
        .args(args)
        .env("RUST_LOG", "info")
        .output()
        .expect("Failed to execute simulation")
}

/// Test that the simulation runs headless and reports its summary
#[test]
fn test_headless_simulation_runs() {
    let boost_file = scratch_path("runs_boost.json");
    let output = run_headless(&[
        "--ticks",
        "300",
        "--seed",
        "7",
        "--boost-file",
        boost_file.to_str().unwrap(),
    ]);

    assert!(
        output.status.success(),
        "Simulation failed to run. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("=== RUN COMPLETE ==="),
        "Simulation did not complete properly. stderr: {}",
        stderr
    );
    for statistic in ["Score:", "Distance:", "Level:", "Vehicles passed:", "Boost:"] {
        assert!(stderr.contains(statistic), "Missing '{}' statistic", statistic);
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("=== Road Map ==="));

    let _ = std::fs::remove_file(boost_file);
}

/// Test that the boost record is written to the requested file
#[test]
fn test_boost_record_is_persisted() {
    let boost_file = scratch_path("persist_boost.json");
    let _ = std::fs::remove_file(&boost_file);

    let output = run_headless(&[
        "--ticks",
        "120",
        "--seed",
        "3",
        "--boost-file",
        boost_file.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "Simulation failed to run");

    let raw = std::fs::read_to_string(&boost_file).expect("boost file written");
    let record: serde_json::Value = serde_json::from_str(&raw).expect("boost record is JSON");
    assert!(record["remaining"].as_f64().is_some());
    assert!(record["recharging"].as_bool().is_some());
    assert!(record["cooldownTimer"].as_f64().is_some());

    let _ = std::fs::remove_file(boost_file);
}

/// Test that one telemetry line is written per tick
#[test]
fn test_telemetry_lines_are_written() {
    let boost_file = scratch_path("telemetry_boost.json");
    let telemetry_file = scratch_path("telemetry.jsonl");

    let output = run_headless(&[
        "--ticks",
        "60",
        "--seed",
        "11",
        "--boost-file",
        boost_file.to_str().unwrap(),
        "--telemetry",
        telemetry_file.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "Simulation failed to run");

    let text = std::fs::read_to_string(&telemetry_file).expect("telemetry file written");
    let lines: Vec<&str> = text.lines().collect();
    assert!(!lines.is_empty() && lines.len() <= 60);
    let frame: serde_json::Value = serde_json::from_str(lines[0]).expect("frame is JSON");
    for key in ["fps", "throttle", "steer", "handbrake"] {
        assert!(frame.get(key).is_some(), "frame missing '{}'", key);
    }

    let _ = std::fs::remove_file(boost_file);
    let _ = std::fs::remove_file(telemetry_file);
}

/// Test that unreadable inputs fall back to defaults instead of failing
#[test]
fn test_bad_inputs_fall_back_to_defaults() {
    let boost_file = scratch_path("fallback_boost.json");
    let config_file = scratch_path("fallback_config.json");
    let env_file = scratch_path("fallback_envs.json");
    std::fs::write(&config_file, r#"{"road":{"lanes":4}}"#).unwrap();
    std::fs::write(&env_file, "not json").unwrap();
    std::fs::write(&boost_file, "{corrupt").unwrap();

    let output = run_headless(&[
        "--ticks",
        "60",
        "--seed",
        "5",
        "--config",
        config_file.to_str().unwrap(),
        "--environments",
        env_file.to_str().unwrap(),
        "--boost-file",
        boost_file.to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "Simulation failed on bad inputs. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("4 lanes"), "config not applied. stderr: {}", stderr);
    assert!(stderr.contains("using default environment"));
    assert!(stderr.contains("=== RUN COMPLETE ==="));

    for path in [boost_file, config_file, env_file] {
        let _ = std::fs::remove_file(path);
    }
}
