use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

const VEHICLES: &str = r#"
- name: Hexa 10
  kind: multirotor
  mass_kg: 10.0
  max_power_w: 4000
  hover_power_w: 2160
  cruise_speed_ms: 12
  max_speed_ms: 20
  max_climb_rate_ms: 5
  battery_capacity_mah: 22000
  battery_voltage_v: 44.4
  rotor_diameter_m: 0.44
  frame_type: hexa
- name: Trainer
  kind: fixedwing
  mass_kg: 3.0
  max_power_w: 600
  cruise_speed_ms: 18
  max_speed_ms: 30
  stall_speed_ms: 12
  max_climb_rate_ms: 4
  battery_capacity_mah: 5000
  battery_voltage_v: 14.8
"#;

const MISSION: &str = r#"
name: Field loop
waypoints:
  - { latitude: 47.0, longitude: 8.0, altitude: 20 }
  - { latitude: 47.004, longitude: 8.0, altitude: 60, speed: 8 }
  - { latitude: 47.004, longitude: 8.005, altitude: 60, hover_time: 20 }
  - { latitude: 47.0, longitude: 8.0, altitude: 20 }
"#;

fn fixtures(dir: &Path) -> (PathBuf, PathBuf) {
    let vehicles = dir.join("vehicles.yaml");
    let mission = dir.join("mission.yaml");
    fs::write(&vehicles, VEHICLES).expect("write vehicles");
    fs::write(&mission, MISSION).expect("write mission");
    (vehicles, mission)
}

#[test]
fn simulate_prints_report_with_manual_wind() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (vehicles, mission) = fixtures(dir.path());

    Command::cargo_bin("simulate")
        .expect("simulate bin")
        .args(["--vehicles", vehicles.to_str().unwrap()])
        .args(["--mission", mission.to_str().unwrap()])
        .args(["--wind-speed", "4", "--wind-direction", "270"])
        .assert()
        .success()
        .stdout(predicate::str::contains("=== Summary ==="))
        .stdout(predicate::str::contains("Hexa 10"))
        .stdout(predicate::str::contains("Manual"));
}

#[test]
fn simulate_writes_json_csv_and_summary() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (vehicles, mission) = fixtures(dir.path());
    let json = dir.path().join("out").join("run.json");
    let csv_path = dir.path().join("out").join("segments.csv");

    Command::cargo_bin("simulate")
        .expect("simulate bin")
        .args(["--vehicles", vehicles.to_str().unwrap()])
        .args(["--mission", mission.to_str().unwrap()])
        .args(["--vehicle", "trainer", "--no-wind", "--parallel", "--summary"])
        .args(["--output", json.to_str().unwrap()])
        .args(["--csv", csv_path.to_str().unwrap()])
        .assert()
        .success();

    let result: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json).expect("json")).expect("parse");
    assert_eq!(result["vehicle_name"], "Trainer");
    assert_eq!(result["segments"].as_array().map(Vec::len), Some(3));
    assert_eq!(result["metadata"]["wind_source"], "calm");
    assert_eq!(result["metadata"]["parallel"], true);
    let below_stall = result["metadata"]["warnings"]
        .as_array()
        .expect("warnings")
        .iter()
        .any(|w| w["reason"] == "below_stall");
    assert!(below_stall, "8 m/s leg is below the trainer's stall speed");

    let csv = fs::read_to_string(&csv_path).expect("csv");
    assert_eq!(csv.lines().count(), 4);
    assert!(dir.path().join("out").join("run_summary.json").exists());
}

#[test]
fn simulate_report_lists_warnings_by_segment() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (vehicles, mission) = fixtures(dir.path());

    Command::cargo_bin("simulate")
        .expect("simulate bin")
        .args(["--vehicles", vehicles.to_str().unwrap()])
        .args(["--mission", mission.to_str().unwrap()])
        .args(["--vehicle", "Trainer", "--no-wind"])
        .assert()
        .success()
        .stdout(predicate::str::contains("=== Warnings ==="))
        .stdout(predicate::str::contains("- segment 0: airspeed 8.00 m/s is below stall"));
}

#[test]
fn simulate_streams_json_to_stdout() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (vehicles, mission) = fixtures(dir.path());

    let output = Command::cargo_bin("simulate")
        .expect("simulate bin")
        .args(["--vehicles", vehicles.to_str().unwrap()])
        .args(["--mission", mission.to_str().unwrap()])
        .args(["--no-wind", "--output", "-"])
        .output()
        .expect("run simulate");
    assert!(output.status.success());
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert!(result["total_energy_wh"].as_f64().unwrap() > 0.0);
}

#[test]
fn simulate_rejects_unknown_vehicle() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (vehicles, mission) = fixtures(dir.path());

    Command::cargo_bin("simulate")
        .expect("simulate bin")
        .args(["--vehicles", vehicles.to_str().unwrap()])
        .args(["--mission", mission.to_str().unwrap()])
        .args(["--vehicle", "Zeppelin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Zeppelin"));
}

#[test]
fn power_curve_reports_both_induced_models_for_multirotor() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (vehicles, _) = fixtures(dir.path());
    let csv_path = dir.path().join("curve.csv");

    Command::cargo_bin("power_curve")
        .expect("power_curve bin")
        .args(["--vehicles", vehicles.to_str().unwrap()])
        .args(["--max-speed", "10", "--step", "1"])
        .args(["--output", csv_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Calibrated sweet spot"))
        .stdout(predicate::str::contains("Glauert sweet spot"))
        .stdout(predicate::str::contains("=== Range at 12.0 m/s ==="));

    let csv = fs::read_to_string(&csv_path).expect("csv");
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("airspeed_ms,calibrated_w,glauert_w"));
    assert_eq!(lines.count(), 11);
}

#[test]
fn power_curve_marks_fixed_wing_speeds_below_stall() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (vehicles, _) = fixtures(dir.path());

    Command::cargo_bin("power_curve")
        .expect("power_curve bin")
        .args(["--vehicles", vehicles.to_str().unwrap()])
        .args(["--vehicle", "Trainer", "--step", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sweet spot:"))
        .stdout(predicate::str::contains("   -"));
}
