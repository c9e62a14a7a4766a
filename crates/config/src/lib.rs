//! Configuration models and loaders for the flight energy engine.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Vehicle class selecting the power model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleKind {
    #[serde(alias = "quadcopter")]
    Multirotor,
    Vtol,
    #[serde(alias = "plane", alias = "fixed_wing")]
    Fixedwing,
}

/// Multirotor airframe layout; sets the base number of lift motors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameType {
    Tri,
    #[default]
    Quad,
    Hexa,
    Octo,
}

impl FrameType {
    pub fn motor_count(self) -> u32 {
        match self {
            FrameType::Tri => 3,
            FrameType::Quad => 4,
            FrameType::Hexa => 6,
            FrameType::Octo => 8,
        }
    }
}

/// Single motors per arm or stacked coaxial pairs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotorConfiguration {
    #[default]
    Single,
    Coaxial,
}

/// Vehicle configuration parsed from catalogs or request payloads.
///
/// Field aliases accept the short names used by older mission payloads (`mass`,
/// `hover_power`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleConfig {
    #[serde(default = "default_vehicle_name")]
    pub name: String,
    #[serde(alias = "vehicle_type")]
    pub kind: VehicleKind,
    #[serde(alias = "mass")]
    pub mass_kg: f64,
    #[serde(alias = "max_power")]
    pub max_power_w: f64,
    #[serde(default, alias = "hover_power")]
    pub hover_power_w: Option<f64>,
    #[serde(default, alias = "cruise_power")]
    pub cruise_power_w: Option<f64>,
    #[serde(default, alias = "forward_thrust_power")]
    pub forward_thrust_power_w: Option<f64>,
    #[serde(alias = "cruise_speed")]
    pub cruise_speed_ms: f64,
    #[serde(alias = "max_speed")]
    pub max_speed_ms: f64,
    #[serde(default, alias = "stall_speed")]
    pub stall_speed_ms: Option<f64>,
    #[serde(alias = "max_climb_rate")]
    pub max_climb_rate_ms: f64,
    #[serde(default = "default_descent_speed", alias = "max_descent_speed")]
    pub max_descent_speed_ms: f64,
    #[serde(
        default = "default_horizontal_acceleration",
        alias = "horizontal_acceleration"
    )]
    pub horizontal_acceleration_ms2: f64,
    #[serde(
        default = "default_vertical_acceleration",
        alias = "vertical_acceleration"
    )]
    pub vertical_acceleration_ms2: f64,
    #[serde(alias = "battery_capacity")]
    pub battery_capacity_mah: f64,
    #[serde(alias = "battery_voltage")]
    pub battery_voltage_v: f64,
    #[serde(default = "default_drag_coefficient")]
    pub drag_coefficient: f64,
    #[serde(default = "default_wing_area", alias = "wing_area")]
    pub wing_area_m2: f64,
    #[serde(default)]
    pub aspect_ratio: Option<f64>,
    #[serde(default = "default_rotor_diameter", alias = "rotor_diameter")]
    pub rotor_diameter_m: f64,
    #[serde(default)]
    pub rotor_count: Option<u32>,
    #[serde(default)]
    pub frame_type: FrameType,
    #[serde(default)]
    pub motor_config: MotorConfiguration,
    #[serde(default = "default_motor_efficiency")]
    pub motor_efficiency: f64,
    #[serde(default = "default_propeller_efficiency")]
    pub propeller_efficiency: f64,
    #[serde(default = "default_transmission_efficiency")]
    pub transmission_efficiency: f64,
}

fn default_vehicle_name() -> String {
    "vehicle".to_string()
}

fn default_descent_speed() -> f64 {
    3.0
}

fn default_horizontal_acceleration() -> f64 {
    3.0
}

fn default_vertical_acceleration() -> f64 {
    2.0
}

fn default_drag_coefficient() -> f64 {
    0.03
}

fn default_wing_area() -> f64 {
    0.5
}

fn default_rotor_diameter() -> f64 {
    0.3
}

fn default_motor_efficiency() -> f64 {
    0.85
}

fn default_propeller_efficiency() -> f64 {
    0.75
}

fn default_transmission_efficiency() -> f64 {
    0.95
}

/// A single 3D waypoint of a mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Metres above mean sea level.
    pub altitude: f64,
    /// Commanded airspeed towards this waypoint (m/s), capped at the cruise speed.
    #[serde(default)]
    pub speed: Option<f64>,
    /// Loiter time at this waypoint (s).
    #[serde(default)]
    pub hover_time: Option<f64>,
    #[serde(default)]
    pub action: Option<String>,
}

impl Waypoint {
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
            speed: None,
            hover_time: None,
            action: None,
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_hover_time(mut self, seconds: f64) -> Self {
        self.hover_time = Some(seconds);
        self
    }
}

/// Named waypoint list as stored in mission files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionPlan {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub waypoints: Vec<Waypoint>,
}

/// How wind is taken into account for one simulation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindSettings {
    #[serde(default = "default_true", alias = "wind_consideration")]
    pub consideration: bool,
    #[serde(default, alias = "manual_wind_enabled")]
    pub manual_enabled: bool,
    #[serde(default, alias = "manual_wind_speed_ms")]
    pub manual_speed_ms: Option<f64>,
    #[serde(default, alias = "manual_wind_direction_deg")]
    pub manual_direction_deg: Option<f64>,
    /// Planned take-off time used for forecast queries and the synthetic model.
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
}

impl Default for WindSettings {
    fn default() -> Self {
        Self {
            consideration: true,
            manual_enabled: false,
            manual_speed_ms: None,
            manual_direction_deg: None,
            start_time: None,
        }
    }
}

impl WindSettings {
    /// Wind ignored entirely.
    pub fn calm() -> Self {
        Self {
            consideration: false,
            ..Self::default()
        }
    }

    /// Constant wind override for field-test validation.
    pub fn manual(speed_ms: f64, direction_deg: f64) -> Self {
        Self {
            consideration: true,
            manual_enabled: true,
            manual_speed_ms: Some(speed_ms),
            manual_direction_deg: Some(direction_deg),
            start_time: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Remote wind service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindServiceConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_wind_base_url")]
    pub base_url: String,
    #[serde(default = "default_wind_timeout")]
    pub timeout_s: f64,
    #[serde(default = "default_wind_retries")]
    pub retries: u32,
}

impl Default for WindServiceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_wind_base_url(),
            timeout_s: default_wind_timeout(),
            retries: default_wind_retries(),
        }
    }
}

fn default_wind_base_url() -> String {
    "https://api.windfinder.com/v2".to_string()
}

fn default_wind_timeout() -> f64 {
    5.0
}

fn default_wind_retries() -> u32 {
    1
}

/// Induced-power model selection for multirotors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InducedModelConfig {
    #[default]
    Calibrated,
    Glauert,
}

/// Optional overrides for the empirically tuned power-model constants.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TuningConfig {
    #[serde(default)]
    pub induced_model: Option<InducedModelConfig>,
    #[serde(default)]
    pub max_efficiency_gain: Option<f64>,
    #[serde(default)]
    pub efficiency_multiplier: Option<f64>,
    #[serde(default)]
    pub plateau_factor: Option<f64>,
    #[serde(default)]
    pub high_speed_penalty_rate: Option<f64>,
    #[serde(default)]
    pub high_speed_penalty_cap: Option<f64>,
    #[serde(default)]
    pub coaxial_efficiency: Option<f64>,
    #[serde(default)]
    pub figure_of_merit: Option<f64>,
    #[serde(default)]
    pub descent_recovery_factor: Option<f64>,
    #[serde(default)]
    pub descent_power_floor: Option<f64>,
}

/// Engine-wide settings (`engine.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub wind: WindServiceConfig,
    #[serde(default)]
    pub tuning: TuningConfig,
    #[serde(default)]
    pub parallel: bool,
}

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load vehicle configurations from a YAML list, a single TOML file, or a directory of TOML files.
pub fn load_vehicle_configs<P: AsRef<Path>>(path: P) -> Result<Vec<VehicleConfig>, ConfigError> {
    load_records(path)
}

/// Load a mission plan from YAML or JSON (chosen by file extension).
pub fn load_mission<P: AsRef<Path>>(path: P) -> Result<MissionPlan, ConfigError> {
    let path = path.as_ref();
    let reader = File::open(path)?;
    if has_extension(path, "json") {
        Ok(serde_json::from_reader(reader)?)
    } else {
        Ok(serde_yaml::from_reader(reader)?)
    }
}

/// Load engine settings from a TOML file.
pub fn load_engine_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&contents)?)
}

fn load_records<T, P>(path: P) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path.is_dir() {
        read_dir_records(path)
    } else if has_extension(path, "toml") {
        let contents = std::fs::read_to_string(path)?;
        let record: T = toml::from_str(&contents)?;
        Ok(vec![record])
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

fn read_dir_records<T>(dir: &Path) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    let mut records = Vec::new();
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| has_extension(path, "toml"))
        .collect();
    entries.sort();
    for path in entries {
        let contents = std::fs::read_to_string(&path)?;
        let record: T = toml::from_str(&contents)?;
        records.push(record);
    }
    Ok(records)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().map(|e| e == ext).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEXA_YAML: &str = r#"
- name: Hexa 10
  vehicle_type: multirotor
  mass: 10.0
  max_power: 4000
  hover_power: 2160
  cruise_speed: 12.0
  max_speed: 20.0
  max_climb_rate: 8.0
  max_descent_speed: 5.0
  battery_capacity: 24000
  battery_voltage: 22.2
  rotor_diameter: 0.44
  frame_type: hexa
- name: Trainer
  kind: plane
  mass_kg: 3.0
  max_power_w: 1200
  cruise_speed_ms: 18
  max_speed_ms: 30
  stall_speed_ms: 12
  max_climb_rate_ms: 8
  battery_capacity_mah: 15000
  battery_voltage_v: 44.4
"#;

    #[test]
    fn yaml_catalog_accepts_aliases_and_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("vehicles.yaml");
        File::create(&path)
            .and_then(|mut f| f.write_all(HEXA_YAML.as_bytes()))
            .expect("write yaml");

        let vehicles = load_vehicle_configs(&path).expect("load vehicles");
        assert_eq!(vehicles.len(), 2);

        let hexa = &vehicles[0];
        assert_eq!(hexa.kind, VehicleKind::Multirotor);
        assert_eq!(hexa.frame_type, FrameType::Hexa);
        assert_eq!(hexa.hover_power_w, Some(2160.0));
        assert_eq!(hexa.motor_efficiency, 0.85);
        assert_eq!(hexa.horizontal_acceleration_ms2, 3.0);

        let plane = &vehicles[1];
        assert_eq!(plane.kind, VehicleKind::Fixedwing);
        assert_eq!(plane.stall_speed_ms, Some(12.0));
        assert_eq!(plane.max_descent_speed_ms, 3.0);
    }

    #[test]
    fn toml_directory_is_read_in_name_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        for (file, name) in [("b.toml", "Bravo"), ("a.toml", "Alpha")] {
            let body = format!(
                "name = \"{name}\"\nkind = \"vtol\"\nmass_kg = 6.0\nmax_power_w = 3000\n\
                 cruise_speed_ms = 20\nmax_speed_ms = 28\nmax_climb_rate_ms = 4\n\
                 battery_capacity_mah = 16000\nbattery_voltage_v = 22.2\n"
            );
            std::fs::write(dir.path().join(file), body).expect("write toml");
        }
        std::fs::write(dir.path().join("notes.txt"), "ignored").expect("write txt");

        let vehicles = load_vehicle_configs(dir.path()).expect("load dir");
        let names: Vec<_> = vehicles.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["Alpha", "Bravo"]);
    }

    #[test]
    fn mission_loads_from_json_and_engine_from_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mission_path = dir.path().join("mission.json");
        std::fs::write(
            &mission_path,
            r#"{"name":"loop","waypoints":[{"latitude":49.0,"longitude":8.0,"altitude":100},
               {"latitude":49.01,"longitude":8.0,"altitude":120,"speed":8,"hover_time":30}]}"#,
        )
        .expect("write mission");
        let mission = load_mission(&mission_path).expect("mission");
        assert_eq!(mission.waypoints.len(), 2);
        assert_eq!(mission.waypoints[1].hover_time, Some(30.0));

        let engine_path = dir.path().join("engine.toml");
        std::fs::write(
            &engine_path,
            "parallel = true\n[wind]\ntimeout_s = 2.5\n[tuning]\nmax_efficiency_gain = 0.12\ninduced_model = \"glauert\"\n",
        )
        .expect("write engine");
        let engine = load_engine_config(&engine_path).expect("engine");
        assert!(engine.parallel);
        assert_eq!(engine.wind.timeout_s, 2.5);
        assert_eq!(engine.wind.retries, 1);
        assert_eq!(engine.tuning.max_efficiency_gain, Some(0.12));
        assert_eq!(engine.tuning.induced_model, Some(InducedModelConfig::Glauert));
    }
}
