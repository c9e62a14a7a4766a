use std::path::Path;

use chrono::{TimeZone, Utc};

use flight_energy::config::{
    VehicleConfig, Waypoint, WindSettings, load_engine_config, load_mission, load_vehicle_configs,
};
use flight_energy::power::FlightPhase;
use flight_energy::simulation::{
    Infeasibility, SimulationOptions, SimulationRequest, SimulationResult, simulate,
};
use flight_energy::wind::WindSourceKind;

fn vehicle(json: &str) -> VehicleConfig {
    serde_json::from_str(json).expect("vehicle json")
}

fn hexa() -> VehicleConfig {
    vehicle(
        r#"{"name":"Hexa 10","kind":"multirotor","mass_kg":10.0,"max_power_w":4000,
            "hover_power_w":2160,"cruise_speed_ms":12,"max_speed_ms":20,"max_climb_rate_ms":5,
            "battery_capacity_mah":22000,"battery_voltage_v":44.4,"rotor_diameter_m":0.44,
            "frame_type":"hexa"}"#,
    )
}

fn trainer() -> VehicleConfig {
    vehicle(
        r#"{"name":"Trainer","kind":"fixedwing","mass_kg":3.0,"max_power_w":600,
            "cruise_speed_ms":18,"max_speed_ms":30,"stall_speed_ms":12,"max_climb_rate_ms":4,
            "battery_capacity_mah":5000,"battery_voltage_v":14.8,"wing_area_m2":0.6}"#,
    )
}

fn run(vehicle: VehicleConfig, waypoints: Vec<Waypoint>, wind: WindSettings) -> SimulationResult {
    simulate(
        SimulationRequest {
            vehicle,
            waypoints,
            wind,
        },
        SimulationOptions::default(),
    )
    .expect("simulation")
}

/// Straight leg due north of roughly `metres` at `speed` m/s.
fn north_leg(metres: f64, speed: f64) -> Vec<Waypoint> {
    let dlat = metres / 111_195.0;
    vec![
        Waypoint::new(47.0, 8.0, 50.0).with_speed(speed),
        Waypoint::new(47.0 + dlat, 8.0, 50.0).with_speed(speed),
    ]
}

#[test]
fn ten_kg_hexa_at_four_metres_per_second_draws_about_seventy_percent_of_hover() {
    let result = run(hexa(), north_leg(400.0, 4.0), WindSettings::calm());
    let segment = &result.segments[0];
    assert_eq!(segment.phase, FlightPhase::Cruise);
    assert!((segment.cruise_airspeed_ms - 4.0).abs() < 1e-9);
    assert!(
        (1_500.0..=1_600.0).contains(&segment.cruise_power_w),
        "cruise power = {}",
        segment.cruise_power_w
    );
    assert!(result.metadata.warnings.is_empty());
}

#[test]
fn headwind_costs_more_than_tailwind_at_the_same_airspeed() {
    let airspeed = 10.0;
    let wind = 3.0;
    let head = run(hexa(), north_leg(2_000.0, airspeed), WindSettings::manual(wind, 0.0));
    let tail = run(hexa(), north_leg(2_000.0, airspeed), WindSettings::manual(wind, 180.0));

    let head_seg = &head.segments[0];
    let tail_seg = &tail.segments[0];
    assert!((head_seg.wind.headwind_ms - wind).abs() < 1e-6);
    assert!((tail_seg.wind.headwind_ms + wind).abs() < 1e-6);
    assert!((head_seg.cruise_airspeed_ms - airspeed).abs() < 1e-6);
    assert!((tail_seg.cruise_airspeed_ms - airspeed).abs() < 1e-6);
    assert!((head_seg.cruise_ground_speed_ms - (airspeed - wind)).abs() < 1e-6);
    assert!((tail_seg.cruise_ground_speed_ms - (airspeed + wind)).abs() < 1e-6);
    assert!(head_seg.duration_s > tail_seg.duration_s);
    assert!(head.total_energy_wh > tail.total_energy_wh);
}

#[test]
fn slow_leg_into_a_light_wind_costs_more_than_downwind() {
    let head = run(hexa(), north_leg(500.0, 3.0), WindSettings::manual(2.0, 0.0));
    let tail = run(hexa(), north_leg(500.0, 3.0), WindSettings::manual(2.0, 180.0));

    let head_seg = &head.segments[0];
    let tail_seg = &tail.segments[0];
    assert!((head_seg.cruise_ground_speed_ms - 1.0).abs() < 1e-6);
    assert!((tail_seg.cruise_ground_speed_ms - 5.0).abs() < 1e-6);
    assert!(head_seg.duration_s > tail_seg.duration_s);
    assert!(
        head.total_energy_wh > tail.total_energy_wh,
        "head {} Wh vs tail {} Wh",
        head.total_energy_wh,
        tail.total_energy_wh
    );
    assert!(!head.has_infeasibility(Infeasibility::WindExceedsAirspeed));
}

#[test]
fn headwind_stronger_than_airspeed_is_flagged() {
    let result = run(hexa(), north_leg(300.0, 3.0), WindSettings::manual(5.0, 0.0));
    let segment = &result.segments[0];
    assert!(result.has_infeasibility(Infeasibility::WindExceedsAirspeed));
    assert!((segment.cruise_ground_speed_ms - 0.5).abs() < 1e-9);
    assert!(segment.duration_s.is_finite() && segment.energy_wh.is_finite());
}

#[test]
fn duplicate_waypoints_produce_an_empty_segment() {
    let wp = Waypoint::new(47.0, 8.0, 50.0);
    let result = run(hexa(), vec![wp.clone(), wp], WindSettings::calm());
    let segment = &result.segments[0];
    assert_eq!(segment.distance_m, 0.0);
    assert_eq!(segment.duration_s, 0.0);
    assert_eq!(segment.energy_wh, 0.0);
    assert_eq!(result.total_energy_wh, 0.0);
}

#[test]
fn fixed_wing_below_stall_is_flagged_with_finite_power() {
    let result = run(trainer(), north_leg(1_000.0, 8.0), WindSettings::calm());
    let segment = &result.segments[0];
    assert!(result.has_infeasibility(Infeasibility::BelowStall));
    assert!(
        segment
            .warnings
            .iter()
            .any(|w| w.infeasibility() == Some(Infeasibility::BelowStall))
    );
    assert!(segment.cruise_power_w.is_finite() && segment.cruise_power_w > 0.0);
    assert!(segment.energy_wh.is_finite() && segment.energy_wh > 0.0);
}

#[test]
fn over_long_mission_reports_usage_above_one_hundred_percent() {
    let small = vehicle(
        r#"{"name":"Tiny","kind":"multirotor","mass_kg":1.2,"max_power_w":800,
            "hover_power_w":220,"cruise_speed_ms":10,"max_speed_ms":15,"max_climb_rate_ms":3,
            "battery_capacity_mah":1500,"battery_voltage_v":11.1}"#,
    );
    let result = run(small, north_leg(40_000.0, 10.0), WindSettings::calm());
    assert!(result.battery_usage_percent > 100.0, "usage = {}", result.battery_usage_percent);
    assert!(!result.summary.is_feasible);
    assert!(result.summary.remaining_energy_wh < 0.0);
    assert_eq!(result.summary.depleted_at_segment, Some(0));
    assert!(result.has_infeasibility(Infeasibility::BatteryDepleted));
}

#[test]
fn manual_wind_runs_are_bit_identical() {
    let mission = vec![
        Waypoint::new(47.0, 8.0, 20.0),
        Waypoint::new(47.003, 8.001, 60.0),
        Waypoint::new(47.003, 8.006, 60.0).with_hover_time(30.0),
        Waypoint::new(47.0, 8.0, 10.0),
    ];
    let first = run(hexa(), mission.clone(), WindSettings::manual(4.5, 225.0));
    let second = run(hexa(), mission, WindSettings::manual(4.5, 225.0));
    assert_eq!(first, second);
}

#[test]
fn parallel_evaluation_matches_sequential() {
    let mission = vec![
        Waypoint::new(47.0, 8.0, 20.0),
        Waypoint::new(47.002, 8.0, 80.0),
        Waypoint::new(47.002, 8.004, 80.0),
        Waypoint::new(47.0, 8.004, 30.0),
        Waypoint::new(47.0, 8.0, 20.0),
    ];
    let request = SimulationRequest {
        vehicle: hexa(),
        waypoints: mission,
        wind: WindSettings::manual(2.0, 90.0),
    };
    let sequential = simulate(request.clone(), SimulationOptions::default()).expect("sequential");
    let parallel = simulate(
        request,
        SimulationOptions {
            parallel: true,
            ..SimulationOptions::default()
        },
    )
    .expect("parallel");

    assert_eq!(sequential.segments, parallel.segments);
    assert_eq!(sequential.total_energy_wh, parallel.total_energy_wh);
    assert_eq!(sequential.summary, parallel.summary);
    assert!(parallel.metadata.parallel);
}

#[test]
fn synthetic_wind_is_repeatable_for_a_fixed_start_time() {
    let wind = WindSettings {
        start_time: Some(Utc.with_ymd_and_hms(2024, 7, 1, 13, 0, 0).unwrap()),
        ..WindSettings::default()
    };
    let first = run(hexa(), north_leg(1_500.0, 10.0), wind.clone());
    let second = run(hexa(), north_leg(1_500.0, 10.0), wind);
    assert_eq!(first, second);
    assert_eq!(first.metadata.wind_source, WindSourceKind::Synthetic);
    assert!(!first.metadata.wind_fallback_used);
    assert!(first.segments[0].wind.speed_ms.is_finite());
}

#[test]
fn bundled_catalog_flies_the_sample_mission() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("configs");
    let vehicles = load_vehicle_configs(root.join("vehicles.yaml")).expect("catalog");
    let mission = load_mission(root.join("missions/survey_loop.yaml")).expect("mission");
    let engine = load_engine_config(root.join("engine.toml")).expect("engine");
    assert_eq!(vehicles.len(), 4);

    for vehicle in vehicles {
        let name = vehicle.name.clone();
        let result = simulate(
            SimulationRequest {
                vehicle,
                waypoints: mission.waypoints.clone(),
                wind: WindSettings::calm(),
            },
            SimulationOptions::from(&engine),
        )
        .unwrap_or_else(|err| panic!("{name}: {err}"));
        assert_eq!(result.segments.len(), mission.waypoints.len() - 1);
        assert!(result.total_energy_wh > 0.0, "{name} used no energy");
        assert!(result.battery_usage_percent < 100.0, "{name} cannot fly the loop");
    }
}
