//! Segment kinematics: geometry and rest-to-rest speed profiles between two waypoints.

use flight_config::Waypoint;
use flight_core::{geo, vector};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DISTANCE_EPSILON_M: f64 = 1e-6;

/// Ground speed a leg is flown at when the wind leaves no forward progress at the commanded airspeed.
pub const MIN_GROUND_SPEED_MS: f64 = 0.5;

/// Speed and acceleration envelope of a vehicle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionLimits {
    pub cruise_speed_ms: f64,
    pub max_speed_ms: f64,
    pub max_climb_rate_ms: f64,
    pub max_descent_speed_ms: f64,
    pub horizontal_acceleration_ms2: f64,
    pub vertical_acceleration_ms2: f64,
}

impl MotionLimits {
    fn validate(&self) -> Result<(), KinematicsError> {
        let checks = [
            ("cruise_speed_ms", self.cruise_speed_ms),
            ("max_speed_ms", self.max_speed_ms),
            ("max_climb_rate_ms", self.max_climb_rate_ms),
            ("max_descent_speed_ms", self.max_descent_speed_ms),
            ("horizontal_acceleration_ms2", self.horizontal_acceleration_ms2),
            ("vertical_acceleration_ms2", self.vertical_acceleration_ms2),
        ];
        for (name, value) in checks {
            if !(value.is_finite() && value > 0.0) {
                return Err(KinematicsError::InvalidLimit { name, value });
            }
        }
        Ok(())
    }

    /// Commanded horizontal airspeed for a leg; a waypoint request never exceeds `min(cruise, max)`.
    pub fn target_airspeed(&self, requested: Option<f64>) -> f64 {
        let ceiling = self.cruise_speed_ms.min(self.max_speed_ms);
        match requested {
            Some(speed) if speed.is_finite() && speed > 0.0 => speed.min(ceiling),
            _ => ceiling,
        }
    }
}

/// Wind relative to a leg's horizontal track.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrackWind {
    /// Positive against the direction of travel.
    pub headwind_ms: f64,
    pub crosswind_ms: f64,
}

impl TrackWind {
    /// Ground speed along the track that holds `airspeed_ms` through the air mass.
    ///
    /// The second value is `true` when the result was raised to [`MIN_GROUND_SPEED_MS`].
    pub fn ground_speed_for(&self, airspeed_ms: f64) -> (f64, bool) {
        let along = (airspeed_ms * airspeed_ms - self.crosswind_ms * self.crosswind_ms)
            .max(0.0)
            .sqrt();
        let ground = along - self.headwind_ms;
        if ground < MIN_GROUND_SPEED_MS {
            (MIN_GROUND_SPEED_MS, true)
        } else {
            (ground, false)
        }
    }
}

/// Unit east/north direction from `prev` to `next`; `None` when the leg has no horizontal extent.
pub fn track_direction(prev: &Waypoint, next: &Waypoint) -> Option<vector::Vector2> {
    let horizontal = geo::haversine_m(prev.latitude, prev.longitude, next.latitude, next.longitude);
    if horizontal <= DISTANCE_EPSILON_M {
        return None;
    }
    vector::normalize(&geo::enu_offset_m(
        prev.latitude,
        prev.longitude,
        next.latitude,
        next.longitude,
    ))
}

/// Coarse flight phase of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlightPhase {
    Hover,
    Climb,
    Descent,
    Cruise,
    Transition,
}

/// Shape of the rest-to-rest velocity profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileShape {
    Stationary,
    Triangular,
    Trapezoidal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileStage {
    Accelerate,
    Cruise,
    Decelerate,
}

/// One constant-acceleration (or constant-speed) piece of the profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfilePhase {
    pub stage: ProfileStage,
    pub duration_s: f64,
    pub path_distance_m: f64,
    /// Mean horizontal speed over the phase.
    pub mean_ground_speed_ms: f64,
    /// Mean signed vertical rate over the phase (positive = climbing).
    pub mean_vertical_rate_ms: f64,
}

/// Geometry and timing of one leg between consecutive waypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentKinematics {
    pub horizontal_distance_m: f64,
    pub vertical_delta_m: f64,
    /// Straight-line 3D path length.
    pub distance_m: f64,
    /// Time spent moving; excludes loiter.
    pub travel_time_s: f64,
    /// Loiter time at the end waypoint.
    pub hover_time_s: f64,
    pub avg_ground_speed_ms: f64,
    /// Horizontal speed on the cruise (or peak) part of the profile.
    pub cruise_ground_speed_ms: f64,
    /// Signed vertical rate on the cruise (or peak) part of the profile.
    pub vertical_rate_ms: f64,
    pub phase: FlightPhase,
    pub shape: ProfileShape,
    pub phases: Vec<ProfilePhase>,
    /// Wind cancelled the commanded airspeed; ground speed was held at [`MIN_GROUND_SPEED_MS`].
    pub wind_limited: bool,
}

impl SegmentKinematics {
    /// Travel plus loiter time.
    pub fn duration_s(&self) -> f64 {
        self.travel_time_s + self.hover_time_s
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum KinematicsError {
    #[error("motion limit `{name}` must be finite and positive (got {value})")]
    InvalidLimit { name: &'static str, value: f64 },
    #[error("waypoint coordinates must be finite")]
    NonFiniteWaypoint,
}

/// Build the motion profile between `prev` and `next` in still air.
pub fn build_segment(
    prev: &Waypoint,
    next: &Waypoint,
    limits: &MotionLimits,
) -> Result<SegmentKinematics, KinematicsError> {
    build_segment_in_wind(prev, next, limits, TrackWind::default())
}

/// Build the motion profile between `prev` and `next`.
///
/// The commanded speed is an airspeed: a headwind slows the leg over the ground and a
/// tailwind speeds it up. Each leg starts and ends at rest, so legs can be evaluated
/// independently of one another.
pub fn build_segment_in_wind(
    prev: &Waypoint,
    next: &Waypoint,
    limits: &MotionLimits,
    wind: TrackWind,
) -> Result<SegmentKinematics, KinematicsError> {
    limits.validate()?;
    let coords = [
        prev.latitude,
        prev.longitude,
        prev.altitude,
        next.latitude,
        next.longitude,
        next.altitude,
    ];
    if coords.iter().any(|c| !c.is_finite()) {
        return Err(KinematicsError::NonFiniteWaypoint);
    }

    let horizontal = geo::haversine_m(prev.latitude, prev.longitude, next.latitude, next.longitude);
    let vertical = next.altitude - prev.altitude;
    let distance = (horizontal * horizontal + vertical * vertical).sqrt();
    let hover_time = next.hover_time.filter(|t| t.is_finite()).unwrap_or(0.0).max(0.0);

    if distance <= DISTANCE_EPSILON_M {
        return Ok(SegmentKinematics {
            horizontal_distance_m: 0.0,
            vertical_delta_m: 0.0,
            distance_m: 0.0,
            travel_time_s: 0.0,
            hover_time_s: hover_time,
            avg_ground_speed_ms: 0.0,
            cruise_ground_speed_ms: 0.0,
            vertical_rate_ms: 0.0,
            phase: FlightPhase::Hover,
            shape: ProfileShape::Stationary,
            phases: Vec::new(),
            wind_limited: false,
        });
    }

    let envelope = path_envelope(limits, next.speed, wind, horizontal, vertical, distance);
    let horizontal_share = horizontal / distance;
    let vertical_share = vertical / distance;

    let (shape, peak_speed, pieces) = rest_to_rest_profile(distance, envelope.speed, envelope.accel);
    let phases: Vec<ProfilePhase> = pieces
        .into_iter()
        .filter(|(_, duration, _, _)| *duration > 0.0)
        .map(|(stage, duration, path_distance, mean_speed)| ProfilePhase {
            stage,
            duration_s: duration,
            path_distance_m: path_distance,
            mean_ground_speed_ms: mean_speed * horizontal_share,
            mean_vertical_rate_ms: mean_speed * vertical_share,
        })
        .collect();
    let travel_time: f64 = phases.iter().map(|p| p.duration_s).sum();

    Ok(SegmentKinematics {
        horizontal_distance_m: horizontal,
        vertical_delta_m: vertical,
        distance_m: distance,
        travel_time_s: travel_time,
        hover_time_s: hover_time,
        avg_ground_speed_ms: if travel_time > 0.0 { horizontal / travel_time } else { 0.0 },
        cruise_ground_speed_ms: peak_speed * horizontal_share,
        vertical_rate_ms: peak_speed * vertical_share,
        phase: classify(horizontal, vertical),
        shape,
        phases,
        wind_limited: envelope.wind_limited,
    })
}

struct Envelope {
    speed: f64,
    accel: f64,
    wind_limited: bool,
}

/// Largest path speed and acceleration that keep every axis within its limit.
fn path_envelope(
    limits: &MotionLimits,
    requested_speed: Option<f64>,
    wind: TrackWind,
    horizontal: f64,
    vertical: f64,
    distance: f64,
) -> Envelope {
    let mut speed = f64::INFINITY;
    let mut accel = f64::INFINITY;
    let mut wind_limited = false;

    if horizontal > DISTANCE_EPSILON_M {
        let ratio = distance / horizontal;
        let (ground, limited) = wind.ground_speed_for(limits.target_airspeed(requested_speed));
        wind_limited = limited;
        speed = speed.min(ground * ratio);
        accel = accel.min(limits.horizontal_acceleration_ms2 * ratio);
    }
    if vertical.abs() > DISTANCE_EPSILON_M {
        let ratio = distance / vertical.abs();
        let rate = if vertical > 0.0 {
            limits.max_climb_rate_ms
        } else {
            limits.max_descent_speed_ms
        };
        speed = speed.min(rate * ratio);
        accel = accel.min(limits.vertical_acceleration_ms2 * ratio);
    }
    Envelope {
        speed,
        accel,
        wind_limited,
    }
}

/// Trapezoidal profile when the leg is long enough to reach `speed`, triangular otherwise.
///
/// Returns `(stage, duration, path distance, mean path speed)` pieces.
fn rest_to_rest_profile(
    distance: f64,
    speed: f64,
    accel: f64,
) -> (ProfileShape, f64, Vec<(ProfileStage, f64, f64, f64)>) {
    // v² = v0² + 2·a·d with v0 = 0
    let ramp_distance = speed * speed / (2.0 * accel);
    if distance >= 2.0 * ramp_distance {
        let ramp_time = speed / accel;
        let cruise_distance = distance - 2.0 * ramp_distance;
        let cruise_time = cruise_distance / speed;
        (
            ProfileShape::Trapezoidal,
            speed,
            vec![
                (ProfileStage::Accelerate, ramp_time, ramp_distance, 0.5 * speed),
                (ProfileStage::Cruise, cruise_time, cruise_distance, speed),
                (ProfileStage::Decelerate, ramp_time, ramp_distance, 0.5 * speed),
            ],
        )
    } else {
        let peak = (accel * distance).sqrt();
        let ramp_time = peak / accel;
        let half = 0.5 * distance;
        (
            ProfileShape::Triangular,
            peak,
            vec![
                (ProfileStage::Accelerate, ramp_time, half, 0.5 * peak),
                (ProfileStage::Decelerate, ramp_time, half, 0.5 * peak),
            ],
        )
    }
}

fn classify(horizontal: f64, vertical: f64) -> FlightPhase {
    if vertical.abs() > horizontal {
        if vertical > 0.0 {
            FlightPhase::Climb
        } else {
            FlightPhase::Descent
        }
    } else {
        FlightPhase::Cruise
    }
}
