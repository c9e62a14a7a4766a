//! Output records of a simulation run.

use chrono::{DateTime, Utc};
use flight_config::{VehicleKind, Waypoint};
use flight_kinematics::FlightPhase;
use flight_power::InducedModel;
use flight_wind::WindSourceKind;
use serde::Serialize;

/// Why a segment cannot be flown as planned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Infeasibility {
    /// Fixed-wing airspeed below stall; power was evaluated at stall speed.
    BelowStall,
    /// Requested power exceeded the rating and was clamped.
    PowerLimited,
    /// Cumulative battery usage passed 100%.
    BatteryDepleted,
    /// Wind left no forward progress at the commanded airspeed.
    WindExceedsAirspeed,
}

/// Non-fatal findings attached to segments and summarized on the result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    InfeasibleSegment {
        segment: usize,
        reason: Infeasibility,
        message: String,
    },
    WindSourceUnavailable {
        segment: usize,
        message: String,
    },
}

impl Warning {
    pub fn segment(&self) -> usize {
        match self {
            Warning::InfeasibleSegment { segment, .. } | Warning::WindSourceUnavailable { segment, .. } => *segment,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Warning::InfeasibleSegment { message, .. } | Warning::WindSourceUnavailable { message, .. } => message,
        }
    }

    pub fn infeasibility(&self) -> Option<Infeasibility> {
        match self {
            Warning::InfeasibleSegment { reason, .. } => Some(*reason),
            Warning::WindSourceUnavailable { .. } => None,
        }
    }
}

/// Wind as experienced along one segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindInfluence {
    pub speed_ms: f64,
    pub direction_deg: f64,
    pub headwind_ms: f64,
    pub crosswind_ms: f64,
    /// Compass bearing of the leg; absent for vertical or stationary legs.
    pub flight_bearing_deg: Option<f64>,
    pub vertical_ms: Option<f64>,
    pub source: WindSourceKind,
}

/// Kinematic and energetic record of one leg.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightSegment {
    pub index: usize,
    pub start: Waypoint,
    pub end: Waypoint,
    /// 3D path length (m).
    pub distance_m: f64,
    pub horizontal_distance_m: f64,
    /// Travel plus loiter (s).
    pub duration_s: f64,
    pub energy_wh: f64,
    pub average_speed_ms: f64,
    pub average_power_w: f64,
    /// Ground speed on the cruise (or peak) part of the leg.
    pub cruise_ground_speed_ms: f64,
    pub cruise_airspeed_ms: f64,
    pub cruise_power_w: f64,
    pub phase: FlightPhase,
    pub vertical_rate_ms: f64,
    pub hover_time_s: f64,
    pub hover_energy_wh: f64,
    pub cumulative_energy_wh: f64,
    pub cumulative_battery_percent: f64,
    pub wind: WindInfluence,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSummary {
    pub average_speed_ms: f64,
    pub average_power_w: f64,
    pub energy_per_km_wh: f64,
    pub flight_time_minutes: f64,
    pub battery_capacity_wh: f64,
    pub remaining_energy_wh: f64,
    pub remaining_battery_percent: f64,
    pub is_feasible: bool,
    pub max_range_km: f64,
    /// First segment after which the pack is empty.
    pub depleted_at_segment: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationMetadata {
    pub wind_source: WindSourceKind,
    pub wind_fallback_used: bool,
    pub first_wind_failure_segment: Option<usize>,
    pub induced_model: InducedModel,
    pub parallel: bool,
    pub start_time: Option<DateTime<Utc>>,
    /// Every segment warning, in segment order.
    pub warnings: Vec<Warning>,
}

/// Complete outcome of a mission simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub vehicle_name: String,
    pub vehicle_kind: VehicleKind,
    pub total_energy_wh: f64,
    pub total_distance_m: f64,
    pub total_time_s: f64,
    /// Not clamped; above 100 means the mission exceeds the pack.
    pub battery_usage_percent: f64,
    pub segments: Vec<FlightSegment>,
    pub summary: SimulationSummary,
    pub metadata: SimulationMetadata,
}

impl SimulationResult {
    /// Whether any segment carries the given infeasibility.
    pub fn has_infeasibility(&self, reason: Infeasibility) -> bool {
        self.metadata
            .warnings
            .iter()
            .any(|w| w.infeasibility() == Some(reason))
    }
}
