//! Simulation orchestrator: validates inputs, evaluates every leg and aggregates the result.

use chrono::{DateTime, Utc};
use flight_battery::EnergyLedger;
use flight_config::{EngineConfig, VehicleConfig, Waypoint, WindServiceConfig, WindSettings};
use flight_kinematics::KinematicsError;
use flight_power::{PowerError, PowerTuning};
use flight_wind::WindResolver;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

use crate::facade::vehicle::{self, Vehicle, VehicleError};
use crate::result::{
    FlightSegment, Infeasibility, SimulationMetadata, SimulationResult, SimulationSummary, Warning,
};
use crate::segment::{SegmentOutcome, evaluate_segment};

/// Top-level simulation error.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid mission at waypoint {index}: {reason}")]
    InvalidMission { index: usize, reason: String },
    #[error("invalid vehicle configuration: {0}")]
    InvalidVehicleConfig(#[from] VehicleError),
    #[error("segment {index}: {source}")]
    Kinematics {
        index: usize,
        #[source]
        source: KinematicsError,
    },
    #[error("segment {index}: {source}")]
    Power {
        index: usize,
        #[source]
        source: PowerError,
    },
    #[error("simulation already finished; create a new one to run again")]
    AlreadyFinished,
}

/// Lifecycle of a [`Simulation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationState {
    Idle,
    Validating,
    PerSegment(usize),
    Aggregating,
    Done,
    Failed,
}

/// What to simulate.
#[derive(Debug, Clone)]
pub struct SimulationRequest {
    pub vehicle: VehicleConfig,
    pub waypoints: Vec<Waypoint>,
    pub wind: WindSettings,
}

/// How to simulate it.
#[derive(Debug, Clone, Default)]
pub struct SimulationOptions {
    pub tuning: PowerTuning,
    pub wind_service: WindServiceConfig,
    /// Evaluate legs on the rayon pool.
    pub parallel: bool,
}

impl From<&EngineConfig> for SimulationOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            tuning: PowerTuning::from_config(&config.tuning),
            wind_service: config.wind.clone(),
            parallel: config.parallel,
        }
    }
}

/// One simulation run; finishes exactly once.
#[derive(Debug)]
pub struct Simulation {
    request: SimulationRequest,
    options: SimulationOptions,
    wind: Option<WindResolver>,
    state: SimulationState,
}

impl Simulation {
    pub fn new(request: SimulationRequest, options: SimulationOptions) -> Self {
        Self {
            request,
            options,
            wind: None,
            state: SimulationState::Idle,
        }
    }

    /// Replace the wind resolver derived from the request settings.
    pub fn with_wind_resolver(mut self, resolver: WindResolver) -> Self {
        self.wind = Some(resolver);
        self
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    /// Run the mission. A second call returns [`SimulationError::AlreadyFinished`].
    pub fn run(&mut self) -> Result<SimulationResult, SimulationError> {
        if matches!(self.state, SimulationState::Done | SimulationState::Failed) {
            return Err(SimulationError::AlreadyFinished);
        }
        match self.execute() {
            Ok(result) => {
                self.state = SimulationState::Done;
                Ok(result)
            }
            Err(err) => {
                warn!(state = ?self.state, error = %err, "simulation failed");
                self.state = SimulationState::Failed;
                Err(err)
            }
        }
    }

    fn execute(&mut self) -> Result<SimulationResult, SimulationError> {
        self.state = SimulationState::Validating;
        validate_waypoints(&self.request.waypoints)?;
        let vehicle = vehicle::from_config(&self.request.vehicle, self.options.tuning)?;
        let wind = self
            .wind
            .take()
            .unwrap_or_else(|| WindResolver::from_settings(&self.request.wind, &self.options.wind_service));
        // one lookup time for every leg keeps legs independent of evaluation order
        let time = self.request.wind.start_time.unwrap_or_else(Utc::now);

        let waypoints = &self.request.waypoints;
        let leg_count = waypoints.len() - 1;
        let outcomes: Vec<SegmentOutcome> = if self.options.parallel {
            self.state = SimulationState::PerSegment(0);
            (0..leg_count)
                .into_par_iter()
                .map(|i| evaluate_segment(i, &waypoints[i], &waypoints[i + 1], &vehicle, &wind, time))
                .collect::<Result<_, _>>()?
        } else {
            let mut outcomes = Vec::with_capacity(leg_count);
            for i in 0..leg_count {
                self.state = SimulationState::PerSegment(i);
                outcomes.push(evaluate_segment(i, &waypoints[i], &waypoints[i + 1], &vehicle, &wind, time)?);
            }
            outcomes
        };

        self.state = SimulationState::Aggregating;
        Ok(aggregate(
            &vehicle,
            outcomes,
            AggregateContext {
                wind: &wind,
                options: &self.options,
                start_time: self.request.wind.start_time,
            },
        ))
    }
}

/// Run a mission in one call.
pub fn simulate(request: SimulationRequest, options: SimulationOptions) -> Result<SimulationResult, SimulationError> {
    Simulation::new(request, options).run()
}

fn validate_waypoints(waypoints: &[Waypoint]) -> Result<(), SimulationError> {
    if waypoints.len() < 2 {
        return Err(SimulationError::InvalidMission {
            index: waypoints.len(),
            reason: format!("at least 2 waypoints are required (got {})", waypoints.len()),
        });
    }
    for (index, wp) in waypoints.iter().enumerate() {
        let reason = if !(wp.latitude.is_finite() && (-90.0..=90.0).contains(&wp.latitude)) {
            Some(format!("latitude {} outside [-90, 90]", wp.latitude))
        } else if !(wp.longitude.is_finite() && (-180.0..=180.0).contains(&wp.longitude)) {
            Some(format!("longitude {} outside [-180, 180]", wp.longitude))
        } else if !wp.altitude.is_finite() {
            Some(format!("altitude {} is not finite", wp.altitude))
        } else if let Some(speed) = wp.speed.filter(|s| !(s.is_finite() && *s >= 0.0)) {
            Some(format!("target speed {speed} must be finite and non-negative"))
        } else {
            wp.hover_time
                .filter(|t| !(t.is_finite() && *t >= 0.0))
                .map(|t| format!("hover time {t} must be finite and non-negative"))
        };
        if let Some(reason) = reason {
            return Err(SimulationError::InvalidMission { index, reason });
        }
    }
    Ok(())
}

struct AggregateContext<'a> {
    wind: &'a WindResolver,
    options: &'a SimulationOptions,
    start_time: Option<DateTime<Utc>>,
}

fn aggregate(vehicle: &Vehicle, outcomes: Vec<SegmentOutcome>, ctx: AggregateContext<'_>) -> SimulationResult {
    let mut ledger = EnergyLedger::new(&vehicle.battery);
    let mut first_wind_failure = None;
    let mut segments: Vec<FlightSegment> = Vec::with_capacity(outcomes.len());

    for outcome in outcomes {
        let mut segment = outcome.segment;
        if outcome.wind_failure.is_some() && first_wind_failure.is_none() {
            first_wind_failure = Some(segment.index);
        }
        let was_depleted = ledger.depleted_at().is_some();
        let usage = ledger.record(segment.index, segment.energy_wh, segment.distance_m, segment.duration_s);
        segment.cumulative_energy_wh = usage.energy_wh;
        segment.cumulative_battery_percent = usage.battery_percent;
        if !was_depleted && ledger.depleted_at().is_some() {
            warn!(segment = segment.index, usage = usage.battery_percent, "battery depleted");
            segment.warnings.push(Warning::InfeasibleSegment {
                segment: segment.index,
                reason: Infeasibility::BatteryDepleted,
                message: format!("cumulative battery usage reaches {:.1}%", usage.battery_percent),
            });
        }
        segments.push(segment);
    }

    let report = ledger.report();
    let total_distance_m: f64 = segments.iter().map(|s| s.distance_m).sum();
    let total_time_s: f64 = segments.iter().map(|s| s.duration_s).sum();
    let total_energy_wh = ledger.total_wh();
    let warnings: Vec<Warning> = segments.iter().flat_map(|s| s.warnings.iter().cloned()).collect();

    info!(
        vehicle = %vehicle.name,
        segments = segments.len(),
        energy_wh = total_energy_wh,
        battery_percent = report.usage_percent,
        "simulation complete"
    );

    SimulationResult {
        vehicle_name: vehicle.name.clone(),
        vehicle_kind: vehicle.kind,
        total_energy_wh,
        total_distance_m,
        total_time_s,
        battery_usage_percent: report.usage_percent,
        summary: SimulationSummary {
            average_speed_ms: if total_time_s > 0.0 {
                total_distance_m / total_time_s
            } else {
                0.0
            },
            average_power_w: if total_time_s > 0.0 {
                total_energy_wh * 3_600.0 / total_time_s
            } else {
                0.0
            },
            energy_per_km_wh: report.energy_per_km_wh,
            flight_time_minutes: total_time_s / 60.0,
            battery_capacity_wh: report.capacity_wh,
            remaining_energy_wh: report.remaining_wh,
            remaining_battery_percent: report.remaining_percent,
            is_feasible: report.feasible,
            max_range_km: report.max_range_km,
            depleted_at_segment: report.depleted_at_segment,
        },
        metadata: SimulationMetadata {
            wind_source: ctx.wind.kind(),
            wind_fallback_used: first_wind_failure.is_some(),
            first_wind_failure_segment: first_wind_failure,
            induced_model: ctx.options.tuning.induced_model,
            parallel: ctx.options.parallel,
            start_time: ctx.start_time,
            warnings,
        },
        segments,
    }
}
