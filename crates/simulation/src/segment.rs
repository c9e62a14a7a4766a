//! Evaluation of a single leg; a pure function of its inputs so legs can run in parallel.

use chrono::{DateTime, Utc};
use flight_battery::integrate;
use flight_config::Waypoint;
use flight_core::{atmosphere, geo, vector};
use flight_kinematics::{ProfileStage, TrackWind, build_segment_in_wind, track_direction};
use flight_power::{FlightPhase, PowerError, PowerEstimate, PowerModel, PowerRequest};
use flight_wind::{Position, WindResolver, airspeed, project};
use tracing::{debug, warn};

use crate::facade::vehicle::Vehicle;
use crate::result::{FlightSegment, Infeasibility, WindInfluence, Warning};
use crate::run::SimulationError;

/// A computed leg before cumulative battery figures are filled in.
#[derive(Debug, Clone)]
pub(crate) struct SegmentOutcome {
    pub segment: FlightSegment,
    pub wind_failure: Option<String>,
}

/// Power at the requested airspeed, or at stall speed when the wing cannot fly slower.
fn draw_or_stall(
    model: &dyn PowerModel,
    request: PowerRequest,
) -> Result<(PowerEstimate, Option<f64>), PowerError> {
    match model.power_draw(&request) {
        Err(PowerError::BelowStall { stall_speed_ms, .. }) => {
            let at_stall = PowerRequest {
                airspeed_ms: stall_speed_ms,
                ..request
            };
            Ok((model.power_draw(&at_stall)?, Some(stall_speed_ms)))
        }
        other => other.map(|estimate| (estimate, None)),
    }
}

pub(crate) fn evaluate_segment(
    index: usize,
    start: &Waypoint,
    end: &Waypoint,
    vehicle: &Vehicle,
    wind: &WindResolver,
    time: DateTime<Utc>,
) -> Result<SegmentOutcome, SimulationError> {
    let mean_altitude = 0.5 * (start.altitude + end.altitude);
    let rho = atmosphere::air_density(mean_altitude);
    let (lat, lon) = geo::midpoint(start.latitude, start.longitude, end.latitude, end.longitude);
    let resolved = wind.resolve(&Position::new(lat, lon, mean_altitude), time);
    let direction = track_direction(start, end);
    let components = project(&resolved.sample, direction);
    let track_wind = match direction {
        Some(_) => TrackWind {
            headwind_ms: components.headwind_ms,
            crosswind_ms: components.crosswind_ms,
        },
        None => TrackWind::default(),
    };

    let kin = build_segment_in_wind(start, end, &vehicle.limits, track_wind)
        .map_err(|source| SimulationError::Kinematics { index, source })?;
    let power_err = |source| SimulationError::Power { index, source };

    let model: &dyn PowerModel = &vehicle.model;
    let mut warnings = Vec::new();
    let mut travel_energy_wh = 0.0;
    let mut limited = false;
    let mut cruise_airspeed_ms = 0.0;
    let mut cruise_power_w = 0.0;
    let mut phase = kin.phase;

    if !kin.phases.is_empty() {
        let peak_airspeed = airspeed(kin.cruise_ground_speed_ms, &components);
        let (peak, stall) = draw_or_stall(
            model,
            PowerRequest {
                airspeed_ms: peak_airspeed,
                vertical_rate_ms: kin.vertical_rate_ms,
                phase: kin.phase,
                air_density: rho,
            },
        )
        .map_err(power_err)?;
        cruise_airspeed_ms = stall.unwrap_or(peak_airspeed);
        cruise_power_w = peak.power_w;
        phase = peak.phase;
        if let Some(stall_speed) = stall {
            warn!(segment = index, airspeed_ms = peak_airspeed, stall_speed_ms = stall_speed, "airspeed below stall");
            warnings.push(Warning::InfeasibleSegment {
                segment: index,
                reason: Infeasibility::BelowStall,
                message: format!(
                    "airspeed {peak_airspeed:.2} m/s is below stall speed {stall_speed:.2} m/s; power evaluated at stall"
                ),
            });
        }

        for piece in &kin.phases {
            let (estimate, _) = match piece.stage {
                ProfileStage::Cruise => (peak, None),
                ProfileStage::Accelerate | ProfileStage::Decelerate => draw_or_stall(
                    model,
                    PowerRequest {
                        airspeed_ms: airspeed(piece.mean_ground_speed_ms, &components),
                        vertical_rate_ms: piece.mean_vertical_rate_ms,
                        phase: kin.phase,
                        air_density: rho,
                    },
                )
                .map_err(power_err)?,
            };
            limited |= estimate.limited;
            travel_energy_wh += integrate(estimate.power_w, piece.duration_s);
        }
        limited |= peak.limited;
    }

    let mut hover_energy_wh = 0.0;
    if kin.hover_time_s > 0.0 {
        let loiter = model.loiter_draw(rho).map_err(power_err)?;
        limited |= loiter.limited;
        hover_energy_wh = integrate(loiter.power_w, kin.hover_time_s);
        if kin.phases.is_empty() {
            phase = FlightPhase::Hover;
            cruise_power_w = loiter.power_w;
        }
    }

    if kin.wind_limited {
        warn!(segment = index, headwind_ms = components.headwind_ms, "wind exceeds commanded airspeed");
        warnings.push(Warning::InfeasibleSegment {
            segment: index,
            reason: Infeasibility::WindExceedsAirspeed,
            message: format!(
                "headwind {:.2} m/s leaves no ground speed at the commanded airspeed; leg flown at {:.2} m/s over the ground",
                components.headwind_ms, kin.cruise_ground_speed_ms
            ),
        });
    }
    if limited {
        warnings.push(Warning::InfeasibleSegment {
            segment: index,
            reason: Infeasibility::PowerLimited,
            message: format!(
                "power demand exceeds the {:.0} W rating and was clamped",
                model.max_power_w()
            ),
        });
    }
    if let Some(reason) = &resolved.fallback_reason {
        warnings.push(Warning::WindSourceUnavailable {
            segment: index,
            message: format!("synthetic wind used: {reason}"),
        });
    }

    let energy_wh = travel_energy_wh + hover_energy_wh;
    let duration_s = kin.duration_s();
    let segment = FlightSegment {
        index,
        start: start.clone(),
        end: end.clone(),
        distance_m: kin.distance_m,
        horizontal_distance_m: kin.horizontal_distance_m,
        duration_s,
        energy_wh,
        average_speed_ms: kin.avg_ground_speed_ms,
        cruise_ground_speed_ms: kin.cruise_ground_speed_ms,
        average_power_w: if duration_s > 0.0 {
            energy_wh * 3_600.0 / duration_s
        } else {
            0.0
        },
        cruise_airspeed_ms,
        cruise_power_w,
        phase,
        vertical_rate_ms: kin.vertical_rate_ms,
        hover_time_s: kin.hover_time_s,
        hover_energy_wh,
        cumulative_energy_wh: 0.0,
        cumulative_battery_percent: 0.0,
        wind: WindInfluence {
            speed_ms: resolved.sample.speed_ms,
            direction_deg: resolved.sample.direction_deg,
            headwind_ms: components.headwind_ms,
            crosswind_ms: components.crosswind_ms,
            flight_bearing_deg: direction.map(|d| vector::bearing_deg(&d)),
            vertical_ms: resolved.sample.vertical_ms,
            source: resolved.sample.source,
        },
        warnings,
    };

    debug!(
        segment = index,
        distance_m = segment.distance_m,
        duration_s = segment.duration_s,
        energy_wh = segment.energy_wh,
        airspeed_ms = segment.cruise_airspeed_ms,
        "segment evaluated"
    );

    Ok(SegmentOutcome {
        segment,
        wind_failure: resolved.fallback_reason,
    })
}
