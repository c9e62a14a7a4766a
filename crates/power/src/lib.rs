//! Vehicle power models.
//!
//! Every vehicle class implements [`PowerModel`]; [`VehicleModel`] is the tagged union the
//! simulation dispatches through.

pub mod analysis;
mod fixed_wing;
mod multirotor;
pub mod sweet_spot;
pub mod tuning;
mod vtol;

use flight_config::{MotorConfiguration, VehicleConfig, VehicleKind};
use flight_core::constants::GRAVITY_M_S2;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use fixed_wing::{DEFAULT_ASPECT_RATIO, FixedWing};
pub use flight_kinematics::FlightPhase;
pub use multirotor::Multirotor;
pub use tuning::{InducedModel, PowerTuning, SweetSpotTuning};
pub use vtol::{TRANSITION_SPEED_MS, TRANSITION_WIDTH_MS, Vtol};

/// Motor × propeller × transmission (ESC) efficiency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyChain {
    pub motor: f64,
    pub propeller: f64,
    pub transmission: f64,
}

impl EfficiencyChain {
    pub fn from_config(config: &VehicleConfig) -> Self {
        Self {
            motor: config.motor_efficiency,
            propeller: config.propeller_efficiency,
            transmission: config.transmission_efficiency,
        }
    }

    pub fn total(&self) -> f64 {
        self.motor * self.propeller * self.transmission
    }
}

/// Inputs of one power evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerRequest {
    /// True airspeed (m/s).
    pub airspeed_ms: f64,
    /// Signed vertical rate (m/s, positive = climbing).
    pub vertical_rate_ms: f64,
    pub phase: FlightPhase,
    /// Air density (kg/m³).
    pub air_density: f64,
}

/// Electrical power for level flight together with the mode the vehicle flew in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelPower {
    pub power_w: f64,
    pub phase: FlightPhase,
}

/// Result of a power evaluation, after vertical terms and the max-power clamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerEstimate {
    /// Power actually drawn (never above the rating).
    pub power_w: f64,
    /// Power the flight condition asked for before clamping.
    pub requested_w: f64,
    pub level_w: f64,
    pub vertical_w: f64,
    pub phase: FlightPhase,
    /// The request exceeded `max_power` and was clamped.
    pub limited: bool,
}

#[derive(Debug, Error, PartialEq)]
pub enum PowerError {
    #[error("airspeed {airspeed_ms:.2} m/s is below the stall speed of {stall_speed_ms:.2} m/s")]
    BelowStall {
        airspeed_ms: f64,
        stall_speed_ms: f64,
    },
    #[error("fixed-wing vehicle `{0}` has no stall speed")]
    MissingStallSpeed(String),
    #[error("{what} must be finite (got {value})")]
    NonFinite { what: &'static str, value: f64 },
}

/// Power required by a vehicle class in a given flight condition.
pub trait PowerModel {
    fn mass_kg(&self) -> f64;

    fn max_power_w(&self) -> f64;

    fn motor_efficiency(&self) -> f64;

    fn tuning(&self) -> &PowerTuning;

    /// Electrical power for unaccelerated level flight at `airspeed_ms`.
    fn level_power(
        &self,
        airspeed_ms: f64,
        air_density: f64,
        phase: FlightPhase,
    ) -> Result<LevelPower, PowerError>;

    /// Level power while holding position at a waypoint.
    fn loiter_power(&self, air_density: f64) -> Result<LevelPower, PowerError>;

    /// Total electrical draw including vertical work, clamped to the rating.
    fn power_draw(&self, request: &PowerRequest) -> Result<PowerEstimate, PowerError> {
        for (what, value) in [
            ("airspeed", request.airspeed_ms),
            ("vertical rate", request.vertical_rate_ms),
            ("air density", request.air_density),
        ] {
            if !value.is_finite() {
                return Err(PowerError::NonFinite { what, value });
            }
        }
        let level = self.level_power(request.airspeed_ms.max(0.0), request.air_density, request.phase)?;
        Ok(self.finish(level, request.vertical_rate_ms))
    }

    /// Loiter draw at a waypoint, clamped to the rating.
    fn loiter_draw(&self, air_density: f64) -> Result<PowerEstimate, PowerError> {
        let level = self.loiter_power(air_density)?;
        Ok(self.finish(level, 0.0))
    }

    /// Add vertical work to level power and apply the max-power clamp.
    fn finish(&self, level: LevelPower, vertical_rate_ms: f64) -> PowerEstimate {
        let tuning = self.tuning();
        let weight = self.mass_kg() * GRAVITY_M_S2;
        let vertical = if vertical_rate_ms > 0.0 {
            weight * vertical_rate_ms / self.motor_efficiency()
        } else {
            -weight * vertical_rate_ms.abs() * tuning.descent_recovery_factor
        };
        let requested = (level.power_w + vertical).max(tuning.descent_power_floor * level.power_w);
        let max = self.max_power_w();
        let limited = requested > max;
        if limited {
            debug!(requested_w = requested, max_power_w = max, "power demand clamped to rating");
        }
        PowerEstimate {
            power_w: requested.min(max),
            requested_w: requested,
            level_w: level.power_w,
            vertical_w: requested - level.power_w,
            phase: level.phase,
            limited,
        }
    }
}

/// Vehicle-class tagged union.
#[derive(Debug, Clone, PartialEq)]
pub enum VehicleModel {
    Multirotor(Multirotor),
    FixedWing(FixedWing),
    Vtol(Vtol),
}

impl VehicleModel {
    /// Build the power model for a configuration that already passed validation.
    pub fn from_config(config: &VehicleConfig, tuning: PowerTuning) -> Result<Self, PowerError> {
        Ok(match config.kind {
            VehicleKind::Multirotor => VehicleModel::Multirotor(Multirotor::from_config(config, tuning)),
            VehicleKind::Fixedwing => VehicleModel::FixedWing(FixedWing::from_config(config, tuning)?),
            VehicleKind::Vtol => VehicleModel::Vtol(Vtol::from_config(config, tuning)),
        })
    }

    pub fn kind(&self) -> VehicleKind {
        match self {
            VehicleModel::Multirotor(_) => VehicleKind::Multirotor,
            VehicleModel::FixedWing(_) => VehicleKind::Fixedwing,
            VehicleModel::Vtol(_) => VehicleKind::Vtol,
        }
    }

    fn inner(&self) -> &dyn PowerModel {
        match self {
            VehicleModel::Multirotor(m) => m,
            VehicleModel::FixedWing(m) => m,
            VehicleModel::Vtol(m) => m,
        }
    }
}

impl PowerModel for VehicleModel {
    fn mass_kg(&self) -> f64 {
        self.inner().mass_kg()
    }

    fn max_power_w(&self) -> f64 {
        self.inner().max_power_w()
    }

    fn motor_efficiency(&self) -> f64 {
        self.inner().motor_efficiency()
    }

    fn tuning(&self) -> &PowerTuning {
        self.inner().tuning()
    }

    fn level_power(
        &self,
        airspeed_ms: f64,
        air_density: f64,
        phase: FlightPhase,
    ) -> Result<LevelPower, PowerError> {
        self.inner().level_power(airspeed_ms, air_density, phase)
    }

    fn loiter_power(&self, air_density: f64) -> Result<LevelPower, PowerError> {
        self.inner().loiter_power(air_density)
    }
}

/// Number of lift rotors implied by the frame and motor layout.
pub fn rotor_count(config: &VehicleConfig) -> u32 {
    config.rotor_count.filter(|n| *n > 0).unwrap_or_else(|| {
        let base = config.frame_type.motor_count();
        match config.motor_config {
            MotorConfiguration::Single => base,
            MotorConfiguration::Coaxial => base * 2,
        }
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use flight_config::{FrameType, MotorConfiguration, VehicleConfig, VehicleKind};

    /// 10 kg hexacopter with logged hover power.
    pub fn hexa() -> VehicleConfig {
        VehicleConfig {
            name: "Hexa 10".to_string(),
            kind: VehicleKind::Multirotor,
            mass_kg: 10.0,
            max_power_w: 4000.0,
            hover_power_w: Some(2160.0),
            cruise_power_w: None,
            forward_thrust_power_w: None,
            cruise_speed_ms: 12.0,
            max_speed_ms: 20.0,
            stall_speed_ms: None,
            max_climb_rate_ms: 5.0,
            max_descent_speed_ms: 3.0,
            horizontal_acceleration_ms2: 3.0,
            vertical_acceleration_ms2: 2.0,
            battery_capacity_mah: 22_000.0,
            battery_voltage_v: 44.4,
            drag_coefficient: 0.03,
            wing_area_m2: 0.5,
            aspect_ratio: None,
            rotor_diameter_m: 0.44,
            rotor_count: None,
            frame_type: FrameType::Hexa,
            motor_config: MotorConfiguration::Single,
            motor_efficiency: 0.85,
            propeller_efficiency: 0.75,
            transmission_efficiency: 0.95,
        }
    }

    pub fn trainer() -> VehicleConfig {
        VehicleConfig {
            name: "Trainer".to_string(),
            kind: VehicleKind::Fixedwing,
            mass_kg: 3.0,
            max_power_w: 1200.0,
            hover_power_w: None,
            cruise_speed_ms: 18.0,
            max_speed_ms: 30.0,
            stall_speed_ms: Some(12.0),
            frame_type: FrameType::Quad,
            rotor_diameter_m: 0.3,
            ..hexa()
        }
    }

    pub fn vtol() -> VehicleConfig {
        VehicleConfig {
            name: "Quadplane".to_string(),
            kind: VehicleKind::Vtol,
            mass_kg: 6.0,
            max_power_w: 3000.0,
            hover_power_w: Some(1200.0),
            forward_thrust_power_w: Some(250.0),
            cruise_speed_ms: 20.0,
            max_speed_ms: 28.0,
            stall_speed_ms: None,
            frame_type: FrameType::Quad,
            rotor_diameter_m: 0.38,
            ..hexa()
        }
    }
}
