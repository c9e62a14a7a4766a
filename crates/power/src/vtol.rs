use flight_config::VehicleConfig;

use crate::fixed_wing::FixedWing;
use crate::multirotor::Multirotor;
use crate::tuning::PowerTuning;
use crate::{FlightPhase, LevelPower, PowerError, PowerModel};

/// Below this airspeed a VTOL flies on its lift rotors alone.
pub const TRANSITION_SPEED_MS: f64 = 5.0;
/// Airspeed span over which hover-mode and cruise-mode power are blended.
pub const TRANSITION_WIDTH_MS: f64 = 3.0;

const MIN_LIFT_SHARE: f64 = 0.3;
const LIFT_SHARE_SLOPE: f64 = 0.7;
const DEFAULT_FORWARD_SHARE: f64 = 0.3;

/// Lift rotors plus an independent forward-thrust unit, optionally with a usable wing.
#[derive(Debug, Clone, PartialEq)]
pub struct Vtol {
    pub lift: Multirotor,
    pub max_speed_ms: f64,
    /// Forward-thrust draw while rotors still carry part of the weight.
    pub forward_thrust_w: f64,
    /// Configured forward-thrust power; lower bound of wing-borne draw.
    pub forward_thrust_floor_w: Option<f64>,
    pub wing: Option<FixedWing>,
}

impl Vtol {
    pub fn from_config(config: &VehicleConfig, tuning: PowerTuning) -> Self {
        let forward_thrust_w = config
            .forward_thrust_power_w
            .or(config.cruise_power_w)
            .unwrap_or(DEFAULT_FORWARD_SHARE * config.max_power_w);
        Self {
            lift: Multirotor::from_config(config, tuning),
            max_speed_ms: config.max_speed_ms,
            forward_thrust_w,
            forward_thrust_floor_w: config.forward_thrust_power_w,
            wing: config
                .stall_speed_ms
                .map(|stall| FixedWing::with_stall(config, stall, tuning)),
        }
    }

    /// Share of the weight still carried by the lift rotors.
    pub fn lift_share(&self, airspeed_ms: f64) -> f64 {
        (1.0 - LIFT_SHARE_SLOPE * airspeed_ms / self.max_speed_ms).max(MIN_LIFT_SHARE)
    }

    pub fn is_wing_borne(&self, airspeed_ms: f64) -> bool {
        self.wing
            .as_ref()
            .is_some_and(|wing| airspeed_ms >= wing.stall_speed_ms)
    }

    /// Power with the lift rotors carrying the full weight.
    pub fn hover_mode_power(&self, airspeed_ms: f64, air_density: f64) -> f64 {
        self.lift.forward_power(airspeed_ms, air_density)
    }

    /// Power in forward flight, rotor-assisted or wing-borne.
    pub fn cruise_mode_power(&self, airspeed_ms: f64, air_density: f64) -> f64 {
        if let Some(wing) = self.wing.as_ref().filter(|w| airspeed_ms >= w.stall_speed_ms) {
            let drag = wing.drag_power(airspeed_ms, air_density);
            return drag.max(self.forward_thrust_floor_w.unwrap_or(0.0));
        }
        self.lift_share(airspeed_ms) * self.lift.hover_power(air_density) + self.forward_thrust_w
    }
}

impl PowerModel for Vtol {
    fn mass_kg(&self) -> f64 {
        self.lift.mass_kg
    }

    fn max_power_w(&self) -> f64 {
        self.lift.max_power_w
    }

    fn motor_efficiency(&self) -> f64 {
        self.lift.efficiency.motor
    }

    fn tuning(&self) -> &PowerTuning {
        &self.lift.tuning
    }

    fn level_power(
        &self,
        airspeed_ms: f64,
        air_density: f64,
        phase: FlightPhase,
    ) -> Result<LevelPower, PowerError> {
        let rotor_borne = matches!(
            phase,
            FlightPhase::Hover | FlightPhase::Climb | FlightPhase::Descent
        );
        if rotor_borne || airspeed_ms < TRANSITION_SPEED_MS {
            let phase = if phase == FlightPhase::Cruise {
                FlightPhase::Hover
            } else {
                phase
            };
            return Ok(LevelPower {
                power_w: self.hover_mode_power(airspeed_ms, air_density),
                phase,
            });
        }

        let cruise = self.cruise_mode_power(airspeed_ms, air_density);
        let progress = (airspeed_ms - TRANSITION_SPEED_MS) / TRANSITION_WIDTH_MS;
        if progress >= 1.0 {
            return Ok(LevelPower {
                power_w: cruise,
                phase,
            });
        }
        let hover = self.hover_mode_power(airspeed_ms, air_density);
        Ok(LevelPower {
            power_w: (1.0 - progress) * hover + progress * cruise,
            phase: FlightPhase::Transition,
        })
    }

    fn loiter_power(&self, air_density: f64) -> Result<LevelPower, PowerError> {
        self.lift.loiter_power(air_density)
    }
}
