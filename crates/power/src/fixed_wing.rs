use std::f64::consts::PI;

use flight_config::VehicleConfig;
use flight_core::constants::GRAVITY_M_S2;

use crate::tuning::PowerTuning;
use crate::{EfficiencyChain, FlightPhase, LevelPower, PowerError, PowerModel};

/// Effective aspect ratio used when the configuration leaves it out.
pub const DEFAULT_ASPECT_RATIO: f64 = 8.0;

/// Wing-borne aircraft; lift comes from the wing, thrust from the propeller.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedWing {
    pub mass_kg: f64,
    pub max_power_w: f64,
    pub cruise_speed_ms: f64,
    pub stall_speed_ms: f64,
    pub wing_area_m2: f64,
    pub aspect_ratio: f64,
    pub drag_coefficient: f64,
    pub efficiency: EfficiencyChain,
    pub tuning: PowerTuning,
}

impl FixedWing {
    pub fn from_config(config: &VehicleConfig, tuning: PowerTuning) -> Result<Self, PowerError> {
        let stall = config
            .stall_speed_ms
            .ok_or_else(|| PowerError::MissingStallSpeed(config.name.clone()))?;
        Ok(Self::with_stall(config, stall, tuning))
    }

    pub(crate) fn with_stall(config: &VehicleConfig, stall_speed_ms: f64, tuning: PowerTuning) -> Self {
        Self {
            mass_kg: config.mass_kg,
            max_power_w: config.max_power_w,
            cruise_speed_ms: config.cruise_speed_ms,
            stall_speed_ms,
            wing_area_m2: config.wing_area_m2,
            aspect_ratio: config
                .aspect_ratio
                .filter(|ar| *ar > 0.0)
                .unwrap_or(DEFAULT_ASPECT_RATIO),
            drag_coefficient: config.drag_coefficient,
            efficiency: EfficiencyChain::from_config(config),
            tuning,
        }
    }

    /// Electrical power to overcome parasitic plus induced drag at `airspeed_ms`.
    ///
    /// No stall check; callers that need one go through [`PowerModel::level_power`].
    pub fn drag_power(&self, airspeed_ms: f64, air_density: f64) -> f64 {
        if airspeed_ms <= 0.0 {
            return 0.0;
        }
        let q = 0.5 * air_density * airspeed_ms * airspeed_ms;
        let lift_coefficient = self.mass_kg * GRAVITY_M_S2 / (q * self.wing_area_m2);
        let induced = lift_coefficient * lift_coefficient / (PI * self.aspect_ratio);
        let drag = q * self.wing_area_m2 * (self.drag_coefficient + induced);
        drag * airspeed_ms / (self.efficiency.motor * self.efficiency.propeller)
    }
}

impl PowerModel for FixedWing {
    fn mass_kg(&self) -> f64 {
        self.mass_kg
    }

    fn max_power_w(&self) -> f64 {
        self.max_power_w
    }

    fn motor_efficiency(&self) -> f64 {
        self.efficiency.motor
    }

    fn tuning(&self) -> &PowerTuning {
        &self.tuning
    }

    fn level_power(
        &self,
        airspeed_ms: f64,
        air_density: f64,
        phase: FlightPhase,
    ) -> Result<LevelPower, PowerError> {
        if airspeed_ms < self.stall_speed_ms {
            return Err(PowerError::BelowStall {
                airspeed_ms,
                stall_speed_ms: self.stall_speed_ms,
            });
        }
        Ok(LevelPower {
            power_w: self.drag_power(airspeed_ms, air_density),
            phase,
        })
    }

    /// Loiter is a holding pattern at cruise speed.
    fn loiter_power(&self, air_density: f64) -> Result<LevelPower, PowerError> {
        let speed = self.cruise_speed_ms.max(self.stall_speed_ms);
        Ok(LevelPower {
            power_w: self.drag_power(speed, air_density),
            phase: FlightPhase::Cruise,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::trainer;
    use flight_core::constants::SEA_LEVEL_AIR_DENSITY;

    #[test]
    fn trainer_cruise_power_is_modest() {
        let wing = FixedWing::from_config(&trainer(), PowerTuning::default()).expect("wing");
        let p = wing.drag_power(18.0, SEA_LEVEL_AIR_DENSITY);
        assert!((80.0..110.0).contains(&p), "p = {p}");
    }

    #[test]
    fn drag_power_rises_towards_max_speed() {
        let wing = FixedWing::from_config(&trainer(), PowerTuning::default()).expect("wing");
        let near_stall = wing.drag_power(12.0, SEA_LEVEL_AIR_DENSITY);
        let middle = wing.drag_power(16.0, SEA_LEVEL_AIR_DENSITY);
        let fast = wing.drag_power(30.0, SEA_LEVEL_AIR_DENSITY);
        assert!(middle < fast);
        assert!(near_stall < fast);
    }

    #[test]
    fn missing_stall_speed_is_an_error() {
        let mut config = trainer();
        config.stall_speed_ms = None;
        let err = FixedWing::from_config(&config, PowerTuning::default()).unwrap_err();
        assert_eq!(err, PowerError::MissingStallSpeed("Trainer".to_string()));
    }

    #[test]
    fn loiter_holds_cruise_speed() {
        let wing = FixedWing::from_config(&trainer(), PowerTuning::default()).expect("wing");
        let loiter = wing.loiter_power(SEA_LEVEL_AIR_DENSITY).expect("loiter");
        assert_eq!(loiter.power_w, wing.drag_power(18.0, SEA_LEVEL_AIR_DENSITY));
    }
}
