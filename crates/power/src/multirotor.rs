use std::f64::consts::PI;

use flight_config::{MotorConfiguration, VehicleConfig};
use flight_core::constants::GRAVITY_M_S2;

use crate::sweet_spot::efficiency_factor_with;
use crate::tuning::{
    BLADE_PROFILE_CD0, GLAUERT_BLEND_END_MS, GLAUERT_BLEND_START_MS, InducedModel,
    PROFILE_GROWTH_K, PowerTuning, ROTOR_SOLIDITY, ROTOR_TIP_SPEED_MS,
};
use crate::{EfficiencyChain, FlightPhase, LevelPower, PowerError, PowerModel, rotor_count};

/// Rotorcraft lifted entirely by its rotors.
#[derive(Debug, Clone, PartialEq)]
pub struct Multirotor {
    pub mass_kg: f64,
    pub max_power_w: f64,
    pub rotor_count: u32,
    pub rotor_diameter_m: f64,
    pub coaxial: bool,
    pub drag_coefficient: f64,
    /// Measured hover power; replaces the momentum-theory estimate when set.
    pub hover_power_w: Option<f64>,
    pub efficiency: EfficiencyChain,
    pub tuning: PowerTuning,
}

impl Multirotor {
    pub fn from_config(config: &VehicleConfig, tuning: PowerTuning) -> Self {
        Self {
            mass_kg: config.mass_kg,
            max_power_w: config.max_power_w,
            rotor_count: rotor_count(config),
            rotor_diameter_m: config.rotor_diameter_m,
            coaxial: config.motor_config == MotorConfiguration::Coaxial,
            drag_coefficient: config.drag_coefficient,
            hover_power_w: config.hover_power_w.filter(|p| *p > 0.0),
            efficiency: EfficiencyChain::from_config(config),
            tuning,
        }
    }

    /// Same airframe evaluated with another induced-power mode.
    pub fn with_induced_model(&self, model: InducedModel) -> Self {
        let mut copy = self.clone();
        copy.tuning.induced_model = model;
        copy
    }

    /// Disk area of one rotor (m²).
    pub fn disk_area_m2(&self) -> f64 {
        PI * self.rotor_diameter_m * self.rotor_diameter_m / 4.0
    }

    fn thrust_per_rotor_n(&self) -> f64 {
        self.mass_kg * GRAVITY_M_S2 / f64::from(self.rotor_count.max(1))
    }

    /// Hover induced velocity `sqrt(T / (2ρA))` (m/s).
    pub fn hover_induced_velocity(&self, air_density: f64) -> f64 {
        (self.thrust_per_rotor_n() / (2.0 * air_density * self.disk_area_m2())).sqrt()
    }

    /// Momentum-theory electrical hover power.
    ///
    /// Ideal power `T·sqrt(T/(2ρA))` per rotor, degraded by the figure of merit, the coaxial
    /// penalty and the motor/ESC losses. The figure of merit stands in for propeller losses.
    pub fn estimated_hover_power(&self, air_density: f64) -> f64 {
        let thrust = self.thrust_per_rotor_n();
        let ideal = f64::from(self.rotor_count.max(1)) * thrust * self.hover_induced_velocity(air_density);
        let mut shaft = ideal / self.tuning.figure_of_merit;
        if self.coaxial {
            shaft /= self.tuning.coaxial_efficiency;
        }
        shaft / (self.efficiency.motor * self.efficiency.transmission)
    }

    /// Electrical hover power: measured if configured, estimated otherwise.
    pub fn hover_power(&self, air_density: f64) -> f64 {
        self.hover_power_w
            .unwrap_or_else(|| self.estimated_hover_power(air_density))
    }

    /// Extra blade profile power in forward flight, electrical.
    pub fn profile_power_growth(&self, airspeed_ms: f64, air_density: f64) -> f64 {
        let per_rotor_hover = ROTOR_SOLIDITY
            * BLADE_PROFILE_CD0
            * air_density
            * self.disk_area_m2()
            * ROTOR_TIP_SPEED_MS.powi(3)
            / 8.0;
        let hover_profile = per_rotor_hover * f64::from(self.rotor_count.max(1));
        let advance = airspeed_ms / ROTOR_TIP_SPEED_MS;
        hover_profile * PROFILE_GROWTH_K * advance * advance / self.efficiency.total()
    }

    /// Airframe parasitic drag power `½ρ·Cd·A·V³`, electrical.
    pub fn parasitic_power(&self, airspeed_ms: f64, air_density: f64) -> f64 {
        0.5 * air_density * self.drag_coefficient * self.disk_area_m2() * airspeed_ms.powi(3)
            / self.efficiency.total()
    }

    /// Hover power scaled by the sweet-spot curve, plus forward-flight losses.
    pub fn calibrated_power(&self, airspeed_ms: f64, air_density: f64) -> f64 {
        let factor = efficiency_factor_with(airspeed_ms, self.mass_kg, &self.tuning.sweet_spot);
        self.hover_power(air_density) * factor + self.forward_losses(airspeed_ms, air_density)
    }

    /// Hover power scaled by the Glauert ratio, blended from the calibrated curve at low speed.
    pub fn glauert_power(&self, airspeed_ms: f64, air_density: f64) -> f64 {
        let mu = airspeed_ms / self.hover_induced_velocity(air_density);
        let ratio = (1.0 + mu * mu).sqrt() - mu;
        let glauert = self.hover_power(air_density) * ratio + self.forward_losses(airspeed_ms, air_density);
        if airspeed_ms <= GLAUERT_BLEND_START_MS {
            return self.calibrated_power(airspeed_ms, air_density);
        }
        if airspeed_ms >= GLAUERT_BLEND_END_MS {
            return glauert;
        }
        let t = (airspeed_ms - GLAUERT_BLEND_START_MS) / (GLAUERT_BLEND_END_MS - GLAUERT_BLEND_START_MS);
        (1.0 - t) * self.calibrated_power(airspeed_ms, air_density) + t * glauert
    }

    /// Level-flight power under the configured induced-power mode.
    pub fn forward_power(&self, airspeed_ms: f64, air_density: f64) -> f64 {
        match self.tuning.induced_model {
            InducedModel::Calibrated => self.calibrated_power(airspeed_ms, air_density),
            InducedModel::Glauert => self.glauert_power(airspeed_ms, air_density),
        }
    }

    fn forward_losses(&self, airspeed_ms: f64, air_density: f64) -> f64 {
        self.profile_power_growth(airspeed_ms, air_density) + self.parasitic_power(airspeed_ms, air_density)
    }
}

impl PowerModel for Multirotor {
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
        Ok(LevelPower {
            power_w: self.forward_power(airspeed_ms, air_density),
            phase,
        })
    }

    fn loiter_power(&self, air_density: f64) -> Result<LevelPower, PowerError> {
        Ok(LevelPower {
            power_w: self.hover_power(air_density),
            phase: FlightPhase::Hover,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::hexa;
    use flight_core::constants::SEA_LEVEL_AIR_DENSITY;

    const RHO: f64 = SEA_LEVEL_AIR_DENSITY;

    #[test]
    fn momentum_estimate_is_plausible_for_heavy_hexa() {
        let mut config = hexa();
        config.hover_power_w = None;
        let rotor = Multirotor::from_config(&config, PowerTuning::default());
        let vh = rotor.hover_induced_velocity(RHO);
        assert!((vh - 6.63).abs() < 0.05, "vh = {vh}");
        let hover = rotor.hover_power(RHO);
        assert!((1_000.0..1_300.0).contains(&hover), "hover = {hover}");
    }

    #[test]
    fn coaxial_layout_costs_more_to_hover() {
        let mut config = hexa();
        config.hover_power_w = None;
        let single = Multirotor::from_config(&config, PowerTuning::default());
        config.motor_config = MotorConfiguration::Coaxial;
        config.rotor_count = Some(6);
        let coaxial = Multirotor::from_config(&config, PowerTuning::default());
        let ratio = coaxial.hover_power(RHO) / single.hover_power(RHO);
        assert!((ratio - 1.0 / 0.87).abs() < 1e-9);
    }

    #[test]
    fn configured_hover_power_wins_over_estimate() {
        let rotor = Multirotor::from_config(&hexa(), PowerTuning::default());
        assert_eq!(rotor.hover_power(RHO), 2160.0);
        assert_eq!(rotor.calibrated_power(0.0, RHO), 2160.0);
    }

    #[test]
    fn glauert_mode_blends_from_calibrated_curve() {
        let rotor = Multirotor::from_config(&hexa(), PowerTuning::default()).with_induced_model(InducedModel::Glauert);
        assert_eq!(rotor.forward_power(1.0, RHO), rotor.calibrated_power(1.0, RHO));

        let mid = rotor.glauert_power(2.0, RHO);
        let lo = rotor.calibrated_power(2.0, RHO);
        let mu = 2.0 / rotor.hover_induced_velocity(RHO);
        let pure = 2160.0 * ((1.0 + mu * mu).sqrt() - mu) + rotor.forward_losses(2.0, RHO);
        assert!((mid - 0.5 * (lo + pure)).abs() < 1e-9);

        // induced power keeps falling with speed
        assert!(rotor.glauert_power(8.0, RHO) < rotor.glauert_power(4.0, RHO));
    }

    #[test]
    fn forward_losses_grow_with_speed() {
        let rotor = Multirotor::from_config(&hexa(), PowerTuning::default());
        let slow = rotor.profile_power_growth(4.0, RHO) + rotor.parasitic_power(4.0, RHO);
        let fast = rotor.profile_power_growth(16.0, RHO) + rotor.parasitic_power(16.0, RHO);
        assert!(slow > 0.0 && fast > 10.0 * slow);
    }
}
