//! Re-exported APIs for consumers of the simulation crate.

pub use crate::result::{
    FlightSegment, Infeasibility, SimulationMetadata, SimulationResult, SimulationSummary, Warning,
    WindInfluence,
};
pub use crate::run::{
    Simulation, SimulationError, SimulationOptions, SimulationRequest, SimulationState, simulate,
};
pub use flight_power::{PowerModel, PowerTuning, VehicleModel};

pub mod vehicle {
    use flight_battery::{BatteryError, BatteryPack};
    use flight_config::{VehicleConfig, VehicleKind};
    use flight_kinematics::MotionLimits;
    use flight_power::{PowerError, PowerTuning, VehicleModel};
    use thiserror::Error;

    /// Validated vehicle with its runtime models.
    #[derive(Debug, Clone)]
    pub struct Vehicle {
        pub name: String,
        pub kind: VehicleKind,
        pub model: VehicleModel,
        pub limits: MotionLimits,
        pub battery: BatteryPack,
    }

    /// Errors surfaced when selecting, validating or converting vehicles.
    #[derive(Debug, Error)]
    pub enum VehicleError {
        #[error("vehicle '{0}' not found in catalog")]
        NotFound(String),
        #[error("vehicle catalog is empty")]
        EmptyCatalog,
        #[error("vehicle '{vehicle}': `{field}` {reason}")]
        InvalidField {
            vehicle: String,
            field: &'static str,
            reason: String,
        },
        #[error("vehicle power model: {0}")]
        Power(#[from] PowerError),
        #[error("vehicle battery: {0}")]
        Battery(#[from] BatteryError),
    }

    fn invalid(config: &VehicleConfig, field: &'static str, reason: impl Into<String>) -> VehicleError {
        VehicleError::InvalidField {
            vehicle: config.name.clone(),
            field,
            reason: reason.into(),
        }
    }

    /// Check the physical invariants of a configuration.
    pub fn validate(config: &VehicleConfig) -> Result<(), VehicleError> {
        let positive = [
            ("mass_kg", config.mass_kg),
            ("max_power_w", config.max_power_w),
            ("cruise_speed_ms", config.cruise_speed_ms),
            ("max_speed_ms", config.max_speed_ms),
            ("max_climb_rate_ms", config.max_climb_rate_ms),
            ("max_descent_speed_ms", config.max_descent_speed_ms),
            ("horizontal_acceleration_ms2", config.horizontal_acceleration_ms2),
            ("vertical_acceleration_ms2", config.vertical_acceleration_ms2),
            ("battery_capacity_mah", config.battery_capacity_mah),
            ("battery_voltage_v", config.battery_voltage_v),
            ("rotor_diameter_m", config.rotor_diameter_m),
            ("wing_area_m2", config.wing_area_m2),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(config, field, format!("must be finite and positive (got {value})")));
            }
        }

        let efficiencies = [
            ("motor_efficiency", config.motor_efficiency),
            ("propeller_efficiency", config.propeller_efficiency),
            ("transmission_efficiency", config.transmission_efficiency),
        ];
        for (field, value) in efficiencies {
            if !(value > 0.0 && value <= 1.0) {
                return Err(invalid(config, field, format!("must lie in (0, 1] (got {value})")));
            }
        }

        if !(config.drag_coefficient.is_finite() && config.drag_coefficient >= 0.0) {
            return Err(invalid(
                config,
                "drag_coefficient",
                format!("must be finite and non-negative (got {})", config.drag_coefficient),
            ));
        }

        let optional_powers = [
            ("hover_power_w", config.hover_power_w),
            ("cruise_power_w", config.cruise_power_w),
            ("forward_thrust_power_w", config.forward_thrust_power_w),
            ("aspect_ratio", config.aspect_ratio),
        ];
        for (field, value) in optional_powers {
            if let Some(v) = value.filter(|v| !(v.is_finite() && *v > 0.0)) {
                return Err(invalid(config, field, format!("must be finite and positive when set (got {v})")));
            }
        }

        if let Some(stall) = config.stall_speed_ms {
            if !(stall.is_finite() && stall > 0.0) {
                return Err(invalid(config, "stall_speed_ms", format!("must be finite and positive (got {stall})")));
            }
            if stall > config.max_speed_ms {
                return Err(invalid(
                    config,
                    "stall_speed_ms",
                    format!("exceeds max_speed_ms ({stall} > {})", config.max_speed_ms),
                ));
            }
        } else if config.kind == VehicleKind::Fixedwing {
            return Err(invalid(config, "stall_speed_ms", "is required for fixed-wing vehicles"));
        }

        Ok(())
    }

    /// Motion envelope of a configuration.
    pub fn motion_limits(config: &VehicleConfig) -> MotionLimits {
        MotionLimits {
            cruise_speed_ms: config.cruise_speed_ms,
            max_speed_ms: config.max_speed_ms,
            max_climb_rate_ms: config.max_climb_rate_ms,
            max_descent_speed_ms: config.max_descent_speed_ms,
            horizontal_acceleration_ms2: config.horizontal_acceleration_ms2,
            vertical_acceleration_ms2: config.vertical_acceleration_ms2,
        }
    }

    /// Validate a `VehicleConfig` and build its runtime `Vehicle`.
    pub fn from_config(config: &VehicleConfig, tuning: PowerTuning) -> Result<Vehicle, VehicleError> {
        validate(config)?;
        Ok(Vehicle {
            name: config.name.clone(),
            kind: config.kind,
            model: VehicleModel::from_config(config, tuning)?,
            limits: motion_limits(config),
            battery: BatteryPack::new(config.battery_capacity_mah, config.battery_voltage_v)?,
        })
    }

    /// Pick a configuration from the catalog by name (case-insensitive), defaulting to the first.
    pub fn select<'a>(
        configs: &'a [VehicleConfig],
        requested: Option<&str>,
    ) -> Result<&'a VehicleConfig, VehicleError> {
        let first = configs.first().ok_or(VehicleError::EmptyCatalog)?;
        match requested {
            Some(name) => {
                let upper = name.to_uppercase();
                configs
                    .iter()
                    .find(|cfg| cfg.name.to_uppercase() == upper)
                    .ok_or_else(|| VehicleError::NotFound(name.to_string()))
            }
            None => Ok(first),
        }
    }

}
