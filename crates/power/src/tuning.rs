//! Empirically tuned constants of the power models.

use flight_config::{InducedModelConfig, TuningConfig};
use serde::{Deserialize, Serialize};

/// Momentum-theory figure of merit for small rotors.
pub const DEFAULT_FIGURE_OF_MERIT: f64 = 0.7;
/// Thrust efficiency of a stacked coaxial pair relative to two isolated rotors.
pub const DEFAULT_COAXIAL_EFFICIENCY: f64 = 0.87;
/// Share of potential energy recovered while descending.
pub const DEFAULT_DESCENT_RECOVERY: f64 = 0.25;
/// Descent power never drops below this fraction of level-flight power.
pub const DEFAULT_DESCENT_FLOOR: f64 = 0.5;

/// Blade profile drag coefficient.
pub const BLADE_PROFILE_CD0: f64 = 0.012;
/// Rotor solidity (blade area over disk area).
pub const ROTOR_SOLIDITY: f64 = 0.1;
/// Blade tip speed (m/s).
pub const ROTOR_TIP_SPEED_MS: f64 = 200.0;
/// Profile power growth coefficient in forward flight.
pub const PROFILE_GROWTH_K: f64 = 4.65;

/// Below this airspeed the Glauert mode uses the calibrated curve only.
pub const GLAUERT_BLEND_START_MS: f64 = 1.5;
/// Above this airspeed the Glauert mode uses the Glauert curve only.
pub const GLAUERT_BLEND_END_MS: f64 = 2.5;

/// How multirotor induced power evolves with airspeed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InducedModel {
    /// Hover power scaled by the logged-flight sweet-spot curve.
    #[default]
    Calibrated,
    /// Glauert momentum ratio with a low-speed blend from the calibrated curve.
    Glauert,
}

impl From<InducedModelConfig> for InducedModel {
    fn from(value: InducedModelConfig) -> Self {
        match value {
            InducedModelConfig::Calibrated => InducedModel::Calibrated,
            InducedModelConfig::Glauert => InducedModel::Glauert,
        }
    }
}

/// Constants of the sweet-spot efficiency curve.
///
/// The defaults were fitted to a logged 10 kg hexacopter. The mass scaling of the band edges
/// is an assumption for other airframes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweetSpotTuning {
    /// Extra discount at the band centre relative to the plateau, before the multiplier.
    pub max_efficiency_gain: f64,
    /// Damping applied to `max_efficiency_gain`.
    pub efficiency_multiplier: f64,
    /// Power ratio at the band edges.
    pub plateau_factor: f64,
    /// Ratio increase per m/s above the band.
    pub high_speed_penalty_rate: f64,
    /// Largest ratio increase above the band.
    pub high_speed_penalty_cap: f64,
    pub band_low_min_ms: f64,
    pub band_low_per_kg: f64,
    pub band_high_min_ms: f64,
    pub band_high_per_kg: f64,
}

impl Default for SweetSpotTuning {
    fn default() -> Self {
        Self {
            max_efficiency_gain: 0.10,
            efficiency_multiplier: 0.45,
            plateau_factor: 0.75,
            high_speed_penalty_rate: 0.03,
            high_speed_penalty_cap: 0.4,
            band_low_min_ms: 2.0,
            band_low_per_kg: 0.3,
            band_high_min_ms: 4.0,
            band_high_per_kg: 0.5,
        }
    }
}

/// Every tunable constant consumed by the power models.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerTuning {
    pub induced_model: InducedModel,
    pub sweet_spot: SweetSpotTuning,
    pub figure_of_merit: f64,
    pub coaxial_efficiency: f64,
    pub descent_recovery_factor: f64,
    pub descent_power_floor: f64,
}

impl Default for PowerTuning {
    fn default() -> Self {
        Self {
            induced_model: InducedModel::default(),
            sweet_spot: SweetSpotTuning::default(),
            figure_of_merit: DEFAULT_FIGURE_OF_MERIT,
            coaxial_efficiency: DEFAULT_COAXIAL_EFFICIENCY,
            descent_recovery_factor: DEFAULT_DESCENT_RECOVERY,
            descent_power_floor: DEFAULT_DESCENT_FLOOR,
        }
    }
}

impl PowerTuning {
    /// Defaults with the `[tuning]` overrides applied.
    pub fn from_config(config: &TuningConfig) -> Self {
        let mut tuning = Self::default();
        if let Some(model) = config.induced_model {
            tuning.induced_model = model.into();
        }
        let sweet = &mut tuning.sweet_spot;
        override_with(&mut sweet.max_efficiency_gain, config.max_efficiency_gain);
        override_with(&mut sweet.efficiency_multiplier, config.efficiency_multiplier);
        override_with(&mut sweet.plateau_factor, config.plateau_factor);
        override_with(&mut sweet.high_speed_penalty_rate, config.high_speed_penalty_rate);
        override_with(&mut sweet.high_speed_penalty_cap, config.high_speed_penalty_cap);
        override_with(&mut tuning.figure_of_merit, config.figure_of_merit);
        override_with(&mut tuning.coaxial_efficiency, config.coaxial_efficiency);
        override_with(&mut tuning.descent_recovery_factor, config.descent_recovery_factor);
        override_with(&mut tuning.descent_power_floor, config.descent_power_floor);
        tuning
    }
}

fn override_with(slot: &mut f64, value: Option<f64>) {
    if let Some(v) = value.filter(|v| v.is_finite()) {
        *slot = v;
    }
}
