//! Sweet-spot efficiency correction for multirotors.
//!
//! Logged flights show total power dipping well below hover power in a band of low
//! airspeeds as translational lift kicks in. The correction is a multiplier on hover power
//! that reproduces that dip and rises again once parasitic losses take over.

use crate::tuning::SweetSpotTuning;

/// Lowest multiplier ever returned, whatever the tuning overrides say.
const MIN_FACTOR: f64 = 0.05;

/// Airspeed band of best efficiency for a given vehicle mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweetSpotBand {
    pub low_ms: f64,
    pub high_ms: f64,
}

impl SweetSpotBand {
    pub fn for_mass(mass_kg: f64, tuning: &SweetSpotTuning) -> Self {
        let low = tuning.band_low_min_ms.max(tuning.band_low_per_kg * mass_kg);
        let high = tuning.band_high_min_ms.max(tuning.band_high_per_kg * mass_kg);
        Self {
            low_ms: low,
            high_ms: high.max(low),
        }
    }

    pub fn centre_ms(&self) -> f64 {
        0.5 * (self.low_ms + self.high_ms)
    }
}

/// Multiplier on hover power at `airspeed_ms` with the default tuning.
pub fn efficiency_factor(airspeed_ms: f64, mass_kg: f64) -> f64 {
    efficiency_factor_with(airspeed_ms, mass_kg, &SweetSpotTuning::default())
}

/// Multiplier on hover power at `airspeed_ms`, in `(0, 1]`.
///
/// Must be fed true airspeed; ground speed hides the wind's effect on the rotors.
pub fn efficiency_factor_with(airspeed_ms: f64, mass_kg: f64, tuning: &SweetSpotTuning) -> f64 {
    if !airspeed_ms.is_finite() || airspeed_ms <= 0.0 {
        return 1.0;
    }
    let band = SweetSpotBand::for_mass(mass_kg, tuning);
    let plateau = tuning.plateau_factor;

    let factor = if airspeed_ms <= band.low_ms {
        1.0 - (1.0 - plateau) * airspeed_ms / band.low_ms
    } else if airspeed_ms <= band.high_ms {
        let half_width = 0.5 * (band.high_ms - band.low_ms);
        let n = if half_width > 0.0 {
            (airspeed_ms - band.centre_ms()) / half_width
        } else {
            0.0
        };
        plateau - tuning.max_efficiency_gain * tuning.efficiency_multiplier * (1.0 - n * n)
    } else {
        let penalty = ((airspeed_ms - band.high_ms) * tuning.high_speed_penalty_rate)
            .min(tuning.high_speed_penalty_cap);
        plateau + penalty
    };
    factor.clamp(MIN_FACTOR, 1.0)
}
