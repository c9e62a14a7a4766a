//! Power-versus-airspeed analysis: sweet-spot search and range estimates.

use serde::Serialize;

use crate::multirotor::Multirotor;
use crate::tuning::InducedModel;
use crate::{FlightPhase, PowerError, PowerModel};

/// Share of battery energy assumed usable for range estimates.
pub const DEFAULT_USABLE_FRACTION: f64 = 0.8;
/// Reference cruise speed for range estimates (m/s).
pub const REFERENCE_SPEED_MS: f64 = 12.0;

/// One point of a power curve; `power_w` is `None` where the vehicle cannot fly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurveSample {
    pub airspeed_ms: f64,
    pub power_w: Option<f64>,
}

/// Calibrated and Glauert curves of the same multirotor side by side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InducedModelComparison {
    pub hover_power_w: f64,
    pub calibrated: Vec<CurveSample>,
    pub glauert: Vec<CurveSample>,
    pub calibrated_sweet_spot: Option<CurveSample>,
    pub glauert_sweet_spot: Option<CurveSample>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeEstimate {
    pub airspeed_ms: f64,
    pub power_w: f64,
    pub usable_energy_wh: f64,
    pub endurance_min: f64,
    pub range_km: f64,
}

/// Evenly spaced airspeeds from 0 to `max_speed_ms` inclusive.
pub fn speed_grid(max_speed_ms: f64, step_ms: f64) -> Vec<f64> {
    if !(max_speed_ms.is_finite() && step_ms.is_finite() && step_ms > 0.0 && max_speed_ms >= 0.0) {
        return Vec::new();
    }
    let steps = (max_speed_ms / step_ms).floor() as usize;
    (0..=steps).map(|i| i as f64 * step_ms).collect()
}

/// Level-flight power (clamped to the rating) at each airspeed.
pub fn sample_curve<M: PowerModel + ?Sized>(model: &M, speeds: &[f64], air_density: f64) -> Vec<CurveSample> {
    speeds
        .iter()
        .map(|&airspeed_ms| {
            let power_w = model
                .level_power(airspeed_ms, air_density, FlightPhase::Cruise)
                .ok()
                .map(|level| level.power_w.min(model.max_power_w()));
            CurveSample { airspeed_ms, power_w }
        })
        .collect()
}

/// Lowest-power flyable sample, ignoring hover.
pub fn sweet_spot(samples: &[CurveSample]) -> Option<CurveSample> {
    samples
        .iter()
        .filter(|s| s.airspeed_ms > 0.0)
        .filter_map(|s| s.power_w.map(|p| (s, p)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(s, _)| *s)
}

/// Sample a multirotor under both induced-power modes.
pub fn compare_induced_models(rotor: &Multirotor, speeds: &[f64], air_density: f64) -> InducedModelComparison {
    let calibrated = sample_curve(&rotor.with_induced_model(InducedModel::Calibrated), speeds, air_density);
    let glauert = sample_curve(&rotor.with_induced_model(InducedModel::Glauert), speeds, air_density);
    InducedModelComparison {
        hover_power_w: rotor.hover_power(air_density),
        calibrated_sweet_spot: sweet_spot(&calibrated),
        glauert_sweet_spot: sweet_spot(&glauert),
        calibrated,
        glauert,
    }
}

/// Still-air range at a constant airspeed using a fraction of the battery.
pub fn estimate_range<M: PowerModel + ?Sized>(
    model: &M,
    capacity_wh: f64,
    airspeed_ms: f64,
    usable_fraction: f64,
    air_density: f64,
) -> Result<RangeEstimate, PowerError> {
    let level = model.level_power(airspeed_ms, air_density, FlightPhase::Cruise)?;
    let power_w = level.power_w.min(model.max_power_w());
    let usable_energy_wh = capacity_wh * usable_fraction;
    let endurance_h = if power_w > 0.0 { usable_energy_wh / power_w } else { 0.0 };
    Ok(RangeEstimate {
        airspeed_ms,
        power_w,
        usable_energy_wh,
        endurance_min: endurance_h * 60.0,
        range_km: endurance_h * airspeed_ms * 3.6,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{hexa, trainer};
    use crate::{PowerTuning, VehicleModel};
    use flight_core::constants::SEA_LEVEL_AIR_DENSITY;

    const RHO: f64 = SEA_LEVEL_AIR_DENSITY;

    #[test]
    fn grid_includes_both_ends() {
        let grid = speed_grid(2.0, 0.5);
        assert_eq!(grid, [0.0, 0.5, 1.0, 1.5, 2.0]);
        assert!(speed_grid(5.0, 0.0).is_empty());
    }

    #[test]
    fn calibrated_sweet_spot_sits_in_the_band() {
        let rotor = Multirotor::from_config(&hexa(), PowerTuning::default());
        let comparison = compare_induced_models(&rotor, &speed_grid(20.0, 0.25), RHO);
        let best = comparison.calibrated_sweet_spot.expect("sweet spot");
        assert!((3.0..=5.0).contains(&best.airspeed_ms), "best = {best:?}");
        assert!(best.power_w.expect("power") < comparison.hover_power_w);
        let glauert = comparison.glauert_sweet_spot.expect("glauert");
        assert!(glauert.airspeed_ms > best.airspeed_ms);
    }

    #[test]
    fn stall_region_is_marked_unflyable() {
        let model = VehicleModel::from_config(&trainer(), PowerTuning::default()).expect("model");
        let samples = sample_curve(&model, &[6.0, 12.0, 20.0], RHO);
        assert!(samples[0].power_w.is_none());
        assert!(samples[1].power_w.is_some());
        assert_eq!(sweet_spot(&samples).map(|s| s.airspeed_ms), Some(12.0));
    }

    #[test]
    fn range_uses_usable_fraction() {
        let model = VehicleModel::from_config(&hexa(), PowerTuning::default()).expect("model");
        let capacity = 22.0 * 44.4;
        let estimate =
            estimate_range(&model, capacity, REFERENCE_SPEED_MS, DEFAULT_USABLE_FRACTION, RHO).expect("range");
        assert!((estimate.usable_energy_wh - 0.8 * capacity).abs() < 1e-9);
        let expected_km = estimate.usable_energy_wh / estimate.power_w * 12.0 * 3.6;
        assert!((estimate.range_km - expected_km).abs() < 1e-9);
    }
}
