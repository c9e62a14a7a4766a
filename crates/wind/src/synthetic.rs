//! Deterministic climatological wind used when no forecast is available.

use std::f64::consts::PI;

use chrono::{DateTime, Datelike, Timelike, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{Position, WindError, WindSample, WindSource, WindSourceKind};

const MAX_BASE_SPEED_MS: f64 = 15.0;
const DIRECTION_JITTER_DEG: i32 = 45;

/// Wind from altitude, latitude, time of day and season.
///
/// Direction jitter comes from a PRNG seeded on position and hour, so the same query always
/// yields the same sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticWind;

impl SyntheticWind {
    pub fn sample_at(&self, position: &Position, time: DateTime<Utc>) -> WindSample {
        let hour = f64::from(time.hour());
        let day_of_year = f64::from(time.ordinal());
        let season_phase = (day_of_year - 80.0) * 2.0 * PI / 365.0;

        let base = (3.0 + position.altitude.max(0.0) / 100.0 * 2.0).min(MAX_BASE_SPEED_MS);
        let regional = base * (0.7 + position.latitude.abs() / 90.0 * 0.6);
        let daily = 0.8 + 0.4 * ((hour - 6.0) * PI / 12.0).sin();
        let seasonal = 1.0 + 0.3 * season_phase.cos();
        let speed_ms = (regional * daily * seasonal).max(0.0);

        let prevailing = if position.latitude > 30.0 {
            270.0
        } else if position.latitude < -30.0 {
            90.0
        } else if position.longitude > 0.0 {
            60.0
        } else {
            120.0
        };
        let seasonal_shift = 30.0 * season_phase.sin();

        let mut rng = ChaCha8Rng::seed_from_u64(seed(position, time));
        let jitter = rng.gen_range(-DIRECTION_JITTER_DEG..=DIRECTION_JITTER_DEG);
        let direction_deg = (prevailing + seasonal_shift + f64::from(jitter)).rem_euclid(360.0);

        // daytime thermals
        let thermal = if (6.0..=18.0).contains(&hour) {
            ((hour - 6.0) * PI / 12.0).sin().max(0.0)
        } else {
            0.0
        };
        let vertical_ms = thermal * rng.gen_range(-0.5..1.5);

        WindSample {
            latitude: position.latitude,
            longitude: position.longitude,
            altitude: position.altitude,
            speed_ms,
            direction_deg,
            vertical_ms: Some(vertical_ms),
            timestamp: Some(time),
            source: WindSourceKind::Synthetic,
        }
    }
}

fn seed(position: &Position, time: DateTime<Utc>) -> u64 {
    let spatial = (position.latitude * 1000.0 + position.longitude * 1000.0).round() as i64;
    let hours = time.timestamp().div_euclid(3600);
    spatial.wrapping_add(hours) as u64
}

impl WindSource for SyntheticWind {
    fn kind(&self) -> WindSourceKind {
        WindSourceKind::Synthetic
    }

    fn sample(&self, position: &Position, time: DateTime<Utc>) -> Result<WindSample, WindError> {
        Ok(self.sample_at(position, time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon_equinox() -> DateTime<Utc> {
        // day 80 of 2025 is March 21st
        Utc.with_ymd_and_hms(2025, 3, 21, 12, 0, 0).single().expect("valid time")
    }

    #[test]
    fn same_query_gives_same_sample() {
        let pos = Position::new(49.48, 8.47, 120.0);
        let a = SyntheticWind.sample_at(&pos, noon_equinox());
        let b = SyntheticWind.sample_at(&pos, noon_equinox());
        assert_eq!(a, b);
    }

    #[test]
    fn speed_follows_documented_factors() {
        let pos = Position::new(45.0, 10.0, 100.0);
        let sample = SyntheticWind.sample_at(&pos, noon_equinox());
        // base 5 m/s, regional 1.0, daily 1.2, seasonal 1.3
        assert!((sample.speed_ms - 5.0 * 1.0 * 1.2 * 1.3).abs() < 1e-9, "speed = {}", sample.speed_ms);
        assert_eq!(sample.source, WindSourceKind::Synthetic);
    }

    #[test]
    fn direction_stays_near_prevailing_wind() {
        let time = noon_equinox();
        let north = SyntheticWind.sample_at(&Position::new(50.0, 8.0, 50.0), time);
        let offset = (north.direction_deg - 270.0 + 180.0).rem_euclid(360.0) - 180.0;
        assert!(offset.abs() <= 45.0 + 1e-9, "direction = {}", north.direction_deg);

        let tropics = SyntheticWind.sample_at(&Position::new(5.0, -40.0, 50.0), time);
        let offset = (tropics.direction_deg - 120.0 + 180.0).rem_euclid(360.0) - 180.0;
        assert!(offset.abs() <= 45.0 + 1e-9);
    }

    #[test]
    fn base_speed_saturates_at_altitude() {
        let low = SyntheticWind.sample_at(&Position::new(0.0, 10.0, 600.0), noon_equinox());
        let high = SyntheticWind.sample_at(&Position::new(0.0, 10.0, 3_000.0), noon_equinox());
        assert_eq!(low.speed_ms, high.speed_ms);
    }

    #[test]
    fn night_has_no_thermals() {
        let night = Utc.with_ymd_and_hms(2025, 7, 1, 2, 0, 0).single().expect("valid time");
        let sample = SyntheticWind.sample_at(&Position::new(49.0, 8.0, 100.0), night);
        assert_eq!(sample.vertical_ms, Some(0.0));
    }
}
