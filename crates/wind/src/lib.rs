//! Wind resolution and projection onto the flight direction.

mod remote;
mod synthetic;

use chrono::{DateTime, Utc};
use flight_config::{WindServiceConfig, WindSettings};
use flight_core::vector::{self, Vector2};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub use remote::{ForecastResponse, ForecastWind, RemoteWindSource};
pub use synthetic::SyntheticWind;

/// Where a wind sample came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindSourceKind {
    Calm,
    Manual,
    Remote,
    Synthetic,
}

/// Geographic query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }
}

/// Wind at one place and time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindSample {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub speed_ms: f64,
    /// Meteorological convention: the direction the wind blows FROM.
    pub direction_deg: f64,
    #[serde(default)]
    pub vertical_ms: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    pub source: WindSourceKind,
}

impl WindSample {
    pub fn calm(position: &Position) -> Self {
        Self {
            latitude: position.latitude,
            longitude: position.longitude,
            altitude: position.altitude,
            speed_ms: 0.0,
            direction_deg: 0.0,
            vertical_ms: None,
            timestamp: None,
            source: WindSourceKind::Calm,
        }
    }

    /// East/north air-mass velocity (m/s), pointing where the wind blows TO.
    pub fn velocity_enu(&self) -> Vector2 {
        vector::scale(&vector::from_bearing_deg(self.direction_deg + 180.0), self.speed_ms)
    }
}

#[derive(Debug, Error)]
pub enum WindError {
    #[error("wind service request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("wind service API key is not configured")]
    MissingApiKey,
    #[error("wind service returned an unusable forecast: {0}")]
    InvalidResponse(String),
}

/// A provider of wind samples.
pub trait WindSource: Send + Sync {
    fn kind(&self) -> WindSourceKind;

    fn sample(&self, position: &Position, time: DateTime<Utc>) -> Result<WindSample, WindError>;
}

/// The same wind everywhere; used for field-test validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManualWind {
    pub speed_ms: f64,
    pub direction_deg: f64,
}

impl WindSource for ManualWind {
    fn kind(&self) -> WindSourceKind {
        WindSourceKind::Manual
    }

    fn sample(&self, position: &Position, time: DateTime<Utc>) -> Result<WindSample, WindError> {
        Ok(WindSample {
            latitude: position.latitude,
            longitude: position.longitude,
            altitude: position.altitude,
            speed_ms: self.speed_ms.max(0.0),
            direction_deg: self.direction_deg.rem_euclid(360.0),
            vertical_ms: Some(0.0),
            timestamp: Some(time),
            source: WindSourceKind::Manual,
        })
    }
}

/// Wind split along and across the flight direction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct WindComponents {
    /// Positive opposes motion.
    pub headwind_ms: f64,
    /// Always non-negative.
    pub crosswind_ms: f64,
}

/// Project `sample` onto a unit flight direction.
///
/// Vertical and zero-length legs have no direction; all of the wind is then crosswind.
pub fn project(sample: &WindSample, flight_dir: Option<Vector2>) -> WindComponents {
    let Some(dir) = flight_dir else {
        return WindComponents {
            headwind_ms: 0.0,
            crosswind_ms: sample.speed_ms.abs(),
        };
    };
    let wind = sample.velocity_enu();
    let along = vector::dot(&wind, &dir);
    let across = vector::sub(&wind, &vector::scale(&dir, along));
    WindComponents {
        headwind_ms: -along,
        crosswind_ms: vector::norm(&across),
    }
}

/// True airspeed for a ground speed along the flight direction.
pub fn airspeed(ground_speed_ms: f64, components: &WindComponents) -> f64 {
    let along = ground_speed_ms + components.headwind_ms;
    (along * along + components.crosswind_ms * components.crosswind_ms).sqrt()
}

/// A resolved sample and whether the fallback model had to stand in.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedWind {
    pub sample: WindSample,
    /// Set when the configured source failed and synthetic wind was used instead.
    pub fallback_reason: Option<String>,
}

enum Mode {
    Calm,
    Source(Box<dyn WindSource>),
}

/// Chooses and queries the wind source for one simulation request.
pub struct WindResolver {
    mode: Mode,
    fallback: SyntheticWind,
    retries: u32,
}

impl std::fmt::Debug for WindResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindResolver")
            .field("kind", &self.kind())
            .field("retries", &self.retries)
            .finish()
    }
}

impl WindResolver {
    /// Pick the source from the request settings and the service configuration.
    ///
    /// Without an API key the synthetic model is the primary source, not a fallback.
    pub fn from_settings(settings: &WindSettings, service: &WindServiceConfig) -> Self {
        if !settings.consideration {
            return Self::calm();
        }
        if settings.manual_enabled {
            return Self::with_source(
                Box::new(ManualWind {
                    speed_ms: settings.manual_speed_ms.unwrap_or(0.0),
                    direction_deg: settings.manual_direction_deg.unwrap_or(0.0),
                }),
                0,
            );
        }
        match RemoteWindSource::new(service) {
            Ok(remote) => Self::with_source(Box::new(remote), service.retries),
            Err(err) => {
                debug!(error = %err, "remote wind unavailable, using synthetic model");
                Self::with_source(Box::new(SyntheticWind), 0)
            }
        }
    }

    pub fn calm() -> Self {
        Self {
            mode: Mode::Calm,
            fallback: SyntheticWind,
            retries: 0,
        }
    }

    /// Use `source` with `retries` extra attempts before falling back.
    pub fn with_source(source: Box<dyn WindSource>, retries: u32) -> Self {
        Self {
            mode: Mode::Source(source),
            fallback: SyntheticWind,
            retries,
        }
    }

    pub fn kind(&self) -> WindSourceKind {
        match &self.mode {
            Mode::Calm => WindSourceKind::Calm,
            Mode::Source(source) => source.kind(),
        }
    }

    /// Wind at `position` and `time`. Never fails; source errors degrade to synthetic wind.
    pub fn resolve(&self, position: &Position, time: DateTime<Utc>) -> ResolvedWind {
        let source = match &self.mode {
            Mode::Calm => {
                return ResolvedWind {
                    sample: WindSample::calm(position),
                    fallback_reason: None,
                };
            }
            Mode::Source(source) => source,
        };

        let mut last_error = None;
        for attempt in 0..=self.retries {
            match source.sample(position, time) {
                Ok(sample) => {
                    return ResolvedWind {
                        sample,
                        fallback_reason: None,
                    };
                }
                Err(err) => {
                    debug!(attempt, error = %err, "wind lookup failed");
                    last_error = Some(err);
                }
            }
        }
        let reason = last_error
            .map(|err| err.to_string())
            .unwrap_or_else(|| "wind source failed".to_string());
        warn!(
            latitude = position.latitude,
            longitude = position.longitude,
            reason = %reason,
            "falling back to synthetic wind"
        );
        ResolvedWind {
            sample: self.fallback.sample_at(position, time),
            fallback_reason: Some(reason),
        }
    }
}
