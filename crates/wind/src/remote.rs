//! HTTP forecast client.

use std::time::Duration;

use chrono::{DateTime, Utc};
use flight_config::WindServiceConfig;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::{Position, WindError, WindSample, WindSource, WindSourceKind};

const DEFAULT_SPEED_MS: f64 = 5.0;
const DEFAULT_DIRECTION_DEG: f64 = 180.0;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Body returned by `GET {base_url}/forecast`.
#[derive(Debug, Default, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub wind: ForecastWind,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastWind {
    #[serde(default = "default_speed")]
    pub speed: f64,
    #[serde(default = "default_direction")]
    pub direction: f64,
}

impl Default for ForecastWind {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED_MS,
            direction: DEFAULT_DIRECTION_DEG,
        }
    }
}

fn default_speed() -> f64 {
    DEFAULT_SPEED_MS
}

fn default_direction() -> f64 {
    DEFAULT_DIRECTION_DEG
}

impl ForecastResponse {
    /// Turn a forecast body into a sample at `position`.
    pub fn into_sample(self, position: &Position, requested: DateTime<Utc>) -> Result<WindSample, WindError> {
        let ForecastWind { speed, direction } = self.wind;
        if !(speed.is_finite() && speed >= 0.0 && direction.is_finite()) {
            return Err(WindError::InvalidResponse(format!(
                "wind speed {speed} / direction {direction}"
            )));
        }
        let timestamp = self
            .timestamp
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or(requested);
        Ok(WindSample {
            latitude: position.latitude,
            longitude: position.longitude,
            altitude: position.altitude,
            speed_ms: speed,
            direction_deg: direction.rem_euclid(360.0),
            vertical_ms: None,
            timestamp: Some(timestamp),
            source: WindSourceKind::Remote,
        })
    }
}

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-request timeout; non-positive or unrepresentable values use the default.
fn request_timeout(seconds: f64) -> Duration {
    if seconds > 0.0 {
        Duration::try_from_secs_f64(seconds).unwrap_or(DEFAULT_TIMEOUT)
    } else {
        DEFAULT_TIMEOUT
    }
}

/// Blocking client for the forecast endpoint.
#[derive(Debug, Clone)]
pub struct RemoteWindSource {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RemoteWindSource {
    pub fn new(config: &WindServiceConfig) -> Result<Self, WindError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(WindError::MissingApiKey)?;
        let client = Client::builder()
            .timeout(request_timeout(config.timeout_s))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn fetch(&self, position: &Position, time: DateTime<Utc>) -> Result<ForecastResponse, WindError> {
        let url = format!("{}/forecast", self.base_url);
        let query = [
            ("key", self.api_key.clone()),
            ("lat", position.latitude.to_string()),
            ("lon", position.longitude.to_string()),
            ("format", "json".to_string()),
            ("time", time.format(TIME_FORMAT).to_string()),
        ];
        let response = self
            .client
            .get(url)
            .query(&query)
            .send()?
            .error_for_status()?;
        Ok(response.json()?)
    }
}

impl WindSource for RemoteWindSource {
    fn kind(&self) -> WindSourceKind {
        WindSourceKind::Remote
    }

    fn sample(&self, position: &Position, time: DateTime<Utc>) -> Result<WindSample, WindError> {
        self.fetch(position, time)?.into_sample(position, time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).single().expect("valid time")
    }

    #[test]
    fn full_response_is_used_verbatim() {
        let body = r#"{"wind":{"speed":7.5,"direction":-90},"timestamp":"2025-06-01T09:00:00Z"}"#;
        let response: ForecastResponse = serde_json::from_str(body).expect("json");
        let sample = response
            .into_sample(&Position::new(49.0, 8.0, 100.0), at())
            .expect("sample");
        assert_eq!(sample.speed_ms, 7.5);
        assert_eq!(sample.direction_deg, 270.0);
        assert_eq!(sample.source, WindSourceKind::Remote);
        assert_eq!(
            sample.timestamp,
            Some(Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).single().expect("valid time"))
        );
    }

    #[test]
    fn missing_fields_take_defaults() {
        let response: ForecastResponse = serde_json::from_str("{}").expect("json");
        let sample = response
            .into_sample(&Position::new(49.0, 8.0, 100.0), at())
            .expect("sample");
        assert_eq!((sample.speed_ms, sample.direction_deg), (5.0, 180.0));
        assert_eq!(sample.timestamp, Some(at()));

        let partial: ForecastResponse = serde_json::from_str(r#"{"wind":{"speed":2.0}}"#).expect("json");
        assert_eq!(partial.wind.direction, 180.0);
    }

    #[test]
    fn negative_speed_is_rejected() {
        let body = r#"{"wind":{"speed":-1.0,"direction":10}}"#;
        let response: ForecastResponse = serde_json::from_str(body).expect("json");
        let err = response
            .into_sample(&Position::new(0.0, 0.0, 0.0), at())
            .unwrap_err();
        assert!(matches!(err, WindError::InvalidResponse(_)));
    }

    #[test]
    fn client_requires_api_key() {
        let config = WindServiceConfig {
            api_key: Some("  ".to_string()),
            ..WindServiceConfig::default()
        };
        assert!(matches!(RemoteWindSource::new(&config), Err(WindError::MissingApiKey)));
    }

    #[test]
    fn out_of_range_timeouts_use_the_default() {
        assert_eq!(request_timeout(2.5), Duration::from_millis(2_500));
        assert_eq!(request_timeout(1e30), DEFAULT_TIMEOUT);
        assert_eq!(request_timeout(f64::INFINITY), DEFAULT_TIMEOUT);
        assert_eq!(request_timeout(f64::NAN), DEFAULT_TIMEOUT);
        assert_eq!(request_timeout(-3.0), DEFAULT_TIMEOUT);
    }

    #[test]
    fn huge_timeout_still_builds_a_client() {
        let config = WindServiceConfig {
            api_key: Some("key".to_string()),
            timeout_s: 1e30,
            ..WindServiceConfig::default()
        };
        assert!(RemoteWindSource::new(&config).is_ok());
    }
}
