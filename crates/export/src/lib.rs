//! Export helpers for CSV and JSON artifacts.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write export: {0}")]
    Io(#[from] io::Error),
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Create a writer for the target path, handling stdout (`-`) by convention.
pub fn writer_for_path(path: &Path) -> io::Result<Box<dyn Write>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    Ok(Box::new(BufWriter::new(file)))
}

pub mod segments {
    use std::io::Write;

    use flight_simulation::{FlightSegment, SimulationResult};
    use serde::Serialize;

    use crate::ExportError;

    /// CSV row of the per-segment table.
    #[derive(Debug, Clone, Serialize)]
    pub struct Record<'a> {
        pub segment: usize,
        pub phase: &'a str,
        pub start_lat: f64,
        pub start_lon: f64,
        pub start_alt_m: f64,
        pub end_lat: f64,
        pub end_lon: f64,
        pub end_alt_m: f64,
        pub distance_m: f64,
        pub duration_s: f64,
        pub avg_ground_speed_ms: f64,
        pub cruise_ground_speed_ms: f64,
        pub cruise_airspeed_ms: f64,
        pub cruise_power_w: f64,
        pub avg_power_w: f64,
        pub energy_wh: f64,
        pub hover_energy_wh: f64,
        pub cumulative_energy_wh: f64,
        pub cumulative_battery_pct: f64,
        pub wind_speed_ms: f64,
        pub wind_direction_deg: f64,
        pub headwind_ms: f64,
        pub crosswind_ms: f64,
        pub wind_source: &'a str,
        pub warnings: usize,
    }

    impl<'a> Record<'a> {
        pub fn from_segment(segment: &'a FlightSegment, phase: &'a str, wind_source: &'a str) -> Self {
            Self {
                segment: segment.index,
                phase,
                start_lat: segment.start.latitude,
                start_lon: segment.start.longitude,
                start_alt_m: segment.start.altitude,
                end_lat: segment.end.latitude,
                end_lon: segment.end.longitude,
                end_alt_m: segment.end.altitude,
                distance_m: segment.distance_m,
                duration_s: segment.duration_s,
                avg_ground_speed_ms: segment.average_speed_ms,
                cruise_ground_speed_ms: segment.cruise_ground_speed_ms,
                cruise_airspeed_ms: segment.cruise_airspeed_ms,
                cruise_power_w: segment.cruise_power_w,
                avg_power_w: segment.average_power_w,
                energy_wh: segment.energy_wh,
                hover_energy_wh: segment.hover_energy_wh,
                cumulative_energy_wh: segment.cumulative_energy_wh,
                cumulative_battery_pct: segment.cumulative_battery_percent,
                wind_speed_ms: segment.wind.speed_ms,
                wind_direction_deg: segment.wind.direction_deg,
                headwind_ms: segment.wind.headwind_ms,
                crosswind_ms: segment.wind.crosswind_ms,
                wind_source,
                warnings: segment.warnings.len(),
            }
        }
    }

    /// Lower-case serde name of a unit enum variant (`"cruise"`, `"synthetic"`, ...).
    fn label<T: Serialize>(value: &T) -> String {
        serde_json::to_value(value)
            .ok()
            .and_then(|v| v.as_str().map(str::to_owned))
            .unwrap_or_default()
    }

    /// Write one CSV row per segment, with a header.
    pub fn write_segments(writer: &mut dyn Write, result: &SimulationResult) -> Result<(), ExportError> {
        let mut csv = csv::Writer::from_writer(writer);
        for segment in &result.segments {
            let phase = label(&segment.phase);
            let source = label(&segment.wind.source);
            csv.serialize(Record::from_segment(segment, &phase, &source))?;
        }
        csv.flush()?;
        Ok(())
    }
}

pub mod results {
    use std::fs::{self, File};
    use std::io::Write;
    use std::path::Path;

    use flight_simulation::{SimulationMetadata, SimulationResult, SimulationSummary};
    use serde::Serialize;
    use serde_json::to_writer_pretty;

    use crate::ExportError;

    #[derive(Serialize)]
    struct SummarySidecar<'a> {
        vehicle: &'a str,
        total_energy_wh: f64,
        total_distance_m: f64,
        total_time_s: f64,
        battery_usage_percent: f64,
        summary: &'a SimulationSummary,
        metadata: &'a SimulationMetadata,
    }

    /// Write the full result as pretty JSON.
    pub fn write_result(writer: &mut dyn Write, result: &SimulationResult) -> Result<(), ExportError> {
        to_writer_pretty(&mut *writer, result)?;
        writeln!(writer)?;
        Ok(())
    }

    /// Write `<stem>_summary.json` next to `output` with totals, summary and metadata only.
    pub fn write_summary_sidecar(output: &Path, result: &SimulationResult) -> Result<(), ExportError> {
        let parent = output.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;
        let stem = output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("simulation");
        let path = parent.join(format!("{stem}_summary.json"));

        let sidecar = SummarySidecar {
            vehicle: &result.vehicle_name,
            total_energy_wh: result.total_energy_wh,
            total_distance_m: result.total_distance_m,
            total_time_s: result.total_time_s,
            battery_usage_percent: result.battery_usage_percent,
            summary: &result.summary,
            metadata: &result.metadata,
        };
        to_writer_pretty(File::create(&path)?, &sidecar)?;
        Ok(())
    }
}

pub mod power_curve {
    use std::io::Write;

    use flight_simulation::power::analysis::InducedModelComparison;
    use serde::Serialize;

    use crate::ExportError;

    #[derive(Debug, Serialize)]
    struct Row {
        airspeed_ms: f64,
        calibrated_w: Option<f64>,
        glauert_w: Option<f64>,
    }

    /// Write both induced-model curves side by side as CSV.
    pub fn write_comparison(writer: &mut dyn Write, comparison: &InducedModelComparison) -> Result<(), ExportError> {
        let mut csv = csv::Writer::from_writer(writer);
        for (calibrated, glauert) in comparison.calibrated.iter().zip(&comparison.glauert) {
            csv.serialize(Row {
                airspeed_ms: calibrated.airspeed_ms,
                calibrated_w: calibrated.power_w,
                glauert_w: glauert.power_w,
            })?;
        }
        csv.flush()?;
        Ok(())
    }
}
