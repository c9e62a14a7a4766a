use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use flight_energy::config::{
    EngineConfig, InducedModelConfig, WindSettings, load_engine_config, load_mission,
    load_vehicle_configs,
};
use flight_energy::export::{results, segments, writer_for_path};
use flight_energy::simulation::vehicle::select;
use flight_energy::simulation::{SimulationOptions, SimulationRequest, SimulationResult, simulate};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Estimate battery energy for a waypoint mission")]
struct Cli {
    /// Vehicle catalog: YAML list, TOML file or directory of TOML files
    #[arg(long)]
    vehicles: PathBuf,

    /// Vehicle name from the catalog (first entry when omitted)
    #[arg(long)]
    vehicle: Option<String>,

    /// Mission waypoints (YAML or JSON)
    #[arg(long)]
    mission: PathBuf,

    /// Engine settings (TOML)
    #[arg(long)]
    engine: Option<PathBuf>,

    /// Ignore wind entirely
    #[arg(long, conflicts_with_all = ["wind_speed", "wind_direction"])]
    no_wind: bool,

    /// Constant wind speed override (m/s)
    #[arg(long, requires = "wind_direction")]
    wind_speed: Option<f64>,

    /// Direction the constant wind blows from (degrees, 0 = north)
    #[arg(long, requires = "wind_speed")]
    wind_direction: Option<f64>,

    /// Planned take-off time (RFC 3339) for forecast and synthetic wind lookups
    #[arg(long)]
    start_time: Option<DateTime<Utc>>,

    /// Wind service API key
    #[arg(long, env = "WIND_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Evaluate segments in parallel
    #[arg(long)]
    parallel: bool,

    /// Multirotor induced-power model
    #[arg(long, value_enum)]
    induced_model: Option<InducedModelArg>,

    /// Write the full result as JSON ("-" for stdout)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Also write `<stem>_summary.json` next to --output
    #[arg(long, requires = "output")]
    summary: bool,

    /// Write the per-segment table as CSV
    #[arg(long)]
    csv: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum InducedModelArg {
    Calibrated,
    Glauert,
}

impl From<InducedModelArg> for InducedModelConfig {
    fn from(value: InducedModelArg) -> Self {
        match value {
            InducedModelArg::Calibrated => InducedModelConfig::Calibrated,
            InducedModelArg::Glauert => InducedModelConfig::Glauert,
        }
    }
}

fn main() -> Result<()> {
    flight_cli::init_tracing();
    let cli = Cli::parse();

    let catalog = load_vehicle_configs(&cli.vehicles)
        .with_context(|| format!("loading vehicles from {}", cli.vehicles.display()))?;
    let vehicle = select(&catalog, cli.vehicle.as_deref())?.clone();
    let mission = load_mission(&cli.mission)
        .with_context(|| format!("loading mission from {}", cli.mission.display()))?;
    if mission.waypoints.len() < 2 {
        bail!("mission {} needs at least two waypoints", cli.mission.display());
    }

    let mut engine = match &cli.engine {
        Some(path) => load_engine_config(path)
            .with_context(|| format!("loading engine settings from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(key) = &cli.api_key {
        engine.wind.api_key = Some(key.clone());
    }
    if let Some(model) = cli.induced_model {
        engine.tuning.induced_model = Some(model.into());
    }
    engine.parallel |= cli.parallel;

    let mut wind = if cli.no_wind {
        WindSettings::calm()
    } else if let (Some(speed), Some(direction)) = (cli.wind_speed, cli.wind_direction) {
        WindSettings::manual(speed, direction)
    } else {
        WindSettings::default()
    };
    wind.start_time = cli.start_time;

    info!(vehicle = %vehicle.name, waypoints = mission.waypoints.len(), "starting simulation");
    let request = SimulationRequest {
        vehicle,
        waypoints: mission.waypoints,
        wind,
    };
    let result = simulate(request, SimulationOptions::from(&engine))?;

    if let Some(path) = &cli.output {
        let mut writer = writer_for_path(path)?;
        results::write_result(&mut *writer, &result)?;
        writer.flush()?;
        if cli.summary && path != Path::new("-") {
            results::write_summary_sidecar(path, &result)?;
        }
    }
    if let Some(path) = &cli.csv {
        let mut writer = writer_for_path(path)?;
        segments::write_segments(&mut *writer, &result)?;
        writer.flush()?;
    }

    let stdout_taken = cli.output.as_deref() == Some(Path::new("-"))
        || cli.csv.as_deref() == Some(Path::new("-"));
    if !stdout_taken {
        print_report(&mission.name, &result);
    }
    Ok(())
}

fn print_report(mission_name: &str, result: &SimulationResult) {
    println!("=== Flight Energy ===");
    if !mission_name.is_empty() {
        println!("Mission: {mission_name}");
    }
    println!("Vehicle: {} ({:?})", result.vehicle_name, result.vehicle_kind);
    println!(
        "Wind: {:?}{}",
        result.metadata.wind_source,
        if result.metadata.wind_fallback_used {
            " (synthetic fallback used)"
        } else {
            ""
        }
    );

    println!();
    println!(
        "{:>3}  {:<10} {:>9} {:>8} {:>8} {:>9} {:>9} {:>7}",
        "#", "phase", "dist [m]", "time [s]", "air [m/s]", "power [W]", "energy [Wh]", "batt %"
    );
    for segment in &result.segments {
        println!(
            "{:>3}  {:<10} {:>9.1} {:>8.1} {:>8.2} {:>9.1} {:>9.2} {:>7.1}",
            segment.index,
            format!("{:?}", segment.phase).to_lowercase(),
            segment.distance_m,
            segment.duration_s,
            segment.cruise_airspeed_ms,
            segment.cruise_power_w,
            segment.energy_wh,
            segment.cumulative_battery_percent,
        );
    }

    let summary = &result.summary;
    println!();
    println!("=== Summary ===");
    println!("Total energy:     {:.2} Wh", result.total_energy_wh);
    println!("Total distance:   {:.3} km", result.total_distance_m / 1_000.0);
    println!("Total time:       {:.1} min", result.total_time_s / 60.0);
    println!("Battery usage:    {:.1} %", result.battery_usage_percent);
    println!("Remaining:        {:.2} Wh", summary.remaining_energy_wh);
    println!("Feasible:         {}", if summary.is_feasible { "yes" } else { "no" });
    if let Some(index) = summary.depleted_at_segment {
        println!("Depleted at:      segment {index}");
    }
    println!("Max range:        {:.2} km", summary.max_range_km);

    if !result.metadata.warnings.is_empty() {
        println!();
        println!("=== Warnings ===");
        for warning in &result.metadata.warnings {
            println!("- segment {}: {}", warning.segment(), warning.message());
        }
    }
}
