use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use flight_energy::config::load_vehicle_configs;
use flight_energy::core::atmosphere::air_density;
use flight_energy::export::{power_curve, writer_for_path};
use flight_energy::power::analysis::{
    CurveSample, DEFAULT_USABLE_FRACTION, REFERENCE_SPEED_MS, compare_induced_models,
    estimate_range, sample_curve, speed_grid, sweet_spot,
};
use flight_energy::power::{PowerTuning, VehicleModel};
use flight_energy::simulation::vehicle::{self, select};

#[derive(Parser, Debug)]
#[command(author, version, about = "Power-versus-airspeed curve and sweet spot for one vehicle")]
struct Cli {
    /// Vehicle catalog: YAML list, TOML file or directory of TOML files
    #[arg(long)]
    vehicles: PathBuf,

    /// Vehicle name from the catalog (first entry when omitted)
    #[arg(long)]
    vehicle: Option<String>,

    /// Highest airspeed to sample (defaults to the vehicle's max speed)
    #[arg(long)]
    max_speed: Option<f64>,

    /// Airspeed step (m/s)
    #[arg(long, default_value_t = 0.5)]
    step: f64,

    /// Altitude for the air density (m)
    #[arg(long, default_value_t = 0.0)]
    altitude: f64,

    /// Airspeed for the range estimate (m/s)
    #[arg(long, default_value_t = REFERENCE_SPEED_MS)]
    range_speed: f64,

    /// Share of the battery treated as usable for the range estimate
    #[arg(long, default_value_t = DEFAULT_USABLE_FRACTION)]
    usable_fraction: f64,

    /// Write the calibrated and Glauert curves as CSV ("-" for stdout, multirotors only)
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    flight_cli::init_tracing();
    let cli = Cli::parse();
    if !(cli.step.is_finite() && cli.step > 0.0) {
        bail!("--step must be a positive number, got {}", cli.step);
    }

    let catalog = load_vehicle_configs(&cli.vehicles)
        .with_context(|| format!("loading vehicles from {}", cli.vehicles.display()))?;
    let config = select(&catalog, cli.vehicle.as_deref())?;
    let vehicle = vehicle::from_config(config, PowerTuning::default())?;
    let rho = air_density(cli.altitude);
    let speeds = speed_grid(cli.max_speed.unwrap_or(config.max_speed_ms), cli.step);

    if cli.output.as_deref() == Some(Path::new("-")) {
        let VehicleModel::Multirotor(rotor) = &vehicle.model else {
            bail!("--output compares induced-power models and needs a multirotor");
        };
        let mut writer = writer_for_path(Path::new("-"))?;
        power_curve::write_comparison(&mut *writer, &compare_induced_models(rotor, &speeds, rho))?;
        writer.flush()?;
        return Ok(());
    }

    println!("=== Power Curve ===");
    println!("Vehicle: {} ({:?})", vehicle.name, vehicle.kind);
    println!("Air density: {rho:.4} kg/m^3 at {:.0} m", cli.altitude);

    match &vehicle.model {
        VehicleModel::Multirotor(rotor) => {
            let comparison = compare_induced_models(rotor, &speeds, rho);
            println!("Hover power: {:.1} W", comparison.hover_power_w);
            println!();
            println!("{:>8} {:>14} {:>12}", "v [m/s]", "calibrated [W]", "glauert [W]");
            for (calibrated, glauert) in comparison.calibrated.iter().zip(&comparison.glauert) {
                println!(
                    "{:>8.1} {:>14} {:>12}",
                    calibrated.airspeed_ms,
                    watts(calibrated),
                    watts(glauert)
                );
            }
            println!();
            print_sweet_spot("Calibrated sweet spot", comparison.calibrated_sweet_spot);
            print_sweet_spot("Glauert sweet spot", comparison.glauert_sweet_spot);

            if let Some(path) = &cli.output {
                let mut writer = writer_for_path(path)?;
                power_curve::write_comparison(&mut *writer, &comparison)?;
                writer.flush()?;
            }
        }
        model => {
            if cli.output.is_some() {
                bail!("--output compares induced-power models and needs a multirotor");
            }
            let samples = sample_curve(model, &speeds, rho);
            println!();
            println!("{:>8} {:>10}", "v [m/s]", "power [W]");
            for sample in &samples {
                println!("{:>8.1} {:>10}", sample.airspeed_ms, watts(sample));
            }
            println!();
            print_sweet_spot("Sweet spot", sweet_spot(&samples));
        }
    }

    let capacity_wh = vehicle.battery.capacity_wh();
    match estimate_range(&vehicle.model, capacity_wh, cli.range_speed, cli.usable_fraction, rho) {
        Ok(range) => {
            println!();
            println!("=== Range at {:.1} m/s ===", range.airspeed_ms);
            println!("Power:     {:.1} W", range.power_w);
            println!("Usable:    {:.1} Wh of {capacity_wh:.1} Wh", range.usable_energy_wh);
            println!("Endurance: {:.1} min", range.endurance_min);
            println!("Range:     {:.2} km", range.range_km);
        }
        Err(err) => println!("Range at {:.1} m/s unavailable: {err}", cli.range_speed),
    }
    Ok(())
}

fn watts(sample: &CurveSample) -> String {
    sample
        .power_w
        .map(|p| format!("{p:.1}"))
        .unwrap_or_else(|| "-".to_string())
}

fn print_sweet_spot(label: &str, sample: Option<CurveSample>) {
    match sample.and_then(|s| s.power_w.map(|p| (s.airspeed_ms, p))) {
        Some((v, p)) => println!("{label}: {v:.1} m/s at {p:.1} W"),
        None => println!("{label}: none"),
    }
}
