//! Simulation façade crate: mission energy orchestration plus re-exported model crates.

pub mod result;
pub mod run;
mod segment;

pub use facade::*;
pub use flight_battery as battery;
pub use flight_config as config;
pub use flight_kinematics as kinematics;
pub use flight_power as power;
pub use flight_wind as wind;

mod facade;
