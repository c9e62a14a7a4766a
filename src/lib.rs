//! Flight energy estimation for battery-powered multirotor, fixed-wing and VTOL aircraft.
//!
//! The engine turns a vehicle description and a waypoint mission into per-segment
//! power, energy and battery figures. Each concern lives in its own workspace crate;
//! this crate re-exports them so front-ends depend on a single package.

pub use flight_battery as battery;
pub use flight_config as config;
pub use flight_core as core;
pub use flight_export as export;
pub use flight_kinematics as kinematics;
pub use flight_power as power;
pub use flight_simulation as simulation;
pub use flight_wind as wind;

/// Returns the version of the library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
