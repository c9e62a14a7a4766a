//! Energy integration and battery accounting.

use flight_core::constants::SECONDS_PER_HOUR;
use flight_core::units::{battery_capacity_wh, m_to_km};
use serde::Serialize;
use thiserror::Error;

/// Energy (Wh) drawn at a constant power for a duration.
pub fn integrate(power_w: f64, duration_s: f64) -> f64 {
    power_w * duration_s / SECONDS_PER_HOUR
}

#[derive(Debug, Error, PartialEq)]
pub enum BatteryError {
    #[error("battery capacity must be positive (got {0} mAh)")]
    InvalidCapacity(f64),
    #[error("battery voltage must be positive (got {0} V)")]
    InvalidVoltage(f64),
}

/// Nominal battery pack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatteryPack {
    pub capacity_mah: f64,
    pub voltage_v: f64,
}

impl BatteryPack {
    pub fn new(capacity_mah: f64, voltage_v: f64) -> Result<Self, BatteryError> {
        if !(capacity_mah.is_finite() && capacity_mah > 0.0) {
            return Err(BatteryError::InvalidCapacity(capacity_mah));
        }
        if !(voltage_v.is_finite() && voltage_v > 0.0) {
            return Err(BatteryError::InvalidVoltage(voltage_v));
        }
        Ok(Self {
            capacity_mah,
            voltage_v,
        })
    }

    pub fn capacity_wh(&self) -> f64 {
        battery_capacity_wh(self.capacity_mah, self.voltage_v)
    }
}

/// Running totals after one segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CumulativeUsage {
    pub energy_wh: f64,
    /// Not clamped; values above 100 mean the pack runs out.
    pub battery_percent: f64,
}

/// Accumulates segment energies against a pack, in segment order.
#[derive(Debug, Clone)]
pub struct EnergyLedger {
    capacity_wh: f64,
    total_wh: f64,
    distance_m: f64,
    time_s: f64,
    depleted_at: Option<usize>,
}

impl EnergyLedger {
    pub fn new(pack: &BatteryPack) -> Self {
        Self {
            capacity_wh: pack.capacity_wh(),
            total_wh: 0.0,
            distance_m: 0.0,
            time_s: 0.0,
            depleted_at: None,
        }
    }

    /// Book one segment; negative energy is treated as zero so totals never decrease.
    pub fn record(&mut self, index: usize, energy_wh: f64, distance_m: f64, time_s: f64) -> CumulativeUsage {
        self.total_wh += energy_wh.max(0.0);
        self.distance_m += distance_m.max(0.0);
        self.time_s += time_s.max(0.0);
        let usage = self.usage_percent();
        if usage > 100.0 && self.depleted_at.is_none() {
            self.depleted_at = Some(index);
        }
        CumulativeUsage {
            energy_wh: self.total_wh,
            battery_percent: usage,
        }
    }

    pub fn capacity_wh(&self) -> f64 {
        self.capacity_wh
    }

    pub fn total_wh(&self) -> f64 {
        self.total_wh
    }

    pub fn usage_percent(&self) -> f64 {
        self.total_wh / self.capacity_wh * 100.0
    }

    /// First segment after which cumulative usage exceeded 100%.
    pub fn depleted_at(&self) -> Option<usize> {
        self.depleted_at
    }

    pub fn report(&self) -> BatteryReport {
        let usage = self.usage_percent();
        let distance_km = m_to_km(self.distance_m);
        BatteryReport {
            capacity_wh: self.capacity_wh,
            used_wh: self.total_wh,
            usage_percent: usage,
            remaining_wh: self.capacity_wh - self.total_wh,
            remaining_percent: 100.0 - usage,
            feasible: self.total_wh < self.capacity_wh,
            max_range_km: if self.total_wh > 0.0 {
                self.capacity_wh / self.total_wh * distance_km
            } else {
                0.0
            },
            energy_per_km_wh: if distance_km > 0.0 {
                self.total_wh / distance_km
            } else {
                0.0
            },
            depleted_at_segment: self.depleted_at,
        }
    }
}

/// Battery-level outcome of a mission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatteryReport {
    pub capacity_wh: f64,
    pub used_wh: f64,
    pub usage_percent: f64,
    /// Negative when the mission needs more than the pack holds.
    pub remaining_wh: f64,
    pub remaining_percent: f64,
    pub feasible: bool,
    /// Linear extrapolation of the flown distance to the full pack.
    pub max_range_km: f64,
    pub energy_per_km_wh: f64,
    pub depleted_at_segment: Option<usize>,
}
