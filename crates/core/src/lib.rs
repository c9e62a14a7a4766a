//! Core units, constants, and shared primitives for the flight energy workspace.

/// Physical constants expressed in SI units (unless stated otherwise).
pub mod constants {
    /// Gravitational acceleration used by every power model (m/s²).
    pub const GRAVITY_M_S2: f64 = 9.81;
    /// ISA air density at mean sea level (kg/m³).
    pub const SEA_LEVEL_AIR_DENSITY: f64 = 1.225;
    /// Mean Earth radius for the haversine sphere (m).
    pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
    /// Seconds per hour.
    pub const SECONDS_PER_HOUR: f64 = 3_600.0;
}

/// Basic unit conversion helpers.
pub mod units {
    /// Convert metres to kilometres.
    #[inline]
    pub fn m_to_km(v: f64) -> f64 {
        v / 1_000.0
    }

    /// Convert seconds to minutes.
    #[inline]
    pub fn seconds_to_minutes(v: f64) -> f64 {
        v / 60.0
    }

    /// Convert watt-seconds (joules) to watt-hours.
    #[inline]
    pub fn joules_to_wh(v: f64) -> f64 {
        v / super::constants::SECONDS_PER_HOUR
    }

    /// Battery energy in Wh from a capacity in mAh at a nominal voltage.
    #[inline]
    pub fn battery_capacity_wh(capacity_mah: f64, voltage_v: f64) -> f64 {
        capacity_mah / 1_000.0 * voltage_v
    }
}

/// Minimal 2D helpers for the local east-north (ENU) plane.
pub mod vector {
    /// `[east, north]` components in metres or m/s depending on context.
    pub type Vector2 = [f64; 2];

    /// Euclidean norm of a vector.
    #[inline]
    pub fn norm(v: &Vector2) -> f64 {
        dot(v, v).sqrt()
    }

    /// Dot product of two vectors.
    #[inline]
    pub fn dot(a: &Vector2, b: &Vector2) -> f64 {
        a[0] * b[0] + a[1] * b[1]
    }

    /// Scale a vector by a scalar.
    #[inline]
    pub fn scale(v: &Vector2, s: f64) -> Vector2 {
        [v[0] * s, v[1] * s]
    }

    /// Vector subtraction.
    #[inline]
    pub fn sub(a: &Vector2, b: &Vector2) -> Vector2 {
        [a[0] - b[0], a[1] - b[1]]
    }

    /// Unit vector along `v`, or `None` when `v` has no usable length.
    pub fn normalize(v: &Vector2) -> Option<Vector2> {
        let n = norm(v);
        if n.is_finite() && n > 1e-9 {
            Some(scale(v, 1.0 / n))
        } else {
            None
        }
    }

    /// Unit vector pointing along a compass bearing (0° = north, 90° = east).
    #[inline]
    pub fn from_bearing_deg(bearing_deg: f64) -> Vector2 {
        let rad = bearing_deg.to_radians();
        [rad.sin(), rad.cos()]
    }

    /// Compass bearing of a vector in degrees, normalised to `[0, 360)`.
    #[inline]
    pub fn bearing_deg(v: &Vector2) -> f64 {
        v[0].atan2(v[1]).to_degrees().rem_euclid(360.0)
    }
}

/// Great-circle and local-plane geometry on a spherical Earth.
pub mod geo {
    use super::constants::EARTH_RADIUS_M;
    use super::vector::Vector2;

    /// Haversine surface distance between two latitude/longitude pairs (degrees) in metres.
    pub fn haversine_m(lat1_deg: f64, lon1_deg: f64, lat2_deg: f64, lon2_deg: f64) -> f64 {
        let lat1 = lat1_deg.to_radians();
        let lat2 = lat2_deg.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (lon2_deg - lon1_deg).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().min(1.0).asin();
        EARTH_RADIUS_M * c
    }

    /// East/north offset (m) from the first point to the second on a local tangent plane.
    ///
    /// Uses an equirectangular projection around the mean latitude, which is adequate for
    /// waypoint spacing well below a few hundred kilometres.
    pub fn enu_offset_m(lat1_deg: f64, lon1_deg: f64, lat2_deg: f64, lon2_deg: f64) -> Vector2 {
        let mean_lat = (0.5 * (lat1_deg + lat2_deg)).to_radians();
        let mut dlon = lon2_deg - lon1_deg;
        if dlon > 180.0 {
            dlon -= 360.0;
        } else if dlon < -180.0 {
            dlon += 360.0;
        }
        let east = dlon.to_radians() * mean_lat.cos() * EARTH_RADIUS_M;
        let north = (lat2_deg - lat1_deg).to_radians() * EARTH_RADIUS_M;
        [east, north]
    }

    /// Arithmetic midpoint of two positions; fine for the short legs of a mission.
    pub fn midpoint(lat1_deg: f64, lon1_deg: f64, lat2_deg: f64, lon2_deg: f64) -> (f64, f64) {
        (0.5 * (lat1_deg + lat2_deg), 0.5 * (lon1_deg + lon2_deg))
    }
}

/// International Standard Atmosphere helpers (troposphere only).
pub mod atmosphere {
    use super::constants::{GRAVITY_M_S2, SEA_LEVEL_AIR_DENSITY};

    const SEA_LEVEL_TEMPERATURE_K: f64 = 288.15;
    const SEA_LEVEL_PRESSURE_PA: f64 = 101_325.0;
    const LAPSE_RATE_K_M: f64 = -0.0065;
    const GAS_CONSTANT_J_KG_K: f64 = 287.0;
    const TROPOPAUSE_M: f64 = 11_000.0;
    const MIN_DENSITY: f64 = 0.1;

    /// Air density (kg/m³) at the given altitude above mean sea level.
    ///
    /// Altitude is clamped to the troposphere; non-finite inputs return the sea-level value.
    pub fn air_density(altitude_m: f64) -> f64 {
        if !altitude_m.is_finite() {
            return SEA_LEVEL_AIR_DENSITY;
        }
        let altitude = altitude_m.clamp(0.0, TROPOPAUSE_M);
        let temperature = SEA_LEVEL_TEMPERATURE_K + LAPSE_RATE_K_M * altitude;
        let exponent = -GRAVITY_M_S2 / (GAS_CONSTANT_J_KG_K * LAPSE_RATE_K_M);
        let pressure = SEA_LEVEL_PRESSURE_PA * (temperature / SEA_LEVEL_TEMPERATURE_K).powf(exponent);
        (pressure / (GAS_CONSTANT_J_KG_K * temperature)).max(MIN_DENSITY)
    }
}
