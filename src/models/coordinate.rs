//! Geographic coordinate resolved from a place name or given directly

use serde::{Deserialize, Serialize};

/// Latitude/longitude in decimal degrees plus altitude in meters above sea level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl Coordinate {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }

    /// Build from an `(x, y, z)` triple, i.e. longitude first
    #[must_use]
    pub fn from_xyz(longitude: f64, latitude: f64, altitude: f64) -> Self {
        Self::new(latitude, longitude, altitude)
    }

    /// Query form understood by the locationforecast API.
    /// The API refuses more than four decimals and wants whole meters.
    #[must_use]
    pub fn query(&self) -> String {
        format!(
            "lat={:.4}&lon={:.4}&altitude={:.0}",
            self.latitude, self.longitude, self.altitude
        )
    }

    /// Stable name used to build forecast cache file names
    #[must_use]
    pub fn cache_name(&self) -> String {
        format!(
            "lat={:.4};lon={:.4};altitude={:.0}",
            self.latitude, self.longitude, self.altitude
        )
    }

    /// Parse a lookup archive descriptor such as `lat=50.08804&lon=14.42076&altitude=202.0`.
    ///
    /// The three fields must open the descriptor in that order; anything after
    /// the altitude number is ignored.
    #[must_use]
    pub fn parse_descriptor(descriptor: &str) -> Option<Self> {
        let (latitude, rest) = field(descriptor.trim(), "lat")?;
        let (longitude, rest) = field(rest.strip_prefix('&')?, "lon")?;
        let (altitude, _) = field(rest.strip_prefix('&')?, "altitude")?;
        Some(Self::new(latitude, longitude, altitude))
    }
}

/// Read `name=<number>` off the front of `input`, returning the number and the
/// remaining text.
fn field<'a>(input: &'a str, name: &str) -> Option<(f64, &'a str)> {
    let value = input.strip_prefix(name)?.strip_prefix('=')?;
    let end = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .unwrap_or(value.len());
    let (number, rest) = value.split_at(end);
    let digits = number.strip_prefix('-').unwrap_or(number);
    if digits.is_empty() || digits.contains('-') {
        return None;
    }
    Some((number.parse().ok()?, rest))
}
