//! Data models for the forecast client
//!
//! - Coordinate: resolved geographic position
//! - Forecast: forecast entries, variants and payload formats

pub mod coordinate;
pub mod forecast;

pub use coordinate::Coordinate;
pub use forecast::{
    ForecastEntry, ForecastVariant, PayloadFormat, Precipitation, Symbol, Temperature,
    WindDirection, WindSpeed,
};
