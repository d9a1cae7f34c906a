//! `yr-forecast` - blocking client for yr.no / met.no weather forecasts
//!
//! Place names are resolved to coordinates through the lookup archive that
//! yr.no publishes, forecast payloads are cached on disk until the provider's
//! declared next update, and the cached XML or JSON is read into forecast
//! entries.

pub mod archive;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod language;
pub mod location_resolver;
pub mod logging;
pub mod models;
pub mod payload;
pub mod store;
pub mod weather;

#[cfg(test)]
mod testing;

// Re-export core types for public API
pub use cache::{ForecastCache, ForecastKey};
pub use client::{ForecastOptions, Weather, YrClient};
pub use config::YrConfig;
pub use error::YrError;
pub use http::{HttpClient, HttpFetch, HttpResponse};
pub use language::{Credit, Language};
pub use location_resolver::LocationResolver;
pub use models::{Coordinate, ForecastEntry, ForecastVariant, PayloadFormat};
pub use payload::Payload;
pub use store::{CoordinateStore, FjallCoordinateStore, MemoryCoordinateStore, ResolutionKey};
pub use weather::ForecastFetcher;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, YrError>;
