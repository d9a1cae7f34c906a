//! Forecast fetcher: one GET against the locationforecast API per request

use crate::http::HttpFetch;
use crate::models::{Coordinate, PayloadFormat};
use crate::{Result, YrError};
use tracing::{error, info};

/// Request URL for a coordinate, e.g.
/// `https://api.met.no/weatherapi/locationforecast/2.0/classic?lat=59.9139&lon=10.7522&altitude=10`
#[must_use]
pub fn forecast_url(base_url: &str, coordinate: &Coordinate, format: PayloadFormat) -> String {
    format!(
        "{}/{}?{}",
        base_url.trim_end_matches('/'),
        format.endpoint(),
        coordinate.query()
    )
}

/// Fetches raw forecast payloads. Whether a fetch is needed at all is the
/// forecast cache's decision.
pub struct ForecastFetcher<'a> {
    http: &'a dyn HttpFetch,
    base_url: &'a str,
}

impl<'a> ForecastFetcher<'a> {
    pub fn new(http: &'a dyn HttpFetch, base_url: &'a str) -> Self {
        Self { http, base_url }
    }

    pub fn fetch(&self, coordinate: &Coordinate, format: PayloadFormat) -> Result<String> {
        let url = forecast_url(self.base_url, coordinate, format);
        info!("read online: {}", url);

        let response = self.http.get(&url)?;
        if !response.is_ok() {
            error!("{} answered with status {}", url, response.status);
            return Err(YrError::Api {
                url,
                status: response.status,
            });
        }

        String::from_utf8(response.body).map_err(|e| {
            error!("{} returned a body that is not UTF-8: {}", url, e);
            YrError::payload(format!("response from {url} is not UTF-8: {e}"))
        })
    }
}
