//! Client facade tying place name resolution, the forecast cache and the
//! forecast fetcher together.

use crate::cache::{ForecastCache, ForecastKey};
use crate::config::{DefaultsConfig, YrConfig};
use crate::http::{HttpClient, HttpFetch};
use crate::language::{Credit, Language};
use crate::location_resolver::LocationResolver;
use crate::models::{Coordinate, ForecastEntry, ForecastVariant, PayloadFormat};
use crate::payload::Payload;
use crate::store::{CoordinateStore, FjallCoordinateStore};
use crate::weather::ForecastFetcher;
use crate::{Result, YrError};
use std::path::PathBuf;
use tracing::{info, instrument};

/// Which forecast to fetch and in which wire format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ForecastOptions {
    pub variant: ForecastVariant,
    pub format: PayloadFormat,
}

impl ForecastOptions {
    #[must_use]
    pub fn new(variant: ForecastVariant, format: PayloadFormat) -> Self {
        Self { variant, format }
    }

    pub fn from_defaults(defaults: &DefaultsConfig) -> Result<Self> {
        let format = PayloadFormat::parse(&defaults.format).ok_or_else(|| {
            YrError::config(format!("Invalid payload format '{}'", defaults.format))
        })?;
        Ok(Self {
            variant: ForecastVariant::from_link_key(&defaults.variant),
            format,
        })
    }
}

pub struct YrClient<H = HttpClient, S = FjallCoordinateStore> {
    http: H,
    store: S,
    language: Language,
    cache: ForecastCache,
    base_url: String,
    archive_max_age_days: u32,
    defaults: ForecastOptions,
}

impl YrClient {
    /// Client with the real HTTP transport and the on-disk coordinate store
    pub fn from_config(config: &YrConfig) -> Result<Self> {
        let http = HttpClient::new(&config.http)?;
        let store = FjallCoordinateStore::open(config.cache.coordinate_store_path())?;
        Self::with_parts(config, http, store)
    }
}

impl<H: HttpFetch, S: CoordinateStore> YrClient<H, S> {
    pub fn with_parts(config: &YrConfig, http: H, store: S) -> Result<Self> {
        let language = Language::load(
            &config.defaults.language,
            config.defaults.languages_dir.as_deref(),
        )?;
        Ok(Self {
            http,
            store,
            language,
            cache: ForecastCache::new(config.cache.directory()),
            base_url: config.http.base_url.clone(),
            archive_max_age_days: config.cache.archive_max_age_days,
            defaults: ForecastOptions::from_defaults(&config.defaults)?,
        })
    }

    #[must_use]
    pub fn language(&self) -> &Language {
        &self.language
    }

    #[must_use]
    pub fn default_options(&self) -> ForecastOptions {
        self.defaults
    }

    #[must_use]
    pub fn forecast_cache(&self) -> &ForecastCache {
        &self.cache
    }

    /// Local copy of the language's lookup archive
    #[must_use]
    pub fn archive_cache_path(&self) -> PathBuf {
        self.cache
            .directory()
            .join(self.language.archive_file_name())
    }

    /// Coordinates of a place name such as `Norge/Telemark/Skien/Skien`
    pub fn resolve(&self, location_path: &str) -> Result<Coordinate> {
        LocationResolver::new(&self.http, &self.store, self.archive_max_age_days).resolve(
            location_path,
            &self.language.location_zip_url,
            &self.archive_cache_path(),
        )
    }

    #[instrument(skip(self))]
    pub fn weather_for_location(
        &self,
        location_path: &str,
        options: ForecastOptions,
    ) -> Result<Weather> {
        let coordinate = self.resolve(location_path)?;
        let mut weather = self.weather_for_coordinate(coordinate, options)?;
        weather.location_name = Some(location_path.to_string());
        Ok(weather)
    }

    /// Forecast for `(x, y, z)`: longitude, latitude, altitude
    pub fn weather_for_xyz(
        &self,
        x: f64,
        y: f64,
        z: f64,
        options: ForecastOptions,
    ) -> Result<Weather> {
        self.weather_for_coordinate(Coordinate::from_xyz(x, y, z), options)
    }

    #[instrument(skip(self))]
    pub fn weather_for_coordinate(
        &self,
        coordinate: Coordinate,
        options: ForecastOptions,
    ) -> Result<Weather> {
        info!(
            "weatherdata request: {}, forecast-link: {}",
            coordinate.cache_name(),
            self.language.link(options.variant)
        );

        let key = ForecastKey::new(coordinate, self.language.link(options.variant), options.format);
        let fetcher = ForecastFetcher::new(&self.http, &self.base_url);
        let payload = self
            .cache
            .get_or_refresh(&key, || fetcher.fetch(&coordinate, options.format))?;

        Ok(Weather {
            location_name: None,
            coordinate,
            options,
            payload,
            credit: self.language.credit.clone(),
        })
    }
}

/// A forecast payload together with where and how it was requested
#[derive(Debug, Clone)]
pub struct Weather {
    location_name: Option<String>,
    coordinate: Coordinate,
    options: ForecastOptions,
    payload: String,
    credit: Credit,
}

impl Weather {
    /// Entries of the requested variant, in document order
    pub fn forecast(&self) -> Result<Vec<ForecastEntry>> {
        let entries = Payload::parse(&self.payload)?.entries()?;
        Ok(entries
            .into_iter()
            .filter(|entry| self.options.variant.includes(entry))
            .collect())
    }

    /// The first entry
    pub fn now(&self) -> Result<Option<ForecastEntry>> {
        Ok(self.forecast()?.into_iter().next())
    }

    /// Entries serialized as a JSON array
    pub fn forecast_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.forecast()?)
            .map_err(|e| YrError::payload(format!("cannot serialize forecast: {e}")))
    }

    #[must_use]
    pub fn location_name(&self) -> Option<&str> {
        self.location_name.as_deref()
    }

    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    #[must_use]
    pub fn options(&self) -> ForecastOptions {
        self.options
    }

    /// Attribution that has to be shown with the data
    #[must_use]
    pub fn credit(&self) -> &Credit {
        &self.credit
    }

    #[must_use]
    pub fn raw(&self) -> &str {
        &self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::fixtures::CLASSIC_XML;
    use crate::store::MemoryCoordinateStore;
    use crate::testing::{FakeHttp, zip_archive};
    use crate::weather::forecast_url;
    use chrono::{Duration, Local, Utc};

    const BASE: &str = "https://api.met.no/weatherapi/locationforecast/2.0";
    const ARCHIVE_URL: &str = "https://www.yr.no/storage/lookup/English.csv.zip";

    fn config(dir: &std::path::Path) -> YrConfig {
        let mut config = YrConfig::default();
        config.cache.directory = Some(dir.to_path_buf());
        config
    }

    /// Classic document that stays fresh for another hour
    fn fresh_xml() -> String {
        let nextrun = (Local::now() + Duration::hours(1))
            .with_timezone(&Utc)
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string();
        CLASSIC_XML.replace("2022-01-05T18:00:00Z\" from=", &format!("{nextrun}\" from="))
    }

    fn prague() -> Coordinate {
        Coordinate::new(50.08804, 14.42076, 202.0)
    }

    #[test]
    fn test_location_to_forecast() {
        let dir = tempfile::tempdir().unwrap();
        let http = FakeHttp::new()
            .respond(
                ARCHIVE_URL,
                200,
                zip_archive(&[(
                    "English/czech_republic.csv",
                    "czech_republic/prague/prague\tlat=50.08804&lon=14.42076&altitude=202.0\n",
                )]),
            )
            .respond(
                &forecast_url(BASE, &prague(), PayloadFormat::Xml),
                200,
                fresh_xml(),
            );
        let client =
            YrClient::with_parts(&config(dir.path()), http, MemoryCoordinateStore::new()).unwrap();

        let weather = client
            .weather_for_location("Czech_Republic/Prague/Prague", ForecastOptions::default())
            .unwrap();

        assert_eq!(weather.coordinate(), prague());
        assert_eq!(weather.location_name(), Some("Czech_Republic/Prague/Prague"));
        assert_eq!(weather.forecast().unwrap().len(), 3);
        assert!(weather.credit().text.contains("Yr"));
        assert!(dir.path().join("English.csv.zip").is_file());

        // everything is cached now
        let again = client
            .weather_for_location("Czech_Republic/Prague/Prague", ForecastOptions::default())
            .unwrap();
        assert_eq!(again.raw(), weather.raw());
        assert_eq!(client.http.call_count(), 2);
    }

    #[test]
    fn test_hour_by_hour_filters_entries() {
        let dir = tempfile::tempdir().unwrap();
        let http = FakeHttp::new().respond(
            &forecast_url(BASE, &prague(), PayloadFormat::Xml),
            200,
            fresh_xml(),
        );
        let client =
            YrClient::with_parts(&config(dir.path()), http, MemoryCoordinateStore::new()).unwrap();

        let options = ForecastOptions::new(ForecastVariant::HourByHour, PayloadFormat::Xml);
        let weather = client.weather_for_coordinate(prague(), options).unwrap();
        let entries = weather.forecast().unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].symbol.as_ref().unwrap().id, "LightRain");
        assert_eq!(weather.now().unwrap(), Some(entries[0].clone()));
        assert!(weather.forecast_json().unwrap().contains("LightRain"));

        // the standard variant has its own cache file
        client
            .weather_for_coordinate(prague(), ForecastOptions::default())
            .unwrap();
        assert_eq!(client.http.call_count(), 2);
    }

    #[test]
    fn test_xyz_is_longitude_first() {
        let dir = tempfile::tempdir().unwrap();
        let http = FakeHttp::new().respond(
            &forecast_url(BASE, &prague(), PayloadFormat::Xml),
            200,
            fresh_xml(),
        );
        let client =
            YrClient::with_parts(&config(dir.path()), http, MemoryCoordinateStore::new()).unwrap();

        let weather = client
            .weather_for_xyz(14.42076, 50.08804, 202.0, ForecastOptions::default())
            .unwrap();
        assert_eq!(weather.coordinate(), prague());
        assert_eq!(weather.location_name(), None);
    }

    #[test]
    fn test_api_error_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let http = FakeHttp::new().respond(
            &forecast_url(BASE, &prague(), PayloadFormat::Xml),
            503,
            "Service Unavailable",
        );
        let client =
            YrClient::with_parts(&config(dir.path()), http, MemoryCoordinateStore::new()).unwrap();

        let result = client.weather_for_coordinate(prague(), ForecastOptions::default());
        assert!(matches!(result, Err(YrError::Api { status: 503, .. })));
        assert_eq!(fs_count(dir.path()), 0);
    }

    #[test]
    fn test_language_selects_archive_and_links() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.defaults.language = "nb".to_string();
        config.defaults.variant = "forecast_hour_by_hour".to_string();
        let client = YrClient::with_parts(&config, FakeHttp::new(), MemoryCoordinateStore::new())
            .unwrap();

        assert_eq!(client.archive_cache_path(), dir.path().join("Norsk.csv.zip"));
        assert_eq!(
            client.default_options(),
            ForecastOptions::new(ForecastVariant::HourByHour, PayloadFormat::Xml)
        );
        assert_eq!(client.language().link(ForecastVariant::HourByHour), "varsel_time_for_time");
    }

    #[test]
    fn test_unknown_language_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.defaults.language = "tlh".to_string();
        let result = YrClient::with_parts(&config, FakeHttp::new(), MemoryCoordinateStore::new());
        assert!(matches!(result, Err(YrError::Config { .. })));
    }

    fn fs_count(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }
}
