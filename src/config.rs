//! Configuration management for the forecast client
//!
//! Handles loading configuration from a TOML file and environment variables,
//! and validates every setting before it reaches the HTTP client or caches.

use crate::{Result, YrError};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct YrConfig {
    /// Forecast endpoint and transport settings
    #[serde(default)]
    pub http: HttpConfig,
    /// Cache locations and lifetimes
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Default forecast options
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// HTTP transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Base URL of the locationforecast API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// `User-Agent` sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory holding the archive, the coordinate store and forecast files.
    /// Falls back to the OS temp directory.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    /// Re-download the lookup archive once it is this many days old
    #[serde(default = "default_archive_max_age_days")]
    pub archive_max_age_days: u32,
    /// Name of the coordinate store inside the cache directory
    #[serde(default = "default_coordinate_store")]
    pub coordinate_store: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Default forecast options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Language dictionary name (en, nb, or a file in `languages_dir`)
    #[serde(default = "default_language")]
    pub language: String,
    /// Directory of `<language>.json` dictionaries overriding the built-in ones
    #[serde(default)]
    pub languages_dir: Option<PathBuf>,
    /// Forecast variant (forecast or forecast_hour_by_hour)
    #[serde(default = "default_variant")]
    pub variant: String,
    /// Payload format (xml or json)
    #[serde(default = "default_format")]
    pub format: String,
}

// Default value functions
fn default_base_url() -> String {
    "https://api.met.no/weatherapi/locationforecast/2.0".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("yr-forecast/{} (rust weather client)", crate::VERSION)
}

fn default_archive_max_age_days() -> u32 {
    30
}

fn default_coordinate_store() -> String {
    "yr_location_to_coordinates".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_variant() -> String {
    "forecast".to_string()
}

fn default_format() -> String {
    "xml".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: None,
            archive_max_age_days: default_archive_max_age_days(),
            coordinate_store: default_coordinate_store(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            languages_dir: None,
            variant: default_variant(),
            format: default_format(),
        }
    }
}

impl HttpConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl CacheConfig {
    /// Resolved cache directory
    #[must_use]
    pub fn directory(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Path of the persistent coordinate store
    #[must_use]
    pub fn coordinate_store_path(&self) -> PathBuf {
        self.directory().join(&self.coordinate_store)
    }
}

impl YrConfig {
    /// Load configuration from the default file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // YR_HTTP__TIMEOUT_SECONDS=5 overrides http.timeout_seconds
        builder = builder.add_source(
            Environment::with_prefix("YR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| YrError::config(format!("Failed to build configuration: {e}")))?;

        let mut config: YrConfig = settings
            .try_deserialize()
            .map_err(|e| YrError::config(format!("Failed to deserialize configuration: {e}")))?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("yr-forecast").join("config.toml"))
    }

    /// Replace empty strings and zeroes with their defaults
    pub fn apply_defaults(&mut self) {
        if self.http.base_url.is_empty() {
            self.http.base_url = default_base_url();
        }
        if self.http.timeout_seconds == 0 {
            self.http.timeout_seconds = default_timeout();
        }
        if self.http.user_agent.is_empty() {
            self.http.user_agent = default_user_agent();
        }
        if self.cache.archive_max_age_days == 0 {
            self.cache.archive_max_age_days = default_archive_max_age_days();
        }
        if self.cache.coordinate_store.is_empty() {
            self.cache.coordinate_store = default_coordinate_store();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.defaults.language.is_empty() {
            self.defaults.language = default_language();
        }
        if self.defaults.variant.is_empty() {
            self.defaults.variant = default_variant();
        }
        if self.defaults.format.is_empty() {
            self.defaults.format = default_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.http.timeout_seconds > 300 {
            return Err(YrError::config("HTTP timeout cannot exceed 300 seconds"));
        }

        if self.cache.archive_max_age_days > 365 {
            return Err(YrError::config(
                "Archive max age cannot exceed 365 days",
            ));
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(YrError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(YrError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            )));
        }

        let valid_formats = ["xml", "json"];
        if !valid_formats.contains(&self.defaults.format.as_str()) {
            return Err(YrError::config(format!(
                "Invalid payload format '{}'. Must be one of: {}",
                self.defaults.format,
                valid_formats.join(", ")
            )));
        }

        if !self.http.base_url.starts_with("http://") && !self.http.base_url.starts_with("https://")
        {
            return Err(YrError::config(
                "Forecast base URL must be a valid HTTP or HTTPS URL",
            ));
        }

        if self.cache.coordinate_store.contains(['/', '\\']) {
            return Err(YrError::config(
                "Coordinate store name must be a plain file name",
            ));
        }

        Ok(())
    }
}
