//! Forecast entries and the options that select which forecast product is requested

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which forecast product to present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ForecastVariant {
    /// Every interval the provider publishes
    #[default]
    Standard,
    /// Only intervals spanning exactly one hour
    HourByHour,
}

impl ForecastVariant {
    /// Parse a link key; anything unknown is the standard forecast
    #[must_use]
    pub fn from_link_key(key: &str) -> Self {
        match key {
            "forecast_hour_by_hour" => ForecastVariant::HourByHour,
            _ => ForecastVariant::Standard,
        }
    }

    #[must_use]
    pub fn includes(self, entry: &ForecastEntry) -> bool {
        match self {
            ForecastVariant::Standard => true,
            ForecastVariant::HourByHour => entry.duration() == Duration::hours(1),
        }
    }
}

/// Wire format of the forecast payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PayloadFormat {
    #[default]
    Xml,
    Json,
}

impl PayloadFormat {
    /// Endpoint path below the API base URL.
    ///
    /// `classic.json` is this crate's own choice for the JSON rendering of the
    /// classic document, not a path met.no documents; point `http.base_url` at
    /// a service that serves it.
    #[must_use]
    pub fn endpoint(self) -> &'static str {
        match self {
            PayloadFormat::Xml => "classic",
            PayloadFormat::Json => "classic.json",
        }
    }

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            PayloadFormat::Xml => "xml",
            PayloadFormat::Json => "json",
        }
    }

    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "xml" => Some(PayloadFormat::Xml),
            "json" => Some(PayloadFormat::Json),
            _ => None,
        }
    }
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Weather for one time interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Temperature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_direction: Option<WindDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<WindSpeed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<Precipitation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<Symbol>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub value: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindDirection {
    /// Degrees, 0 is North
    pub degrees: f64,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindSpeed {
    pub mps: f64,
    pub beaufort: Option<u8>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Precipitation {
    pub value: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: String,
    pub number: Option<u32>,
}

impl ForecastEntry {
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.to - self.from
    }

    /// Instant readings have `from == to`
    #[must_use]
    pub fn is_instant(&self) -> bool {
        self.from == self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(from_hour: u32, to_hour: u32) -> ForecastEntry {
        ForecastEntry {
            from: Utc.with_ymd_and_hms(2022, 1, 5, from_hour, 0, 0).unwrap(),
            to: Utc.with_ymd_and_hms(2022, 1, 5, to_hour, 0, 0).unwrap(),
            temperature: None,
            wind_direction: None,
            wind_speed: None,
            precipitation: None,
            symbol: None,
        }
    }

    #[test]
    fn test_hour_by_hour_keeps_one_hour_intervals() {
        assert!(ForecastVariant::HourByHour.includes(&entry(18, 19)));
        assert!(!ForecastVariant::HourByHour.includes(&entry(18, 18)));
        assert!(!ForecastVariant::HourByHour.includes(&entry(18, 21)));
        assert!(ForecastVariant::Standard.includes(&entry(18, 18)));
    }

    #[test]
    fn test_unknown_variant_falls_back_to_standard() {
        assert_eq!(
            ForecastVariant::from_link_key("forecast_hour_by_hour"),
            ForecastVariant::HourByHour
        );
        assert_eq!(
            ForecastVariant::from_link_key("weekly"),
            ForecastVariant::Standard
        );
    }

    #[test]
    fn test_payload_format_names() {
        assert_eq!(PayloadFormat::parse("json"), Some(PayloadFormat::Json));
        assert_eq!(PayloadFormat::parse("yaml"), None);
        assert_eq!(PayloadFormat::Xml.endpoint(), "classic");
        assert_eq!(PayloadFormat::Json.endpoint(), "classic.json");
        assert_eq!(PayloadFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_entry_serializes_without_empty_fields() {
        let json = serde_json::to_string(&entry(18, 19)).unwrap();
        assert!(json.contains("\"from\""));
        assert!(!json.contains("temperature"));
    }
}
