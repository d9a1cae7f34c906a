//! Forecast payload shapes
//!
//! The provider serves the classic `weatherdata` document either as XML or as
//! its JSON rendering (attributes as `@`-prefixed keys). Both carry the
//! provider's next update instant in `meta`, and the forecast intervals in
//! `product/time`.

use crate::models::{
    ForecastEntry, Precipitation, Symbol, Temperature, WindDirection, WindSpeed,
};
use crate::{Result, YrError};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::debug;

const NEXTUPDATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A parsed forecast payload
#[derive(Debug)]
pub enum Payload {
    LegacyXml(XmlWeatherdata),
    ModernJson(JsonWeatherdata),
}

impl Payload {
    /// Parse either shape, chosen by the first non-blank character
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim_start_matches('\u{feff}').trim_start();
        if trimmed.starts_with('<') {
            let doc = quick_xml::de::from_str(trimmed)
                .map_err(|e| YrError::payload(format!("invalid XML payload: {e}")))?;
            Ok(Payload::LegacyXml(doc))
        } else if trimmed.starts_with('{') {
            let envelope: JsonEnvelope = serde_json::from_str(trimmed)
                .map_err(|e| YrError::payload(format!("invalid JSON payload: {e}")))?;
            Ok(Payload::ModernJson(envelope.weatherdata))
        } else {
            Err(YrError::payload("payload is neither XML nor JSON"))
        }
    }

    /// Local wall-clock instant at which the provider publishes new data.
    ///
    /// `Ok(None)` when the payload carries no recognizable update marker.
    pub fn next_update(&self) -> Result<Option<DateTime<Local>>> {
        match self {
            Payload::LegacyXml(doc) => doc.next_update(),
            Payload::ModernJson(doc) => doc.next_update(),
        }
    }

    /// Forecast intervals in document order
    pub fn entries(&self) -> Result<Vec<ForecastEntry>> {
        let times: &[TimeEntry] = match self {
            Payload::LegacyXml(doc) => doc
                .product
                .as_ref()
                .map(|product| product.time.as_slice())
                .unwrap_or_default(),
            Payload::ModernJson(doc) => doc
                .product
                .as_ref()
                .map(|product| product.time.as_slice())
                .unwrap_or_default(),
        };
        times.iter().map(TimeEntry::to_entry).collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct XmlWeatherdata {
    meta: Option<XmlMeta>,
    product: Option<XmlProduct>,
}

#[derive(Debug, Deserialize)]
struct XmlMeta {
    #[serde(default)]
    model: Vec<Model>,
    nextupdate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct XmlProduct {
    #[serde(default)]
    time: Vec<TimeEntry>,
}

impl XmlWeatherdata {
    fn next_update(&self) -> Result<Option<DateTime<Local>>> {
        let Some(meta) = &self.meta else {
            return Ok(None);
        };
        next_update_from(meta.model.first(), meta.nextupdate.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct JsonEnvelope {
    weatherdata: JsonWeatherdata,
}

#[derive(Debug, Deserialize)]
pub struct JsonWeatherdata {
    meta: Option<JsonMeta>,
    product: Option<JsonProduct>,
}

#[derive(Debug, Deserialize)]
struct JsonMeta {
    model: Option<OneOrMany<Model>>,
    nextupdate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JsonProduct {
    #[serde(default)]
    time: OneOrMany<TimeEntry>,
}

impl JsonWeatherdata {
    fn next_update(&self) -> Result<Option<DateTime<Local>>> {
        let Some(meta) = &self.meta else {
            return Ok(None);
        };
        let model = meta.model.as_ref().and_then(|model| model.as_slice().first());
        next_update_from(model, meta.nextupdate.as_deref())
    }
}

/// A single object or a list of them; the JSON rendering does not wrap lone
/// elements in a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::One(item) => std::slice::from_ref(item),
            OneOrMany::Many(items) => items,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Model {
    #[serde(rename = "@name")]
    name: Option<String>,
    #[serde(rename = "@nextrun")]
    nextrun: Option<String>,
}

fn next_update_from(
    model: Option<&Model>,
    nextupdate: Option<&str>,
) -> Result<Option<DateTime<Local>>> {
    if let Some(model) = model {
        if let Some(nextrun) = &model.nextrun {
            debug!(
                "model {} runs next at {}",
                model.name.as_deref().unwrap_or("?"),
                nextrun
            );
            return parse_nextrun(nextrun).map(Some);
        }
    }
    match nextupdate {
        Some(nextupdate) => parse_nextupdate(nextupdate).map(Some),
        None => Ok(None),
    }
}

/// `nextrun` is UTC, e.g. `2022-01-05T22:00:00Z`
fn parse_nextrun(value: &str) -> Result<DateTime<Local>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|instant| instant.with_timezone(&Local))
        .map_err(|e| YrError::payload(format!("invalid nextrun {value:?}: {e}")))
}

/// Legacy `nextupdate` is local wall-clock time without a zone
fn parse_nextupdate(value: &str) -> Result<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(value.trim(), NEXTUPDATE_FORMAT)
        .map_err(|e| YrError::payload(format!("invalid nextupdate {value:?}: {e}")))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| YrError::payload(format!("nextupdate {value:?} does not exist locally")))
}

#[derive(Debug, Deserialize)]
struct TimeEntry {
    #[serde(rename = "@from")]
    from: String,
    #[serde(rename = "@to")]
    to: String,
    location: Option<TimeLocation>,
}

#[derive(Debug, Deserialize)]
struct TimeLocation {
    temperature: Option<RawMeasure>,
    #[serde(rename = "windDirection")]
    wind_direction: Option<RawWindDirection>,
    #[serde(rename = "windSpeed")]
    wind_speed: Option<RawWindSpeed>,
    precipitation: Option<RawMeasure>,
    symbol: Option<RawSymbol>,
}

// Attribute values stay strings: the JSON rendering quotes every number.
#[derive(Debug, Deserialize)]
struct RawMeasure {
    #[serde(rename = "@value")]
    value: Option<String>,
    #[serde(rename = "@unit")]
    unit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawWindDirection {
    #[serde(rename = "@deg")]
    deg: Option<String>,
    #[serde(rename = "@name")]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawWindSpeed {
    #[serde(rename = "@mps")]
    mps: Option<String>,
    #[serde(rename = "@beaufort")]
    beaufort: Option<String>,
    #[serde(rename = "@name")]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSymbol {
    #[serde(rename = "@id")]
    id: Option<String>,
    #[serde(rename = "@number")]
    number: Option<String>,
}

fn number<T: std::str::FromStr>(value: Option<&String>) -> Option<T> {
    value.and_then(|v| v.trim().parse().ok())
}

fn parse_instant(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|e| YrError::payload(format!("invalid interval bound {value:?}: {e}")))
}

impl TimeEntry {
    fn to_entry(&self) -> Result<ForecastEntry> {
        let from = parse_instant(&self.from)?;
        let to = parse_instant(&self.to)?;

        let Some(location) = &self.location else {
            return Ok(ForecastEntry {
                from,
                to,
                temperature: None,
                wind_direction: None,
                wind_speed: None,
                precipitation: None,
                symbol: None,
            });
        };

        let temperature = location.temperature.as_ref().and_then(|raw| {
            Some(Temperature {
                value: number(raw.value.as_ref())?,
                unit: raw.unit.clone().unwrap_or_else(|| "celsius".to_string()),
            })
        });
        let wind_direction = location.wind_direction.as_ref().and_then(|raw| {
            Some(WindDirection {
                degrees: number(raw.deg.as_ref())?,
                name: raw.name.clone(),
            })
        });
        let wind_speed = location.wind_speed.as_ref().and_then(|raw| {
            Some(WindSpeed {
                mps: number(raw.mps.as_ref())?,
                beaufort: number(raw.beaufort.as_ref()),
                name: raw.name.clone(),
            })
        });
        let precipitation = location.precipitation.as_ref().and_then(|raw| {
            Some(Precipitation {
                value: number(raw.value.as_ref())?,
                unit: raw.unit.clone().unwrap_or_else(|| "mm".to_string()),
            })
        });
        let symbol = location.symbol.as_ref().and_then(|raw| {
            Some(Symbol {
                id: raw.id.clone()?,
                number: number(raw.number.as_ref()),
            })
        });

        Ok(ForecastEntry {
            from,
            to,
            temperature,
            wind_direction,
            wind_speed,
            precipitation,
            symbol,
        })
    }
}
