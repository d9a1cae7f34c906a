//! Language dictionaries
//!
//! A dictionary names the forecast variant links, picks the place name lookup
//! archive, and carries the attribution that has to accompany the data.

use crate::models::ForecastVariant;
use crate::{Result, YrError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{error, info};

const EN: &str = include_str!("../languages/en.json");
const NB: &str = include_str!("../languages/nb.json");

/// Attribution required by yr.no
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credit {
    pub text: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    #[serde(skip)]
    pub name: String,
    pub forecast: String,
    pub forecast_hour_by_hour: String,
    pub location_zip_url: String,
    pub credit: Credit,
}

impl Language {
    /// Load `name`, from `languages_dir/<name>.json` when a directory is given,
    /// otherwise from the dictionaries shipped with the crate.
    pub fn load(name: &str, languages_dir: Option<&Path>) -> Result<Self> {
        match languages_dir {
            Some(dir) => Self::from_file(name, &dir.join(format!("{name}.json"))),
            None => Self::builtin(name),
        }
    }

    pub fn builtin(name: &str) -> Result<Self> {
        let source = match name {
            "en" => EN,
            "nb" => NB,
            _ => {
                error!("No built-in language dictionary named {}", name);
                return Err(YrError::config(format!(
                    "Unknown language '{name}'. Built-in languages: en, nb"
                )));
            }
        };
        Self::parse(name, source)
    }

    pub fn from_file(name: &str, path: &Path) -> Result<Self> {
        info!("read language dictionary: {}", path.display());
        let source = std::fs::read_to_string(path).map_err(|e| {
            error!("Cannot read language dictionary {}: {}", path.display(), e);
            YrError::config(format!(
                "Cannot read language dictionary {}: {e}",
                path.display()
            ))
        })?;
        Self::parse(name, &source)
    }

    fn parse(name: &str, source: &str) -> Result<Self> {
        let mut language: Language = serde_json::from_str(source).map_err(|e| {
            error!("Invalid language dictionary {}: {}", name, e);
            YrError::config(format!("Invalid language dictionary '{name}': {e}"))
        })?;
        language.name = name.to_string();
        Ok(language)
    }

    /// Translated link name of a forecast variant
    #[must_use]
    pub fn link(&self, variant: ForecastVariant) -> &str {
        match variant {
            ForecastVariant::Standard => &self.forecast,
            ForecastVariant::HourByHour => &self.forecast_hour_by_hour,
        }
    }

    /// File name of the lookup archive, taken from the last URL segment
    #[must_use]
    pub fn archive_file_name(&self) -> &str {
        self.location_zip_url
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .unwrap_or("locations.csv.zip")
    }
}
