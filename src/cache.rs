//! Forecast cache
//!
//! One file per (coordinate, variant, format). Freshness is not tracked on the
//! side: it is read from the provider's next update instant inside the cached
//! payload every time the file is consulted.

use crate::archive::write_atomically;
use crate::models::{Coordinate, PayloadFormat};
use crate::payload::Payload;
use crate::{Result, YrError};
use chrono::{DateTime, Local, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Identifies one cached forecast
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastKey {
    pub coordinate: Coordinate,
    /// Translated variant link name
    pub variant_link: String,
    pub format: PayloadFormat,
}

impl ForecastKey {
    #[must_use]
    pub fn new(coordinate: Coordinate, variant_link: &str, format: PayloadFormat) -> Self {
        Self {
            coordinate,
            variant_link: variant_link.to_string(),
            format,
        }
    }

    /// Stable hash of coordinate and forecast type
    #[must_use]
    pub fn hash(&self) -> String {
        format!("{}.{}", self.coordinate.cache_name(), self.variant_link)
    }

    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.hash(), self.format.extension())
    }
}

/// Directory of cached forecast payloads
#[derive(Debug, Clone)]
pub struct ForecastCache {
    directory: PathBuf,
}

impl ForecastCache {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    #[must_use]
    pub fn entry(&self, key: &ForecastKey) -> CacheEntry {
        CacheEntry {
            path: self.directory.join(key.file_name()),
        }
    }

    /// Return the cached payload for `key` while it is fresh, otherwise call
    /// `fetch` and overwrite the cache file with its result.
    #[instrument(skip(self, key, fetch), fields(key = %key.hash()))]
    pub fn get_or_refresh<F>(&self, key: &ForecastKey, fetch: F) -> Result<String>
    where
        F: FnOnce() -> Result<String>,
    {
        let entry = self.entry(key);
        if entry.is_fresh()? {
            return entry.load();
        }

        info!("cache miss or stale: {}", entry.path().display());
        let payload = fetch()?;
        entry.dump(&payload)?;
        Ok(payload)
    }
}

/// A single cache file
#[derive(Debug, Clone)]
pub struct CacheEntry {
    path: PathBuf,
}

impl CacheEntry {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn load(&self) -> Result<String> {
        debug!("read from cachefile: {}", self.path.display());
        Ok(fs::read_to_string(&self.path)?)
    }

    /// Replace the cached payload
    pub fn dump(&self, payload: &str) -> Result<()> {
        info!("writing cachefile: {}", self.path.display());
        write_atomically(&self.path, payload.as_bytes()).map_err(|e| {
            warn!("cannot write {}: {}", self.path.display(), e);
            YrError::from(e)
        })
    }

    pub fn remove(&self) -> Result<()> {
        if self.exists() {
            fs::remove_file(&self.path)?;
            info!("removed cachefile: {}", self.path.display());
        }
        Ok(())
    }

    /// When the cached payload stops being valid.
    ///
    /// A payload that does not decode or parse expired at the epoch; one
    /// without an update marker yields `None`.
    pub fn valid_until(&self) -> Result<Option<DateTime<Local>>> {
        let bytes = fs::read(&self.path)?;
        let parsed = std::str::from_utf8(&bytes)
            .map_err(|e| YrError::payload(format!("cachefile is not UTF-8: {e}")))
            .and_then(Payload::parse)
            .and_then(|payload| payload.next_update());
        let valid_until = match parsed {
            Ok(valid_until) => valid_until,
            Err(e) => {
                warn!("unreadable cachefile {}: {}", self.path.display(), e);
                Some(DateTime::<Utc>::UNIX_EPOCH.with_timezone(&Local))
            }
        };
        match &valid_until {
            Some(instant) => info!("Cache is valid until {}", instant),
            None => warn!("no next update marker in {}", self.path.display()),
        }
        Ok(valid_until)
    }

    pub fn is_fresh(&self) -> Result<bool> {
        self.is_fresh_at(Local::now())
    }

    /// Fresh while `now` has not passed the payload's next update instant
    pub fn is_fresh_at(&self, now: DateTime<Local>) -> Result<bool> {
        if !self.exists() {
            return Ok(false);
        }
        debug!("Now is {}", now);
        Ok(self.valid_until()?.is_some_and(|valid_until| now <= valid_until))
    }
}
