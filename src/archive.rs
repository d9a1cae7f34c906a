//! Lookup archive cache
//!
//! yr.no publishes the place name to coordinate tables as one large zip file.
//! It is downloaded once and reused until the local copy is older than a fixed
//! number of days; its real update cadence is unknown and assumed to be rare.

use crate::http::HttpFetch;
use crate::{Result, YrError};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::NamedTempFile;
use tracing::{debug, error, info, instrument, warn};

const SECONDS_PER_DAY: u64 = 60 * 60 * 24;

/// Age of a file according to its modification time.
/// Files stamped in the future count as brand new.
pub fn file_age(path: &Path) -> Result<Duration> {
    let modified = fs::metadata(path)?.modified()?;
    let age = SystemTime::now()
        .duration_since(modified)
        .unwrap_or(Duration::ZERO);
    debug!(
        "file_age({}) -> {:.1} days",
        path.display(),
        age.as_secs_f64() / SECONDS_PER_DAY as f64
    );
    Ok(age)
}

/// Return `cache_path`, downloading `url` into it first unless a copy younger
/// than `max_age_days` already exists.
#[instrument(skip(http), level = "debug")]
pub fn fetch_archive(
    http: &dyn HttpFetch,
    url: &str,
    cache_path: &Path,
    max_age_days: u32,
) -> Result<PathBuf> {
    let max_age = Duration::from_secs(u64::from(max_age_days) * SECONDS_PER_DAY);

    if cache_path.is_file() {
        let age = file_age(cache_path)?;
        if age < max_age {
            info!(
                "returning cached {}, age = {} days",
                cache_path.display(),
                age.as_secs() / SECONDS_PER_DAY
            );
            return Ok(cache_path.to_path_buf());
        }
        info!("{} is stale, downloading again", cache_path.display());
    }

    let response = http.get(url).map_err(|e| match e {
        YrError::Network { message, .. } => YrError::archive_fetch(url, message),
        other => other,
    })?;
    if !response.is_ok() {
        error!(
            "Invalid response from {}, expected status 200, got {}",
            url, response.status
        );
        return Err(YrError::archive_fetch(
            url,
            format!("expected status 200, got {}", response.status),
        ));
    }

    if let Err(e) = write_atomically(cache_path, &response.body) {
        error!("Archive download failed, clearing cache: {}", e);
        if cache_path.exists() {
            if let Err(remove_err) = fs::remove_file(cache_path) {
                warn!(
                    "cannot remove stale archive {}: {}",
                    cache_path.display(),
                    remove_err
                );
            }
        }
        return Err(YrError::archive_fetch(
            url,
            format!("cannot write {}: {e}", cache_path.display()),
        ));
    }

    info!(
        "stored {} bytes from {} in {}",
        response.body.len(),
        url,
        cache_path.display()
    );
    Ok(cache_path.to_path_buf())
}

/// Write through a temp file in the target directory and rename it into place,
/// so readers never observe a half written file.
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
