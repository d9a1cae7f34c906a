//! Location Resolution Module
//!
//! Resolves a slash delimited place name such as
//! `Czech_Republic/Prague/Prague` to coordinates using the lookup archive
//! published by yr.no. The archive holds one tab separated table per country,
//! `<place name>\t<lat=..&lon=..&altitude=..>`.
//!
//! Scanning the archive is slow, so every resolved coordinate is remembered
//! in a [`CoordinateStore`] keyed by the call arguments.

use crate::archive::fetch_archive;
use crate::http::HttpFetch;
use crate::models::Coordinate;
use crate::store::{CoordinateStore, ResolutionKey};
use crate::{Result, YrError};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, error, info, instrument};
use zip::ZipArchive;

/// Resolver over a borrowed transport and coordinate store
pub struct LocationResolver<'a> {
    http: &'a dyn HttpFetch,
    store: &'a dyn CoordinateStore,
    archive_max_age_days: u32,
}

impl<'a> LocationResolver<'a> {
    pub fn new(
        http: &'a dyn HttpFetch,
        store: &'a dyn CoordinateStore,
        archive_max_age_days: u32,
    ) -> Self {
        Self {
            http,
            store,
            archive_max_age_days,
        }
    }

    /// Resolve `location_path`, consulting the coordinate store first
    #[instrument(skip(self))]
    pub fn resolve(
        &self,
        location_path: &str,
        archive_url: &str,
        archive_cache_path: &Path,
    ) -> Result<Coordinate> {
        let key = ResolutionKey::new(archive_url, archive_cache_path, location_path);
        if let Some(coordinate) = self.store.get(&key)? {
            debug!("Returning stored coordinate for {}", location_path);
            return Ok(coordinate);
        }

        let archive = fetch_archive(
            self.http,
            archive_url,
            archive_cache_path,
            self.archive_max_age_days,
        )?;
        let coordinate = search_archive(&archive, location_path)?;

        self.store.put(&key, &coordinate)?;
        info!("{}({}) -> {:?}", archive_url, location_path, coordinate);
        Ok(coordinate)
    }
}

/// Case-fold and replace spaces with underscores
#[must_use]
pub fn normalize_location_path(location_path: &str) -> String {
    location_path.to_lowercase().replace(' ', "_")
}

/// Leading segment of a normalized location path
#[must_use]
pub fn country_of(normalized: &str) -> &str {
    normalized.split('/').next().unwrap_or_default()
}

/// Search the country tables of a lookup archive for `location_path`
pub fn search_archive(archive_path: &Path, location_path: &str) -> Result<Coordinate> {
    let location = normalize_location_path(location_path);
    let search_for = format!("{}.csv", country_of(&location));

    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| {
        error!("Cannot open {}: {}", archive_path.display(), e);
        YrError::archive(format!("{}: {e}", archive_path.display()))
    })?;

    let tables: Vec<String> = archive
        .file_names()
        .filter(|name| name.ends_with(&search_for))
        .map(str::to_string)
        .collect();

    info!("searching {:?}", tables);
    if tables.is_empty() {
        error!(
            "Unable to find {} in {}",
            search_for,
            archive_path.display()
        );
        return Err(YrError::LocationNotFound {
            location,
            searched: format!("{} (no {search_for} table)", archive_path.display()),
        });
    }

    let mut matches = Vec::new();
    for name in &tables {
        let table = archive.by_name(name).map_err(|e| {
            error!("Cannot read {} from {}: {}", name, archive_path.display(), e);
            YrError::archive(format!("{name}: {e}"))
        })?;
        if let Some(coordinate) = search_table(table, &location)? {
            matches.push((name.clone(), coordinate));
        }
    }

    match matches.len() {
        0 => {
            error!("Unable to find {} in {:?}", location, tables);
            Err(YrError::LocationNotFound {
                location,
                searched: tables.join(", "),
            })
        }
        1 => Ok(matches.remove(0).1),
        _ => {
            error!("Multiple matches for {} in {:?}", location, tables);
            Err(YrError::AmbiguousLocation {
                location,
                tables: matches.into_iter().map(|(name, _)| name).collect(),
            })
        }
    }
}

/// First row whose name column equals `location`, parsed into a coordinate
pub fn search_table<R: Read>(table: R, location: &str) -> Result<Option<Coordinate>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(table);

    for record in reader.records() {
        let record = record.map_err(|e| {
            error!("Unreadable lookup table row: {}", e);
            YrError::archive(e.to_string())
        })?;
        if record.get(0) != Some(location) {
            continue;
        }

        let descriptor = record.get(1).unwrap_or_default();
        return match Coordinate::parse_descriptor(descriptor) {
            Some(coordinate) => Ok(Some(coordinate)),
            None => {
                error!(
                    "Expected lat/lon/altitude descriptor for {}, got {:?}",
                    location, descriptor
                );
                Err(YrError::MalformedCoordinate {
                    location: location.to_string(),
                    descriptor: descriptor.to_string(),
                })
            }
        };
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCoordinateStore;
    use crate::testing::{FakeHttp, zip_archive};
    use rstest::rstest;
    use std::fs;

    const URL: &str = "https://www.yr.no/storage/lookup/English.csv.zip";

    const CZECH: &str = "czech_republic/prague/prague\tlat=50.08804&lon=14.42076&altitude=202.0\n\
                         czech_republic/prague/prague\tlat=1&lon=1&altitude=1\n\
                         czech_republic/south_moravia/brno\tlat=49.19522&lon=16.60796&altitude=237.0\n";
    const NORGE: &str = "norge/telemark/skien/skien\tlat=59.20962&lon=9.60897&altitude=15.0\n\
                         norge/viken/nordre_follo/ski\tlat=59.71949&lon=10.8376&altitude=128.0\n\
                         norge/broken/place\tsomewhere\n";

    fn write_archive(dir: &Path, tables: &[(&str, &str)]) -> std::path::PathBuf {
        let path = dir.join("English.csv.zip");
        fs::write(&path, zip_archive(tables)).unwrap();
        path
    }

    #[rstest]
    #[case("Czech_Republic/Prague/Prague", 50.08804, 14.42076, 202.0)]
    #[case("czech_republic/south moravia/brno", 49.19522, 16.60796, 237.0)]
    #[case("Norge/Telemark/Skien/Skien", 59.20962, 9.60897, 15.0)]
    #[case("norge/telemark/skien/skien", 59.20962, 9.60897, 15.0)]
    #[case("Norge/Viken/Nordre Follo/Ski", 59.71949, 10.8376, 128.0)]
    fn test_search_archive(
        #[case] location: &str,
        #[case] lat: f64,
        #[case] lon: f64,
        #[case] altitude: f64,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let archive = write_archive(
            dir.path(),
            &[
                ("English/czech_republic.csv", CZECH),
                ("English/norge.csv", NORGE),
            ],
        );

        let coordinate = search_archive(&archive, location).unwrap();
        assert_eq!(coordinate, Coordinate::new(lat, lon, altitude));
    }

    #[test]
    fn test_unknown_place_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let archive = write_archive(dir.path(), &[("English/norge.csv", NORGE)]);

        let result = search_archive(&archive, "Norge/Telemark/Skien/Nowhere");
        assert!(matches!(result, Err(YrError::LocationNotFound { .. })));
    }

    #[test]
    fn test_unknown_country_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let archive = write_archive(dir.path(), &[("English/norge.csv", NORGE)]);

        let result = search_archive(&archive, "Atlantis/Capital");
        assert!(matches!(result, Err(YrError::LocationNotFound { .. })));
    }

    #[test]
    fn test_match_in_two_tables_is_ambiguous() {
        let dir = tempfile::tempdir().unwrap();
        let archive = write_archive(
            dir.path(),
            &[
                ("English/norge.csv", NORGE),
                ("Norsk/norge.csv", NORGE),
            ],
        );

        match search_archive(&archive, "Norge/Telemark/Skien/Skien") {
            Err(YrError::AmbiguousLocation { tables, .. }) => assert_eq!(tables.len(), 2),
            other => panic!("expected ambiguous location, got {other:?}"),
        }
    }

    #[test]
    fn test_two_tables_one_match_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let archive = write_archive(
            dir.path(),
            &[
                ("English/norge.csv", NORGE),
                ("Extra/norge.csv", "norge/other/place\tlat=1&lon=2&altitude=3\n"),
            ],
        );

        let coordinate = search_archive(&archive, "Norge/Other/Place").unwrap();
        assert_eq!(coordinate, Coordinate::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_malformed_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let archive = write_archive(dir.path(), &[("English/norge.csv", NORGE)]);

        let result = search_archive(&archive, "Norge/Broken/Place");
        assert!(matches!(result, Err(YrError::MalformedCoordinate { .. })));
    }

    #[test]
    fn test_corrupt_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("English.csv.zip");
        fs::write(&path, b"this is not a zip file").unwrap();

        let result = search_archive(&path, "Norge/Telemark/Skien/Skien");
        assert!(matches!(result, Err(YrError::Archive { .. })));
    }

    #[test]
    fn test_resolve_downloads_archive_and_remembers_result() {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("English.csv.zip");
        let http = FakeHttp::new().respond(
            URL,
            200,
            zip_archive(&[("English/czech_republic.csv", CZECH)]),
        );
        let store = MemoryCoordinateStore::new();
        let resolver = LocationResolver::new(&http, &store, 30);

        let first = resolver
            .resolve("Czech_Republic/Prague/Prague", URL, &cache_path)
            .unwrap();
        assert_eq!(first, Coordinate::new(50.08804, 14.42076, 202.0));
        assert_eq!(http.call_count(), 1);
        assert_eq!(store.len(), 1);

        // without the archive, only the store can answer
        fs::remove_file(&cache_path).unwrap();
        let second = resolver
            .resolve("Czech_Republic/Prague/Prague", URL, &cache_path)
            .unwrap();
        assert_eq!(second, first);
        assert_eq!(http.call_count(), 1);
        assert!(!cache_path.exists());
    }

    #[test]
    fn test_failed_resolution_stores_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = write_archive(dir.path(), &[("English/norge.csv", NORGE)]);
        let http = FakeHttp::new();
        let store = MemoryCoordinateStore::new();
        let resolver = LocationResolver::new(&http, &store, 30);

        let result = resolver.resolve("Norge/Nowhere", URL, &cache_path);
        assert!(matches!(result, Err(YrError::LocationNotFound { .. })));
        assert!(store.is_empty());
        assert_eq!(http.call_count(), 0);
    }

    #[test]
    fn test_normalize_location_path() {
        assert_eq!(
            normalize_location_path("Norge/Viken/Nordre Follo/Ski"),
            "norge/viken/nordre_follo/ski"
        );
        assert_eq!(country_of("czech_republic/prague/prague"), "czech_republic");
        assert_eq!(country_of(""), "");
    }
}
