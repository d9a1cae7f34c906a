//! Persistent coordinate store
//!
//! Resolved coordinates are kept forever, keyed by the exact arguments of the
//! resolution call. Nothing ever expires or invalidates an entry; fixing a bad
//! one means removing the store from disk.

use crate::models::Coordinate;
use crate::{Result, YrError};
use fjall::Keyspace;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Arguments of a resolution call, used verbatim as the store key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolutionKey {
    pub archive_url: String,
    pub archive_cache_path: PathBuf,
    pub location_path: String,
}

impl ResolutionKey {
    #[must_use]
    pub fn new(archive_url: &str, archive_cache_path: &Path, location_path: &str) -> Self {
        Self {
            archive_url: archive_url.to_string(),
            archive_cache_path: archive_cache_path.to_path_buf(),
            location_path: location_path.to_string(),
        }
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(postcard::to_stdvec(self)?)
    }
}

pub trait CoordinateStore {
    fn get(&self, key: &ResolutionKey) -> Result<Option<Coordinate>>;
    fn put(&self, key: &ResolutionKey, coordinate: &Coordinate) -> Result<()>;
}

/// On-disk store backed by a fjall keyspace, values encoded with postcard
pub struct FjallCoordinateStore {
    store: Keyspace,
}

impl FjallCoordinateStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(&path).open()?;
        let items = db.keyspace("coordinates", fjall::KeyspaceCreateOptions::default)?;
        Ok(FjallCoordinateStore { store: items })
    }
}

impl CoordinateStore for FjallCoordinateStore {
    #[tracing::instrument(name = "query_coordinates", level = "debug", skip(self))]
    fn get(&self, key: &ResolutionKey) -> Result<Option<Coordinate>> {
        match self.store.get(key.to_bytes()?)? {
            Some(bytes) => {
                debug!("Key found");
                let coordinate = postcard::from_bytes(&bytes)?;
                Ok(Some(coordinate))
            }
            None => {
                debug!("Key not found");
                Ok(None)
            }
        }
    }

    #[tracing::instrument(name = "put_coordinates", level = "debug", skip(self))]
    fn put(&self, key: &ResolutionKey, coordinate: &Coordinate) -> Result<()> {
        let bytes = postcard::to_stdvec(coordinate)?;
        self.store.insert(key.to_bytes()?, bytes)?;
        Ok(())
    }
}

/// Process local store, for tests and callers that do not want disk state
#[derive(Default)]
pub struct MemoryCoordinateStore {
    entries: Mutex<HashMap<ResolutionKey, Coordinate>>,
}

impl MemoryCoordinateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CoordinateStore for MemoryCoordinateStore {
    fn get(&self, key: &ResolutionKey) -> Result<Option<Coordinate>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| YrError::cache("coordinate store lock poisoned"))?;
        Ok(entries.get(key).copied())
    }

    fn put(&self, key: &ResolutionKey, coordinate: &Coordinate) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| YrError::cache("coordinate store lock poisoned"))?;
        entries.insert(key.clone(), *coordinate);
        Ok(())
    }
}
