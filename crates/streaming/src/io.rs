//! Collaborator capabilities consumed by the data layer.
//!
//! The tile cache and pixel store never perform I/O themselves. These traits
//! describe what the host provides: a tile image source, a pixel region
//! source and a persistent key/value store. Methods return boxed futures so
//! the traits stay dyn-compatible.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use foundation::{Bounds, Coordinate};
use raster::DecodeError;

use crate::pixels::Pixel;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Tile or pixel region fetch failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    NotFound,
    Status(u16),
    Network(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::NotFound => write!(f, "not found"),
            FetchError::Status(code) => write!(f, "unexpected status {code}"),
            FetchError::Network(msg) => write!(f, "network error: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Why a tile ended up `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileError {
    Fetch(FetchError),
    Decode(DecodeError),
    /// The backing store holds an empty marker from an earlier failure.
    KnownAbsent,
}

impl std::fmt::Display for TileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TileError::Fetch(e) => write!(f, "tile fetch failed: {e}"),
            TileError::Decode(e) => write!(f, "tile decode failed: {e}"),
            TileError::KnownAbsent => write!(f, "tile is known to be absent"),
        }
    }
}

impl std::error::Error for TileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TileError::Fetch(e) => Some(e),
            TileError::Decode(e) => Some(e),
            TileError::KnownAbsent => None,
        }
    }
}

impl From<FetchError> for TileError {
    fn from(e: FetchError) -> Self {
        TileError::Fetch(e)
    }
}

impl From<DecodeError> for TileError {
    fn from(e: DecodeError) -> Self {
        TileError::Decode(e)
    }
}

/// Backing-store failure. Absorbed by the fetcher; the session then runs
/// memory-only for the affected key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Io(String),
    InvalidKey(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(msg) => write!(f, "store i/o error: {msg}"),
            StoreError::InvalidKey(key) => write!(f, "invalid store key {key:?}"),
        }
    }
}

impl std::error::Error for StoreError {}

pub trait TileSource: Send + Sync {
    /// Fetch the encoded tile image at `url`.
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, FetchError>>;
}

pub trait PixelSource: Send + Sync {
    /// Every pixel inside a non-wrapping region.
    fn query_region(&self, bounds: Bounds) -> BoxFuture<'_, Result<Vec<(Coordinate, Pixel)>, FetchError>>;
}

/// Append/overwrite key/value store. Last write wins per key.
pub trait BackingStore: Send + Sync {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Vec<u8>>, StoreError>>;

    fn set<'a>(&'a self, key: &'a str, value: Vec<u8>) -> BoxFuture<'a, Result<(), StoreError>>;

    fn list_keys(&self) -> BoxFuture<'_, Result<Vec<String>, StoreError>>;
}

/// In-memory [`BackingStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
    failing: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every operation fails with [`StoreError::Io`].
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with_entries(entries: impl IntoIterator<Item = (String, Vec<u8>)>) -> Self {
        Self {
            entries: Mutex::new(entries.into_iter().collect()),
            failing: false,
        }
    }

    /// Synchronous read for inspection.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing {
            return Err(StoreError::Io("store unavailable".into()));
        }
        Ok(())
    }
}

impl BackingStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Vec<u8>>, StoreError>> {
        Box::pin(async move {
            self.check()?;
            Ok(self.lock().get(key).cloned())
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: Vec<u8>) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            self.check()?;
            self.lock().insert(key.to_string(), value);
            Ok(())
        })
    }

    fn list_keys(&self) -> BoxFuture<'_, Result<Vec<String>, StoreError>> {
        Box::pin(async move {
            self.check()?;
            Ok(self.lock().keys().cloned().collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{BackingStore, FetchError, MemoryStore, StoreError, TileError};
    use raster::DecodeError;

    #[tokio::test]
    async fn memory_store_overwrites_per_key() {
        let store = MemoryStore::new();
        store.set("a", vec![1]).await.unwrap();
        store.set("a", vec![2]).await.unwrap();
        store.set("b", vec![]).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(vec![2]));
        assert_eq!(store.get("missing").await.unwrap(), None);
        assert_eq!(store.list_keys().await.unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn failing_store_reports_io_errors() {
        let store = MemoryStore::failing();
        assert!(matches!(store.get("a").await, Err(StoreError::Io(_))));
        assert!(matches!(store.set("a", vec![]).await, Err(StoreError::Io(_))));
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn tile_errors_wrap_their_cause() {
        let e: TileError = FetchError::Status(503).into();
        assert_eq!(e.to_string(), "tile fetch failed: unexpected status 503");
        let e: TileError = DecodeError::Empty.into();
        assert!(std::error::Error::source(&e).is_some());
    }
}
