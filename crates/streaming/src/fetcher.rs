use std::sync::Arc;

use foundation::{Bounds, Coordinate};
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use raster::Bitmap;
use tracing::{debug, warn};

use crate::io::{BackingStore, BoxFuture, FetchError, PixelSource, TileError, TileSource};
use crate::key::TileKey;
use crate::pixels::Pixel;
use crate::queue::TileFetch;

/// Work handed from the data layer to the fetcher.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FetchJob {
    Tile(TileFetch),
    Region(Bounds),
}

/// Outcome of a [`FetchJob`], applied back to the data layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Tile {
        key: TileKey,
        result: Result<Bitmap, TileError>,
    },
    Region {
        bounds: Bounds,
        result: Result<Vec<(Coordinate, Pixel)>, FetchError>,
    },
}

/// Runs fetch jobs concurrently against the host's collaborators.
///
/// Any number of jobs for different keys may be in flight; the cache already
/// guarantees at most one per key. Tiles are decoded inside the job, off the
/// render path, and persisted to the backing store: the encoded bytes on
/// success, an empty marker on failure. Store errors are logged and otherwise
/// ignored, so a broken store degrades to memory-only operation.
pub struct Fetcher {
    tiles_url: String,
    tiles: Arc<dyn TileSource>,
    pixels: Option<Arc<dyn PixelSource>>,
    store: Arc<dyn BackingStore>,
    in_flight: FuturesUnordered<BoxFuture<'static, Completion>>,
}

impl Fetcher {
    pub fn new(tiles_url: impl Into<String>, tiles: Arc<dyn TileSource>, store: Arc<dyn BackingStore>) -> Self {
        Self {
            tiles_url: tiles_url.into(),
            tiles,
            pixels: None,
            store,
            in_flight: FuturesUnordered::new(),
        }
    }

    pub fn with_pixel_source(mut self, pixels: Arc<dyn PixelSource>) -> Self {
        self.pixels = Some(pixels);
        self
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Load every stored tile in one pass.
    ///
    /// Empty markers come back as [`TileError::KnownAbsent`], undecodable
    /// bytes as [`TileError::Decode`]. Keys that are not tile keys are skipped.
    pub async fn restore(&self) -> Vec<(TileKey, Result<Bitmap, TileError>)> {
        let names = match self.store.list_keys().await {
            Ok(names) => names,
            Err(err) => {
                warn!(error = %err, "backing store unavailable, starting empty");
                return Vec::new();
            }
        };

        let mut restored = Vec::with_capacity(names.len());
        for name in names {
            let key = match name.parse::<TileKey>() {
                Ok(key) => key,
                Err(err) => {
                    debug!(error = %err, "skipping foreign store key");
                    continue;
                }
            };
            let result = match self.store.get(&name).await {
                Ok(Some(bytes)) if bytes.is_empty() => Err(TileError::KnownAbsent),
                Ok(Some(bytes)) => Bitmap::decode(&bytes).map_err(TileError::from),
                Ok(None) => continue,
                Err(err) => {
                    warn!(%key, error = %err, "stored tile could not be read");
                    continue;
                }
            };
            restored.push((key, result));
        }
        debug!(tiles = restored.len(), "restored tiles from store");
        restored
    }

    pub fn start(&mut self, job: FetchJob) {
        let fut = match job {
            FetchJob::Tile(fetch) => self.tile_job(fetch),
            FetchJob::Region(bounds) => self.region_job(bounds),
        };
        self.in_flight.push(fut);
    }

    pub fn start_all(&mut self, jobs: impl IntoIterator<Item = FetchJob>) {
        for job in jobs {
            self.start(job);
        }
    }

    /// Next finished job, or `None` when nothing is in flight.
    pub async fn next(&mut self) -> Option<Completion> {
        self.in_flight.next().await
    }

    fn tile_job(&self, fetch: TileFetch) -> BoxFuture<'static, Completion> {
        let tiles = Arc::clone(&self.tiles);
        let store = Arc::clone(&self.store);
        let url = fetch.key.url(&self.tiles_url);

        Box::pin(async move {
            let key = fetch.key;
            let name = key.to_string();

            if fetch.from_store {
                match store.get(&name).await {
                    Ok(Some(bytes)) if !bytes.is_empty() => match Bitmap::decode(&bytes) {
                        Ok(bitmap) => {
                            return Completion::Tile {
                                key,
                                result: Ok(bitmap),
                            };
                        }
                        Err(err) => warn!(%key, error = %err, "stored tile could not be decoded"),
                    },
                    Ok(_) => {}
                    Err(err) => warn!(%key, error = %err, "stored tile could not be read"),
                }
            }

            let result = match tiles.fetch(&url).await {
                Ok(bytes) => match Bitmap::decode(&bytes) {
                    Ok(bitmap) => {
                        persist(store.as_ref(), &name, bytes).await;
                        Ok(bitmap)
                    }
                    Err(err) => {
                        warn!(%key, error = %err, "tile could not be decoded");
                        persist(store.as_ref(), &name, Vec::new()).await;
                        Err(TileError::Decode(err))
                    }
                },
                Err(err) => {
                    if err != FetchError::NotFound {
                        warn!(%key, %url, error = %err, "tile fetch failed");
                    }
                    persist(store.as_ref(), &name, Vec::new()).await;
                    Err(TileError::Fetch(err))
                }
            };
            Completion::Tile { key, result }
        })
    }

    fn region_job(&self, bounds: Bounds) -> BoxFuture<'static, Completion> {
        let Some(pixels) = self.pixels.as_ref().map(Arc::clone) else {
            return Box::pin(async move {
                Completion::Region {
                    bounds,
                    result: Ok(Vec::new()),
                }
            });
        };
        Box::pin(async move {
            let result = pixels.query_region(bounds).await;
            Completion::Region { bounds, result }
        })
    }
}

async fn persist(store: &dyn BackingStore, name: &str, bytes: Vec<u8>) {
    if let Err(err) = store.set(name, bytes).await {
        warn!(key = name, error = %err, "tile could not be persisted");
    }
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("tiles_url", &self.tiles_url)
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}
