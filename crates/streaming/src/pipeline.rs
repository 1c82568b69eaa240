use foundation::Bounds;
use raster::Bitmap;
use runtime::budget::FrameBudget;

use crate::cache::{CacheConfig, TileCache};
use crate::fetcher::{Completion, FetchJob};
use crate::io::TileError;
use crate::key::TileKey;
use crate::pixels::PixelStore;
use crate::tileset::{Tileset, TilesetConfig, resolve};

/// The data layer: tile cache plus pixel store.
///
/// These two are the only shared mutable state. Everything else talks to them
/// through this narrow surface: resolve, drain jobs, apply completions,
/// invalidate.
#[derive(Debug, Default)]
pub struct Pipeline {
    tiles: TileCache,
    pixels: PixelStore,
}

impl Pipeline {
    pub fn new(cache: CacheConfig) -> Self {
        Self {
            tiles: TileCache::new(cache),
            pixels: PixelStore::new(),
        }
    }

    pub fn tiles(&self) -> &TileCache {
        &self.tiles
    }

    pub fn pixels(&self) -> &PixelStore {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut PixelStore {
        &mut self.pixels
    }

    pub fn tileset(&mut self, config: &TilesetConfig, scale: f64, bounds: Bounds) -> Tileset {
        resolve(&mut self.tiles, config, scale, bounds)
    }

    pub fn request_region(&mut self, bounds: Bounds) -> usize {
        self.pixels.request_region(bounds)
    }

    /// Pending work for the fetcher, pixel regions first, within the budget.
    pub fn drain_jobs(&mut self, budget: &mut FrameBudget) -> Vec<FetchJob> {
        let mut jobs: Vec<FetchJob> = self
            .pixels
            .drain_requests(budget)
            .into_iter()
            .map(FetchJob::Region)
            .collect();
        jobs.extend(self.tiles.drain_jobs(budget).into_iter().map(FetchJob::Tile));
        jobs
    }

    /// Apply a finished job. Returns `true` if anything visible may have changed.
    pub fn apply(&mut self, completion: Completion) -> bool {
        match completion {
            Completion::Tile { key, result } => self.tiles.complete(key, result),
            Completion::Region { bounds, result } => self.pixels.complete_region(bounds, result) > 0,
        }
    }

    pub fn invalidate(&mut self, key: &TileKey) -> bool {
        self.tiles.invalidate(key)
    }

    /// Seed the tile cache from a backing-store restore. Returns the number of
    /// entries filled.
    pub fn restore(&mut self, restored: impl IntoIterator<Item = (TileKey, Result<Bitmap, TileError>)>) -> usize {
        let mut filled = 0;
        for (key, result) in restored {
            if self.tiles.restore(key, result) {
                filled += 1;
            }
        }
        filled
    }
}
