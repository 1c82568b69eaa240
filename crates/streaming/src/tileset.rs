use foundation::math::{seam_span, snap_down};
use foundation::{Bounds, Coordinate, WORLD_SIZE};
use serde::Deserialize;
use tracing::warn;

use crate::cache::TileCache;
use crate::key::TileKey;
use crate::residency::TileCacheEntry;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TilesetConfig {
    /// Tile bitmap edge in pixels; also its world size at bucket 1.
    pub tile_size: u32,
    /// Scale (world cells per screen pixel) at which coarse tiles take over.
    pub bucket_threshold: f64,
    pub fine_bucket: u32,
    pub coarse_bucket: u32,
    /// Hard cap on tiles enumerated along one axis.
    pub max_tiles_per_axis: usize,
}

impl Default for TilesetConfig {
    fn default() -> Self {
        Self {
            tile_size: 100,
            bucket_threshold: 10.0,
            fine_bucket: 1,
            coarse_bucket: 10,
            max_tiles_per_axis: 256,
        }
    }
}

impl TilesetConfig {
    /// Quantize a continuous scale into a tile bucket.
    pub fn bucket_for(&self, scale: f64) -> u32 {
        if scale < self.bucket_threshold {
            self.fine_bucket
        } else {
            self.coarse_bucket
        }
    }
}

/// One cell of the tile grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSlot {
    pub key: TileKey,
    pub origin: Coordinate,
    /// Effective world size; shorter than a full tile only at the seam.
    pub span: [u32; 2],
    pub entry: TileCacheEntry,
}

/// What to draw for one view, recomputed per render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tileset {
    pub tile_size: u32,
    pub scale_factor: u32,
    /// Grid-snapped, inclusive.
    pub bounds: Bounds,
    /// Indexed `[x][y]`, both in world order starting at the snapped top-left.
    pub tile_rows: Vec<Vec<TileSlot>>,
}

impl Tileset {
    pub fn columns(&self) -> usize {
        self.tile_rows.len()
    }

    pub fn rows(&self) -> usize {
        self.tile_rows.first().map(Vec::len).unwrap_or(0)
    }

    pub fn slots(&self) -> impl Iterator<Item = &TileSlot> {
        self.tile_rows.iter().flatten()
    }
}

/// Tile origins covering `[begin, end]` on one axis, each with its span.
///
/// Steps from the snapped start by the tile stride, wrapping at `M`. The seam
/// tile gets its short span and is followed directly by the tile at 0.
fn axis_tiles(begin: u32, end: u32, stride: u32, max: usize) -> (Vec<(u32, u32)>, bool) {
    let first = snap_down(begin, stride);
    let last = snap_down(end, stride);
    let full_circle = end < begin && first == last;

    let mut tiles = Vec::new();
    let mut origin = first;
    loop {
        if tiles.len() == max {
            return (tiles, true);
        }
        let span = seam_span(origin, stride);
        tiles.push((origin, span));
        let next = ((origin as u64 + span as u64) % WORLD_SIZE) as u32;
        if origin == last && !(full_circle && tiles.len() == 1) {
            return (tiles, false);
        }
        origin = next;
        if origin == first {
            return (tiles, false);
        }
    }
}

/// Resolve the tile grid covering `bounds` at `scale` (world cells per pixel),
/// requesting every tile from the cache. Tiles nearer the middle of the grid
/// are queued first.
pub fn resolve(cache: &mut TileCache, config: &TilesetConfig, scale: f64, bounds: Bounds) -> Tileset {
    let bucket = config.bucket_for(scale);
    let stride = config.tile_size.saturating_mul(bucket).max(1);
    let max = config.max_tiles_per_axis.max(1);

    let (xs, cut_x) = axis_tiles(bounds.top_left.x, bounds.bottom_right.x, stride, max);
    let (ys, cut_y) = axis_tiles(bounds.top_left.y, bounds.bottom_right.y, stride, max);
    if cut_x || cut_y {
        warn!(?bounds, max, "tileset truncated");
    }

    let (cx, cy) = (xs.len() as i32 / 2, ys.len() as i32 / 2);
    let mut tile_rows = Vec::with_capacity(xs.len());
    for (ix, &(x, span_x)) in xs.iter().enumerate() {
        let mut column = Vec::with_capacity(ys.len());
        for (iy, &(y, span_y)) in ys.iter().enumerate() {
            let key = TileKey::new(bucket, config.tile_size, x, y);
            let priority = (ix as i32 - cx).abs() + (iy as i32 - cy).abs();
            let entry = cache.request(key, priority).clone();
            column.push(TileSlot {
                key,
                origin: Coordinate::new(x, y),
                span: [span_x, span_y],
                entry,
            });
        }
        tile_rows.push(column);
    }

    let corner = |tiles: &[(u32, u32)]| {
        let (first, _) = tiles[0];
        let (last, span) = tiles[tiles.len() - 1];
        (first, last + (span - 1))
    };
    let (left, right) = corner(&xs);
    let (top, bottom) = corner(&ys);

    Tileset {
        tile_size: config.tile_size,
        scale_factor: bucket,
        bounds: Bounds::from_corners(left, top, right, bottom),
        tile_rows,
    }
}

#[cfg(test)]
mod tests {
    use super::{TilesetConfig, axis_tiles, resolve};
    use crate::cache::TileCache;
    use crate::key::TileKey;
    use crate::residency::TileCacheEntry;
    use foundation::{Bounds, Coordinate, WORLD_SIZE};
    use pretty_assertions::assert_eq;
    use runtime::budget::FrameBudget;
    use tracing_test::traced_test;

    #[test]
    fn bucket_follows_the_threshold() {
        let config = TilesetConfig::default();
        assert_eq!(config.bucket_for(0.2), 1);
        assert_eq!(config.bucket_for(9.99), 1);
        assert_eq!(config.bucket_for(10.0), 10);
    }

    #[test]
    fn non_wrapping_bounds_stay_inside_the_snapped_extent() {
        let mut cache = TileCache::default();
        let tileset = resolve(
            &mut cache,
            &TilesetConfig::default(),
            1.0,
            Bounds::from_corners(150, 20, 420, 99),
        );
        assert_eq!(tileset.columns(), 4);
        assert_eq!(tileset.rows(), 1);
        assert_eq!(tileset.bounds, Bounds::from_corners(100, 0, 499, 99));
        for slot in tileset.slots() {
            assert!(slot.origin.x >= 100 && slot.origin.x <= 400);
            assert_eq!(slot.origin.y, 0);
            assert_eq!(slot.span, [100, 100]);
            assert_eq!(slot.entry, TileCacheEntry::Pending);
        }
        assert_eq!(cache.queued(), 4);
    }

    #[test]
    fn seam_tile_is_enumerated_once_with_short_width() {
        let mut cache = TileCache::default();
        let tileset = resolve(
            &mut cache,
            &TilesetConfig::default(),
            1.0,
            Bounds::from_corners(4_294_967_200, 0, 50, 50),
        );
        let xs: Vec<_> = tileset.tile_rows.iter().map(|col| (col[0].origin.x, col[0].span[0])).collect();
        assert_eq!(xs, vec![(4_294_967_200, (WORLD_SIZE % 100) as u32), (0, 100)]);
        assert_eq!(tileset.tile_rows[0][0].key, TileKey::new(1, 100, 4_294_967_200, 0));
        assert_eq!(tileset.bounds, Bounds::from_corners(4_294_967_200, 0, 99, 99));
    }

    #[test]
    fn seam_straddle_on_both_axes() {
        let (xs, cut) = axis_tiles(u32::MAX, 0, 100, 16);
        assert!(!cut);
        assert_eq!(xs, vec![(4_294_967_200, 96), (0, 100)]);

        let (ys, _) = axis_tiles(4_294_967_000, 250, 100, 16);
        assert_eq!(
            ys,
            vec![(4_294_967_000, 100), (4_294_967_100, 100), (4_294_967_200, 96), (0, 100), (100, 100), (200, 100)]
        );
    }

    #[test]
    fn coarse_bucket_uses_wider_tiles() {
        let mut cache = TileCache::default();
        let tileset = resolve(
            &mut cache,
            &TilesetConfig::default(),
            20.0,
            Bounds::from_corners(4_294_966_000, 0, 1_500, 0),
        );
        assert_eq!(tileset.scale_factor, 10);
        let xs: Vec<_> = tileset.tile_rows.iter().map(|col| (col[0].origin.x, col[0].span[0])).collect();
        assert_eq!(xs, vec![(4_294_966_000, 1000), (4_294_967_000, 296), (0, 1000), (1000, 1000)]);
        assert_eq!(tileset.tile_rows[1][0].key.to_string(), "10_100_4294967000_0");
    }

    #[test]
    fn oversized_requests_are_truncated() {
        let config = TilesetConfig {
            max_tiles_per_axis: 3,
            ..TilesetConfig::default()
        };
        let mut cache = TileCache::default();
        let tileset = resolve(&mut cache, &config, 1.0, Bounds::from_corners(0, 0, 10_000, 0));
        assert_eq!(tileset.columns(), 3);
    }

    #[traced_test]
    #[test]
    fn reversed_bounds_inside_one_tile_walk_the_whole_torus() {
        // 150..=120 wraps, so it covers everything except 121..=149.
        let (xs, cut) = axis_tiles(150, 120, 1 << 31, 16);
        assert!(!cut);
        assert_eq!(xs, vec![(0, 1 << 31), (1 << 31, 1 << 31)]);

        let mut cache = TileCache::default();
        let tileset = resolve(
            &mut cache,
            &TilesetConfig::default(),
            1.0,
            Bounds::from_corners(150, 0, 120, 0),
        );
        assert_eq!(tileset.columns(), 256);
        assert_eq!(tileset.rows(), 1);
        assert_eq!(tileset.tile_rows[0][0].origin, Coordinate::new(100, 0));
        assert_eq!(tileset.tile_rows[255][0].origin, Coordinate::new(25_600, 0));
        assert!(logs_contain("tileset truncated"));
    }

    #[test]
    fn middle_tiles_are_fetched_first() {
        let mut cache = TileCache::default();
        resolve(
            &mut cache,
            &TilesetConfig::default(),
            1.0,
            Bounds::from_corners(0, 0, 499, 0),
        );
        let jobs = cache.drain_jobs(&mut FrameBudget::new(1));
        assert_eq!(jobs[0].key.origin(), Coordinate::new(200, 0));
    }

    #[test]
    fn resolved_entries_are_reported_in_place() {
        let mut cache = TileCache::default();
        let key = TileKey::new(1, 100, 0, 0);
        cache.get(key);
        cache.drain_jobs(&mut FrameBudget::unlimited());
        cache.complete(key, Ok(raster::Bitmap::solid(1, 1, [0, 0, 0, 255])));
        let tileset = resolve(
            &mut cache,
            &TilesetConfig::default(),
            1.0,
            Bounds::from_corners(0, 0, 150, 0),
        );
        assert!(tileset.tile_rows[0][0].entry.tile().is_some());
        assert_eq!(tileset.tile_rows[1][0].entry, TileCacheEntry::Pending);
    }
}
