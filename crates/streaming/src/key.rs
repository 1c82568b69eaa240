use std::fmt;
use std::str::FromStr;

use foundation::Coordinate;

/// Identity of one pre-rendered tile: `{bucket}_{tile_size}_{x}_{y}`.
///
/// `x`/`y` are the world-space origin, a multiple of `tile_size * bucket`.
/// The rendered string is also the backing-store key and the file name
/// requested from the tile server.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileKey {
    pub bucket: u32,
    pub tile_size: u32,
    pub x: u32,
    pub y: u32,
}

impl TileKey {
    pub const fn new(bucket: u32, tile_size: u32, x: u32, y: u32) -> Self {
        Self {
            bucket,
            tile_size,
            x,
            y,
        }
    }

    pub const fn origin(&self) -> Coordinate {
        Coordinate::new(self.x, self.y)
    }

    /// World cells covered by a full (non-seam) tile along one axis.
    pub const fn world_size(&self) -> u32 {
        self.tile_size.saturating_mul(self.bucket)
    }

    pub fn url(&self, base_url: &str) -> String {
        format!("{}/{self}.png", base_url.trim_end_matches('/'))
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}_{}", self.bucket, self.tile_size, self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseKeyError {
    pub input: String,
    pub reason: &'static str,
}

impl fmt::Display for ParseKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid tile key {:?}: {}", self.input, self.reason)
    }
}

impl std::error::Error for ParseKeyError {}

impl FromStr for TileKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason| ParseKeyError {
            input: s.to_string(),
            reason,
        };
        let stem = s.strip_suffix(".png").unwrap_or(s);
        let mut parts = stem.split('_');
        let mut next = || -> Result<u32, ParseKeyError> {
            parts
                .next()
                .ok_or_else(|| err("expected four '_'-separated fields"))?
                .parse::<u32>()
                .map_err(|_| err("field is not an unsigned 32-bit integer"))
        };
        let key = TileKey::new(next()?, next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(err("expected four '_'-separated fields"));
        }
        if key.bucket == 0 || key.tile_size == 0 {
            return Err(err("bucket and tile size must be positive"));
        }
        Ok(key)
    }
}
