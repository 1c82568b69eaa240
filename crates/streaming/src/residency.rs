use raster::Bitmap;

use crate::key::TileKey;

/// A resolved tile bitmap with its identity. Cloning shares the pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub key: TileKey,
    pub bitmap: Bitmap,
}

/// Cache entry lifecycle.
///
/// Absent → Pending on first request; Pending → Resolved | Failed on
/// completion. `Failed` is "known absent", distinct from "never asked".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TileCacheEntry {
    #[default]
    Absent,
    Pending,
    Resolved(Tile),
    Failed,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntryState {
    Absent,
    Pending,
    Resolved,
    Failed,
}

impl TileCacheEntry {
    pub fn state(&self) -> EntryState {
        match self {
            TileCacheEntry::Absent => EntryState::Absent,
            TileCacheEntry::Pending => EntryState::Pending,
            TileCacheEntry::Resolved(_) => EntryState::Resolved,
            TileCacheEntry::Failed => EntryState::Failed,
        }
    }

    pub fn tile(&self) -> Option<&Tile> {
        match self {
            TileCacheEntry::Resolved(tile) => Some(tile),
            _ => None,
        }
    }
}

/// Entry totals by state, for diagnostics.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct EntryCounts {
    pub absent: usize,
    pub pending: usize,
    pub resolved: usize,
    pub failed: usize,
}

impl EntryCounts {
    pub fn add(&mut self, state: EntryState) {
        match state {
            EntryState::Absent => self.absent += 1,
            EntryState::Pending => self.pending += 1,
            EntryState::Resolved => self.resolved += 1,
            EntryState::Failed => self.failed += 1,
        }
    }
}
