use std::collections::BTreeMap;

use raster::Bitmap;
use runtime::budget::FrameBudget;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::io::TileError;
use crate::key::TileKey;
use crate::queue::{FetchQueue, TileFetch};
use crate::residency::{EntryCounts, EntryState, Tile, TileCacheEntry};

/// What a `get` does with a `Failed` entry.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Failed stays failed until invalidated or the cache is cleared.
    #[default]
    Sticky,
    /// A request for a failed key is treated as a request for an absent one.
    RetryOnRequest,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
pub struct MemoryBudget {
    pub max_bytes: usize,
}

impl MemoryBudget {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub failure_policy: FailurePolicy,
    /// LRU bound over resolved bitmaps. `None` keeps everything.
    pub memory_budget: Option<MemoryBudget>,
}

#[derive(Debug, Default)]
struct Slot {
    entry: TileCacheEntry,
    bytes: usize,
    last_used_tick: u64,
    /// The fetch has left the queue and is running in the host.
    dispatched: bool,
    /// Invalidated while dispatched: drop the late result.
    refetch: bool,
    /// Resolved once and evicted: the backing store still has the bytes.
    in_store: bool,
}

/// Tile bitmaps keyed by [`TileKey`], with fetch deduplication.
///
/// The cache never performs I/O. A miss queues a [`TileFetch`]; the host
/// drains the queue, runs the fetch and hands the outcome back through
/// [`TileCache::complete`]. At most one fetch per key is outstanding at a time.
///
/// Determinism: entries live in a `BTreeMap`; eviction is LRU by
/// `last_used_tick` with a tie-break on key order.
#[derive(Debug, Default)]
pub struct TileCache {
    config: CacheConfig,
    slots: BTreeMap<TileKey, Slot>,
    queue: FetchQueue,
    used_bytes: usize,
    tick: u64,
}

impl TileCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Current entry for `key`, starting a fetch on a miss.
    ///
    /// Callers render with whatever is returned this frame.
    pub fn get(&mut self, key: TileKey) -> &TileCacheEntry {
        self.request(key, 0)
    }

    /// [`TileCache::get`] with a queue priority; smaller values are fetched first.
    pub fn request(&mut self, key: TileKey, priority: i32) -> &TileCacheEntry {
        self.tick += 1;
        let tick = self.tick;
        let retry_failed = self.config.failure_policy == FailurePolicy::RetryOnRequest;

        let slot = self.slots.entry(key).or_default();
        slot.last_used_tick = tick;
        let start = match slot.entry {
            TileCacheEntry::Absent => true,
            TileCacheEntry::Failed => retry_failed,
            TileCacheEntry::Pending | TileCacheEntry::Resolved(_) => false,
        };
        if start {
            slot.entry = TileCacheEntry::Pending;
            slot.dispatched = false;
            slot.refetch = false;
            self.queue.submit(
                TileFetch {
                    key,
                    from_store: slot.in_store,
                },
                priority,
            );
            debug!(%key, from_store = slot.in_store, "tile requested");
        }
        &slot.entry
    }

    pub fn peek(&self, key: &TileKey) -> Option<&TileCacheEntry> {
        self.slots.get(key).map(|slot| &slot.entry)
    }

    pub fn state(&self, key: &TileKey) -> EntryState {
        self.peek(key)
            .map(TileCacheEntry::state)
            .unwrap_or(EntryState::Absent)
    }

    /// Hand queued fetches to the host, as many as the budget allows.
    pub fn drain_jobs(&mut self, budget: &mut FrameBudget) -> Vec<TileFetch> {
        let mut jobs = Vec::new();
        while let Some(fetch) = self.queue.pop_next_with_budget(budget) {
            if let Some(slot) = self.slots.get_mut(&fetch.key)
                && slot.entry == TileCacheEntry::Pending
            {
                slot.dispatched = true;
                jobs.push(fetch);
            }
        }
        jobs
    }

    /// Apply the outcome of a dispatched fetch.
    ///
    /// Returns `true` if an entry changed. A result for a key invalidated while
    /// in flight is dropped and the key returns to `Absent`. A result for a key
    /// nobody is looking at any more is kept for later reuse.
    pub fn complete(&mut self, key: TileKey, result: Result<Bitmap, TileError>) -> bool {
        self.tick += 1;
        let tick = self.tick;
        let slot = self.slots.entry(key).or_default();
        slot.dispatched = false;

        if slot.refetch {
            slot.refetch = false;
            slot.entry = TileCacheEntry::Absent;
            debug!(%key, "dropped stale tile result");
            return true;
        }
        if let TileCacheEntry::Resolved(_) = slot.entry {
            self.used_bytes -= slot.bytes;
        }

        match result {
            Ok(bitmap) => {
                slot.bytes = bitmap.byte_len();
                slot.last_used_tick = tick;
                slot.in_store = true;
                slot.entry = TileCacheEntry::Resolved(Tile { key, bitmap });
                self.used_bytes += slot.bytes;
                debug!(%key, bytes = slot.bytes, "tile resolved");
                self.evict_as_needed(Some(&key));
            }
            Err(err) => {
                slot.bytes = 0;
                slot.entry = TileCacheEntry::Failed;
                debug!(%key, error = %err, "tile failed");
            }
        }
        true
    }

    /// Seed an entry from the backing store at startup.
    ///
    /// Only absent keys are filled; a live entry always wins over stored data.
    pub fn restore(&mut self, key: TileKey, result: Result<Bitmap, TileError>) -> bool {
        if self.state(&key) != EntryState::Absent {
            return false;
        }
        if let Err(err @ TileError::Decode(_)) = &result {
            warn!(%key, error = %err, "stored tile could not be decoded");
        }
        self.complete(key, result)
    }

    /// Force a key back to `Absent` so the next request fetches it again.
    ///
    /// Returns `true` if the entry was affected.
    pub fn invalidate(&mut self, key: &TileKey) -> bool {
        let Some(slot) = self.slots.get_mut(key) else {
            return false;
        };
        slot.in_store = false;
        match slot.entry {
            TileCacheEntry::Absent => false,
            TileCacheEntry::Pending if slot.dispatched => {
                slot.refetch = true;
                true
            }
            TileCacheEntry::Pending => {
                self.queue.cancel(key);
                slot.entry = TileCacheEntry::Absent;
                true
            }
            TileCacheEntry::Resolved(_) => {
                self.used_bytes -= slot.bytes;
                slot.bytes = 0;
                slot.entry = TileCacheEntry::Absent;
                true
            }
            TileCacheEntry::Failed => {
                slot.entry = TileCacheEntry::Absent;
                true
            }
        }
    }

    /// Purge every entry and queued fetch.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.queue.clear();
        self.used_bytes = 0;
    }

    pub fn counts(&self) -> EntryCounts {
        let mut counts = EntryCounts::default();
        for slot in self.slots.values() {
            counts.add(slot.entry.state());
        }
        counts
    }

    fn evict_as_needed(&mut self, protected: Option<&TileKey>) {
        let Some(budget) = self.config.memory_budget else {
            return;
        };
        while self.used_bytes > budget.max_bytes {
            let pick = |exclude: Option<&TileKey>| {
                self.slots
                    .iter()
                    .filter(|(k, s)| {
                        matches!(s.entry, TileCacheEntry::Resolved(_))
                            && exclude.map(|p| p != *k).unwrap_or(true)
                    })
                    .min_by(|(ka, sa), (kb, sb)| {
                        sa.last_used_tick
                            .cmp(&sb.last_used_tick)
                            .then_with(|| ka.cmp(kb))
                    })
                    .map(|(k, _)| *k)
            };
            let Some(victim) = pick(protected).or_else(|| pick(None)) else {
                return;
            };
            if let Some(slot) = self.slots.get_mut(&victim) {
                self.used_bytes -= slot.bytes;
                slot.bytes = 0;
                slot.entry = TileCacheEntry::Absent;
                debug!(key = %victim, "tile evicted");
            }
        }
    }
}
