use runtime::budget::FrameBudget;
use runtime::work_queue::{PushOutcome, WorkQueue};

use crate::key::TileKey;

/// One queued tile fetch.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TileFetch {
    pub key: TileKey,
    /// Try the backing store before the network. Set for entries that were
    /// resolved earlier and evicted from memory.
    pub from_store: bool,
}

/// Tile fetch queue, deduplicated by key.
///
/// A thin wrapper over `runtime::WorkQueue` so the cache owns its scheduling
/// policy without duplicating queue logic.
#[derive(Debug, Default)]
pub struct FetchQueue {
    inner: WorkQueue<TileKey, TileFetch>,
}

impl FetchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn contains(&self, key: &TileKey) -> bool {
        self.inner.contains(key)
    }

    /// Returns `false` if the key was already queued.
    pub fn submit(&mut self, fetch: TileFetch, priority: i32) -> bool {
        self.inner.push(fetch.key, priority, fetch) == PushOutcome::Queued
    }

    pub fn cancel(&mut self, key: &TileKey) -> Option<TileFetch> {
        self.inner.remove(key)
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn pop_next_with_budget(&mut self, budget: &mut FrameBudget) -> Option<TileFetch> {
        self.inner.pop_next_with_budget(budget).map(|(_, fetch)| fetch)
    }
}

#[cfg(test)]
mod tests {
    use super::{FetchQueue, TileFetch};
    use crate::key::TileKey;
    use runtime::budget::FrameBudget;

    fn fetch(x: u32) -> TileFetch {
        TileFetch {
            key: TileKey::new(1, 100, x, 0),
            from_store: false,
        }
    }

    #[test]
    fn deduplicates_by_key() {
        let mut q = FetchQueue::new();
        assert!(q.submit(fetch(0), 0));
        assert!(!q.submit(fetch(0), 0));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn nearer_tiles_pop_first_within_budget() {
        let mut q = FetchQueue::new();
        q.submit(fetch(300), 3);
        q.submit(fetch(100), 1);
        q.submit(fetch(200), 2);

        let mut budget = FrameBudget::new(2);
        let popped: Vec<_> = std::iter::from_fn(|| q.pop_next_with_budget(&mut budget))
            .map(|f| f.key.x)
            .collect();
        assert_eq!(popped, vec![100, 200]);
        assert_eq!(q.len(), 1);
    }
}
