use std::collections::BTreeMap;

use crate::budget::FrameBudget;

/// Keyed, deduplicating work queue.
///
/// Key properties:
/// - At most one queued item per key; pushing a queued key is a no-op.
/// - Total ordering on `(priority, insertion)`; smaller priorities run first.
/// - Removing a key does not perturb the order of the remaining items.
/// - Each item costs one budget unit when popped under a [`FrameBudget`].
#[derive(Debug)]
pub struct WorkQueue<K, T> {
    next_seq: u64,
    order: BTreeMap<(i32, u64), K>,
    items: BTreeMap<K, Item<T>>,
}

#[derive(Debug)]
struct Item<T> {
    slot: (i32, u64),
    payload: T,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    AlreadyQueued,
}

impl<K: Ord + Clone, T> Default for WorkQueue<K, T> {
    fn default() -> Self {
        Self {
            next_seq: 0,
            order: BTreeMap::new(),
            items: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone, T> WorkQueue<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.items.contains_key(key)
    }

    pub fn push(&mut self, key: K, priority: i32, payload: T) -> PushOutcome {
        if self.items.contains_key(&key) {
            return PushOutcome::AlreadyQueued;
        }

        let slot = (priority, self.next_seq);
        self.next_seq = self.next_seq.wrapping_add(1);
        self.order.insert(slot, key.clone());
        self.items.insert(key, Item { slot, payload });
        PushOutcome::Queued
    }

    /// Drops the queued item for `key`, returning its payload.
    pub fn remove(&mut self, key: &K) -> Option<T> {
        let item = self.items.remove(key)?;
        self.order.remove(&item.slot);
        Some(item.payload)
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.items.clear();
    }

    /// Pops the next (lowest priority value, then oldest) item.
    pub fn pop_next(&mut self) -> Option<(K, T)> {
        let (_, key) = self.order.pop_first()?;
        let item = self.items.remove(&key)?;
        Some((key, item.payload))
    }

    /// Pops the next item if the budget has a unit left for it.
    pub fn pop_next_with_budget(&mut self, budget: &mut FrameBudget) -> Option<(K, T)> {
        if self.order.is_empty() || !budget.try_consume(1) {
            return None;
        }
        self.pop_next()
    }
}

#[cfg(test)]
mod tests {
    use super::{PushOutcome, WorkQueue};
    use crate::budget::FrameBudget;

    #[test]
    fn same_priority_is_insertion_order() {
        let mut q = WorkQueue::new();
        q.push("c", 0, 3);
        q.push("a", 0, 1);
        q.push("b", 0, 2);

        let order: Vec<_> = std::iter::from_fn(|| q.pop_next()).map(|(k, _)| k).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn lower_priority_value_runs_first() {
        let mut q = WorkQueue::new();
        q.push("late", 10, ());
        q.push("early", -1, ());
        assert_eq!(q.pop_next().map(|(k, _)| k), Some("early"));
    }

    #[test]
    fn duplicate_keys_are_queued_once() {
        let mut q = WorkQueue::new();
        assert_eq!(q.push("k", 0, 1), PushOutcome::Queued);
        assert_eq!(q.push("k", -5, 2), PushOutcome::AlreadyQueued);
        assert_eq!(q.len(), 1);
        assert_eq!(q.pop_next(), Some(("k", 1)));
        assert!(q.is_empty());
    }

    #[test]
    fn remove_skips_item() {
        let mut q = WorkQueue::new();
        q.push("a", 0, ());
        q.push("b", 0, ());
        assert_eq!(q.remove(&"a"), Some(()));
        assert!(!q.contains(&"a"));
        assert_eq!(q.pop_next().map(|(k, _)| k), Some("b"));
        assert!(q.pop_next().is_none());
    }

    #[test]
    fn pop_respects_budget_units() {
        let mut q = WorkQueue::new();
        q.push("a", 0, ());
        q.push("b", 0, ());

        let mut budget = FrameBudget::new(1);
        assert_eq!(q.pop_next_with_budget(&mut budget).map(|(k, _)| k), Some("a"));
        assert!(q.pop_next_with_budget(&mut budget).is_none());
        assert_eq!(q.len(), 1);

        // An empty queue spends nothing.
        let mut budget = FrameBudget::new(2);
        assert!(q.pop_next_with_budget(&mut budget).is_some());
        assert!(q.pop_next_with_budget(&mut budget).is_none());
        assert_eq!(budget.spent(), 1);
    }
}
