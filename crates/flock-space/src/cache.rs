//! Flat per-tick transform cache.
//!
//! Built once per tick from the store's snapshot, before any parallel
//! work starts. Slot `i` always refers to the `i`-th snapshot record of
//! the same tick; grid buckets and neighbour search address agents by
//! slot, so the cache and the grid must be rebuilt together.

use flock_core::{AgentId, AgentRecord, Transform};

/// Snapshot of every visible agent's transform, indexed by slot.
///
/// Records without a transform leave a `None` hole at their slot.
#[derive(Clone, Debug, Default)]
pub struct TransformCache {
    ids: Vec<AgentId>,
    transforms: Vec<Option<Transform>>,
}

impl TransformCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache built from `records` in order.
    pub fn from_records(records: &[AgentRecord]) -> Self {
        let mut cache = Self::new();
        cache.rebuild(records);
        cache
    }

    /// Replace the contents with `records`, reusing the allocations.
    pub fn rebuild(&mut self, records: &[AgentRecord]) {
        self.ids.clear();
        self.transforms.clear();
        self.ids.extend(records.iter().map(|r| r.id));
        self.transforms.extend(records.iter().map(|r| r.transform));
    }

    /// Number of slots, holes included.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the cache has no slots.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Agent at `slot`.
    pub fn id(&self, slot: usize) -> Option<AgentId> {
        self.ids.get(slot).copied()
    }

    /// Transform at `slot`, or `None` for a hole or an out-of-range slot.
    pub fn get(&self, slot: usize) -> Option<&Transform> {
        self.transforms.get(slot).and_then(Option::as_ref)
    }

    /// `(slot, id, transform)` for every non-hole slot, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, AgentId, &Transform)> + '_ {
        self.ids
            .iter()
            .zip(&self.transforms)
            .enumerate()
            .filter_map(|(slot, (id, t))| t.as_ref().map(|t| (slot, *id, t)))
    }
}
