//! Test utilities and mock types for flocking simulation development.
//!
//! Provides [`MockAgentStore`], an in-memory [`AgentStore`] that records
//! every commit and warning, and seeded flock [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use flock_core::{AgentId, AgentRecord, AgentStore, AgentUpdate};
use indexmap::IndexMap;

pub use fixtures::{agent_at, line_of_agents, random_flock};

/// In-memory [`AgentStore`].
///
/// Snapshots come out in insertion order. Commits are logged and, unless
/// disabled with [`frozen`](MockAgentStore::frozen), written back to the
/// record's transform so consecutive ticks see each other's results.
#[derive(Debug, Default)]
pub struct MockAgentStore {
    records: IndexMap<AgentId, AgentRecord>,
    commits: Vec<(AgentId, AgentUpdate)>,
    warnings: Vec<String>,
    snapshots: usize,
    frozen: bool,
}

impl MockAgentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `records`.
    pub fn with_records(records: impl IntoIterator<Item = AgentRecord>) -> Self {
        let mut store = Self::new();
        for r in records {
            store.insert(r);
        }
        store
    }

    /// Log commits without applying them.
    pub fn frozen(mut self) -> Self {
        self.frozen = true;
        self
    }

    /// Insert or replace a record.
    pub fn insert(&mut self, record: AgentRecord) {
        self.records.insert(record.id, record);
    }

    /// Delete a record, keeping the order of the rest.
    pub fn remove(&mut self, id: AgentId) -> Option<AgentRecord> {
        self.records.shift_remove(&id)
    }

    pub fn get(&self, id: AgentId) -> Option<&AgentRecord> {
        self.records.get(&id)
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut AgentRecord> {
        self.records.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order, without counting as a snapshot.
    pub fn records(&self) -> impl Iterator<Item = &AgentRecord> + '_ {
        self.records.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.records.keys().copied()
    }

    /// Every commit received, in order.
    pub fn commits(&self) -> &[(AgentId, AgentUpdate)] {
        &self.commits
    }

    /// Commits for `id`, in order.
    pub fn commits_for(&self, id: AgentId) -> impl Iterator<Item = &AgentUpdate> + '_ {
        self.commits
            .iter()
            .filter(move |(c, _)| *c == id)
            .map(|(_, u)| u)
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Number of `snapshot()` calls so far.
    pub fn snapshot_count(&self) -> usize {
        self.snapshots
    }

    /// Forget logged commits and warnings.
    pub fn clear_log(&mut self) {
        self.commits.clear();
        self.warnings.clear();
    }
}

impl AgentStore for MockAgentStore {
    fn snapshot(&mut self) -> Vec<AgentRecord> {
        self.snapshots += 1;
        self.records.values().cloned().collect()
    }

    fn commit(&mut self, id: AgentId, update: &AgentUpdate) {
        self.commits.push((id, *update));
        if self.frozen {
            return;
        }
        if let Some(record) = self.records.get_mut(&id) {
            record.transform = Some(update.to_transform());
        }
    }

    fn log_warning(&mut self, message: &str) {
        self.warnings.push(message.to_owned());
    }
}
