//! The set of agents this process simulates.
//!
//! Authority notifications may arrive on any thread through a cloneable
//! [`MembershipHandle`]. They are queued on an unbounded channel and
//! applied by the coordinator at the start of each tick (and again just
//! before commit), so the managed set never changes while workers run.

use crossbeam_channel::{Receiver, Sender};
use flock_core::{AgentId, MembershipEvent};
use indexmap::IndexSet;
use tracing::debug;

// ── NotifyError ──────────────────────────────────────────────────

/// Error delivering a membership notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyError {
    /// The engine owning the membership set has been dropped.
    Shutdown,
}

impl std::fmt::Display for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shutdown => write!(f, "engine has shut down"),
        }
    }
}

impl std::error::Error for NotifyError {}

// ── MembershipHandle ─────────────────────────────────────────────

/// Sending side for authority notifications.
#[derive(Clone, Debug)]
pub struct MembershipHandle {
    tx: Sender<MembershipEvent>,
}

impl MembershipHandle {
    /// Queue an arbitrary event.
    pub fn notify(&self, event: MembershipEvent) -> Result<(), NotifyError> {
        self.tx.send(event).map_err(|_| NotifyError::Shutdown)
    }

    /// This process now simulates `id`. Idempotent.
    pub fn on_authority_gained(&self, id: AgentId) -> Result<(), NotifyError> {
        self.notify(MembershipEvent::AuthorityGained(id))
    }

    /// Another process took over `id`.
    pub fn on_authority_lost(&self, id: AgentId) -> Result<(), NotifyError> {
        self.notify(MembershipEvent::AuthorityLost(id))
    }

    /// `id` was deleted from the store.
    pub fn on_removed(&self, id: AgentId) -> Result<(), NotifyError> {
        self.notify(MembershipEvent::Removed(id))
    }
}

// ── Membership ───────────────────────────────────────────────────

/// Ordered managed set plus its notification queue.
///
/// Iteration follows the order in which authority was gained; removal
/// keeps the relative order of the remaining agents.
#[derive(Debug)]
pub struct Membership {
    managed: IndexSet<AgentId>,
    tx: Sender<MembershipEvent>,
    rx: Receiver<MembershipEvent>,
}

impl Default for Membership {
    fn default() -> Self {
        Self::new()
    }
}

impl Membership {
    /// Empty set with a fresh queue.
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            managed: IndexSet::new(),
            tx,
            rx,
        }
    }

    /// A new sender for this set.
    pub fn handle(&self) -> MembershipHandle {
        MembershipHandle {
            tx: self.tx.clone(),
        }
    }

    /// Apply one event immediately. Returns whether the set changed.
    pub fn apply(&mut self, event: MembershipEvent) -> bool {
        let changed = match event {
            MembershipEvent::AuthorityGained(id) => self.managed.insert(id),
            MembershipEvent::AuthorityLost(id) | MembershipEvent::Removed(id) => {
                self.managed.shift_remove(&id)
            }
        };
        if changed {
            debug!(?event, managed = self.managed.len(), "membership changed");
        }
        changed
    }

    /// Apply every queued event. Returns how many changed the set.
    pub fn drain(&mut self) -> usize {
        let mut changed = 0;
        while let Ok(event) = self.rx.try_recv() {
            if self.apply(event) {
                changed += 1;
            }
        }
        changed
    }

    /// Whether `id` is managed.
    pub fn contains(&self, id: AgentId) -> bool {
        self.managed.contains(&id)
    }

    /// Number of managed agents.
    pub fn len(&self) -> usize {
        self.managed.len()
    }

    /// Whether no agent is managed.
    pub fn is_empty(&self) -> bool {
        self.managed.is_empty()
    }

    /// Managed agents in authority order.
    pub fn iter(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.managed.iter().copied()
    }
}
