//! The interface to the authoritative entity store.
//!
//! The store owns agent data and decides which agents this process is
//! responsible for. The scheduler pulls one snapshot per tick, pushes
//! one update per simulated agent after the barrier, and receives
//! authority notifications as [`MembershipEvent`]s.

use crate::agent::{AgentRecord, AgentUpdate};
use crate::id::AgentId;

/// External agent store consumed by the tick scheduler.
///
/// All methods are called from the coordinating thread only, never from
/// inside the parallel phase.
pub trait AgentStore {
    /// Every agent currently visible to this process, in a stable
    /// iteration order. Called once per tick before the grid rebuild.
    fn snapshot(&mut self) -> Vec<AgentRecord>;

    /// Receive the new state of one managed agent. Called once per
    /// simulated agent per tick, after all workers have finished.
    fn commit(&mut self, id: AgentId, update: &AgentUpdate);

    /// Report a non-fatal anomaly, such as a managed agent missing from
    /// the latest snapshot.
    fn log_warning(&mut self, message: &str);
}

impl<S: AgentStore + ?Sized> AgentStore for Box<S> {
    fn snapshot(&mut self) -> Vec<AgentRecord> {
        (**self).snapshot()
    }

    fn commit(&mut self, id: AgentId, update: &AgentUpdate) {
        (**self).commit(id, update)
    }

    fn log_warning(&mut self, message: &str) {
        (**self).log_warning(message)
    }
}

/// Change to the set of agents this process simulates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MembershipEvent {
    /// This process became responsible for the agent.
    AuthorityGained(AgentId),
    /// Another process took over the agent.
    AuthorityLost(AgentId),
    /// The agent no longer exists.
    Removed(AgentId),
}

impl MembershipEvent {
    /// The agent the event refers to.
    pub fn agent(&self) -> AgentId {
        match *self {
            Self::AuthorityGained(id) | Self::AuthorityLost(id) | Self::Removed(id) => id,
        }
    }
}
