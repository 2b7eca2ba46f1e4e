//! Strongly-typed identifiers.

use std::fmt;

/// Identifies an agent.
///
/// Assigned by the external store and stable for the lifetime of the
/// agent. The simulation only uses it as a map/list key and never
/// interprets the value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for AgentId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Monotonically increasing tick counter.
///
/// Incremented each time the scheduler completes one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickId(pub u64);

impl fmt::Display for TickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TickId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn agent_id_display_is_raw_value() {
        assert_eq!(AgentId(42).to_string(), "42");
        assert_eq!(TickId(7).to_string(), "7");
    }

    #[test]
    fn agent_id_usable_as_key() {
        let ids: HashSet<AgentId> = [1u64, 2, 2, 3].into_iter().map(AgentId::from).collect();
        assert_eq!(ids.len(), 3);
    }
}
