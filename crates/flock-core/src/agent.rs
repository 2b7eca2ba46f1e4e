//! Per-agent data exchanged with the external store.
//!
//! [`Transform`] and [`FlockingParams`] are produced by the store each
//! tick and treated as immutable input. [`AgentUpdate`] is what the
//! simulation hands back for every agent it computed.

use glam::DVec3;

use crate::id::AgentId;

/// Kinematic state of an agent.
///
/// Read-only during a tick; the simulation computes a new value and
/// returns it as an [`AgentUpdate`] rather than mutating in place.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// World-space position.
    pub position: DVec3,
    /// Current velocity.
    pub velocity: DVec3,
    /// Unit heading vector.
    pub forward: DVec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            velocity: DVec3::ZERO,
            forward: DVec3::Z,
        }
    }
}

impl Transform {
    /// Transform at `position` facing `forward`, at rest.
    pub fn at(position: DVec3, forward: DVec3) -> Self {
        Self {
            position,
            velocity: DVec3::ZERO,
            forward,
        }
    }

    /// Builder-style velocity override.
    pub fn with_velocity(mut self, velocity: DVec3) -> Self {
        self.velocity = velocity;
        self
    }
}

/// Per-agent flocking behaviour configuration.
///
/// Weights cohesion (`attract`), alignment (`follow`) and separation
/// (`repel`), bounds the neighbour query, and limits how fast the agent
/// may turn and move.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlockingParams {
    /// Radius of the neighbour query.
    pub search_range: f64,
    /// Maximum number of neighbours considered (`k`).
    pub number_to_consider: u32,
    /// Cohesion weight.
    pub attract_coefficient: f64,
    /// Alignment weight.
    pub follow_coefficient: f64,
    /// Separation weight.
    pub repel_coefficient: f64,
    /// Distance at which a single neighbour's separation push has
    /// decayed to half strength.
    pub repel_separation_for_half: f64,
    /// Turn-rate limit, in degrees per simulated second.
    pub max_turn_degrees_per_second: f64,
    /// Cruise speed along `forward`.
    pub speed: f64,
}

impl Default for FlockingParams {
    fn default() -> Self {
        Self {
            search_range: 18.0,
            number_to_consider: 8,
            attract_coefficient: 0.3,
            follow_coefficient: 0.5,
            repel_coefficient: 1.0,
            repel_separation_for_half: 2.0,
            max_turn_degrees_per_second: 90.0,
            speed: 5.0,
        }
    }
}

/// One entry of the per-tick snapshot returned by the store.
///
/// Either component may be absent for agents the store can see but has
/// no data for this tick. Records without a transform leave a hole in
/// the transform cache and are never neighbours; managed agents without
/// a transform or params are not simulated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentRecord {
    /// Agent identity.
    pub id: AgentId,
    /// Kinematic state, if known this tick.
    pub transform: Option<Transform>,
    /// Behaviour configuration, if known this tick.
    pub params: Option<FlockingParams>,
}

impl AgentRecord {
    /// A record carrying both components.
    pub fn new(id: AgentId, transform: Transform, params: FlockingParams) -> Self {
        Self {
            id,
            transform: Some(transform),
            params: Some(params),
        }
    }
}

/// New kinematic state computed for one agent in one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentUpdate {
    /// Integrated position.
    pub position: DVec3,
    /// New velocity (`forward * speed`).
    pub velocity: DVec3,
    /// New unit heading.
    pub forward: DVec3,
}

impl AgentUpdate {
    /// The update expressed as a [`Transform`].
    pub fn to_transform(self) -> Transform {
        Transform {
            position: self.position,
            velocity: self.velocity,
            forward: self.forward,
        }
    }
}

/// A neighbour accepted by the visibility predicate during one search.
///
/// Carries a copy of the neighbour's transform so steering never needs
/// to look anything up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NeighbourCandidate {
    /// Neighbour identity.
    pub id: AgentId,
    /// Neighbour state at the start of the tick.
    pub transform: Transform,
    /// Squared distance to the querying agent.
    pub distance_sq: f64,
}
