//! Core types and traits for the flocking simulation.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the agent identifiers, per-agent transform and behaviour data, the
//! shared numeric tolerances, and the [`AgentStore`] trait through which
//! the simulation talks to the authoritative entity store.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod agent;
pub mod id;
pub mod math;
pub mod store;

pub use agent::{AgentRecord, AgentUpdate, FlockingParams, NeighbourCandidate, Transform};
pub use glam::DVec3;
pub use id::{AgentId, TickId};
pub use math::EPSILON;
pub use store::{AgentStore, MembershipEvent};
