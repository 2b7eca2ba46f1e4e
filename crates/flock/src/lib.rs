//! Flock: a parallel flocking simulation over an external entity store.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all flock sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use flock::prelude::*;
//!
//! // A store holding three agents in a row.
//! struct Row(Vec<AgentRecord>);
//! impl AgentStore for Row {
//!     fn snapshot(&mut self) -> Vec<AgentRecord> {
//!         self.0.clone()
//!     }
//!     fn commit(&mut self, id: AgentId, update: &AgentUpdate) {
//!         self.0[id.0 as usize].transform = Some(update.to_transform());
//!     }
//!     fn log_warning(&mut self, message: &str) {
//!         eprintln!("{message}");
//!     }
//! }
//!
//! let mut store = Row(
//!     (0..3)
//!         .map(|i| {
//!             AgentRecord::new(
//!                 AgentId(i),
//!                 Transform::at(DVec3::new(i as f64, 20.0, 0.0), DVec3::Z),
//!                 FlockingParams::default(),
//!             )
//!         })
//!         .collect(),
//! );
//!
//! let mut engine = TickEngine::new(EngineConfig {
//!     worker_count: Some(2),
//!     ..EngineConfig::default()
//! })
//! .unwrap();
//! engine.start().unwrap();
//! for i in 0..3 {
//!     engine.membership().on_authority_gained(AgentId(i)).unwrap();
//! }
//!
//! let metrics = engine.run_tick(&mut store).unwrap();
//! assert_eq!(metrics.tick, TickId(1));
//! assert_eq!(metrics.committed, 3);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `flock-core` | IDs, agent records, the store trait |
//! | [`space`] | `flock-space` | Geometry, spatial grid, neighbour search |
//! | [`steering`] | `flock-steering` | Steering, boundary shaping, turning |
//! | [`engine`] | `flock-engine` | Tick engine and realtime scheduler |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`flock-core`).
pub use flock_core as types;

/// Geometry kernel, uniform grid, and k-nearest search (`flock-space`).
///
/// [`space::SpatialGrid`] is rebuilt every tick; [`space::NeighbourSearch`]
/// queries it.
pub use flock_space as space;

/// Pure steering functions (`flock-steering`).
pub use flock_steering as steering;

/// Tick engine and realtime scheduler (`flock-engine`).
///
/// [`engine::TickEngine`] for caller-driven ticks,
/// [`engine::FlockScheduler`] for fixed-rate background ticking.
pub use flock_engine as engine;

/// Common imports for typical usage.
///
/// ```rust
/// use flock::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use flock_core::{
        AgentId, AgentRecord, AgentStore, AgentUpdate, DVec3, FlockingParams, MembershipEvent,
        TickId, Transform,
    };

    // Space
    pub use flock_space::{Aabb3, GridLayout, SearchMode};

    // Steering
    pub use flock_steering::BoundaryConfig;

    // Engine
    pub use flock_engine::{
        ConfigError, EngineConfig, FlockScheduler, MembershipHandle, ShutdownReport,
        TickEngine, TickError, TickMetrics,
    };
}
