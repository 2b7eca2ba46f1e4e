//! Parallel tick engine for the flocking simulation.
//!
//! A [`TickEngine`] pulls a snapshot from an [`AgentStore`], rebuilds
//! the spatial grid, fans the managed agents out over a fixed worker
//! pool synchronised by a lock-free [`WorkBarrier`], and commits the
//! results back in one pass. [`FlockScheduler`] runs the same engine at
//! a fixed rate on a background thread.
//!
//! [`AgentStore`]: flock_core::AgentStore

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod barrier;
pub mod config;
pub mod load;
pub mod membership;
pub mod metrics;
pub mod partition;
pub mod realtime;
pub mod run_state;
pub mod tick;
pub(crate) mod tick_thread;
pub(crate) mod worker;

pub use barrier::{WorkBarrier, MAX_WORKERS};
pub use config::{ConfigError, EngineConfig};
pub use load::LoadWindow;
pub use membership::{Membership, MembershipHandle, NotifyError};
pub use metrics::TickMetrics;
pub use partition::partition;
pub use realtime::{FlockScheduler, ShutdownReport};
pub use run_state::{Lifecycle, RunState};
pub use tick::{TickEngine, TickError};
