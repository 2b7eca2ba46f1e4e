//! Per-tick performance metrics.
//!
//! [`TickMetrics`] captures timing and population data for a single
//! tick. The lockstep engine returns it from every `run_tick()`; the
//! realtime scheduler keeps the most recent one.

use flock_core::TickId;

/// Timing and population counters collected during a single tick.
///
/// All durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickMetrics {
    /// Tick that produced these metrics.
    pub tick: TickId,
    /// Wall-clock time for the entire tick, excluding the budget sleep.
    pub total_us: u64,
    /// Pulling the snapshot and rebuilding the transform cache.
    pub snapshot_us: u64,
    /// Rebuilding the spatial grid.
    pub grid_us: u64,
    /// From releasing the workers until the barrier cleared.
    pub parallel_us: u64,
    /// Committing outputs to the store.
    pub commit_us: u64,
    /// Records in the snapshot, holes included.
    pub snapshot_agents: usize,
    /// Managed agents at the start of the tick.
    pub managed_agents: usize,
    /// Occupied grid cells.
    pub buckets: usize,
    /// Agents filed in a cell whose box does not contain them.
    pub misplaced_agents: usize,
    /// Managed agents absent from the snapshot.
    pub stale_references: usize,
    /// Updates handed to the store.
    pub committed: usize,
    /// Simulated seconds used by this tick.
    pub effective_dt: f64,
    /// Rolling load average after this tick.
    pub load_average: f64,
}
