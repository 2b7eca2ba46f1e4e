//! Tick engine: one coordinator driving a fixed worker pool.
//!
//! [`TickEngine`] owns the managed set, the load window and the worker
//! threads. Each [`run_tick()`](TickEngine::run_tick) call executes one
//! full tick on the caller's thread:
//!
//! 1. apply queued membership events, pull the store snapshot, rebuild
//!    the transform cache;
//! 2. rebuild the spatial grid and schedule every managed agent present
//!    in the snapshot, reporting the absent ones;
//! 3. release all workers and spin (yielding) until the barrier clears;
//! 4. commit every output, in work-list order, for agents still managed;
//! 5. record the tick's load.
//!
//! The realtime scheduler wraps this in a thread that sleeps out the
//! remaining tick budget.

use std::fmt;
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use flock_core::{AgentId, AgentStore, TickId};
use tracing::{info, trace, warn};

use crate::barrier::WorkBarrier;
use crate::config::{ConfigError, EngineConfig};
use crate::load::LoadWindow;
use crate::membership::{Membership, MembershipHandle};
use crate::metrics::TickMetrics;
use crate::run_state::{Lifecycle, RunState};
use crate::worker::{worker_loop, Shared, TickFrame, WorkerContext, WorkerSlot};

// ── TickError ───────────────────────────────────────────────────

/// Error returned from [`TickEngine::run_tick()`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickError {
    /// `start()` has not been called.
    NotStarted,
    /// The run state left `Running` before or during the tick.
    ShuttingDown,
    /// A worker thread exited while work was pending.
    WorkerLost {
        /// Index of the first finished worker found.
        worker: usize,
    },
}

impl fmt::Display for TickError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "engine has not been started"),
            Self::ShuttingDown => write!(f, "engine is shutting down"),
            Self::WorkerLost { worker } => write!(f, "worker {worker} exited unexpectedly"),
        }
    }
}

impl std::error::Error for TickError {}

// ── TickEngine ───────────────────────────────────────────────────

/// Coordinator for the fork-join flocking tick.
///
/// Construct with [`new()`](Self::new), spawn the workers with
/// [`start()`](Self::start), then call [`run_tick()`](Self::run_tick)
/// once per tick. Dropping the engine shuts the workers down.
pub struct TickEngine {
    config: EngineConfig,
    ctx: WorkerContext,
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
    membership: Membership,
    load: LoadWindow,
    tick_budget: Duration,
    current_tick: TickId,
    last_metrics: Option<TickMetrics>,
}

impl TickEngine {
    /// Validate `config` and build an idle engine. No thread is spawned.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let worker_count = config.resolved_worker_count();

        let shared = Arc::new(Shared {
            run_state: Arc::new(RunState::new()),
            barrier: WorkBarrier::new(worker_count),
            frame: RwLock::new(TickFrame::new(config.grid)?),
            slots: (0..worker_count).map(|_| WorkerSlot::default()).collect(),
        });
        let ctx = WorkerContext {
            worker_count,
            max_neighbours: config.max_neighbours,
            idle_poll: config.idle_poll,
            search_mode: config.search_mode,
            cross_check_grid: config.cross_check_grid,
            boundary: config.boundary,
        };

        Ok(Self {
            load: LoadWindow::new(config.load_window),
            tick_budget: config.tick_budget(),
            config,
            ctx,
            shared,
            workers: Vec::with_capacity(worker_count),
            membership: Membership::new(),
            current_tick: TickId(0),
            last_metrics: None,
        })
    }

    /// `Idle -> Running`, then spawn the worker pool.
    pub fn start(&mut self) -> Result<(), ConfigError> {
        if !self.shared.run_state.begin() {
            return Err(ConfigError::NotIdle {
                state: self.lifecycle(),
            });
        }

        for i in 0..self.ctx.worker_count {
            let shared = Arc::clone(&self.shared);
            let ctx = self.ctx.clone();
            let spawned = thread::Builder::new()
                .name(format!("flock-worker-{i}"))
                .spawn(move || worker_loop(shared, ctx, i));
            match spawned {
                Ok(handle) => self.workers.push(handle),
                Err(e) => {
                    self.shutdown();
                    return Err(ConfigError::ThreadSpawnFailed {
                        reason: format!("flock-worker-{i}: {e}"),
                    });
                }
            }
        }

        info!(workers = self.ctx.worker_count, "flock engine started");
        Ok(())
    }

    /// Execute one tick against `store`.
    pub fn run_tick<S: AgentStore + ?Sized>(
        &mut self,
        store: &mut S,
    ) -> Result<TickMetrics, TickError> {
        match self.lifecycle() {
            Lifecycle::Idle => return Err(TickError::NotStarted),
            Lifecycle::ShuttingDown => return Err(TickError::ShuttingDown),
            Lifecycle::Running => {}
        }
        let tick_start = Instant::now();
        let next_tick = TickId(self.current_tick.0 + 1);
        let dt = self.load.effective_dt(self.config.base_dt());

        // 1. Membership, snapshot, cache.
        self.membership.drain();
        let managed_agents = self.membership.len();
        let records = store.snapshot();
        let snapshot_agents = records.len();
        let mut frame = self.shared.frame.write().unwrap_or_else(|e| e.into_inner());
        frame.load(records);
        let snapshot_us = tick_start.elapsed().as_micros() as u64;

        // 2. Grid and work list.
        let grid_start = Instant::now();
        let grid_stats = frame.rebuild_grid();
        let stale = frame.schedule(self.membership.iter());
        frame.dt = dt;
        drop(frame);
        let grid_us = grid_start.elapsed().as_micros() as u64;

        for id in &stale {
            warn!(agent = %id, "managed agent missing from snapshot, skipped");
            store.log_warning(&format!(
                "managed agent {id} missing from snapshot, skipped this tick"
            ));
        }

        // 3. Fork and join.
        let parallel_start = Instant::now();
        self.shared.barrier.release();
        for handle in &self.workers {
            handle.thread().unpark();
        }
        self.wait_for_workers()?;
        let parallel_us = parallel_start.elapsed().as_micros() as u64;

        // 4. Commit.
        let commit_start = Instant::now();
        self.membership.drain();
        let mut committed = 0;
        for slot in self.shared.slots.iter() {
            let out = slot.output.lock().unwrap_or_else(|e| e.into_inner());
            for (id, update) in &out.updates {
                if self.membership.contains(*id) {
                    store.commit(*id, update);
                    committed += 1;
                }
            }
        }
        let commit_us = commit_start.elapsed().as_micros() as u64;

        // 5. Load.
        let elapsed = tick_start.elapsed();
        self.load.record(elapsed, self.tick_budget);
        self.current_tick = next_tick;

        let metrics = TickMetrics {
            tick: next_tick,
            total_us: elapsed.as_micros() as u64,
            snapshot_us,
            grid_us,
            parallel_us,
            commit_us,
            snapshot_agents,
            managed_agents,
            buckets: grid_stats.buckets,
            misplaced_agents: grid_stats.misplaced,
            stale_references: stale.len(),
            committed,
            effective_dt: dt,
            load_average: self.load.average(),
        };
        trace!(
            tick = next_tick.0,
            agents = snapshot_agents,
            managed = managed_agents,
            buckets = grid_stats.buckets,
            committed,
            total_us = metrics.total_us,
            "frame update"
        );
        self.last_metrics = Some(metrics.clone());
        Ok(metrics)
    }

    /// Spin until the barrier clears, yielding between polls.
    fn wait_for_workers(&self) -> Result<(), TickError> {
        loop {
            if self.shared.barrier.is_clear() {
                return Ok(());
            }
            if !self.shared.run_state.is_running() {
                return Err(TickError::ShuttingDown);
            }
            if let Some(worker) = self.workers.iter().position(|h| h.is_finished()) {
                return Err(TickError::WorkerLost { worker });
            }
            thread::yield_now();
        }
    }

    /// `Running -> ShuttingDown`, wake and join every worker. Returns the
    /// number of workers joined cleanly.
    pub fn shutdown(&mut self) -> usize {
        self.shared.run_state.request_shutdown();
        for handle in &self.workers {
            handle.thread().unpark();
        }
        let mut joined = 0;
        for handle in self.workers.drain(..) {
            if handle.join().is_ok() {
                joined += 1;
            }
        }
        joined
    }

    /// A sender for authority notifications.
    pub fn membership(&self) -> MembershipHandle {
        self.membership.handle()
    }

    /// Number of managed agents, as of the last drain.
    pub fn managed_count(&self) -> usize {
        self.membership.len()
    }

    /// Whether `id` is managed, as of the last drain.
    pub fn is_managed(&self, id: AgentId) -> bool {
        self.membership.contains(id)
    }

    /// Current lifecycle phase.
    pub fn lifecycle(&self) -> Lifecycle {
        self.shared.run_state.lifecycle()
    }

    /// Shared run state, for threads that need to observe or stop the
    /// engine.
    pub fn run_state(&self) -> Arc<RunState> {
        Arc::clone(&self.shared.run_state)
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.ctx.worker_count
    }

    /// Rolling load average.
    pub fn load_average(&self) -> f64 {
        self.load.average()
    }

    /// Last completed tick.
    pub fn current_tick(&self) -> TickId {
        self.current_tick
    }

    /// Metrics of the last completed tick.
    pub fn last_metrics(&self) -> Option<&TickMetrics> {
        self.last_metrics.as_ref()
    }

    /// The validated configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl Drop for TickEngine {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            self.shutdown();
        }
    }
}
