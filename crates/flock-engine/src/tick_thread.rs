//! Fixed-rate tick loop for the realtime scheduler.
//!
//! The tick thread owns the [`TickEngine`] and the store exclusively
//! (moved in via `thread::spawn`). The owner observes it through the
//! shared run state, a tick counter, and the latest metrics.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use flock_core::AgentStore;
use tracing::{debug, error, info};

use crate::metrics::TickMetrics;
use crate::run_state::RunState;
use crate::tick::{TickEngine, TickError};

/// What the tick thread hands back when it exits.
pub(crate) struct TickThreadExit<S> {
    pub store: S,
    pub workers_joined: usize,
}

/// Counters the tick thread publishes for its owner.
#[derive(Debug, Default)]
pub(crate) struct TickThreadStats {
    pub ticks_run: AtomicU64,
    pub latest: Mutex<Option<TickMetrics>>,
}

/// State held by the tick thread's main loop.
pub(crate) struct TickThreadState<S> {
    engine: TickEngine,
    store: S,
    run_state: Arc<RunState>,
    tick_stopped: Arc<AtomicBool>,
    stats: Arc<TickThreadStats>,
    tick_budget: Duration,
    metrics_interval: Duration,
}

impl<S: AgentStore> TickThreadState<S> {
    pub fn new(
        engine: TickEngine,
        store: S,
        tick_stopped: Arc<AtomicBool>,
        stats: Arc<TickThreadStats>,
    ) -> Self {
        let config = engine.config();
        let tick_budget = config.tick_budget();
        let metrics_interval = config.metrics_interval;
        Self {
            run_state: engine.run_state(),
            engine,
            store,
            tick_stopped,
            stats,
            tick_budget,
            metrics_interval,
        }
    }

    /// Main tick loop. Runs until the run state leaves `Running` or a
    /// tick fails.
    ///
    /// Consumes self, stops the workers, and returns the store.
    pub fn run(mut self) -> TickThreadExit<S> {
        let mut last_report = Instant::now();

        while self.run_state.is_running() {
            let tick_start = Instant::now();

            match self.engine.run_tick(&mut self.store) {
                Ok(metrics) => {
                    *self.stats.latest.lock().unwrap_or_else(|e| e.into_inner()) = Some(metrics);
                    self.stats.ticks_run.fetch_add(1, Ordering::Release);
                }
                Err(TickError::WorkerLost { worker }) => {
                    error!(worker, "flock worker lost, stopping tick loop");
                    break;
                }
                Err(e) => {
                    debug!(error = %e, "tick loop stopping");
                    break;
                }
            }

            if last_report.elapsed() >= self.metrics_interval {
                info!(
                    tick = self.engine.current_tick().0,
                    load = self.engine.load_average(),
                    managed = self.engine.managed_count(),
                    "flock load"
                );
                last_report = Instant::now();
            }

            // Sleep out the rest of the budget. park_timeout so that
            // shutdown can wake us early.
            // A budget too long for the clock waits for shutdown alone.
            let deadline = tick_start.checked_add(self.tick_budget);
            loop {
                if !self.run_state.is_running() {
                    break;
                }
                match deadline {
                    None => thread::park(),
                    Some(deadline) => match deadline.checked_duration_since(Instant::now()) {
                        Some(remaining) if !remaining.is_zero() => thread::park_timeout(remaining),
                        _ => break,
                    },
                }
            }
            if tick_start.elapsed() > self.tick_budget {
                thread::yield_now();
            }
        }

        self.run_state.request_shutdown();
        let workers_joined = self.engine.shutdown();
        self.tick_stopped.store(true, Ordering::Release);
        TickThreadExit {
            store: self.store,
            workers_joined,
        }
    }
}
