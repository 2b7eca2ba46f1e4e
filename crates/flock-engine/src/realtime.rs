//! Realtime scheduler: a [`TickEngine`] driven at a fixed rate on a
//! background thread.
//!
//! [`FlockScheduler::start()`] moves the store onto a tick thread named
//! `flock-tick`. Membership notifications flow in through a
//! [`MembershipHandle`]; metrics flow out through
//! [`latest_metrics()`](FlockScheduler::latest_metrics). Shutdown wakes
//! the tick thread from its budget sleep, joins it, and recovers the
//! store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use flock_core::AgentStore;
use tracing::{info, warn};

use crate::config::{ConfigError, EngineConfig};
use crate::membership::MembershipHandle;
use crate::metrics::TickMetrics;
use crate::run_state::{Lifecycle, RunState};
use crate::tick::TickEngine;
use crate::tick_thread::{TickThreadExit, TickThreadState, TickThreadStats};

/// How long shutdown waits for the tick thread to acknowledge before
/// joining anyway.
const DRAIN_BUDGET: Duration = Duration::from_millis(250);

// ── ShutdownReport ───────────────────────────────────────────────

/// Report from [`FlockScheduler::shutdown()`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Total time spent in the shutdown sequence.
    pub total_ms: u64,
    /// Whether the tick thread was joined successfully.
    pub tick_joined: bool,
    /// Number of worker threads joined by the tick thread.
    pub workers_joined: usize,
    /// Ticks completed over the scheduler's lifetime.
    pub ticks_run: u64,
}

// ── FlockScheduler ───────────────────────────────────────────────

/// Flocking simulation running at `tick_rate_hz` on its own thread.
pub struct FlockScheduler<S: AgentStore + Send + 'static> {
    run_state: Arc<RunState>,
    tick_stopped: Arc<AtomicBool>,
    stats: Arc<TickThreadStats>,
    membership: MembershipHandle,
    worker_count: usize,
    tick_thread: Option<JoinHandle<TickThreadExit<S>>>,
    /// Recovered from the tick thread on shutdown.
    recovered_store: Mutex<Option<S>>,
    last_report: Option<ShutdownReport>,
}

impl<S: AgentStore + Send + 'static> FlockScheduler<S> {
    /// Validate `config`, start the worker pool, and spawn the tick thread.
    pub fn start(config: EngineConfig, store: S) -> Result<Self, ConfigError> {
        let mut engine = TickEngine::new(config)?;
        engine.start()?;

        let run_state = engine.run_state();
        let membership = engine.membership();
        let worker_count = engine.worker_count();
        let tick_rate_hz = engine.config().tick_rate_hz;
        let tick_stopped = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(TickThreadStats::default());

        let state = TickThreadState::new(
            engine,
            store,
            Arc::clone(&tick_stopped),
            Arc::clone(&stats),
        );
        let tick_thread = thread::Builder::new()
            .name("flock-tick".into())
            .spawn(move || state.run())
            .map_err(|e| {
                // The closure (and the engine inside it) was dropped, which
                // already joined the workers.
                ConfigError::ThreadSpawnFailed {
                    reason: format!("flock-tick: {e}"),
                }
            })?;

        info!(tick_rate_hz, workers = worker_count, "flock scheduler started");
        Ok(Self {
            run_state,
            tick_stopped,
            stats,
            membership,
            worker_count,
            tick_thread: Some(tick_thread),
            recovered_store: Mutex::new(None),
            last_report: None,
        })
    }

    /// A sender for authority notifications.
    pub fn membership(&self) -> MembershipHandle {
        self.membership.clone()
    }

    /// Metrics of the most recent completed tick.
    pub fn latest_metrics(&self) -> Option<TickMetrics> {
        self.stats
            .latest
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Ticks completed so far.
    pub fn ticks_run(&self) -> u64 {
        self.stats.ticks_run.load(Ordering::Acquire)
    }

    /// Whether the tick thread is still ticking.
    pub fn is_running(&self) -> bool {
        self.run_state.is_running() && !self.tick_stopped.load(Ordering::Acquire)
    }

    /// Current lifecycle phase.
    pub fn lifecycle(&self) -> Lifecycle {
        self.run_state.lifecycle()
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Stop ticking, join every thread, and keep the store for
    /// [`take_store()`](Self::take_store). Idempotent: later calls
    /// return the first report.
    pub fn shutdown(&mut self) -> ShutdownReport {
        if let Some(report) = &self.last_report {
            return report.clone();
        }
        let start = Instant::now();

        self.run_state.request_shutdown();
        if let Some(handle) = &self.tick_thread {
            handle.thread().unpark();
        }

        let drain_deadline = Instant::now() + DRAIN_BUDGET;
        while !self.tick_stopped.load(Ordering::Acquire) {
            if Instant::now() > drain_deadline {
                warn!("tick thread did not stop within the drain budget");
                break;
            }
            thread::yield_now();
        }

        let (tick_joined, workers_joined) = match self.tick_thread.take().map(|h| h.join()) {
            Some(Ok(exit)) => {
                *self
                    .recovered_store
                    .lock()
                    .unwrap_or_else(|e| e.into_inner()) = Some(exit.store);
                (true, exit.workers_joined)
            }
            Some(Err(_)) => (false, 0),
            None => (true, 0),
        };

        let report = ShutdownReport {
            total_ms: start.elapsed().as_millis() as u64,
            tick_joined,
            workers_joined,
            ticks_run: self.ticks_run(),
        };
        info!(
            total_ms = report.total_ms,
            ticks = report.ticks_run,
            "flock scheduler stopped"
        );
        self.last_report = Some(report.clone());
        report
    }

    /// Shut down (if still running) and hand back the store.
    ///
    /// Fails with [`ConfigError::EngineRecoveryFailed`] if the tick thread
    /// panicked or the store was already taken.
    pub fn take_store(&mut self) -> Result<S, ConfigError> {
        self.shutdown();
        self.recovered_store
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .ok_or(ConfigError::EngineRecoveryFailed)
    }
}

impl<S: AgentStore + Send + 'static> Drop for FlockScheduler<S> {
    fn drop(&mut self) {
        if self.last_report.is_none() {
            self.shutdown();
        }
    }
}
