//! Engine configuration, validation, and error types.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use flock_space::{GridLayout, SearchMode, SpaceError};
use flock_steering::BoundaryConfig;

use crate::barrier::MAX_WORKERS;
use crate::run_state::Lifecycle;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected by [`EngineConfig::validate()`] or while bringing an
/// engine up or down.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// Grid layout is unusable.
    Space(SpaceError),
    /// tick_rate_hz is NaN, infinite, zero, negative, or so small that
    /// its tick period does not fit a [`Duration`].
    InvalidTickRate {
        /// The invalid value.
        value: f64,
    },
    /// Explicit worker count outside `1..=64`.
    InvalidWorkerCount {
        /// The configured count.
        value: usize,
    },
    /// max_neighbours is zero.
    NeighbourCapacityZero,
    /// load_window is zero.
    LoadWindowZero,
    /// Boundary constants are not finite or the height band is inverted.
    InvalidBoundary {
        /// Description of which constraint was violated.
        reason: String,
    },
    /// `start()` called on an engine that is not idle.
    NotIdle {
        /// The phase the engine was in.
        state: Lifecycle,
    },
    /// State could not be recovered from the tick thread (it panicked).
    EngineRecoveryFailed,
    /// A background thread could not be spawned.
    ThreadSpawnFailed {
        /// Description of which thread failed.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Space(e) => write!(f, "grid: {e}"),
            Self::InvalidTickRate { value } => {
                write!(
                    f,
                    "tick_rate_hz must be finite, positive, and give a representable tick period, got {value}"
                )
            }
            Self::InvalidWorkerCount { value } => {
                write!(f, "worker_count must be in 1..={MAX_WORKERS}, got {value}")
            }
            Self::NeighbourCapacityZero => write!(f, "max_neighbours must be at least 1"),
            Self::LoadWindowZero => write!(f, "load_window must be at least 1"),
            Self::InvalidBoundary { reason } => write!(f, "invalid boundary: {reason}"),
            Self::NotIdle { state } => write!(f, "engine is not idle ({state:?})"),
            Self::EngineRecoveryFailed => {
                write!(f, "engine could not be recovered from tick thread")
            }
            Self::ThreadSpawnFailed { reason } => write!(f, "thread spawn failed: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Space(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SpaceError> for ConfigError {
    fn from(e: SpaceError) -> Self {
        Self::Space(e)
    }
}

// ── EngineConfig ───────────────────────────────────────────────────

/// Configuration for a [`TickEngine`](crate::tick::TickEngine) and the
/// realtime [`FlockScheduler`](crate::realtime::FlockScheduler).
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Nominal ticks per second. Default: 8.
    pub tick_rate_hz: f64,
    /// Worker threads. `None` = `available_parallelism`, clamped to
    /// `[1, 64]`.
    pub worker_count: Option<usize>,
    /// Capacity of each worker's neighbour buffer; per-agent
    /// `number_to_consider` is clamped to it. Default: 32.
    pub max_neighbours: usize,
    /// Ticks averaged for the load factor. Default: 16.
    pub load_window: usize,
    /// Worker sleep while waiting for its ready bit. Default: 1 ms.
    pub idle_poll: Duration,
    /// Interval between load reports from the realtime loop. Default: 1 s.
    pub metrics_interval: Duration,
    /// Neighbour enumeration strategy. Default: grid.
    pub search_mode: SearchMode,
    /// Count in-range agents by linear scan as well and warn on any
    /// disparity with the grid. Default: off.
    pub cross_check_grid: bool,
    /// Spatial grid layout.
    pub grid: GridLayout,
    /// Soft world boundary.
    pub boundary: BoundaryConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 8.0,
            worker_count: None,
            max_neighbours: 32,
            load_window: 16,
            idle_poll: Duration::from_millis(1),
            metrics_interval: Duration::from_secs(1),
            search_mode: SearchMode::Grid,
            cross_check_grid: false,
            grid: GridLayout::default(),
            boundary: BoundaryConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Check every structural invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tick_rate_hz.is_finite()
            || self.tick_rate_hz <= 0.0
            || Duration::try_from_secs_f64(1.0 / self.tick_rate_hz).is_err()
        {
            return Err(ConfigError::InvalidTickRate {
                value: self.tick_rate_hz,
            });
        }
        if let Some(n) = self.worker_count {
            if n == 0 || n > MAX_WORKERS {
                return Err(ConfigError::InvalidWorkerCount { value: n });
            }
        }
        if self.max_neighbours == 0 {
            return Err(ConfigError::NeighbourCapacityZero);
        }
        if self.load_window == 0 {
            return Err(ConfigError::LoadWindowZero);
        }
        if !self.boundary.is_valid() {
            return Err(ConfigError::InvalidBoundary {
                reason: format!(
                    "max_distance {} height band [{}, {}]",
                    self.boundary.max_distance, self.boundary.min_height, self.boundary.max_height
                ),
            });
        }
        self.grid.validate()?;
        Ok(())
    }

    /// Resolve the actual worker count, applying auto-detection if `None`.
    pub fn resolved_worker_count(&self) -> usize {
        match self.worker_count {
            Some(n) => n.clamp(1, MAX_WORKERS),
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
                .clamp(1, MAX_WORKERS),
        }
    }

    /// Nominal wall time per tick.
    pub fn tick_budget(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz)
    }

    /// Nominal simulated seconds per tick.
    pub fn base_dt(&self) -> f64 {
        1.0 / self.tick_rate_hz
    }
}
