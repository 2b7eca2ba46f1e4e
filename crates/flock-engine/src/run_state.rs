//! Process-wide run lifecycle shared by the coordinator and every worker.

use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle phase of a tick engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Lifecycle {
    /// Constructed, no worker running.
    Idle = 0,
    /// Ticks may run.
    Running = 1,
    /// Stop requested; workers exit on their next poll.
    ShuttingDown = 2,
}

impl Lifecycle {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Idle,
            1 => Self::Running,
            _ => Self::ShuttingDown,
        }
    }
}

/// Atomic [`Lifecycle`] cell.
///
/// The only transitions are `Idle -> Running` and
/// `Running -> ShuttingDown`; both are single compare-exchanges so
/// concurrent callers agree on who performed them.
#[derive(Debug)]
pub struct RunState {
    state: AtomicU8,
}

// Compile-time assertion: RunState must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<RunState>();
};

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

impl RunState {
    /// A new cell in [`Lifecycle::Idle`].
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(Lifecycle::Idle as u8),
        }
    }

    /// Current phase.
    pub fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Whether the phase is [`Lifecycle::Running`].
    pub fn is_running(&self) -> bool {
        self.lifecycle() == Lifecycle::Running
    }

    /// `Idle -> Running`. Returns `false` if the state was not `Idle`.
    pub fn begin(&self) -> bool {
        self.transition(Lifecycle::Idle, Lifecycle::Running)
    }

    /// `Running -> ShuttingDown`. Returns `false` if the state was not
    /// `Running`.
    pub fn request_shutdown(&self) -> bool {
        self.transition(Lifecycle::Running, Lifecycle::ShuttingDown)
    }

    fn transition(&self, from: Lifecycle, to: Lifecycle) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
