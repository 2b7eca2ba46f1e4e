//! Per-tick shared frame, per-worker output slots, and the worker loop.
//!
//! The coordinator writes the [`TickFrame`] while every barrier bit is
//! clear, then releases the workers. During the parallel phase the frame
//! is only read. Each worker writes exclusively to its own
//! [`WorkerSlot`], chosen by its index; the coordinator reads the slots
//! only after the barrier has cleared.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::thread;
use std::time::Duration;

use flock_core::{AgentId, AgentRecord, AgentUpdate};
use flock_space::{
    GridBuildStats, GridLayout, NeighbourBuffer, NeighbourSearch, SearchMode, SpaceError,
    SpatialGrid, TransformCache,
};
use flock_steering::{integrate, BoundaryConfig};
use tracing::{debug, warn};

use crate::barrier::WorkBarrier;
use crate::partition::partition;
use crate::run_state::{Lifecycle, RunState};

/// One managed agent scheduled for this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct WorkItem {
    pub id: AgentId,
    /// Index of the agent's record in the frame's snapshot.
    pub record: usize,
}

/// Everything workers read during one tick.
pub(crate) struct TickFrame {
    pub records: Vec<AgentRecord>,
    pub cache: TransformCache,
    pub grid: SpatialGrid,
    pub index: HashMap<AgentId, usize>,
    pub work: Vec<WorkItem>,
    pub dt: f64,
}

impl TickFrame {
    pub fn new(layout: GridLayout) -> Result<Self, SpaceError> {
        Ok(Self {
            records: Vec::new(),
            cache: TransformCache::new(),
            grid: SpatialGrid::new(layout)?,
            index: HashMap::new(),
            work: Vec::new(),
            dt: 0.0,
        })
    }

    /// Replace the snapshot and rebuild the transform cache and id index.
    /// Clears the work list.
    pub fn load(&mut self, records: Vec<AgentRecord>) {
        self.records = records;
        self.cache.rebuild(&self.records);
        self.index.clear();
        self.index
            .extend(self.records.iter().enumerate().map(|(i, r)| (r.id, i)));
        self.work.clear();
    }

    /// Rebuild the grid from the current cache.
    pub fn rebuild_grid(&mut self) -> GridBuildStats {
        self.grid.rebuild(&self.cache)
    }

    /// [`load`](Self::load) followed by [`rebuild_grid`](Self::rebuild_grid).
    #[cfg(test)]
    pub fn refresh(&mut self, records: Vec<AgentRecord>) -> GridBuildStats {
        self.load(records);
        self.rebuild_grid()
    }

    /// Queue every managed agent present in the snapshot. Returns the
    /// managed agents that are absent.
    pub fn schedule(&mut self, managed: impl Iterator<Item = AgentId>) -> Vec<AgentId> {
        let mut stale = Vec::new();
        for id in managed {
            match self.index.get(&id) {
                Some(&record) => self.work.push(WorkItem { id, record }),
                None => stale.push(id),
            }
        }
        stale
    }
}

/// Output of one worker for one tick.
#[derive(Debug, Default)]
pub(crate) struct WorkerOutput {
    /// Updates in work-list order. Agents without a transform or params
    /// have no entry.
    pub updates: Vec<(AgentId, AgentUpdate)>,
}

/// Output slot owned by one worker.
///
/// 128-byte alignment keeps neighbouring workers' slots off each other's
/// cache lines.
#[repr(align(128))]
#[derive(Debug, Default)]
pub(crate) struct WorkerSlot {
    pub output: Mutex<WorkerOutput>,
}

/// Immutable per-worker settings.
#[derive(Clone, Debug)]
pub(crate) struct WorkerContext {
    pub worker_count: usize,
    pub max_neighbours: usize,
    pub idle_poll: Duration,
    pub search_mode: SearchMode,
    pub cross_check_grid: bool,
    pub boundary: BoundaryConfig,
}

/// State shared between the coordinator and all workers.
pub(crate) struct Shared {
    pub run_state: Arc<RunState>,
    pub barrier: WorkBarrier,
    pub frame: RwLock<TickFrame>,
    pub slots: Box<[WorkerSlot]>,
}

// Compile-time assertion: Shared must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Shared>();
};

/// Simulate `frame.work[range]`, appending results to `out`.
pub(crate) fn simulate_slice(
    frame: &TickFrame,
    range: std::ops::Range<usize>,
    ctx: &WorkerContext,
    buffer: &mut NeighbourBuffer,
    out: &mut WorkerOutput,
) {
    let search = NeighbourSearch::new(&frame.grid, &frame.cache);
    for item in &frame.work[range] {
        let record = &frame.records[item.record];
        let (Some(transform), Some(params)) = (record.transform.as_ref(), record.params.as_ref())
        else {
            continue;
        };

        let stats = search.search(ctx.search_mode, item.id, transform, params, buffer);
        if ctx.cross_check_grid && ctx.search_mode == SearchMode::Grid {
            let linear = search.count_visible_linear(item.id, transform, params.search_range);
            if linear != stats.accepted {
                warn!(
                    agent = %item.id,
                    grid = stats.accepted,
                    linear,
                    "grid and linear neighbour counts disagree"
                );
            }
        }

        let update = integrate(transform, params, buffer.as_slice(), &ctx.boundary, frame.dt);
        out.updates.push((item.id, update));
    }
}

/// Body of worker thread `worker`.
///
/// Polls the run state and its ready bit, sleeping `idle_poll` between
/// polls. Exits as soon as the run state is `ShuttingDown`.
pub(crate) fn worker_loop(shared: Arc<Shared>, ctx: WorkerContext, worker: usize) {
    debug!(worker, "flock worker started");
    let mut buffer = NeighbourBuffer::with_capacity(ctx.max_neighbours);

    loop {
        match shared.run_state.lifecycle() {
            Lifecycle::ShuttingDown => break,
            Lifecycle::Idle => {
                thread::park_timeout(ctx.idle_poll);
                continue;
            }
            Lifecycle::Running => {}
        }
        if !shared.barrier.is_pending(worker) {
            thread::park_timeout(ctx.idle_poll);
            continue;
        }

        {
            let frame = shared.frame.read().unwrap_or_else(|e| e.into_inner());
            let mut out = shared.slots[worker]
                .output
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            out.updates.clear();
            let range = partition(frame.work.len(), ctx.worker_count, worker);
            simulate_slice(&frame, range, &ctx, &mut buffer, &mut out);
        }
        shared.barrier.complete(worker);
    }

    debug!(worker, "flock worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use flock_core::{DVec3, FlockingParams, Transform};

    fn ctx() -> WorkerContext {
        WorkerContext {
            worker_count: 1,
            max_neighbours: 32,
            idle_poll: Duration::from_millis(1),
            search_mode: SearchMode::Grid,
            cross_check_grid: true,
            boundary: BoundaryConfig::default(),
        }
    }

    fn record(id: u64, pos: DVec3) -> AgentRecord {
        AgentRecord::new(AgentId(id), Transform::at(pos, DVec3::Z), FlockingParams::default())
    }

    #[test]
    fn schedule_reports_stale_ids() {
        let mut frame = TickFrame::new(GridLayout::default()).unwrap();
        frame.refresh(vec![record(1, DVec3::ZERO), record(2, DVec3::X)]);
        let stale = frame.schedule([AgentId(2), AgentId(9), AgentId(1)].into_iter());
        assert_eq!(stale, vec![AgentId(9)]);
        assert_eq!(
            frame.work,
            vec![
                WorkItem { id: AgentId(2), record: 1 },
                WorkItem { id: AgentId(1), record: 0 },
            ]
        );
    }

    #[test]
    fn refresh_clears_previous_work() {
        let mut frame = TickFrame::new(GridLayout::default()).unwrap();
        frame.refresh(vec![record(1, DVec3::ZERO)]);
        frame.schedule([AgentId(1)].into_iter());
        let stats = frame.refresh(vec![]);
        assert!(frame.work.is_empty());
        assert_eq!(stats.agents, 0);
        assert_eq!(frame.grid.bucket_count(), 0);
    }

    #[test]
    fn slice_skips_agents_without_components() {
        let mut frame = TickFrame::new(GridLayout::default()).unwrap();
        let mut no_params = record(2, DVec3::X);
        no_params.params = None;
        let no_transform = AgentRecord {
            id: AgentId(3),
            transform: None,
            params: Some(FlockingParams::default()),
        };
        frame.refresh(vec![record(1, DVec3::new(0.0, 20.0, 0.0)), no_params, no_transform]);
        frame.schedule([AgentId(1), AgentId(2), AgentId(3)].into_iter());
        frame.dt = 0.125;

        let mut buffer = NeighbourBuffer::with_capacity(32);
        let mut out = WorkerOutput::default();
        simulate_slice(&frame, 0..3, &ctx(), &mut buffer, &mut out);
        assert_eq!(out.updates.len(), 1);
        assert_eq!(out.updates[0].0, AgentId(1));
        // Turning never changes speed.
        let update = out.updates[0].1;
        assert!((update.velocity.length() - FlockingParams::default().speed).abs() < 1e-9);
    }

    #[test]
    fn slot_alignment() {
        assert_eq!(std::mem::align_of::<WorkerSlot>(), 128);
    }
}
