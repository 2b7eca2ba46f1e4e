//! Fork-join bitmask barrier.
//!
//! The coordinator sets one bit per worker with [`WorkBarrier::release`];
//! each worker clears only its own bit with [`WorkBarrier::complete`]
//! once its slice is written. The tick is joined when the mask reads
//! zero. Release and acquire orderings on the mask carry the happens-
//! before edges: frame writes before release are visible to workers,
//! worker output written before `complete` is visible to the coordinator
//! after it observes zero.

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

/// Upper bound on workers, one bit each.
pub const MAX_WORKERS: usize = 64;

/// Ready/done bitmask with one bit per worker.
#[derive(Debug)]
pub struct WorkBarrier {
    pending: AtomicU64,
    full: u64,
}

impl WorkBarrier {
    /// Barrier for `workers` workers, clamped to `1..=MAX_WORKERS`.
    pub fn new(workers: usize) -> Self {
        let workers = workers.clamp(1, MAX_WORKERS);
        let full = if workers == MAX_WORKERS {
            u64::MAX
        } else {
            (1u64 << workers) - 1
        };
        Self {
            pending: AtomicU64::new(0),
            full,
        }
    }

    /// Number of workers the barrier was built for.
    pub fn workers(&self) -> usize {
        self.full.count_ones() as usize
    }

    /// Set every worker's bit, publishing all prior writes.
    pub fn release(&self) {
        self.pending.store(self.full, Ordering::Release);
    }

    /// Clear `worker`'s bit with a compare-and-retry loop.
    pub fn complete(&self, worker: usize) {
        let bit = 1u64 << worker;
        let mut current = self.pending.load(Ordering::Acquire);
        loop {
            match self.pending.compare_exchange_weak(
                current,
                current & !bit,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(actual) => {
                    current = actual;
                    thread::yield_now();
                }
            }
        }
    }

    /// Whether `worker` has work it has not completed.
    pub fn is_pending(&self, worker: usize) -> bool {
        self.pending.load(Ordering::Acquire) & (1u64 << worker) != 0
    }

    /// Whether every worker has completed.
    pub fn is_clear(&self) -> bool {
        self.pending.load(Ordering::Acquire) == 0
    }

    /// Raw mask, for diagnostics.
    pub fn pending_mask(&self) -> u64 {
        self.pending.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn release_sets_all_bits() {
        let b = WorkBarrier::new(3);
        assert!(b.is_clear());
        b.release();
        assert_eq!(b.pending_mask(), 0b111);
        assert!(b.is_pending(0) && b.is_pending(2));
        assert!(!b.is_pending(3));
    }

    #[test]
    fn complete_clears_only_own_bit() {
        let b = WorkBarrier::new(3);
        b.release();
        b.complete(1);
        assert_eq!(b.pending_mask(), 0b101);
        b.complete(1);
        assert_eq!(b.pending_mask(), 0b101);
        b.complete(0);
        b.complete(2);
        assert!(b.is_clear());
    }

    #[test]
    fn worker_count_is_clamped() {
        assert_eq!(WorkBarrier::new(0).workers(), 1);
        assert_eq!(WorkBarrier::new(64).workers(), 64);
        assert_eq!(WorkBarrier::new(100).workers(), 64);
        let b = WorkBarrier::new(64);
        b.release();
        assert_eq!(b.pending_mask(), u64::MAX);
        b.complete(63);
        assert!(!b.is_pending(63));
    }

    #[test]
    fn concurrent_completion_clears_mask() {
        let b = Arc::new(WorkBarrier::new(16));
        for _ in 0..50 {
            b.release();
            let handles: Vec<_> = (0..16)
                .map(|w| {
                    let b = Arc::clone(&b);
                    thread::spawn(move || b.complete(w))
                })
                .collect();
            for h in handles {
                h.join().unwrap();
            }
            assert!(b.is_clear());
        }
    }
}
