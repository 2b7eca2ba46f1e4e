//! Static split of the per-tick work list across workers.

use std::ops::Range;

/// Contiguous slice of `0..len` processed by `worker` out of `workers`.
///
/// With fewer items than workers the first worker takes everything and
/// the rest stay idle. Otherwise every worker gets `len / workers`
/// items and the last one also takes the remainder. Ranges of distinct
/// workers never overlap and together cover `0..len` exactly.
pub fn partition(len: usize, workers: usize, worker: usize) -> Range<usize> {
    if workers == 0 || worker >= workers {
        return 0..0;
    }
    if len < workers {
        return if worker == 0 { 0..len } else { 0..0 };
    }
    let per_worker = len / workers;
    let start = worker * per_worker;
    let end = if worker == workers - 1 {
        len
    } else {
        start + per_worker
    };
    start..end
}
