//! Rolling tick-load average and the adaptive timestep.

use std::time::Duration;

/// Fixed-length ring of recent tick loads.
///
/// A load sample is a tick's wall time divided by the nominal tick
/// budget. The window starts filled with zeros, so the average ramps up
/// over the first `len` ticks.
#[derive(Clone, Debug)]
pub struct LoadWindow {
    samples: Vec<f64>,
    pos: usize,
}

impl LoadWindow {
    /// Window of `len` samples (at least one).
    pub fn new(len: usize) -> Self {
        Self {
            samples: vec![0.0; len.max(1)],
            pos: 0,
        }
    }

    /// Overwrite the oldest sample.
    pub fn push(&mut self, load: f64) {
        self.samples[self.pos] = load;
        self.pos = (self.pos + 1) % self.samples.len();
    }

    /// Record a tick that took `elapsed` against `budget`.
    pub fn record(&mut self, elapsed: Duration, budget: Duration) {
        self.push(elapsed.as_secs_f64() / budget.as_secs_f64());
    }

    /// Mean over the whole window.
    pub fn average(&self) -> f64 {
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Number of samples held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always `false`; a window holds at least one sample.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// `base` stretched by the average load. Never shorter than `base`.
    pub fn effective_dt(&self, base: f64) -> f64 {
        base * self.average().max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let w = LoadWindow::new(16);
        assert_eq!(w.len(), 16);
        assert_eq!(w.average(), 0.0);
        assert_eq!(w.effective_dt(0.125), 0.125);
    }

    #[test]
    fn oldest_sample_is_overwritten() {
        let mut w = LoadWindow::new(4);
        for _ in 0..4 {
            w.push(2.0);
        }
        assert_eq!(w.average(), 2.0);
        w.push(6.0);
        assert_eq!(w.average(), 3.0);
    }

    #[test]
    fn light_load_never_speeds_time_up() {
        let mut w = LoadWindow::new(4);
        for _ in 0..4 {
            w.push(0.2);
        }
        assert_eq!(w.effective_dt(0.125), 0.125);
    }

    #[test]
    fn overload_dilates_time() {
        let mut w = LoadWindow::new(2);
        w.record(Duration::from_millis(250), Duration::from_millis(125));
        w.record(Duration::from_millis(375), Duration::from_millis(125));
        assert!((w.average() - 2.5).abs() < 1e-12);
        assert!((w.effective_dt(0.125) - 0.3125).abs() < 1e-12);
    }

    #[test]
    fn zero_length_becomes_one() {
        let mut w = LoadWindow::new(0);
        assert_eq!(w.len(), 1);
        assert!(!w.is_empty());
        w.push(3.0);
        assert_eq!(w.average(), 3.0);
    }
}
