//! Shared numeric tolerances and small vector helpers.

use glam::DVec3;

/// Tolerance used by every degenerate-geometry guard in the simulation.
///
/// Compared against squared lengths (separation, steering magnitude) and
/// against individual components (rotation axis). Visibility uses its
/// square as the coincidence threshold.
pub const EPSILON: f64 = 0.001;

/// `v * v`.
#[inline]
pub fn sqr(v: f64) -> f64 {
    v * v
}

/// Whether every component of `v` lies strictly inside `(-ep, ep)`.
#[inline]
pub fn is_zero(v: DVec3, ep: f64) -> bool {
    v.x.abs() < ep && v.y.abs() < ep && v.z.abs() < ep
}
