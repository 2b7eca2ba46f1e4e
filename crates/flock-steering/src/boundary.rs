//! Soft world-boundary shaping applied after raw steering.

use flock_core::math::sqr;
use flock_core::{Transform, EPSILON};
use glam::DVec3;

/// Containment constants. Height is measured along +Y.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundaryConfig {
    /// Distance from the origin at which the containment pull reaches
    /// unit strength.
    pub max_distance: f64,
    /// Below this height downward steering is reflected.
    pub min_height: f64,
    /// Above this height upward steering is reflected.
    pub max_height: f64,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            max_distance: 192.0,
            min_height: 10.0,
            max_height: 30.0,
        }
    }
}

impl BoundaryConfig {
    /// Whether the constants describe a usable band and radius.
    pub fn is_valid(&self) -> bool {
        self.max_distance.is_finite()
            && self.max_distance > 0.0
            && self.min_height.is_finite()
            && self.max_height.is_finite()
            && self.min_height <= self.max_height
    }
}

/// Add a pull toward the origin of strength `(d² / max_distance²)^16`.
pub fn keep_near_origin(me: &Transform, steering: DVec3, config: &BoundaryConfig) -> DVec3 {
    let to_origin = -me.position;
    let dist_sq = to_origin.length_squared();
    if dist_sq <= EPSILON {
        return steering;
    }
    steering + to_origin.normalize() * (dist_sq / sqr(config.max_distance)).powi(16)
}

/// Reflect the vertical component when it points further out of the
/// height band.
pub fn keep_at_good_height(me: &Transform, steering: DVec3, config: &BoundaryConfig) -> DVec3 {
    let height = me.position.y;
    let leaving = (height < config.min_height && steering.y < 0.0)
        || (height > config.max_height && steering.y > 0.0);
    if leaving {
        DVec3::new(steering.x, -steering.y, steering.z)
    } else {
        steering
    }
}

/// Origin containment followed by height banding.
pub fn shape(me: &Transform, raw: DVec3, config: &BoundaryConfig) -> DVec3 {
    let pulled = keep_near_origin(me, raw, config);
    keep_at_good_height(me, pulled, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(pos: DVec3) -> Transform {
        Transform::at(pos, DVec3::Z)
    }

    // ── Origin containment ──────────────────────────────────────

    #[test]
    fn pull_is_unit_at_max_distance() {
        let cfg = BoundaryConfig::default();
        let v = keep_near_origin(&at(DVec3::new(192.0, 0.0, 0.0)), DVec3::ZERO, &cfg);
        assert!((v - DVec3::new(-1.0, 0.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn pull_is_negligible_near_centre() {
        let cfg = BoundaryConfig::default();
        let v = keep_near_origin(&at(DVec3::new(50.0, 20.0, 0.0)), DVec3::ZERO, &cfg);
        assert!(v.length() < 1e-9);
    }

    #[test]
    fn no_pull_at_origin() {
        let cfg = BoundaryConfig::default();
        let s = DVec3::new(0.3, 0.2, 0.1);
        assert_eq!(keep_near_origin(&at(DVec3::ZERO), s, &cfg), s);
    }

    // ── Height band ─────────────────────────────────────────────

    #[test]
    fn reflects_only_when_leaving_band() {
        let cfg = BoundaryConfig::default();
        let down = DVec3::new(1.0, -2.0, 3.0);
        let up = DVec3::new(1.0, 2.0, 3.0);
        assert_eq!(keep_at_good_height(&at(DVec3::new(0.0, 5.0, 0.0)), down, &cfg), up);
        assert_eq!(keep_at_good_height(&at(DVec3::new(0.0, 5.0, 0.0)), up, &cfg), up);
        assert_eq!(keep_at_good_height(&at(DVec3::new(0.0, 40.0, 0.0)), up, &cfg), down);
        assert_eq!(keep_at_good_height(&at(DVec3::new(0.0, 40.0, 0.0)), down, &cfg), down);
        assert_eq!(keep_at_good_height(&at(DVec3::new(0.0, 20.0, 0.0)), down, &cfg), down);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(BoundaryConfig::default().is_valid());
        let inverted = BoundaryConfig {
            min_height: 40.0,
            ..BoundaryConfig::default()
        };
        assert!(!inverted.is_valid());
    }

    proptest! {
        #[test]
        fn height_band_invariant(
            height in -100.0f64..100.0,
            sx in -5.0f64..5.0, sy in -5.0f64..5.0, sz in -5.0f64..5.0,
        ) {
            let cfg = BoundaryConfig::default();
            let s = DVec3::new(sx, sy, sz);
            let out = keep_at_good_height(&at(DVec3::new(0.0, height, 0.0)), s, &cfg);
            prop_assert_eq!(out.x, s.x);
            prop_assert_eq!(out.z, s.z);
            if height < cfg.min_height && sy < 0.0 {
                prop_assert_eq!(out.y, -sy);
            } else if (cfg.min_height..=cfg.max_height).contains(&height) {
                prop_assert_eq!(out.y, sy);
            }
        }
    }
}
