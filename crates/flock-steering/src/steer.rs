//! Raw steering from a bounded neighbour set.

use std::f64::consts::LN_2;

use flock_core::math::sqr;
use flock_core::{FlockingParams, NeighbourCandidate, Transform, EPSILON};
use glam::DVec3;

/// Combined cohesion, alignment and separation vector.
///
/// Cohesion and alignment use the mean neighbour position and velocity;
/// with no neighbours both means are zero. Separation is summed, not
/// averaged: each neighbour pushes away with strength
/// `exp(-ln2 / half² * d²)`, so the push has halved at distance
/// `repel_separation_for_half`. Neighbours within `sqrt(EPSILON)`
/// contribute nothing.
pub fn steer(me: &Transform, params: &FlockingParams, neighbours: &[NeighbourCandidate]) -> DVec3 {
    let one_on_n = if neighbours.is_empty() {
        0.0
    } else {
        1.0 / neighbours.len() as f64
    };
    let separation_k = LN_2 / sqr(params.repel_separation_for_half);

    let mut average_pos = DVec3::ZERO;
    let mut average_vel = DVec3::ZERO;
    let mut separation = DVec3::ZERO;

    for n in neighbours {
        let other = &n.transform;
        average_pos += other.position * one_on_n;
        average_vel += other.velocity * one_on_n;

        let away = me.position - other.position;
        let away_sq = away.length_squared();
        if away_sq > EPSILON {
            separation += away.normalize() * (-separation_k * away_sq).exp();
        }
    }

    (average_pos - me.position) * params.attract_coefficient
        + (average_vel - me.velocity) * params.follow_coefficient
        + separation * params.repel_coefficient
}
