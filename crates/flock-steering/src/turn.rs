//! Rate-limited heading change and integration.

use flock_core::math::is_zero;
use flock_core::{AgentUpdate, FlockingParams, NeighbourCandidate, Transform, EPSILON};
use glam::DVec3;

use crate::boundary::{shape, BoundaryConfig};
use crate::steer::steer;

/// Rotate `forward` toward the direction of `steering` by at most
/// `max_angle` radians.
///
/// Returns `forward` unchanged when the steering vector is negligible
/// or when the rotation axis degenerates. The latter covers both an
/// already-aligned target and an exactly opposite one: an anti-parallel
/// target leaves the heading frozen.
pub fn rotate_toward(forward: DVec3, steering: DVec3, max_angle: f64) -> DVec3 {
    if steering.length_squared() <= EPSILON {
        return forward;
    }
    let target = steering.normalize();
    let angle = forward.dot(target).clamp(-1.0, 1.0).acos();
    let axis = forward.cross(target);
    if is_zero(axis, EPSILON) {
        return forward;
    }
    let ex = axis.normalize().cross(forward);
    let limited = angle.min(max_angle);
    (forward * limited.cos() + ex * limited.sin()).normalize()
}

/// New heading, velocity and position after `dt` simulated seconds.
pub fn turn(me: &Transform, shaped: DVec3, params: &FlockingParams, dt: f64) -> AgentUpdate {
    let max_angle = params.max_turn_degrees_per_second.to_radians() * dt;
    let forward = rotate_toward(me.forward, shaped, max_angle);
    let velocity = forward * params.speed;
    AgentUpdate {
        position: me.position + velocity * dt,
        velocity,
        forward,
    }
}

/// Full per-agent step: steer, shape, turn.
pub fn integrate(
    me: &Transform,
    params: &FlockingParams,
    neighbours: &[NeighbourCandidate],
    boundary: &BoundaryConfig,
    dt: f64,
) -> AgentUpdate {
    let raw = steer(me, params, neighbours);
    let shaped = shape(me, raw, boundary);
    turn(me, shaped, params, dt)
}
