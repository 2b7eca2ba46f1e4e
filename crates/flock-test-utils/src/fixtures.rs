//! Reusable flock fixtures.
//!
//! - [`agent_at`]: one agent with default params, heading +Z.
//! - [`line_of_agents`]: evenly spaced agents along +X.
//! - [`random_flock`]: seeded random positions and headings.

use flock_core::{AgentId, AgentRecord, DVec3, FlockingParams, Transform};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Agent `id` at `position`, heading +Z at default speed.
pub fn agent_at(id: u64, position: DVec3) -> AgentRecord {
    let params = FlockingParams::default();
    AgentRecord::new(
        AgentId(id),
        Transform::at(position, DVec3::Z).with_velocity(DVec3::Z * params.speed),
        params,
    )
}

/// `n` agents with ids `0..n`, `spacing` apart along +X from `origin`.
pub fn line_of_agents(n: u64, origin: DVec3, spacing: f64) -> Vec<AgentRecord> {
    (0..n)
        .map(|i| agent_at(i, origin + DVec3::X * (i as f64 * spacing)))
        .collect()
}

/// `n` agents with ids `0..n`, uniformly placed in a cube of half-width
/// `half_extent` centred on `centre`, with random unit headings.
///
/// Identical seeds produce identical flocks.
pub fn random_flock(n: u64, seed: u64, centre: DVec3, half_extent: f64) -> Vec<AgentRecord> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let params = FlockingParams::default();
    (0..n)
        .map(|i| {
            let offset = DVec3::new(
                rng.random_range(-half_extent..half_extent),
                rng.random_range(-half_extent..half_extent),
                rng.random_range(-half_extent..half_extent),
            );
            let forward = random_unit(&mut rng);
            AgentRecord::new(
                AgentId(i),
                Transform::at(centre + offset, forward).with_velocity(forward * params.speed),
                params,
            )
        })
        .collect()
}

fn random_unit(rng: &mut ChaCha8Rng) -> DVec3 {
    loop {
        let v = DVec3::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
        );
        let len_sq = v.length_squared();
        if len_sq > 1e-6 && len_sq <= 1.0 {
            return v / len_sq.sqrt();
        }
    }
}
