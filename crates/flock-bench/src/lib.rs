//! Benchmark profiles for the flocking simulation.
//!
//! - [`reference_profile`]: 2 000 agents in a 60 m cube, 4 workers
//! - [`stress_profile`]: 20 000 agents in a 200 m cube, all cores
//! - [`lockstep_engine`]: a started engine managing every agent in a store

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use flock_core::DVec3;
use flock_engine::{ConfigError, EngineConfig, TickEngine};
use flock_test_utils::{random_flock, MockAgentStore};

/// Centre of every benchmark flock, inside the default height band.
pub const FLOCK_CENTRE: DVec3 = DVec3::new(0.0, 20.0, 0.0);

/// 2 000 agents, 4 workers.
pub fn reference_profile(seed: u64) -> (EngineConfig, MockAgentStore) {
    let config = EngineConfig {
        worker_count: Some(4),
        ..EngineConfig::default()
    };
    let store = MockAgentStore::with_records(random_flock(2_000, seed, FLOCK_CENTRE, 30.0));
    (config, store)
}

/// 20 000 agents, auto-detected worker count.
pub fn stress_profile(seed: u64) -> (EngineConfig, MockAgentStore) {
    let store = MockAgentStore::with_records(random_flock(20_000, seed, FLOCK_CENTRE, 100.0));
    (EngineConfig::default(), store)
}

/// Start an engine for `config` and grant it authority over every agent
/// in `store`. Membership is applied on the first tick.
pub fn lockstep_engine(
    config: EngineConfig,
    store: &MockAgentStore,
) -> Result<TickEngine, ConfigError> {
    let mut engine = TickEngine::new(config)?;
    engine.start()?;
    let handle = engine.membership();
    for id in store.ids() {
        // The receiver lives in the engine we hold, so this cannot fail.
        let _ = handle.on_authority_gained(id);
    }
    Ok(engine)
}
