//! A flock of 500 agents simulated in the background at 8 Hz.
//!
//! Demonstrates:
//!   1. Starting a FlockScheduler over an in-memory store
//!   2. Granting authority over part of the flock from another thread
//!   3. Reading per-tick metrics while the simulation runs
//!   4. Shutting down and recovering the store
//!
//! Run with:
//!   RUST_LOG=flock_engine=debug cargo run -p flock-engine --example realtime_flock

use std::thread;
use std::time::Duration;

use flock_core::{AgentId, DVec3};
use flock_engine::{EngineConfig, FlockScheduler};
use flock_test_utils::{random_flock, MockAgentStore};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let store = MockAgentStore::with_records(random_flock(500, 42, DVec3::new(0.0, 20.0, 0.0), 40.0));
    let config = EngineConfig {
        metrics_interval: Duration::from_millis(500),
        ..EngineConfig::default()
    };
    let mut scheduler = FlockScheduler::start(config, store)?;
    println!("started with {} workers", scheduler.worker_count());

    // This process owns the first 400 agents; the rest are only seen.
    let membership = scheduler.membership();
    thread::spawn(move || {
        for i in 0..400 {
            if membership.on_authority_gained(AgentId(i)).is_err() {
                break;
            }
        }
    });

    for _ in 0..6 {
        thread::sleep(Duration::from_millis(500));
        if let Some(m) = scheduler.latest_metrics() {
            println!(
                "tick {:>4}  committed {:>3}  buckets {:>3}  total {:>6}us  load {:.3}",
                m.tick.0, m.committed, m.buckets, m.total_us, m.load_average
            );
        }
    }

    let report = scheduler.shutdown();
    println!(
        "shutdown in {}ms after {} ticks ({} workers joined)",
        report.total_ms, report.ticks_run, report.workers_joined
    );

    let store = scheduler.take_store()?;
    if let Some(r) = store.get(AgentId(0)) {
        println!("agent 0 ended at {:?}", r.transform.map(|t| t.position));
    }
    Ok(())
}
