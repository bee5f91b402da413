//! Headless demo entry point
//!
//! Spawns an engine, fills the arena, exercises pause/resume and the
//! controlled body, and dumps the final snapshot as JSON. Pass a config
//! file path as the first argument to override the defaults.
//!
//! Run with `RUST_LOG=debug` for per-command logging.

use std::thread;
use std::time::Duration;

use bouncebox::{Direction, Engine, SimConfig};

fn main() {
    env_logger::init();

    let cfg = match std::env::args().nth(1) {
        Some(path) => SimConfig::load_from(&path),
        None => SimConfig::default(),
    };
    let tick_ms = cfg.tick_ms;
    let engine = Engine::new(cfg);

    log::info!("Spawning bodies");
    engine.add_bodies(12, 8, 20);
    engine.set_controlled_body_present(true);
    engine.set_control_direction(Direction::Right, true);

    for _ in 0..4 {
        thread::sleep(Duration::from_millis(500));
        let snap = engine.snapshot();
        let (occupants, capacity) = engine.zone_occupancy();
        log::info!(
            "tick {}: {} bodies, zone {occupants}/{capacity}, last tick {:?}",
            snap.tick,
            snap.bodies.len(),
            engine.last_tick_duration(),
        );
    }

    log::info!("Pausing for half a second");
    engine.pause();
    thread::sleep(Duration::from_millis(50));
    let frozen = engine.snapshot().tick;
    thread::sleep(Duration::from_millis(500));
    log::info!(
        "Paused at tick {frozen}, still at tick {}",
        engine.snapshot().tick
    );
    engine.resume();

    thread::sleep(Duration::from_secs_f32(tick_ms / 1000.0 * 30.0));
    engine.stop();

    match serde_json::to_string_pretty(&*engine.snapshot()) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Snapshot serialization failed: {e}"),
    }
}
