//! Background simulation engine
//!
//! Runs the world on a dedicated thread at a fixed logical tick, gates
//! pausing on a condvar (no busy waiting), and publishes immutable
//! snapshots for lock-free readers. The tick thread is the sole writer of
//! physical state; command methods only touch the registry and geometry
//! under the world lock between ticks.
//!
//! Lifecycle: the thread starts on the first body insertion, goes idle
//! when the registry empties, and restarts on the next insertion. `stop`
//! shuts it down explicitly; pause holds it indefinitely on the gate.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::SimConfig;
use crate::sim::body::Direction;
use crate::sim::snapshot::WorldSnapshot;
use crate::sim::world::World;

/// Observer callback; see [`Engine::on_change`] for the delivery contract.
pub type ChangeListener = Arc<dyn Fn() + Send + Sync + 'static>;

/// Pause/run flags guarded by the gate mutex. `running` is true while a
/// tick thread is alive (or being spawned); `paused` holds it on the
/// condvar without stopping it.
struct Gate {
    paused: bool,
    running: bool,
}

struct Shared {
    world: Mutex<World>,
    gate: Mutex<Gate>,
    resumed: Condvar,
    snapshot: Mutex<Arc<WorldSnapshot>>,
    listeners: Mutex<Vec<ChangeListener>>,
    last_tick_nanos: AtomicU64,
    tick_interval: Duration,
    tick_ms: f32,
}

// Lock order: gate may be taken while holding nothing or before world;
// never take gate while holding world.
impl Shared {
    fn publish_snapshot(&self) {
        let paused = self.gate.lock().expect("gate lock").paused;
        let snap = {
            let world = self.world.lock().expect("world lock");
            Arc::new(WorldSnapshot::capture(&world, paused))
        };
        *self.snapshot.lock().expect("snapshot lock") = snap;
    }

    fn notify_listeners(&self) {
        // Clone out so callbacks never run under the listener lock
        let listeners = self.listeners.lock().expect("listener lock").clone();
        for listener in &listeners {
            listener();
        }
    }

    fn publish_and_notify(&self) {
        self.publish_snapshot();
        self.notify_listeners();
    }
}

/// The simulation engine. All methods take `&self`; share it across
/// threads behind an `Arc` as needed.
pub struct Engine {
    shared: Arc<Shared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Engine {
    pub fn new(cfg: SimConfig) -> Self {
        let cfg = cfg.sanitized();
        let tick_ms = cfg.tick_ms;
        let world = World::new(cfg);
        let snapshot = Arc::new(WorldSnapshot::capture(&world, false));

        Self {
            shared: Arc::new(Shared {
                world: Mutex::new(world),
                gate: Mutex::new(Gate {
                    paused: false,
                    running: false,
                }),
                resumed: Condvar::new(),
                snapshot: Mutex::new(snapshot),
                listeners: Mutex::new(Vec::new()),
                last_tick_nanos: AtomicU64::new(0),
                tick_interval: Duration::from_secs_f32(tick_ms / 1000.0),
                tick_ms,
            }),
            handle: Mutex::new(None),
        }
    }

    // === Registry commands ===

    /// Add one body, starting the tick thread if it is idle. `radius` of
    /// `None` draws from the configured range. Returns the new body's id.
    pub fn add_body(&self, radius: Option<u32>) -> u32 {
        let id = self.shared.world.lock().expect("world lock").spawn_body(radius);
        log::debug!("Body {id} added");
        self.start_if_needed();
        self.shared.publish_and_notify();
        id
    }

    /// Add `count` bodies with radii drawn uniformly from [min, max].
    pub fn add_bodies(&self, count: usize, min_radius: u32, max_radius: u32) {
        if count == 0 {
            return;
        }
        self.shared
            .world
            .lock()
            .expect("world lock")
            .spawn_batch(count, min_radius, max_radius);
        log::debug!("{count} bodies added");
        self.start_if_needed();
        self.shared.publish_and_notify();
    }

    /// Remove the most recently added free body, if any.
    pub fn remove_last_body(&self) -> Option<u32> {
        let removed = self.shared.world.lock().expect("world lock").remove_last_body();
        if let Some(id) = removed {
            log::debug!("Body {id} removed");
            self.stop_if_empty();
            self.shared.publish_and_notify();
        }
        removed
    }

    /// Remove every body, controlled included, and stop the tick thread.
    pub fn remove_all_bodies(&self) {
        self.shared.world.lock().expect("world lock").remove_all_bodies();
        self.stop_thread();
        log::debug!("All bodies removed");
        self.shared.publish_and_notify();
    }

    /// Create or remove the controlled body.
    pub fn set_controlled_body_present(&self, present: bool) {
        {
            let mut world = self.shared.world.lock().expect("world lock");
            if present {
                world.ensure_controlled();
            } else {
                world.remove_controlled();
            }
        }
        if present {
            self.start_if_needed();
        } else {
            self.stop_if_empty();
        }
        self.shared.publish_and_notify();
    }

    /// Update one directional flag on the controlled body. Input is
    /// high-frequency, so this does not emit a change notification.
    pub fn set_control_direction(&self, dir: Direction, pressed: bool) {
        self.shared
            .world
            .lock()
            .expect("world lock")
            .set_control_direction(dir, pressed);
    }

    // === Geometry commands ===

    /// Resize the arena; dimensions below the minimum are clamped. Safe at
    /// any time: zone and grid recompute from the new size next tick.
    pub fn set_arena_size(&self, w: f32, h: f32) {
        self.shared.world.lock().expect("world lock").set_arena_size(w, h);
        self.shared.publish_and_notify();
    }

    /// Pin the zone to explicit coordinates.
    pub fn set_zone_rect(&self, x: f32, y: f32, w: f32, h: f32) {
        self.shared
            .world
            .lock()
            .expect("world lock")
            .set_zone_rect(x, y, w, h);
        self.shared.publish_and_notify();
    }

    /// Return the zone to ratio-derived geometry.
    pub fn clear_zone_rect(&self) {
        self.shared.world.lock().expect("world lock").clear_zone_rect();
        self.shared.publish_and_notify();
    }

    /// Set the occupant capacity (clamped to >= 1); shrinking evicts the
    /// newest occupants.
    pub fn set_zone_capacity(&self, capacity: usize) {
        self.shared
            .world
            .lock()
            .expect("world lock")
            .set_zone_capacity(capacity);
        self.shared.publish_and_notify();
    }

    // === Pause protocol ===

    /// Pause the simulation. The tick thread blocks on the gate without
    /// advancing physics until `resume`. Idempotent.
    pub fn pause(&self) {
        {
            let mut gate = self.shared.gate.lock().expect("gate lock");
            if gate.paused {
                return;
            }
            gate.paused = true;
        }
        log::info!("Simulation paused");
        self.shared.publish_and_notify();
    }

    /// Resume a paused simulation, waking the blocked tick thread. A no-op
    /// when not paused.
    pub fn resume(&self) {
        {
            let mut gate = self.shared.gate.lock().expect("gate lock");
            if !gate.paused {
                return;
            }
            gate.paused = false;
        }
        self.shared.resumed.notify_all();
        log::info!("Simulation resumed");
        // The thread may have been stopped while paused; restart it if
        // there is anything left to step
        if !self.shared.world.lock().expect("world lock").is_empty() {
            self.start_if_needed();
        }
        self.shared.publish_and_notify();
    }

    /// Flip the pause state, returning the new value.
    pub fn toggle_paused(&self) -> bool {
        if self.is_paused() {
            self.resume();
            false
        } else {
            self.pause();
            true
        }
    }

    pub fn is_paused(&self) -> bool {
        self.shared.gate.lock().expect("gate lock").paused
    }

    /// Whether a tick thread is currently alive (Running or Paused, as
    /// opposed to Idle).
    pub fn is_running(&self) -> bool {
        self.shared.gate.lock().expect("gate lock").running
    }

    /// Stop the tick thread and wait for it to exit. Body state is left
    /// as-is; adding a body afterwards restarts the loop. Joins the
    /// engine thread, so never call this from a change listener.
    pub fn stop(&self) {
        self.stop_thread();
        log::info!("Engine stopped");
    }

    // === Queries ===

    /// The most recent published snapshot. Cheap: clones an `Arc`, never
    /// blocks the tick loop.
    pub fn snapshot(&self) -> Arc<WorldSnapshot> {
        Arc::clone(&self.shared.snapshot.lock().expect("snapshot lock"))
    }

    /// Current zone occupant count and capacity.
    pub fn zone_occupancy(&self) -> (usize, usize) {
        let world = self.shared.world.lock().expect("world lock");
        (world.occupant_count(), world.zone_capacity())
    }

    /// Measured duration of the most recent tick.
    pub fn last_tick_duration(&self) -> Duration {
        Duration::from_nanos(self.shared.last_tick_nanos.load(Ordering::Relaxed))
    }

    /// Register a change observer signaling "state changed, re-read the
    /// snapshot". Callbacks run on the engine thread once per tick, and on
    /// the calling thread immediately after structural commands. Keep them
    /// short; marshal to a rendering thread yourself if needed.
    pub fn on_change(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.shared
            .listeners
            .lock()
            .expect("listener lock")
            .push(Arc::new(listener));
    }

    // === Thread lifecycle ===

    fn start_if_needed(&self) {
        {
            let mut gate = self.shared.gate.lock().expect("gate lock");
            if gate.running {
                return;
            }
            gate.running = true;
        }

        // Reap the previous thread, if any, before spawning its successor
        if let Some(old) = self.handle.lock().expect("handle lock").take() {
            let _ = old.join();
        }

        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("bouncebox-tick".into())
            .spawn(move || tick_loop(shared))
            .expect("failed to spawn tick thread");
        *self.handle.lock().expect("handle lock") = Some(handle);
    }

    fn stop_thread(&self) {
        self.shared.gate.lock().expect("gate lock").running = false;
        self.shared.resumed.notify_all();
        if let Some(handle) = self.handle.lock().expect("handle lock").take() {
            let _ = handle.join();
        }
    }

    fn stop_if_empty(&self) {
        let empty = self.shared.world.lock().expect("world lock").is_empty();
        if empty {
            self.stop_thread();
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop_thread();
    }
}

fn tick_loop(shared: Arc<Shared>) {
    log::info!("Tick thread started");
    loop {
        let start = Instant::now();

        // Pause gate: block on the condvar, never spin. Stop wakes us too.
        {
            let mut gate = shared.gate.lock().expect("gate lock");
            while gate.paused && gate.running {
                gate = shared.resumed.wait(gate).expect("gate lock");
            }
            if !gate.running {
                break;
            }
        }

        let now_empty = {
            let mut world = shared.world.lock().expect("world lock");
            world.step(shared.tick_ms);
            world.is_empty()
        };
        shared
            .last_tick_nanos
            .store(start.elapsed().as_nanos() as u64, Ordering::Relaxed);
        shared.publish_and_notify();

        if now_empty {
            // Going idle. Recheck emptiness under the gate: a concurrent
            // add either sees running=true here or restarts the thread
            // after we clear it, never neither.
            let mut gate = shared.gate.lock().expect("gate lock");
            if shared.world.lock().expect("world lock").is_empty() {
                gate.running = false;
                log::info!("Registry empty, tick thread going idle");
                break;
            }
        }

        // Sleep out the rest of the interval on the gate condvar so stop()
        // and pause() cut it short instead of waiting out the timer
        let elapsed = start.elapsed();
        if elapsed < shared.tick_interval {
            let gate = shared.gate.lock().expect("gate lock");
            let _ = shared
                .resumed
                .wait_timeout_while(gate, shared.tick_interval - elapsed, |g| {
                    g.running && !g.paused
                })
                .expect("gate lock");
        }
    }
    log::debug!("Tick thread exited");
}
