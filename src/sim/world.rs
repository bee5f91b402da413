//! World state and the per-tick update
//!
//! Owns the body registry, arena extent, zone, and RNG, and advances the
//! whole simulation by one fixed tick: integrate, wall reflection, broad
//! phase, narrow phase, zone occupancy, impact-based removal. The world is
//! plain single-threaded state; the engine wraps it for threading and
//! tests drive it directly.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::body::{Body, BodyKind, CONTROLLED_COLOR, ControlTuning, Direction, Steering};
use super::collision;
use super::spatial::SpatialGrid;
use super::zone::{Rect, ZoneConfig, ZoneTracker};
use crate::config::{MIN_ARENA_DIM, SimConfig};

/// Rejection-sampling attempts to place a spawn outside the zone before
/// falling back to a fixed position beside it.
const MAX_PLACEMENT_ATTEMPTS: u32 = 50;

pub struct World {
    bodies: Vec<Body>,
    arena: Vec2,
    zone: ZoneConfig,
    tracker: ZoneTracker,
    tuning: ControlTuning,
    cfg: SimConfig,
    rng: Pcg32,
    next_id: u32,
    tick: u64,
}

impl World {
    pub fn new(cfg: SimConfig) -> Self {
        let cfg = cfg.sanitized();
        let seed = cfg.seed.unwrap_or_else(rand::random);
        log::debug!("World seeded with {seed}");

        Self {
            bodies: Vec::new(),
            arena: Vec2::new(cfg.arena_width, cfg.arena_height),
            zone: ZoneConfig::from_ratios(cfg.zone_width_ratio, cfg.zone_height_ratio),
            tracker: ZoneTracker::new(cfg.zone_capacity),
            tuning: ControlTuning {
                accel: cfg.control_accel,
                max_speed: cfg.control_max_speed,
                idle_friction: cfg.idle_friction,
            },
            cfg,
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
            tick: 0,
        }
    }

    // === Queries ===

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn arena(&self) -> Vec2 {
        self.arena
    }

    pub fn zone_rect(&self) -> Rect {
        self.zone.rect(self.arena)
    }

    pub fn occupant_count(&self) -> usize {
        self.tracker.occupant_count()
    }

    pub fn zone_capacity(&self) -> usize {
        self.tracker.capacity()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn has_controlled(&self) -> bool {
        self.bodies.iter().any(Body::is_controlled)
    }

    // === Geometry commands ===

    /// Resize the arena; dimensions are clamped to the documented minimum.
    /// The zone and grid recompute from the new size on the next tick.
    pub fn set_arena_size(&mut self, w: f32, h: f32) {
        self.arena = Vec2::new(w.max(MIN_ARENA_DIM), h.max(MIN_ARENA_DIM));
    }

    /// Pin the zone to explicit coordinates.
    pub fn set_zone_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.zone.pinned = Some(Rect::new(x, y, w, h));
    }

    /// Drop the pinned rectangle and derive the zone from arena ratios.
    pub fn clear_zone_rect(&mut self) {
        self.zone.pinned = None;
    }

    pub fn set_zone_capacity(&mut self, capacity: usize) {
        self.tracker.set_capacity(capacity);
    }

    // === Registry commands ===

    /// Spawn one body. `radius` of `None` draws from the configured range;
    /// explicit radii are clamped to at least 1 px. Returns the new id.
    pub fn spawn_body(&mut self, radius: Option<u32>) -> u32 {
        let radius = match radius {
            Some(r) => r.max(1),
            None => self
                .rng
                .random_range(self.cfg.min_radius..self.cfg.max_radius),
        };
        let pos = self.place_outside_zone(radius as f32);

        // Random speed in px/s, stored as px/ms
        let speed = self.rng.random_range(self.cfg.min_speed..self.cfg.max_speed) / 1000.0;
        let angle = self.rng.random_range(0.0..std::f32::consts::TAU);
        let vel = Vec2::new(angle.cos(), angle.sin()) * speed;

        let id = self.alloc_id();
        let color = self.random_color();
        self.bodies.push(Body::new(id, pos, vel, radius, color));
        id
    }

    /// Spawn `count` bodies with radii drawn uniformly from [min, max].
    pub fn spawn_batch(&mut self, count: usize, min_radius: u32, max_radius: u32) {
        let min = min_radius.max(1);
        let max = max_radius.max(min);
        for _ in 0..count {
            let radius = self.rng.random_range(min..=max);
            self.spawn_body(Some(radius));
        }
    }

    /// Insert a prebuilt body, assigning it a fresh id. Used by embedders
    /// and tests that need exact placement.
    pub fn insert(&mut self, mut body: Body) -> u32 {
        let id = self.alloc_id();
        body.id = id;
        self.bodies.push(body);
        id
    }

    /// Remove the most recently added free body, leaving the controlled
    /// body in place. Returns the removed id.
    pub fn remove_last_body(&mut self) -> Option<u32> {
        let index = self.bodies.iter().rposition(|b| !b.is_controlled())?;
        let id = self.bodies.remove(index).id;
        self.tracker.retain_live(|occ| occ != id);
        Some(id)
    }

    pub fn remove_all_bodies(&mut self) {
        self.bodies.clear();
        self.tracker.retain_live(|_| false);
    }

    /// Create the controlled body if absent: arena center, zero velocity,
    /// fixed radius and color. Returns its id.
    pub fn ensure_controlled(&mut self) -> u32 {
        if let Some(body) = self.bodies.iter().find(|b| b.is_controlled()) {
            return body.id;
        }
        let id = self.alloc_id();
        let mut body = Body::new(
            id,
            self.arena * 0.5,
            Vec2::ZERO,
            self.cfg.control_radius,
            CONTROLLED_COLOR,
        );
        body.kind = BodyKind::Controlled(Steering::default());
        self.bodies.push(body);
        id
    }

    pub fn remove_controlled(&mut self) {
        if let Some(index) = self.bodies.iter().position(Body::is_controlled) {
            let id = self.bodies.remove(index).id;
            self.tracker.retain_live(|occ| occ != id);
        }
    }

    /// Update one directional flag on the controlled body, if present.
    pub fn set_control_direction(&mut self, dir: Direction, pressed: bool) {
        for body in &mut self.bodies {
            if let BodyKind::Controlled(steering) = &mut body.kind {
                steering.set(dir, pressed);
            }
        }
    }

    // === Tick ===

    /// Advance the simulation by one tick of `dt` milliseconds.
    pub fn step(&mut self, dt: f32) {
        // 1) Integrate and reflect off the arena walls
        for body in &mut self.bodies {
            body.step(dt, &self.tuning);
            collision::reflect_walls(body, self.arena);
        }

        // 2) Broad phase over the fresh positions, narrow phase per pair
        let grid = SpatialGrid::bucket(&self.bodies, self.arena, self.cfg.cell_size);
        for (i, j) in grid.candidate_pairs() {
            let (lo, hi) = if i < j { (i, j) } else { (j, i) };
            let (head, tail) = self.bodies.split_at_mut(hi);
            collision::resolve_pair(&mut head[lo], &mut tail[0]);
        }

        // 3) Zone occupancy and full-zone ejection
        let rect = self.zone.rect(self.arena);
        self.tracker.update(&mut self.bodies, rect);

        // 4) Impact-based removal; the controlled body is exempt
        let limit = self.cfg.impact_limit;
        self.bodies
            .retain(|b| b.impacts < limit || b.is_controlled());

        // 5) Occupants removed from the registry vacate their slot
        let bodies = &self.bodies;
        self.tracker
            .retain_live(|id| bodies.iter().any(|b| b.id == id));

        self.tick += 1;
    }

    // === Internals ===

    fn alloc_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn random_color(&mut self) -> u32 {
        let r = self.rng.random_range(40u32..220);
        let g = self.rng.random_range(40u32..220);
        let b = self.rng.random_range(40u32..220);
        (r << 16) | (g << 8) | b
    }

    /// Sample a spawn position whose circle is not fully inside the zone,
    /// giving up after a bounded number of attempts and falling back to a
    /// fixed spot beside the zone.
    fn place_outside_zone(&mut self, r: f32) -> Vec2 {
        let zone = self.zone.rect(self.arena);

        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let x = self.rng.random_range(r..(self.arena.x - r).max(r + 1.0));
            let y = self.rng.random_range(r..(self.arena.y - r).max(r + 1.0));
            let candidate = Vec2::new(x, y);

            let fully_inside = candidate.x - r >= zone.x
                && candidate.x + r <= zone.max_x()
                && candidate.y - r >= zone.y
                && candidate.y + r <= zone.max_y();
            if !fully_inside {
                return candidate;
            }
        }

        // Left of the zone, below it, clamped into the arena
        let x = (zone.x - r - 5.0).max(r);
        let y = (zone.max_y() + r + 5.0).max(r).min(self.arena.y - r);
        Vec2::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> World {
        World::new(SimConfig {
            seed: Some(seed),
            ..Default::default()
        })
    }

    fn free_body(pos: Vec2, vel: Vec2, radius: u32) -> Body {
        Body::new(0, pos, vel, radius, 0)
    }

    #[test]
    fn test_single_body_moves_linearly() {
        let mut world = seeded(1);
        world.insert(free_body(Vec2::new(100.0, 100.0), Vec2::new(0.1, 0.0), 10));

        world.step(16.0);

        let body = &world.bodies()[0];
        assert!((body.pos.x - 101.6).abs() < 1e-3);
        assert!((body.pos.y - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_linear_motion_accumulates_over_ticks() {
        let mut world = seeded(1);
        world.insert(free_body(Vec2::new(100.0, 100.0), Vec2::new(0.1, 0.0), 10));
        for _ in 0..5 {
            world.step(16.0);
        }
        assert!((world.bodies()[0].pos.x - (100.0 + 0.1 * 16.0 * 5.0)).abs() < 1e-3);
    }

    #[test]
    fn test_head_on_pair_separates_within_a_tick() {
        let mut world = seeded(1);
        world.insert(free_body(Vec2::new(100.0, 100.0), Vec2::new(0.05, 0.0), 10));
        world.insert(free_body(Vec2::new(115.0, 100.0), Vec2::new(-0.05, 0.0), 10));

        world.step(16.0);

        let gap = world.bodies()[1].pos.x - world.bodies()[0].pos.x;
        assert!(gap >= 20.0 - 1e-2);
        assert!(world.bodies()[0].vel.x < 0.0);
        assert!(world.bodies()[1].vel.x > 0.0);
        assert_eq!(world.bodies()[0].impacts, 1);
    }

    #[test]
    fn test_cross_cell_pair_is_resolved() {
        let mut world = seeded(1);
        // Straddling the cell boundary at x = 40
        world.insert(free_body(Vec2::new(32.0, 20.0), Vec2::new(0.05, 0.0), 10));
        world.insert(free_body(Vec2::new(47.0, 20.0), Vec2::new(-0.05, 0.0), 10));

        world.step(16.0);

        assert_eq!(world.bodies()[0].impacts, 1);
        assert_eq!(world.bodies()[1].impacts, 1);
    }

    #[test]
    fn test_body_at_impact_limit_is_removed() {
        let mut world = seeded(1);
        let mut worn = free_body(Vec2::new(100.0, 50.0), Vec2::ZERO, 10);
        worn.impacts = 5;
        world.insert(worn);
        world.insert(free_body(Vec2::new(500.0, 350.0), Vec2::ZERO, 10));

        world.step(16.0);

        assert_eq!(world.bodies().len(), 1);
    }

    #[test]
    fn test_controlled_body_survives_impact_limit() {
        let mut world = seeded(1);
        world.ensure_controlled();
        for body in &mut world.bodies {
            body.impacts = 100;
        }

        world.step(16.0);

        assert!(world.has_controlled());
    }

    #[test]
    fn test_controlled_body_spawns_centered_and_still() {
        let mut world = seeded(1);
        let id = world.ensure_controlled();
        let body = world.bodies().iter().find(|b| b.id == id).unwrap();
        assert_eq!(body.pos, Vec2::new(300.0, 200.0));
        assert_eq!(body.vel, Vec2::ZERO);
        assert_eq!(body.radius_px(), 15);
    }

    #[test]
    fn test_ensure_controlled_is_idempotent() {
        let mut world = seeded(1);
        let first = world.ensure_controlled();
        let second = world.ensure_controlled();
        assert_eq!(first, second);
        assert_eq!(world.bodies().len(), 1);
    }

    #[test]
    fn test_remove_last_skips_controlled() {
        let mut world = seeded(1);
        world.spawn_body(None);
        world.ensure_controlled();

        let removed = world.remove_last_body();
        assert!(removed.is_some());
        assert!(world.has_controlled());
        assert_eq!(world.bodies().len(), 1);

        // Only the controlled body left: nothing more to remove
        assert!(world.remove_last_body().is_none());
    }

    #[test]
    fn test_spawns_avoid_zone_interior() {
        let mut world = seeded(42);
        for _ in 0..50 {
            world.spawn_body(None);
        }
        let zone = world.zone_rect();
        for body in world.bodies() {
            let r = body.radius();
            let fully_inside = body.pos.x - r >= zone.x
                && body.pos.x + r <= zone.max_x()
                && body.pos.y - r >= zone.y
                && body.pos.y + r <= zone.max_y();
            assert!(!fully_inside, "body {} spawned inside the zone", body.id);
        }
    }

    #[test]
    fn test_batch_spawn_respects_radius_range() {
        let mut world = seeded(7);
        world.spawn_batch(20, 5, 9);
        assert_eq!(world.bodies().len(), 20);
        for body in world.bodies() {
            assert!((5..=9).contains(&body.radius_px()));
        }
    }

    #[test]
    fn test_same_seed_spawns_identically() {
        let mut a = seeded(99);
        let mut b = seeded(99);
        a.spawn_batch(10, 8, 20);
        b.spawn_batch(10, 8, 20);
        for (x, y) in a.bodies().iter().zip(b.bodies()) {
            assert_eq!(x.pos, y.pos);
            assert_eq!(x.vel, y.vel);
            assert_eq!(x.radius_px(), y.radius_px());
        }
    }

    #[test]
    fn test_arena_resize_is_clamped() {
        let mut world = seeded(1);
        world.set_arena_size(-100.0, 10.0);
        assert_eq!(world.arena(), Vec2::new(50.0, 50.0));
    }

    #[test]
    fn test_resize_mid_simulation_recomputes_zone() {
        let mut world = seeded(1);
        world.insert(free_body(Vec2::new(100.0, 100.0), Vec2::new(0.1, 0.0), 10));
        let before = world.zone_rect();

        world.set_arena_size(1200.0, 800.0);
        world.step(16.0);

        let after = world.zone_rect();
        assert!(after.w > before.w);
        // Pinned rect is resize-independent
        world.set_zone_rect(10.0, 10.0, 80.0, 80.0);
        world.set_arena_size(600.0, 400.0);
        assert_eq!(world.zone_rect(), Rect::new(10.0, 10.0, 80.0, 80.0));
        world.clear_zone_rect();
        assert_eq!(world.zone_rect(), Rect::new(150.0, 100.0, 300.0, 200.0));
    }

    #[test]
    fn test_full_zone_ejects_second_entrant_through_step() {
        let mut world = seeded(1);
        // Occupant resting in the zone center, challenger drifting in from
        // the left edge
        world.insert(free_body(Vec2::new(300.0, 200.0), Vec2::ZERO, 10));
        world.insert(free_body(Vec2::new(138.0, 200.0), Vec2::new(0.2, 0.0), 10));

        world.step(16.0);

        assert_eq!(world.occupant_count(), 1);
        let challenger = &world.bodies()[1];
        assert!(challenger.pos.x <= 150.0 - challenger.radius());
        assert!(challenger.vel.x < 0.0);
    }

    #[test]
    fn test_removed_occupant_vacates_slot() {
        let mut world = seeded(1);
        let mut occupant = free_body(Vec2::new(300.0, 200.0), Vec2::ZERO, 10);
        occupant.impacts = 5;
        world.insert(occupant);

        // First tick admits, increments nothing, then removes by impacts
        world.step(16.0);

        assert!(world.is_empty());
        assert_eq!(world.occupant_count(), 0);
    }
}
