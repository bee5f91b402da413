//! Reader-facing state snapshots
//!
//! The engine publishes an immutable snapshot after every tick (and after
//! every structural command) so renderers and statistics readers can
//! iterate freely while the tick thread keeps mutating the live registry.

use glam::Vec2;
use serde::Serialize;

use super::body::Body;
use super::world::World;
use super::zone::Rect;

/// One body as seen by readers
#[derive(Debug, Clone, Serialize)]
pub struct BodySnapshot {
    pub id: u32,
    pub pos: Vec2,
    /// px/ms
    pub vel: Vec2,
    pub radius: u32,
    /// 0xRRGGBB
    pub color: u32,
    pub controlled: bool,
    pub impacts: u32,
}

impl BodySnapshot {
    fn of(body: &Body) -> Self {
        Self {
            id: body.id,
            pos: body.pos,
            vel: body.vel,
            radius: body.radius_px(),
            color: body.color,
            controlled: body.is_controlled(),
            impacts: body.impacts,
        }
    }
}

/// Immutable view of the whole simulation at one tick boundary
#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub arena: Vec2,
    pub zone: Rect,
    pub occupants: usize,
    pub capacity: usize,
    pub paused: bool,
    pub bodies: Vec<BodySnapshot>,
}

impl WorldSnapshot {
    pub fn capture(world: &World, paused: bool) -> Self {
        Self {
            tick: world.tick(),
            arena: world.arena(),
            zone: world.zone_rect(),
            occupants: world.occupant_count(),
            capacity: world.zone_capacity(),
            paused,
            bodies: world.bodies().iter().map(BodySnapshot::of).collect(),
        }
    }
}
