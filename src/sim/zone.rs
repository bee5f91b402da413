//! Capacity-limited zone
//!
//! A rectangle inside the arena that bodies may occupy. Occupancy is by
//! body center, bounded by a capacity; once full, any other body touching
//! the rectangle is bounced off its nearest edge. Geometry is recomputed
//! from the current arena every tick, so resizes take effect immediately.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::Body;
use crate::config::MIN_ZONE_DIM;

/// Axis-aligned rectangle, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.w
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.h
    }

    /// Point containment, edges inclusive
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.max_x() && p.y >= self.y && p.y <= self.max_y()
    }

    /// Conservative circle/rectangle overlap test on the bounding extents
    pub fn intersects_circle(&self, center: Vec2, radius: f32) -> bool {
        center.x + radius > self.x
            && center.x - radius < self.max_x()
            && center.y + radius > self.y
            && center.y - radius < self.max_y()
    }
}

/// Where the zone rectangle comes from: pinned coordinates, or a centered
/// fraction of the arena.
#[derive(Debug, Clone, Copy)]
pub struct ZoneConfig {
    pub width_ratio: f32,
    pub height_ratio: f32,
    pub pinned: Option<Rect>,
}

impl ZoneConfig {
    pub fn from_ratios(width_ratio: f32, height_ratio: f32) -> Self {
        Self {
            width_ratio,
            height_ratio,
            pinned: None,
        }
    }

    /// The zone rectangle for the given arena size. Ratio-derived
    /// dimensions never fall below `MIN_ZONE_DIM`.
    pub fn rect(&self, arena: Vec2) -> Rect {
        if let Some(rect) = self.pinned {
            return rect;
        }
        let w = (arena.x * self.width_ratio).max(MIN_ZONE_DIM);
        let h = (arena.y * self.height_ratio).max(MIN_ZONE_DIM);
        Rect::new((arena.x - w) / 2.0, (arena.y - h) / 2.0, w, h)
    }
}

/// Tracks which bodies currently occupy the zone.
///
/// Holds body ids in admission order (oldest first). Occupants leave only
/// by moving their center out of the rectangle, by being removed from the
/// registry, or by capacity-shrink eviction.
#[derive(Debug)]
pub struct ZoneTracker {
    occupants: Vec<u32>,
    capacity: usize,
}

impl ZoneTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            occupants: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn occupant_count(&self) -> usize {
        self.occupants.len()
    }

    pub fn is_occupant(&self, id: u32) -> bool {
        self.occupants.contains(&id)
    }

    /// Clamp to >= 1 and evict the newest occupants past the new capacity.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.occupants.len() > self.capacity {
            self.occupants.pop();
        }
    }

    /// Drop occupants whose body no longer exists in the registry.
    pub fn retain_live(&mut self, alive: impl Fn(u32) -> bool) {
        self.occupants.retain(|&id| alive(id));
    }

    /// Per-tick occupancy pass.
    ///
    /// Occupants whose center left the rectangle are dropped first. Then
    /// every non-occupant is admitted if its center is inside and a slot is
    /// free (capacity rechecked per body, so a single free slot admits
    /// exactly one of two simultaneous entrants); with the zone full, any
    /// body overlapping the rectangle is bounced off its nearest edge.
    pub fn update(&mut self, bodies: &mut [Body], zone: Rect) {
        self.occupants.retain(|&id| {
            bodies
                .iter()
                .find(|b| b.id == id)
                .is_some_and(|b| zone.contains(b.pos))
        });

        for body in bodies.iter_mut() {
            if self.is_occupant(body.id) {
                continue;
            }
            if zone.contains(body.pos) && self.occupants.len() < self.capacity {
                self.occupants.push(body.id);
                continue;
            }
            if self.occupants.len() >= self.capacity
                && zone.intersects_circle(body.pos, body.radius())
            {
                bounce_off_zone(body, zone);
            }
        }
    }
}

/// Reflect a body off the zone edge with the least penetration, snapping
/// the circle just outside and forcing the velocity component outward
/// regardless of its prior sign.
fn bounce_off_zone(body: &mut Body, zone: Rect) {
    let r = body.radius();
    let left_pen = body.pos.x + r - zone.x;
    let right_pen = zone.max_x() - (body.pos.x - r);
    let top_pen = body.pos.y + r - zone.y;
    let bottom_pen = zone.max_y() - (body.pos.y - r);
    let min_pen = left_pen.min(right_pen).min(top_pen).min(bottom_pen);

    if min_pen == left_pen {
        body.pos.x = zone.x - r;
        body.vel.x = -body.vel.x.abs();
    } else if min_pen == right_pen {
        body.pos.x = zone.max_x() + r;
        body.vel.x = body.vel.x.abs();
    } else if min_pen == top_pen {
        body.pos.y = zone.y - r;
        body.vel.y = -body.vel.y.abs();
    } else {
        body.pos.y = zone.max_y() + r;
        body.vel.y = body.vel.y.abs();
    }
}
