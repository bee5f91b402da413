//! Narrow-phase collision response
//!
//! Discrete overlap test plus an equal-and-opposite impulse along the
//! contact normal and a positional correction that pushes overlapping
//! bodies apart. The impulse is the simplified equal-mass elastic exchange
//! (relative normal velocity swapped between the bodies), not a full
//! mass-weighted formula. Wall handling reflects the velocity component and
//! clamps the center back inside the arena.

use glam::Vec2;

use super::body::Body;

/// Squared center distance below which a pair counts as coincident and is
/// skipped to avoid dividing by a near-zero separation.
const COINCIDENT_EPS_SQ: f32 = 1e-3;

/// Extra separation on top of half the overlap, px. Keeps resting pairs
/// from re-overlapping every tick.
const CORRECTION_BIAS: f32 = 0.1;

/// Resolve one candidate pair.
///
/// Returns `true` when the pair overlapped and a response was applied:
/// velocities exchanged along the normal, positions pushed apart by half
/// the overlap plus a small bias, and both impact counters incremented.
/// Pairs that are already separating are left untouched.
pub fn resolve_pair(a: &mut Body, b: &mut Body) -> bool {
    let delta = b.pos - a.pos;
    let dist_sq = delta.length_squared();
    let min_dist = a.radius() + b.radius();
    if dist_sq > min_dist * min_dist || dist_sq <= COINCIDENT_EPS_SQ {
        return false;
    }

    let dist = dist_sq.sqrt();
    let normal = delta / dist;

    let approach = (b.vel - a.vel).dot(normal);
    if approach > 0.0 {
        // Already separating, likely resolved on a previous tick
        return false;
    }

    let impulse = -approach * normal;
    a.vel -= impulse;
    b.vel += impulse;

    let correction = (min_dist - dist) * 0.5 + CORRECTION_BIAS;
    a.pos -= normal * correction;
    b.pos += normal * correction;

    a.impacts += 1;
    b.impacts += 1;
    true
}

/// Reflect a body off the arena walls: when the circle's edge crosses a
/// boundary, snap the center to rest on it and negate that velocity
/// component.
pub fn reflect_walls(body: &mut Body, arena: Vec2) {
    let r = body.radius();

    if body.pos.x - r < 0.0 {
        body.pos.x = r;
        body.vel.x = -body.vel.x;
    } else if body.pos.x + r > arena.x {
        body.pos.x = arena.x - r;
        body.vel.x = -body.vel.x;
    }

    if body.pos.y - r < 0.0 {
        body.pos.y = r;
        body.vel.y = -body.vel.y;
    } else if body.pos.y + r > arena.y {
        body.pos.y = arena.y - r;
        body.vel.y = -body.vel.y;
    }
}
