//! Circular bodies and their integration
//!
//! A body is a circle with position, velocity, and acceleration in pixel
//! space (px, px/ms, px/ms²). The controlled variant carries steering state
//! and is stepped with a speed clamp and idle friction; everything else
//! integrates passively. Dispatch is on the `BodyKind` tag, not a trait.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Display color of the controlled body (DodgerBlue)
pub const CONTROLLED_COLOR: u32 = 0x1E90FF;

/// Directional input for the controlled body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Pressed-direction state for the controlled body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Steering {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl Steering {
    pub fn set(&mut self, dir: Direction, pressed: bool) {
        match dir {
            Direction::Up => self.up = pressed,
            Direction::Down => self.down = pressed,
            Direction::Left => self.left = pressed,
            Direction::Right => self.right = pressed,
        }
    }

    pub fn any_pressed(&self) -> bool {
        self.up || self.down || self.left || self.right
    }

    /// Acceleration for the current key state. Directions are independent,
    /// so opposite keys cancel to zero.
    pub fn acceleration(&self, magnitude: f32) -> Vec2 {
        let mut accel = Vec2::ZERO;
        if self.left {
            accel.x -= magnitude;
        }
        if self.right {
            accel.x += magnitude;
        }
        if self.up {
            accel.y -= magnitude;
        }
        if self.down {
            accel.y += magnitude;
        }
        accel
    }
}

/// How a body is stepped each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Passive body, integrates under its current velocity/acceleration
    Free,
    /// The externally steered body; at most one exists at a time
    Controlled(Steering),
}

/// Tuning for the controlled body's step, copied out of `SimConfig`
#[derive(Debug, Clone, Copy)]
pub struct ControlTuning {
    /// Acceleration per pressed direction, px/ms²
    pub accel: f32,
    /// Speed ceiling, px/ms
    pub max_speed: f32,
    /// Per-tick velocity multiplier while no direction is pressed
    pub idle_friction: f32,
}

/// One circular body in the simulation
#[derive(Debug, Clone)]
pub struct Body {
    pub id: u32,
    pub pos: Vec2,
    /// px/ms
    pub vel: Vec2,
    /// px/ms²
    pub accel: Vec2,
    radius: u32,
    mass: f32,
    /// 0xRRGGBB, display only
    pub color: u32,
    /// Collisions with other bodies; past the limit the body is removed
    pub impacts: u32,
    pub kind: BodyKind,
}

impl Body {
    /// Create a free body. Radius is clamped to at least 1 px and fixed for
    /// the body's lifetime; mass derives from it as radius².
    pub fn new(id: u32, pos: Vec2, vel: Vec2, radius: u32, color: u32) -> Self {
        let radius = radius.max(1);
        Self {
            id,
            pos,
            vel,
            accel: Vec2::ZERO,
            radius,
            mass: (radius * radius) as f32,
            color,
            impacts: 0,
            kind: BodyKind::Free,
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius as f32
    }

    pub fn radius_px(&self) -> u32 {
        self.radius
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn is_controlled(&self) -> bool {
        matches!(self.kind, BodyKind::Controlled(_))
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Semi-implicit Euler over `dt` milliseconds: velocity first, then
    /// position under the updated velocity.
    pub fn integrate(&mut self, dt: f32) {
        self.vel += self.accel * dt;
        self.pos += self.vel * dt;
    }

    /// Instantaneous velocity change scaled by mass.
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.vel += impulse / self.mass;
    }

    /// Advance one tick, dispatching on the body kind.
    ///
    /// The controlled body refreshes its acceleration from the steering
    /// state, integrates, clamps its speed to the ceiling, and decays its
    /// velocity when idle; its speed never exceeds `tuning.max_speed`
    /// after a step.
    pub fn step(&mut self, dt: f32, tuning: &ControlTuning) {
        match self.kind {
            BodyKind::Free => self.integrate(dt),
            BodyKind::Controlled(steering) => {
                self.accel = steering.acceleration(tuning.accel);
                self.integrate(dt);

                let speed = self.vel.length();
                if speed > tuning.max_speed {
                    self.vel *= tuning.max_speed / speed;
                }
                if !steering.any_pressed() {
                    self.vel *= tuning.idle_friction;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TUNING: ControlTuning = ControlTuning {
        accel: 0.001,
        max_speed: 0.5,
        idle_friction: 0.98,
    };

    fn controlled(vel: Vec2, steering: Steering) -> Body {
        let mut body = Body::new(1, Vec2::new(100.0, 100.0), vel, 15, CONTROLLED_COLOR);
        body.kind = BodyKind::Controlled(steering);
        body
    }

    #[test]
    fn test_integration_is_linear_without_acceleration() {
        let mut body = Body::new(1, Vec2::new(100.0, 100.0), Vec2::new(0.1, -0.05), 10, 0);
        for _ in 0..10 {
            body.integrate(16.0);
        }
        // pos = initial + v * dt * k
        assert!((body.pos.x - (100.0 + 0.1 * 16.0 * 10.0)).abs() < 1e-3);
        assert!((body.pos.y - (100.0 - 0.05 * 16.0 * 10.0)).abs() < 1e-3);
    }

    #[test]
    fn test_integration_applies_acceleration_before_position() {
        let mut body = Body::new(1, Vec2::ZERO, Vec2::ZERO, 10, 0);
        body.accel = Vec2::new(0.01, 0.0);
        body.integrate(16.0);
        // Semi-implicit: the new velocity moves the body this same tick
        assert!((body.vel.x - 0.16).abs() < 1e-6);
        assert!((body.pos.x - 0.16 * 16.0).abs() < 1e-4);
    }

    #[test]
    fn test_impulse_is_scaled_by_mass() {
        let mut small = Body::new(1, Vec2::ZERO, Vec2::ZERO, 2, 0);
        let mut large = Body::new(2, Vec2::ZERO, Vec2::ZERO, 4, 0);
        small.apply_impulse(Vec2::new(8.0, 0.0));
        large.apply_impulse(Vec2::new(8.0, 0.0));
        assert!((small.vel.x - 2.0).abs() < 1e-6); // mass 4
        assert!((large.vel.x - 0.5).abs() < 1e-6); // mass 16
    }

    #[test]
    fn test_radius_clamped_to_one() {
        let body = Body::new(1, Vec2::ZERO, Vec2::ZERO, 0, 0);
        assert_eq!(body.radius_px(), 1);
        assert_eq!(body.mass(), 1.0);
    }

    #[test]
    fn test_opposite_directions_cancel() {
        let steering = Steering {
            left: true,
            right: true,
            up: true,
            down: false,
        };
        let accel = steering.acceleration(0.001);
        assert_eq!(accel.x, 0.0);
        assert!(accel.y < 0.0);
    }

    #[test]
    fn test_idle_friction_decays_velocity() {
        let mut body = controlled(Vec2::new(0.2, 0.0), Steering::default());
        body.step(16.0, &TUNING);
        assert!((body.vel.x - 0.2 * 0.98).abs() < 1e-6);
    }

    #[test]
    fn test_held_direction_accelerates_until_clamped() {
        let steering = Steering {
            right: true,
            ..Default::default()
        };
        let mut body = controlled(Vec2::ZERO, steering);
        for _ in 0..100 {
            body.step(16.0, &TUNING);
        }
        assert!((body.vel.x - TUNING.max_speed).abs() < 1e-4);
        assert_eq!(body.vel.y, 0.0);
    }

    proptest! {
        #[test]
        fn prop_controlled_speed_never_exceeds_max(
            vx in -2.0f32..2.0,
            vy in -2.0f32..2.0,
            up in proptest::bool::ANY,
            down in proptest::bool::ANY,
            left in proptest::bool::ANY,
            right in proptest::bool::ANY,
        ) {
            let steering = Steering { up, down, left, right };
            let mut body = controlled(Vec2::new(vx, vy), steering);
            body.step(16.0, &TUNING);
            prop_assert!(body.speed() <= TUNING.max_speed + 1e-4);
        }
    }
}
