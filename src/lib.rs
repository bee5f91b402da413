//! Bouncebox - a bounded-arena simulation of colliding circular bodies
//!
//! Core modules:
//! - `sim`: Simulation state and physics (bodies, broad/narrow phase, zone)
//! - `engine`: Background tick thread, pause gate, snapshots, observers
//! - `config`: Tunables with serde + JSON loading
//!
//! Coordinates are in pixels with the origin at the top-left corner and +y
//! pointing down. Velocities are px/ms, accelerations px/ms²; the logical
//! tick is a fixed 16 ms.

pub mod config;
pub mod engine;
pub mod sim;

pub use config::SimConfig;
pub use engine::Engine;
pub use sim::body::{Body, BodyKind, Direction, Steering};
pub use sim::snapshot::{BodySnapshot, WorldSnapshot};
pub use sim::world::World;
pub use sim::zone::Rect;
