//! Simulation module
//!
//! All physics lives here and is plain single-threaded state:
//! - Fixed timestep only
//! - Seeded RNG only
//! - No threading or platform dependencies (the engine adds those)

pub mod body;
pub mod collision;
pub mod snapshot;
pub mod spatial;
pub mod world;
pub mod zone;

pub use body::{Body, BodyKind, Direction, Steering};
pub use collision::{reflect_walls, resolve_pair};
pub use snapshot::{BodySnapshot, WorldSnapshot};
pub use spatial::SpatialGrid;
pub use world::World;
pub use zone::{Rect, ZoneConfig, ZoneTracker};
