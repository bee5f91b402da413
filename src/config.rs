//! Simulation tunables
//!
//! Everything adjustable lives here so tests and the demo binary can build
//! reproducible worlds. Defaults match the reference tuning; out-of-range
//! values are clamped rather than rejected.

use serde::{Deserialize, Serialize};

/// Minimum arena dimension in px. Smaller requested sizes are clamped up.
pub const MIN_ARENA_DIM: f32 = 50.0;
/// Minimum zone dimension when derived from arena ratios.
pub const MIN_ZONE_DIM: f32 = 10.0;

/// Simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Logical tick length in milliseconds
    pub tick_ms: f32,

    // === Arena ===
    /// Initial arena width/height in px (clamped to MIN_ARENA_DIM)
    pub arena_width: f32,
    pub arena_height: f32,

    // === Bodies ===
    /// Random radius range for spawned bodies, px: [min, max)
    pub min_radius: u32,
    pub max_radius: u32,
    /// Random spawn speed range, px/s: [min, max)
    pub min_speed: f32,
    pub max_speed: f32,
    /// Impacts at which a body is removed (the controlled body is exempt)
    pub impact_limit: u32,

    // === Broad phase ===
    /// Grid cell size in px. Should exceed the largest body diameter so a
    /// pair can never span two non-adjacent cells.
    pub cell_size: f32,

    // === Controlled body ===
    /// Fixed radius of the controlled body, px
    pub control_radius: u32,
    /// Acceleration per pressed direction, px/ms²
    pub control_accel: f32,
    /// Speed ceiling for the controlled body, px/ms
    pub control_max_speed: f32,
    /// Per-tick velocity multiplier while no direction is pressed
    pub idle_friction: f32,

    // === Zone ===
    /// Zone size as a fraction of the arena when no explicit rect is set
    pub zone_width_ratio: f32,
    pub zone_height_ratio: f32,
    /// Maximum simultaneous occupants (clamped to >= 1)
    pub zone_capacity: usize,

    /// RNG seed for reproducible spawns; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_ms: 16.0,

            arena_width: 600.0,
            arena_height: 400.0,

            min_radius: 8,
            max_radius: 20,
            min_speed: 60.0,
            max_speed: 180.0,
            impact_limit: 5,

            cell_size: 40.0,

            control_radius: 15,
            control_accel: 0.001,
            control_max_speed: 0.5,
            idle_friction: 0.98,

            zone_width_ratio: 0.5,
            zone_height_ratio: 0.5,
            zone_capacity: 1,

            seed: None,
        }
    }
}

impl SimConfig {
    /// Clamp every field into its documented range. Invalid input is never
    /// an error; it is silently corrected to the nearest legal value.
    pub fn sanitized(mut self) -> Self {
        self.tick_ms = self.tick_ms.max(1.0);
        self.arena_width = self.arena_width.max(MIN_ARENA_DIM);
        self.arena_height = self.arena_height.max(MIN_ARENA_DIM);
        self.min_radius = self.min_radius.max(1);
        self.max_radius = self.max_radius.max(self.min_radius + 1);
        self.min_speed = self.min_speed.max(0.0);
        self.max_speed = self.max_speed.max(self.min_speed + 1.0);
        self.impact_limit = self.impact_limit.max(1);
        self.cell_size = self.cell_size.max(1.0);
        self.control_radius = self.control_radius.max(1);
        self.control_accel = self.control_accel.max(0.0);
        self.control_max_speed = self.control_max_speed.max(0.0);
        self.idle_friction = self.idle_friction.clamp(0.0, 1.0);
        self.zone_width_ratio = self.zone_width_ratio.clamp(0.0, 1.0);
        self.zone_height_ratio = self.zone_height_ratio.clamp(0.0, 1.0);
        self.zone_capacity = self.zone_capacity.max(1);
        self
    }

    /// Load configuration from a JSON file, falling back to defaults when
    /// the file is missing or malformed.
    pub fn load_from(path: &str) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str::<SimConfig>(&json) {
                Ok(cfg) => {
                    log::info!("Loaded config from {path}");
                    cfg.sanitized()
                }
                Err(e) => {
                    log::warn!("Ignoring malformed config {path}: {e}");
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Cannot read config {path}: {e}; using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_already_sane() {
        let cfg = SimConfig::default();
        let sane = cfg.clone().sanitized();
        assert_eq!(cfg.tick_ms, sane.tick_ms);
        assert_eq!(cfg.max_radius, sane.max_radius);
        assert_eq!(cfg.zone_capacity, sane.zone_capacity);
    }

    #[test]
    fn test_sanitize_clamps_degenerate_values() {
        let cfg = SimConfig {
            tick_ms: -5.0,
            arena_width: 0.0,
            arena_height: 10.0,
            min_radius: 0,
            max_radius: 0,
            zone_capacity: 0,
            idle_friction: 3.0,
            ..Default::default()
        }
        .sanitized();

        assert_eq!(cfg.tick_ms, 1.0);
        assert_eq!(cfg.arena_width, MIN_ARENA_DIM);
        assert_eq!(cfg.arena_height, MIN_ARENA_DIM);
        assert_eq!(cfg.min_radius, 1);
        assert!(cfg.max_radius > cfg.min_radius);
        assert_eq!(cfg.zone_capacity, 1);
        assert_eq!(cfg.idle_friction, 1.0);
    }

    #[test]
    fn test_config_json_round_trip() {
        let cfg = SimConfig {
            seed: Some(7),
            zone_capacity: 3,
            ..Default::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: SimConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.seed, Some(7));
        assert_eq!(back.zone_capacity, 3);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let back: SimConfig = serde_json::from_str(r#"{"zone_capacity": 4}"#).unwrap();
        assert_eq!(back.zone_capacity, 4);
        assert_eq!(back.tick_ms, 16.0);
    }
}
