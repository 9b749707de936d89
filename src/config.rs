//! World setup and tuning
//!
//! Loaded from JSON; every field falls back to its default when missing.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Result, SimError};
use crate::sim::archetype::ArchetypePresets;
use crate::sim::pop::validate_stats;

/// A static rectangular obstacle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub center: Vec2,
    pub half_extents: Vec2,
}

/// Simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Number of pops spawned at start
    pub pop_count: usize,
    /// Chance each spawned pop is a zomboid
    pub zomboid_ratio: f64,

    // === Arena ===
    /// Arena size; the arena is centered on the origin
    pub arena_width: f32,
    pub arena_height: f32,
    /// Enclose the arena in walls
    pub walls: bool,
    pub wall_thickness: f32,
    pub obstacles: Vec<Obstacle>,

    // === Locomotion ===
    /// Upper bound on random spawn speed (px/s)
    pub initial_speed: f32,
    /// Upper bound on the random spawn force
    pub initial_impulse: f32,
    /// Steering correction per second of elapsed time
    pub steering_gain: f32,
    /// How long an idle heading is held (ms)
    pub wander_duration: f32,
    /// Fraction of cruise speed used while wandering
    pub wander_speed_factor: f32,
    /// Upper bound on the infectoid jitter force
    pub jitter_force: f32,
    /// Velocities above `speed * max_overspeed` are clamped
    pub max_overspeed: f32,

    // === Infection ===
    /// Infectoid → zomboid duration (ms)
    pub infection_duration: f32,
    /// Recolor interval while turning (ms)
    pub infection_sample_interval: f32,

    pub presets: ArchetypePresets,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            pop_count: 100,
            zomboid_ratio: 0.1,

            arena_width: ARENA_WIDTH,
            arena_height: ARENA_HEIGHT,
            walls: true,
            wall_thickness: WALL_THICKNESS,
            obstacles: vec![
                Obstacle {
                    center: Vec2::new(-300.0, 0.0),
                    half_extents: Vec2::new(20.0, 140.0),
                },
                Obstacle {
                    center: Vec2::new(300.0, 0.0),
                    half_extents: Vec2::new(20.0, 140.0),
                },
                Obstacle {
                    center: Vec2::new(0.0, 180.0),
                    half_extents: Vec2::new(160.0, 20.0),
                },
            ],

            initial_speed: 6.0,
            initial_impulse: 1500.0,
            steering_gain: STEERING_GAIN,
            wander_duration: 3000.0,
            wander_speed_factor: 0.4,
            jitter_force: 3000.0,
            max_overspeed: 1.5,

            infection_duration: INFECTION_DURATION,
            infection_sample_interval: INFECTION_SAMPLE_INTERVAL,

            presets: ArchetypePresets::default(),
        }
    }
}

impl SimConfig {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, value: f32| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SimError::Configuration(format!(
                    "{name} must be positive, got {value}"
                )))
            }
        };

        positive("arena width", self.arena_width)?;
        positive("arena height", self.arena_height)?;
        if self.walls {
            positive("wall thickness", self.wall_thickness)?;
        }
        positive("steering gain", self.steering_gain)?;
        positive("wander duration", self.wander_duration)?;
        positive("wander speed factor", self.wander_speed_factor)?;
        positive("max overspeed", self.max_overspeed)?;
        positive("infection duration", self.infection_duration)?;
        positive("infection sample interval", self.infection_sample_interval)?;

        if !(0.0..=1.0).contains(&self.zomboid_ratio) {
            return Err(SimError::Configuration(format!(
                "zomboid ratio must be in [0, 1], got {}",
                self.zomboid_ratio
            )));
        }
        if self.initial_speed < 0.0 || self.initial_impulse < 0.0 || self.jitter_force < 0.0 {
            return Err(SimError::Configuration(
                "spawn speed, spawn impulse and jitter force must not be negative".into(),
            ));
        }
        for obstacle in &self.obstacles {
            if obstacle.half_extents.x <= 0.0 || obstacle.half_extents.y <= 0.0 {
                return Err(SimError::Configuration(format!(
                    "obstacle at {} has non-positive extents",
                    obstacle.center
                )));
            }
        }

        validate_stats(&self.presets.humanoid.stats)?;
        validate_stats(&self.presets.infectoid.stats)?;
        validate_stats(&self.presets.zomboid.stats)
    }
}
