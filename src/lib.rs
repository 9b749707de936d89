//! Zomboid Arena - humanoids fleeing zomboids in a walled 2D arena
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, perception, pathing, infection)
//! - `config`: Data-driven world setup and archetype presets
//! - `error`: Error taxonomy shared by the simulation

pub mod config;
pub mod error;
pub mod sim;

pub use config::SimConfig;
pub use error::{Result, SimError};

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep in milliseconds (60 Hz)
    pub const SIM_DT: f32 = 1000.0 / 60.0;

    /// Steering gain applied to the normalized velocity correction
    pub const STEERING_GAIN: f32 = 20.0;

    /// Time for an infectoid to fully turn (ms)
    pub const INFECTION_DURATION: f32 = 5000.0;
    /// How often the infection color is resampled (ms)
    pub const INFECTION_SAMPLE_INTERVAL: f32 = 10.0;

    /// Offset used to synthesize a second bearing for a lone threat (radians)
    pub const BEARING_EPSILON: f32 = 0.0001;

    /// Pop body mass
    pub const POP_MASS: f32 = 30.0;

    /// Default arena dimensions
    pub const ARENA_WIDTH: f32 = 1280.0;
    pub const ARENA_HEIGHT: f32 = 720.0;
    pub const WALL_THICKNESS: f32 = 40.0;
}

/// Wrap an angle to [0, 2π)
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    use std::f32::consts::TAU;
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Bearing of a vector in [0, 2π)
#[inline]
pub fn bearing(v: Vec2) -> f32 {
    wrap_angle(v.y.atan2(v.x))
}

/// Smallest absolute difference between two angles
#[inline]
pub fn angle_distance(a: f32, b: f32) -> f32 {
    let d = wrap_angle(a - b);
    d.min(std::f32::consts::TAU - d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI, TAU};

    #[test]
    fn test_wrap_angle() {
        assert!((wrap_angle(-FRAC_PI_2) - 3.0 * FRAC_PI_2).abs() < 1e-5);
        assert!((wrap_angle(TAU + 0.5) - 0.5).abs() < 1e-5);
        assert!(wrap_angle(TAU) < 1e-5);
        assert!(wrap_angle(-1e-9) < TAU);
    }

    #[test]
    fn test_bearing_quadrants() {
        assert!(bearing(Vec2::X).abs() < 1e-6);
        assert!((bearing(Vec2::NEG_X) - PI).abs() < 1e-6);
        assert!((bearing(Vec2::NEG_Y) - 3.0 * FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_angle_distance_wraps() {
        assert!((angle_distance(0.1, TAU - 0.1) - 0.2).abs() < 1e-5);
        assert!((angle_distance(0.0, PI) - PI).abs() < 1e-5);
    }
}
