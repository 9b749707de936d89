//! Pops: the simulated actors
//!
//! A pop is one engine body carrying two colliders: a solid circle of radius
//! `size` and a sensor circle of radius `perception_range`. The engine keeps
//! the authoritative kinematics; the pop mirrors them after every step.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::archetype::{
    Appearance, AppearanceUpdate, Archetype, PopConfiguration, Rgba, Stats, StatsUpdate,
};
use super::infection::Infection;
use super::perception::DetectedSet;
use super::physics::{BodyHandle, ColliderHandle, Engine, Shape};
use crate::consts::{POP_MASS, STEERING_GAIN};
use crate::error::{Result, SimError};

/// Stable pop identity; doubles as the index into the world's pop list
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PopId(pub u32);

impl PopId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Render attributes of the sensor circle, identical for every archetype
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorRender {
    pub fill: Rgba,
    pub border: Rgba,
    pub border_width: f32,
}

pub const SENSOR_RENDER: SensorRender = SensorRender {
    fill: Rgba::TRANSPARENT,
    border: Rgba::BLACK,
    border_width: 0.0,
};

/// Idle heading, re-rolled when it expires
#[derive(Debug, Clone, Copy)]
struct Wander {
    heading: Vec2,
    until: f32,
}

#[derive(Debug, Clone)]
pub struct Pop {
    pub id: PopId,
    stats: Stats,
    appearance: Appearance,
    body: BodyHandle,
    body_collider: ColliderHandle,
    sensor_collider: ColliderHandle,
    position: Vec2,
    velocity: Vec2,
    /// Entities currently overlapping the sensor
    pub detected: DetectedSet,
    /// Pending infectoid → zomboid transition
    pub(crate) infection: Option<Infection>,
    wander: Option<Wander>,
}

/// Reject non-positive (or non-finite) stats
pub fn validate_stats(stats: &Stats) -> Result<()> {
    let check = |name: &str, value: f32| {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(SimError::Configuration(format!(
                "{} {name} must be positive, got {value}",
                stats.archetype
            )))
        }
    };
    check("size", stats.size)?;
    check("perception range", stats.perception_range)?;
    check("speed", stats.speed)
}

impl Pop {
    /// Build a pop and register its body and colliders with the engine
    pub fn create(
        engine: &mut Engine,
        id: PopId,
        position: Vec2,
        velocity: Vec2,
        config: &PopConfiguration,
    ) -> Result<Self> {
        validate_stats(&config.stats)?;

        let body = engine.add_body(position, velocity, POP_MASS);
        let body_collider = engine.add_collider(
            body,
            Shape::Circle {
                radius: config.stats.size,
            },
            false,
        );
        let sensor_collider = engine.add_collider(
            body,
            Shape::Circle {
                radius: config.stats.perception_range,
            },
            true,
        );

        Ok(Self {
            id,
            stats: config.stats.clone(),
            appearance: config.appearance.clone(),
            body,
            body_collider,
            sensor_collider,
            position,
            velocity,
            detected: DetectedSet::default(),
            infection: None,
            wander: None,
        })
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn appearance(&self) -> &Appearance {
        &self.appearance
    }

    pub fn archetype(&self) -> Archetype {
        self.stats.archetype
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn body_collider(&self) -> ColliderHandle {
        self.body_collider
    }

    pub fn sensor_collider(&self) -> ColliderHandle {
        self.sensor_collider
    }

    pub fn is_turning(&self) -> bool {
        self.infection.is_some()
    }

    /// Sensor render attributes never follow the archetype
    pub fn sensor_render(&self) -> SensorRender {
        SENSOR_RENDER
    }

    /// Merge-overwrite stats, resizing colliders when size or range change
    pub fn set_stats(&mut self, engine: &mut Engine, update: StatsUpdate) -> Result<()> {
        let next = Stats {
            archetype: update.archetype.unwrap_or(self.stats.archetype),
            size: update.size.unwrap_or(self.stats.size),
            perception_range: update.perception_range.unwrap_or(self.stats.perception_range),
            speed: update.speed.unwrap_or(self.stats.speed),
        };
        validate_stats(&next)?;

        if next.size != self.stats.size {
            engine.set_shape(self.body_collider, Shape::Circle { radius: next.size });
        }
        if next.perception_range != self.stats.perception_range {
            engine.set_shape(
                self.sensor_collider,
                Shape::Circle {
                    radius: next.perception_range,
                },
            );
        }
        self.stats = next;
        Ok(())
    }

    pub fn set_appearance(&mut self, update: AppearanceUpdate) {
        let a = &mut self.appearance;
        if let Some(color) = update.body_color {
            a.body_color = color;
        }
        if let Some(color) = update.body_border_color {
            a.body_border_color = color;
        }
        if let Some(width) = update.body_border_width {
            a.body_border_width = width;
        }
        if let Some(color) = update.sensor_fill_color {
            a.sensor_fill_color = color;
        }
        if let Some(color) = update.sensor_border_color {
            a.sensor_border_color = color;
        }
    }

    /// Replace stats and appearance wholesale from a preset
    pub fn apply_preset(&mut self, engine: &mut Engine, preset: &PopConfiguration) -> Result<()> {
        self.set_stats(
            engine,
            StatsUpdate {
                archetype: Some(preset.stats.archetype),
                size: Some(preset.stats.size),
                perception_range: Some(preset.stats.perception_range),
                speed: Some(preset.stats.speed),
            },
        )?;
        self.appearance = preset.appearance.clone();
        Ok(())
    }

    /// Steer toward `direction` at cruise speed with the default gain
    pub fn steer_toward(&mut self, direction: Vec2, elapsed: f32) -> Vec2 {
        self.steer(direction, self.stats.speed, STEERING_GAIN, elapsed)
    }

    /// Velocity-matching steering
    ///
    /// The correction is the normalized difference between the desired and
    /// current velocity, scaled by `gain` and the elapsed time (ms, applied
    /// per second), and never longer than that difference. Returns the
    /// correction that was added to the velocity.
    pub fn steer(&mut self, direction: Vec2, speed: f32, gain: f32, elapsed: f32) -> Vec2 {
        let Some(heading) = direction.try_normalize() else {
            return Vec2::ZERO;
        };

        let desired = heading * speed;
        let diff = desired - self.velocity;
        let Some(diff_dir) = diff.try_normalize() else {
            return Vec2::ZERO;
        };

        let magnitude = (gain * elapsed / 1000.0).min(diff.length());
        let correction = diff_dir * magnitude;
        self.velocity += correction;
        correction
    }

    /// Current idle heading, re-rolled every `duration` ms
    pub fn wander_heading<R: Rng>(&mut self, now: f32, duration: f32, rng: &mut R) -> Vec2 {
        match self.wander {
            Some(w) if now < w.until => w.heading,
            _ => {
                let angle = rng.random_range(0.0..std::f32::consts::TAU);
                let heading = Vec2::from_angle(angle);
                self.wander = Some(Wander {
                    heading,
                    until: now + duration,
                });
                heading
            }
        }
    }

    /// Clamp runaway speed to `max_speed`
    pub fn limit_speed(&mut self, max_speed: f32) -> bool {
        if self.velocity.length_squared() > max_speed * max_speed {
            self.velocity = self.velocity.clamp_length_max(max_speed);
            true
        } else {
            false
        }
    }

    pub(crate) fn sync_kinematics(&mut self, position: Vec2, velocity: Vec2) {
        self.position = position;
        self.velocity = velocity;
    }
}
