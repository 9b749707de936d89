//! Archetypes, stats, appearance and the per-archetype preset table

use std::fmt;

use serde::{Deserialize, Serialize};

/// Behavioral/visual category of a pop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    Humanoid,
    Infectoid,
    Zomboid,
}

impl Archetype {
    pub const ALL: [Archetype; 3] = [Archetype::Humanoid, Archetype::Infectoid, Archetype::Zomboid];

    pub fn as_str(&self) -> &'static str {
        match self {
            Archetype::Humanoid => "Humanoid",
            Archetype::Infectoid => "Infectoid",
            Archetype::Zomboid => "Zomboid",
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An sRGB color with alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const TRANSPARENT: Rgba = Rgba::new(255, 255, 255, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Per-channel linear interpolation; `t` is clamped to [0, 1]
    pub fn lerp(self, to: Rgba, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgba::new(
            mix(self.r, to.r),
            mix(self.g, to.g),
            mix(self.b, to.b),
            mix(self.a, to.a),
        )
    }

    /// CSS color string, as a canvas renderer expects
    pub fn to_css(&self) -> String {
        if self.a == 255 {
            format!("rgb({}, {}, {})", self.r, self.g, self.b)
        } else {
            format!(
                "rgba({}, {}, {}, {})",
                self.r,
                self.g,
                self.b,
                self.a as f32 / 255.0
            )
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub archetype: Archetype,
    /// Body radius (px)
    pub size: f32,
    /// Sensor radius (px)
    pub perception_range: f32,
    /// Cruise speed (px/s)
    pub speed: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appearance {
    pub body_color: Rgba,
    pub body_border_color: Rgba,
    pub body_border_width: f32,
    pub sensor_fill_color: Rgba,
    pub sensor_border_color: Rgba,
}

/// Partial stats update; `None` fields are left alone
#[derive(Debug, Clone, Default)]
pub struct StatsUpdate {
    pub archetype: Option<Archetype>,
    pub size: Option<f32>,
    pub perception_range: Option<f32>,
    pub speed: Option<f32>,
}

/// Partial appearance update; `None` fields are left alone
#[derive(Debug, Clone, Default)]
pub struct AppearanceUpdate {
    pub body_color: Option<Rgba>,
    pub body_border_color: Option<Rgba>,
    pub body_border_width: Option<f32>,
    pub sensor_fill_color: Option<Rgba>,
    pub sensor_border_color: Option<Rgba>,
}

/// Template a pop is built from (or reset to on transition)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopConfiguration {
    pub stats: Stats,
    pub appearance: Appearance,
}

fn default_appearance(body_color: Rgba) -> Appearance {
    Appearance {
        body_color,
        body_border_color: Rgba::BLACK,
        body_border_width: 5.0,
        sensor_fill_color: Rgba::TRANSPARENT,
        sensor_border_color: Rgba::BLACK,
    }
}

/// Immutable per-archetype templates, cloned per pop and per transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypePresets {
    pub humanoid: PopConfiguration,
    pub infectoid: PopConfiguration,
    pub zomboid: PopConfiguration,
}

impl Default for ArchetypePresets {
    fn default() -> Self {
        Self {
            humanoid: PopConfiguration {
                stats: Stats {
                    archetype: Archetype::Humanoid,
                    size: 10.0,
                    perception_range: 200.0,
                    speed: 54.0,
                },
                appearance: default_appearance(Rgba::WHITE),
            },
            infectoid: PopConfiguration {
                stats: Stats {
                    archetype: Archetype::Infectoid,
                    size: 10.0,
                    perception_range: 250.0,
                    speed: 66.0,
                },
                appearance: default_appearance(Rgba::WHITE),
            },
            zomboid: PopConfiguration {
                stats: Stats {
                    archetype: Archetype::Zomboid,
                    size: 10.0,
                    perception_range: 150.0,
                    speed: 30.0,
                },
                appearance: default_appearance(Rgba::rgb(70, 250, 100)),
            },
        }
    }
}

impl ArchetypePresets {
    pub fn get(&self, archetype: Archetype) -> &PopConfiguration {
        match archetype {
            Archetype::Humanoid => &self.humanoid,
            Archetype::Infectoid => &self.infectoid,
            Archetype::Zomboid => &self.zomboid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_endpoints_and_midpoint() {
        let from = Rgba::WHITE;
        let to = Rgba::rgb(70, 250, 100);
        assert_eq!(from.lerp(to, 0.0), from);
        assert_eq!(from.lerp(to, 1.0), to);
        assert_eq!(from.lerp(to, 2.0), to);
        assert_eq!(from.lerp(to, 0.5), Rgba::rgb(163, 253, 178));
    }

    #[test]
    fn test_css_strings() {
        assert_eq!(Rgba::rgb(70, 250, 100).to_css(), "rgb(70, 250, 100)");
        assert_eq!(Rgba::TRANSPARENT.to_css(), "rgba(255, 255, 255, 0)");
    }

    #[test]
    fn test_presets_match_archetypes() {
        let presets = ArchetypePresets::default();
        for archetype in Archetype::ALL {
            assert_eq!(presets.get(archetype).stats.archetype, archetype);
        }
    }
}
