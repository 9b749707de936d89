//! Timed humanoid → infectoid → zomboid transition
//!
//! Infection is one-way. A humanoid touched by a zomboid becomes an infectoid
//! at once and carries a pending-transition record; the world samples that
//! record every tick, recoloring the body at a fixed interval until the
//! duration runs out and the pop becomes a full zomboid. Dropping the record
//! is all the cancellation there is.

use super::archetype::{Archetype, Rgba};

/// Pending infectoid → zomboid transition
#[derive(Debug, Clone, PartialEq)]
pub struct Infection {
    /// Simulation time the infection took hold (ms)
    pub started_at: f32,
    pub from: Rgba,
    pub to: Rgba,
    /// Time until the pop fully turns (ms)
    pub duration: f32,
    /// Minimum spacing between recolors (ms)
    pub sample_interval: f32,
    last_sample: f32,
}

/// Outcome of sampling an infection at a point in time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InfectionStep {
    /// Too soon since the last recolor
    Waiting,
    /// New interpolated body color
    Recolor(Rgba),
    /// Duration elapsed; assign the zomboid preset
    Complete,
}

impl Infection {
    pub fn new(started_at: f32, from: Rgba, to: Rgba, duration: f32, sample_interval: f32) -> Self {
        Self {
            started_at,
            from,
            to,
            duration,
            sample_interval,
            last_sample: started_at,
        }
    }

    /// Fraction of the transition elapsed at `now`, in [0, 1]
    pub fn progress(&self, now: f32) -> f32 {
        ((now - self.started_at) / self.duration).clamp(0.0, 1.0)
    }

    pub fn color_at(&self, now: f32) -> Rgba {
        self.from.lerp(self.to, self.progress(now))
    }

    pub fn sample(&mut self, now: f32) -> InfectionStep {
        if now - self.started_at >= self.duration {
            return InfectionStep::Complete;
        }
        if now - self.last_sample < self.sample_interval {
            return InfectionStep::Waiting;
        }
        self.last_sample = now;
        InfectionStep::Recolor(self.color_at(now))
    }
}

/// One side of a contact pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    First,
    Second,
}

/// Which side of a physical contact gets infected, if any
///
/// Only a humanoid touching a zomboid qualifies; infectoids and zomboids
/// are never re-infected, so timers cannot restart or stack.
pub fn infection_victim(a: Archetype, b: Archetype) -> Option<Side> {
    match (a, b) {
        (Archetype::Humanoid, Archetype::Zomboid) => Some(Side::First),
        (Archetype::Zomboid, Archetype::Humanoid) => Some(Side::Second),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREEN: Rgba = Rgba::rgb(70, 250, 100);

    #[test]
    fn test_sampling_respects_interval() {
        let mut infection = Infection::new(100.0, Rgba::WHITE, GREEN, 5000.0, 10.0);
        assert_eq!(infection.sample(105.0), InfectionStep::Waiting);
        assert!(matches!(infection.sample(110.0), InfectionStep::Recolor(_)));
        assert_eq!(infection.sample(115.0), InfectionStep::Waiting);
        assert!(matches!(infection.sample(121.0), InfectionStep::Recolor(_)));
    }

    #[test]
    fn test_completes_at_duration() {
        let mut infection = Infection::new(0.0, Rgba::WHITE, GREEN, 5000.0, 10.0);
        assert!(matches!(infection.sample(4999.0), InfectionStep::Recolor(_)));
        assert_eq!(infection.sample(5000.0), InfectionStep::Complete);
        assert_eq!(infection.sample(9000.0), InfectionStep::Complete);
    }

    #[test]
    fn test_colors_move_monotonically() {
        let mut infection = Infection::new(0.0, Rgba::WHITE, GREEN, 5000.0, 10.0);
        let mut last = Rgba::WHITE;
        let mut now = 0.0;
        while now < 5000.0 {
            now += 16.0;
            if let InfectionStep::Recolor(c) = infection.sample(now) {
                assert!(c.r <= last.r && c.g <= last.g && c.b <= last.b);
                last = c;
            }
        }
        assert_eq!(infection.color_at(5000.0), GREEN);
    }

    #[test]
    fn test_only_humanoid_zomboid_contacts_infect() {
        use Archetype::*;
        assert_eq!(infection_victim(Humanoid, Zomboid), Some(Side::First));
        assert_eq!(infection_victim(Zomboid, Humanoid), Some(Side::Second));
        assert_eq!(infection_victim(Infectoid, Zomboid), None);
        assert_eq!(infection_victim(Zomboid, Zomboid), None);
        assert_eq!(infection_victim(Humanoid, Infectoid), None);
        assert_eq!(infection_victim(Humanoid, Humanoid), None);
    }
}
