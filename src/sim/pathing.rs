//! Evasion planning by bearing-gap bisection
//!
//! Threat bearings are sorted around the observer; the widest angular gap
//! between neighbours (including the wraparound gap) is the most open
//! direction, and the pop heads for its bisector. This is a local heading
//! choice, not a path around obstacles.

use std::f32::consts::TAU;

use glam::Vec2;

use super::collision::ray_rect;
use super::terrain::Terrain;
use crate::consts::BEARING_EPSILON;
use crate::{bearing, wrap_angle};

/// An angular gap between two consecutive bearings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gap {
    /// Bearing the gap opens from (counter-clockwise)
    pub start: f32,
    /// Bearing the gap closes at
    pub end: f32,
    /// Angular width, always positive
    pub width: f32,
}

impl Gap {
    /// Bearing halfway across the gap, in [0, 2π)
    pub fn bisector(&self) -> f32 {
        wrap_angle(self.start + self.width / 2.0)
    }
}

/// Bearing from `origin` to a point; `None` if they coincide
pub fn point_bearing(origin: Vec2, target: Vec2) -> Option<f32> {
    let delta = target - origin;
    (delta.length_squared() > 1e-12).then(|| bearing(delta))
}

/// Bearing from `origin` toward a rectangular obstacle
///
/// Rays are cast along ±x and ±y up to `range`; the nearest face hit gives
/// the bearing. If no axis ray reaches the obstacle, the nearest vertex is
/// used instead.
pub fn terrain_bearing(origin: Vec2, terrain: &Terrain, range: f32) -> Option<f32> {
    let nearest_face = [Vec2::X, Vec2::NEG_X, Vec2::Y, Vec2::NEG_Y]
        .into_iter()
        .filter_map(|axis| {
            ray_rect(origin, origin + axis * range, terrain.center, terrain.half_extents)
                .map(|t| (t, axis))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0));

    if let Some((_, axis)) = nearest_face {
        return Some(bearing(axis));
    }

    terrain
        .vertices()
        .into_iter()
        .min_by(|a, b| a.distance_squared(origin).total_cmp(&b.distance_squared(origin)))
        .and_then(|v| point_bearing(origin, v))
}

/// Widest gap among at least two bearings
///
/// Bearings are wrapped to [0, 2π) and sorted. Interior gaps are scanned in
/// order and the wraparound gap `2π − (max − min)` is compared last; ties go
/// to the first gap found.
pub fn widest_gap(bearings: &[f32]) -> Option<Gap> {
    if bearings.len() < 2 {
        return None;
    }

    let mut sorted: Vec<f32> = bearings.iter().copied().map(wrap_angle).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mut best: Option<Gap> = None;
    for pair in sorted.windows(2) {
        let width = pair[1] - pair[0];
        if best.is_none_or(|b| width > b.width) {
            best = Some(Gap {
                start: pair[0],
                end: pair[1],
                width,
            });
        }
    }

    // The wraparound difference `min - max` is negative; lift it by 2π
    let (min, max) = (sorted[0], sorted[sorted.len() - 1]);
    let wrap_width = TAU - (max - min);
    match best {
        Some(b) if wrap_width <= b.width => Some(b),
        _ => Some(Gap {
            start: max,
            end: min,
            width: wrap_width,
        }),
    }
}

/// Heading toward the most open space around a set of threat bearings
///
/// No bearings gives the zero vector. A single bearing is paired with a copy
/// offset by a tiny epsilon so the gap is always well defined, which sends
/// the pop straight away from the threat.
pub fn evasion_direction(bearings: &[f32]) -> Vec2 {
    let gap = match bearings {
        [] => return Vec2::ZERO,
        [only] => widest_gap(&[*only, *only + BEARING_EPSILON]),
        many => widest_gap(many),
    };

    match gap {
        Some(gap) => Vec2::from_angle(gap.bisector()),
        None => Vec2::ZERO,
    }
}
