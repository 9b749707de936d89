//! Per-archetype decision making
//!
//! Each tick every pop picks an `Intent` from a read-only view of the world;
//! the world then turns intents into steering and forces.

use glam::Vec2;

use super::archetype::Archetype;
use super::pathing::{evasion_direction, point_bearing, terrain_bearing};
use super::perception::{Category, Owner, filter_visible, perceived_terrain};
use super::physics::Engine;
use super::pop::Pop;
use super::terrain::Terrain;
use crate::error::{Result, SimError};

/// What a pop wants to do this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    /// Steer toward a direction at cruise speed
    Steer(Vec2),
    /// Follow the idle heading at reduced speed
    Wander,
    /// Undirected random shove (infectoids)
    Jitter,
}

/// Everything a pop may look at while deciding
#[derive(Clone, Copy)]
pub struct WorldView<'a> {
    pub pops: &'a [Pop],
    pub terrain: &'a [Terrain],
    pub engine: &'a Engine,
    pub owners: &'a [Owner],
}

pub fn decide(pop: &Pop, view: &WorldView) -> Intent {
    let decision = match pop.archetype() {
        Archetype::Humanoid => flee(pop, view),
        Archetype::Zomboid => pursue(pop, view),
        Archetype::Infectoid => return Intent::Jitter,
    };
    decision.unwrap_or_else(|e| {
        log::trace!("pop {} idles: {e}", pop.id.0);
        Intent::Wander
    })
}

fn unit(v: Vec2, what: &'static str) -> Result<Vec2> {
    v.try_normalize().ok_or(SimError::DegenerateGeometry(what))
}

/// Humanoids run for the most open space once a zomboid is in sight
fn flee(pop: &Pop, view: &WorldView) -> Result<Intent> {
    let heading = evasion_heading(pop, view);
    if heading == Vec2::ZERO {
        return Ok(Intent::Wander);
    }
    Ok(Intent::Steer(unit(heading, "evasion heading")?))
}

/// Evasion heading over the line-of-sight filtered perception set
///
/// Zero when no zomboid is visible. Perceived terrain contributes bearings
/// alongside the threats so the pop does not flee into a wall.
pub fn evasion_heading(pop: &Pop, view: &WorldView) -> Vec2 {
    let origin = pop.position();
    let visible = filter_visible(origin, &pop.detected, view.pops, view.engine, view.owners);

    let mut bearings: Vec<f32> = visible
        .pops(Category::Zomboid)
        .filter_map(|id| view.pops.get(id.index()))
        .filter_map(|threat| point_bearing(origin, threat.position()))
        .collect();
    if bearings.is_empty() {
        return Vec2::ZERO;
    }

    let range = pop.stats().perception_range;
    bearings.extend(
        perceived_terrain(&visible, view.terrain)
            .filter_map(|terrain| terrain_bearing(origin, terrain, range)),
    );

    evasion_direction(&bearings)
}

/// Zomboids home in on the nearest humanoid they can sense, sight or not
fn pursue(pop: &Pop, view: &WorldView) -> Result<Intent> {
    let origin = pop.position();
    let nearest = pop
        .detected
        .pops(Category::Humanoid)
        .filter_map(|id| view.pops.get(id.index()))
        .min_by(|a, b| {
            a.position()
                .distance_squared(origin)
                .total_cmp(&b.position().distance_squared(origin))
        });

    match nearest {
        Some(prey) => Ok(Intent::Steer(unit(prey.position() - origin, "pursuit heading")?)),
        None => Ok(Intent::Wander),
    }
}
