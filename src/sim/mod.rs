//! Deterministic simulation module
//!
//! All behavior lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by pop ID)
//! - No rendering or platform dependencies

pub mod archetype;
pub mod behavior;
pub mod collision;
pub mod controller;
pub mod infection;
pub mod pathing;
pub mod perception;
pub mod physics;
pub mod pop;
pub mod terrain;
pub mod world;

pub use archetype::{
    Appearance, AppearanceUpdate, Archetype, ArchetypePresets, PopConfiguration, Rgba, Stats,
    StatsUpdate,
};
pub use behavior::Intent;
pub use collision::CollisionResult;
pub use controller::SimController;
pub use infection::{Infection, InfectionStep};
pub use pathing::{Gap, evasion_direction, widest_gap};
pub use perception::{Category, Detected, DetectedSet};
pub use physics::{BodyHandle, ColliderHandle, CollisionEvent, CollisionPhase, Engine, Shape};
pub use pop::{Pop, PopId};
pub use terrain::{Terrain, TerrainId};
pub use world::{PopView, PopulationSummary, World};
