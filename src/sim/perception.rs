//! Perception bookkeeping and line-of-sight filtering
//!
//! Detection sets follow sensor overlaps reported by the engine; the
//! visibility filter then drops anything hidden behind terrain for the
//! current tick without touching the tracked sets.

use glam::Vec2;

use super::archetype::Archetype;
use super::physics::{CollisionEvent, CollisionPhase, Engine};
use super::pop::{Pop, PopId};
use super::terrain::{Terrain, TerrainId};

/// Bucket a detected entity is filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Humanoid,
    Infectoid,
    Zomboid,
    Terrain,
}

impl Category {
    const COUNT: usize = 4;

    fn slot(self) -> usize {
        match self {
            Category::Humanoid => 0,
            Category::Infectoid => 1,
            Category::Zomboid => 2,
            Category::Terrain => 3,
        }
    }
}

impl From<Archetype> for Category {
    fn from(archetype: Archetype) -> Self {
        match archetype {
            Archetype::Humanoid => Category::Humanoid,
            Archetype::Infectoid => Category::Infectoid,
            Archetype::Zomboid => Category::Zomboid,
        }
    }
}

/// Something a pop can perceive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Detected {
    Pop(PopId),
    Terrain(TerrainId),
}

/// Per-category sets of currently perceived entities
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectedSet {
    buckets: [Vec<Detected>; Category::COUNT],
}

impl DetectedSet {
    /// Insert into `category`'s bucket; returns false if already present
    pub fn insert(&mut self, category: Category, entity: Detected) -> bool {
        let bucket = &mut self.buckets[category.slot()];
        if bucket.contains(&entity) {
            return false;
        }
        bucket.push(entity);
        true
    }

    /// Remove from whichever bucket holds `entity`
    pub fn remove(&mut self, entity: Detected) -> bool {
        for bucket in &mut self.buckets {
            if let Some(i) = bucket.iter().position(|e| *e == entity) {
                bucket.remove(i);
                return true;
            }
        }
        false
    }

    /// Move `entity` to `category` if it is currently tracked
    pub fn reclassify(&mut self, entity: Detected, category: Category) -> bool {
        if self.remove(entity) {
            self.insert(category, entity);
            true
        } else {
            false
        }
    }

    pub fn get(&self, category: Category) -> &[Detected] {
        &self.buckets[category.slot()]
    }

    pub fn contains(&self, entity: Detected) -> bool {
        self.buckets.iter().any(|b| b.contains(&entity))
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }

    /// Pop ids in a category, skipping terrain entries
    pub fn pops(&self, category: Category) -> impl Iterator<Item = PopId> + '_ {
        self.get(category).iter().filter_map(|e| match e {
            Detected::Pop(id) => Some(*id),
            Detected::Terrain(_) => None,
        })
    }

    pub fn terrain(&self) -> impl Iterator<Item = TerrainId> + '_ {
        self.get(Category::Terrain).iter().filter_map(|e| match e {
            Detected::Terrain(id) => Some(*id),
            Detected::Pop(_) => None,
        })
    }
}

/// Which part of a pop a collider belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopPart {
    Body,
    Sensor,
}

/// Back-reference from a collider to what owns it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Pop { id: PopId, part: PopPart },
    Terrain(TerrainId),
}

impl Owner {
    fn same_entity(self, other: Owner) -> bool {
        match (self, other) {
            (Owner::Pop { id: a, .. }, Owner::Pop { id: b, .. }) => a == b,
            (Owner::Terrain(a), Owner::Terrain(b)) => a == b,
            _ => false,
        }
    }
}

/// Apply a begin/end sensor event to the perceiver's detection set
///
/// Only pairs with exactly one sensor collider from two different owners
/// count. Returns true if a set changed.
pub fn track_sensor_event(event: &CollisionEvent, owners: &[Owner], pops: &mut [Pop]) -> bool {
    let add = match event.phase {
        CollisionPhase::Begin => true,
        CollisionPhase::End => false,
        CollisionPhase::Active => return false,
    };

    let (Some(&a), Some(&b)) = (owners.get(event.a.0 as usize), owners.get(event.b.0 as usize)) else {
        return false;
    };
    if a.same_entity(b) {
        return false;
    }

    let is_sensor = |o: Owner| matches!(o, Owner::Pop { part: PopPart::Sensor, .. });
    let (perceiver, other) = match (is_sensor(a), is_sensor(b)) {
        (true, false) => (a, b),
        (false, true) => (b, a),
        _ => return false,
    };
    let Owner::Pop { id: perceiver, .. } = perceiver else {
        return false;
    };

    let (entity, category) = match other {
        Owner::Pop { id, .. } => match pops.get(id.index()) {
            Some(pop) => (Detected::Pop(id), Category::from(pop.archetype())),
            None => return false,
        },
        Owner::Terrain(id) => (Detected::Terrain(id), Category::Terrain),
    };

    let Some(pop) = pops.get_mut(perceiver.index()) else {
        return false;
    };
    let changed = if add {
        pop.detected.insert(category, entity)
    } else {
        pop.detected.remove(entity)
    };
    if changed {
        log::debug!(
            "pop {} {} {:?}",
            perceiver.0,
            if add { "detected" } else { "lost" },
            entity
        );
    }
    changed
}

/// Copy of `detected` without pops hidden behind terrain
///
/// A ray is cast from the observer to each perceived pop against terrain
/// colliders only; any hit hides the target. Terrain entries pass through.
pub fn filter_visible(
    observer: Vec2,
    detected: &DetectedSet,
    pops: &[Pop],
    engine: &Engine,
    owners: &[Owner],
) -> DetectedSet {
    let mut visible = DetectedSet::default();

    for category in [
        Category::Humanoid,
        Category::Infectoid,
        Category::Zomboid,
        Category::Terrain,
    ] {
        for &entity in detected.get(category) {
            let keep = match entity {
                Detected::Terrain(_) => true,
                Detected::Pop(id) => match pops.get(id.index()) {
                    Some(target) => line_of_sight(observer, target.position(), engine, owners),
                    None => false,
                },
            };
            if keep {
                visible.insert(category, entity);
            }
        }
    }

    visible
}

/// True when no terrain collider blocks the segment
pub fn line_of_sight(from: Vec2, to: Vec2, engine: &Engine, owners: &[Owner]) -> bool {
    engine
        .ray_cast(from, to, |handle, _| {
            matches!(owners.get(handle.0 as usize), Some(Owner::Terrain(_)))
        })
        .is_empty()
}

/// Terrain an observer currently perceives, resolved to geometry
pub fn perceived_terrain<'a>(
    detected: &'a DetectedSet,
    terrain: &'a [Terrain],
) -> impl Iterator<Item = &'a Terrain> + 'a {
    detected.terrain().filter_map(|id| terrain.get(id.index()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::archetype::ArchetypePresets;
    use crate::sim::physics::ColliderHandle;

    /// Two pops plus owner table, laid out like the world does it
    fn two_pops(engine: &mut Engine) -> (Vec<Pop>, Vec<Owner>) {
        let presets = ArchetypePresets::default();
        let mut pops = Vec::new();
        let mut owners = Vec::new();
        for (i, (pos, preset)) in [
            (Vec2::ZERO, &presets.humanoid),
            (Vec2::new(100.0, 0.0), &presets.zomboid),
        ]
        .into_iter()
        .enumerate()
        {
            let id = PopId(i as u32);
            let pop = Pop::create(engine, id, pos, Vec2::ZERO, preset).unwrap();
            owners.push(Owner::Pop { id, part: PopPart::Body });
            owners.push(Owner::Pop { id, part: PopPart::Sensor });
            pops.push(pop);
        }
        (pops, owners)
    }

    fn event(phase: CollisionPhase, a: ColliderHandle, b: ColliderHandle) -> CollisionEvent {
        CollisionEvent { phase, a, b }
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut set = DetectedSet::default();
        assert!(set.insert(Category::Zomboid, Detected::Pop(PopId(3))));
        assert!(!set.insert(Category::Zomboid, Detected::Pop(PopId(3))));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_reclassify_moves_bucket() {
        let mut set = DetectedSet::default();
        set.insert(Category::Humanoid, Detected::Pop(PopId(1)));
        assert!(set.reclassify(Detected::Pop(PopId(1)), Category::Infectoid));
        assert!(set.get(Category::Humanoid).is_empty());
        assert_eq!(set.get(Category::Infectoid), &[Detected::Pop(PopId(1))]);
        assert!(!set.reclassify(Detected::Pop(PopId(9)), Category::Zomboid));
    }

    #[test]
    fn test_sensor_round_trip_restores_set() {
        let mut engine = Engine::new();
        let (mut pops, owners) = two_pops(&mut engine);
        let before = pops[0].detected.clone();

        // Humanoid sensor (collider 1) over zomboid body (collider 2)
        let sensor = pops[0].sensor_collider();
        let body = pops[1].body_collider();
        assert!(track_sensor_event(&event(CollisionPhase::Begin, sensor, body), &owners, &mut pops));
        assert_eq!(pops[0].detected.get(Category::Zomboid), &[Detected::Pop(PopId(1))]);

        // Duplicate begin is ignored
        assert!(!track_sensor_event(&event(CollisionPhase::Begin, body, sensor), &owners, &mut pops));

        assert!(track_sensor_event(&event(CollisionPhase::End, body, sensor), &owners, &mut pops));
        assert_eq!(pops[0].detected, before);
    }

    #[test]
    fn test_sensor_sensor_and_body_body_ignored() {
        let mut engine = Engine::new();
        let (mut pops, owners) = two_pops(&mut engine);

        let s0 = pops[0].sensor_collider();
        let s1 = pops[1].sensor_collider();
        let b0 = pops[0].body_collider();
        let b1 = pops[1].body_collider();

        assert!(!track_sensor_event(&event(CollisionPhase::Begin, s0, s1), &owners, &mut pops));
        assert!(!track_sensor_event(&event(CollisionPhase::Begin, b0, b1), &owners, &mut pops));
        // Own body inside own sensor
        assert!(!track_sensor_event(&event(CollisionPhase::Begin, b0, s0), &owners, &mut pops));
        assert!(pops[0].detected.is_empty());
        assert!(pops[1].detected.is_empty());
    }

    #[test]
    fn test_unknown_collider_is_ignored() {
        let mut engine = Engine::new();
        let (mut pops, owners) = two_pops(&mut engine);
        let stray = ColliderHandle(99);
        let s0 = pops[0].sensor_collider();
        assert!(!track_sensor_event(&event(CollisionPhase::Begin, s0, stray), &owners, &mut pops));
    }

    #[test]
    fn test_wall_hides_target() {
        let mut engine = Engine::new();
        let (pops, mut owners) = two_pops(&mut engine);
        let mut detected = DetectedSet::default();
        detected.insert(Category::Zomboid, Detected::Pop(PopId(1)));

        // No terrain yet
        let visible = filter_visible(Vec2::ZERO, &detected, &pops, &engine, &owners);
        assert!(visible.contains(Detected::Pop(PopId(1))));

        // Wall halfway between the two
        let wall = Terrain::spawn(&mut engine, TerrainId(0), Vec2::new(50.0, 0.0), Vec2::new(5.0, 60.0));
        owners.push(Owner::Terrain(wall.id));
        detected.insert(Category::Terrain, Detected::Terrain(wall.id));

        let visible = filter_visible(Vec2::ZERO, &detected, &pops, &engine, &owners);
        assert!(!visible.contains(Detected::Pop(PopId(1))));
        assert!(visible.contains(Detected::Terrain(wall.id)));
        // The tracked set is untouched
        assert!(detected.contains(Detected::Pop(PopId(1))));
    }
}
