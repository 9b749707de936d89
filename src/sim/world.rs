//! The world: owns every pop, the terrain and the engine
//!
//! One tick runs in a fixed order: infection sampling, decisions over the
//! perception sets, steering, then the engine step. Collision events from the
//! step are handled one at a time afterwards, updating perception and
//! starting infections, so the next tick sees a consistent snapshot.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use super::archetype::{AppearanceUpdate, Archetype};
use super::behavior::{Intent, WorldView, decide, evasion_heading};
use super::collision::circle_rect;
use super::infection::{Infection, InfectionStep, Side, infection_victim};
use super::perception::{
    Category, Detected, DetectedSet, Owner, PopPart, filter_visible, track_sensor_event,
};
use super::physics::{ColliderHandle, CollisionEvent, CollisionPhase, Engine};
use super::pop::{Pop, PopId};
use super::terrain::{Terrain, TerrainId, arena_walls};
use crate::config::SimConfig;
use crate::consts::SIM_DT;
use crate::error::{Result, SimError};

/// Attempts at finding a spawn point clear of terrain
const SPAWN_ATTEMPTS: usize = 32;

/// Read-only render view of a pop
#[derive(Debug, Clone, Serialize)]
pub struct PopView {
    pub id: u32,
    pub archetype: Archetype,
    pub position: Vec2,
    pub radius: f32,
    pub perception_range: f32,
    pub body_color: String,
    pub body_border_color: String,
    pub body_border_width: f32,
    pub sensor_fill_color: String,
    pub sensor_border_color: String,
}

/// Head count per archetype at a point in time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulationSummary {
    pub ticks: u64,
    pub time_ms: f32,
    pub humanoids: usize,
    pub infectoids: usize,
    pub zomboids: usize,
}

pub struct World {
    config: SimConfig,
    engine: Engine,
    pops: Vec<Pop>,
    terrain: Vec<Terrain>,
    /// Collider handle → owner, indexed by handle
    owners: Vec<Owner>,
    rng: Pcg32,
    ticks: u64,
}

impl World {
    /// Build the arena and spawn the configured population
    pub fn new(config: SimConfig) -> Result<Self> {
        let mut world = Self::empty(config)?;
        world.populate()?;
        log::info!(
            "World created with seed {}: {} humanoids, {} zomboids",
            world.config.seed,
            world.count(Archetype::Humanoid),
            world.count(Archetype::Zomboid)
        );
        Ok(world)
    }

    /// Build the arena (walls and obstacles) without any pops
    pub fn empty(config: SimConfig) -> Result<Self> {
        config.validate()?;

        let mut world = Self {
            rng: Pcg32::seed_from_u64(config.seed),
            config,
            engine: Engine::new(),
            pops: Vec::new(),
            terrain: Vec::new(),
            owners: Vec::new(),
            ticks: 0,
        };

        if world.config.walls {
            let walls = arena_walls(
                world.config.arena_width,
                world.config.arena_height,
                world.config.wall_thickness,
            );
            for (center, half_extents) in walls {
                world.add_terrain(center, half_extents);
            }
        }
        let obstacles = world.config.obstacles.clone();
        for obstacle in obstacles {
            world.add_terrain(obstacle.center, obstacle.half_extents);
        }

        Ok(world)
    }

    fn populate(&mut self) -> Result<()> {
        for _ in 0..self.config.pop_count {
            let archetype = if self.rng.random_bool(self.config.zomboid_ratio) {
                Archetype::Zomboid
            } else {
                Archetype::Humanoid
            };
            let radius = self.config.presets.get(archetype).stats.size;
            let position = self.random_spawn_point(radius);
            let velocity = self.random_vector(self.config.initial_speed);
            let id = self.spawn_pop(position, velocity, archetype)?;

            let impulse = self.random_vector(self.config.initial_impulse);
            self.engine.apply_force(self.pops[id.index()].body(), impulse);
        }
        Ok(())
    }

    /// Uniform vector with each component in [-max, max]
    fn random_vector(&mut self, max: f32) -> Vec2 {
        if max <= 0.0 {
            return Vec2::ZERO;
        }
        Vec2::new(
            self.rng.random_range(-max..=max),
            self.rng.random_range(-max..=max),
        )
    }

    /// Random point inside the arena, clear of terrain when possible
    fn random_spawn_point(&mut self, radius: f32) -> Vec2 {
        let half = Vec2::new(self.config.arena_width, self.config.arena_height) / 2.0;
        let margin = (half - Vec2::splat(radius)).max(Vec2::ZERO);

        let mut point = Vec2::ZERO;
        for _ in 0..SPAWN_ATTEMPTS {
            point = Vec2::new(
                self.rng.random_range(-margin.x..=margin.x),
                self.rng.random_range(-margin.y..=margin.y),
            );
            let blocked = self
                .terrain
                .iter()
                .any(|t| circle_rect(point, radius, t.center, t.half_extents).hit);
            if !blocked {
                break;
            }
        }
        point
    }

    /// Spawn a pop from its archetype preset
    pub fn spawn_pop(&mut self, position: Vec2, velocity: Vec2, archetype: Archetype) -> Result<PopId> {
        let id = PopId(self.pops.len() as u32);
        let preset = self.config.presets.get(archetype).clone();
        let pop = Pop::create(&mut self.engine, id, position, velocity, &preset)?;

        self.register(pop.body_collider(), Owner::Pop { id, part: PopPart::Body });
        self.register(pop.sensor_collider(), Owner::Pop { id, part: PopPart::Sensor });
        self.pops.push(pop);
        Ok(id)
    }

    /// Add a static rectangle to the arena
    pub fn add_terrain(&mut self, center: Vec2, half_extents: Vec2) -> TerrainId {
        let id = TerrainId(self.terrain.len() as u32);
        let terrain = Terrain::spawn(&mut self.engine, id, center, half_extents);
        self.register(terrain.collider, Owner::Terrain(id));
        self.terrain.push(terrain);
        id
    }

    fn register(&mut self, collider: ColliderHandle, owner: Owner) {
        let index = collider.0 as usize;
        if self.owners.len() <= index {
            self.owners.resize(index + 1, owner);
        }
        self.owners[index] = owner;
    }

    /// Advance one fixed timestep
    pub fn tick(&mut self) {
        self.step(SIM_DT);
    }

    /// Advance by `dt` milliseconds
    pub fn step(&mut self, dt: f32) {
        self.before_update(dt);

        let events = self.engine.step(dt);
        for pop in &mut self.pops {
            let body = self.engine.body(pop.body());
            pop.sync_kinematics(body.position, body.velocity);
        }
        for event in &events {
            self.handle_event(event);
        }

        self.ticks += 1;
    }

    /// Per-pop work ahead of integration
    fn before_update(&mut self, dt: f32) {
        let now = self.engine.time();
        self.advance_infections(now);

        let intents: Vec<Intent> = {
            let view = self.view();
            self.pops.iter().map(|pop| decide(pop, &view)).collect()
        };

        let gain = self.config.steering_gain;
        for (pop, intent) in self.pops.iter_mut().zip(intents) {
            let speed = pop.stats().speed;
            match intent {
                Intent::Steer(direction) => {
                    pop.steer(direction, speed, gain, dt);
                }
                Intent::Wander => {
                    let heading = pop.wander_heading(now, self.config.wander_duration, &mut self.rng);
                    pop.steer(heading, speed * self.config.wander_speed_factor, gain, dt);
                }
                Intent::Jitter => {
                    let max = self.config.jitter_force;
                    if max > 0.0 {
                        let force = Vec2::new(
                            self.rng.random_range(-max..=max),
                            self.rng.random_range(-max..=max),
                        );
                        self.engine.apply_force(pop.body(), force);
                    }
                }
            }
            pop.limit_speed(speed * self.config.max_overspeed);
            self.engine.set_velocity(pop.body(), pop.velocity());
        }
    }

    fn view(&self) -> WorldView<'_> {
        WorldView {
            pops: &self.pops,
            terrain: &self.terrain,
            engine: &self.engine,
            owners: &self.owners,
        }
    }

    /// Sample every pending infection; recolor or finish the transition
    fn advance_infections(&mut self, now: f32) {
        for index in 0..self.pops.len() {
            let step = match self.pops[index].infection.as_mut() {
                Some(infection) => infection.sample(now),
                None => continue,
            };
            match step {
                InfectionStep::Waiting => {}
                InfectionStep::Recolor(color) => self.pops[index].set_appearance(AppearanceUpdate {
                    body_color: Some(color),
                    ..Default::default()
                }),
                InfectionStep::Complete => self.complete_infection(PopId(index as u32)),
            }
        }
    }

    fn handle_event(&mut self, event: &CollisionEvent) {
        match event.phase {
            CollisionPhase::Begin => {
                track_sensor_event(event, &self.owners, &mut self.pops);
                self.check_contact(event);
            }
            CollisionPhase::End => {
                track_sensor_event(event, &self.owners, &mut self.pops);
            }
            CollisionPhase::Active => {}
        }
    }

    /// Start an infection if two pop bodies (not sensors) just touched
    fn check_contact(&mut self, event: &CollisionEvent) {
        let is_body = |handle: ColliderHandle| {
            self.engine
                .collider(handle)
                .is_some_and(|collider| !collider.is_sensor)
        };
        if !is_body(event.a) || !is_body(event.b) {
            return;
        }

        let (a, b) = match (self.pop_for_collider(event.a), self.pop_for_collider(event.b)) {
            (Ok(a), Ok(b)) => (a, b),
            (Err(e), _) | (_, Err(e)) => {
                log::trace!("ignoring contact: {e}");
                return;
            }
        };
        if a == b {
            return;
        }

        let archetypes = (self.pops[a.index()].archetype(), self.pops[b.index()].archetype());
        match infection_victim(archetypes.0, archetypes.1) {
            Some(Side::First) => {
                self.infect(a);
            }
            Some(Side::Second) => {
                self.infect(b);
            }
            None => {}
        }
    }

    /// Turn a humanoid into an infectoid and start its transition
    ///
    /// Returns false (and changes nothing) for anything but a humanoid.
    pub fn infect(&mut self, id: PopId) -> bool {
        let now = self.engine.time();
        let Some(pop) = self.pops.get_mut(id.index()) else {
            return false;
        };
        if pop.archetype() != Archetype::Humanoid {
            return false;
        }

        let presets = &self.config.presets;
        if let Err(e) = pop.apply_preset(&mut self.engine, &presets.infectoid) {
            log::warn!("pop {} could not become an infectoid: {e}", id.0);
            return false;
        }
        pop.infection = Some(Infection::new(
            now,
            presets.infectoid.appearance.body_color,
            presets.zomboid.appearance.body_color,
            self.config.infection_duration,
            self.config.infection_sample_interval,
        ));

        self.reclassify(id);
        log::info!("Pop {} infected at {:.0} ms", id.0, now);
        true
    }

    fn complete_infection(&mut self, id: PopId) {
        let pop = &mut self.pops[id.index()];
        pop.infection = None;
        if let Err(e) = pop.apply_preset(&mut self.engine, &self.config.presets.zomboid) {
            log::warn!("pop {} could not become a zomboid: {e}", id.0);
            return;
        }
        self.reclassify(id);
        log::info!("Pop {} turned into a zomboid", id.0);
    }

    /// Re-file a pop under its current archetype in every perceiver's set
    fn reclassify(&mut self, id: PopId) {
        let category = Category::from(self.pops[id.index()].archetype());
        for pop in &mut self.pops {
            pop.detected.reclassify(Detected::Pop(id), category);
        }
    }

    /// Pop owning a collider; `LookupMiss` for terrain and unknown handles
    pub fn pop_for_collider(&self, collider: ColliderHandle) -> Result<PopId> {
        match self.owners.get(collider.0 as usize) {
            Some(Owner::Pop { id, .. }) => Ok(*id),
            _ => Err(SimError::LookupMiss(collider)),
        }
    }

    pub fn resolve_agent(&self, collider: ColliderHandle) -> Option<PopId> {
        self.pop_for_collider(collider).ok()
    }

    pub fn pop(&self, id: PopId) -> Option<&Pop> {
        self.pops.get(id.index())
    }

    pub fn pops(&self) -> &[Pop] {
        &self.pops
    }

    pub fn terrain(&self) -> &[Terrain] {
        &self.terrain
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Simulation time (ms)
    pub fn time(&self) -> f32 {
        self.engine.time()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// A pop's perception set with occluded pops removed
    pub fn visible_set(&self, id: PopId) -> Option<DetectedSet> {
        let pop = self.pop(id)?;
        Some(filter_visible(
            pop.position(),
            &pop.detected,
            &self.pops,
            &self.engine,
            &self.owners,
        ))
    }

    /// Heading a pop would take to evade visible zomboids
    pub fn evasion_heading(&self, id: PopId) -> Vec2 {
        match self.pop(id) {
            Some(pop) => evasion_heading(pop, &self.view()),
            None => Vec2::ZERO,
        }
    }

    pub fn count(&self, archetype: Archetype) -> usize {
        self.pops.iter().filter(|p| p.archetype() == archetype).count()
    }

    pub fn summary(&self) -> PopulationSummary {
        PopulationSummary {
            ticks: self.ticks,
            time_ms: self.engine.time(),
            humanoids: self.count(Archetype::Humanoid),
            infectoids: self.count(Archetype::Infectoid),
            zomboids: self.count(Archetype::Zomboid),
        }
    }

    /// Render views in id order
    pub fn snapshot(&self) -> Vec<PopView> {
        self.pops
            .iter()
            .map(|pop| {
                let appearance = pop.appearance();
                let sensor = pop.sensor_render();
                PopView {
                    id: pop.id.0,
                    archetype: pop.archetype(),
                    position: pop.position(),
                    radius: pop.stats().size,
                    perception_range: pop.stats().perception_range,
                    body_color: appearance.body_color.to_css(),
                    body_border_color: appearance.body_border_color.to_css(),
                    body_border_width: appearance.body_border_width,
                    sensor_fill_color: sensor.fill.to_css(),
                    sensor_border_color: sensor.border.to_css(),
                }
            })
            .collect()
    }

    /// Drop every pop (and with them any pending infection) and all terrain
    pub fn teardown(&mut self) {
        let pending = self.pops.iter().filter(|p| p.is_turning()).count();
        log::info!(
            "Tearing down world: {} pops, {} pending infections",
            self.pops.len(),
            pending
        );
        self.pops.clear();
        self.terrain.clear();
        self.owners.clear();
        self.engine.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::archetype::Rgba;

    fn open_config() -> SimConfig {
        SimConfig {
            pop_count: 0,
            walls: false,
            obstacles: Vec::new(),
            ..Default::default()
        }
    }

    fn run_until<F: Fn(&World) -> bool>(world: &mut World, max_ticks: usize, done: F) -> bool {
        for _ in 0..max_ticks {
            if done(world) {
                return true;
            }
            world.tick();
        }
        done(world)
    }

    #[test]
    fn test_new_spawns_configured_population() {
        let world = World::new(SimConfig::default()).unwrap();
        assert_eq!(world.pops().len(), 100);
        assert_eq!(world.terrain().len(), 4 + 3);
        assert_eq!(world.count(Archetype::Infectoid), 0);
        assert_eq!(
            world.count(Archetype::Humanoid) + world.count(Archetype::Zomboid),
            100
        );
        for (i, pop) in world.pops().iter().enumerate() {
            assert_eq!(pop.id, PopId(i as u32));
        }
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = World::new(SimConfig::default()).unwrap();
        let mut b = World::new(SimConfig::default()).unwrap();
        for _ in 0..60 {
            a.tick();
            b.tick();
        }
        assert_eq!(a.summary(), b.summary());
        for (pa, pb) in a.pops().iter().zip(b.pops()) {
            assert_eq!(pa.position(), pb.position());
        }
    }

    #[test]
    fn test_resolve_agent_guards_terrain_and_unknown() {
        let mut config = open_config();
        config.obstacles = vec![crate::config::Obstacle {
            center: Vec2::new(500.0, 0.0),
            half_extents: Vec2::splat(10.0),
        }];
        let mut world = World::empty(config).unwrap();
        let id = world.spawn_pop(Vec2::ZERO, Vec2::ZERO, Archetype::Humanoid).unwrap();
        let pop = world.pop(id).unwrap();

        assert_eq!(world.resolve_agent(pop.body_collider()), Some(id));
        assert_eq!(world.resolve_agent(pop.sensor_collider()), Some(id));
        assert_eq!(world.resolve_agent(world.terrain()[0].collider), None);
        assert!(matches!(
            world.pop_for_collider(ColliderHandle(1000)),
            Err(SimError::LookupMiss(_))
        ));
    }

    #[test]
    fn test_detected_set_never_contains_self() {
        let mut world = World::new(SimConfig::default()).unwrap();
        for _ in 0..30 {
            world.tick();
        }
        for pop in world.pops() {
            assert!(!pop.detected.contains(Detected::Pop(pop.id)));
        }
    }

    #[test]
    fn test_infect_only_humanoids() {
        let mut world = World::empty(open_config()).unwrap();
        let human = world.spawn_pop(Vec2::ZERO, Vec2::ZERO, Archetype::Humanoid).unwrap();
        let zombie = world.spawn_pop(Vec2::new(400.0, 0.0), Vec2::ZERO, Archetype::Zomboid).unwrap();

        assert!(!world.infect(zombie));
        assert!(world.infect(human));
        let started = world.pop(human).unwrap().infection.clone();
        assert_eq!(world.pop(human).unwrap().archetype(), Archetype::Infectoid);

        // A second infection attempt neither restarts nor stacks
        world.tick();
        assert!(!world.infect(human));
        assert_eq!(
            world.pop(human).unwrap().infection.as_ref().map(|i| i.started_at),
            started.map(|i| i.started_at)
        );
    }

    #[test]
    fn test_infection_recolors_then_turns() {
        let config = open_config();
        let zomboid = config.presets.zomboid.clone();
        let mut world = World::empty(config).unwrap();
        let human = world.spawn_pop(Vec2::ZERO, Vec2::ZERO, Archetype::Humanoid).unwrap();
        world.infect(human);

        let mut last = world.pop(human).unwrap().appearance().body_color;
        assert_eq!(last, Rgba::WHITE);
        let turned = run_until(&mut world, 400, |w| {
            w.pop(PopId(0)).unwrap().archetype() == Archetype::Zomboid
        });
        assert!(turned);

        let pop = world.pop(human).unwrap();
        assert_eq!(pop.stats(), &zomboid.stats);
        assert_eq!(pop.appearance(), &zomboid.appearance);
        assert!(!pop.is_turning());

        // Body color only ever moved toward the zomboid color
        let mut world = World::empty(open_config()).unwrap();
        let human = world.spawn_pop(Vec2::ZERO, Vec2::ZERO, Archetype::Humanoid).unwrap();
        world.infect(human);
        while world.pop(human).unwrap().is_turning() {
            world.tick();
            let c = world.pop(human).unwrap().appearance().body_color;
            assert!(c.r <= last.r && c.g <= last.g && c.b <= last.b);
            last = c;
        }
    }

    #[test]
    fn test_contact_infects_and_rebuckets() {
        let mut world = World::empty(open_config()).unwrap();
        let watcher = world.spawn_pop(Vec2::new(-100.0, 0.0), Vec2::ZERO, Archetype::Humanoid).unwrap();
        let human = world.spawn_pop(Vec2::ZERO, Vec2::ZERO, Archetype::Humanoid).unwrap();
        // Overlapping bodies: contact begins on the first step
        let zombie = world.spawn_pop(Vec2::new(15.0, 0.0), Vec2::ZERO, Archetype::Zomboid).unwrap();

        world.tick();
        assert_eq!(world.pop(human).unwrap().archetype(), Archetype::Infectoid);
        assert_eq!(world.pop(zombie).unwrap().archetype(), Archetype::Zomboid);

        let seen = &world.pop(watcher).unwrap().detected;
        assert!(seen.get(Category::Infectoid).contains(&Detected::Pop(human)));
        assert!(seen.get(Category::Humanoid).is_empty());
    }

    #[test]
    fn test_teardown_drops_pending_infections() {
        let mut world = World::empty(open_config()).unwrap();
        let human = world.spawn_pop(Vec2::ZERO, Vec2::ZERO, Archetype::Humanoid).unwrap();
        world.infect(human);
        world.teardown();
        assert!(world.pops().is_empty());
        assert_eq!(world.engine().collider_count(), 0);
        // Ticking an empty world is harmless
        world.tick();
    }

    #[test]
    fn test_snapshot_css() {
        let mut world = World::empty(open_config()).unwrap();
        world.spawn_pop(Vec2::ZERO, Vec2::ZERO, Archetype::Zomboid).unwrap();
        let view = &world.snapshot()[0];
        assert_eq!(view.body_color, "rgb(70, 250, 100)");
        assert_eq!(view.sensor_fill_color, "rgba(255, 255, 255, 0)");
        assert_eq!(view.perception_range, 150.0);
    }
}
