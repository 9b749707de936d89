//! Minimal rigid-body engine
//!
//! Bodies carry one or more colliders. Sensor colliders report overlaps but
//! never push anything; static bodies never move. Each `step` integrates
//! forces and velocities, resolves contacts, and returns the collision events
//! that changed (or persisted) since the previous step.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{cancel_normal_velocity, circle_circle, circle_rect, ray_circle, ray_rect};

/// Index of a body in the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

/// Index of a collider in the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColliderHandle(pub u32);

/// Collider geometry, centered on the owning body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    Rect { half_extents: Vec2 },
}

#[derive(Debug, Clone)]
pub struct Collider {
    pub body: BodyHandle,
    pub shape: Shape,
    /// Sensors detect overlaps without physical response
    pub is_sensor: bool,
}

#[derive(Debug, Clone)]
pub struct Body {
    pub position: Vec2,
    /// Velocity in px/s
    pub velocity: Vec2,
    /// Force accumulated for the next step
    force: Vec2,
    inv_mass: f32,
    pub is_static: bool,
    colliders: Vec<ColliderHandle>,
}

impl Body {
    pub fn colliders(&self) -> &[ColliderHandle] {
        &self.colliders
    }
}

/// Which transition a collision pair went through this step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionPhase {
    Begin,
    Active,
    End,
}

/// A single collision pair reported by `Engine::step`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionEvent {
    pub phase: CollisionPhase,
    pub a: ColliderHandle,
    pub b: ColliderHandle,
}

/// First contact of a ray cast
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    pub collider: ColliderHandle,
    /// Fraction along the cast segment
    pub toi: f32,
    pub point: Vec2,
}

#[derive(Debug, Default)]
pub struct Engine {
    bodies: Vec<Body>,
    colliders: Vec<Collider>,
    /// Overlapping collider pairs from the last step, lower handle first
    contacts: BTreeSet<(ColliderHandle, ColliderHandle)>,
    /// Simulation clock (ms)
    time: f32,
    /// Length of the last step (ms)
    last_dt: f32,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dynamic body; `mass` must be positive
    pub fn add_body(&mut self, position: Vec2, velocity: Vec2, mass: f32) -> BodyHandle {
        self.push_body(Body {
            position,
            velocity,
            force: Vec2::ZERO,
            inv_mass: 1.0 / mass,
            is_static: false,
            colliders: Vec::new(),
        })
    }

    /// Add a body that never moves
    pub fn add_static_body(&mut self, position: Vec2) -> BodyHandle {
        self.push_body(Body {
            position,
            velocity: Vec2::ZERO,
            force: Vec2::ZERO,
            inv_mass: 0.0,
            is_static: true,
            colliders: Vec::new(),
        })
    }

    fn push_body(&mut self, body: Body) -> BodyHandle {
        let handle = BodyHandle(self.bodies.len() as u32);
        self.bodies.push(body);
        handle
    }

    pub fn add_collider(&mut self, body: BodyHandle, shape: Shape, is_sensor: bool) -> ColliderHandle {
        let handle = ColliderHandle(self.colliders.len() as u32);
        self.colliders.push(Collider {
            body,
            shape,
            is_sensor,
        });
        self.bodies[body.0 as usize].colliders.push(handle);
        handle
    }

    pub fn body(&self, handle: BodyHandle) -> &Body {
        &self.bodies[handle.0 as usize]
    }

    pub fn collider(&self, handle: ColliderHandle) -> Option<&Collider> {
        self.colliders.get(handle.0 as usize)
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    /// Replace a collider's shape (used when a pop's size or range changes)
    pub fn set_shape(&mut self, handle: ColliderHandle, shape: Shape) {
        if let Some(collider) = self.colliders.get_mut(handle.0 as usize) {
            collider.shape = shape;
        }
    }

    pub fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2) {
        let body = &mut self.bodies[handle.0 as usize];
        if !body.is_static {
            body.velocity = velocity;
        }
    }

    /// Accumulate a force applied during the next step
    pub fn apply_force(&mut self, handle: BodyHandle, force: Vec2) {
        self.bodies[handle.0 as usize].force += force;
    }

    /// Current simulation time (ms)
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Length of the most recent step (ms)
    pub fn last_dt(&self) -> f32 {
        self.last_dt
    }

    /// Cast a segment against every collider accepted by `filter`
    ///
    /// Hits are ordered by distance along the segment.
    pub fn ray_cast<F>(&self, from: Vec2, to: Vec2, filter: F) -> Vec<RayHit>
    where
        F: Fn(ColliderHandle, &Collider) -> bool,
    {
        let mut hits: Vec<RayHit> = self
            .colliders
            .iter()
            .enumerate()
            .filter_map(|(i, collider)| {
                let handle = ColliderHandle(i as u32);
                if !filter(handle, collider) {
                    return None;
                }
                let center = self.bodies[collider.body.0 as usize].position;
                let toi = match collider.shape {
                    Shape::Circle { radius } => ray_circle(from, to, center, radius),
                    Shape::Rect { half_extents } => ray_rect(from, to, center, half_extents),
                }?;
                Some(RayHit {
                    collider: handle,
                    toi,
                    point: from + (to - from) * toi,
                })
            })
            .collect();
        hits.sort_by(|a, b| a.toi.total_cmp(&b.toi));
        hits
    }

    /// Advance the world by `dt` milliseconds
    pub fn step(&mut self, dt: f32) -> Vec<CollisionEvent> {
        let dt_secs = dt / 1000.0;

        for body in self.bodies.iter_mut().filter(|b| !b.is_static) {
            body.velocity += body.force * body.inv_mass * dt_secs;
            body.position += body.velocity * dt_secs;
            body.force = Vec2::ZERO;
        }

        let current = self.detect_and_resolve();
        let events = self.diff_contacts(&current);
        self.contacts = current;
        self.time += dt;
        self.last_dt = dt;
        events
    }

    /// Find every overlapping collider pair and push solid bodies apart
    fn detect_and_resolve(&mut self) -> BTreeSet<(ColliderHandle, ColliderHandle)> {
        let mut overlaps = BTreeSet::new();
        let count = self.colliders.len();

        for i in 0..count {
            for j in (i + 1)..count {
                let (ca, cb) = (&self.colliders[i], &self.colliders[j]);
                if ca.body == cb.body {
                    continue;
                }
                let (ba, bb) = (&self.bodies[ca.body.0 as usize], &self.bodies[cb.body.0 as usize]);
                if ba.is_static && bb.is_static {
                    continue;
                }

                let Some(result) = overlap(ba.position, ca.shape, bb.position, cb.shape) else {
                    continue;
                };
                if !result.hit {
                    continue;
                }

                overlaps.insert((ColliderHandle(i as u32), ColliderHandle(j as u32)));

                if !ca.is_sensor && !cb.is_sensor {
                    let (a, b) = (ca.body, cb.body);
                    self.separate(a, b, result.normal, result.penetration);
                }
            }
        }

        overlaps
    }

    /// Positional correction plus removal of approaching velocity
    fn separate(&mut self, a: BodyHandle, b: BodyHandle, normal: Vec2, penetration: f32) {
        let inv_a = self.bodies[a.0 as usize].inv_mass;
        let inv_b = self.bodies[b.0 as usize].inv_mass;
        let total = inv_a + inv_b;
        if total <= 0.0 {
            return;
        }

        let body_a = &mut self.bodies[a.0 as usize];
        body_a.position += normal * penetration * (inv_a / total);
        if inv_a > 0.0 {
            body_a.velocity = cancel_normal_velocity(body_a.velocity, normal);
        }

        let body_b = &mut self.bodies[b.0 as usize];
        body_b.position -= normal * penetration * (inv_b / total);
        if inv_b > 0.0 {
            body_b.velocity = cancel_normal_velocity(body_b.velocity, -normal);
        }
    }

    fn diff_contacts(&self, current: &BTreeSet<(ColliderHandle, ColliderHandle)>) -> Vec<CollisionEvent> {
        let mut events = Vec::new();
        for &(a, b) in current {
            let phase = if self.contacts.contains(&(a, b)) {
                CollisionPhase::Active
            } else {
                CollisionPhase::Begin
            };
            events.push(CollisionEvent { phase, a, b });
        }
        for &(a, b) in self.contacts.difference(current) {
            events.push(CollisionEvent {
                phase: CollisionPhase::End,
                a,
                b,
            });
        }
        events
    }

    /// Drop every body, collider and contact
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.colliders.clear();
        self.contacts.clear();
    }
}

/// Overlap test between two positioned shapes, normal pointing toward `a`
///
/// Rect/rect pairs are never tested: rectangles are only used for terrain.
fn overlap(a_pos: Vec2, a: Shape, b_pos: Vec2, b: Shape) -> Option<super::collision::CollisionResult> {
    match (a, b) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            Some(circle_circle(a_pos, ra, b_pos, rb))
        }
        (Shape::Circle { radius }, Shape::Rect { half_extents }) => {
            Some(circle_rect(a_pos, radius, b_pos, half_extents))
        }
        (Shape::Rect { half_extents }, Shape::Circle { radius }) => {
            let mut result = circle_rect(b_pos, radius, a_pos, half_extents);
            result.normal = -result.normal;
            Some(result)
        }
        (Shape::Rect { .. }, Shape::Rect { .. }) => None,
    }
}
