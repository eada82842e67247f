//! Toy rigid-body physics for the harness.
//!
//! Bodies are points with one or more sphere colliders attached at local
//! offsets. There is no collision response: the step only integrates motion
//! and bounces bodies off the arena walls. Overlap detection is exposed
//! through [`OverlapSource`] so the trigger core can consume it.

use crate::error::SimError;
use nalgebra::{UnitQuaternion, Vector3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use trigger_env::{ColliderKey, Entity, OverlapSink, OverlapSource, RawOverlap};

/// A sphere attached to a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphereCollider {
    /// Center in body-local coordinates
    pub offset: Vector3<f64>,

    pub radius: f64,

    /// Sub-collider key; `EMPTY` for single-collider bodies
    pub key: ColliderKey,
}

impl SphereCollider {
    /// A sphere centered on the body.
    pub fn centered(radius: f64) -> Self {
        Self {
            offset: Vector3::zeros(),
            radius,
            key: ColliderKey::EMPTY,
        }
    }
}

/// A simulated body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    /// Owning entity
    pub entity: Entity,

    /// Position in meters
    pub position: Vector3<f64>,

    /// Velocity in m/s
    pub velocity: Vector3<f64>,

    pub rotation: UnitQuaternion<f64>,

    /// Zero for static bodies
    pub inverse_mass: f64,

    /// Fraction of velocity lost per second
    pub linear_damping: f64,

    pub colliders: Vec<SphereCollider>,
}

impl Body {
    /// Creates a unit-mass body with a single 0.5 m sphere.
    pub fn new(entity: Entity, position: Vector3<f64>) -> Self {
        Self {
            entity,
            position,
            velocity: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            inverse_mass: 1.0,
            linear_damping: 0.0,
            colliders: vec![SphereCollider::centered(0.5)],
        }
    }

    /// Sets the initial velocity.
    pub fn with_velocity(mut self, velocity: Vector3<f64>) -> Self {
        self.velocity = velocity;
        self
    }

    /// Sets the mass. A non-positive mass makes the body static.
    pub fn with_mass(mut self, mass: f64) -> Self {
        self.inverse_mass = if mass > 0.0 { 1.0 / mass } else { 0.0 };
        self
    }

    /// Sets the linear damping.
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.linear_damping = damping;
        self
    }

    /// Replaces the colliders with a single centered sphere.
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.colliders = vec![SphereCollider::centered(radius)];
        self
    }

    /// Replaces the colliders with a compound of spheres keyed 0, 1, 2...
    pub fn with_compound(mut self, spheres: &[(Vector3<f64>, f64)]) -> Self {
        self.colliders = spheres
            .iter()
            .enumerate()
            .map(|(i, (offset, radius))| SphereCollider {
                offset: *offset,
                radius: *radius,
                key: ColliderKey(i as u32),
            })
            .collect();
        self
    }

    /// Returns true if forces do not move the body.
    pub fn is_static(&self) -> bool {
        self.inverse_mass == 0.0
    }

    /// World-space center of one of this body's colliders.
    pub fn collider_center(&self, collider: &SphereCollider) -> Vector3<f64> {
        self.position + self.rotation * collider.offset
    }
}

/// All bodies of the simulation.
#[derive(Debug, Default)]
pub struct PhysicsWorld {
    bodies: Vec<Body>,

    /// Entity to body slot
    slots: HashMap<Entity, usize>,

    /// Bodies are kept inside `[-half_extent, half_extent]` on x and z
    arena_half_extent: f64,

    /// Alternate the reported pair order every step
    flip_pairs: bool,

    step_count: u64,
}

impl PhysicsWorld {
    /// Creates an empty world with a square arena.
    pub fn new(arena_half_extent: f64) -> Self {
        Self {
            arena_half_extent,
            ..Default::default()
        }
    }

    /// Enables or disables pair flipping.
    pub fn set_flip_pairs(&mut self, flip: bool) {
        self.flip_pairs = flip;
    }

    /// Adds a body and returns its slot.
    pub fn add_body(&mut self, body: Body) -> Result<usize, SimError> {
        if self.slots.contains_key(&body.entity) {
            return Err(SimError::DuplicateBody(body.entity));
        }
        let slot = self.bodies.len();
        self.slots.insert(body.entity, slot);
        self.bodies.push(body);
        Ok(slot)
    }

    /// Removes the body of `entity`. The last body takes its slot.
    pub fn remove_body(&mut self, entity: Entity) -> Result<Body, SimError> {
        let slot = self
            .slots
            .remove(&entity)
            .ok_or(SimError::MissingBody(entity))?;
        let removed = self.bodies.swap_remove(slot);
        if let Some(moved) = self.bodies.get(slot) {
            self.slots.insert(moved.entity, slot);
        }
        Ok(removed)
    }

    pub fn body(&self, entity: Entity) -> Option<&Body> {
        self.slots.get(&entity).map(|slot| &self.bodies[*slot])
    }

    pub fn body_mut(&mut self, entity: Entity) -> Option<&mut Body> {
        match self.slots.get(&entity) {
            Some(slot) => Some(&mut self.bodies[*slot]),
            None => None,
        }
    }

    /// All bodies in slot order.
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Mutable access for systems that touch every body.
    pub fn bodies_mut(&mut self) -> &mut [Body] {
        &mut self.bodies
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Number of completed steps.
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Applies `force` for `dt` seconds as an instantaneous impulse.
    pub fn apply_force(&mut self, entity: Entity, force: Vector3<f64>, dt: f64) -> Result<(), SimError> {
        let body = self.body_mut(entity).ok_or(SimError::MissingBody(entity))?;
        let impulse = force * dt;
        body.velocity += impulse * body.inverse_mass;
        Ok(())
    }

    /// Integrates all dynamic bodies by `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        let limit = self.arena_half_extent;
        for body in self.bodies.iter_mut().filter(|b| !b.is_static()) {
            body.position += body.velocity * dt;
            body.velocity *= (1.0 - body.linear_damping * dt).max(0.0);

            if limit > 0.0 {
                for axis in [0, 2] {
                    if body.position[axis].abs() > limit {
                        body.position[axis] = body.position[axis].clamp(-limit, limit);
                        body.velocity[axis] = -body.velocity[axis];
                    }
                }
            }
        }
        self.step_count += 1;
    }

    /// Overlaps between the colliders of bodies `i` and `j`, `i < j`.
    fn pair_overlaps(&self, i: usize, j: usize, flip: bool, sink: &dyn OverlapSink) {
        let a = &self.bodies[i];
        let b = &self.bodies[j];
        for ca in &a.colliders {
            let center_a = a.collider_center(ca);
            for cb in &b.colliders {
                let reach = ca.radius + cb.radius;
                if (b.collider_center(cb) - center_a).norm_squared() < reach * reach {
                    let overlap = RawOverlap::between(a.entity, b.entity)
                        .with_bodies(i as u32, j as u32)
                        .with_colliders(ca.key, cb.key);
                    sink.push(if flip { overlap.swapped() } else { overlap });
                }
            }
        }
    }
}

impl OverlapSource for PhysicsWorld {
    /// Tests every collider pair, one rayon task per body row.
    ///
    /// Pairs come out as (lower slot, higher slot), reversed on odd steps
    /// when flipping is enabled.
    fn emit_overlaps(&self, sink: &dyn OverlapSink) {
        let flip = self.flip_pairs && self.step_count % 2 == 1;
        let count = self.bodies.len();
        (0..count).into_par_iter().for_each(|i| {
            for j in (i + 1)..count {
                self.pair_overlaps(i, j, flip, sink);
            }
        });
    }
}
