//! A small built-in 2D physics world.
//!
//! Ducks are treated as discs whose radius covers their capsule, food items
//! as static sensor discs. The arena is a walled rectangle centred on the
//! origin. This is deliberately simple: heavy damping makes ducks feel like
//! they are swimming, so there is little to gain from a full solver.

use std::collections::{BTreeMap, BTreeSet};
use std::f32::consts::{PI, TAU};

use glam::Vec2;

use crate::physics::{BodyHandle, Collision, Physics, Transform};

/// Shape and material constants for [`ArenaPhysics`].
#[derive(Debug, Clone)]
pub struct ArenaConfig {
    pub width: f32,
    pub height: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub density: f32,
    /// Capsule radius at scale 1.
    pub duck_radius: f32,
    /// Capsule half-height at scale 1.
    pub duck_half_height: f32,
    pub food_radius: f32,
    /// Bounciness for duck-duck and duck-wall contacts, 0..=1.
    pub restitution: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 200.0,
            linear_damping: 10.0,
            angular_damping: 10.0,
            density: 1.0,
            duck_radius: 0.25,
            duck_half_height: 0.3,
            food_radius: 0.5,
            restitution: 0.5,
        }
    }
}

impl ArenaConfig {
    /// Radius of the disc standing in for a duck at `scale`.
    pub fn duck_extent(&self, scale: f32) -> f32 {
        (self.duck_radius + self.duck_half_height * 0.5) * scale
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BodyKind {
    Duck,
    Food,
}

#[derive(Debug, Clone)]
struct Body {
    kind: BodyKind,
    radius: f32,
    position: Vec2,
    rotation: f32,
    velocity: Vec2,
    angular_velocity: f32,
    force: Vec2,
    torque: f32,
}

impl Body {
    fn mass(&self, density: f32) -> f32 {
        (density * PI * self.radius * self.radius).max(f32::EPSILON)
    }

    fn inertia(&self, density: f32) -> f32 {
        0.5 * self.mass(density) * self.radius * self.radius
    }
}

/// [`Physics`] implementation backed by plain vectors.
///
/// Bodies are stored in handle order so that a step is deterministic for a
/// given sequence of calls.
#[derive(Debug)]
pub struct ArenaPhysics {
    config: ArenaConfig,
    bodies: BTreeMap<BodyHandle, Body>,
    /// (duck, food) pairs overlapping at the end of the last step.
    touching_food: BTreeSet<(BodyHandle, BodyHandle)>,
    next_handle: u32,
}

impl ArenaPhysics {
    pub fn new(config: ArenaConfig) -> Self {
        Self {
            config,
            bodies: BTreeMap::new(),
            touching_food: BTreeSet::new(),
            next_handle: 1,
        }
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Current linear velocity of a body.
    pub fn velocity(&self, body: BodyHandle) -> Option<Vec2> {
        self.bodies.get(&body).map(|b| b.velocity)
    }

    fn insert(&mut self, body: Body) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.bodies.insert(handle, body);
        handle
    }

    fn integrate(&mut self, dt: f32) {
        let density = self.config.density;
        let linear = 1.0 / (1.0 + dt * self.config.linear_damping);
        let angular = 1.0 / (1.0 + dt * self.config.angular_damping);

        for body in self.bodies.values_mut() {
            if body.kind != BodyKind::Duck {
                continue;
            }
            let mass = body.mass(density);
            let inertia = body.inertia(density);

            body.velocity = (body.velocity + body.force / mass * dt) * linear;
            body.angular_velocity = (body.angular_velocity + body.torque / inertia * dt) * angular;
            body.position += body.velocity * dt;
            body.rotation = wrap_angle(body.rotation + body.angular_velocity * dt);

            body.force = Vec2::ZERO;
            body.torque = 0.0;
        }
    }

    fn clamp_to_walls(&mut self) {
        let half = Vec2::new(self.config.width, self.config.height) * 0.5;
        let restitution = self.config.restitution;

        for body in self.bodies.values_mut() {
            if body.kind != BodyKind::Duck {
                continue;
            }
            let limit = (half - Vec2::splat(body.radius)).max(Vec2::ZERO);
            for axis in 0..2 {
                if body.position[axis] > limit[axis] {
                    body.position[axis] = limit[axis];
                    if body.velocity[axis] > 0.0 {
                        body.velocity[axis] *= -restitution;
                    }
                } else if body.position[axis] < -limit[axis] {
                    body.position[axis] = -limit[axis];
                    if body.velocity[axis] < 0.0 {
                        body.velocity[axis] *= -restitution;
                    }
                }
            }
        }
    }

    fn resolve_duck_contacts(&mut self, collisions: &mut Vec<Collision>) {
        let density = self.config.density;
        let restitution = self.config.restitution;
        let ducks: Vec<BodyHandle> = self
            .bodies
            .iter()
            .filter(|(_, b)| b.kind == BodyKind::Duck)
            .map(|(h, _)| *h)
            .collect();

        for (i, &a) in ducks.iter().enumerate() {
            for &b in &ducks[i + 1..] {
                let (Some(ba), Some(bb)) = (self.bodies.get(&a), self.bodies.get(&b)) else {
                    continue;
                };
                let delta = bb.position - ba.position;
                let reach = ba.radius + bb.radius;
                let distance_sq = delta.length_squared();
                if distance_sq >= reach * reach {
                    continue;
                }

                let distance = distance_sq.sqrt();
                let normal = if distance > f32::EPSILON {
                    delta / distance
                } else {
                    Vec2::X
                };
                let inv_a = 1.0 / ba.mass(density);
                let inv_b = 1.0 / bb.mass(density);
                let inv_sum = inv_a + inv_b;

                // Push apart along the normal, weighted by inverse mass.
                let overlap = reach - distance;
                let shift_a = -normal * overlap * (inv_a / inv_sum);
                let shift_b = normal * overlap * (inv_b / inv_sum);

                let closing = (bb.velocity - ba.velocity).dot(normal);
                let impulse = if closing < 0.0 {
                    -(1.0 + restitution) * closing / inv_sum
                } else {
                    0.0
                };

                if let Some(body) = self.bodies.get_mut(&a) {
                    body.position += shift_a;
                    body.velocity -= normal * impulse * inv_a;
                }
                if let Some(body) = self.bodies.get_mut(&b) {
                    body.position += shift_b;
                    body.velocity += normal * impulse * inv_b;
                }
                collisions.push(Collision::Contact(a, b));
            }
        }
    }

    fn detect_food(&mut self, collisions: &mut Vec<Collision>) {
        let mut now_touching = BTreeSet::new();
        for (&duck, duck_body) in self.bodies.iter().filter(|(_, b)| b.kind == BodyKind::Duck) {
            for (&food, food_body) in self.bodies.iter().filter(|(_, b)| b.kind == BodyKind::Food) {
                let reach = duck_body.radius + food_body.radius;
                if duck_body.position.distance_squared(food_body.position) < reach * reach {
                    now_touching.insert((duck, food));
                }
            }
        }

        for &(duck, food) in &now_touching {
            if !self.touching_food.contains(&(duck, food)) {
                collisions.push(Collision::Sensor {
                    sensor: food,
                    visitor: duck,
                });
            }
        }
        self.touching_food = now_touching;
    }
}

impl Default for ArenaPhysics {
    fn default() -> Self {
        Self::new(ArenaConfig::default())
    }
}

impl Physics for ArenaPhysics {
    fn create_duck_body(&mut self, position: Vec2, rotation: f32, scale: f32) -> BodyHandle {
        let radius = self.config.duck_extent(scale);
        self.insert(Body {
            kind: BodyKind::Duck,
            radius,
            position,
            rotation: wrap_angle(rotation),
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            force: Vec2::ZERO,
            torque: 0.0,
        })
    }

    fn create_food_body(&mut self, position: Vec2) -> BodyHandle {
        let radius = self.config.food_radius;
        self.insert(Body {
            kind: BodyKind::Food,
            radius,
            position,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            force: Vec2::ZERO,
            torque: 0.0,
        })
    }

    fn destroy_body(&mut self, body: BodyHandle) -> bool {
        if self.bodies.remove(&body).is_none() {
            return false;
        }
        self.touching_food.retain(|&(duck, food)| duck != body && food != body);
        true
    }

    fn apply_force(&mut self, body: BodyHandle, force: Vec2) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.force += force;
        }
    }

    fn apply_torque(&mut self, body: BodyHandle, torque: f32) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.torque += torque;
        }
    }

    fn set_scale(&mut self, body: BodyHandle, scale: f32) {
        let radius = self.config.duck_extent(scale);
        if let Some(b) = self.bodies.get_mut(&body) {
            if b.kind == BodyKind::Duck {
                b.radius = radius;
            }
        }
    }

    fn transform(&self, body: BodyHandle) -> Option<Transform> {
        self.bodies.get(&body).map(|b| Transform {
            position: b.position,
            rotation: b.rotation,
        })
    }

    fn step(&mut self, dt: f32) -> Vec<Collision> {
        let mut collisions = Vec::new();
        if dt <= 0.0 {
            return collisions;
        }
        self.integrate(dt);
        self.resolve_duck_contacts(&mut collisions);
        self.clamp_to_walls();
        self.detect_food(&mut collisions);
        collisions
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

/// Wraps an angle into `(-PI, PI]`.
fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}
