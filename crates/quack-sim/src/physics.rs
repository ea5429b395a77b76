//! The physics collaborator interface.
//!
//! The world never integrates motion itself. It asks a [`Physics`]
//! implementation to create bodies, pushes forces into them, steps it, and
//! reads back transforms and collision events. [`ArenaPhysics`] is the
//! built-in implementation; anything that honours this trait can replace it.
//!
//! [`ArenaPhysics`]: crate::ArenaPhysics

use glam::Vec2;

/// Opaque handle to a body owned by a [`Physics`] implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u32);

/// Position and heading of a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec2,
    /// Radians, counter-clockwise.
    pub rotation: f32,
}

/// Something that happened during a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    /// Two solid bodies are touching.
    Contact(BodyHandle, BodyHandle),
    /// A body started overlapping a sensor.
    Sensor {
        sensor: BodyHandle,
        visitor: BodyHandle,
    },
}

/// A 2D rigid-body world as the simulation needs it.
///
/// Handles stay valid until passed to [`destroy_body`](Self::destroy_body);
/// operations on unknown handles are no-ops.
pub trait Physics: Send + 'static {
    /// Creates a dynamic, solid duck body.
    fn create_duck_body(&mut self, position: Vec2, rotation: f32, scale: f32) -> BodyHandle;

    /// Creates a static food sensor.
    fn create_food_body(&mut self, position: Vec2) -> BodyHandle;

    /// Removes a body. Returns whether it existed.
    fn destroy_body(&mut self, body: BodyHandle) -> bool;

    /// Adds a force (world space) for the next step.
    fn apply_force(&mut self, body: BodyHandle, force: Vec2);

    /// Adds a torque for the next step.
    fn apply_torque(&mut self, body: BodyHandle, torque: f32);

    /// Resizes a duck body's collision shape.
    fn set_scale(&mut self, body: BodyHandle, scale: f32);

    /// Current transform of a body.
    fn transform(&self, body: BodyHandle) -> Option<Transform>;

    /// Advances the world by `dt` seconds and returns what collided.
    fn step(&mut self, dt: f32) -> Vec<Collision>;

    /// Number of live bodies.
    fn body_count(&self) -> usize;
}
