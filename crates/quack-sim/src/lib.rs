//! Authoritative simulation for Quack.
//!
//! The [`World`] owns every duck and food item, drives a [`Physics`]
//! collaborator, and turns the collisions it reports into game rules:
//!
//! - **Movement**: player input becomes forces and torque that scale with
//!   the duck's size; sprinting is faster but burns size.
//! - **Predation**: a sufficiently larger duck that touches a smaller one
//!   eats it.
//! - **Feeding**: a duck that swims over food gains credit that is slowly
//!   converted into growth, and the food respawns elsewhere.
//!
//! `World` is single-owner and synchronous: it is meant to live inside one
//! loop task and be ticked from there. Nothing in this crate does I/O.

mod arena;
mod clock;
mod config;
mod duck;
mod error;
mod physics;
mod world;

pub use arena::{ArenaConfig, ArenaPhysics};
pub use clock::Clock;
pub use config::SimConfig;
pub use duck::{can_eat, growth_step, move_force, sprint_shrink, turn_torque};
pub use error::SimError;
pub use physics::{BodyHandle, Collision, Physics, Transform};
pub use world::{Predation, TickOutcome, World};
