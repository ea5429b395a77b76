//! World rules driven through the built-in arena physics.

use quack_protocol::{FoodEventKind, InputFlags, PlayerId};
use quack_sim::{ArenaPhysics, Physics, Predation, SimConfig, World};

const DT: f32 = 1.0 / 60.0;

fn world_with(config: SimConfig) -> World<ArenaPhysics> {
    World::with_seed(config, ArenaPhysics::default(), 42)
}

/// Everything spawns at the origin, so a fresh duck sits on every food item.
fn crowded() -> SimConfig {
    SimConfig {
        spawn_extent: 0.0,
        food_count: 5,
        ..SimConfig::default()
    }
}

#[test]
fn test_held_up_moves_duck_forward() {
    // Keep well clear of the walls for a second of swimming.
    let mut world = world_with(SimConfig {
        spawn_extent: 50.0,
        ..SimConfig::default()
    });
    world.join(PlayerId(1), "A").unwrap();
    let start = world.duck(PlayerId(1)).unwrap().clone();
    world
        .apply_input(PlayerId(1), InputFlags::from_byte(InputFlags::UP))
        .unwrap();

    for _ in 0..60 {
        world.tick(DT);
    }

    let end = world.duck(PlayerId(1)).unwrap();
    let heading = glam::Vec2::from_angle(start.rotation);
    let travelled = glam::Vec2::new(end.x - start.x, end.y - start.y);
    assert!(travelled.dot(heading) > 1.0, "moved {travelled:?} against heading {heading:?}");
    assert!(end.timestamp > start.timestamp);
}

#[test]
fn test_held_left_turns_counter_clockwise() {
    let mut world = world_with(SimConfig::default());
    world.join(PlayerId(1), "A").unwrap();
    world
        .apply_input(PlayerId(1), InputFlags::from_byte(InputFlags::LEFT))
        .unwrap();
    let before = world.duck(PlayerId(1)).unwrap().rotation;

    world.tick(DT);

    let after = world.duck(PlayerId(1)).unwrap().rotation;
    let turned = (after - before + std::f32::consts::PI).rem_euclid(std::f32::consts::TAU)
        - std::f32::consts::PI;
    assert!(turned > 0.0);
}

#[test]
fn test_duck_eats_food_under_it() {
    let mut world = world_with(crowded());
    world.join(PlayerId(1), "A").unwrap();

    world.tick(DT);

    let update = world.take_update();
    let consumed = update
        .food_events
        .iter()
        .filter(|e| e.kind == FoodEventKind::Consumed)
        .count();
    let spawned = update
        .food_events
        .iter()
        .filter(|e| e.kind == FoodEventKind::Spawn)
        .count();
    assert_eq!(consumed, 5);
    assert_eq!(spawned, 5);
    assert_eq!(world.food_count(), 5);
    assert!(world.duck(PlayerId(1)).unwrap().scale > 1.0);
}

#[test]
fn test_grown_duck_eats_newcomer() {
    let mut world = world_with(crowded());
    world.join(PlayerId(1), "big").unwrap();

    for _ in 0..2000 {
        world.tick(DT);
        if world.duck(PlayerId(1)).unwrap().scale > 1.3 {
            break;
        }
    }
    assert!(world.duck(PlayerId(1)).unwrap().scale > 1.3);

    // Joins right on top of the big duck.
    world.join(PlayerId(2), "small").unwrap();
    let outcome = world.tick(DT);

    assert_eq!(
        outcome.eaten,
        vec![Predation {
            predator: PlayerId(1),
            prey: PlayerId(2)
        }]
    );
    assert!(world.duck(PlayerId(2)).is_none());
    assert_eq!(world.duck_count(), 1);
}

#[test]
fn test_equal_ducks_bump_apart() {
    let mut world = world_with(SimConfig {
        spawn_extent: 0.0,
        food_count: 0,
        ..SimConfig::default()
    });
    world.join(PlayerId(1), "A").unwrap();
    world.join(PlayerId(2), "B").unwrap();

    let outcome = world.tick(DT);

    assert!(outcome.eaten.is_empty());
    let a = world.duck(PlayerId(1)).unwrap();
    let b = world.duck(PlayerId(2)).unwrap();
    assert!((a.x - b.x).abs() > 0.5);
}

#[test]
fn test_leave_frees_physics_body() {
    let mut world = world_with(crowded());
    world.join(PlayerId(1), "A").unwrap();
    assert_eq!(world.physics().body_count(), 6);
    assert!(world.leave(PlayerId(1)));
    assert_eq!(world.physics().body_count(), 5);
}
