use std::collections::{BTreeMap, HashMap};
use std::f32::consts::TAU;

use glam::Vec2;
use quack_protocol::{
    DuckState, FoodEvent, FoodId, FoodState, InputFlags, PlayerId, Scoreboard, UpdateState,
    Welcome,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::duck::{can_eat, growth_step, sprint_shrink, Duck};
use crate::{BodyHandle, Clock, Collision, Physics, SimConfig, SimError};

/// One duck eating another during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Predation {
    pub predator: PlayerId,
    pub prey: PlayerId,
}

/// What a tick did that the caller has to act on.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TickOutcome {
    /// Ducks removed this tick. Their owners should be disconnected.
    pub eaten: Vec<Predation>,
}

#[derive(Debug, Clone)]
struct Food {
    state: FoodState,
    body: BodyHandle,
}

#[derive(Debug, Clone, Copy)]
enum BodyOwner {
    Duck(PlayerId),
    Food(FoodId),
}

/// The canonical game state.
///
/// Holds every duck and food item and the physics bodies behind them. The
/// food pool always holds exactly `food_count` items: each one eaten is
/// replaced within the same tick.
pub struct World<P: Physics> {
    config: SimConfig,
    physics: P,
    rng: StdRng,
    clock: Clock,
    ducks: BTreeMap<PlayerId, Duck>,
    food: BTreeMap<FoodId, Food>,
    owners: HashMap<BodyHandle, BodyOwner>,
    next_food_id: u32,
    /// Spawn/consume events since the last [`take_update`](Self::take_update).
    food_events: Vec<FoodEvent>,
    game_time: f64,
}

impl<P: Physics> World<P> {
    /// Creates a world seeded from the OS and fills the food pool.
    pub fn new(config: SimConfig, physics: P) -> Self {
        Self::with_rng(config, physics, StdRng::from_os_rng())
    }

    /// Creates a world with reproducible spawn positions.
    pub fn with_seed(config: SimConfig, physics: P, seed: u64) -> Self {
        Self::with_rng(config, physics, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: SimConfig, physics: P, rng: StdRng) -> Self {
        let mut world = Self {
            config,
            physics,
            rng,
            clock: Clock::new(),
            ducks: BTreeMap::new(),
            food: BTreeMap::new(),
            owners: HashMap::new(),
            next_food_id: 1,
            food_events: Vec::new(),
            game_time: 0.0,
        };
        // The initial pool reaches clients through Welcome, not events.
        for _ in 0..world.config.food_count {
            world.spawn_food();
        }
        world.food_events.clear();
        world
    }

    /// Adds a duck for `player_id` at a random spot and heading.
    ///
    /// Returns the Welcome for the joining player, which already includes
    /// the new duck.
    pub fn join(&mut self, player_id: PlayerId, name: impl Into<String>) -> Result<Welcome, SimError> {
        if self.ducks.contains_key(&player_id) {
            return Err(SimError::AlreadyJoined(player_id));
        }

        let position = self.random_position();
        let rotation = self.rng.random_range(0.0..TAU);
        let scale = self.config.min_scale;
        let body = self.physics.create_duck_body(position, rotation, scale);
        let name = name.into();

        tracing::info!(player = %player_id, name = %name, x = position.x, y = position.y, "duck joined");

        self.owners.insert(body, BodyOwner::Duck(player_id));
        self.ducks.insert(
            player_id,
            Duck {
                state: DuckState {
                    id: player_id,
                    name,
                    x: position.x,
                    y: position.y,
                    rotation,
                    scale,
                    timestamp: self.clock.ticks(),
                },
                input: InputFlags::default(),
                food: 0.0,
                body,
            },
        );

        Ok(self.welcome(player_id))
    }

    /// Removes a player's duck. Returns whether there was one.
    pub fn leave(&mut self, player_id: PlayerId) -> bool {
        let removed = self.remove_duck(player_id).is_some();
        if removed {
            tracing::info!(player = %player_id, "duck left");
        }
        removed
    }

    /// Replaces the player's held input.
    pub fn apply_input(&mut self, player_id: PlayerId, input: InputFlags) -> Result<(), SimError> {
        let duck = self
            .ducks
            .get_mut(&player_id)
            .ok_or(SimError::UnknownPlayer(player_id))?;
        duck.input = input;
        Ok(())
    }

    /// Advances the world by `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        for duck in self.ducks.values_mut() {
            let (force, torque) = duck.control(&self.config);
            self.physics.apply_force(duck.body, force);
            self.physics.apply_torque(duck.body, torque);

            if duck.input.sprint {
                duck.state.scale = sprint_shrink(duck.state.scale, dt, &self.config);
                self.physics.set_scale(duck.body, duck.state.scale);
            }
        }

        for collision in self.physics.step(dt) {
            match collision {
                Collision::Contact(a, b) => {
                    if let Some(predation) = self.resolve_contact(a, b) {
                        outcome.eaten.push(predation);
                    }
                }
                Collision::Sensor { sensor, visitor } => self.resolve_sensor(sensor, visitor),
            }
        }

        let timestamp = self.clock.ticks();
        for duck in self.ducks.values_mut() {
            let (used, scale) = growth_step(duck.food, duck.state.scale, dt, &self.config);
            if used > 0.0 {
                duck.food -= used;
                duck.state.scale = scale;
                self.physics.set_scale(duck.body, scale);
            }

            if let Some(transform) = self.physics.transform(duck.body) {
                duck.state.x = transform.position.x;
                duck.state.y = transform.position.y;
                duck.state.rotation = transform.rotation;
            }
            duck.state.timestamp = timestamp;
        }

        self.game_time += f64::from(dt) * self.config.time_scale;
        outcome
    }

    /// Snapshot for broadcast. Drains the pending food events.
    pub fn take_update(&mut self) -> UpdateState {
        UpdateState {
            ducks: self.duck_states(),
            food_events: std::mem::take(&mut self.food_events),
            game_time: self.game_time,
        }
    }

    /// Full state as seen by a newly joined player.
    pub fn welcome(&self, player_id: PlayerId) -> Welcome {
        Welcome {
            player_id,
            ducks: self.duck_states(),
            food: self.food.values().map(|f| f.state).collect(),
            game_time: self.game_time,
        }
    }

    /// Ducks in player-id order.
    pub fn ducks(&self) -> impl Iterator<Item = &DuckState> {
        self.ducks.values().map(|d| &d.state)
    }

    pub fn duck(&self, player_id: PlayerId) -> Option<&DuckState> {
        self.ducks.get(&player_id).map(|d| &d.state)
    }

    /// Food credit the duck has banked but not yet grown from.
    pub fn food_credit(&self, player_id: PlayerId) -> Option<f32> {
        self.ducks.get(&player_id).map(|d| d.food)
    }

    pub fn duck_body(&self, player_id: PlayerId) -> Option<BodyHandle> {
        self.ducks.get(&player_id).map(|d| d.body)
    }

    pub fn food(&self) -> impl Iterator<Item = &FoodState> {
        self.food.values().map(|f| &f.state)
    }

    pub fn food_body(&self, food_id: FoodId) -> Option<BodyHandle> {
        self.food.get(&food_id).map(|f| f.body)
    }

    pub fn duck_count(&self) -> usize {
        self.ducks.len()
    }

    pub fn food_count(&self) -> usize {
        self.food.len()
    }

    /// In-game clock, in game seconds.
    pub fn game_time(&self) -> f64 {
        self.game_time
    }

    pub fn scoreboard(&self) -> Scoreboard {
        Scoreboard::from_ducks(self.ducks())
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    fn duck_states(&self) -> Vec<DuckState> {
        self.ducks().cloned().collect()
    }

    fn random_position(&mut self) -> Vec2 {
        let extent = self.config.spawn_extent;
        Vec2::new(
            self.rng.random_range(-extent..=extent),
            self.rng.random_range(-extent..=extent),
        )
    }

    fn spawn_food(&mut self) -> FoodId {
        let id = FoodId(self.next_food_id);
        self.next_food_id += 1;

        let position = self.random_position();
        let body = self.physics.create_food_body(position);
        let state = FoodState {
            id,
            x: position.x,
            y: position.y,
        };

        self.food_events.push(FoodEvent::spawn(&state));
        self.owners.insert(body, BodyOwner::Food(id));
        self.food.insert(id, Food { state, body });
        id
    }

    fn remove_duck(&mut self, player_id: PlayerId) -> Option<Duck> {
        let duck = self.ducks.remove(&player_id)?;
        self.physics.destroy_body(duck.body);
        self.owners.remove(&duck.body);
        Some(duck)
    }

    fn duck_at(&self, body: BodyHandle) -> Option<PlayerId> {
        match self.owners.get(&body) {
            Some(BodyOwner::Duck(id)) => Some(*id),
            _ => None,
        }
    }

    /// Two ducks touched. The larger eats the smaller if it is big enough.
    fn resolve_contact(&mut self, a: BodyHandle, b: BodyHandle) -> Option<Predation> {
        // Either side may have been eaten earlier in this step.
        let first = self.duck_at(a)?;
        let second = self.duck_at(b)?;
        let scale_a = self.ducks.get(&first)?.state.scale;
        let scale_b = self.ducks.get(&second)?.state.scale;
        let ratio = self.config.predation_ratio;

        let (predator, prey) = if can_eat(scale_a, scale_b, ratio) {
            (first, second)
        } else if can_eat(scale_b, scale_a, ratio) {
            (second, first)
        } else {
            return None;
        };

        let eaten = self.remove_duck(prey)?;
        let meal = eaten.state.scale * eaten.state.scale;
        if let Some(duck) = self.ducks.get_mut(&predator) {
            duck.food += meal;
        }

        tracing::info!(predator = %predator, prey = %prey, meal, "duck eaten");
        Some(Predation { predator, prey })
    }

    /// A duck swam over food: credit it, then replace the food elsewhere.
    fn resolve_sensor(&mut self, sensor: BodyHandle, visitor: BodyHandle) {
        let Some(BodyOwner::Food(food_id)) = self.owners.get(&sensor).copied() else {
            return;
        };
        let Some(player_id) = self.duck_at(visitor) else {
            return;
        };
        let Some(food) = self.food.remove(&food_id) else {
            return;
        };

        self.physics.destroy_body(food.body);
        self.owners.remove(&food.body);
        if let Some(duck) = self.ducks.get_mut(&player_id) {
            duck.food += self.config.food_value;
        }
        self.food_events.push(FoodEvent::consumed(food_id));

        let replacement = self.spawn_food();
        tracing::trace!(player = %player_id, eaten = %food_id, spawned = %replacement, "food consumed");
    }
}

impl<P: Physics + std::fmt::Debug> std::fmt::Debug for World<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("ducks", &self.ducks.len())
            .field("food", &self.food.len())
            .field("game_time", &self.game_time)
            .field("physics", &self.physics)
            .finish()
    }
}
