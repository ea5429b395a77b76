use std::collections::BTreeMap;

use quack_protocol::{FoodEventKind, FoodId, FoodState, PlayerId, Scoreboard, UpdateState, Welcome};

use crate::snapshot::{Pose, SnapshotBuffer};

/// Area ratio a duck needs over another to eat it. Mirrors the server rule
/// so the client can tell threats from prey.
pub const PREDATION_RATIO: f32 = 1.4;

/// How another duck compares to ours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// We are big enough to eat it.
    Prey,
    /// It is big enough to eat us.
    Predator,
    /// Neither can eat the other.
    Peer,
}

/// The client's view of the pond, rebuilt from Welcome and kept current by
/// UpdateState and Disconnected messages.
#[derive(Debug, Default)]
pub struct ClientWorld {
    my_id: Option<PlayerId>,
    ducks: BTreeMap<PlayerId, SnapshotBuffer>,
    food: BTreeMap<FoodId, FoodState>,
    game_time: f64,
}

impl ClientWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces everything with the Welcome snapshot.
    pub fn apply_welcome(&mut self, welcome: Welcome) {
        self.my_id = Some(welcome.player_id);
        self.ducks = welcome
            .ducks
            .into_iter()
            .map(|state| (state.id, SnapshotBuffer::new(state)))
            .collect();
        self.food = welcome.food.into_iter().map(|f| (f.id, f)).collect();
        self.game_time = welcome.game_time;
    }

    /// Queues new duck snapshots and applies food events.
    ///
    /// Returns `false` (and changes nothing) if no Welcome has been applied
    /// yet, since food events only make sense on top of the Welcome pool.
    pub fn apply_update(&mut self, update: UpdateState) -> bool {
        if self.my_id.is_none() {
            return false;
        }

        for state in update.ducks {
            match self.ducks.get_mut(&state.id) {
                Some(buffer) => buffer.push(state),
                None => {
                    self.ducks.insert(state.id, SnapshotBuffer::new(state));
                }
            }
        }

        for event in update.food_events {
            match event.kind {
                FoodEventKind::Spawn => {
                    self.food.entry(event.food_id).or_insert(FoodState {
                        id: event.food_id,
                        x: event.x,
                        y: event.y,
                    });
                }
                FoodEventKind::Consumed => {
                    self.food.remove(&event.food_id);
                }
            }
        }

        self.game_time = update.game_time;
        true
    }

    /// Forgets a duck. Returns whether it was known.
    pub fn remove_duck(&mut self, player_id: PlayerId) -> bool {
        self.ducks.remove(&player_id).is_some()
    }

    /// Advances every duck's playback by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        for buffer in self.ducks.values_mut() {
            buffer.update(dt);
        }
    }

    pub fn my_id(&self) -> Option<PlayerId> {
        self.my_id
    }

    pub fn is_joined(&self) -> bool {
        self.my_id.is_some()
    }

    pub fn duck(&self, player_id: PlayerId) -> Option<&SnapshotBuffer> {
        self.ducks.get(&player_id)
    }

    pub fn ducks(&self) -> impl Iterator<Item = (PlayerId, &SnapshotBuffer)> {
        self.ducks.iter().map(|(id, buffer)| (*id, buffer))
    }

    /// Our own duck's interpolated pose.
    pub fn my_pose(&self) -> Option<Pose> {
        self.my_id
            .and_then(|id| self.ducks.get(&id))
            .map(SnapshotBuffer::pose)
    }

    /// How `other` compares to our duck, by current interpolated scale.
    pub fn relation_to(&self, other: PlayerId) -> Option<Relation> {
        let mine = self.my_pose()?.scale;
        let theirs = self.ducks.get(&other)?.pose().scale;
        let relation = if mine * mine > PREDATION_RATIO * theirs * theirs {
            Relation::Prey
        } else if theirs * theirs > PREDATION_RATIO * mine * mine {
            Relation::Predator
        } else {
            Relation::Peer
        };
        Some(relation)
    }

    pub fn food(&self) -> impl Iterator<Item = &FoodState> {
        self.food.values()
    }

    pub fn duck_count(&self) -> usize {
        self.ducks.len()
    }

    pub fn food_count(&self) -> usize {
        self.food.len()
    }

    pub fn game_time(&self) -> f64 {
        self.game_time
    }

    /// Standings from the newest known snapshot of each duck.
    pub fn scoreboard(&self) -> Scoreboard {
        Scoreboard::from_ducks(self.ducks.values().map(SnapshotBuffer::latest))
    }
}
