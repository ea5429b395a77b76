//! Per-duck snapshot buffering and interpolation.
//!
//! Server snapshots arrive in bursts and with jitter. Each remote duck keeps
//! a FIFO of snapshots and plays them back one segment at a time, where a
//! segment is the interval between two consecutive snapshots. Playback runs
//! a little faster when the queue grows and a little slower when it runs
//! dry, so the buffer settles around a small backlog without visible jumps.

use std::collections::VecDeque;
use std::f32::consts::{PI, TAU};

use glam::Vec2;
use quack_protocol::{DuckState, TICKS_PER_SECOND};

/// Segment length used when timestamps can't be trusted, in seconds.
pub const DEFAULT_SEGMENT: f32 = 0.045;

const MIN_SEGMENT: f32 = 0.001;
const MAX_SEGMENT: f32 = 1.0;

/// Above this many queued snapshots, intermediate ones are dropped.
pub const MAX_BACKLOG: usize = 15;

/// An interpolated duck pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec2,
    pub rotation: f32,
    pub scale: f32,
}

/// Playback speed multiplier for a given queue depth.
pub fn playback_speed(depth: usize) -> f32 {
    match depth {
        0 => 0.9,
        d if d > 10 => 1.5,
        d if d > 4 => 1.25,
        d if d > 1 => 1.05,
        _ => 1.0,
    }
}

/// Duration of the segment from `prev` to `next`, in seconds.
///
/// Derived from the timestamp delta. Falls back to [`DEFAULT_SEGMENT`] when
/// `prev` has no timestamp, the delta is not positive, or the result is
/// outside 1 ms..=1 s.
pub fn segment_duration(prev: &DuckState, next: &DuckState) -> f32 {
    let delta = next.timestamp - prev.timestamp;
    if prev.timestamp <= 0 || delta <= 0 {
        return DEFAULT_SEGMENT;
    }
    let seconds = delta as f32 / TICKS_PER_SECOND as f32;
    if (MIN_SEGMENT..=MAX_SEGMENT).contains(&seconds) {
        seconds
    } else {
        DEFAULT_SEGMENT
    }
}

/// Interpolates between two angles along the shorter arc.
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    let diff = (to - from + PI).rem_euclid(TAU) - PI;
    from + diff * t
}

/// Snapshot queue and playback state for one duck.
#[derive(Debug, Clone)]
pub struct SnapshotBuffer {
    queue: VecDeque<DuckState>,
    prev: DuckState,
    next: DuckState,
    /// Seconds into the current segment. Starts one default segment
    /// negative so the first snapshot gets a little buffering time.
    transition_time: f32,
    segment: f32,
}

impl SnapshotBuffer {
    /// Starts a buffer resting at `initial`.
    pub fn new(initial: DuckState) -> Self {
        Self {
            queue: VecDeque::new(),
            prev: initial.clone(),
            next: initial,
            transition_time: -DEFAULT_SEGMENT,
            segment: DEFAULT_SEGMENT,
        }
    }

    /// Queues a snapshot for playback.
    pub fn push(&mut self, state: DuckState) {
        self.queue.push_back(state);
    }

    /// Advances playback by `dt` seconds of wall-clock time.
    pub fn update(&mut self, dt: f32) {
        self.transition_time += dt * playback_speed(self.queue.len());
        if self.transition_time < self.segment {
            return;
        }

        let Some(state) = self.queue.pop_front() else {
            // Nothing newer: hold at the last known state.
            self.transition_time = self.segment;
            return;
        };
        self.transition_time -= self.segment;
        self.advance_to(state);

        while self.queue.len() > MAX_BACKLOG {
            if let Some(state) = self.queue.pop_front() {
                self.advance_to(state);
            }
            self.transition_time = 0.0;
        }
    }

    fn advance_to(&mut self, state: DuckState) {
        self.prev = std::mem::replace(&mut self.next, state);
        self.segment = segment_duration(&self.prev, &self.next);
    }

    /// Progress through the current segment, clamped to `0.0..=1.0`.
    pub fn fraction(&self) -> f32 {
        (self.transition_time / self.segment).clamp(0.0, 1.0)
    }

    pub fn pose(&self) -> Pose {
        let t = self.fraction();
        let from = Vec2::new(self.prev.x, self.prev.y);
        let to = Vec2::new(self.next.x, self.next.y);
        Pose {
            position: from.lerp(to, t),
            rotation: lerp_angle(self.prev.rotation, self.next.rotation, t),
            scale: self.prev.scale + (self.next.scale - self.prev.scale) * t,
        }
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn segment(&self) -> f32 {
        self.segment
    }

    pub fn transition_time(&self) -> f32 {
        self.transition_time
    }

    /// The snapshot playback is heading towards.
    pub fn target(&self) -> &DuckState {
        &self.next
    }

    /// The newest snapshot known, queued or not.
    pub fn latest(&self) -> &DuckState {
        self.queue.back().unwrap_or(&self.next)
    }

    pub fn name(&self) -> &str {
        &self.next.name
    }
}
