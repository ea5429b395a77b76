//! Tick scheduling for Quack's simulation loops.
//!
//! Two pieces:
//!
//! - [`TickScheduler`] wakes a loop at a fixed rate (default 60 Hz) and
//!   reports the real time elapsed since the previous tick, capped so a
//!   stalled process never feeds the physics one enormous step.
//! - [`Cadence`] turns those irregular tick deltas into a slower, regular
//!   event stream. The server uses it for the 45 ms `UpdateState` broadcast.
//!
//! # Integration
//!
//! The scheduler sits inside the server loop's `tokio::select!`:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(event) = events.recv() => { /* handle joins, input, leaves */ }
//!         tick = scheduler.wait_for_tick() => {
//!             world.tick(tick.dt);
//!             if cadence.advance(tick.dt) { /* broadcast */ }
//!             scheduler.record_tick_end();
//!         }
//!     }
//! }
//! ```

use std::time::{Duration, Instant};

use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when a tick fires late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickPolicy {
    /// Schedule the next tick one period from now. Prevents bursts.
    #[default]
    Skip,
    /// Keep the original cadence; the next tick fires at its planned time
    /// even if that is immediately.
    Drop,
}

/// Configuration for the tick scheduler.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Tick rate in Hz.
    pub tick_rate_hz: u32,
    /// Overrun handling policy.
    pub policy: TickPolicy,
    /// Upper bound on the `dt` reported for a single tick, in seconds.
    pub max_dt: f32,
    /// Budget warning threshold (0.0–1.0). A warning is logged when a tick's
    /// work exceeds this fraction of the tick period.
    pub budget_warn_threshold: f64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            policy: TickPolicy::default(),
            max_dt: 1.0 / 20.0,
            budget_warn_threshold: 0.80,
        }
    }
}

impl TickConfig {
    /// Maximum supported tick rate.
    pub const MAX_TICK_RATE_HZ: u32 = 240;

    /// A config for a specific tick rate with default settings.
    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Default::default()
        }
    }

    /// Clamps out-of-range values so the config is safe to use.
    ///
    /// - `tick_rate_hz` is clamped to `1..=MAX_TICK_RATE_HZ`.
    /// - `max_dt` is never shorter than one tick period.
    /// - `budget_warn_threshold` is clamped to `0.0..=1.0`.
    pub fn validated(mut self) -> Self {
        let clamped = self.tick_rate_hz.clamp(1, Self::MAX_TICK_RATE_HZ);
        if clamped != self.tick_rate_hz {
            warn!(
                rate = self.tick_rate_hz,
                clamped, "tick_rate_hz out of range, clamping"
            );
            self.tick_rate_hz = clamped;
        }
        let period = 1.0 / self.tick_rate_hz as f32;
        if !(self.max_dt >= period) {
            self.max_dt = period;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self
    }

    /// Duration of a single tick.
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz.max(1) as f64)
    }
}

// ---------------------------------------------------------------------------
// Tick info (returned to caller each tick)
// ---------------------------------------------------------------------------

/// Information about a tick, returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone, Copy)]
pub struct TickInfo {
    /// Monotonically increasing tick number (starts at 1).
    pub tick: u64,
    /// Seconds since the previous tick (one period for the first tick),
    /// capped at [`TickConfig::max_dt`].
    pub dt: f32,
    /// `true` if this tick fired more than 10% of a period late.
    pub overrun: bool,
    /// Whole periods missed because of the overrun (0 in normal operation).
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-rate tick scheduler. One per simulation loop.
pub struct TickScheduler {
    config: TickConfig,
    tick_duration: Duration,
    tick_count: u64,
    /// When the next tick should fire.
    next_tick: TokioInstant,
    /// When the previous tick fired, for measuring `dt`.
    last_tick: Option<TokioInstant>,
    /// Wall-clock start of the current tick's work, consumed by
    /// `record_tick_end`.
    tick_start: Option<Instant>,
    total_overruns: u64,
}

impl TickScheduler {
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let tick_duration = config.tick_duration();

        debug!(
            rate_hz = config.tick_rate_hz,
            budget_ms = tick_duration.as_secs_f64() * 1000.0,
            policy = ?config.policy,
            "tick scheduler created"
        );

        Self {
            next_tick: TokioInstant::now() + tick_duration,
            config,
            tick_duration,
            tick_count: 0,
            last_tick: None,
            tick_start: None,
            total_overruns: 0,
        }
    }

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self::new(TickConfig::with_rate(tick_rate_hz))
    }

    /// Waits until the next tick is due and returns its [`TickInfo`].
    ///
    /// Cancel-safe: dropping the future before it resolves leaves the
    /// schedule untouched, so it can sit in a `tokio::select!`.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let next = self.next_tick;
        time::sleep_until(next).await;

        let now = TokioInstant::now();
        self.tick_count += 1;
        self.tick_start = Some(Instant::now());

        let late_by = now.saturating_duration_since(next);
        let overrun = late_by > self.tick_duration / 10;
        let mut ticks_skipped = 0u64;

        self.next_tick = match self.config.policy {
            TickPolicy::Skip => {
                if overrun {
                    ticks_skipped =
                        (late_by.as_nanos() / self.tick_duration.as_nanos()) as u64;
                    if ticks_skipped > 0 {
                        warn!(
                            tick = self.tick_count,
                            skipped = ticks_skipped,
                            late_ms = late_by.as_secs_f64() * 1000.0,
                            "tick overrun, skipping ahead"
                        );
                    }
                }
                now + self.tick_duration
            }
            TickPolicy::Drop => next + self.tick_duration,
        };

        let elapsed = match self.last_tick {
            Some(last) => now.saturating_duration_since(last).as_secs_f32(),
            None => self.tick_duration.as_secs_f32(),
        };
        self.last_tick = Some(now);

        if overrun {
            self.total_overruns += 1;
        }
        trace!(tick = self.tick_count, overrun, dt = elapsed, "tick fired");

        TickInfo {
            tick: self.tick_count,
            dt: elapsed.min(self.config.max_dt),
            overrun,
            ticks_skipped,
        }
    }

    /// Records that the current tick's work has finished.
    ///
    /// Logs a warning when the work took more than the configured fraction
    /// of the tick period.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let elapsed = start.elapsed();
        let utilization = elapsed.as_secs_f64() / self.tick_duration.as_secs_f64();

        if utilization >= self.config.budget_warn_threshold {
            warn!(
                tick = self.tick_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                budget_ms = self.tick_duration.as_secs_f64() * 1000.0,
                utilization_pct = format!("{:.1}", utilization * 100.0),
                "tick approaching budget limit"
            );
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn total_overruns(&self) -> u64 {
        self.total_overruns
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.config.tick_rate_hz
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }
}

// ---------------------------------------------------------------------------
// Cadence
// ---------------------------------------------------------------------------

/// Fires at a fixed interval measured in seconds of simulated time.
///
/// Each call to [`advance`](Self::advance) adds a tick's `dt`; when the
/// accumulated time reaches the interval the cadence fires once and keeps
/// the remainder. A backlog of more than one interval (after a stall) is
/// discarded rather than fired in a burst.
#[derive(Debug, Clone)]
pub struct Cadence {
    interval: f32,
    accumulated: f32,
}

impl Cadence {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.as_secs_f32(),
            accumulated: 0.0,
        }
    }

    /// Adds `dt` seconds and reports whether the cadence fired.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.accumulated += dt;
        if self.accumulated < self.interval {
            return false;
        }
        self.accumulated -= self.interval;
        if self.accumulated >= self.interval {
            self.accumulated = 0.0;
        }
        true
    }

    /// The firing interval in seconds.
    pub fn interval(&self) -> f32 {
        self.interval
    }
}
