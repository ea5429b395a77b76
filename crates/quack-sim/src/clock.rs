use std::time::Instant;

use quack_protocol::TICKS_PER_SECOND;

/// Monotonic source for `DuckState::timestamp`, in 100 ns ticks.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    origin: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Ticks since the clock was created. Always positive, since clients
    /// treat a non-positive timestamp as "unknown".
    pub fn ticks(&self) -> i64 {
        let nanos = self.origin.elapsed().as_nanos();
        let ticks = nanos / (1_000_000_000 / TICKS_PER_SECOND as u128);
        i64::try_from(ticks).unwrap_or(i64::MAX).max(1)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_are_positive_and_monotonic() {
        let clock = Clock::new();
        let a = clock.ticks();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = clock.ticks();
        assert!(a >= 1);
        assert!(b - a >= 20_000, "2 ms should be at least 20k ticks, got {}", b - a);
    }
}
