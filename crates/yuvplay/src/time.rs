//! Wall-clock timing for the frame source.
//!
//! A [`Clock`] either starts on construction or lazily on its first query.
//! The `*_at` variants take the current instant explicitly so pacing logic
//! can be driven by a synthetic timeline in tests.

use std::time::{Duration, Instant};

/// Elapsed and delta time since a start instant.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    auto_start: bool,
    start: Option<Instant>,
    last: Option<Instant>,
}

impl Clock {
    /// A clock that starts now when `auto_start` is set, or on its first
    /// query otherwise.
    pub fn new(auto_start: bool) -> Self {
        let start = auto_start.then(Instant::now);
        Self {
            auto_start,
            start,
            last: start,
        }
    }

    /// Restart the clock. A lazy clock goes back to waiting for its first
    /// query.
    pub fn reset(&mut self) {
        self.start = self.auto_start.then(Instant::now);
        self.last = self.start;
    }

    pub fn is_started(&self) -> bool {
        self.start.is_some()
    }

    fn start_at(&mut self, now: Instant) -> Instant {
        *self.start.get_or_insert_with(|| {
            self.last = Some(now);
            now
        })
    }

    /// Time since the clock started.
    pub fn elapsed(&mut self) -> Duration {
        self.elapsed_at(Instant::now())
    }

    pub fn elapsed_at(&mut self, now: Instant) -> Duration {
        let start = self.start_at(now);
        self.last = Some(now);
        now.saturating_duration_since(start)
    }

    /// Time since the previous `elapsed` or `delta` query.
    pub fn delta(&mut self) -> Duration {
        self.delta_at(Instant::now())
    }

    pub fn delta_at(&mut self, now: Instant) -> Duration {
        self.start_at(now);
        let last = self.last.unwrap_or(now);
        self.last = Some(now);
        now.saturating_duration_since(last)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lazy_clock_starts_on_first_query() {
        let mut clock = Clock::new(false);
        assert!(!clock.is_started());

        let t0 = Instant::now();
        assert_eq!(clock.elapsed_at(t0), Duration::ZERO);
        assert!(clock.is_started());
        assert_eq!(clock.elapsed_at(t0 + Duration::from_millis(40)), Duration::from_millis(40));
    }

    #[test]
    fn delta_measures_since_last_query() {
        let mut clock = Clock::new(false);
        let t0 = Instant::now();
        assert_eq!(clock.delta_at(t0), Duration::ZERO);
        assert_eq!(clock.delta_at(t0 + Duration::from_millis(10)), Duration::from_millis(10));
        clock.elapsed_at(t0 + Duration::from_millis(25));
        assert_eq!(clock.delta_at(t0 + Duration::from_millis(30)), Duration::from_millis(5));
    }

    #[test]
    fn reset_returns_lazy_clock_to_waiting() {
        let mut clock = Clock::new(false);
        clock.elapsed();
        clock.reset();
        assert!(!clock.is_started());

        let mut eager = Clock::new(true);
        eager.reset();
        assert!(eager.is_started());
    }
}
