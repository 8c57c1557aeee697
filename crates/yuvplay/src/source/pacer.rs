//! Rate pacing: how many chunks are due at a point in time.

use std::time::Duration;

/// Default chunks per second.
pub const DEFAULT_RATE: f64 = 25.0;

/// Counts chunks against a target rate.
///
/// At `elapsed` seconds, `floor(elapsed * rate)` chunks should have been
/// emitted. [`due`](Pacer::due) returns how many are still owed, never less
/// than zero, so a producer that falls behind catches up in one burst and a
/// producer that is ahead waits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pacer {
    rate: f64,
    emitted: u64,
}

impl Pacer {
    pub fn new(rate: f64) -> Self {
        Self { rate, emitted: 0 }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Chunks recorded with [`mark`](Pacer::mark).
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Chunks owed at `elapsed`.
    pub fn due(&self, elapsed: Duration) -> u64 {
        let target = (elapsed.as_secs_f64() * self.rate).floor() as u64;
        target.saturating_sub(self.emitted)
    }

    /// Record `n` emitted chunks.
    pub fn mark(&mut self, n: u64) {
        self.emitted += n;
    }

    /// Time from `elapsed` until the next chunk becomes due.
    ///
    /// A rate that is not finite and positive never makes a chunk due, so the
    /// wait is [`Duration::MAX`].
    pub fn until_next(&self, elapsed: Duration) -> Duration {
        if !(self.rate.is_finite() && self.rate > 0.0) {
            return Duration::MAX;
        }
        let next = (self.emitted + 1) as f64 / self.rate;
        Duration::try_from_secs_f64(next - elapsed.as_secs_f64()).unwrap_or(Duration::ZERO)
    }

    pub fn reset(&mut self) {
        self.emitted = 0;
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(DEFAULT_RATE)
    }
}
