//! # Tick Clock
//!
//! Fixed-timestep clock for a peer.
//!
//! Simulation time is the tick count times the tick duration and never reads
//! the wall clock, so peers at the same tick stamp the same time and a
//! replayed session stamps exactly what the live one did. Wall time only
//! enters when a live loop paces itself with [`TickLoop::wait_for_next_tick`].

use std::time::{Duration, Instant};

/// Pacing statistics for a live loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Waits that found their deadline already passed.
    pub late_ticks: u64,
    /// Largest overshoot past a deadline, in microseconds.
    pub max_lag_us: u64,
}

/// Fixed-timestep simulation clock.
#[derive(Clone, Debug)]
pub struct TickLoop {
    tick_duration: Duration,
    tick_count: u64,
    next_deadline: Option<Instant>,
    stats: TickStats,
}

impl TickLoop {
    /// Creates a clock at tick zero.
    ///
    /// A rate of zero is treated as one tick per second.
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        Self {
            tick_duration: Duration::from_secs_f64(1.0 / f64::from(tick_rate.max(1))),
            tick_count: 0,
            next_deadline: None,
            stats: TickStats::default(),
        }
    }

    /// Starts the next tick and returns its simulation time.
    pub fn advance(&mut self) -> f32 {
        let now = self.sim_time();
        self.tick_count += 1;
        now
    }

    /// Blocks until the next tick is due on the wall clock.
    ///
    /// The first call returns at once and anchors the schedule. A wait that
    /// finds its deadline passed is counted late and the schedule restarts
    /// from now, so a stall is never followed by a burst of catch-up ticks.
    pub fn wait_for_next_tick(&mut self) {
        let now = Instant::now();
        let Some(deadline) = self.next_deadline else {
            self.next_deadline = Some(now + self.tick_duration);
            return;
        };

        if let Some(remaining) = deadline.checked_duration_since(now) {
            std::thread::sleep(remaining);
            self.next_deadline = Some(deadline + self.tick_duration);
            return;
        }

        let lag_us = u64::try_from(now.duration_since(deadline).as_micros()).unwrap_or(u64::MAX);
        self.stats.late_ticks += 1;
        self.stats.max_lag_us = self.stats.max_lag_us.max(lag_us);
        tracing::debug!(tick = self.tick_count, lag_us, "tick started late");
        self.next_deadline = Some(now + self.tick_duration);
    }

    /// Ticks started so far.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Simulation time of the next tick, in seconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn sim_time(&self) -> f32 {
        (self.tick_count as f64 * self.tick_duration.as_secs_f64()) as f32
    }

    /// Length of one tick.
    #[must_use]
    pub const fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    /// Returns pacing statistics.
    #[must_use]
    pub const fn stats(&self) -> &TickStats {
        &self.stats
    }
}

impl Default for TickLoop {
    fn default() -> Self {
        Self::new(crate::DEFAULT_TICK_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_zero() {
        let clock = TickLoop::new(50);
        assert_eq!(clock.tick_count(), 0);
        assert_eq!(clock.tick_duration(), Duration::from_millis(20));
        assert_eq!(clock.sim_time(), 0.0);
        assert_eq!(TickLoop::new(0).tick_duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_advance_stamps_each_tick() {
        let mut clock = TickLoop::new(50);
        let stamps: Vec<f32> = (0..3).map(|_| clock.advance()).collect();
        assert_eq!(stamps[0], 0.0);
        assert!((stamps[1] - 0.02).abs() < 1e-6);
        assert!((stamps[2] - 0.04).abs() < 1e-6);
        assert_eq!(clock.tick_count(), 3);
    }

    #[test]
    fn test_sim_time_ignores_wall_clock() {
        let mut clock = TickLoop::new(50);
        for _ in 0..150 {
            clock.advance();
        }
        assert!((clock.sim_time() - 3.0).abs() < 1e-5);
        assert_eq!(clock.stats(), &TickStats::default());
    }

    #[test]
    fn test_wait_paces_ticks() {
        let mut clock = TickLoop::new(200);
        let start = Instant::now();
        for _ in 0..3 {
            clock.wait_for_next_tick();
            clock.advance();
        }
        // First wait anchors, the next two wait 5ms each
        assert!(start.elapsed() >= Duration::from_millis(9));
        assert_eq!(clock.stats().late_ticks, 0);
    }

    #[test]
    fn test_stall_counts_late_without_burst() {
        let mut clock = TickLoop::new(1000);
        clock.wait_for_next_tick();
        std::thread::sleep(Duration::from_millis(10));

        clock.wait_for_next_tick();
        assert_eq!(clock.stats().late_ticks, 1);
        assert!(clock.stats().max_lag_us > 0);

        // Rescheduled from now, so the following tick waits again
        let before = Instant::now();
        clock.wait_for_next_tick();
        assert!(before.elapsed() >= Duration::from_micros(500));
        assert_eq!(clock.stats().late_ticks, 1);
    }
}
