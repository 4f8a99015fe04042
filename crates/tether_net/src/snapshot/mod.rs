//! # Snapshot Handling
//!
//! Receive-side ordering and send-side pacing of authoritative snapshots.
//!
//! ## Ordering
//!
//! The snapshot channel guarantees neither order nor delivery. Every receiver
//! keeps a [`Watermark`] of the newest timestamp it has applied and discards
//! anything at or below it:
//!
//! ```text
//! arrivals:   t=10  t=12  t=11  t=12  t=13
//! watermark:   10    12    12    12    13
//! accepted:    yes   yes   no    no    yes
//! ```
//!
//! ## Pacing
//!
//! The authority may produce a result every tick but only ships the newest one
//! per send interval ([`SnapshotThrottle`]).

use tether_core::BoundedQueue;

use crate::protocol::Results;

/// Slack for accumulated float error in simulation timestamps.
const TIME_TOLERANCE: f32 = 1e-4;

/// Newest applied snapshot timestamp. Never moves backwards.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Watermark {
    last_applied: Option<f32>,
}

impl Watermark {
    /// Creates a watermark that accepts any first timestamp.
    #[must_use]
    pub const fn new() -> Self {
        Self { last_applied: None }
    }

    /// Returns the newest applied timestamp, if any.
    #[inline]
    #[must_use]
    pub const fn last_applied(&self) -> Option<f32> {
        self.last_applied
    }

    /// Returns true if `timestamp` is strictly newer than everything applied.
    #[inline]
    #[must_use]
    pub fn accepts(&self, timestamp: f32) -> bool {
        self.last_applied.map_or(true, |last| timestamp > last)
    }

    /// Advances to `timestamp` if it is newer.
    ///
    /// Returns false (and leaves the watermark untouched) for stale or
    /// duplicate timestamps.
    pub fn advance(&mut self, timestamp: f32) -> bool {
        if !self.accepts(timestamp) {
            return false;
        }
        self.last_applied = Some(timestamp);
        true
    }
}

/// Time-ordered buffer of snapshots waiting to be played back.
///
/// Used only by pure observers. When full, the oldest snapshot is evicted.
#[derive(Clone, Debug)]
pub struct ResultBuffer {
    entries: BoundedQueue<Results>,
    watermark: Watermark,
    evicted: u64,
}

impl ResultBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: BoundedQueue::new(capacity),
            watermark: Watermark::new(),
            evicted: 0,
        }
    }

    /// Appends `snapshot` if it is newer than everything received before.
    ///
    /// Returns false for stale or duplicate snapshots.
    pub fn push(&mut self, snapshot: Results) -> bool {
        if !self.watermark.advance(snapshot.timestamp) {
            return false;
        }
        if self.entries.push_evicting(snapshot).is_some() {
            self.evicted += 1;
        }
        true
    }

    /// Removes and returns the oldest buffered snapshot.
    #[inline]
    pub fn pop(&mut self) -> Option<Results> {
        self.entries.pop_front()
    }

    /// Number of buffered snapshots.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is buffered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates buffered snapshots, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Results> {
        self.entries.iter()
    }

    /// The receive watermark.
    #[must_use]
    pub const fn watermark(&self) -> &Watermark {
        &self.watermark
    }

    /// Snapshots dropped because the buffer was full.
    #[must_use]
    pub const fn evicted(&self) -> u64 {
        self.evicted
    }
}

/// Coalesces produced snapshots down to one send per interval.
///
/// [`SnapshotThrottle::offer`] replaces any pending snapshot with a newer one;
/// [`SnapshotThrottle::poll`] releases the pending snapshot once the interval
/// since the previous release has elapsed.
#[derive(Clone, Debug)]
pub struct SnapshotThrottle {
    interval: f32,
    pending: Option<Results>,
    last_sent_at: Option<f32>,
    coalesced: u64,
}

impl SnapshotThrottle {
    /// Creates a throttle releasing at most once per `interval` seconds.
    #[must_use]
    pub const fn new(interval: f32) -> Self {
        Self {
            interval,
            pending: None,
            last_sent_at: None,
            coalesced: 0,
        }
    }

    /// Queues `snapshot` for the next release, replacing any older one.
    pub fn offer(&mut self, snapshot: Results) {
        if self.pending.replace(snapshot).is_some() {
            self.coalesced += 1;
        }
    }

    /// Releases the pending snapshot if one is due at time `now`.
    pub fn poll(&mut self, now: f32) -> Option<Results> {
        let due = self
            .last_sent_at
            .map_or(true, |last| now - last >= self.interval - TIME_TOLERANCE);
        if !due {
            return None;
        }
        let snapshot = self.pending.take()?;
        self.last_sent_at = Some(now);
        Some(snapshot)
    }

    /// Returns true if a snapshot is waiting for release.
    #[must_use]
    pub const fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Snapshots replaced before they were sent.
    #[must_use]
    pub const fn coalesced(&self) -> u64 {
        self.coalesced
    }
}
