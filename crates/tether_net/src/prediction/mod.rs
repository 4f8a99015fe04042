//! # Client-Side Prediction
//!
//! Predict the owned entity's movement locally for responsive control, then
//! reconcile against the authority when snapshots arrive.
//!
//! ## How It Works
//!
//! 1. The owner samples input and applies it immediately
//! 2. Non-trivial input is buffered and sent to the authority
//! 3. The authority simulates it and broadcasts a snapshot
//! 4. The owner snaps to the snapshot and replays every newer buffered input
//!
//! ```text
//! Buffered:   [t1] [t2] [t3] [t4] [t5]
//!                    │
//! Snapshot:  (t2)────┘
//!                    │
//! Reconcile:  snap to (t2), replay [t3, t4, t5], drop [t1, t2]
//! ```
//!
//! Inputs are matched by the timestamp they were sampled at, so the authority
//! never needs to know anything about the owner's tick numbering.

mod reconcile;

use tether_core::{BoundedQueue, Pose};

use crate::integration::Kinematics;
use crate::protocol::{InputCommand, Inputs};
use crate::snapshot::Watermark;

pub use reconcile::ReconciliationResult;

/// Bounded, time-ordered buffer of inputs.
///
/// Insertion order is arrival order. When full, new inputs are rejected so the
/// oldest unacknowledged inputs survive.
#[derive(Clone, Debug)]
pub struct InputQueue {
    entries: BoundedQueue<Inputs>,
    dropped: u64,
}

impl InputQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: BoundedQueue::new(capacity),
            dropped: 0,
        }
    }

    /// Appends `inputs` unless the queue is full.
    ///
    /// Returns false if the input was dropped.
    pub fn push(&mut self, inputs: Inputs) -> bool {
        match self.entries.try_push(inputs) {
            Ok(()) => true,
            Err(_) => {
                self.dropped += 1;
                false
            }
        }
    }

    /// Removes and returns the oldest input.
    #[inline]
    pub fn pop(&mut self) -> Option<Inputs> {
        self.entries.pop_front()
    }

    /// Index of the first input sampled strictly after `timestamp`.
    #[must_use]
    pub fn first_newer_than(&self, timestamp: f32) -> Option<usize> {
        self.entries.position(|inputs| inputs.timestamp > timestamp)
    }

    /// Iterates the inputs from `index` onwards.
    pub fn iter_from(&self, index: usize) -> impl Iterator<Item = &Inputs> {
        self.entries.iter_from(index)
    }

    /// Iterates every buffered input, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Inputs> {
        self.entries.iter()
    }

    /// Drops the `count` oldest inputs.
    pub fn discard_front(&mut self, count: usize) -> usize {
        self.entries.drain_front(count)
    }

    /// Drops everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of buffered inputs.
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

    /// Returns true if the next push would be dropped.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.entries.is_full()
    }

    /// Maximum number of buffered inputs.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    /// Inputs rejected because the queue was full.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Prediction statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PredictionStats {
    /// Ticks predicted locally.
    pub predicted: u64,
    /// Inputs buffered for replay.
    pub buffered: u64,
    /// Non-trivial inputs dropped at a full queue.
    pub dropped: u64,
    /// Snapshots applied.
    pub snapshots_applied: u64,
    /// Stale or duplicate snapshots ignored.
    pub snapshots_rejected: u64,
    /// Inputs re-simulated during reconciliation.
    pub replayed: u64,
    /// Inputs pruned as acknowledged.
    pub discarded: u64,
}

/// Prediction state for the owned, non-authoritative entity.
#[derive(Clone, Debug)]
pub struct PredictionEngine {
    pose: Pose,
    queue: InputQueue,
    watermark: Watermark,
    stats: PredictionStats,
}

impl PredictionEngine {
    /// Creates an engine at the default pose.
    #[must_use]
    pub fn new(queue_capacity: usize) -> Self {
        Self::with_pose(Pose::default(), queue_capacity)
    }

    /// Creates an engine starting from `pose`.
    #[must_use]
    pub fn with_pose(pose: Pose, queue_capacity: usize) -> Self {
        Self {
            pose,
            queue: InputQueue::new(queue_capacity),
            watermark: Watermark::new(),
            stats: PredictionStats::default(),
        }
    }

    /// Predicts one tick of stamped `inputs`.
    ///
    /// The pose is updated with the raw input even when it is trivial. Returns
    /// the command to send to the authority, or `None` for an all-zero input.
    pub fn predict(&mut self, inputs: Inputs, kinematics: &dyn Kinematics) -> Option<InputCommand> {
        self.pose = kinematics.apply(&inputs, self.pose);
        self.stats.predicted += 1;

        let command = InputCommand::from_inputs(&inputs)?;
        if self.queue.push(inputs) {
            self.stats.buffered += 1;
        } else {
            self.stats.dropped += 1;
            tracing::debug!(
                timestamp = inputs.timestamp,
                capacity = self.queue.capacity(),
                "input queue full, dropping newest input"
            );
        }
        Some(command)
    }

    /// The predicted pose.
    #[inline]
    #[must_use]
    pub const fn pose(&self) -> Pose {
        self.pose
    }

    /// Inputs awaiting acknowledgement.
    #[must_use]
    pub const fn pending(&self) -> &InputQueue {
        &self.queue
    }

    /// Newest snapshot timestamp applied.
    #[must_use]
    pub const fn last_applied(&self) -> Option<f32> {
        self.watermark.last_applied()
    }

    /// Returns statistics.
    #[must_use]
    pub const fn stats(&self) -> &PredictionStats {
        &self.stats
    }
}
