//! # Authority
//!
//! Computes the canonical state of an entity and decides when the rest of
//! the session needs to hear about it.
//!
//! ## Design
//!
//! - A remote owner's commands are clamped, queued and consumed one per tick
//! - The host simulates its own fresh input directly, no queue
//! - Either way a snapshot is produced only when the pose observably changed
//!
//! ```text
//! command ──clamp──▶ [queue] ──pop 1/tick──▶ kinematics ──changed?──▶ Results
//!                                                             └─no──▶ (nothing)
//! ```

mod tick;

use tether_core::Pose;

use crate::integration::Kinematics;
use crate::prediction::InputQueue;
use crate::protocol::{InputCommand, Inputs, Results};

pub use tick::{TickLoop, TickStats};

/// Authority statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AuthorityStats {
    /// Commands accepted into the queue.
    pub received: u64,
    /// Commands dropped because the queue was full.
    pub overflowed: u64,
    /// Ticks that consumed an input.
    pub simulated: u64,
    /// Ticks skipped because nothing was queued.
    pub idle_ticks: u64,
    /// Snapshots produced.
    pub emitted: u64,
    /// Simulated ticks that left the pose unchanged.
    pub suppressed: u64,
}

/// Applies `inputs` and returns the new pose plus a snapshot if it changed.
fn simulate(
    pose: Pose,
    inputs: &Inputs,
    kinematics: &dyn Kinematics,
    stats: &mut AuthorityStats,
) -> (Pose, Option<Results>) {
    let next = kinematics.apply(inputs, pose);
    stats.simulated += 1;
    if next.changed_from(pose) {
        stats.emitted += 1;
        (next, Some(Results::new(next, inputs.timestamp)))
    } else {
        stats.suppressed += 1;
        (next, None)
    }
}

/// Authority for an entity owned by a remote peer.
#[derive(Clone, Debug)]
pub struct AuthorityEngine {
    pose: Pose,
    queue: InputQueue,
    stats: AuthorityStats,
}

impl AuthorityEngine {
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
            stats: AuthorityStats::default(),
        }
    }

    /// Queues a command received from the owner.
    ///
    /// Movement axes are clamped to `[-1, 1]` here; rotation rates are taken
    /// as sent.
    ///
    /// The owner already stops buffering at the queue capacity, so a full
    /// queue here means the sender ignored that cap. The command is dropped,
    /// logged at `warn`, counted in [`AuthorityStats::overflowed`] and false
    /// is returned. Everything already queued is still consumed, one per tick.
    pub fn on_command_received(&mut self, command: InputCommand) -> bool {
        self.enqueue(command.to_inputs())
    }

    /// Queues already-expanded inputs, clamping movement axes.
    pub fn enqueue(&mut self, inputs: Inputs) -> bool {
        if self.queue.push(inputs.clamped()) {
            self.stats.received += 1;
            true
        } else {
            self.stats.overflowed += 1;
            tracing::warn!(
                timestamp = inputs.timestamp,
                capacity = self.queue.capacity(),
                "authority input queue full, dropping command"
            );
            false
        }
    }

    /// Consumes the oldest queued input, if any.
    ///
    /// Returns a snapshot stamped with the consumed input's timestamp when the
    /// pose changed.
    pub fn tick(&mut self, kinematics: &dyn Kinematics) -> Option<Results> {
        let Some(inputs) = self.queue.pop() else {
            self.stats.idle_ticks += 1;
            tracing::debug!("no queued input, skipping tick");
            return None;
        };
        let (pose, snapshot) = simulate(self.pose, &inputs, kinematics, &mut self.stats);
        self.pose = pose;
        snapshot
    }

    /// The authoritative pose.
    #[inline]
    #[must_use]
    pub const fn pose(&self) -> Pose {
        self.pose
    }

    /// Commands waiting to be simulated.
    #[must_use]
    pub const fn queued(&self) -> &InputQueue {
        &self.queue
    }

    /// Returns statistics.
    #[must_use]
    pub const fn stats(&self) -> &AuthorityStats {
        &self.stats
    }
}

/// Authority for an entity owned by the same peer.
///
/// Simulates the freshly sampled input every tick; there is nothing to queue
/// and nothing to reconcile.
#[derive(Clone, Debug, Default)]
pub struct HostEngine {
    pose: Pose,
    stats: AuthorityStats,
}

impl HostEngine {
    /// Creates an engine starting from `pose`.
    #[must_use]
    pub fn with_pose(pose: Pose) -> Self {
        Self {
            pose,
            stats: AuthorityStats::default(),
        }
    }

    /// Simulates one tick of stamped `inputs`.
    ///
    /// Returns a snapshot when the pose changed.
    pub fn step(&mut self, inputs: Inputs, kinematics: &dyn Kinematics) -> Option<Results> {
        let (pose, snapshot) = simulate(self.pose, &inputs, kinematics, &mut self.stats);
        self.pose = pose;
        snapshot
    }

    /// The authoritative pose.
    #[inline]
    #[must_use]
    pub const fn pose(&self) -> Pose {
        self.pose
    }

    /// Returns statistics.
    #[must_use]
    pub const fn stats(&self) -> &AuthorityStats {
        &self.stats
    }
}
