//! Rewind-and-replay reconciliation.

use crate::integration::Kinematics;
use crate::protocol::Results;

use super::PredictionEngine;

/// Outcome of applying one snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconciliationResult {
    /// The snapshot was not newer than the last one applied; nothing changed.
    Rejected,
    /// No buffered input was newer than the snapshot. The pose was snapped and
    /// the queue emptied.
    Cleared {
        /// Inputs dropped as acknowledged.
        discarded: usize,
    },
    /// The pose was snapped and the newer inputs replayed on top.
    Replayed {
        /// Inputs re-simulated.
        replayed: usize,
        /// Inputs dropped as acknowledged.
        discarded: usize,
    },
}

impl PredictionEngine {
    /// Applies an authoritative snapshot.
    ///
    /// Stale and duplicate snapshots are ignored, which makes this idempotent.
    /// Otherwise the pose is replaced with the snapshot's and every buffered
    /// input sampled after it is replayed, oldest first. Acknowledged inputs
    /// are removed; the replayed ones stay buffered for the next snapshot.
    pub fn reconcile(
        &mut self,
        snapshot: &Results,
        kinematics: &dyn Kinematics,
    ) -> ReconciliationResult {
        if !self.watermark.advance(snapshot.timestamp) {
            self.stats.snapshots_rejected += 1;
            tracing::debug!(
                timestamp = snapshot.timestamp,
                last_applied = ?self.watermark.last_applied(),
                "ignoring stale snapshot"
            );
            return ReconciliationResult::Rejected;
        }
        self.stats.snapshots_applied += 1;
        self.pose = snapshot.pose();

        let Some(first_newer) = self.queue.first_newer_than(snapshot.timestamp) else {
            let discarded = self.queue.len();
            self.queue.clear();
            self.stats.discarded += discarded as u64;
            return ReconciliationResult::Cleared { discarded };
        };

        self.pose = self
            .queue
            .iter_from(first_newer)
            .fold(self.pose, |pose, inputs| kinematics.apply(inputs, pose));

        let replayed = self.queue.len() - first_newer;
        let discarded = self.queue.discard_front(first_newer);
        self.stats.replayed += replayed as u64;
        self.stats.discarded += discarded as u64;

        tracing::trace!(replayed, discarded, "reconciled with snapshot");
        ReconciliationResult::Replayed {
            replayed,
            discarded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Inputs;
    use crate::WalkerKinematics;
    use tether_core::{Orientation, Pose, Position};

    /// Order-sensitive toy movement: x' = 2x + forward.
    struct Doubling;

    impl Kinematics for Doubling {
        fn translate(&self, forward: f32, _: f32, current: Position, _: Orientation) -> Position {
            Position::new(current.x * 2.0 + forward, current.y, current.z)
        }

        fn rotate(&self, _: f32, _: f32, current: Orientation) -> Orientation {
            current
        }
    }

    fn snapshot_at(x: f32, timestamp: f32) -> Results {
        Results::new(
            Pose::new(Position::new(x, 0.0, 0.0), Orientation::IDENTITY),
            timestamp,
        )
    }

    #[test]
    fn test_snap_and_replay_one() {
        let kin = WalkerKinematics::default();
        let mut engine = PredictionEngine::new(100);
        for t in [1.0, 2.0, 3.0] {
            engine.predict(Inputs::movement(1.0, 0.0).stamped(t), &kin);
        }

        let authoritative = Pose::new(Position::new(0.0, 0.0, 0.12), Orientation::IDENTITY);
        let result = engine.reconcile(&Results::new(authoritative, 2.0), &kin);

        assert_eq!(
            result,
            ReconciliationResult::Replayed {
                replayed: 1,
                discarded: 2
            }
        );
        let stamps: Vec<f32> = engine.pending().iter().map(|i| i.timestamp).collect();
        assert_eq!(stamps, vec![3.0]);

        let expected = kin.apply(&Inputs::movement(1.0, 0.0), authoritative);
        assert_eq!(engine.pose(), expected);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let kin = WalkerKinematics::default();
        let mut engine = PredictionEngine::new(100);
        for t in [1.0, 2.0, 3.0] {
            engine.predict(Inputs::movement(1.0, 0.0).stamped(t), &kin);
        }

        let snapshot = snapshot_at(4.0, 2.0);
        engine.reconcile(&snapshot, &kin);
        let pose = engine.pose();
        let pending = engine.pending().len();

        assert_eq!(engine.reconcile(&snapshot, &kin), ReconciliationResult::Rejected);
        assert_eq!(engine.pose(), pose);
        assert_eq!(engine.pending().len(), pending);
        assert_eq!(engine.stats().snapshots_rejected, 1);
    }

    #[test]
    fn test_replays_newer_inputs_in_order() {
        let kin = Doubling;
        let mut engine = PredictionEngine::new(100);
        let base = 10.0;
        for (offset, forward) in [(-1.0, 7.0), (0.0, 9.0), (1.0, 1.0), (3.0, 3.0), (5.0, 5.0)] {
            engine.predict(Inputs::movement(forward, 0.0).stamped(base + offset), &kin);
        }

        let result = engine.reconcile(&snapshot_at(0.0, base), &kin);

        assert_eq!(
            result,
            ReconciliationResult::Replayed {
                replayed: 3,
                discarded: 2
            }
        );
        // ((0*2 + 1)*2 + 3)*2 + 5
        assert!((engine.pose().position.x - 15.0).abs() < f32::EPSILON);
        assert!(engine.pending().iter().all(|i| i.timestamp > base));
    }

    #[test]
    fn test_full_queue_replay_boundary() {
        let kin = WalkerKinematics::default();
        let fill = |first_tick: u16| {
            let mut engine = PredictionEngine::new(crate::INPUT_QUEUE_CAPACITY);
            for tick in first_tick..first_tick + 100 {
                engine.predict(Inputs::movement(1.0, 0.0).stamped(f32::from(tick) * 0.02), &kin);
            }
            engine
        };
        let origin = Results::default();

        // Every input sampled after the snapshot replays
        assert_eq!(
            fill(1).reconcile(&origin, &kin),
            ReconciliationResult::Replayed {
                replayed: 100,
                discarded: 0
            }
        );
        // An input stamped at the snapshot time is already acknowledged
        assert_eq!(
            fill(0).reconcile(&origin, &kin),
            ReconciliationResult::Replayed {
                replayed: 99,
                discarded: 1
            }
        );
    }

    #[test]
    fn test_nothing_newer_clears_queue() {
        let kin = WalkerKinematics::default();
        let mut engine = PredictionEngine::new(100);
        engine.predict(Inputs::movement(1.0, 0.0).stamped(1.0), &kin);
        engine.predict(Inputs::movement(1.0, 0.0).stamped(2.0), &kin);

        let result = engine.reconcile(&snapshot_at(3.0, 2.0), &kin);

        assert_eq!(result, ReconciliationResult::Cleared { discarded: 2 });
        assert!(engine.pending().is_empty());
        assert_eq!(engine.pose().position, Position::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_out_of_order_snapshots() {
        let kin = WalkerKinematics::default();
        let mut engine = PredictionEngine::new(100);

        assert!(matches!(
            engine.reconcile(&snapshot_at(5.0, 5.0), &kin),
            ReconciliationResult::Cleared { .. }
        ));
        assert_eq!(
            engine.reconcile(&snapshot_at(4.0, 4.0), &kin),
            ReconciliationResult::Rejected
        );
        assert_eq!(engine.pose().position.x, 5.0);
        assert_eq!(engine.last_applied(), Some(5.0));
    }
}
