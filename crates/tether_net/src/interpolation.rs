//! # Snapshot Interpolation
//!
//! Smooth playback of authoritative snapshots for peers that neither own nor
//! simulate an entity.
//!
//! ## Architecture
//! - Snapshots are buffered on arrival, stale ones dropped by the watermark
//! - Playback starts once two snapshots are buffered, so a single late packet
//!   does not stall it, and keeps going until the buffer runs dry
//! - Each snapshot becomes one segment: from wherever the entity is displayed
//!   now to the snapshot's pose, covered at a fixed rate per tick
//!
//! ```text
//! buffer:  [A] [B] [C]
//!           │
//! segment:  displayed ──0.4──0.8──1.0──▶ A   then   A ──▶ B   then   B ──▶ C
//! ```
//!
//! Starting each segment from the displayed pose, rather than from the
//! previous snapshot, is what keeps a late or missing snapshot from causing a
//! visible jump.

use tether_core::Pose;

use crate::config::SyncConfig;
use crate::protocol::Results;
use crate::snapshot::ResultBuffer;

/// Buffered snapshots required before playback starts.
pub const PLAYBACK_START_THRESHOLD: usize = 2;

/// Interpolation statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InterpolationStats {
    /// Snapshots buffered.
    pub accepted: u64,
    /// Stale or duplicate snapshots ignored.
    pub rejected: u64,
    /// Segments started.
    pub segments: u64,
    /// Ticks spent frozen waiting for data.
    pub paused_ticks: u64,
}

#[derive(Clone, Copy, Debug)]
struct Segment {
    start: Pose,
    target: Pose,
    progress: f32,
}

/// Playback state for one observed entity.
#[derive(Clone, Debug)]
pub struct InterpolationEngine {
    buffer: ResultBuffer,
    step: f32,
    pose: Pose,
    segment: Option<Segment>,
    playing: bool,
    stats: InterpolationStats,
}

impl InterpolationEngine {
    /// Creates an engine advancing `step` of a segment per tick.
    ///
    /// A non-positive or non-finite step snaps to each snapshot in one tick.
    #[must_use]
    pub fn new(step: f32, buffer_capacity: usize) -> Self {
        let step = if step.is_finite() && step > 0.0 { step } else { 1.0 };
        Self {
            buffer: ResultBuffer::new(buffer_capacity),
            step,
            pose: Pose::default(),
            segment: None,
            playing: false,
            stats: InterpolationStats::default(),
        }
    }

    /// Creates an engine from session configuration.
    #[must_use]
    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.interpolation_step(), config.result_buffer_capacity)
    }

    /// Sets the displayed pose before playback begins.
    #[must_use]
    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.pose = pose;
        self
    }

    /// Buffers a received snapshot.
    ///
    /// Returns false if it was not newer than the last one received.
    pub fn on_snapshot(&mut self, snapshot: Results) -> bool {
        if self.buffer.push(snapshot) {
            self.stats.accepted += 1;
            true
        } else {
            self.stats.rejected += 1;
            tracing::debug!(timestamp = snapshot.timestamp, "ignoring stale snapshot");
            false
        }
    }

    /// Advances playback by one tick and returns the pose to display.
    ///
    /// Progress is added before blending, so the first frame of a segment is
    /// already one step along and the last frame lands exactly on the target.
    /// With a step of 0.5 a segment shows 0.5 then 1.0 and takes two ticks.
    ///
    /// The start/pause decision is taken between segments only, so a segment
    /// in progress always runs to its target.
    pub fn tick(&mut self) -> Pose {
        if self.segment.is_none() && !self.begin_segment() {
            self.stats.paused_ticks += 1;
            return self.pose;
        }

        let mut finished = false;
        if let Some(segment) = self.segment.as_mut() {
            segment.progress = (segment.progress + self.step).min(1.0);
            self.pose = segment.start.interpolate(segment.target, segment.progress);
            finished = segment.progress >= 1.0;
        }
        if finished {
            self.segment = None;
        }
        self.pose
    }

    fn begin_segment(&mut self) -> bool {
        if self.buffer.is_empty() {
            self.playing = false;
        }
        if self.buffer.len() >= PLAYBACK_START_THRESHOLD {
            self.playing = true;
        }
        if !self.playing {
            return false;
        }
        let Some(target) = self.buffer.pop() else {
            return false;
        };
        self.segment = Some(Segment {
            start: self.pose,
            target: target.pose(),
            progress: 0.0,
        });
        self.stats.segments += 1;
        tracing::trace!(
            timestamp = target.timestamp,
            buffered = self.buffer.len(),
            "interpolation segment started"
        );
        true
    }

    /// The displayed pose.
    #[inline]
    #[must_use]
    pub const fn pose(&self) -> Pose {
        self.pose
    }

    /// Returns true while snapshots are being played back.
    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.playing
    }

    /// Progress through the current segment, if one is in flight.
    #[must_use]
    pub fn progress(&self) -> Option<f32> {
        self.segment.map(|segment| segment.progress)
    }

    /// Snapshots waiting to be played.
    #[must_use]
    pub const fn buffered(&self) -> &ResultBuffer {
        &self.buffer
    }

    /// Progress added per tick.
    #[must_use]
    pub const fn step(&self) -> f32 {
        self.step
    }

    /// Returns statistics.
    #[must_use]
    pub const fn stats(&self) -> &InterpolationStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::{Orientation, Position};

    fn at(x: f32, timestamp: f32) -> Results {
        Results::new(
            Pose::new(Position::new(x, 0.0, 0.0), Orientation::IDENTITY),
            timestamp,
        )
    }

    #[test]
    fn test_waits_for_two_snapshots() {
        let mut engine = InterpolationEngine::new(0.5, 64);
        engine.on_snapshot(at(10.0, 1.0));
        assert_eq!(engine.tick(), Pose::default());
        assert!(!engine.is_playing());

        engine.on_snapshot(at(20.0, 2.0));
        let pose = engine.tick();
        assert!(engine.is_playing());
        assert!((pose.position.x - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_segment_cadence() {
        let mut engine = InterpolationEngine::new(0.5, 64);
        engine.on_snapshot(at(10.0, 1.0));
        engine.on_snapshot(at(20.0, 2.0));

        let frames: Vec<f32> = (0..5).map(|_| engine.tick().position.x).collect();
        // Two ticks per segment, no repeated frame at the boundary, then frozen
        assert_eq!(frames, vec![5.0, 10.0, 15.0, 20.0, 20.0]);
        assert_eq!(engine.stats().segments, 2);
        assert_eq!(engine.stats().paused_ticks, 1);
    }

    #[test]
    fn test_duplicate_timestamp_scenario() {
        let mut engine = InterpolationEngine::new(0.4, 64);
        assert!(engine.on_snapshot(at(1.0, 10.0)));
        assert!(!engine.on_snapshot(at(2.0, 10.0)));
        assert!(engine.on_snapshot(at(3.0, 11.0)));

        let buffered: Vec<f32> = engine.buffered().iter().map(|r| r.position.x).collect();
        assert_eq!(buffered, vec![1.0, 3.0]);

        // 0.4, 0.8, 1.0 reaches A
        for _ in 0..3 {
            engine.tick();
        }
        assert_eq!(engine.pose().position, Position::new(1.0, 0.0, 0.0));

        // then A -> C, never B
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(engine.tick().position.x);
        }
        assert!(seen.iter().all(|x| (1.0..=3.0).contains(x)));
        assert_eq!(engine.pose().position, Position::new(3.0, 0.0, 0.0));
        assert_eq!(engine.stats().segments, 2);
    }

    #[test]
    fn test_progress_stays_in_segment() {
        let mut engine = InterpolationEngine::new(0.3, 64);
        for (x, timestamp) in [(10.0, 0.0), (20.0, 1.0), (30.0, 2.0)] {
            engine.on_snapshot(at(x, timestamp));
        }

        let mut previous = 0.0;
        for _ in 0..20 {
            let x = engine.tick().position.x;
            assert!(x >= previous - 1e-5);
            assert!(x <= 30.0 + 1e-5);
            if let Some(progress) = engine.progress() {
                assert!((0.0..=1.0).contains(&progress));
            }
            previous = x;
        }
        assert_eq!(engine.pose().position.x, 30.0);
    }

    #[test]
    fn test_freezes_when_dry_and_resumes() {
        let mut engine = InterpolationEngine::new(1.0, 64);
        engine.on_snapshot(at(1.0, 1.0));
        engine.on_snapshot(at(2.0, 2.0));
        engine.tick();
        engine.tick();
        assert_eq!(engine.pose().position.x, 2.0);

        // Dry: frozen
        engine.tick();
        assert!(!engine.is_playing());
        assert_eq!(engine.pose().position.x, 2.0);

        // One snapshot is not enough to restart
        engine.on_snapshot(at(3.0, 3.0));
        engine.tick();
        assert_eq!(engine.pose().position.x, 2.0);

        engine.on_snapshot(at(4.0, 4.0));
        engine.tick();
        assert_eq!(engine.pose().position.x, 3.0);
        assert!(engine.stats().paused_ticks >= 2);
    }

    #[test]
    fn test_continues_down_to_one() {
        let mut engine = InterpolationEngine::new(1.0, 64);
        engine.on_snapshot(at(1.0, 1.0));
        engine.on_snapshot(at(2.0, 2.0));
        engine.tick();
        assert_eq!(engine.buffered().len(), 1);
        // Still playing with a single entry left
        assert_eq!(engine.tick().position.x, 2.0);
    }

    #[test]
    fn test_bad_step_snaps() {
        let engine = InterpolationEngine::new(f32::NAN, 8);
        assert_eq!(engine.step(), 1.0);
    }
}
