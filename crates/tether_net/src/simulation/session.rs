//! # Loopback Session
//!
//! A whole client-server session in one process: a predicting owner, the
//! authority simulating it, and one observer, wired through simulated links.
//!
//! ```text
//!          reliable uplink                 unreliable downlink
//! OWNER ──────────────────▶ AUTHORITY ───────────────────────▶ OBSERVER
//!   ▲                          │
//!   └──────────────────────────┘
//!        unreliable downlink
//! ```
//!
//! Every message is encoded by the sender's [`ChannelTransport`], carried as
//! bytes through a [`LossyLink`] and decoded by the receiving entity, so a
//! session exercises the same path a real deployment would.

use tether_core::Pose;

use crate::authority::TickLoop;
use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::integration::{
    IdleSampler, InputSampler, NetworkedEntity, RecordingSink, WalkerKinematics,
};
use crate::role::PeerRole;
use crate::transport::{ChannelTransport, Mailbox};

use super::{LossyLink, NetworkConditions};

/// Session counters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SessionStats {
    /// Ticks run.
    pub ticks: u64,
    /// Packets that failed to decode at a receiver.
    pub decode_errors: u64,
    /// Largest owner-to-authority position error seen at the end of a tick.
    pub max_owner_error: f32,
    /// Largest observer-to-authority position error seen at the end of a tick.
    pub max_observer_error: f32,
}

struct Peer {
    entity: NetworkedEntity<WalkerKinematics>,
    transport: ChannelTransport,
    outbox: Mailbox,
    sink: RecordingSink,
}

impl Peer {
    fn new(role: PeerRole, config: &SyncConfig) -> Self {
        let (transport, outbox) = ChannelTransport::unbounded();
        Self {
            entity: NetworkedEntity::new(role, WalkerKinematics::from_config(config), config),
            transport,
            outbox,
            sink: RecordingSink::new(),
        }
    }

    fn tick(&mut self, now: f32, sampler: &mut dyn InputSampler) -> SyncResult<()> {
        self.entity.tick(now, sampler, &mut self.transport, &mut self.sink)
    }

    fn deliver(&mut self, link: &mut LossyLink, now: f32, stats: &mut SessionStats) {
        while let Some(envelope) = link.poll(now) {
            if let Err(error) = self.entity.receive(&envelope.bytes) {
                stats.decode_errors += 1;
                tracing::debug!(%error, role = ?self.entity.role(), "dropping undecodable packet");
            }
        }
    }
}

/// Owner, authority and observer of one entity over simulated links.
pub struct LoopbackSession<S> {
    config: SyncConfig,
    clock: TickLoop,
    sampler: S,
    owner: Peer,
    authority: Peer,
    observer: Peer,
    uplink: LossyLink,
    to_owner: LossyLink,
    to_observer: LossyLink,
    stats: SessionStats,
}

impl<S: InputSampler> LoopbackSession<S> {
    /// Creates a session. `sampler` drives the owner; `seed` fixes every
    /// random choice the links make.
    #[must_use]
    pub fn new(config: SyncConfig, conditions: NetworkConditions, sampler: S, seed: u64) -> Self {
        tracing::info!(
            tick_rate = config.tick_rate,
            latency_ms = conditions.base_latency_ms,
            loss_percent = conditions.packet_loss_percent,
            seed,
            "loopback session started"
        );
        Self {
            owner: Peer::new(PeerRole::PredictingClient, &config),
            authority: Peer::new(PeerRole::RemoteSimulator, &config),
            observer: Peer::new(PeerRole::Observer, &config),
            uplink: LossyLink::reliable(conditions, seed),
            to_owner: LossyLink::unreliable(conditions, seed.wrapping_add(1)),
            to_observer: LossyLink::unreliable(conditions, seed.wrapping_add(2)),
            clock: TickLoop::new(config.tick_rate),
            config,
            sampler,
            stats: SessionStats::default(),
        }
    }

    /// Simulation time of the next tick.
    #[must_use]
    pub fn now(&self) -> f32 {
        self.clock.sim_time()
    }

    /// Runs one tick on every peer.
    ///
    /// Inbound packets due by now are delivered first, then each peer ticks,
    /// then everything sent this tick is put on the wire.
    pub fn tick(&mut self) {
        let now = self.clock.advance();

        self.authority.deliver(&mut self.uplink, now, &mut self.stats);
        self.owner.deliver(&mut self.to_owner, now, &mut self.stats);
        self.observer.deliver(&mut self.to_observer, now, &mut self.stats);

        let mut idle = IdleSampler;
        let sent = [
            self.owner.tick(now, &mut self.sampler),
            self.authority.tick(now, &mut idle),
            self.observer.tick(now, &mut idle),
        ];
        // Outboxes live as long as the session, so this only fires on a codec bug
        for error in sent.into_iter().filter_map(Result::err) {
            tracing::warn!(%error, "send failed");
        }

        for envelope in self.owner.outbox.drain() {
            self.uplink.send(now, envelope);
        }
        for envelope in self.authority.outbox.drain() {
            self.to_owner.send(now, envelope.clone());
            self.to_observer.send(now, envelope);
        }

        self.stats.ticks = self.clock.tick_count();
        self.stats.max_owner_error = self.stats.max_owner_error.max(self.owner_error());
        self.stats.max_observer_error = self.stats.max_observer_error.max(self.observer_error());
    }

    /// Runs `ticks` ticks.
    pub fn run(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    /// Runs `ticks` ticks paced at the configured rate on the wall clock.
    ///
    /// Packets are still stamped with simulation time, so a paced run sends
    /// and delivers exactly what [`run`](Self::run) would.
    pub fn run_realtime(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.clock.wait_for_next_tick();
            self.tick();
        }
    }

    /// Keeps ticking until nothing is in flight or pending anywhere, up to
    /// `max_ticks`. Returns the number of ticks run.
    pub fn settle(&mut self, max_ticks: usize) -> usize {
        let mut ran = 0;
        while ran < max_ticks && !self.is_quiescent() {
            self.tick();
            ran += 1;
        }
        tracing::info!(
            ticks = ran,
            owner_error = self.owner_error(),
            observer_error = self.observer_error(),
            "session settled"
        );
        ran
    }

    /// Returns true once no packet is in flight, no command is waiting at
    /// the authority, no snapshot is waiting to be sent and the observer has
    /// finished playback.
    #[must_use]
    pub fn is_quiescent(&self) -> bool {
        let links_idle =
            self.uplink.is_idle() && self.to_owner.is_idle() && self.to_observer.is_idle();
        let authority_idle = self
            .authority
            .entity
            .authority()
            .map_or(true, |a| a.queued().is_empty())
            && !self.authority.entity.throttle().has_pending();
        let observer_idle = self
            .observer
            .entity
            .interpolation()
            .map_or(true, |i| i.buffered().is_empty() && i.progress().is_none());
        links_idle && authority_idle && observer_idle
    }

    /// Distance between the owner's and the authority's positions.
    #[must_use]
    pub fn owner_error(&self) -> f32 {
        self.owner_pose()
            .position
            .distance(self.authority_pose().position)
    }

    /// Distance between the observer's and the authority's positions.
    #[must_use]
    pub fn observer_error(&self) -> f32 {
        self.observer_pose()
            .position
            .distance(self.authority_pose().position)
    }

    /// The owner's predicted pose.
    #[must_use]
    pub fn owner_pose(&self) -> Pose {
        self.owner.entity.pose()
    }

    /// The authoritative pose.
    #[must_use]
    pub fn authority_pose(&self) -> Pose {
        self.authority.entity.pose()
    }

    /// The observer's displayed pose.
    #[must_use]
    pub fn observer_pose(&self) -> Pose {
        self.observer.entity.pose()
    }

    /// The owning peer's entity.
    #[must_use]
    pub const fn owner(&self) -> &NetworkedEntity<WalkerKinematics> {
        &self.owner.entity
    }

    /// The authority's entity.
    #[must_use]
    pub const fn authority(&self) -> &NetworkedEntity<WalkerKinematics> {
        &self.authority.entity
    }

    /// The observer's entity.
    #[must_use]
    pub const fn observer(&self) -> &NetworkedEntity<WalkerKinematics> {
        &self.observer.entity
    }

    /// Every pose the observer displayed, one per tick.
    #[must_use]
    pub fn observer_frames(&self) -> &RecordingSink {
        &self.observer.sink
    }

    /// Links in order: uplink, owner downlink, observer downlink.
    #[must_use]
    pub const fn links(&self) -> [&LossyLink; 3] {
        [&self.uplink, &self.to_owner, &self.to_observer]
    }

    /// Configuration every peer was built from.
    #[must_use]
    pub const fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The session clock.
    #[must_use]
    pub const fn clock(&self) -> &TickLoop {
        &self.clock
    }

    /// Returns statistics.
    #[must_use]
    pub const fn stats(&self) -> &SessionStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::ScriptedSampler;
    use crate::protocol::Inputs;

    #[test]
    fn test_perfect_network_converges() {
        let sampler = ScriptedSampler::repeating(Inputs::movement(1.0, 0.0), 30);
        let mut session =
            LoopbackSession::new(SyncConfig::default(), NetworkConditions::PERFECT, sampler, 1);

        session.run(30);
        assert!(session.owner_pose().position.z > 1.0);

        session.settle(200);
        assert!(session.is_quiescent());
        assert!(session.owner_error() < 1e-4);
        assert!(session.observer_error() < 1e-4);
        assert_eq!(session.stats().decode_errors, 0);
    }

    #[test]
    fn test_owner_never_waits_for_the_server() {
        let sampler = ScriptedSampler::repeating(Inputs::movement(1.0, 0.0), 5);
        let mut session =
            LoopbackSession::new(SyncConfig::default(), NetworkConditions::POOR, sampler, 5);

        session.tick();
        // Moved on the first tick, long before any reply could arrive
        assert!(session.owner_pose().position.z > 0.0);
        assert_eq!(session.authority_pose(), Pose::default());
    }

    #[test]
    fn test_session_clock_stamps_ticks() {
        let sampler = ScriptedSampler::repeating(Inputs::movement(1.0, 0.0), 10);
        let mut session =
            LoopbackSession::new(SyncConfig::default(), NetworkConditions::PERFECT, sampler, 3);
        assert_eq!(session.now(), 0.0);

        session.run(3);
        assert_eq!(session.clock().tick_count(), 3);
        assert_eq!(session.stats().ticks, 3);
        assert!((session.now() - 0.06).abs() < 1e-6);
        let tick = session.clock().tick_duration().as_secs_f32();
        assert!((tick - session.config().tick_duration()).abs() < 1e-9);
    }

    #[test]
    fn test_realtime_run_matches_unpaced_run() {
        let config = SyncConfig {
            tick_rate: 200,
            ..SyncConfig::default()
        };
        let run = |paced: bool| {
            let sampler = ScriptedSampler::repeating(Inputs::movement(1.0, 0.0), 10);
            let mut session =
                LoopbackSession::new(config.clone(), NetworkConditions::GOOD, sampler, 8);
            if paced {
                session.run_realtime(10);
            } else {
                session.run(10);
            }
            (session.owner_pose(), session.authority_pose(), session.now())
        };
        assert_eq!(run(true), run(false));
    }

    #[test]
    fn test_same_seed_same_session() {
        let run = || {
            let sampler = ScriptedSampler::repeating(Inputs::new(1.0, 0.5, 40.0, -5.0), 60);
            let mut session =
                LoopbackSession::new(SyncConfig::default(), NetworkConditions::POOR, sampler, 11);
            session.run(120);
            (session.owner_pose(), session.observer_pose())
        };
        assert_eq!(run(), run());
    }
}
