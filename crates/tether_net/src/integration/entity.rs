//! # Networked Entity
//!
//! One synchronized entity as seen by one peer. Picks the engine that matches
//! the peer's role and routes ticks and inbound packets to it.

use tether_core::Pose;

use crate::authority::{AuthorityEngine, HostEngine};
use crate::config::SyncConfig;
use crate::error::{SyncResult, WireError};
use crate::integration::{InputSampler, Kinematics, PoseSink};
use crate::interpolation::InterpolationEngine;
use crate::prediction::{PredictionEngine, ReconciliationResult};
use crate::protocol::{InputCommand, Packet, PacketDeserializer, Results};
use crate::role::PeerRole;
use crate::snapshot::SnapshotThrottle;
use crate::transport::Transport;

/// Role-specific state.
#[derive(Clone, Debug)]
enum Engine {
    Host(HostEngine),
    Predicting(PredictionEngine),
    Remote(AuthorityEngine),
    Observer(InterpolationEngine),
}

/// A synchronized entity on one peer.
///
/// Drive it with [`NetworkedEntity::tick`] once per fixed tick and feed it
/// inbound packets as they arrive, in any order relative to ticks.
#[derive(Clone, Debug)]
pub struct NetworkedEntity<K> {
    role: PeerRole,
    kinematics: K,
    engine: Engine,
    throttle: SnapshotThrottle,
}

impl<K: Kinematics> NetworkedEntity<K> {
    /// Creates an entity at the default pose.
    #[must_use]
    pub fn new(role: PeerRole, kinematics: K, config: &SyncConfig) -> Self {
        Self::with_pose(role, kinematics, config, Pose::default())
    }

    /// Creates an entity starting from `pose`.
    #[must_use]
    pub fn with_pose(role: PeerRole, kinematics: K, config: &SyncConfig, pose: Pose) -> Self {
        let engine = match role {
            PeerRole::Host => Engine::Host(HostEngine::with_pose(pose)),
            PeerRole::PredictingClient => Engine::Predicting(PredictionEngine::with_pose(
                pose,
                config.input_queue_capacity,
            )),
            PeerRole::RemoteSimulator => Engine::Remote(AuthorityEngine::with_pose(
                pose,
                config.input_queue_capacity,
            )),
            PeerRole::Observer => {
                Engine::Observer(InterpolationEngine::from_config(config).with_pose(pose))
            }
        };
        Self {
            role,
            kinematics,
            engine,
            throttle: SnapshotThrottle::new(config.snapshot_send_interval),
        }
    }

    /// Runs one fixed tick at simulation time `now`.
    ///
    /// Owners sample `sampler` exactly once; other roles never touch it.
    /// Authorities release at most one snapshot per send interval. The
    /// resulting pose is pushed to `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error only if `transport` fails to send.
    pub fn tick(
        &mut self,
        now: f32,
        sampler: &mut dyn InputSampler,
        transport: &mut dyn Transport,
        sink: &mut dyn PoseSink,
    ) -> SyncResult<()> {
        match &mut self.engine {
            Engine::Host(host) => {
                let inputs = sampler.sample_inputs().stamped(now);
                if let Some(snapshot) = host.step(inputs, &self.kinematics) {
                    self.throttle.offer(snapshot);
                }
            }
            Engine::Predicting(prediction) => {
                let inputs = sampler.sample_inputs().stamped(now);
                if let Some(command) = prediction.predict(inputs, &self.kinematics) {
                    transport.send_command(command)?;
                }
            }
            Engine::Remote(authority) => {
                if let Some(snapshot) = authority.tick(&self.kinematics) {
                    self.throttle.offer(snapshot);
                }
            }
            Engine::Observer(interpolation) => {
                interpolation.tick();
            }
        }

        if self.role.has_authority() {
            if let Some(snapshot) = self.throttle.poll(now) {
                transport.send_snapshot(snapshot)?;
            }
        }

        let pose = self.pose();
        sink.update_position(pose.position);
        sink.update_orientation(pose.orientation);
        Ok(())
    }

    /// Handles a command from the owner.
    ///
    /// Only a remote simulator accepts commands; every other role ignores
    /// them. Returns true if the command was queued.
    pub fn on_command_received(&mut self, command: InputCommand) -> bool {
        if let Engine::Remote(authority) = &mut self.engine {
            authority.on_command_received(command)
        } else {
            tracing::debug!(role = ?self.role, "ignoring command for non-simulating role");
            false
        }
    }

    /// Handles a snapshot from the authority.
    ///
    /// The predicting owner reconciles, an observer buffers, authorities
    /// ignore it. Returns true if the snapshot was applied or buffered.
    pub fn on_snapshot_received(&mut self, snapshot: Results) -> bool {
        match &mut self.engine {
            Engine::Predicting(prediction) => {
                prediction.reconcile(&snapshot, &self.kinematics)
                    != ReconciliationResult::Rejected
            }
            Engine::Observer(interpolation) => interpolation.on_snapshot(snapshot),
            Engine::Host(_) | Engine::Remote(_) => false,
        }
    }

    /// Routes a decoded packet.
    pub fn handle_packet(&mut self, packet: Packet) -> bool {
        match packet {
            Packet::Command(command) => self.on_command_received(command),
            Packet::Snapshot(snapshot) => self.on_snapshot_received(snapshot),
        }
    }

    /// Decodes and routes raw packet bytes.
    ///
    /// # Errors
    ///
    /// Returns [`WireError`] for malformed bytes; nothing is applied then.
    pub fn receive(&mut self, bytes: &[u8]) -> Result<bool, WireError> {
        let packet = PacketDeserializer::new(bytes).deserialize()?;
        Ok(self.handle_packet(packet))
    }

    /// The pose this peer currently shows for the entity.
    #[must_use]
    pub fn pose(&self) -> Pose {
        match &self.engine {
            Engine::Host(host) => host.pose(),
            Engine::Predicting(prediction) => prediction.pose(),
            Engine::Remote(authority) => authority.pose(),
            Engine::Observer(interpolation) => interpolation.pose(),
        }
    }

    /// This peer's role.
    #[must_use]
    pub const fn role(&self) -> PeerRole {
        self.role
    }

    /// The movement strategy.
    #[must_use]
    pub const fn kinematics(&self) -> &K {
        &self.kinematics
    }

    /// Prediction state, when this peer is the predicting owner.
    #[must_use]
    pub const fn prediction(&self) -> Option<&PredictionEngine> {
        match &self.engine {
            Engine::Predicting(prediction) => Some(prediction),
            _ => None,
        }
    }

    /// Authority state, when this peer simulates a remote owner.
    #[must_use]
    pub const fn authority(&self) -> Option<&AuthorityEngine> {
        match &self.engine {
            Engine::Remote(authority) => Some(authority),
            _ => None,
        }
    }

    /// Host state, when this peer owns and simulates the entity.
    #[must_use]
    pub const fn host(&self) -> Option<&HostEngine> {
        match &self.engine {
            Engine::Host(host) => Some(host),
            _ => None,
        }
    }

    /// Playback state, when this peer only observes.
    #[must_use]
    pub const fn interpolation(&self) -> Option<&InterpolationEngine> {
        match &self.engine {
            Engine::Observer(interpolation) => Some(interpolation),
            _ => None,
        }
    }

    /// Outgoing snapshot pacing. Idle for non-authoritative roles.
    #[must_use]
    pub const fn throttle(&self) -> &SnapshotThrottle {
        &self.throttle
    }
}
