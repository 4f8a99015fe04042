//! # Transport Layer
//!
//! The two logical channels between peers and in-process implementations of
//! them.
//!
//! ## Design
//!
//! - Commands go out on the reliable channel (ordered, never dropped)
//! - Snapshots go out on the unreliable channel (may be lost, duplicated or
//!   reordered; receivers rely on their watermark)
//! - Everything crossing a [`Transport`] is encoded with the packet codec, so
//!   in-process sessions exercise the same bytes a socket would carry

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::error::{TransportError, WireError};
use crate::integration::{Kinematics, NetworkedEntity};
use crate::protocol::{InputCommand, Packet, PacketDeserializer, PacketSerializer, Results};

/// Delivery guarantees of a logical channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    /// In order, exactly once.
    Reliable,
    /// Best effort.
    Unreliable,
}

/// Outbound side of a peer's connection.
pub trait Transport {
    /// Sends an input command to the authority on the reliable channel.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the channel is gone.
    fn send_command(&mut self, command: InputCommand) -> Result<(), TransportError>;

    /// Broadcasts a snapshot on the unreliable channel.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the channel is gone.
    fn send_snapshot(&mut self, snapshot: Results) -> Result<(), TransportError>;
}

/// One encoded packet tagged with its channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    /// Channel the packet travels on.
    pub channel: Channel,
    /// Encoded packet.
    pub bytes: Vec<u8>,
}

impl Envelope {
    /// Decodes the carried packet.
    ///
    /// # Errors
    ///
    /// Returns [`WireError`] for malformed bytes.
    pub fn decode(&self) -> Result<Packet, WireError> {
        PacketDeserializer::new(&self.bytes).deserialize()
    }
}

/// Transport statistics.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransportStats {
    /// Packets sent.
    pub packets_sent: u64,
    /// Packets received.
    pub packets_received: u64,
    /// Bytes sent.
    pub bytes_sent: u64,
    /// Bytes received.
    pub bytes_received: u64,
    /// Send errors.
    pub send_errors: u64,
    /// Packets that failed to decode.
    pub decode_errors: u64,
}

/// [`Transport`] that encodes packets into a crossbeam channel.
///
/// The receiving [`Mailbox`] may live on another thread.
pub struct ChannelTransport {
    sender: Sender<Envelope>,
    serializer: PacketSerializer,
    stats: TransportStats,
}

impl ChannelTransport {
    /// Wraps an existing sender.
    #[must_use]
    pub fn new(sender: Sender<Envelope>) -> Self {
        Self {
            sender,
            serializer: PacketSerializer::new(),
            stats: TransportStats::default(),
        }
    }

    /// Creates a connected transport and mailbox.
    #[must_use]
    pub fn unbounded() -> (Self, Mailbox) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self::new(sender), Mailbox::new(receiver))
    }

    fn push(&mut self, channel: Channel, packet: &Packet) -> Result<(), TransportError> {
        let bytes = match self.serializer.serialize(packet) {
            Ok(bytes) => bytes.to_vec(),
            Err(error) => {
                self.stats.send_errors += 1;
                return Err(TransportError::Encode(error));
            }
        };
        let len = bytes.len() as u64;
        if self.sender.send(Envelope { channel, bytes }).is_err() {
            self.stats.send_errors += 1;
            return Err(TransportError::Disconnected(channel));
        }
        self.stats.packets_sent += 1;
        self.stats.bytes_sent += len;
        Ok(())
    }

    /// Returns statistics.
    #[must_use]
    pub const fn stats(&self) -> &TransportStats {
        &self.stats
    }
}

impl Transport for ChannelTransport {
    fn send_command(&mut self, command: InputCommand) -> Result<(), TransportError> {
        self.push(Channel::Reliable, &Packet::Command(command))
    }

    fn send_snapshot(&mut self, snapshot: Results) -> Result<(), TransportError> {
        self.push(Channel::Unreliable, &Packet::Snapshot(snapshot))
    }
}

/// Receiving end of a [`ChannelTransport`].
pub struct Mailbox {
    receiver: Receiver<Envelope>,
    stats: TransportStats,
}

impl Mailbox {
    /// Wraps an existing receiver.
    #[must_use]
    pub fn new(receiver: Receiver<Envelope>) -> Self {
        Self {
            receiver,
            stats: TransportStats::default(),
        }
    }

    /// Takes the next envelope without blocking.
    ///
    /// Returns `None` when nothing is waiting or every sender is gone.
    pub fn recv(&mut self) -> Option<Envelope> {
        match self.receiver.try_recv() {
            Ok(envelope) => {
                self.stats.packets_received += 1;
                self.stats.bytes_received += envelope.bytes.len() as u64;
                Some(envelope)
            }
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Takes every envelope currently waiting.
    pub fn drain(&mut self) -> impl Iterator<Item = Envelope> + '_ {
        std::iter::from_fn(move || self.recv())
    }

    /// Takes every waiting envelope and decodes it, logging and counting
    /// malformed ones instead of returning them.
    pub fn drain_packets(&mut self) -> impl Iterator<Item = Packet> + '_ {
        std::iter::from_fn(move || loop {
            let envelope = self.recv()?;
            match envelope.decode() {
                Ok(packet) => return Some(packet),
                Err(error) => {
                    self.stats.decode_errors += 1;
                    tracing::debug!(%error, channel = ?envelope.channel, "dropping malformed packet");
                }
            }
        })
    }

    /// Decodes every waiting packet and routes it to `entity`.
    ///
    /// Returns how many packets the entity applied or buffered.
    pub fn dispatch_to<K: Kinematics>(&mut self, entity: &mut NetworkedEntity<K>) -> usize {
        self.drain_packets()
            .filter(|packet| entity.handle_packet(*packet))
            .count()
    }

    /// Returns true if nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Returns statistics.
    #[must_use]
    pub const fn stats(&self) -> &TransportStats {
        &self.stats
    }
}

/// [`Transport`] that keeps everything it is handed. For tests.
#[derive(Clone, Debug, Default)]
pub struct RecordingTransport {
    /// Commands sent, in order.
    pub commands: Vec<InputCommand>,
    /// Snapshots sent, in order.
    pub snapshots: Vec<Results>,
    /// When set, every send fails as if the peer went away.
    pub disconnected: bool,
}

impl RecordingTransport {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for RecordingTransport {
    fn send_command(&mut self, command: InputCommand) -> Result<(), TransportError> {
        if self.disconnected {
            return Err(TransportError::Disconnected(Channel::Reliable));
        }
        self.commands.push(command);
        Ok(())
    }

    fn send_snapshot(&mut self, snapshot: Results) -> Result<(), TransportError> {
        if self.disconnected {
            return Err(TransportError::Disconnected(Channel::Unreliable));
        }
        self.snapshots.push(snapshot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Inputs;

    #[test]
    fn test_channel_round_trip() {
        let (mut transport, mut mailbox) = ChannelTransport::unbounded();
        let command = InputCommand::from_inputs(&Inputs::movement(1.0, 0.0).stamped(0.5)).unwrap();
        let snapshot = Results::default();

        transport.send_command(command).unwrap();
        transport.send_snapshot(snapshot).unwrap();

        let envelopes: Vec<Envelope> = mailbox.drain().collect();
        assert_eq!(envelopes.len(), 2);
        assert_eq!(envelopes[0].channel, Channel::Reliable);
        assert_eq!(envelopes[1].channel, Channel::Unreliable);
        assert_eq!(envelopes[0].decode().unwrap(), Packet::Command(command));
        assert_eq!(envelopes[1].decode().unwrap(), Packet::Snapshot(snapshot));
        assert_eq!(transport.stats().packets_sent, 2);
        assert_eq!(mailbox.stats().packets_received, 2);
        assert!(mailbox.is_empty());
    }

    #[test]
    fn test_malformed_packets_are_skipped() {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let mut mailbox = Mailbox::new(receiver);
        sender
            .send(Envelope {
                channel: Channel::Unreliable,
                bytes: vec![9, 9, 9],
            })
            .unwrap();
        let mut transport = ChannelTransport::new(sender);
        transport.send_snapshot(Results::default()).unwrap();

        let packets: Vec<Packet> = mailbox.drain_packets().collect();
        assert_eq!(packets, vec![Packet::Snapshot(Results::default())]);
        assert_eq!(mailbox.stats().decode_errors, 1);
    }

    #[test]
    fn test_disconnected_channel() {
        let (mut transport, mailbox) = ChannelTransport::unbounded();
        drop(mailbox);
        let err = transport.send_snapshot(Results::default()).unwrap_err();
        assert_eq!(err, TransportError::Disconnected(Channel::Unreliable));
        assert_eq!(transport.stats().send_errors, 1);
    }

    #[test]
    fn test_dispatch_routes_to_entity() {
        use crate::config::SyncConfig;
        use crate::integration::WalkerKinematics;
        use crate::role::PeerRole;

        let mut authority = NetworkedEntity::new(
            PeerRole::RemoteSimulator,
            WalkerKinematics::default(),
            &SyncConfig::default(),
        );
        let (mut transport, mut mailbox) = ChannelTransport::unbounded();
        let command = InputCommand::from_inputs(&Inputs::movement(1.0, 0.0)).unwrap();
        transport.send_command(command).unwrap();
        transport.send_snapshot(Results::default()).unwrap();

        // The snapshot is decoded but a remote simulator ignores it
        assert_eq!(mailbox.dispatch_to(&mut authority), 1);
        assert_eq!(authority.authority().unwrap().queued().len(), 1);
        assert!(mailbox.is_empty());
    }

    #[test]
    fn test_recording_transport() {
        let mut transport = RecordingTransport::new();
        transport.send_snapshot(Results::default()).unwrap();
        assert_eq!(transport.snapshots.len(), 1);

        transport.disconnected = true;
        assert!(transport.send_snapshot(Results::default()).is_err());
    }
}
