//! # Packet Serialization
//!
//! Zero-allocation encoding for commands and snapshots.
//!
//! ## Design
//!
//! - One reusable, fixed-size output buffer per serializer
//! - Payloads are `Pod` and copied as raw little-endian bytes
//! - Decoding validates length and rejects non-finite floats before anything
//!   reaches an engine

use bytemuck::{bytes_of, Pod};

use super::packets::{
    InputCommand, MovementInput, MovementRotationInput, Packet, PacketType, Results,
    RotationInput,
};
use crate::error::WireError;

/// Maximum packet buffer size. The largest packet (a snapshot) is 37 bytes.
pub const MAX_BUFFER_SIZE: usize = 64;

/// Packet serializer - writes packets to a pre-allocated buffer.
///
/// Reuse one per peer to avoid allocations.
pub struct PacketSerializer {
    buffer: [u8; MAX_BUFFER_SIZE],
    position: usize,
}

impl PacketSerializer {
    /// Creates a new serializer with a fresh buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: [0u8; MAX_BUFFER_SIZE],
            position: 0,
        }
    }

    /// Resets the serializer for reuse.
    #[inline]
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Returns the number of bytes written.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.position
    }

    /// Returns true if no bytes have been written.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.position == 0
    }

    /// Returns a slice of the written data.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer[..self.position]
    }

    fn write_u8(&mut self, value: u8) -> Result<(), WireError> {
        if self.position >= MAX_BUFFER_SIZE {
            return Err(WireError::Overflow);
        }
        self.buffer[self.position] = value;
        self.position += 1;
        Ok(())
    }

    fn write_pod<T: Pod>(&mut self, value: &T) -> Result<(), WireError> {
        let bytes = bytes_of(value);
        if self.position + bytes.len() > MAX_BUFFER_SIZE {
            return Err(WireError::Overflow);
        }
        self.buffer[self.position..self.position + bytes.len()].copy_from_slice(bytes);
        self.position += bytes.len();
        Ok(())
    }

    /// Serializes an input command in its own wire shape.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Overflow`] if the buffer is too small.
    pub fn serialize_command(&mut self, command: &InputCommand) -> Result<&[u8], WireError> {
        self.reset();
        self.write_u8(command.packet_type() as u8)?;
        match command {
            InputCommand::Rotation(r) => self.write_pod(r)?,
            InputCommand::Movement(m) => self.write_pod(m)?,
            InputCommand::MovementRotation(c) => self.write_pod(c)?,
        }
        Ok(self.as_slice())
    }

    /// Serializes a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Overflow`] if the buffer is too small.
    pub fn serialize_snapshot(&mut self, snapshot: &Results) -> Result<&[u8], WireError> {
        self.reset();
        self.write_u8(PacketType::Snapshot as u8)?;
        self.write_pod(snapshot)?;
        Ok(self.as_slice())
    }

    /// Serializes any packet.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Overflow`] if the buffer is too small.
    pub fn serialize(&mut self, packet: &Packet) -> Result<&[u8], WireError> {
        match packet {
            Packet::Command(command) => self.serialize_command(command),
            Packet::Snapshot(snapshot) => self.serialize_snapshot(snapshot),
        }
    }
}

impl Default for PacketSerializer {
    fn default() -> Self {
        Self::new()
    }
}

/// Packet deserializer - reads one packet from a buffer.
pub struct PacketDeserializer<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> PacketDeserializer<'a> {
    /// Creates a new deserializer from a buffer.
    #[must_use]
    pub const fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, position: 0 }
    }

    /// Returns the number of bytes remaining.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    fn read_u8(&mut self) -> Result<u8, WireError> {
        let value = *self.buffer.get(self.position).ok_or(WireError::Truncated {
            needed: 1,
            available: 0,
        })?;
        self.position += 1;
        Ok(value)
    }

    fn read_pod<T: Pod>(&mut self) -> Result<T, WireError> {
        let size = std::mem::size_of::<T>();
        if self.remaining() < size {
            return Err(WireError::Truncated {
                needed: size,
                available: self.remaining(),
            });
        }
        let slice = &self.buffer[self.position..self.position + size];
        self.position += size;
        bytemuck::try_pod_read_unaligned(slice).map_err(|_| WireError::Truncated {
            needed: size,
            available: slice.len(),
        })
    }

    /// Deserializes a packet from the buffer.
    ///
    /// # Errors
    ///
    /// - [`WireError::UnknownPacketType`] for an unrecognized type byte
    /// - [`WireError::Truncated`] if the payload is cut short
    /// - [`WireError::NonFinite`] if any float is NaN or infinite
    pub fn deserialize(&mut self) -> Result<Packet, WireError> {
        let type_byte = self.read_u8()?;
        let packet_type =
            PacketType::from_u8(type_byte).ok_or(WireError::UnknownPacketType(type_byte))?;

        let packet = match packet_type {
            PacketType::RotationInput => {
                Packet::Command(InputCommand::Rotation(self.read_pod::<RotationInput>()?))
            }
            PacketType::MovementInput => {
                Packet::Command(InputCommand::Movement(self.read_pod::<MovementInput>()?))
            }
            PacketType::MovementRotationInput => Packet::Command(InputCommand::MovementRotation(
                self.read_pod::<MovementRotationInput>()?,
            )),
            PacketType::Snapshot => Packet::Snapshot(self.read_pod::<Results>()?),
        };

        if !packet_is_finite(&packet) {
            return Err(WireError::NonFinite);
        }
        Ok(packet)
    }
}

fn packet_is_finite(packet: &Packet) -> bool {
    match packet {
        Packet::Command(command) => {
            let inputs = command.to_inputs();
            [inputs.forward, inputs.sides, inputs.pitch, inputs.yaw, inputs.timestamp]
                .iter()
                .all(|v| v.is_finite())
        }
        Packet::Snapshot(results) => results.is_finite(),
    }
}
