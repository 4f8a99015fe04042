//! # Error Types
//!
//! Errors only surface at the edges: loading configuration, decoding packets
//! and handing messages to a transport. The engines themselves treat every
//! abnormal condition (stale snapshot, empty queue, overflow) as a no-op.

use std::path::PathBuf;

use thiserror::Error;

use crate::transport::Channel;

/// Errors raised while loading or validating a [`crate::SyncConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised while decoding a packet.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireError {
    /// The buffer ended before the payload did.
    #[error("packet truncated: need {needed} bytes, have {available}")]
    Truncated {
        /// Bytes required by the payload.
        needed: usize,
        /// Bytes left in the buffer.
        available: usize,
    },

    /// The leading type byte is not a known packet type.
    #[error("unknown packet type: {0}")]
    UnknownPacketType(u8),

    /// A float field is NaN or infinite.
    #[error("non-finite value in payload")]
    NonFinite,

    /// The payload does not fit in the send buffer.
    #[error("payload too large for packet buffer")]
    Overflow,
}

/// Errors raised by a [`crate::Transport`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The receiving end of the channel is gone.
    #[error("{0:?} channel disconnected")]
    Disconnected(Channel),

    /// The packet could not be encoded.
    #[error("failed to encode packet: {0}")]
    Encode(WireError),
}

/// Umbrella error for the fallible surfaces of this crate.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Configuration problem.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Malformed packet.
    #[error(transparent)]
    Wire(#[from] WireError),

    /// Transport failure.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Result type for synchronization operations.
pub type SyncResult<T> = Result<T, SyncError>;
