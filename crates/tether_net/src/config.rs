//! # Configuration
//!
//! Tuning knobs for one synchronization session, loaded once at startup.
//!
//! ```toml
//! tick_rate = 50
//! snapshot_send_interval = 0.05
//! input_queue_capacity = 100
//! result_buffer_capacity = 64
//!
//! [kinematics]
//! move_speed = 3.0
//! look_limit = 89.0
//! ```
//!
//! Every key is optional; missing keys take the defaults above.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::{
    DEFAULT_SNAPSHOT_SEND_INTERVAL, DEFAULT_TICK_RATE, INPUT_QUEUE_CAPACITY,
    RESULT_BUFFER_CAPACITY,
};

/// Session configuration shared by every peer.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Fixed simulation ticks per second.
    pub tick_rate: u32,
    /// Seconds between snapshot sends on the unreliable channel.
    pub snapshot_send_interval: f32,
    /// Capacity of the owner's and the authority's input queues.
    pub input_queue_capacity: usize,
    /// Capacity of an observer's result buffer.
    pub result_buffer_capacity: usize,
    /// Parameters of the default movement strategy.
    pub kinematics: KinematicsConfig,
}

/// Parameters of [`crate::WalkerKinematics`].
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KinematicsConfig {
    /// Translation speed in world units per second.
    pub move_speed: f32,
    /// Maximum vertical look angle in degrees, either direction.
    pub look_limit: f32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            snapshot_send_interval: DEFAULT_SNAPSHOT_SEND_INTERVAL,
            input_queue_capacity: INPUT_QUEUE_CAPACITY,
            result_buffer_capacity: RESULT_BUFFER_CAPACITY,
            kinematics: KinematicsConfig::default(),
        }
    }
}

impl Default for KinematicsConfig {
    fn default() -> Self {
        Self {
            move_speed: 3.0,
            look_limit: 89.0,
        }
    }
}

impl SyncConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
    /// errors of [`SyncConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::info!(path = %path.display(), tick_rate = config.tick_rate, "config loaded");
        Ok(config)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 {
            return Err(ConfigError::Invalid("tick_rate must be at least 1".into()));
        }
        if !(self.snapshot_send_interval.is_finite() && self.snapshot_send_interval > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "snapshot_send_interval must be positive, got {}",
                self.snapshot_send_interval
            )));
        }
        if self.input_queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "input_queue_capacity must be at least 1".into(),
            ));
        }
        // Playback needs two snapshots before it starts
        if self.result_buffer_capacity < 2 {
            return Err(ConfigError::Invalid(
                "result_buffer_capacity must be at least 2".into(),
            ));
        }
        if !(self.kinematics.move_speed.is_finite() && self.kinematics.move_speed >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "kinematics.move_speed must be non-negative, got {}",
                self.kinematics.move_speed
            )));
        }
        if !(0.0..=90.0).contains(&self.kinematics.look_limit) {
            return Err(ConfigError::Invalid(format!(
                "kinematics.look_limit must be within 0..=90, got {}",
                self.kinematics.look_limit
            )));
        }
        Ok(())
    }

    /// Seconds per simulation tick.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn tick_duration(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }

    /// Progress an observer adds per tick while playing one segment.
    #[inline]
    #[must_use]
    pub fn interpolation_step(&self) -> f32 {
        self.tick_duration() / self.snapshot_send_interval
    }
}
