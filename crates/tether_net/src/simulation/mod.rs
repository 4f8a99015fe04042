//! # Network Simulation
//!
//! Simulates network conditions for testing.
//!
//! ## Features
//!
//! - Latency and jitter
//! - Packet loss, duplication and reordering on unreliable links
//! - Reliable links that delay but never drop or reorder
//! - A complete owner / authority / observer session over simulated links
//!
//! All randomness comes from a seeded `ChaCha8Rng`, so a session replays
//! identically for the same seed.

mod session;

pub use session::{LoopbackSession, SessionStats};

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::transport::Envelope;

/// Network conditions for simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkConditions {
    /// Base one-way latency in milliseconds.
    pub base_latency_ms: u32,
    /// Jitter (variance) in milliseconds, either direction.
    pub jitter_ms: u32,
    /// Packet loss percentage (0-100). Unreliable links only.
    pub packet_loss_percent: u8,
    /// Duplicate packet percentage (0-100). Unreliable links only.
    pub duplicate_percent: u8,
    /// Out-of-order percentage (0-100). Unreliable links only.
    pub out_of_order_percent: u8,
}

impl NetworkConditions {
    /// Perfect network conditions (LAN).
    pub const PERFECT: Self = Self {
        base_latency_ms: 1,
        jitter_ms: 0,
        packet_loss_percent: 0,
        duplicate_percent: 0,
        out_of_order_percent: 0,
    };

    /// Good network conditions (fiber).
    pub const GOOD: Self = Self {
        base_latency_ms: 20,
        jitter_ms: 5,
        packet_loss_percent: 0,
        duplicate_percent: 0,
        out_of_order_percent: 0,
    };

    /// Average network conditions (cable).
    pub const AVERAGE: Self = Self {
        base_latency_ms: 50,
        jitter_ms: 20,
        packet_loss_percent: 1,
        duplicate_percent: 1,
        out_of_order_percent: 2,
    };

    /// Poor network conditions (mobile/wifi).
    pub const POOR: Self = Self {
        base_latency_ms: 100,
        jitter_ms: 50,
        packet_loss_percent: 5,
        duplicate_percent: 2,
        out_of_order_percent: 5,
    };

    /// Looks up a preset by name (`perfect`, `good`, `average`, `poor`).
    #[must_use]
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "perfect" => Some(Self::PERFECT),
            "good" => Some(Self::GOOD),
            "average" => Some(Self::AVERAGE),
            "poor" => Some(Self::POOR),
            _ => None,
        }
    }

    /// Draws a one-way latency in seconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn sample_latency(&self, rng: &mut impl Rng) -> f32 {
        let base = i64::from(self.base_latency_ms);
        let jitter = i64::from(self.jitter_ms);
        let offset = if jitter > 0 {
            rng.gen_range(-jitter..=jitter)
        } else {
            0
        };
        (base + offset).max(0) as f32 / 1000.0
    }

    fn roll(rng: &mut impl Rng, percent: u8) -> bool {
        percent > 0 && rng.gen_range(0..100u8) < percent
    }
}

impl Default for NetworkConditions {
    fn default() -> Self {
        Self::GOOD
    }
}

/// Link statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Envelopes handed to the link.
    pub sent: u64,
    /// Envelopes handed out at the far end.
    pub delivered: u64,
    /// Envelopes lost.
    pub dropped: u64,
    /// Extra copies injected.
    pub duplicated: u64,
    /// Envelopes held back to arrive out of order.
    pub reordered: u64,
}

#[derive(Clone, Debug)]
struct InFlight {
    arrival: f32,
    envelope: Envelope,
}

/// One direction of a simulated connection.
#[derive(Clone, Debug)]
pub struct LossyLink {
    conditions: NetworkConditions,
    reliable: bool,
    rng: ChaCha8Rng,
    in_flight: VecDeque<InFlight>,
    last_arrival: f32,
    stats: LinkStats,
}

impl LossyLink {
    /// Creates an ordered, lossless link. Jitter still applies but never
    /// lets a packet overtake an earlier one.
    #[must_use]
    pub fn reliable(conditions: NetworkConditions, seed: u64) -> Self {
        Self::new(conditions, true, seed)
    }

    /// Creates a best-effort link.
    #[must_use]
    pub fn unreliable(conditions: NetworkConditions, seed: u64) -> Self {
        Self::new(conditions, false, seed)
    }

    fn new(conditions: NetworkConditions, reliable: bool, seed: u64) -> Self {
        Self {
            conditions,
            reliable,
            rng: ChaCha8Rng::seed_from_u64(seed),
            in_flight: VecDeque::with_capacity(32),
            last_arrival: 0.0,
            stats: LinkStats::default(),
        }
    }

    /// Puts an envelope on the wire at time `now`.
    pub fn send(&mut self, now: f32, envelope: Envelope) {
        self.stats.sent += 1;

        if self.reliable {
            let arrival = (now + self.conditions.sample_latency(&mut self.rng)).max(self.last_arrival);
            self.last_arrival = arrival;
            self.in_flight.push_back(InFlight { arrival, envelope });
            return;
        }

        if NetworkConditions::roll(&mut self.rng, self.conditions.packet_loss_percent) {
            self.stats.dropped += 1;
            return;
        }

        let mut arrival = now + self.conditions.sample_latency(&mut self.rng);
        if NetworkConditions::roll(&mut self.rng, self.conditions.out_of_order_percent) {
            // Held back long enough for later packets to overtake it
            arrival += self.conditions.sample_latency(&mut self.rng).max(0.05);
            self.stats.reordered += 1;
        }
        if NetworkConditions::roll(&mut self.rng, self.conditions.duplicate_percent) {
            let copy = now + self.conditions.sample_latency(&mut self.rng);
            self.stats.duplicated += 1;
            self.insert(copy, envelope.clone());
        }
        self.insert(arrival, envelope);
    }

    fn insert(&mut self, arrival: f32, envelope: Envelope) {
        let index = self
            .in_flight
            .iter()
            .position(|p| p.arrival > arrival)
            .unwrap_or(self.in_flight.len());
        self.in_flight.insert(index, InFlight { arrival, envelope });
    }

    /// Takes the next envelope due by time `now`.
    pub fn poll(&mut self, now: f32) -> Option<Envelope> {
        if self.in_flight.front()?.arrival > now {
            return None;
        }
        let packet = self.in_flight.pop_front()?;
        self.stats.delivered += 1;
        Some(packet.envelope)
    }

    /// Returns true if nothing is in flight.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Envelopes currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Returns statistics.
    #[must_use]
    pub const fn stats(&self) -> &LinkStats {
        &self.stats
    }
}
