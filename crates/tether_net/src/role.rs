//! Peer roles.

/// What a peer does for one entity, derived from ownership and authority.
///
/// Fixed for the lifetime of the entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PeerRole {
    /// Owner and authority: simulates its own input and emits snapshots.
    Host,
    /// Owner without authority: predicts locally, reconciles on snapshots.
    PredictingClient,
    /// Authority for a remote owner: consumes queued commands, emits snapshots.
    RemoteSimulator,
    /// Neither: interpolates between received snapshots.
    Observer,
}

impl PeerRole {
    /// Derives the role from the two flags.
    #[must_use]
    pub const fn from_flags(is_owner: bool, has_authority: bool) -> Self {
        match (is_owner, has_authority) {
            (true, true) => Self::Host,
            (true, false) => Self::PredictingClient,
            (false, true) => Self::RemoteSimulator,
            (false, false) => Self::Observer,
        }
    }

    /// Returns true if this peer produces input for the entity.
    #[must_use]
    pub const fn is_owner(self) -> bool {
        matches!(self, Self::Host | Self::PredictingClient)
    }

    /// Returns true if this peer computes the canonical state.
    #[must_use]
    pub const fn has_authority(self) -> bool {
        matches!(self, Self::Host | Self::RemoteSimulator)
    }

    /// Returns true if this peer reacts to inbound snapshots.
    #[must_use]
    pub const fn consumes_snapshots(self) -> bool {
        !self.has_authority()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_table() {
        for (owner, authority) in [(true, true), (true, false), (false, true), (false, false)] {
            let role = PeerRole::from_flags(owner, authority);
            assert_eq!(role.is_owner(), owner);
            assert_eq!(role.has_authority(), authority);
        }
        assert_eq!(PeerRole::from_flags(true, false), PeerRole::PredictingClient);
        assert!(PeerRole::Observer.consumes_snapshots());
        assert!(!PeerRole::Host.consumes_snapshots());
    }
}
