//! # Session Scenarios
//!
//! End-to-end runs of an owner, an authority and an observer over simulated
//! links, checking that every view ends where the authority ended.
//!
//! Run with: cargo test --package tether_net --test session_scenarios

use tether_net::protocol::Inputs;
use tether_net::{LoopbackSession, NetworkConditions, ScriptedSampler, SyncConfig};

const SETTLE_TICKS: usize = 500;

fn walk_forward(ticks: usize) -> ScriptedSampler {
    ScriptedSampler::repeating(Inputs::movement(1.0, 0.0), ticks)
}

fn wander(ticks: usize) -> ScriptedSampler {
    ScriptedSampler::repeating(Inputs::movement(1.0, 0.0), ticks)
        .then(Inputs::new(1.0, -1.0, 90.0, 0.0), ticks)
        .then(Inputs::rotation(0.0, -40.0), ticks)
        .then(Inputs::new(-1.0, 1.0, -45.0, 20.0), ticks)
}

// ============================================================================
// OWNER CONVERGENCE
// ============================================================================

#[test]
fn owner_converges_on_good_network() {
    let mut session =
        LoopbackSession::new(SyncConfig::default(), NetworkConditions::GOOD, walk_forward(25), 7);
    session.run(100);
    session.settle(100);

    assert!(session.owner_error() < 1e-3);
    assert_eq!(session.stats().decode_errors, 0);
}

#[test]
fn owner_leads_then_converges_on_average_network() {
    let mut session =
        LoopbackSession::new(SyncConfig::default(), NetworkConditions::AVERAGE, wander(40), 3);
    session.run(160);
    session.settle(SETTLE_TICKS);

    // 50ms of latency keeps the owner ahead while moving
    assert!(session.stats().max_owner_error > 0.0);
    assert!(session.owner_error() < 1e-3);
    assert!(session.owner_pose().orientation.angle_to(session.authority_pose().orientation) < 0.5);
}

#[test]
fn owner_converges_despite_snapshot_loss() {
    for seed in [1, 2, 3, 4, 5] {
        let mut session =
            LoopbackSession::new(SyncConfig::default(), NetworkConditions::POOR, wander(30), seed);
        session.run(120);
        session.settle(SETTLE_TICKS);

        assert!(
            session.owner_error() < 1e-3,
            "seed {seed}: owner error {}",
            session.owner_error()
        );
    }
}

#[test]
fn reliable_uplink_delivers_every_command() {
    let mut session =
        LoopbackSession::new(SyncConfig::default(), NetworkConditions::POOR, walk_forward(40), 9);
    session.run(40);
    session.settle(SETTLE_TICKS);

    let authority = session.authority().authority().unwrap();
    assert_eq!(authority.stats().received, 40);
    assert_eq!(authority.stats().simulated, 40);
    assert_eq!(authority.stats().overflowed, 0);

    let [uplink, _, _] = session.links();
    assert_eq!(uplink.stats().dropped, 0);
    assert_eq!(uplink.stats().delivered, 40);
}

// ============================================================================
// OBSERVER PLAYBACK
// ============================================================================

#[test]
fn observer_playback_never_runs_backwards() {
    // Reordered and duplicated snapshots must never pull the observer back
    let mut session =
        LoopbackSession::new(SyncConfig::default(), NetworkConditions::POOR, walk_forward(150), 21);
    session.run(150);
    session.settle(SETTLE_TICKS);

    let frames = &session.observer_frames().positions;
    assert!(frames.len() >= 150);
    for pair in frames.windows(2) {
        assert!(pair[1].z >= pair[0].z - 1e-5, "{} -> {}", pair[0].z, pair[1].z);
    }

    let interpolation = session.observer().interpolation().unwrap();
    assert!(interpolation.stats().segments > 0);
}

#[test]
fn observer_trails_the_authority_closely() {
    let mut session =
        LoopbackSession::new(SyncConfig::default(), NetworkConditions::GOOD, walk_forward(60), 12);
    session.run(60);
    session.settle(SETTLE_TICKS);

    // At most one snapshot interval of movement behind
    assert!(session.observer_error() < 0.5);
    assert!(session.observer_pose().position.z > 2.5);
}

// ============================================================================
// CONFIGURATION AND DETERMINISM
// ============================================================================

#[test]
fn config_file_drives_the_session() {
    let config = SyncConfig::from_toml_str(
        r"
        tick_rate = 25

        [kinematics]
        move_speed = 2.0
        ",
    )
    .unwrap();

    let mut session = LoopbackSession::new(config, NetworkConditions::PERFECT, walk_forward(30), 4);
    session.run(30);
    session.settle(SETTLE_TICKS);

    // 30 ticks of 2.0 units/s at 25Hz
    assert!((session.authority_pose().position.z - 2.4).abs() < 1e-3);
    assert!(session.owner_error() < 1e-4);
}

#[test]
fn same_seed_replays_identically() {
    let run = || {
        let mut session =
            LoopbackSession::new(SyncConfig::default(), NetworkConditions::POOR, wander(25), 99);
        session.run(100);
        session.settle(SETTLE_TICKS);
        (
            session.observer_frames().positions.clone(),
            session.links().map(|link| *link.stats()),
        )
    };

    assert_eq!(run(), run());
}
