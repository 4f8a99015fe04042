//! # Sync Demo
//!
//! Runs one owner, one authority and one observer over simulated links and
//! reports how far each view drifted from the authority.
//!
//! ## Usage
//!
//! ```bash
//! sync_demo --network poor --ticks 300 --seed 42
//! RUST_LOG=tether_net=debug sync_demo --config sync.toml --realtime
//! ```

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use tether_net::integration::{AxisMapping, RawAxes};
use tether_net::protocol::Inputs;
use tether_net::{LoopbackSession, NetworkConditions, ScriptedSampler, SyncConfig};

/// Ticks allowed for in-flight traffic to drain after the script ends.
const SETTLE_TICKS: usize = 500;

struct DemoArgs {
    config_path: Option<String>,
    network: String,
    ticks: usize,
    seed: u64,
    realtime: bool,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            config_path: None,
            network: "average".into(),
            ticks: 250,
            seed: 7,
            realtime: false,
        }
    }
}

fn print_usage() {
    println!("Usage: sync_demo [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --config <FILE>      TOML session config (default: built-in)");
    println!("  -n, --network <PRESET>   perfect | good | average | poor (default: average)");
    println!("  -t, --ticks <NUM>        Ticks to run before settling (default: 250)");
    println!("  -s, --seed <NUM>         Link RNG seed (default: 7)");
    println!("  -r, --realtime           Pace ticks at the configured rate");
    println!("  -h, --help               Show this help");
}

/// Simple flag parsing. Returns `None` when only help was requested.
fn parse_args() -> Option<DemoArgs> {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = DemoArgs::default();

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match args[i].as_str() {
            "--config" | "-c" => {
                parsed.config_path = value.cloned();
                i += 1;
            }
            "--network" | "-n" => {
                if let Some(name) = value {
                    parsed.network.clone_from(name);
                }
                i += 1;
            }
            "--ticks" | "-t" => {
                parsed.ticks = value.and_then(|v| v.parse().ok()).unwrap_or(parsed.ticks);
                i += 1;
            }
            "--seed" | "-s" => {
                parsed.seed = value.and_then(|v| v.parse().ok()).unwrap_or(parsed.seed);
                i += 1;
            }
            "--realtime" | "-r" => parsed.realtime = true,
            "--help" | "-h" => {
                print_usage();
                return None;
            }
            other => eprintln!("ignoring unknown argument {other}"),
        }
        i += 1;
    }
    Some(parsed)
}

/// Walk, strafe while turning, look up and down, then stand still.
fn demo_script(ticks: usize) -> ScriptedSampler {
    let mapping = AxisMapping::default();
    let phase = (ticks / 4).max(1);

    let walk = mapping.map(RawAxes {
        vertical: 0.8,
        ..RawAxes::default()
    });
    let strafe_turn = mapping.map(RawAxes {
        horizontal: -0.6,
        vertical: 1.0,
        mouse_x: 0.9,
        ..RawAxes::default()
    });
    let look = mapping.map(RawAxes {
        mouse_y: 0.4,
        ..RawAxes::default()
    });

    ScriptedSampler::repeating(walk, phase)
        .then(strafe_turn, phase)
        .then(look, phase)
        .then(Inputs::default(), phase)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let Some(args) = parse_args() else {
        return ExitCode::SUCCESS;
    };

    let config = match &args.config_path {
        Some(path) => match SyncConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => SyncConfig::default(),
    };
    let Some(conditions) = NetworkConditions::preset(&args.network) else {
        eprintln!("Error: unknown network preset '{}'", args.network);
        print_usage();
        return ExitCode::FAILURE;
    };

    println!("═══════════════════════════════════════════════════════════════════");
    println!("                       TETHER SYNC DEMO");
    println!("═══════════════════════════════════════════════════════════════════");
    println!();
    println!("  Tick Rate:     {} Hz", config.tick_rate);
    println!("  Snapshots:     every {:.0} ms", config.snapshot_send_interval * 1000.0);
    println!(
        "  Network:       {} ({} ms ±{} ms, {}% loss)",
        args.network,
        conditions.base_latency_ms,
        conditions.jitter_ms,
        conditions.packet_loss_percent
    );
    println!("  Ticks:         {}", args.ticks);
    println!("  Seed:          {}", args.seed);
    println!();

    let mut session = LoopbackSession::new(config, conditions, demo_script(args.ticks), args.seed);

    if args.realtime {
        session.run_realtime(args.ticks);
        let stats = session.clock().stats();
        println!(
            "Pacing:        {} late of {} ticks, worst {} us behind",
            stats.late_ticks,
            session.clock().tick_count(),
            stats.max_lag_us
        );
    } else {
        session.run(args.ticks);
    }
    let settled = session.settle(SETTLE_TICKS);

    println!();
    println!("┌─ Convergence ────────────────────────────────────────────────────┐");
    println!("│ Settled after:        {settled} ticks");
    println!("│ Owner error:          {:.6} units", session.owner_error());
    println!("│ Observer error:       {:.6} units", session.observer_error());
    println!("│ Max owner error:      {:.6} units", session.stats().max_owner_error);
    println!("│ Max observer error:   {:.6} units", session.stats().max_observer_error);
    println!("└──────────────────────────────────────────────────────────────────┘");

    println!("┌─ Links ──────────────────────────────────────────────────────────┐");
    let names = ["uplink", "to owner", "to observer"];
    for (name, link) in names.iter().zip(session.links()) {
        let stats = link.stats();
        println!(
            "│ {name:<12} sent {:5}  delivered {:5}  dropped {:4}  dup {:4}  late {:4}",
            stats.sent, stats.delivered, stats.dropped, stats.duplicated, stats.reordered
        );
    }
    println!("└──────────────────────────────────────────────────────────────────┘");

    if let Some(prediction) = session.owner().prediction() {
        let stats = prediction.stats();
        println!("┌─ Owner ──────────────────────────────────────────────────────────┐");
        println!("│ Predicted:            {}", stats.predicted);
        println!("│ Buffered:             {} ({} dropped)", stats.buffered, stats.dropped);
        println!(
            "│ Snapshots:            {} applied, {} rejected",
            stats.snapshots_applied, stats.snapshots_rejected
        );
        println!("│ Replayed inputs:      {}", stats.replayed);
        println!("└──────────────────────────────────────────────────────────────────┘");
    }

    if let Some(authority) = session.authority().authority() {
        let stats = authority.stats();
        println!("┌─ Authority ──────────────────────────────────────────────────────┐");
        println!("│ Commands received:    {} ({} overflowed)", stats.received, stats.overflowed);
        println!("│ Ticks simulated:      {} ({} idle)", stats.simulated, stats.idle_ticks);
        println!(
            "│ Snapshots:            {} emitted, {} unchanged",
            stats.emitted, stats.suppressed
        );
        println!(
            "│ Coalesced by pacing:  {}",
            session.authority().throttle().coalesced()
        );
        println!("└──────────────────────────────────────────────────────────────────┘");
    }

    if let Some(interpolation) = session.observer().interpolation() {
        let stats = interpolation.stats();
        println!("┌─ Observer ───────────────────────────────────────────────────────┐");
        println!("│ Snapshots:            {} accepted, {} stale", stats.accepted, stats.rejected);
        println!("│ Segments played:      {}", stats.segments);
        println!("│ Paused ticks:         {}", stats.paused_ticks);
        println!("│ Frames shown:         {}", session.observer_frames().frames());
        println!("└──────────────────────────────────────────────────────────────────┘");
    }

    ExitCode::SUCCESS
}
