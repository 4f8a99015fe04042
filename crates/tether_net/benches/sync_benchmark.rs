//! Benchmark for the per-tick synchronization hot paths.
//!
//! TARGET: a full 100-input replay well under one 20ms tick
//!
//! Run with: cargo bench --package tether_net --bench sync_benchmark

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use tether_net::protocol::{MovementRotationInput, PacketDeserializer, PacketSerializer};
use tether_net::{
    InputCommand, Inputs, InterpolationEngine, Packet, PredictionEngine, Results, SyncConfig,
    WalkerKinematics, INPUT_QUEUE_CAPACITY,
};

const TICK: f32 = 0.02;

#[allow(clippy::cast_precision_loss)]
fn full_queue_engine(kinematics: &WalkerKinematics) -> PredictionEngine {
    let mut engine = PredictionEngine::new(INPUT_QUEUE_CAPACITY);
    // Stamped from one tick in, so a snapshot at t = 0 predates all of them
    for tick in 1..=INPUT_QUEUE_CAPACITY {
        let inputs = Inputs::new(1.0, 0.5, 30.0, -10.0).stamped(tick as f32 * TICK);
        engine.predict(inputs, kinematics);
    }
    engine
}

fn benchmark_reconcile_replay(c: &mut Criterion) {
    let kinematics = WalkerKinematics::default();
    // Older than every buffered input, so all of them replay
    let snapshot = Results::default();

    let mut group = c.benchmark_group("reconcile");
    group.throughput(Throughput::Elements(INPUT_QUEUE_CAPACITY as u64));
    group.bench_function("replay_full_queue", |b| {
        b.iter_batched(
            || full_queue_engine(&kinematics),
            |mut engine| black_box(engine.reconcile(black_box(&snapshot), &kinematics)),
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

#[allow(clippy::cast_precision_loss)]
fn benchmark_interpolation_tick(c: &mut Criterion) {
    let config = SyncConfig::default();

    c.bench_function("interpolation_tick", |b| {
        let mut engine = InterpolationEngine::from_config(&config);
        let mut timestamp = 0.0f32;
        let mut ticks = 0u32;
        b.iter(|| {
            // Keep the buffer fed at the send rate so playback never pauses
            if ticks % 3 == 0 {
                timestamp += config.snapshot_send_interval;
                let mut snapshot = Results::default();
                snapshot.position.x = timestamp;
                snapshot.timestamp = timestamp;
                engine.on_snapshot(snapshot);
            }
            ticks = ticks.wrapping_add(1);
            black_box(engine.tick())
        });
    });
}

fn benchmark_packet_codec(c: &mut Criterion) {
    let command = InputCommand::MovementRotation(MovementRotationInput {
        forward: 1.0,
        sides: -1.0,
        pitch: 45.0,
        yaw: 12.0,
        timestamp: 3.5,
    });
    let packets = [Packet::Snapshot(Results::default()), Packet::Command(command)];

    let mut group = c.benchmark_group("packet_codec");
    group.throughput(Throughput::Elements(packets.len() as u64));
    group.bench_function("encode_decode", |b| {
        let mut serializer = PacketSerializer::new();
        b.iter(|| {
            for packet in &packets {
                let bytes = serializer.serialize(black_box(packet)).map(<[u8]>::to_vec);
                if let Ok(bytes) = bytes {
                    black_box(PacketDeserializer::new(&bytes).deserialize().ok());
                }
            }
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_reconcile_replay,
    benchmark_interpolation_tick,
    benchmark_packet_codec,
);
criterion_main!(benches);
