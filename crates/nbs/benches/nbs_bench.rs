//! Benchmarks for the NBS engine.
//!
//! Run with: cargo bench --package nbs
//!
//! ## Benchmark Categories
//!
//! - **Decoder open**: sidecar load, merge and sort
//! - **Point queries**: `get_packets` binary searches
//! - **Stepping**: multi-stream `next_timestamp` traversal

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nbs::{hash, Decoder, Encoder, Packet, TypeSubtype};
use std::path::PathBuf;
use tempfile::TempDir;

const PACKETS_PER_TYPE: u64 = 10_000;

/// Writes one NBS file with four interleaved streams.
fn write_sample(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("bench.nbs");
    let mut encoder = Encoder::create(&path).unwrap();

    let types = [
        (hash::from_name("message.Ping"), 0u32),
        (hash::from_name("message.Pong"), 0),
        (hash::from_name("message.Pang"), 100),
        (hash::from_name("message.Pang"), 200),
    ];

    for i in 0..PACKETS_PER_TYPE {
        for (j, (type_hash, subtype)) in types.into_iter().enumerate() {
            let ts = 1_000_000_000 + i * 4_000 + j as u64 * 1_000;
            let payload = i.to_le_bytes();
            let packet = Packet::new(ts, type_hash, subtype, &payload);
            encoder.write(&packet, None).unwrap();
        }
    }

    encoder.close().unwrap();
    path
}

fn bench_decoder_open(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let path = write_sample(&dir);

    c.bench_function("decoder_open_40k", |b| {
        b.iter(|| Decoder::open(black_box(&[&path])).unwrap())
    });
}

fn bench_get_packets(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let path = write_sample(&dir);
    let decoder = Decoder::open(&[&path]).unwrap();
    let (start, end) = decoder.timestamp_range();
    let mid = start + (end - start) / 2;

    c.bench_function("get_packets_all_types", |b| {
        b.iter(|| decoder.get_packets(black_box(mid), None).unwrap())
    });

    let key = TypeSubtype::of("message.Ping", 0);
    c.bench_function("get_packets_one_type", |b| {
        b.iter(|| decoder.get_packets(black_box(mid), Some(&[key])).unwrap())
    });
}

fn bench_next_timestamp(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let path = write_sample(&dir);
    let decoder = Decoder::open(&[&path]).unwrap();
    let (start, _) = decoder.timestamp_range();

    c.bench_function("next_timestamp_100_steps", |b| {
        b.iter(|| {
            decoder
                .next_timestamp(black_box(start), None, 100)
                .unwrap()
        })
    });

    c.bench_function("next_timestamp_back_100_steps", |b| {
        b.iter(|| {
            decoder
                .next_timestamp(black_box(start + 2_000_000), None, -100)
                .unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_decoder_open,
    bench_get_packets,
    bench_next_timestamp
);
criterion_main!(benches);
