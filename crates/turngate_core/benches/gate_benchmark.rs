//! # Gate Throughput Benchmark
//!
//! Measures the uncontended cost of the entry/exit pairs. An anchor reader
//! keeps the count above zero in the read benchmark so the turn never flips
//! away mid-measurement.

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use turngate_core::{Phase, PhaseGate, TurnLock};

fn bench_reader_cycle(c: &mut Criterion) {
    let gate = PhaseGate::new();
    // Anchor: count stays >= 1, so exit_read never hands the turn over.
    gate.enter_read();

    c.bench_function("gate_reader_enter_exit", |b| {
        b.iter(|| {
            gate.enter_read();
            black_box(gate.active_readers());
            gate.exit_read();
        });
    });

    gate.exit_read();
}

fn bench_writer_cycle(c: &mut Criterion) {
    let gate = PhaseGate::new();

    c.bench_function("gate_writer_enter_exit", |b| {
        b.iter(|| {
            // exit_write hands the turn back, so each iteration restages it.
            gate.request_transition(Phase::Write);
            gate.enter_write();
            black_box(gate.writer_holds_token());
            gate.exit_write();
        });
    });
}

fn bench_read_guard(c: &mut Criterion) {
    let lock = TurnLock::new(0u64);
    let anchor = lock.read();

    c.bench_function("turnlock_read_guard", |b| {
        b.iter(|| {
            let guard = lock.read();
            black_box(*guard);
        });
    });

    drop(anchor);
}

criterion_group!(
    benches,
    bench_reader_cycle,
    bench_writer_cycle,
    bench_read_guard
);
criterion_main!(benches);
