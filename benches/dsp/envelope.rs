//! Benchmarks for the ADSR envelope.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use pod_synth::dsp::envelope::Envelope;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Held gate: attack, decay, then sustain
        let mut held = Envelope::adsr(SAMPLE_RATE, 0.01, 0.1, 0.7, 0.3);
        held.retrigger();
        group.bench_with_input(BenchmarkId::new("gate_held", size), &size, |b, _| {
            b.iter(|| held.render(black_box(&mut buffer), true))
        });

        // Retriggered every block, release in between
        let mut retrig = Envelope::adsr(SAMPLE_RATE, 0.001, 0.05, 0.5, 0.05);
        group.bench_with_input(BenchmarkId::new("retrigger", size), &size, |b, _| {
            b.iter(|| {
                retrig.retrigger();
                retrig.render(black_box(&mut buffer[..size / 2]), true);
                retrig.release();
                retrig.render(black_box(&mut buffer[size / 2..]), false);
            })
        });
    }

    group.finish();
}
