//! Benchmarks for the circular delay line.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use pod_synth::dsp::delay::DelayLine;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/delay");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.05).sin()).collect();

        let mut line = DelayLine::with_max_time(1.0, SAMPLE_RATE);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("integer_tap", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                line.render(black_box(&mut buffer), 12_000);
            })
        });

        // Fractional read, as in the chorus and pitch shifter
        let mut line = DelayLine::with_max_time(0.1, SAMPLE_RATE);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("interpolated_tap", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                for (i, sample) in buffer.iter_mut().enumerate() {
                    line.write(*sample);
                    *sample = line.read_interpolated(720.0 + (i % 64) as f32 * 0.37);
                }
                black_box(&buffer);
            })
        });
    }

    group.finish();
}
