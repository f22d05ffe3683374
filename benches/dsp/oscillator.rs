//! Benchmarks for the sine and pulse oscillators.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use pod_synth::dsp::oscillator::Oscillator;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        let mut sine = Oscillator::sine(SAMPLE_RATE);
        sine.set_freq(440.0);
        group.bench_with_input(BenchmarkId::new("sine", size), &size, |b, _| {
            b.iter(|| sine.render(black_box(&mut buffer)))
        });

        let mut pulse = Oscillator::pulse(SAMPLE_RATE);
        pulse.set_freq(110.0);
        pulse.set_pulse_width(0.4);
        group.bench_with_input(BenchmarkId::new("pulse", size), &size, |b, _| {
            b.iter(|| pulse.render(black_box(&mut buffer)))
        });

        // Carrier driven by a modulator, the inner loop of the FM voice
        let mut carrier = Oscillator::sine(SAMPLE_RATE);
        let mut modulator = Oscillator::sine(SAMPLE_RATE);
        carrier.set_freq(220.0);
        modulator.set_freq(440.0);
        group.bench_with_input(BenchmarkId::new("phase_modulated", size), &size, |b, _| {
            b.iter(|| {
                for sample in buffer.iter_mut() {
                    carrier.phase_add(modulator.process() * 0.1);
                    *sample = carrier.process();
                }
                black_box(&buffer);
            })
        });
    }

    group.finish();
}
