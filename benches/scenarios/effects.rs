//! Benchmarks for each effect mode of the chain.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use pod_synth::{
    dsp::Frame,
    effects::{EffectMode, EffectSettings, EffectsChain},
};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

const MODES: [EffectMode; 6] = [
    EffectMode::Delay,
    EffectMode::PlainDelay,
    EffectMode::Chorus,
    EffectMode::Ensemble,
    EffectMode::Phaser,
    EffectMode::Octave,
];

pub fn bench_effects(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/effects");
    let settings = EffectSettings::new(2.0);

    for &size in BLOCK_SIZES {
        let input: Vec<Frame> = (0..size)
            .map(|i| Frame::mono((i as f32 * 0.03).sin() * 0.5))
            .collect();

        for mode in MODES {
            let mut chain = EffectsChain::new(SAMPLE_RATE, 2.0, 5.0, 8);
            chain.set_mode(mode, &settings);
            group.bench_with_input(BenchmarkId::new(mode.name(), size), &size, |b, _| {
                b.iter(|| {
                    for &frame in &input {
                        black_box(chain.process_frame(frame));
                    }
                })
            });
        }
    }

    group.finish();
}
