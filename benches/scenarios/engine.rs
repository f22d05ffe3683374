//! Benchmarks for complete blocks through the engine.

use std::{collections::VecDeque, hint::black_box, sync::Arc};

use criterion::{BenchmarkId, Criterion};
use pod_synth::{BlockProcessor, EngineConfig, EngineKind, SharedControls, SynthMessage};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

fn loaded_engine(engine: EngineKind, block_size: usize) -> BlockProcessor<VecDeque<SynthMessage>> {
    let config = EngineConfig::default()
        .with_sample_rate(SAMPLE_RATE)
        .with_block_size(block_size)
        .with_engine(engine);

    let mut queue = VecDeque::new();
    for note in [48, 52, 55, 59, 60, 64, 67, 71] {
        queue.push_back(SynthMessage::NoteOn { note, velocity: 110 });
    }

    match BlockProcessor::with_receiver(config, queue, Arc::new(SharedControls::new())) {
        Ok(processor) => processor,
        Err(err) => panic!("bench config rejected: {err}"),
    }
}

pub fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/engine");

    for &size in BLOCK_SIZES {
        let mut out = vec![0.0f32; size * 2];

        for engine in [EngineKind::Subtractive, EngineKind::Fm] {
            let mut processor = loaded_engine(engine, size);
            group.bench_with_input(BenchmarkId::new(engine.name(), size), &size, |b, _| {
                b.iter(|| processor.process_block(black_box(&mut out)))
            });
        }
    }

    group.finish();
}
