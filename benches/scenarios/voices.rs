//! Benchmarks for fully loaded voice pools.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use pod_synth::{
    synth::{
        fm_voice::FmVoice,
        patch::{FmPatch, SubtractivePatch},
        voice::{Voice, VoiceSide},
        VoicePool,
    },
    StealPolicy,
};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

const CHORD: [u8; 8] = [48, 52, 55, 59, 60, 64, 67, 71];

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");

    let sub_patch = SubtractivePatch::default();
    let fm_patch = FmPatch {
        ratio: 2.0,
        mod_index: 3.0,
        feedback: 0.4,
        ..FmPatch::default()
    };

    for &size in BLOCK_SIZES {
        // === SUBTRACTIVE ===
        // 8 voices, two pulse oscillators and two filters each
        let mut subtractive = VoicePool::new(
            8,
            |_: usize| Voice::new(SAMPLE_RATE, VoiceSide::Left, &sub_patch),
            StealPolicy::default(),
        );
        for note in CHORD {
            subtractive.allocate(note, 100, &sub_patch);
        }
        group.bench_with_input(BenchmarkId::new("subtractive_x8", size), &size, |b, _| {
            b.iter(|| {
                for _ in 0..size {
                    black_box(subtractive.mix_down());
                }
            })
        });

        // === FM ===
        // 8 stereo two-operator voices with feedback
        let mut fm = VoicePool::new(
            8,
            |_: usize| FmVoice::new(SAMPLE_RATE, &fm_patch),
            StealPolicy::default(),
        );
        for note in CHORD {
            fm.allocate(note, 100, &fm_patch);
        }
        group.bench_with_input(BenchmarkId::new("fm_x8", size), &size, |b, _| {
            b.iter(|| {
                for _ in 0..size {
                    black_box(fm.mix_down());
                }
            })
        });
    }

    group.finish();
}
