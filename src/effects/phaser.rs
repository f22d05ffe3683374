use std::f32::consts::PI;

use crate::dsp::{
    lfo::Lfo,
    mix::{blend_frames, Frame},
    smooth::SmoothedParam,
};

/*
Phaser
======

A cascade of first-order all-pass filters shifts the phase of the input
without changing its level. Mixed back with the dry signal, the frequencies
where the cascade is 180° out of phase cancel, leaving notches. An LFO
sweeps the all-pass corner frequency so the notches move.

    in ──(+)──→ AP → AP → … → AP ──┬──→ blend(dryWet) ──→ out
          ▲                         │
          └──── × feedback ◄────────┘

All-pass stage (bilinear):

  a = (tan(π fc / fs) - 1) / (tan(π fc / fs) + 1)
  y = a·x + x₁ - a·y₁

Sweep, exponential between 200 Hz and 4 kHz:

  fc = 200 · 20^(lfo · depth)        lfo unipolar in [0, 1]

Each stage pair yields one notch, so 6 stages give 3 notches. Coefficients
need a tan() each and are recomputed every `control_rate` samples. The
right channel's LFO runs a quarter cycle ahead for stereo movement.
*/

pub const MIN_STAGES: usize = 2;
pub const MAX_STAGES: usize = 12;
pub const MIN_SWEEP_HZ: f32 = 200.0;
pub const MAX_SWEEP_HZ: f32 = 4_000.0;
pub const MAX_PHASER_FEEDBACK: f32 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaserParams {
    pub rate_hz: f32,
    /// Sweep depth as a fraction of the 200 Hz to 4 kHz range.
    pub depth: f32,
    pub feedback: f32,
    pub stages: usize,
    pub dry_wet: f32,
}

#[derive(Debug, Clone, Copy, Default)]
struct FirstOrderAllpass {
    a: f32,
    x1: f32,
    y1: f32,
}

impl FirstOrderAllpass {
    #[inline]
    fn set_frequency(&mut self, freq: f32, sample_rate: f32) {
        let freq = freq.clamp(10.0, sample_rate * 0.4);
        let t = (PI * freq / sample_rate).tan();
        self.a = (t - 1.0) / (t + 1.0);
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let output = self.a * input + self.x1 - self.a * self.y1;
        self.x1 = input;
        self.y1 = output;
        output
    }

    fn clear(&mut self) {
        self.x1 = 0.0;
        self.y1 = 0.0;
    }
}

pub struct Phaser {
    allpass: [[FirstOrderAllpass; MAX_STAGES]; 2],
    lfos: [Lfo; 2],
    stages: usize,
    sample_rate: f32,
    rate: SmoothedParam,
    depth: SmoothedParam,
    feedback: SmoothedParam,
    dry_wet: SmoothedParam,
    feedback_sample: [f32; 2],
    control_rate: usize,
    countdown: usize,
}

impl Phaser {
    pub fn new(sample_rate: f32, smoothing_ms: f32, control_rate: usize) -> Self {
        Self {
            allpass: [[FirstOrderAllpass::default(); MAX_STAGES]; 2],
            lfos: [
                Lfo::new(sample_rate, 0.4),
                Lfo::new(sample_rate, 0.4).with_phase(0.25),
            ],
            stages: 6,
            sample_rate,
            rate: SmoothedParam::with_time(0.4, smoothing_ms, sample_rate),
            depth: SmoothedParam::with_time(1.0, smoothing_ms, sample_rate),
            feedback: SmoothedParam::with_time(0.0, smoothing_ms, sample_rate),
            dry_wet: SmoothedParam::with_time(0.0, smoothing_ms, sample_rate),
            feedback_sample: [0.0; 2],
            control_rate: control_rate.max(1),
            countdown: 0,
        }
    }

    pub fn set_params(&mut self, params: &PhaserParams) {
        self.stages = params.stages.clamp(MIN_STAGES, MAX_STAGES);
        self.rate.set_target(params.rate_hz.clamp(0.01, 10.0));
        self.depth.set_target(params.depth.clamp(0.0, 1.0));
        self.feedback
            .set_target(params.feedback.clamp(-MAX_PHASER_FEEDBACK, MAX_PHASER_FEEDBACK));
        self.dry_wet.set_target(params.dry_wet.clamp(0.0, 1.0));
    }

    pub fn stages(&self) -> usize {
        self.stages
    }

    pub fn reset(&mut self) {
        for stage in self.allpass.iter_mut().flatten() {
            stage.clear();
        }
        self.lfos[0].set_phase(0.0);
        self.lfos[1].set_phase(0.25);
        self.feedback_sample = [0.0; 2];
        self.countdown = 0;
        self.rate.snap();
        self.depth.snap();
        self.feedback.snap();
        self.dry_wet.snap();
    }

    #[inline]
    pub fn process(&mut self, input: Frame) -> Frame {
        let rate = self.rate.advance();
        let depth = self.depth.advance();
        let feedback = self.feedback.advance();
        let mix = self.dry_wet.advance();

        let mut sweep = [0.0; 2];
        for (lfo, s) in self.lfos.iter_mut().zip(sweep.iter_mut()) {
            lfo.set_rate(rate);
            *s = lfo.next_unipolar();
        }

        if self.countdown == 0 {
            let range = MAX_SWEEP_HZ / MIN_SWEEP_HZ;
            for (ch, stages) in self.allpass.iter_mut().enumerate() {
                let freq = MIN_SWEEP_HZ * range.powf(sweep[ch] * depth);
                for stage in stages.iter_mut().take(self.stages) {
                    stage.set_frequency(freq, self.sample_rate);
                }
            }
            self.countdown = self.control_rate;
        }
        self.countdown -= 1;

        let mut wet = [0.0; 2];
        for (ch, dry) in [input.left, input.right].into_iter().enumerate() {
            let mut x = dry + self.feedback_sample[ch] * feedback;
            for stage in self.allpass[ch].iter_mut().take(self.stages) {
                x = stage.process(x);
            }
            self.feedback_sample[ch] = x;
            wet[ch] = x;
        }

        blend_frames(input, Frame::new(wet[0], wet[1]), mix)
    }
}
