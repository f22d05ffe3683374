use crate::dsp::{
    delay::DelayLine,
    lfo::Lfo,
    mix::{blend_frames, Frame},
    smooth::SmoothedParam,
};

/*
Chorus Effect
=============

Chorus thickens a sound by mixing the dry signal with slightly delayed,
pitch-modulated copies. As a tap's delay time moves, its pitch bends up and
down a little, so one voice sounds like several playing together.

Three taps per channel sit around a 15 ms base delay. Each has its own sine
LFO, running at the base rate times 1.0, 1.13 and 0.87, so the taps never
line up. The right channel's LFOs start a quarter cycle ahead of the left.

  tap delay   15 ms + lfo · depth
  wet         mean of the three taps
  out         blend(dry, wet, dryWet)

Parameters
----------

Rate (0.1 - 3.0 Hz):
  LFO speed. Slower = subtle shimmer, faster = vibrato-like wobble.

Depth (0 - 10 ms):
  How far each tap swings around the base delay.

Dry/wet (0.0 - 1.0):
  0.5 gives the classic doubled sound.
*/

const TAPS: usize = 3;
const BASE_DELAY_MS: f32 = 15.0;
const TAP_RATE_SPREAD: [f32; TAPS] = [1.0, 1.13, 0.87];
const TAP_PHASES: [f32; TAPS] = [0.0, 0.33, 0.67];
const RIGHT_PHASE_OFFSET: f32 = 0.25;
const BUFFER_MS: f32 = 80.0;

pub const MAX_DEPTH_MS: f32 = 10.0;
pub const MIN_RATE_HZ: f32 = 0.01;
pub const MAX_RATE_HZ: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChorusParams {
    pub rate_hz: f32,
    pub depth_ms: f32,
    pub dry_wet: f32,
}

impl ChorusParams {
    pub const fn new(rate_hz: f32, depth_ms: f32, dry_wet: f32) -> Self {
        Self {
            rate_hz,
            depth_ms,
            dry_wet,
        }
    }
}

pub struct Chorus {
    lines: [DelayLine; 2],
    lfos: [[Lfo; TAPS]; 2],
    sample_rate: f32,
    rate: SmoothedParam,
    depth_ms: SmoothedParam,
    dry_wet: SmoothedParam,
}

impl Chorus {
    pub fn new(sample_rate: f32, smoothing_ms: f32) -> Self {
        let lfo_bank = |offset: f32| -> [Lfo; TAPS] {
            std::array::from_fn(|i| Lfo::new(sample_rate, TAP_RATE_SPREAD[i]).with_phase(TAP_PHASES[i] + offset))
        };

        Self {
            lines: [
                DelayLine::with_max_time(BUFFER_MS * 0.001, sample_rate),
                DelayLine::with_max_time(BUFFER_MS * 0.001, sample_rate),
            ],
            lfos: [lfo_bank(0.0), lfo_bank(RIGHT_PHASE_OFFSET)],
            sample_rate,
            rate: SmoothedParam::with_time(1.0, smoothing_ms, sample_rate),
            depth_ms: SmoothedParam::with_time(0.0, smoothing_ms, sample_rate),
            dry_wet: SmoothedParam::with_time(0.0, smoothing_ms, sample_rate),
        }
    }

    pub fn set_params(&mut self, params: &ChorusParams) {
        self.rate
            .set_target(params.rate_hz.clamp(MIN_RATE_HZ, MAX_RATE_HZ));
        self.depth_ms
            .set_target(params.depth_ms.clamp(0.0, MAX_DEPTH_MS));
        self.dry_wet.set_target(params.dry_wet.clamp(0.0, 1.0));
    }

    pub fn reset(&mut self) {
        for line in &mut self.lines {
            line.reset();
        }
        for (ch, bank) in self.lfos.iter_mut().enumerate() {
            let offset = if ch == 0 { 0.0 } else { RIGHT_PHASE_OFFSET };
            for (i, lfo) in bank.iter_mut().enumerate() {
                lfo.set_phase(TAP_PHASES[i] + offset);
            }
        }
        self.rate.snap();
        self.depth_ms.snap();
        self.dry_wet.snap();
    }

    #[inline]
    pub fn process(&mut self, input: Frame) -> Frame {
        let rate = self.rate.advance();
        let depth = self.depth_ms.advance();
        let mix = self.dry_wet.advance();
        let ms_to_samples = self.sample_rate * 0.001;

        let mut wet = [0.0; 2];
        for (ch, dry) in [input.left, input.right].into_iter().enumerate() {
            let mut sum = 0.0;
            for (i, lfo) in self.lfos[ch].iter_mut().enumerate() {
                lfo.set_rate(rate * TAP_RATE_SPREAD[i]);
                let delay_ms = BASE_DELAY_MS + lfo.next_bipolar() * depth;
                sum += self.lines[ch].read_interpolated(delay_ms * ms_to_samples);
            }
            self.lines[ch].write(dry);
            wet[ch] = sum / TAPS as f32;
        }

        blend_frames(input, Frame::new(wet[0], wet[1]), mix)
    }
}
