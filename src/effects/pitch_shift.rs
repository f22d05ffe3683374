use crate::dsp::{
    delay::DelayLine,
    mix::{blend_frames, Frame},
    smooth::SmoothedParam,
};

/*
Delay-Line Pitch Shifter
========================

Reading a delay line at a moving delay changes pitch: if the delay shrinks
by one sample per sample the read head runs at double speed, one octave up.
A single head would run out of buffer, so two heads sweep the same window
half a cycle apart and crossfade with triangular gains.

  ratio       2^(semitones / 12)
  phase       advances by (1 - ratio) / window per sample, wrapped to [0, 1)
  head delay  1 + phase · window           (second head: phase + 0.5)
  gain        g(p) = 1 - |2p - 1|          g(p) + g(p + 0.5) = 1

Each head jumps back to the far end of the window exactly when its gain is
zero, so the wrap is inaudible. Longer windows smear transients
less audibly; shorter ones flutter less on sustained tones.
*/

pub const MIN_WINDOW_MS: f32 = 20.0;
pub const MAX_WINDOW_MS: f32 = 80.0;
pub const MAX_SHIFT_SEMITONES: f32 = 24.0;
const BUFFER_MS: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctaveParams {
    pub semitones: f32,
    pub window_ms: f32,
    pub dry_wet: f32,
}

#[inline]
fn crossfade_gain(phase: f32) -> f32 {
    1.0 - (2.0 * phase - 1.0).abs()
}

pub struct PitchShifter {
    lines: [DelayLine; 2],
    sample_rate: f32,
    phase: f32,
    ratio: f32,
    // In samples
    window: SmoothedParam,
    dry_wet: SmoothedParam,
}

impl PitchShifter {
    pub fn new(sample_rate: f32, smoothing_ms: f32) -> Self {
        let window = 40.0 * 0.001 * sample_rate;
        Self {
            lines: [
                DelayLine::with_max_time(BUFFER_MS * 0.001, sample_rate),
                DelayLine::with_max_time(BUFFER_MS * 0.001, sample_rate),
            ],
            sample_rate,
            phase: 0.0,
            ratio: 2.0,
            window: SmoothedParam::with_time(window, smoothing_ms, sample_rate),
            dry_wet: SmoothedParam::with_time(0.0, smoothing_ms, sample_rate),
        }
    }

    pub fn set_params(&mut self, params: &OctaveParams) {
        let semitones = params.semitones.clamp(-MAX_SHIFT_SEMITONES, MAX_SHIFT_SEMITONES);
        self.ratio = 2.0_f32.powf(semitones / 12.0);
        let window_ms = params.window_ms.clamp(MIN_WINDOW_MS, MAX_WINDOW_MS);
        self.window.set_target(window_ms * 0.001 * self.sample_rate);
        self.dry_wet.set_target(params.dry_wet.clamp(0.0, 1.0));
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    pub fn reset(&mut self) {
        for line in &mut self.lines {
            line.reset();
        }
        self.phase = 0.0;
        self.window.snap();
        self.dry_wet.snap();
    }

    #[inline]
    pub fn process(&mut self, input: Frame) -> Frame {
        let window = self.window.advance();
        let mix = self.dry_wet.advance();

        self.phase = (self.phase + (1.0 - self.ratio) / window).rem_euclid(1.0);
        // rem_euclid can round up to exactly 1.0 for tiny negative inputs
        if self.phase >= 1.0 {
            self.phase = 0.0;
        }
        let phase_b = (self.phase + 0.5) % 1.0;
        let (gain_a, gain_b) = (crossfade_gain(self.phase), crossfade_gain(phase_b));
        let (delay_a, delay_b) = (1.0 + self.phase * window, 1.0 + phase_b * window);

        let mut wet = [0.0; 2];
        for (ch, dry) in [input.left, input.right].into_iter().enumerate() {
            let line = &mut self.lines[ch];
            wet[ch] = line.read_interpolated(delay_a) * gain_a
                + line.read_interpolated(delay_b) * gain_b;
            line.write(dry);
        }

        blend_frames(input, Frame::new(wet[0], wet[1]), mix)
    }
}
