use crate::dsp::{
    delay::DelayLine,
    mix::{blend_frames, Frame},
    smooth::SmoothedParam,
};

/*
Feedback Delay
==============

Stereo echo: one delay line per channel, with the delayed signal fed back
into the line.

    in ──┬──────────────────────────────────────┐
         │                                      ├─→ blend(dryWet) ──→ out
         └─→ (+) ──→ [ delay line, d samples ] ─┤
              ▲                                 │
              └────────── × feedback ◄──────────┘

  delayed = line.read(d)
  line.write(in + delayed · feedback)
  out     = blend(in, delayed, dryWet)

Time, feedback and dry/wet are all one-pole smoothed, so a knob sweep bends
the delay time (a tape-like pitch glide) instead of clicking. Feedback is
capped at 0.95 so the tail always dies.
*/

pub const MAX_DELAY_FEEDBACK: f32 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayParams {
    pub time_s: f32,
    pub feedback: f32,
    pub dry_wet: f32,
}

impl DelayParams {
    pub const fn new(time_s: f32, feedback: f32, dry_wet: f32) -> Self {
        Self {
            time_s,
            feedback,
            dry_wet,
        }
    }
}

pub struct FeedbackDelay {
    lines: [DelayLine; 2],
    sample_rate: f32,
    // In samples
    time: SmoothedParam,
    feedback: SmoothedParam,
    dry_wet: SmoothedParam,
}

impl FeedbackDelay {
    pub fn new(sample_rate: f32, max_delay_s: f32, smoothing_ms: f32) -> Self {
        Self {
            lines: [
                DelayLine::with_max_time(max_delay_s, sample_rate),
                DelayLine::with_max_time(max_delay_s, sample_rate),
            ],
            sample_rate,
            time: SmoothedParam::with_time(1.0, smoothing_ms, sample_rate),
            feedback: SmoothedParam::with_time(0.0, smoothing_ms, sample_rate),
            dry_wet: SmoothedParam::with_time(0.0, smoothing_ms, sample_rate),
        }
    }

    pub fn set_params(&mut self, params: &DelayParams) {
        let samples = (params.time_s * self.sample_rate).clamp(1.0, self.lines[0].max_delay() - 1.0);
        self.time.set_target(samples);
        self.feedback
            .set_target(params.feedback.clamp(0.0, MAX_DELAY_FEEDBACK));
        self.dry_wet.set_target(params.dry_wet.clamp(0.0, 1.0));
    }

    /// Clear the lines and jump every parameter to its target.
    pub fn reset(&mut self) {
        for line in &mut self.lines {
            line.reset();
        }
        self.time.snap();
        self.feedback.snap();
        self.dry_wet.snap();
    }

    /// Current (smoothed) delay time in samples.
    pub fn delay_samples(&self) -> f32 {
        self.time.current()
    }

    pub fn max_delay_seconds(&self) -> f32 {
        (self.lines[0].max_delay() - 1.0) / self.sample_rate
    }

    #[inline]
    pub fn process(&mut self, input: Frame) -> Frame {
        let time = self.time.advance();
        let feedback = self.feedback.advance();
        let mix = self.dry_wet.advance();

        let mut wet = [0.0; 2];
        for (ch, dry) in [input.left, input.right].into_iter().enumerate() {
            let line = &mut self.lines[ch];
            let delayed = line.read_interpolated(time);
            line.write(dry + delayed * feedback);
            wet[ch] = delayed;
        }

        blend_frames(input, Frame::new(wet[0], wet[1]), mix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn delay(params: DelayParams) -> FeedbackDelay {
        let mut delay = FeedbackDelay::new(SAMPLE_RATE, 2.0, 50.0);
        delay.set_params(&params);
        delay.reset();
        delay
    }

    #[test]
    fn impulse_comes_back_after_the_delay_time() {
        // 1/64 s is exactly 750 samples.
        let mut fx = delay(DelayParams::new(0.015625, 0.0, 1.0));
        let mut out = Vec::new();
        out.push(fx.process(Frame::mono(1.0)));
        for _ in 0..1_000 {
            out.push(fx.process(Frame::SILENCE));
        }

        for (i, frame) in out.iter().enumerate() {
            let expected = if i == 750 { 1.0 } else { 0.0 };
            assert!((frame.left - expected).abs() < 1e-6, "sample {i}: {}", frame.left);
            assert!((frame.right - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn feedback_produces_decaying_repeats() {
        // 1/128 s is exactly 375 samples.
        let mut fx = delay(DelayParams::new(0.0078125, 0.5, 1.0));
        fx.process(Frame::mono(1.0));
        let mut echoes = Vec::new();
        for i in 1..=1_200 {
            let frame = fx.process(Frame::SILENCE);
            if i % 375 == 0 {
                echoes.push(frame.left);
            }
        }
        assert!((echoes[0] - 1.0).abs() < 1e-6);
        assert!((echoes[1] - 0.5).abs() < 1e-6);
        assert!((echoes[2] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn feedback_is_capped() {
        let mut fx = delay(DelayParams::new(0.001, 10.0, 1.0));
        fx.process(Frame::mono(1.0));
        let mut peak = 0.0_f32;
        for _ in 0..48_000 {
            peak = peak.max(fx.process(Frame::SILENCE).peak());
        }
        assert!(peak <= 1.0 + 1e-6);
    }

    #[test]
    fn dry_only_passes_input_through() {
        let mut fx = delay(DelayParams::new(0.1, 0.5, 0.0));
        for i in 0..100 {
            let x = (i as f32 * 0.1).sin();
            let out = fx.process(Frame::new(x, -x));
            assert!((out.left - x).abs() < 1e-6);
            assert!((out.right + x).abs() < 1e-6);
        }
    }

    #[test]
    fn time_changes_glide() {
        let mut fx = delay(DelayParams::new(0.1, 0.0, 1.0));
        fx.set_params(&DelayParams::new(0.2, 0.0, 1.0));
        fx.process(Frame::SILENCE);
        let after_one = fx.delay_samples();
        assert!(after_one > 4_800.0 && after_one < 9_600.0);
    }

    #[test]
    fn time_is_clamped_to_the_buffer() {
        let mut fx = delay(DelayParams::new(100.0, 0.0, 1.0));
        assert!(fx.delay_samples() <= 2.0 * SAMPLE_RATE + 1.0);
        fx.set_params(&DelayParams::new(0.0, 0.0, 1.0));
        fx.reset();
        assert_eq!(fx.delay_samples(), 1.0);
    }
}
