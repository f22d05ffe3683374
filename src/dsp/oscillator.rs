use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Phase-Accumulator Oscillator
============================

  phase       Position inside one cycle, kept in [0.0, 1.0).
  increment   freq / sample_rate. Added to phase once per sample.
  phase add   An extra offset pushed into the accumulator from outside.
              The FM voice feeds its modulator through this, which makes
              it phase modulation: the modulator moves the carrier's phase
              directly instead of retuning its increment.

Saw and pulse are band-limited with PolyBLEP: a two-sample polynomial
correction around each discontinuity that removes most of the aliasing a
naive ramp would fold back into the audible band.

  Saw:      ╱│╱│╱│      2·phase - 1 - blep(phase)
  Pulse:    ┌┐_┌┐_      ±1 with a blep at both edges; the high portion of
                        the cycle is `pulse_width`.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Saw,
    Pulse,
}

#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: Waveform,
    sample_rate: f32,
    freq: f32,
    increment: f32,
    phase: f32,
    amp: f32,
    pulse_width: f32,
}

impl Oscillator {
    pub fn new(sample_rate: f32, waveform: Waveform) -> Self {
        let mut osc = Self {
            waveform,
            sample_rate,
            freq: 440.0,
            increment: 0.0,
            phase: 0.0,
            amp: 1.0,
            pulse_width: 0.5,
        };
        osc.set_freq(440.0);
        osc
    }

    pub fn sine(sample_rate: f32) -> Self {
        Self::new(sample_rate, Waveform::Sine)
    }

    pub fn pulse(sample_rate: f32) -> Self {
        Self::new(sample_rate, Waveform::Pulse)
    }

    pub fn set_freq(&mut self, freq: f32) {
        self.freq = freq;
        self.increment = freq / self.sample_rate;
    }

    pub fn freq(&self) -> f32 {
        self.freq
    }

    pub fn set_amp(&mut self, amp: f32) {
        self.amp = amp;
    }

    /// Pulse width as a fraction of the cycle, clamped to [0.01, 0.99].
    pub fn set_pulse_width(&mut self, width: f32) {
        self.pulse_width = width.clamp(0.01, 0.99);
    }

    pub fn pulse_width(&self) -> f32 {
        self.pulse_width
    }

    /// Offset the phase accumulator by `cycles` (1.0 = one full period).
    #[inline]
    pub fn phase_add(&mut self, cycles: f32) {
        self.phase = wrap_unit(self.phase + cycles);
    }

    pub fn reset_phase(&mut self) {
        self.phase = 0.0;
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Produce the sample at the current phase, then advance by one sample.
    #[inline]
    pub fn process(&mut self) -> f32 {
        let dt = self.increment.abs().min(0.5);
        let t = self.phase;

        let value = match self.waveform {
            Waveform::Sine => (t * TAU).sin(),
            Waveform::Triangle => 1.0 - 4.0 * (t - 0.5).abs(),
            Waveform::Saw => 2.0 * t - 1.0 - poly_blep(t, dt),
            Waveform::Pulse => {
                let pw = self.pulse_width;
                let naive = if t < pw { 1.0 } else { -1.0 };
                naive + poly_blep(t, dt) - poly_blep(wrap_unit(t + 1.0 - pw), dt)
            }
        };

        self.phase = wrap_unit(self.phase + self.increment);
        value * self.amp
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process();
        }
    }
}

#[inline]
fn wrap_unit(phase: f32) -> f32 {
    let wrapped = phase.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

#[inline]
fn poly_blep(t: f32, dt: f32) -> f32 {
    if dt <= 0.0 {
        return 0.0;
    }
    if t < dt {
        let t = t / dt;
        t + t - t * t - 1.0
    } else if t > 1.0 - dt {
        let t = (t - 1.0) / dt;
        t * t + t + t + 1.0
    } else {
        0.0
    }
}
