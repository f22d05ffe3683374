//! Low Frequency Oscillator (LFO) for effect modulation.

/*
Low Frequency Oscillators
=========================

An LFO is an oscillator running at sub-audio frequencies (~0.01-20 Hz). It
never reaches the output directly; it moves a parameter over time: chorus
tap delay, phaser sweep frequency.

  bipolar     Output swings -1.0 to +1.0. Natural for symmetric movement
              (delay time above and below a centre).

  unipolar    0.0 to 1.0. Natural for sweeps that start at a floor
              (phaser minimum frequency).
              Convert: unipolar = (bipolar + 1.0) / 2.0

  phase       Position in the cycle, [0.0, 1.0). Stereo effects run one LFO
              per channel with a phase offset (0.25 = 90 degrees) so the
              channels move against each other.

The rate is itself smoothed by the effects that own an LFO, so a knob turn
bends the LFO speed instead of jumping it.
*/

use std::f32::consts::TAU;

/// Convert bipolar signal (-1.0 to +1.0) to unipolar (0.0 to 1.0).
#[inline]
pub fn bipolar_to_unipolar(bipolar: f32) -> f32 {
    (bipolar + 1.0) * 0.5
}

/// Convert unipolar signal (0.0 to 1.0) to bipolar (-1.0 to +1.0).
#[inline]
pub fn unipolar_to_bipolar(unipolar: f32) -> f32 {
    (unipolar * 2.0) - 1.0
}

/// Sine LFO with a free-running phase.
#[derive(Debug, Clone)]
pub struct Lfo {
    sample_rate: f32,
    rate_hz: f32,
    phase: f32,
}

impl Lfo {
    pub fn new(sample_rate: f32, rate_hz: f32) -> Self {
        Self {
            sample_rate,
            rate_hz: rate_hz.max(0.0),
            phase: 0.0,
        }
    }

    /// Start the LFO `offset` of a cycle ahead (0.25 = 90 degrees).
    pub fn with_phase(mut self, offset: f32) -> Self {
        self.phase = offset.rem_euclid(1.0);
        self
    }

    pub fn set_rate(&mut self, rate_hz: f32) {
        self.rate_hz = rate_hz.max(0.0);
    }

    pub fn rate(&self) -> f32 {
        self.rate_hz
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Set the phase directly (wrapped into [0, 1)).
    pub fn set_phase(&mut self, phase: f32) {
        self.phase = phase.rem_euclid(1.0);
    }

    /// Current bipolar value, then advance one sample.
    #[inline]
    pub fn next_bipolar(&mut self) -> f32 {
        let value = (self.phase * TAU).sin();
        self.phase += self.rate_hz / self.sample_rate;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        value
    }

    #[inline]
    pub fn next_unipolar(&mut self) -> f32 {
        bipolar_to_unipolar(self.next_bipolar())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bipolar_to_unipolar() {
        assert!((bipolar_to_unipolar(-1.0) - 0.0).abs() < 1e-6);
        assert!((bipolar_to_unipolar(0.0) - 0.5).abs() < 1e-6);
        assert!((bipolar_to_unipolar(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_unipolar_to_bipolar() {
        assert!((unipolar_to_bipolar(0.0) - (-1.0)).abs() < 1e-6);
        assert!((unipolar_to_bipolar(0.5) - 0.0).abs() < 1e-6);
        assert!((unipolar_to_bipolar(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_lfo_output_range() {
        let mut lfo = Lfo::new(48_000.0, 5.0);
        for _ in 0..20_000 {
            let b = lfo.next_bipolar();
            assert!((-1.0..=1.0).contains(&b));
        }
        let mut lfo = Lfo::new(48_000.0, 3.0);
        for _ in 0..20_000 {
            let u = lfo.next_unipolar();
            assert!((0.0..=1.0).contains(&u));
        }
    }

    #[test]
    fn test_lfo_completes_cycle_at_rate() {
        // 10 Hz at 1 kHz: 100 samples per cycle.
        let mut lfo = Lfo::new(1_000.0, 10.0);
        for _ in 0..100 {
            lfo.next_bipolar();
        }
        assert!(lfo.phase() < 1e-3 || lfo.phase() > 1.0 - 1e-3);
    }

    #[test]
    fn test_quarter_phase_offset_starts_at_peak() {
        let mut lfo = Lfo::new(48_000.0, 1.0).with_phase(0.25);
        assert!((lfo.next_bipolar() - 1.0).abs() < 1e-6);
    }
}
