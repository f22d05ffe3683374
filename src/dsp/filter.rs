use std::f32::consts::PI;

/*
Topology-preserving (trapezoidal) state-variable filter, read at its
low-pass tap (v2): passes below the cutoff, rejects above it.
`g = tan(π·fc/fs)` is the pre-warped integrator gain and
`k = 2 - 2·resonance` is the damping, so resonance 0.0 is a gentle
Butterworth-ish slope and resonance → 1.0 approaches self-oscillation.

The coefficients are cached: `set_cutoff`/`set_resonance` recompute them,
so the per-sample path is a handful of multiply-adds. That is what lets the
voice update its cutoff only every K samples.
*/

/// Cutoff range accepted by every filter in the crate.
pub const MIN_CUTOFF_HZ: f32 = 20.0;
pub const MAX_CUTOFF_HZ: f32 = 20_000.0;
const MAX_RESONANCE: f32 = 0.98;

#[derive(Debug, Clone)]
pub struct SVFilter {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory

    sample_rate: f32,
    cutoff_hz: f32,
    resonance: f32,
    g: f32,
    k: f32,
}

impl SVFilter {
    pub fn new(sample_rate: f32) -> Self {
        let mut filter = Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            sample_rate,
            cutoff_hz: 1000.0,
            resonance: 0.0,
            g: 0.0,
            k: 2.0,
        };
        filter.update_coefficients();
        filter
    }

    pub fn lowpass(sample_rate: f32, cutoff_hz: f32) -> Self {
        let mut filter = Self::new(sample_rate);
        filter.set_cutoff(cutoff_hz);
        filter
    }

    /// Set the cutoff, clamped to [20 Hz, 20 kHz] and below Nyquist.
    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        let ceiling = MAX_CUTOFF_HZ.min(self.sample_rate * 0.49);
        self.cutoff_hz = cutoff_hz.clamp(MIN_CUTOFF_HZ, ceiling);
        self.update_coefficients();
    }

    /// Set resonance in [0, 0.98].
    pub fn set_resonance(&mut self, resonance: f32) {
        self.resonance = resonance.clamp(0.0, MAX_RESONANCE);
        self.update_coefficients();
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff_hz
    }

    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    #[inline]
    fn update_coefficients(&mut self) {
        self.g = (PI * self.cutoff_hz / self.sample_rate).tan();
        self.k = 2.0 - 2.0 * self.resonance;
    }

    /// Filter one sample.
    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let (g, k) = (self.g, self.k);
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;
        v2
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }
}
