//! Stereo effect modes, one active at a time.
//!
//! The mode set is closed: [`EffectMode`] names every mode and
//! [`EffectsChain::process_frame`] dispatches with a single `match`. Each
//! mode keeps its own parameter struct inside [`EffectSettings`], so
//! switching modes and back restores where the knobs left it.

use tracing::debug;

use crate::{dsp::mix::Frame, synth::EngineKind};

pub mod chorus;
pub mod delay;
pub mod phaser;
pub mod pitch_shift;

pub use chorus::{Chorus, ChorusParams};
pub use delay::{DelayParams, FeedbackDelay};
pub use phaser::{Phaser, PhaserParams};
pub use pitch_shift::{OctaveParams, PitchShifter};

const MIN_DELAY_TIME_S: f32 = 0.02;
const MAX_KNOB_DELAY_FEEDBACK: f32 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectMode {
    Delay,
    Chorus,
    /// Chorus into delay.
    Ensemble,
    Phaser,
    Octave,
    /// Delay with fixed feedback; the knobs set time and dry/wet.
    PlainDelay,
}

const SUBTRACTIVE_MODES: [EffectMode; 5] = [
    EffectMode::Delay,
    EffectMode::Chorus,
    EffectMode::Ensemble,
    EffectMode::Phaser,
    EffectMode::Octave,
];

const FM_MODES: [EffectMode; 4] = [
    EffectMode::PlainDelay,
    EffectMode::Chorus,
    EffectMode::Phaser,
    EffectMode::Octave,
];

impl EffectMode {
    /// Modes the encoder cycles through for `engine`, in order.
    pub fn available(engine: EngineKind) -> &'static [EffectMode] {
        match engine {
            EngineKind::Subtractive => &SUBTRACTIVE_MODES,
            EngineKind::Fm => &FM_MODES,
        }
    }

    pub fn first(engine: EngineKind) -> EffectMode {
        Self::available(engine)[0]
    }

    /// Move `increment` places through `engine`'s list, wrapping both ways.
    /// A mode not in the list counts as its first entry.
    pub fn step(self, engine: EngineKind, increment: i32) -> EffectMode {
        let modes = Self::available(engine);
        let current = modes.iter().position(|&m| m == self).unwrap_or(0) as i64;
        let index = (current + increment as i64).rem_euclid(modes.len() as i64);
        modes[index as usize]
    }

    pub fn name(self) -> &'static str {
        match self {
            EffectMode::Delay => "Delay",
            EffectMode::Chorus => "Chorus",
            EffectMode::Ensemble => "Ensemble",
            EffectMode::Phaser => "Phaser",
            EffectMode::Octave => "Octave",
            EffectMode::PlainDelay => "Plain delay",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnsembleParams {
    pub chorus: ChorusParams,
    pub delay: DelayParams,
}

/// Parameters for every mode. Only the active mode's entry is heard.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectSettings {
    pub delay: DelayParams,
    pub plain_delay: DelayParams,
    pub chorus: ChorusParams,
    pub ensemble: EnsembleParams,
    pub phaser: PhaserParams,
    pub octave: OctaveParams,
    max_delay_s: f32,
}

impl EffectSettings {
    pub fn new(max_delay_s: f32) -> Self {
        let time = |t: f32| t.min(max_delay_s);
        Self {
            delay: DelayParams::new(time(0.35), 0.4, 0.35),
            plain_delay: DelayParams::new(time(0.25), 0.3, 0.3),
            chorus: ChorusParams::new(0.8, 3.0, 0.5),
            ensemble: EnsembleParams {
                chorus: ChorusParams::new(0.5, 4.0, 0.5),
                delay: DelayParams::new(time(0.25), 0.3, 0.25),
            },
            phaser: PhaserParams {
                rate_hz: 0.4,
                depth: 1.0,
                feedback: 0.5,
                stages: 6,
                dry_wet: 0.5,
            },
            octave: OctaveParams {
                semitones: 12.0,
                window_ms: 40.0,
                dry_wet: 0.5,
            },
            max_delay_s,
        }
    }

    pub fn max_delay_seconds(&self) -> f32 {
        self.max_delay_s
    }

    fn knob_to_time(&self, knob: f32) -> f32 {
        let max = self.max_delay_s.max(MIN_DELAY_TIME_S);
        MIN_DELAY_TIME_S + knob * (max - MIN_DELAY_TIME_S)
    }

    /// Map the two knobs onto `mode`'s parameters. Knob values are clamped
    /// to [0, 1].
    pub fn apply_knobs(&mut self, mode: EffectMode, knob1: f32, knob2: f32) {
        let (k1, k2) = (knob1.clamp(0.0, 1.0), knob2.clamp(0.0, 1.0));
        match mode {
            EffectMode::Delay => {
                self.delay.time_s = self.knob_to_time(k1);
                self.delay.feedback = k2 * MAX_KNOB_DELAY_FEEDBACK;
            }
            EffectMode::PlainDelay => {
                self.plain_delay.time_s = self.knob_to_time(k1);
                self.plain_delay.dry_wet = k2;
            }
            EffectMode::Chorus => {
                self.chorus.dry_wet = k1;
                self.chorus.depth_ms = 1.0 + k2 * 9.0;
                self.chorus.rate_hz = 0.1 + k2 * 2.9;
            }
            EffectMode::Ensemble => {
                self.ensemble.chorus.dry_wet = k1;
                self.ensemble.delay.feedback = k2 * MAX_KNOB_DELAY_FEEDBACK;
            }
            EffectMode::Phaser => {
                self.phaser.dry_wet = k1;
                self.phaser.rate_hz = 0.05 + k2 * 4.95;
            }
            EffectMode::Octave => {
                self.octave.dry_wet = k1;
                let range = pitch_shift::MAX_WINDOW_MS - pitch_shift::MIN_WINDOW_MS;
                self.octave.window_ms = pitch_shift::MIN_WINDOW_MS + k2 * range;
            }
        }
    }

    /// Knob positions that reproduce the current settings for `mode`.
    pub fn knob_positions(&self, mode: EffectMode) -> (f32, f32) {
        let max = self.max_delay_s.max(MIN_DELAY_TIME_S);
        let time = |t: f32| (t - MIN_DELAY_TIME_S) / (max - MIN_DELAY_TIME_S).max(f32::EPSILON);
        let window = pitch_shift::MAX_WINDOW_MS - pitch_shift::MIN_WINDOW_MS;
        let (k1, k2) = match mode {
            EffectMode::Delay => (
                time(self.delay.time_s),
                self.delay.feedback / MAX_KNOB_DELAY_FEEDBACK,
            ),
            EffectMode::PlainDelay => (time(self.plain_delay.time_s), self.plain_delay.dry_wet),
            EffectMode::Chorus => (self.chorus.dry_wet, (self.chorus.depth_ms - 1.0) / 9.0),
            EffectMode::Ensemble => (
                self.ensemble.chorus.dry_wet,
                self.ensemble.delay.feedback / MAX_KNOB_DELAY_FEEDBACK,
            ),
            EffectMode::Phaser => (self.phaser.dry_wet, (self.phaser.rate_hz - 0.05) / 4.95),
            EffectMode::Octave => (
                self.octave.dry_wet,
                (self.octave.window_ms - pitch_shift::MIN_WINDOW_MS) / window,
            ),
        };
        (k1.clamp(0.0, 1.0), k2.clamp(0.0, 1.0))
    }

    pub fn set_dry_wet(&mut self, mode: EffectMode, value: f32) {
        let value = value.clamp(0.0, 1.0);
        match mode {
            EffectMode::Delay => self.delay.dry_wet = value,
            EffectMode::PlainDelay => self.plain_delay.dry_wet = value,
            EffectMode::Chorus => self.chorus.dry_wet = value,
            EffectMode::Ensemble => self.ensemble.chorus.dry_wet = value,
            EffectMode::Phaser => self.phaser.dry_wet = value,
            EffectMode::Octave => self.octave.dry_wet = value,
        }
    }

    pub fn dry_wet(&self, mode: EffectMode) -> f32 {
        match mode {
            EffectMode::Delay => self.delay.dry_wet,
            EffectMode::PlainDelay => self.plain_delay.dry_wet,
            EffectMode::Chorus => self.chorus.dry_wet,
            EffectMode::Ensemble => self.ensemble.chorus.dry_wet,
            EffectMode::Phaser => self.phaser.dry_wet,
            EffectMode::Octave => self.octave.dry_wet,
        }
    }
}

/// Every effect processor, pre-sized, with one of them active.
pub struct EffectsChain {
    mode: EffectMode,
    delay: FeedbackDelay,
    chorus: Chorus,
    phaser: Phaser,
    octave: PitchShifter,
}

impl EffectsChain {
    pub fn new(sample_rate: f32, max_delay_s: f32, smoothing_ms: f32, control_rate: usize) -> Self {
        Self {
            mode: EffectMode::Delay,
            delay: FeedbackDelay::new(sample_rate, max_delay_s, smoothing_ms),
            chorus: Chorus::new(sample_rate, smoothing_ms),
            phaser: Phaser::new(sample_rate, smoothing_ms, control_rate),
            octave: PitchShifter::new(sample_rate, smoothing_ms),
        }
    }

    pub fn mode(&self) -> EffectMode {
        self.mode
    }

    /// Switch to `mode`, starting its processors from silence with their
    /// parameters already at `settings`.
    pub fn set_mode(&mut self, mode: EffectMode, settings: &EffectSettings) {
        debug!(from = self.mode.name(), to = mode.name(), "effect mode");
        self.mode = mode;
        self.apply(settings);
        match mode {
            EffectMode::Delay | EffectMode::PlainDelay => self.delay.reset(),
            EffectMode::Chorus => self.chorus.reset(),
            EffectMode::Ensemble => {
                self.chorus.reset();
                self.delay.reset();
            }
            EffectMode::Phaser => self.phaser.reset(),
            EffectMode::Octave => self.octave.reset(),
        }
    }

    /// Retarget the active mode's smoothers.
    pub fn apply(&mut self, settings: &EffectSettings) {
        match self.mode {
            EffectMode::Delay => self.delay.set_params(&settings.delay),
            EffectMode::PlainDelay => self.delay.set_params(&settings.plain_delay),
            EffectMode::Chorus => self.chorus.set_params(&settings.chorus),
            EffectMode::Ensemble => {
                self.chorus.set_params(&settings.ensemble.chorus);
                self.delay.set_params(&settings.ensemble.delay);
            }
            EffectMode::Phaser => self.phaser.set_params(&settings.phaser),
            EffectMode::Octave => self.octave.set_params(&settings.octave),
        }
    }

    #[inline]
    pub fn process_frame(&mut self, input: Frame) -> Frame {
        match self.mode {
            EffectMode::Delay | EffectMode::PlainDelay => self.delay.process(input),
            EffectMode::Chorus => self.chorus.process(input),
            EffectMode::Ensemble => self.delay.process(self.chorus.process(input)),
            EffectMode::Phaser => self.phaser.process(input),
            EffectMode::Octave => self.octave.process(input),
        }
    }

    pub fn delay(&self) -> &FeedbackDelay {
        &self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    #[test]
    fn encoder_wraps_both_ways() {
        let fm = EngineKind::Fm;
        assert_eq!(EffectMode::PlainDelay.step(fm, 1), EffectMode::Chorus);
        assert_eq!(EffectMode::Octave.step(fm, 1), EffectMode::PlainDelay);
        assert_eq!(EffectMode::PlainDelay.step(fm, -1), EffectMode::Octave);
        assert_eq!(EffectMode::PlainDelay.step(fm, 9), EffectMode::Chorus);

        let sub = EngineKind::Subtractive;
        assert_eq!(EffectMode::Delay.step(sub, 2), EffectMode::Ensemble);
        assert_eq!(EffectMode::Delay.step(sub, -6), EffectMode::Octave);
    }

    #[test]
    fn foreign_mode_steps_from_the_start_of_the_list() {
        // Ensemble is not an FM mode.
        assert_eq!(EffectMode::Ensemble.step(EngineKind::Fm, 1), EffectMode::Chorus);
        assert_eq!(EffectMode::Ensemble.step(EngineKind::Fm, 0), EffectMode::PlainDelay);
    }

    #[test]
    fn mode_lists_differ_per_engine() {
        assert_eq!(EffectMode::available(EngineKind::Subtractive).len(), 5);
        assert_eq!(EffectMode::available(EngineKind::Fm).len(), 4);
        assert_eq!(EffectMode::first(EngineKind::Fm), EffectMode::PlainDelay);
        assert_eq!(EffectMode::first(EngineKind::Subtractive), EffectMode::Delay);
    }

    #[test]
    fn knobs_map_onto_the_active_mode_only() {
        let mut settings = EffectSettings::new(2.0);
        let chorus_before = settings.chorus;
        settings.apply_knobs(EffectMode::Delay, 1.0, 1.0);

        assert!((settings.delay.time_s - 2.0).abs() < 1e-6);
        assert!((settings.delay.feedback - 0.9).abs() < 1e-6);
        assert_eq!(settings.chorus, chorus_before);

        settings.apply_knobs(EffectMode::Octave, 0.25, 0.5);
        assert!((settings.octave.dry_wet - 0.25).abs() < 1e-6);
        assert!((settings.octave.window_ms - 50.0).abs() < 1e-4);
    }

    #[test]
    fn knob_values_are_clamped() {
        let mut settings = EffectSettings::new(1.0);
        settings.apply_knobs(EffectMode::Phaser, -4.0, 9.0);
        assert_eq!(settings.phaser.dry_wet, 0.0);
        assert!((settings.phaser.rate_hz - 5.0).abs() < 1e-5);
    }

    #[test]
    fn knob_positions_invert_the_knob_map() {
        let mut settings = EffectSettings::new(2.0);
        for mode in SUBTRACTIVE_MODES.iter().chain(FM_MODES.iter()).copied() {
            settings.apply_knobs(mode, 0.3, 0.6);
            let (k1, k2) = settings.knob_positions(mode);
            assert!((k1 - 0.3).abs() < 1e-4, "{}", mode.name());
            assert!((k2 - 0.6).abs() < 1e-4, "{}", mode.name());
        }
    }

    #[test]
    fn dry_wet_targets_the_mode() {
        let mut settings = EffectSettings::new(2.0);
        settings.set_dry_wet(EffectMode::Ensemble, 0.8);
        assert_eq!(settings.ensemble.chorus.dry_wet, 0.8);
        assert_eq!(settings.dry_wet(EffectMode::Ensemble), 0.8);
    }

    #[test]
    fn mode_switch_starts_from_silence() {
        let mut settings = EffectSettings::new(2.0);
        settings.delay = DelayParams::new(0.01, 0.9, 1.0);
        let mut chain = EffectsChain::new(SAMPLE_RATE, 2.0, 50.0, 8);
        chain.set_mode(EffectMode::Delay, &settings);
        for _ in 0..1_000 {
            chain.process_frame(Frame::mono(0.5));
        }

        chain.set_mode(EffectMode::Phaser, &settings);
        chain.set_mode(EffectMode::Delay, &settings);
        let out = chain.process_frame(Frame::SILENCE);
        assert_eq!(out, Frame::SILENCE);
    }

    #[test]
    fn every_mode_is_finite_and_bounded() {
        let settings = EffectSettings::new(2.0);
        let mut chain = EffectsChain::new(SAMPLE_RATE, 2.0, 50.0, 8);
        for &mode in SUBTRACTIVE_MODES.iter().chain(FM_MODES.iter()) {
            chain.set_mode(mode, &settings);
            for i in 0..24_000 {
                let x = (i as f32 * 0.02).sin() * 0.5;
                let out = chain.process_frame(Frame::mono(x));
                assert!(out.left.is_finite() && out.right.is_finite(), "{}", mode.name());
                assert!(out.peak() < 10.0, "{}", mode.name());
            }
        }
    }
}
