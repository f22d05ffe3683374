use crate::{
    dsp::{
        envelope::Envelope,
        filter::{SVFilter, MAX_CUTOFF_HZ, MIN_CUTOFF_HZ},
        mix::Frame,
        oscillator::Oscillator,
    },
    io::converter::{note_to_freq, normalize_velocity},
    synth::patch::SubtractivePatch,
};

/*
Subtractive Voice
=================

Two pulse oscillators, each through its own low-pass SVF, summed and shaped
by the amplitude envelope.

    osc 1 (pw₁) ──→ SVF (fc)      ──┐
                                    ├─→ ½ × env × velocity ──→ pan(side)
    osc 2 (pw₂, +detune) ──→ SVF (1.02 fc) ──┘

Per note:

  velocity amp   velocity / 127
  pulse width    side base + (1 - keyPos)·0.15 + (1 - velocityAmp)·0.1,
                 clamped to [0.01, 0.99]. Low notes and soft notes get a
                 wider pulse.
  cutoff         base + velocityAmp·boost + (note - 60)·keyTracking,
                 plus filterEnv·depth per control tick, clamped to
                 [20 Hz, 20 kHz].
  frequency      note_to_freq(note, bend), recomputed whenever either input
                 changes. It is never stored on its own.

The filter cutoff is recomputed every `control_rate` samples. With
`control_rate = 1` every sample is exact.

State machine:

    Free ──note_on──→ Active ──note_off(n)──→ Releasing ──env idle──→ Free
                        ↑                         │
                        └──────── note_on ────────┘
*/

/// Envelope level below which a released voice counts as silent.
pub const ENV_EPSILON: f32 = 1e-4;

const KEY_PULSE_WIDTH_DEPTH: f32 = 0.15;
const VELOCITY_PULSE_WIDTH_DEPTH: f32 = 0.1;
const SECOND_FILTER_OFFSET: f32 = 1.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,      // Available for allocation
    Active,    // Gate held, envelope in attack/decay/sustain
    Releasing, // Key released, envelope in release phase
}

/// Behaviour the pool needs from any voice model.
pub trait SynthVoice: Send {
    type Patch;

    /// Assign `note` and start the envelope. Also used to steal a voice.
    fn note_on(&mut self, note: u8, velocity: u8, patch: &Self::Patch);

    /// Release the gate if this voice owns `note`. Returns true if it did.
    fn note_off(&mut self, note: u8) -> bool;

    /// Release the gate whatever note is held.
    fn release(&mut self);

    fn set_pitch_bend(&mut self, semitones: f32);

    fn apply_patch(&mut self, patch: &Self::Patch);

    /// Produce one frame. Silence, immediately, once the voice is free.
    fn process(&mut self) -> Frame;

    fn state(&self) -> VoiceState;

    /// Note currently assigned, if any.
    fn note(&self) -> Option<u8>;

    /// Current amplitude envelope level.
    fn level(&self) -> f32;

    fn is_active(&self) -> bool {
        self.state() != VoiceState::Free
    }
}

/// Which output channel a subtractive voice feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceSide {
    Left,
    Right,
}

impl VoiceSide {
    pub fn base_pulse_widths(self) -> [f32; 2] {
        match self {
            VoiceSide::Left => [0.5, 0.4],
            VoiceSide::Right => [0.45, 0.35],
        }
    }

    #[inline]
    fn pan(self, sample: f32) -> Frame {
        match self {
            VoiceSide::Left => Frame::new(sample, 0.0),
            VoiceSide::Right => Frame::new(0.0, sample),
        }
    }
}

/// Position of `note` within a key-scaling range, clamped to [0, 1].
#[inline]
pub(crate) fn key_position(note: u8, floor: f32, span: f32) -> f32 {
    ((note as f32 - floor) / span.max(1.0)).clamp(0.0, 1.0)
}

pub struct Voice {
    side: VoiceSide,
    state: VoiceState,
    note: Option<u8>,
    gate: bool,
    velocity_amp: f32,
    pitch_bend: f32,

    base_cutoff_hz: f32,
    resonance: f32,
    velocity_cutoff_boost: f32,
    key_tracking_hz: f32,
    detune_cents: f32,
    filter_env_depth_hz: f32,
    control_rate: usize,

    // Static part of the cutoff, fixed at note-on
    note_cutoff_hz: f32,
    pulse_width: [f32; 2],

    oscillators: [Oscillator; 2],
    filters: [SVFilter; 2],
    env: Envelope,
    filter_env: Option<Envelope>,
    sample_rate: f32,
    control_countdown: usize,
}

impl Voice {
    pub fn new(sample_rate: f32, side: VoiceSide, patch: &SubtractivePatch) -> Self {
        let mut voice = Self {
            side,
            state: VoiceState::Free,
            note: None,
            gate: false,
            velocity_amp: 0.0,
            pitch_bend: patch.pitch_bend,

            base_cutoff_hz: patch.base_cutoff_hz,
            resonance: patch.resonance,
            velocity_cutoff_boost: patch.velocity_cutoff_boost,
            key_tracking_hz: patch.key_tracking_hz,
            detune_cents: patch.detune_cents,
            filter_env_depth_hz: patch.filter_env_depth_hz,
            control_rate: patch.control_rate.max(1),

            note_cutoff_hz: patch.base_cutoff_hz,
            pulse_width: side.base_pulse_widths(),

            oscillators: [Oscillator::pulse(sample_rate), Oscillator::pulse(sample_rate)],
            filters: [
                SVFilter::lowpass(sample_rate, patch.base_cutoff_hz),
                SVFilter::lowpass(sample_rate, patch.base_cutoff_hz),
            ],
            env: patch.envelope.build(sample_rate),
            filter_env: patch.filter_env.map(|adsr| adsr.build(sample_rate)),
            sample_rate,
            control_countdown: 0,
        };
        voice.apply_patch(patch);
        voice
    }

    pub fn side(&self) -> VoiceSide {
        self.side
    }

    pub fn gate(&self) -> bool {
        self.gate
    }

    pub fn velocity_amp(&self) -> f32 {
        self.velocity_amp
    }

    pub fn pitch_bend(&self) -> f32 {
        self.pitch_bend
    }

    pub fn pulse_widths(&self) -> [f32; 2] {
        self.pulse_width
    }

    /// Cutoff before the filter envelope is added.
    pub fn note_cutoff(&self) -> f32 {
        self.note_cutoff_hz
    }

    /// Cutoff the first filter is currently running at.
    pub fn current_cutoff(&self) -> f32 {
        self.filters[0].cutoff()
    }

    /// Oscillator 1 frequency, derived from the note and the bend.
    pub fn frequency(&self) -> Option<f32> {
        self.note.map(|n| note_to_freq(n as f32, self.pitch_bend))
    }

    fn update_frequency(&mut self) {
        if let Some(freq) = self.frequency() {
            self.oscillators[0].set_freq(freq);
            self.oscillators[1].set_freq(freq * 2.0_f32.powf(self.detune_cents / 1200.0));
        }
    }

    fn update_note_params(&mut self) {
        let Some(note) = self.note else {
            return;
        };

        let key_pos = key_position(note, 36.0, 60.0);
        let base = self.side.base_pulse_widths();
        for (i, osc) in self.oscillators.iter_mut().enumerate() {
            let width = base[i]
                + (1.0 - key_pos) * KEY_PULSE_WIDTH_DEPTH
                + (1.0 - self.velocity_amp) * VELOCITY_PULSE_WIDTH_DEPTH;
            self.pulse_width[i] = width.clamp(0.01, 0.99);
            osc.set_pulse_width(self.pulse_width[i]);
        }

        let cutoff = self.base_cutoff_hz
            + self.velocity_amp * self.velocity_cutoff_boost
            + (note as f32 - 60.0) * self.key_tracking_hz;
        self.note_cutoff_hz = cutoff.clamp(MIN_CUTOFF_HZ, MAX_CUTOFF_HZ);

        self.update_frequency();
        // Pick up the new cutoff on the next sample
        self.control_countdown = 0;
    }

    fn update_filters(&mut self, filter_env_level: f32) {
        let cutoff = (self.note_cutoff_hz + filter_env_level * self.filter_env_depth_hz)
            .clamp(MIN_CUTOFF_HZ, MAX_CUTOFF_HZ);
        self.filters[0].set_cutoff(cutoff);
        self.filters[1].set_cutoff(cutoff * SECOND_FILTER_OFFSET);
    }

    fn finish(&mut self) {
        self.state = VoiceState::Free;
        self.note = None;
        self.gate = false;
        self.env.reset();
        if let Some(env) = self.filter_env.as_mut() {
            env.reset();
        }
        for filter in &mut self.filters {
            filter.reset();
        }
    }
}

impl SynthVoice for Voice {
    type Patch = SubtractivePatch;

    fn note_on(&mut self, note: u8, velocity: u8, patch: &SubtractivePatch) {
        self.note = Some(note);
        self.gate = true;
        self.state = VoiceState::Active;
        self.velocity_amp = normalize_velocity(velocity);
        self.pitch_bend = patch.pitch_bend;

        self.apply_patch(patch);

        self.env.retrigger();
        if let Some(env) = self.filter_env.as_mut() {
            env.retrigger();
        }
    }

    fn note_off(&mut self, note: u8) -> bool {
        if self.note == Some(note) && self.gate {
            self.release();
            true
        } else {
            false
        }
    }

    fn release(&mut self) {
        if self.state == VoiceState::Active {
            self.gate = false;
            self.state = VoiceState::Releasing;
        }
    }

    fn set_pitch_bend(&mut self, semitones: f32) {
        self.pitch_bend = semitones;
        self.update_frequency();
    }

    fn apply_patch(&mut self, patch: &SubtractivePatch) {
        self.base_cutoff_hz = patch.base_cutoff_hz;
        self.resonance = patch.resonance;
        self.velocity_cutoff_boost = patch.velocity_cutoff_boost;
        self.key_tracking_hz = patch.key_tracking_hz;
        self.detune_cents = patch.detune_cents;
        self.filter_env_depth_hz = patch.filter_env_depth_hz;
        self.control_rate = patch.control_rate.max(1);

        patch.envelope.apply_to(&mut self.env);
        match (patch.filter_env.as_ref(), self.filter_env.as_mut()) {
            (Some(adsr), Some(env)) => adsr.apply_to(env),
            (Some(adsr), None) => self.filter_env = Some(adsr.build(self.sample_rate)),
            (None, _) => self.filter_env = None,
        }
        for filter in &mut self.filters {
            filter.set_resonance(self.resonance);
        }

        self.update_note_params();
    }

    fn process(&mut self) -> Frame {
        if self.state == VoiceState::Free {
            return Frame::SILENCE;
        }

        let amp = self.env.process(self.gate);
        let filter_env_level = match self.filter_env.as_mut() {
            Some(env) => env.process(self.gate),
            None => 0.0,
        };

        if self.control_countdown == 0 {
            self.update_filters(filter_env_level);
            self.control_countdown = self.control_rate;
        }
        self.control_countdown -= 1;

        let a = self.filters[0].process(self.oscillators[0].process());
        let b = self.filters[1].process(self.oscillators[1].process());
        let sample = (a + b) * 0.5 * amp * self.velocity_amp;

        if !self.gate && (!self.env.is_active() || amp < ENV_EPSILON) {
            self.finish();
        }

        self.side.pan(sample)
    }

    fn state(&self) -> VoiceState {
        self.state
    }

    fn note(&self) -> Option<u8> {
        self.note
    }

    fn level(&self) -> f32 {
        self.env.level()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn exact_patch() -> SubtractivePatch {
        SubtractivePatch {
            control_rate: 1,
            ..SubtractivePatch::default()
        }
    }

    fn render(voice: &mut Voice, samples: usize) -> Vec<Frame> {
        (0..samples).map(|_| voice.process()).collect()
    }

    #[test]
    fn free_voice_is_silent() {
        let mut voice = Voice::new(SAMPLE_RATE, VoiceSide::Left, &exact_patch());
        assert_eq!(voice.process(), Frame::SILENCE);
        assert!(!voice.is_active());
    }

    #[test]
    fn note_on_sets_velocity_and_frequency() {
        let patch = exact_patch();
        let mut voice = Voice::new(SAMPLE_RATE, VoiceSide::Left, &patch);
        voice.note_on(69, 127, &patch);

        assert_eq!(voice.note(), Some(69));
        assert_eq!(voice.state(), VoiceState::Active);
        assert!((voice.velocity_amp() - 1.0).abs() < 1e-6);
        assert!((voice.frequency().unwrap() - 440.0).abs() < 1e-3);
    }

    #[test]
    fn left_voice_only_feeds_left_channel() {
        let patch = exact_patch();
        let mut voice = Voice::new(SAMPLE_RATE, VoiceSide::Left, &patch);
        voice.note_on(48, 100, &patch);
        let frames = render(&mut voice, 2_000);

        assert!(frames.iter().any(|f| f.left.abs() > 0.01));
        assert!(frames.iter().all(|f| f.right == 0.0));
    }

    #[test]
    fn pulse_width_tracks_key_and_velocity() {
        let patch = exact_patch();
        let mut low_soft = Voice::new(SAMPLE_RATE, VoiceSide::Left, &patch);
        let mut high_hard = Voice::new(SAMPLE_RATE, VoiceSide::Left, &patch);
        low_soft.note_on(24, 10, &patch);
        high_hard.note_on(100, 127, &patch);

        let wide = low_soft.pulse_widths();
        let narrow = high_hard.pulse_widths();
        assert!(wide[0] > narrow[0]);
        assert!(wide[1] > narrow[1]);
        // Top of the range at full velocity leaves just the side's base width.
        assert!((narrow[0] - 0.5).abs() < 1e-6);
        for w in wide.iter().chain(narrow.iter()) {
            assert!((0.01..=0.99).contains(w));
        }
    }

    #[test]
    fn cutoff_includes_velocity_boost_and_clamps() {
        let mut patch = exact_patch();
        patch.base_cutoff_hz = 1_000.0;
        patch.velocity_cutoff_boost = 2_540.0;
        let mut voice = Voice::new(SAMPLE_RATE, VoiceSide::Right, &patch);
        voice.note_on(60, 127, &patch);
        assert!((voice.note_cutoff() - 3_540.0).abs() < 0.5);

        patch.base_cutoff_hz = 19_000.0;
        patch.velocity_cutoff_boost = 10_000.0;
        voice.note_on(60, 127, &patch);
        assert_eq!(voice.note_cutoff(), MAX_CUTOFF_HZ);
    }

    #[test]
    fn filter_envelope_opens_the_cutoff() {
        let mut patch = exact_patch();
        patch.base_cutoff_hz = 500.0;
        patch.velocity_cutoff_boost = 0.0;
        patch.filter_env_depth_hz = 4_000.0;
        patch.filter_env = Some(crate::synth::patch::AdsrSettings::new(0.001, 1.0, 1.0, 0.1));
        let mut voice = Voice::new(SAMPLE_RATE, VoiceSide::Left, &patch);
        voice.note_on(60, 100, &patch);
        render(&mut voice, 200);

        assert!(voice.current_cutoff() > 4_000.0, "cutoff {}", voice.current_cutoff());
    }

    #[test]
    fn control_rate_decimates_filter_updates() {
        let mut patch = exact_patch();
        patch.control_rate = 64;
        patch.filter_env_depth_hz = 4_000.0;
        patch.filter_env = Some(crate::synth::patch::AdsrSettings::new(0.01, 1.0, 1.0, 0.1));
        let mut voice = Voice::new(SAMPLE_RATE, VoiceSide::Left, &patch);
        voice.note_on(60, 100, &patch);

        voice.process();
        let first = voice.current_cutoff();
        render(&mut voice, 63);
        assert_eq!(voice.current_cutoff(), first);
        render(&mut voice, 1);
        assert!(voice.current_cutoff() > first);
    }

    #[test]
    fn stale_note_off_is_ignored() {
        let patch = exact_patch();
        let mut voice = Voice::new(SAMPLE_RATE, VoiceSide::Left, &patch);
        voice.note_on(60, 100, &patch);

        assert!(!voice.note_off(61));
        assert_eq!(voice.state(), VoiceState::Active);
        assert!(voice.note_off(60));
        assert_eq!(voice.state(), VoiceState::Releasing);
        // Second note-off is a no-op.
        assert!(!voice.note_off(60));
        assert_eq!(voice.state(), VoiceState::Releasing);
    }

    #[test]
    fn released_voice_decays_and_frees_itself() {
        let patch = exact_patch();
        let mut voice = Voice::new(SAMPLE_RATE, VoiceSide::Left, &patch);
        voice.note_on(60, 100, &patch);
        render(&mut voice, 4_800);
        voice.note_off(60);

        let release_samples = (patch.envelope.release * SAMPLE_RATE) as usize + 10;
        let mut previous = voice.level();
        for _ in 0..release_samples {
            voice.process();
            assert!(voice.level() <= previous + 1e-7);
            previous = voice.level();
        }
        assert_eq!(voice.state(), VoiceState::Free);
        assert_eq!(voice.note(), None);
        assert_eq!(voice.process(), Frame::SILENCE);
    }

    #[test]
    fn pitch_bend_recomputes_frequency() {
        let patch = exact_patch();
        let mut voice = Voice::new(SAMPLE_RATE, VoiceSide::Left, &patch);
        voice.note_on(69, 100, &patch);
        voice.set_pitch_bend(12.0);
        assert!((voice.frequency().unwrap() - 880.0).abs() < 1e-2);
    }
}
