use crate::{
    dsp::{envelope::Envelope, mix::Frame, oscillator::Oscillator},
    io::converter::{note_to_freq, normalize_velocity},
    synth::{
        patch::{FmPatch, FmTuning},
        voice::{key_position, SynthVoice, VoiceState, ENV_EPSILON},
    },
};

/*
Two-Operator FM Voice
=====================

One sine modulator phase-modulates one sine carrier, per channel. The two
channels share an envelope but differ in how hard they push feedback and
modulation, which is what makes the voice wide.

    ┌──────────── prev × feedbackGain ◄──────┐
    ▼                                         │
  modulator ──→ m ──→ × modGain ──→ carrier.phase_add ──→ carrier ──┴──→ × env × velocity

  keyPos        (note - 36) / 60, clamped to [0, 1]
  fbScaling     1 - 0.3·keyPos         high notes get less feedback
  modScaling    0.5 + 0.5·keyPos       high notes get more index
  effective     baseIndex · (0.5 + 0.5·velocity) · modScaling

Per channel c (left, right):

  m          = modulator_c() + prev_c · feedback · fbScaling · fbAsym[c]
  phaseMod   = m · effective · idxAsym[c] · 0.1
  carrier_c.phase_add(phaseMod)
  out_c      = carrier_c() · env · velocity
  prev_c     = m                        stored after the sample is produced

Feedback is always one sample late. The loop gain is clamped below 1 so
maximum feedback stays bounded.

Note-on derives the base values from the patch and the velocity:

  baseIndex = patch.mod_index · velocity · 2.05
  feedback  = patch.feedback  · velocity · feedbackVelocityGain
*/

pub const MAX_MOD_INDEX: f32 = 8.0;
pub const MIN_RATIO: f32 = 0.125;
pub const MAX_RATIO: f32 = 8.0;
pub const MAX_FEEDBACK: f32 = 1.0;
/// Upper bound on prev × feedback × scaling inside the loop.
pub const MAX_FEEDBACK_LOOP_GAIN: f32 = 0.95;

pub struct FmVoice {
    carriers: [Oscillator; 2],
    modulators: [Oscillator; 2],
    env: Envelope,
    tuning: FmTuning,
    state: VoiceState,
    note: Option<u8>,
    gate: bool,

    velocity: f32,
    pitch_bend: f32,
    carrier_freq: f32,
    current_freq: f32,

    ratio: f32,
    base_mod_index: f32,
    feedback: f32,

    patch_mod_index: f32,
    patch_feedback: f32,

    prev_mod: [f32; 2],
}

impl FmVoice {
    pub fn new(sample_rate: f32, patch: &FmPatch) -> Self {
        let mut voice = Self {
            carriers: [Oscillator::sine(sample_rate), Oscillator::sine(sample_rate)],
            modulators: [Oscillator::sine(sample_rate), Oscillator::sine(sample_rate)],
            env: patch.envelope.build(sample_rate),
            tuning: patch.tuning,
            state: VoiceState::Free,
            note: None,
            gate: false,
            velocity: 0.0,
            pitch_bend: patch.pitch_bend,
            carrier_freq: 0.0,
            current_freq: 0.0,
            ratio: 1.0,
            base_mod_index: 0.0,
            feedback: 0.0,
            patch_mod_index: 0.0,
            patch_feedback: 0.0,
            prev_mod: [0.0; 2],
        };
        voice.apply_patch(patch);
        voice
    }

    pub fn set_ratio(&mut self, ratio: f32) {
        self.ratio = ratio.clamp(MIN_RATIO, MAX_RATIO);
        self.update_frequencies();
    }

    pub fn set_mod_index(&mut self, index: f32) {
        self.base_mod_index = index.clamp(0.0, MAX_MOD_INDEX);
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, MAX_FEEDBACK);
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    pub fn mod_index(&self) -> f32 {
        self.base_mod_index
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Un-bent note frequency.
    pub fn carrier_freq(&self) -> f32 {
        self.carrier_freq
    }

    /// Note frequency with the pitch bend applied.
    pub fn current_freq(&self) -> f32 {
        self.current_freq
    }

    pub fn pitch_bend(&self) -> f32 {
        self.pitch_bend
    }

    /// Modulator output fed back on the previous sample, per channel.
    pub fn previous_modulation(&self) -> [f32; 2] {
        self.prev_mod
    }

    fn update_frequencies(&mut self) {
        let Some(note) = self.note else {
            return;
        };
        self.carrier_freq = note_to_freq(note as f32, 0.0);
        self.current_freq = note_to_freq(note as f32, self.pitch_bend);
        let modulator_freq = self.current_freq * self.ratio;
        for (carrier, modulator) in self.carriers.iter_mut().zip(self.modulators.iter_mut()) {
            carrier.set_freq(self.current_freq);
            modulator.set_freq(modulator_freq);
        }
    }

    fn update_velocity_scaling(&mut self) {
        self.set_mod_index(self.patch_mod_index * self.velocity * self.tuning.mod_index_velocity_gain);
        self.set_feedback(self.patch_feedback * self.velocity * self.tuning.feedback_velocity_gain);
        let amp = self.velocity * self.tuning.carrier_gain;
        for carrier in &mut self.carriers {
            carrier.set_amp(amp);
        }
    }

    fn finish(&mut self) {
        self.state = VoiceState::Free;
        self.note = None;
        self.gate = false;
        self.env.reset();
        self.prev_mod = [0.0; 2];
        for osc in self.carriers.iter_mut().chain(self.modulators.iter_mut()) {
            osc.reset_phase();
        }
    }
}

impl SynthVoice for FmVoice {
    type Patch = FmPatch;

    fn note_on(&mut self, note: u8, velocity: u8, patch: &FmPatch) {
        self.note = Some(note);
        self.gate = true;
        self.state = VoiceState::Active;
        self.velocity = normalize_velocity(velocity);
        self.pitch_bend = patch.pitch_bend;

        self.apply_patch(patch);
        self.env.retrigger();
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
        self.update_frequencies();
    }

    fn apply_patch(&mut self, patch: &FmPatch) {
        self.tuning = patch.tuning;
        self.patch_mod_index = patch.mod_index;
        self.patch_feedback = patch.feedback;
        patch.envelope.apply_to(&mut self.env);
        self.ratio = patch.ratio.clamp(MIN_RATIO, MAX_RATIO);
        self.update_velocity_scaling();
        self.update_frequencies();
    }

    fn process(&mut self) -> Frame {
        if self.state == VoiceState::Free {
            return Frame::SILENCE;
        }
        let Some(note) = self.note else {
            return Frame::SILENCE;
        };

        let t = &self.tuning;
        let key_pos = key_position(note, t.note_floor, t.note_span);
        let fb_scaling = 1.0 - t.feedback_key_scaling * key_pos;
        let mod_scaling = t.mod_key_floor + (1.0 - t.mod_key_floor) * key_pos;
        let effective_index = self.base_mod_index
            * ((1.0 - t.velocity_blend) + self.velocity * t.velocity_blend)
            * mod_scaling;

        let mut out = [0.0; 2];
        for ch in 0..2 {
            let loop_gain =
                (self.feedback * fb_scaling * t.feedback_asymmetry[ch]).min(MAX_FEEDBACK_LOOP_GAIN);
            let m = self.modulators[ch].process() + self.prev_mod[ch] * loop_gain;
            let phase_mod = m * effective_index * t.index_asymmetry[ch] * t.phase_mod_scale;
            self.carriers[ch].phase_add(phase_mod);
            out[ch] = self.carriers[ch].process();
            self.prev_mod[ch] = m;
        }

        let amp = self.env.process(self.gate);
        let gain = amp * self.velocity;

        if !self.gate && (!self.env.is_active() || amp < ENV_EPSILON) {
            self.finish();
        }

        Frame::new(out[0] * gain, out[1] * gain)
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
