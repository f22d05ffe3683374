//! Sound-design parameters shared by every voice of one engine.
//!
//! The router owns one patch per engine and edits it in response to control
//! changes. At the next block boundary the pools hand it to every voice via
//! [`SynthVoice::apply_patch`](crate::synth::voice::SynthVoice::apply_patch),
//! and each voice re-derives its velocity-scaled values from it.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::envelope::Envelope;

/// Attack/decay/release in seconds, sustain as a level in [0, 1].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdsrSettings {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl AdsrSettings {
    pub const fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }

    pub fn build(&self, sample_rate: f32) -> Envelope {
        Envelope::adsr(sample_rate, self.attack, self.decay, self.sustain, self.release)
    }

    /// Push these times into a running envelope without disturbing its stage.
    pub fn apply_to(&self, env: &mut Envelope) {
        env.set_attack_time(self.attack);
        env.set_decay_time(self.decay);
        env.set_sustain_level(self.sustain);
        env.set_release_time(self.release);
    }

    /// CC4..CC7 → attack, decay, sustain, release. Returns false for other
    /// controllers.
    pub fn set_from_cc(&mut self, controller: u8, value: f32) -> bool {
        match controller {
            4 => self.attack = value * 2.0,
            5 => self.decay = value * 2.0,
            6 => self.sustain = value,
            7 => self.release = value * 2.0,
            _ => return false,
        }
        true
    }
}

/// Patch for the dual-oscillator subtractive voice.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SubtractivePatch {
    pub base_cutoff_hz: f32,
    pub resonance: f32,
    /// Added to the cutoff at full velocity.
    pub velocity_cutoff_boost: f32,
    /// Cutoff offset per semitone away from middle C.
    pub key_tracking_hz: f32,
    /// Oscillator 2 sits this many cents above oscillator 1.
    pub detune_cents: f32,
    pub envelope: AdsrSettings,
    pub filter_env: Option<AdsrSettings>,
    pub filter_env_depth_hz: f32,
    pub pitch_bend: f32,
    /// Filter coefficients are recomputed every `control_rate` samples.
    pub control_rate: usize,
}

impl Default for SubtractivePatch {
    fn default() -> Self {
        Self {
            base_cutoff_hz: 1_200.0,
            resonance: 0.3,
            velocity_cutoff_boost: 3_000.0,
            key_tracking_hz: 0.0,
            detune_cents: 7.0,
            envelope: AdsrSettings::new(0.005, 0.2, 0.7, 0.3),
            filter_env: Some(AdsrSettings::new(0.01, 0.3, 0.2, 0.3)),
            filter_env_depth_hz: 2_000.0,
            pitch_bend: 0.0,
            control_rate: 8,
        }
    }
}

/// Tuned-by-ear coefficients of the FM voice, exposed so they can be
/// re-voiced without touching the voice code.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FmTuning {
    /// Lowest note of the key-scaling range.
    pub note_floor: f32,
    /// Width of the key-scaling range in semitones.
    pub note_span: f32,
    /// Feedback is reduced by up to this fraction at the top of the range.
    pub feedback_key_scaling: f32,
    /// Modulation index scale at the bottom of the range (1.0 at the top).
    pub mod_key_floor: f32,
    /// Share of the modulation index that follows velocity.
    pub velocity_blend: f32,
    /// Per-channel feedback multiplier [left, right].
    pub feedback_asymmetry: [f32; 2],
    /// Per-channel modulation index multiplier [left, right].
    pub index_asymmetry: [f32; 2],
    /// Modulator-to-phase scale in cycles.
    pub phase_mod_scale: f32,
    /// Carrier amplitude at full velocity.
    pub carrier_gain: f32,
    pub mod_index_velocity_gain: f32,
    pub feedback_velocity_gain: f32,
}

impl Default for FmTuning {
    fn default() -> Self {
        Self {
            note_floor: 36.0,
            note_span: 60.0,
            feedback_key_scaling: 0.3,
            mod_key_floor: 0.5,
            velocity_blend: 0.5,
            feedback_asymmetry: [1.3, 0.75],
            index_asymmetry: [0.75, 1.2],
            phase_mod_scale: 0.1,
            carrier_gain: 0.8,
            mod_index_velocity_gain: 2.05,
            feedback_velocity_gain: 1.0,
        }
    }
}

/// Patch for the stereo two-operator FM voice.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FmPatch {
    /// Modulator frequency as a multiple of the carrier.
    pub ratio: f32,
    pub mod_index: f32,
    pub feedback: f32,
    pub envelope: AdsrSettings,
    pub pitch_bend: f32,
    pub tuning: FmTuning,
}

impl Default for FmPatch {
    fn default() -> Self {
        Self {
            ratio: 1.0,
            mod_index: 1.0,
            feedback: 0.0,
            envelope: AdsrSettings::new(0.03, 0.3, 0.7, 0.03),
            pitch_bend: 0.0,
            tuning: FmTuning::default(),
        }
    }
}
