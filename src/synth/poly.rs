#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    dsp::mix::Frame,
    synth::{
        factory::VoiceFactory,
        voice::{SynthVoice, VoiceState},
    },
};

/// Which voice to take when every slot is busy.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StealPolicy {
    /// Always the same slot. Deterministic, and what the hardware does.
    FixedIndex(usize),
    /// Lowest envelope level, ties to the lowest index.
    Quietest,
    /// Longest since note-on, ties to the lowest index.
    Oldest,
}

impl Default for StealPolicy {
    fn default() -> Self {
        StealPolicy::FixedIndex(0)
    }
}

/// Fixed-capacity set of voices of one model.
///
/// All storage is created up front; allocation, release and mixdown never
/// touch the heap.
pub struct VoicePool<V: SynthVoice> {
    voices: Vec<V>,
    // Trigger counter value at each slot's last note-on
    triggered_at: Vec<u64>,
    trigger_count: u64,
    steal_policy: StealPolicy,
    gain: f32,
}

impl<V: SynthVoice> VoicePool<V> {
    pub fn new<F>(capacity: usize, factory: F, steal_policy: StealPolicy) -> Self
    where
        F: VoiceFactory<Voice = V>,
    {
        let capacity = capacity.max(1);
        let voices = (0..capacity).map(|i| factory.create_voice(i)).collect();

        Self {
            voices,
            triggered_at: vec![0; capacity],
            trigger_count: 0,
            steal_policy,
            gain: 1.0 / capacity as f32,
        }
    }

    pub fn capacity(&self) -> usize {
        self.voices.len()
    }

    pub fn voices(&self) -> &[V] {
        &self.voices
    }

    pub fn voice(&self, index: usize) -> Option<&V> {
        self.voices.get(index)
    }

    pub fn steal_policy(&self) -> StealPolicy {
        self.steal_policy
    }

    pub fn active_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    /// Start `note`, returning the slot that took it.
    ///
    /// A voice already holding the note is retriggered, otherwise the first
    /// free slot is taken, otherwise one is stolen per the policy.
    pub fn allocate(&mut self, note: u8, velocity: u8, patch: &V::Patch) -> usize {
        let index = self
            .voices
            .iter()
            .position(|v| v.is_active() && v.note() == Some(note))
            .or_else(|| self.voices.iter().position(|v| !v.is_active()))
            .unwrap_or_else(|| {
                let index = self.steal_index();
                trace!(
                    note,
                    index,
                    stolen = ?self.voices[index].note(),
                    "voice stolen"
                );
                index
            });

        self.trigger_count += 1;
        self.triggered_at[index] = self.trigger_count;
        self.voices[index].note_on(note, velocity, patch);
        index
    }

    fn steal_index(&self) -> usize {
        let last = self.voices.len() - 1;
        match self.steal_policy {
            StealPolicy::FixedIndex(index) => index.min(last),
            StealPolicy::Quietest => self
                .voices
                .iter()
                .enumerate()
                .fold((0, f32::INFINITY), |(best, level), (i, v)| {
                    if v.level() < level {
                        (i, v.level())
                    } else {
                        (best, level)
                    }
                })
                .0,
            StealPolicy::Oldest => self
                .triggered_at
                .iter()
                .enumerate()
                .min_by_key(|&(i, &at)| (at, i))
                .map_or(0, |(i, _)| i),
        }
    }

    /// Release every voice holding `note`. Returns how many were released;
    /// zero for a note that is not playing.
    pub fn release(&mut self, note: u8) -> usize {
        self.voices
            .iter_mut()
            .map(|v| v.note_off(note))
            .filter(|&released| released)
            .count()
    }

    pub fn release_all(&mut self) {
        for voice in &mut self.voices {
            voice.release();
        }
    }

    pub fn set_pitch_bend(&mut self, semitones: f32) {
        for voice in self.voices.iter_mut().filter(|v| v.is_active()) {
            voice.set_pitch_bend(semitones);
        }
    }

    pub fn apply_patch(&mut self, patch: &V::Patch) {
        for voice in &mut self.voices {
            voice.apply_patch(patch);
        }
    }

    /// Sum one frame from every voice, scaled by 1 / capacity.
    pub fn mix_down(&mut self) -> Frame {
        let mut sum = Frame::SILENCE;
        for voice in &mut self.voices {
            sum += voice.process();
        }
        sum * self.gain
    }

    /// Voices currently in `state`.
    pub fn count_in(&self, state: VoiceState) -> usize {
        self.voices.iter().filter(|v| v.state() == state).count()
    }
}
