use crate::{
    dsp::mix::Frame,
    synth::{
        fm_voice::FmVoice,
        patch::{FmPatch, SubtractivePatch},
        poly::{StealPolicy, VoicePool},
        voice::{Voice, VoiceSide},
        EngineKind,
    },
};

/// Every voice the processor owns.
///
/// The subtractive engine plays each note on two side pools, one per output
/// channel, each with its own pulse-width offsets. The FM engine is a single
/// stereo pool. All pools keep rendering after an engine switch so that
/// releasing notes finish their tails.
pub struct VoiceBank {
    sub_left: VoicePool<Voice>,
    sub_right: VoicePool<Voice>,
    fm: VoicePool<FmVoice>,
}

impl VoiceBank {
    pub fn new(
        sample_rate: f32,
        subtractive_voices: usize,
        fm_voices: usize,
        steal_policy: StealPolicy,
        subtractive: &SubtractivePatch,
        fm: &FmPatch,
    ) -> Self {
        let side_pool = |side: VoiceSide| {
            VoicePool::new(
                subtractive_voices,
                |_: usize| Voice::new(sample_rate, side, subtractive),
                steal_policy,
            )
        };

        Self {
            sub_left: side_pool(VoiceSide::Left),
            sub_right: side_pool(VoiceSide::Right),
            fm: VoicePool::new(fm_voices, |_: usize| FmVoice::new(sample_rate, fm), steal_policy),
        }
    }

    pub fn note_on(
        &mut self,
        engine: EngineKind,
        note: u8,
        velocity: u8,
        subtractive: &SubtractivePatch,
        fm: &FmPatch,
    ) {
        match engine {
            EngineKind::Subtractive => {
                self.sub_left.allocate(note, velocity, subtractive);
                self.sub_right.allocate(note, velocity, subtractive);
            }
            EngineKind::Fm => {
                self.fm.allocate(note, velocity, fm);
            }
        }
    }

    /// Note-offs go to every pool so a note started before an engine switch
    /// still releases.
    pub fn note_off(&mut self, note: u8) -> usize {
        self.sub_left.release(note) + self.sub_right.release(note) + self.fm.release(note)
    }

    pub fn release_all(&mut self) {
        self.sub_left.release_all();
        self.sub_right.release_all();
        self.fm.release_all();
    }

    pub fn set_pitch_bend(&mut self, semitones: f32) {
        self.sub_left.set_pitch_bend(semitones);
        self.sub_right.set_pitch_bend(semitones);
        self.fm.set_pitch_bend(semitones);
    }

    pub fn apply_subtractive(&mut self, patch: &SubtractivePatch) {
        self.sub_left.apply_patch(patch);
        self.sub_right.apply_patch(patch);
    }

    pub fn apply_fm(&mut self, patch: &FmPatch) {
        self.fm.apply_patch(patch);
    }

    /// Left side + right side + FM, one frame.
    pub fn mix_down(&mut self) -> Frame {
        self.sub_left.mix_down() + self.sub_right.mix_down() + self.fm.mix_down()
    }

    pub fn active_voices(&self) -> usize {
        self.sub_left.active_count() + self.sub_right.active_count() + self.fm.active_count()
    }

    pub fn subtractive_left(&self) -> &VoicePool<Voice> {
        &self.sub_left
    }

    pub fn subtractive_right(&self) -> &VoicePool<Voice> {
        &self.sub_right
    }

    pub fn fm(&self) -> &VoicePool<FmVoice> {
        &self.fm
    }
}
