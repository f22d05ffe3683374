use crate::synth::voice::SynthVoice;

/// Builds the voices of one pool.
///
/// This is the "instrument design" layer: configure the sound once and the
/// pool asks the factory for as many identical voices as it has slots. The
/// slot index is passed along so a factory can vary voices per slot.
pub trait VoiceFactory {
    type Voice: SynthVoice;

    fn create_voice(&self, index: usize) -> Self::Voice;
}

impl<F, V> VoiceFactory for F
where
    F: Fn(usize) -> V,
    V: SynthVoice,
{
    type Voice = V;

    fn create_voice(&self, index: usize) -> Self::Voice {
        self(index)
    }
}
