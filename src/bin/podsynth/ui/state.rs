//! Snapshot the audio thread publishes for display

use pod_synth::{effects::EffectMode, EngineKind};

#[derive(Debug, Clone, Copy)]
pub struct UiState {
    pub engine: EngineKind,
    pub mode: EffectMode,
    pub active_voices: usize,
    /// Knob positions as last seen by the engine; `None` until moved
    pub knobs: [Option<f32>; 2],
}
