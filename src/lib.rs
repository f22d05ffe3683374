//! Polyphonic synth core: subtractive and FM voice pools, a modulation
//! router, a stereo effects chain and the block processor that runs them.
//!
//! The control context talks to the audio context through a
//! [`ControlHandle`] (lock-free events plus shared knob atomics); the audio
//! context calls [`BlockProcessor::process_block`] and never blocks or
//! allocates.

pub mod dsp; // Oscillators, filters, envelopes, delay lines
pub mod effects; // Delay, chorus, phaser, pitch shifter
pub mod engine; // Block processor, config, control plumbing
pub mod error;
pub mod io; // MIDI events and conversions
pub mod synth; // Voices, pools, routing

pub use engine::{BlockProcessor, EngineConfig, SharedControls};
#[cfg(feature = "rtrb")]
pub use engine::ControlHandle;
pub use error::{ConfigError, ControlError};
pub use synth::{EngineKind, StealPolicy, SynthMessage};

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
