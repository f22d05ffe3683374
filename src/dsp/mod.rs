//! Low-level DSP primitives used by the voices and the effects chain.
//!
//! These components are allocation-free once constructed and realtime-safe,
//! making them safe to embed directly inside voice structs. They stay
//! focused on the signal-processing math; voices and effects layer note
//! handling and modulation on top.

/// Pre-sized ring-buffer delay line with integer and interpolated reads.
pub mod delay;
/// Gate-driven linear attack/decay/sustain/release envelope.
pub mod envelope;
/// Topology-preserving state-variable filter.
pub mod filter;
/// Sine LFO and bipolar/unipolar helpers.
pub mod lfo;
/// Stereo frames, dry/wet blending and the output clamp.
pub mod mix;
/// Phase-accumulator oscillators (sine, triangle, PolyBLEP saw and pulse).
pub mod oscillator;
/// One-pole parameter smoothing.
pub mod smooth;

pub use envelope::EnvelopeState;
pub use mix::Frame;
