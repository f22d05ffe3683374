//! Real-world scenario benchmarks.
//!
//! Full voice pools, every effect mode, and complete blocks through the
//! engine with all voices sounding.

mod effects;
mod engine;
mod voices;

pub use effects::bench_effects;
pub use engine::bench_engine;
pub use voices::bench_voices;
