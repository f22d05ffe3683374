use thiserror::Error;

/// Rejected [`EngineConfig`](crate::engine::config::EngineConfig) values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("sample rate must be positive and finite, got {0}")]
    InvalidSampleRate(f32),

    #[error("block size must be between 1 and {max} frames, got {got}")]
    InvalidBlockSize { got: usize, max: usize },

    #[error("voice pools need at least one voice")]
    EmptyVoicePool,

    #[error("fixed steal index {index} is outside a pool of {capacity} voices")]
    StealIndexOutOfRange { index: usize, capacity: usize },

    #[error("control-rate divisor must be at least 1")]
    InvalidControlRate,

    #[error("max delay must be in (0, 10] seconds, got {0}")]
    InvalidMaxDelay(f32),

    #[error("smoothing time must be finite and not negative, got {0} ms")]
    InvalidSmoothing(f32),

    #[error("output ceiling must be in (0, 1], got {0}")]
    InvalidOutputCeiling(f32),

    #[error("bend range must be finite and not negative, got {0} semitones")]
    InvalidBendRange(f32),

    #[error("message queue capacity must be at least 1")]
    InvalidMessageCapacity,
}

/// Failures seen by the control side. The audio side never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("control queue is full; event dropped")]
    QueueFull,

    #[error("no knob at index {0}")]
    UnknownKnob(usize),
}
