#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, synth::poly::StealPolicy, synth::EngineKind, MAX_BLOCK_SIZE};

/// Everything fixed at construction time.
///
/// Defaults reproduce the hardware: 48 kHz, 48-frame blocks, eight voices
/// per pool, FM engine selected.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: f32,
    /// Frames per block. Control changes land on block boundaries.
    pub block_size: usize,
    /// Voices in each subtractive side pool.
    pub voices: usize,
    pub fm_voices: usize,
    pub engine: EngineKind,
    pub steal_policy: StealPolicy,
    /// Samples between filter and phaser coefficient updates.
    pub control_rate: usize,
    pub max_delay_seconds: f32,
    /// Time constant of the effect parameter smoothers.
    pub smoothing_ms: f32,
    /// Final hard clip.
    pub output_ceiling: f32,
    /// Semitones at full pitch-bend deflection.
    pub bend_range_semitones: f32,
    /// Slots in the control-to-audio event queue.
    pub message_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            block_size: 48,
            voices: 8,
            fm_voices: 8,
            engine: EngineKind::Fm,
            steal_policy: StealPolicy::default(),
            control_rate: 8,
            max_delay_seconds: 2.0,
            smoothing_ms: 50.0,
            output_ceiling: 0.9,
            bend_range_semitones: 7.0,
            message_capacity: 256,
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_voices(mut self, voices: usize) -> Self {
        self.voices = voices;
        self
    }

    pub fn with_fm_voices(mut self, fm_voices: usize) -> Self {
        self.fm_voices = fm_voices;
        self
    }

    pub fn with_engine(mut self, engine: EngineKind) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_steal_policy(mut self, steal_policy: StealPolicy) -> Self {
        self.steal_policy = steal_policy;
        self
    }

    pub fn with_control_rate(mut self, control_rate: usize) -> Self {
        self.control_rate = control_rate;
        self
    }

    pub fn with_max_delay(mut self, seconds: f32) -> Self {
        self.max_delay_seconds = seconds;
        self
    }

    pub fn with_smoothing_ms(mut self, smoothing_ms: f32) -> Self {
        self.smoothing_ms = smoothing_ms;
        self
    }

    pub fn with_output_ceiling(mut self, ceiling: f32) -> Self {
        self.output_ceiling = ceiling;
        self
    }

    pub fn with_bend_range(mut self, semitones: f32) -> Self {
        self.bend_range_semitones = semitones;
        self
    }

    pub fn with_message_capacity(mut self, capacity: usize) -> Self {
        self.message_capacity = capacity;
        self
    }

    /// Time budget for one block, in seconds.
    pub fn block_duration(&self) -> f32 {
        self.block_size as f32 / self.sample_rate
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate));
        }
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return Err(ConfigError::InvalidBlockSize {
                got: self.block_size,
                max: MAX_BLOCK_SIZE,
            });
        }
        if self.voices == 0 || self.fm_voices == 0 {
            return Err(ConfigError::EmptyVoicePool);
        }
        if let StealPolicy::FixedIndex(index) = self.steal_policy {
            let capacity = self.voices.min(self.fm_voices);
            if index >= capacity {
                return Err(ConfigError::StealIndexOutOfRange { index, capacity });
            }
        }
        if self.control_rate == 0 {
            return Err(ConfigError::InvalidControlRate);
        }
        if !(self.max_delay_seconds > 0.0 && self.max_delay_seconds <= 10.0) {
            return Err(ConfigError::InvalidMaxDelay(self.max_delay_seconds));
        }
        if !(self.smoothing_ms.is_finite() && self.smoothing_ms >= 0.0) {
            return Err(ConfigError::InvalidSmoothing(self.smoothing_ms));
        }
        if !(self.output_ceiling > 0.0 && self.output_ceiling <= 1.0) {
            return Err(ConfigError::InvalidOutputCeiling(self.output_ceiling));
        }
        if !(self.bend_range_semitones.is_finite() && self.bend_range_semitones >= 0.0) {
            return Err(ConfigError::InvalidBendRange(self.bend_range_semitones));
        }
        if self.message_capacity == 0 {
            return Err(ConfigError::InvalidMessageCapacity);
        }
        Ok(())
    }
}
