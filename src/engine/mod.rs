//! The audio-context entry point.
//!
//! A [`BlockProcessor`] owns every voice and effect. Once per block it
//! drains the event queue, samples the shared knobs and encoder, pushes the
//! resulting changes into the voices and the effects chain, then renders
//! interleaved stereo.

pub mod config;
pub mod controls;
#[cfg(feature = "rtrb")]
pub mod handle;

use std::sync::Arc;

#[cfg(not(feature = "rtrb"))]
use std::collections::VecDeque;

use tracing::debug;

use crate::{
    dsp::mix::Frame,
    effects::{EffectSettings, EffectsChain},
    error::ConfigError,
    synth::{
        bank::VoiceBank,
        message::{MessageReceiver, SynthMessage},
        patch::{FmPatch, SubtractivePatch},
        router::ModulationRouter,
    },
    MAX_BLOCK_SIZE,
};

pub use config::EngineConfig;
pub use controls::SharedControls;
#[cfg(feature = "rtrb")]
pub use handle::ControlHandle;

#[cfg(feature = "rtrb")]
pub type DefaultReceiver = rtrb::Consumer<SynthMessage>;
#[cfg(not(feature = "rtrb"))]
pub type DefaultReceiver = VecDeque<SynthMessage>;

pub struct BlockProcessor<R: MessageReceiver = DefaultReceiver> {
    config: EngineConfig,
    rx: R,
    controls: Arc<SharedControls>,
    router: ModulationRouter,
    bank: VoiceBank,
    chain: EffectsChain,
    frames_processed: u64,
}

#[cfg(feature = "rtrb")]
impl BlockProcessor<rtrb::Consumer<SynthMessage>> {
    /// Build a processor and the handle that controls it.
    pub fn new(config: EngineConfig) -> Result<(Self, ControlHandle), ConfigError> {
        config.validate()?;
        let (tx, rx) = rtrb::RingBuffer::new(config.message_capacity);
        let controls = Arc::new(SharedControls::new());
        let processor = Self::with_receiver(config, rx, Arc::clone(&controls))?;
        Ok((processor, ControlHandle::new(tx, controls)))
    }
}

impl<R: MessageReceiver> BlockProcessor<R> {
    /// Build a processor around any message source.
    pub fn with_receiver(
        config: EngineConfig,
        rx: R,
        controls: Arc<SharedControls>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let subtractive = SubtractivePatch {
            control_rate: config.control_rate,
            ..SubtractivePatch::default()
        };
        let router = ModulationRouter::new(
            config.engine,
            config.bend_range_semitones,
            subtractive,
            FmPatch::default(),
            EffectSettings::new(config.max_delay_seconds),
        );
        let bank = VoiceBank::new(
            config.sample_rate,
            config.voices,
            config.fm_voices,
            config.steal_policy,
            router.subtractive_patch(),
            router.fm_patch(),
        );
        let mut chain = EffectsChain::new(
            config.sample_rate,
            config.max_delay_seconds,
            config.smoothing_ms,
            config.control_rate,
        );
        chain.set_mode(router.mode(), router.effects());

        debug!(
            sample_rate = config.sample_rate,
            block_size = config.block_size,
            voices = config.voices,
            fm_voices = config.fm_voices,
            engine = config.engine.name(),
            "block processor ready"
        );

        Ok(Self {
            config,
            rx,
            controls,
            router,
            bank,
            chain,
            frames_processed: 0,
        })
    }

    /// Render one block of interleaved stereo into `out`.
    ///
    /// Control changes are applied once, before the first frame. `out` is
    /// expected to hold an even number of samples and at most
    /// `MAX_BLOCK_SIZE` frames.
    pub fn process_block(&mut self, out: &mut [f32]) {
        debug_assert!(out.len() % 2 == 0, "interleaved stereo needs an even length");
        debug_assert!(out.len() <= 2 * MAX_BLOCK_SIZE, "block larger than MAX_BLOCK_SIZE");

        self.apply_controls();

        let mut frames = out.chunks_exact_mut(2);
        for slot in &mut frames {
            let frame = self.next_frame();
            slot[0] = frame.left;
            slot[1] = frame.right;
            self.frames_processed += 1;
        }
        frames.into_remainder().fill(0.0);
    }

    /// Render a buffer of any length, in `block_size` steps.
    pub fn render(&mut self, out: &mut [f32]) {
        let block = self.config.block_size * 2;
        for chunk in out.chunks_mut(block) {
            self.process_block(chunk);
        }
    }

    fn apply_controls(&mut self) {
        while let Some(message) = self.rx.pop() {
            self.router.handle(message, &mut self.bank);
        }
        self.router.set_knobs(self.controls.knobs());
        let turns = self.controls.take_encoder();
        if turns != 0 {
            self.router.turn_encoder(turns);
        }
        self.router.flush(&mut self.bank, &mut self.chain);
    }

    #[inline]
    fn next_frame(&mut self) -> Frame {
        let dry = self.bank.mix_down();
        self.chain
            .process_frame(dry)
            .clip(self.config.output_ceiling)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn bank(&self) -> &VoiceBank {
        &self.bank
    }

    pub fn router(&self) -> &ModulationRouter {
        &self.router
    }

    pub fn chain(&self) -> &EffectsChain {
        &self.chain
    }

    pub fn controls(&self) -> Arc<SharedControls> {
        Arc::clone(&self.controls)
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }
}
