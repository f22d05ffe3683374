//! Audio setup and the realtime callback

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    SampleFormat,
};
use rtrb::RingBuffer;
use tracing::{error, info};

use pod_synth::{effects::EffectMode, BlockProcessor, EngineConfig, MAX_BLOCK_SIZE};

use super::ui::{UiApp, UiState};

/// Scope samples the callback can run ahead of the UI
const SCOPE_QUEUE: usize = 16_384;
const STATE_QUEUE: usize = 64;

/// The callback renders `f32` directly; other device formats are refused.
fn require_f32(format: SampleFormat) -> EyreResult<()> {
    if format == SampleFormat::F32 {
        Ok(())
    } else {
        Err(eyre!(
            "default output device uses {format} samples; podsynth needs f32"
        ))
    }
}

pub struct PodSynth {
    config: EngineConfig,
}

impl PodSynth {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let stream_config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;
        require_f32(stream_config.sample_format())?;

        let sample_rate = stream_config.sample_rate().0 as f32;
        let channels = stream_config.channels() as usize;
        let config = self.config.with_sample_rate(sample_rate);
        let engine = config.engine;
        info!(sample_rate, channels, "opening output stream");

        let (mut processor, handle) =
            BlockProcessor::new(config).wrap_err("invalid engine configuration")?;
        let (mut scope_tx, scope_rx) = RingBuffer::<f32>::new(SCOPE_QUEUE);
        let (mut state_tx, state_rx) = RingBuffer::<UiState>::new(STATE_QUEUE);

        // Stereo scratch, sized once; the callback never allocates
        let mut stereo = vec![0.0f32; MAX_BLOCK_SIZE * 2];

        let stream = device.build_output_stream(
            &stream_config.into(),
            move |data: &mut [f32], _| {
                for out in data.chunks_mut(MAX_BLOCK_SIZE * channels) {
                    let frames = out.len() / channels;
                    let block = &mut stereo[..frames * 2];
                    processor.render(block);

                    for (frame, lr) in out.chunks_exact_mut(channels).zip(block.chunks_exact(2)) {
                        match frame {
                            [mono] => *mono = (lr[0] + lr[1]) * 0.5,
                            [left, right, rest @ ..] => {
                                *left = lr[0];
                                *right = lr[1];
                                rest.fill(0.0);
                            }
                            [] => {}
                        }
                        let _ = scope_tx.push((lr[0] + lr[1]) * 0.5);
                    }
                }

                let _ = state_tx.push(UiState {
                    engine: processor.router().engine(),
                    mode: processor.router().mode(),
                    active_voices: processor.bank().active_voices(),
                    knobs: processor.router().knobs(),
                });
            },
            |err| error!(%err, "audio stream error"),
            None,
        )?;
        stream.play()?;

        let initial = UiState {
            engine,
            mode: EffectMode::first(engine),
            active_voices: 0,
            knobs: [None, None],
        };
        let mut ui = UiApp::new(handle, scope_rx, state_rx, initial, sample_rate);

        let mut terminal = ratatui::init();
        let result = ui.run(&mut terminal);
        ratatui::restore();
        drop(stream);
        result
    }
}

impl Default for PodSynth {
    fn default() -> Self {
        Self::new()
    }
}
