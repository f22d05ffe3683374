//! podsynth - play the synth core from a terminal
//!
//! Run with: cargo run --bin podsynth
//! Logs go to podsynth.log when PODSYNTH_LOG is set (e.g. PODSYNTH_LOG=debug).

mod app;
mod ui;

use std::{fs::File, io::Write};

use color_eyre::eyre::WrapErr;
use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::EnvFilter;

use app::PodSynth;

const LOG_ENV: &str = "PODSYNTH_LOG";
const LOG_FILE: &str = "podsynth.log";

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    // Held until exit so buffered lines get flushed
    let _log_guard = init_logging()?;

    PodSynth::new().run()
}

/// The terminal belongs to the UI, so logs only ever go to a file.
fn init_logging() -> color_eyre::Result<Option<WorkerGuard>> {
    let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) else {
        return Ok(None);
    };
    let file = File::create(LOG_FILE).wrap_err_with(|| format!("failed to create {LOG_FILE}"))?;
    let (writer, guard) = log_writer(file);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(Some(guard))
}

/// Engine events fire inside the audio callback. Lines are handed to a
/// worker thread and dropped if it falls behind, so a log call never waits
/// on the disk.
fn log_writer<W: Write + Send + 'static>(sink: W) -> (NonBlocking, WorkerGuard) {
    NonBlockingBuilder::default()
        .lossy(true)
        .thread_name("podsynth-log")
        .finish(sink)
}
