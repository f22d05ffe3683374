//! Terminal front end
//!
//! The home row plays notes, the rest of the keyboard stands in for the
//! hardware knobs, encoder and engine button.

mod scope;
mod spectrum;
mod state;
mod status;

use std::time::{Duration, Instant};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::Consumer;
use tracing::warn;

use pod_synth::{ControlHandle, ControlError};

pub use state::UiState;

use scope::render_scope;
use spectrum::{render_spectrum, SpectrumAnalyzer};
use status::{render_status, AudioStats};

const SCOPE_LEN: usize = 1024;
const FFT_SIZE: usize = 2048;
const GATE_TIME: Duration = Duration::from_millis(250);
const VELOCITY: u8 = 100;
const KNOB_STEP: f32 = 0.05;
const MIN_OCTAVE: i8 = 0;
const MAX_OCTAVE: i8 = 8;

/// Semitone offset from C for each playable key
const KEYS: [(char, u8); 13] = [
    ('a', 0),
    ('w', 1),
    ('s', 2),
    ('e', 3),
    ('d', 4),
    ('f', 5),
    ('t', 6),
    ('g', 7),
    ('y', 8),
    ('h', 9),
    ('u', 10),
    ('j', 11),
    ('k', 12),
];

pub struct UiApp {
    handle: ControlHandle,
    audio_rx: Consumer<f32>,
    state_rx: Consumer<UiState>,
    current_state: UiState,
    audio_buffer: Vec<f32>,
    spectrum: SpectrumAnalyzer,
    sample_rate: f32,
    octave: i8,
    knobs: [f32; 2],
    /// Notes waiting for their automatic note-off
    held: Vec<(u8, Instant)>,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        handle: ControlHandle,
        audio_rx: Consumer<f32>,
        state_rx: Consumer<UiState>,
        initial_state: UiState,
        sample_rate: f32,
    ) -> Self {
        Self {
            handle,
            audio_rx,
            state_rx,
            current_state: initial_state,
            audio_buffer: vec![0.0; FFT_SIZE],
            spectrum: SpectrumAnalyzer::new(FFT_SIZE, sample_rate),
            sample_rate,
            octave: 4,
            knobs: [0.5; 2],
            held: Vec::new(),
            should_quit: false,
        }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_audio();
            self.poll_state();
            self.release_expired(Instant::now());

            terminal.draw(|frame| self.render(frame))?;

            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        let result = self.handle.all_notes_off();
        self.report(result);
        Ok(())
    }

    fn poll_audio(&mut self) {
        let mut received = false;
        while let Ok(sample) = self.audio_rx.pop() {
            self.audio_buffer.push(sample);
            received = true;
        }
        if self.audio_buffer.len() > FFT_SIZE {
            let excess = self.audio_buffer.len() - FFT_SIZE;
            self.audio_buffer.drain(..excess);
        }
        if received {
            self.spectrum.update(&self.audio_buffer);
        }
    }

    fn poll_state(&mut self) {
        while let Ok(state) = self.state_rx.pop() {
            self.current_state = state;
        }
    }

    fn release_expired(&mut self, now: Instant) {
        let mut i = 0;
        while i < self.held.len() {
            let (note, started) = self.held[i];
            if now.duration_since(started) >= GATE_TIME {
                self.held.swap_remove(i);
                let result = self.handle.note_off(note);
                self.report(result);
            } else {
                i += 1;
            }
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('z') => self.octave = (self.octave - 1).max(MIN_OCTAVE),
            KeyCode::Char('x') => self.octave = (self.octave + 1).min(MAX_OCTAVE),
            KeyCode::Char('[') => self.nudge_knob(0, -KNOB_STEP),
            KeyCode::Char(']') => self.nudge_knob(0, KNOB_STEP),
            KeyCode::Char(';') => self.nudge_knob(1, -KNOB_STEP),
            KeyCode::Char('\'') => self.nudge_knob(1, KNOB_STEP),
            KeyCode::Char(',') => self.handle.turn_encoder(-1),
            KeyCode::Char('.') => self.handle.turn_encoder(1),
            KeyCode::Tab => {
                let next = self.current_state.engine.toggled();
                self.held.clear();
                let result = self.handle.select_engine(next);
                self.report(result);
            }
            KeyCode::Char(c) => {
                if let Some(note) = self.note_for(c) {
                    self.play(note);
                }
            }
            _ => {}
        }
    }

    fn note_for(&self, key: char) -> Option<u8> {
        let (_, offset) = KEYS.iter().find(|(k, _)| *k == key)?;
        let note = (self.octave as i32 + 1) * 12 + *offset as i32;
        u8::try_from(note).ok().filter(|n| *n <= 127)
    }

    fn play(&mut self, note: u8) {
        let result = self.handle.note_on(note, VELOCITY);
        self.report(result);
        self.held.retain(|(n, _)| *n != note);
        self.held.push((note, Instant::now()));
    }

    fn nudge_knob(&mut self, index: usize, delta: f32) {
        let value = (self.knobs[index] + delta).clamp(0.0, 1.0);
        self.knobs[index] = value;
        let result = self.handle.set_knob(index, value);
        self.report(result);
    }

    fn report(&self, result: Result<(), ControlError>) {
        if let Err(err) = result {
            warn!(%err, "control dropped");
        }
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Min(8),
                Constraint::Length(1),
            ])
            .split(frame.area());

        let stats = AudioStats::from_buffer(&self.audio_buffer);
        render_status(
            frame,
            chunks[0],
            &self.current_state,
            self.octave,
            self.sample_rate,
            &stats,
        );

        let scope_start = self.audio_buffer.len().saturating_sub(SCOPE_LEN);
        render_scope(frame, chunks[1], &self.audio_buffer[scope_start..]);
        render_spectrum(frame, chunks[2], self.spectrum.data());

        let help = Paragraph::new(
            " [a-k] Play  [z/x] Octave  [ [ ] ] Knob 1  [ ; ' ] Knob 2  [,/.] Effect  [Tab] Engine  [q] Quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[3]);
    }
}
