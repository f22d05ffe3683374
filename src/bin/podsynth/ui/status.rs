//! Status bar: engine, effect, knobs, voices and levels

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::UiState;

pub struct AudioStats {
    pub peak: f32,
    pub rms: f32,
}

impl AudioStats {
    pub fn from_buffer(buffer: &[f32]) -> Self {
        if buffer.is_empty() {
            return Self { peak: 0.0, rms: 0.0 };
        }
        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let rms = (buffer.iter().map(|&x| x * x).sum::<f32>() / buffer.len() as f32).sqrt();
        Self { peak, rms }
    }
}

fn knob_label(knob: Option<f32>) -> String {
    knob.map_or_else(|| "--".to_string(), |v| format!("{:.2}", v))
}

pub fn render_status(
    frame: &mut Frame,
    area: Rect,
    state: &UiState,
    octave: i8,
    sample_rate: f32,
    stats: &AudioStats,
) {
    let block = Block::default().title(" podsynth ").borders(Borders::ALL);

    let line = Line::from(vec![
        Span::styled(
            format!(" {}  ", state.engine.name()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("fx: {}  ", state.mode.name()),
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(
            format!(
                "k1 {}  k2 {}  ",
                knob_label(state.knobs[0]),
                knob_label(state.knobs[1])
            ),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(
            format!("voices {:>2}  oct {}  ", state.active_voices, octave),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("{:.0}kHz  ", sample_rate / 1000.0),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("peak {:.2}  rms {:.2}", stats.peak, stats.rms),
            Style::default().fg(if stats.peak > 0.85 {
                Color::Red
            } else {
                Color::Green
            }),
        ),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}
