//! Spectrum widget
//!
//! Hann-windowed FFT read out at log-spaced frequencies.

use std::sync::Arc;

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};

const BANDS: usize = 48;
const FLOOR_DB: f64 = -100.0;
const MIN_FREQ: f32 = 20.0;

pub struct SpectrumAnalyzer {
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    bins: Vec<usize>,
    /// (log10 frequency, magnitude in dB)
    bands: Vec<(f64, f64)>,
}

impl SpectrumAnalyzer {
    pub fn new(fft_size: usize, sample_rate: f32) -> Self {
        let fft_size = fft_size.max(2);
        let fft = FftPlanner::new().plan_fft_forward(fft_size);

        let denom = (fft_size - 1) as f32;
        let window = (0..fft_size)
            .map(|i| 0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / denom).cos()))
            .collect();

        let nyquist = (sample_rate / 2.0).clamp(MIN_FREQ + 1.0, 20_000.0);
        let ratio = nyquist / MIN_FREQ;
        let last_bin = fft_size / 2 - 1;

        let mut bins = Vec::with_capacity(BANDS);
        let mut bands = Vec::with_capacity(BANDS);
        for i in 0..BANDS {
            let t = i as f32 / (BANDS - 1) as f32;
            let freq = MIN_FREQ * ratio.powf(t);
            let bin = (freq * fft_size as f32 / sample_rate).round() as usize;
            bins.push(bin.min(last_bin));
            bands.push(((freq as f64).log10(), FLOOR_DB));
        }

        Self {
            window,
            fft,
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
            bins,
            bands,
        }
    }

    /// Analyze the most recent `fft_size` samples; shorter input is ignored.
    pub fn update(&mut self, samples: &[f32]) {
        let n = self.window.len();
        if samples.len() < n {
            return;
        }
        let recent = &samples[samples.len() - n..];
        for ((slot, &s), &w) in self.scratch.iter_mut().zip(recent).zip(&self.window) {
            *slot = Complex::new(s * w, 0.0);
        }

        self.fft.process(&mut self.scratch);

        for ((_, db), &bin) in self.bands.iter_mut().zip(&self.bins) {
            let power = self.scratch[bin].norm_sqr().max(1e-12) as f64;
            *db = (10.0 * power.log10()).max(FLOOR_DB);
        }
    }

    pub fn data(&self) -> &[(f64, f64)] {
        &self.bands
    }
}

pub fn render_spectrum(frame: &mut Frame, area: Rect, bands: &[(f64, f64)]) {
    let block = Block::default().title(" Spectrum ").borders(Borders::ALL);

    let low = bands.first().map_or(1.0, |b| b.0);
    let high = bands.last().map_or(4.3, |b| b.0).max(low + 0.1);
    let top = bands.iter().map(|b| b.1).fold(0.0, f64::max) + 10.0;

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(bands);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([low, high])
                .labels(vec!["20", "200", "2k", "20k"])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([FLOOR_DB, top])
                .labels(vec!["-100", "-50", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
