//! # Terminal Renderer
//!
//! Draws the analyser's views as text: a one-line level meter for the live
//! waveform, a sparkline for the live spectrum and stacked sparklines for
//! saved-profile comparisons.

use voice_core::compare::voice_region;
use voice_core::render::{
    frequency_label, DrawMode, Renderer, SpectrumLayer, DB_GRIDLINES, FREQUENCY_GRIDLINES_HZ,
};

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Column count of live and comparison sparklines.
const COLUMNS: usize = 48;

/// Downsamples `values` to `columns` buckets, keeping each bucket's maximum.
fn sparkline(values: &[u8], columns: usize) -> String {
    if values.is_empty() || columns == 0 {
        return String::new();
    }
    let columns = columns.min(values.len());
    (0..columns)
        .map(|c| {
            let start = c * values.len() / columns;
            let end = ((c + 1) * values.len() / columns).max(start + 1);
            let peak = values[start..end].iter().copied().max().unwrap_or(0);
            BARS[usize::from(peak) * (BARS.len() - 1) / 255]
        })
        .collect()
}

/// Renders to stdout; live views are buffered until the next readout line.
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    waveform_peak: f32,
    spectrum_line: String,
}

impl TerminalRenderer {
    /// Peak absolute amplitude of the latest waveform.
    pub fn waveform_peak(&self) -> f32 {
        self.waveform_peak
    }

    /// Sparkline of the latest live spectrum.
    pub fn spectrum_line(&self) -> &str {
        &self.spectrum_line
    }
}

impl Renderer for TerminalRenderer {
    fn draw_waveform(&mut self, samples: &[f32]) {
        self.waveform_peak = samples.iter().fold(0.0, |peak: f32, s| peak.max(s.abs()));
    }

    fn draw_spectrum(&mut self, magnitudes: &[u8]) {
        // The live view shows the same voice region the comparison views zoom into.
        self.spectrum_line = sparkline(voice_region(magnitudes), COLUMNS);
    }

    fn draw_comparison(&mut self, mode: DrawMode, layers: &[SpectrumLayer<'_>]) {
        let gridlines: Vec<String> = DB_GRIDLINES.iter().map(|db| format!("{db}dB")).collect();
        let markers: Vec<String> = FREQUENCY_GRIDLINES_HZ
            .iter()
            .map(|&hz| frequency_label(hz))
            .collect();

        match mode {
            DrawMode::Inspect => {
                if let Some(layer) = layers.first() {
                    println!("ANALYSIS: {}", layer.label);
                    println!("Detailed Frequency Spectrum View");
                }
            }
            DrawMode::Compare => println!("COMPARISON"),
        }
        println!("  levels: {}   markers: {}", gridlines.join(" "), markers.join(" "));

        // Topmost layer first so the legend reads in selection order.
        for layer in layers.iter().rev() {
            println!(
                "  ■ {:<16} {} α{:.1}  |{}|",
                layer.label,
                layer.color.hex(),
                layer.alpha,
                sparkline(layer.envelope, COLUMNS)
            );
        }
    }
}
