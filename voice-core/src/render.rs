//! Contract for the drawing collaborator.
//!
//! The core never draws. It hands waveforms, live spectra and comparison
//! layers to a [`Renderer`] and lets it decide what pixels mean.

/// Horizontal dB gridlines every spectrum view shows.
pub const DB_GRIDLINES: [i32; 6] = [0, -20, -40, -60, -80, -100];

/// Vertical frequency gridlines (Hz) every spectrum view shows.
pub const FREQUENCY_GRIDLINES_HZ: [u32; 3] = [200, 1_000, 5_000];

/// Label for a frequency gridline ("200Hz", "1kHz").
pub fn frequency_label(hz: u32) -> String {
    if hz >= 1_000 && hz % 1_000 == 0 {
        format!("{}kHz", hz / 1_000)
    } else {
        format!("{hz}Hz")
    }
}

/// An RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// How a comparison view is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    /// One profile examined on its own.
    Inspect,
    /// Two profiles overlaid.
    Compare,
}

/// One envelope to paint in a comparison view.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumLayer<'a> {
    pub label: &'a str,
    pub envelope: &'a [u8],
    pub color: Rgb,
    pub alpha: f32,
}

/// Receives everything the analyser wants on screen.
pub trait Renderer {
    /// Draws a time-domain waveform (-1.0..=1.0 samples).
    fn draw_waveform(&mut self, samples: &[f32]);

    /// Draws a live bar spectrum of byte magnitudes.
    fn draw_spectrum(&mut self, magnitudes: &[u8]);

    /// Draws saved envelopes. `layers` are in paint order, bottom first.
    fn draw_comparison(&mut self, mode: DrawMode, layers: &[SpectrumLayer<'_>]);
}
