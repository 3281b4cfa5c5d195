//! # Comparison Module
//!
//! Chooses how saved profiles are shown side by side. One selected profile is
//! inspected on its own; two are overlaid. Only the low 35% of each envelope
//! is drawn, where a speaking or singing voice actually lives.

use crate::error::VoiceError;
use crate::profile::VoiceProfile;
use crate::render::{DrawMode, Renderer, Rgb, SpectrumLayer};

/// Most profiles that can be selected at once.
pub const MAX_SELECTION: usize = 2;

/// Fraction of an envelope's bins shown in comparison views.
pub const VOICE_REGION_FRACTION: f64 = 0.35;

const INSPECT_COLOR: Rgb = Rgb(0x00, 0xea, 0xff);
const INSPECT_ALPHA: f32 = 0.8;
const FIRST_COLOR: Rgb = Rgb(0x00, 0xff, 0x00);
const FIRST_ALPHA: f32 = 0.5;
const SECOND_COLOR: Rgb = Rgb(0xff, 0x00, 0x55);
const SECOND_ALPHA: f32 = 0.6;

/// The leading `floor(len * 0.35)` bins of an envelope.
pub fn voice_region(envelope: &[u8]) -> &[u8] {
    let count = (envelope.len() as f64 * VOICE_REGION_FRACTION).floor() as usize;
    &envelope[..count.min(envelope.len())]
}

/// Profiles the user has checked, in the order they were checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<u64>,
}

impl Selection {
    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.ids.contains(&id)
    }

    /// Checks a profile. Checking a third one is refused and leaves the
    /// selection as it was.
    pub fn select(&mut self, id: u64) -> Result<(), VoiceError> {
        if self.contains(id) {
            return Ok(());
        }
        if self.ids.len() >= MAX_SELECTION {
            log::warn!("refusing to select profile {id}: {MAX_SELECTION} already selected");
            return Err(VoiceError::SelectionFull(MAX_SELECTION));
        }
        self.ids.push(id);
        Ok(())
    }

    pub fn deselect(&mut self, id: u64) {
        self.ids.retain(|&selected| selected != id);
    }

    /// Flips a profile's checked state.
    pub fn toggle(&mut self, id: u64) -> Result<(), VoiceError> {
        if self.contains(id) {
            self.deselect(id);
            Ok(())
        } else {
            self.select(id)
        }
    }

    /// Drops ids that no longer name a saved profile.
    pub fn retain_existing(&mut self, profiles: &[VoiceProfile]) {
        self.ids.retain(|id| profiles.iter().any(|p| p.id == *id));
    }

    /// Looks the selected ids up in `profiles`, keeping selection order.
    pub fn resolve<'a>(&self, profiles: &'a [VoiceProfile]) -> Result<Vec<&'a VoiceProfile>, VoiceError> {
        self.ids
            .iter()
            .map(|&id| {
                profiles
                    .iter()
                    .find(|p| p.id == id)
                    .ok_or(VoiceError::UnknownProfile(id))
            })
            .collect()
    }
}

/// What a comparison view should draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawDirective<'a> {
    pub mode: DrawMode,
    /// Layers in paint order, bottom first.
    pub layers: Vec<SpectrumLayer<'a>>,
}

/// Decides the draw mode for the selected profiles.
///
/// # Arguments
/// * `selected` - Selected profiles in selection order
///
/// # Returns
/// * Inspect directive for one profile
/// * Compare directive for two, the second-selected painted first (beneath)
/// * `Err(VoiceError::EmptySelection)` when nothing is selected
/// * `Err(VoiceError::SelectionFull)` when more than two are passed
pub fn select_draw_mode<'a>(selected: &[&'a VoiceProfile]) -> Result<DrawDirective<'a>, VoiceError> {
    let layer = |profile: &'a VoiceProfile, color, alpha| SpectrumLayer {
        label: profile.name.as_str(),
        envelope: voice_region(&profile.spectrum_envelope),
        color,
        alpha,
    };

    match selected {
        [] => Err(VoiceError::EmptySelection),
        [only] => Ok(DrawDirective {
            mode: DrawMode::Inspect,
            layers: vec![layer(*only, INSPECT_COLOR, INSPECT_ALPHA)],
        }),
        [first, second] => Ok(DrawDirective {
            mode: DrawMode::Compare,
            layers: vec![
                layer(*second, SECOND_COLOR, SECOND_ALPHA),
                layer(*first, FIRST_COLOR, FIRST_ALPHA),
            ],
        }),
        _ => Err(VoiceError::SelectionFull(MAX_SELECTION)),
    }
}

/// Selects the draw mode and hands the layers to `renderer`.
///
/// Nothing is drawn when the selection is rejected.
pub fn render_comparison(
    selected: &[&VoiceProfile],
    renderer: &mut impl Renderer,
) -> Result<DrawMode, VoiceError> {
    let directive = select_draw_mode(selected)?;
    renderer.draw_comparison(directive.mode, &directive.layers);
    Ok(directive.mode)
}
