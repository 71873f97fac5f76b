//! Weighted colour palettes sampled through their cumulative distribution.

use orrery_math::Color;
use rand::Rng;
use tracing::warn;

use crate::options::{ColorRatio, EmissiveRatio, LayerOptions};

#[derive(Clone, Copy, Debug, PartialEq)]
struct PaletteEntry {
    cutoff: f32,
    color: Color,
}

/// Colours with cumulative cutoffs in `(0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedPalette {
    entries: Vec<PaletteEntry>,
}

impl WeightedPalette {
    /// Build a palette from `(colour, weight)` pairs. Negative weights count as
    /// zero; an all-zero palette keeps its entries but every cutoff is zero.
    /// Returns `None` for an empty list.
    pub fn new(weighted: impl IntoIterator<Item = (Color, f32)>) -> Option<Self> {
        let weighted: Vec<(Color, f32)> = weighted
            .into_iter()
            .map(|(c, w)| (c, if w.is_finite() { w.max(0.0) } else { 0.0 }))
            .collect();
        if weighted.is_empty() {
            return None;
        }
        let sum: f32 = weighted.iter().map(|(_, w)| w).sum();
        let total = if sum > 0.0 { sum } else { 1.0 };
        let mut acc = 0.0;
        let entries = weighted
            .into_iter()
            .map(|(color, w)| {
                acc += w / total;
                PaletteEntry { cutoff: acc, color }
            })
            .collect();
        Some(Self { entries })
    }

    /// First entry whose cutoff is `>= r`, or `None` when `r` falls past the
    /// last cutoff.
    pub fn pick(&self, r: f32) -> Option<Color> {
        self.entries.iter().find(|e| r <= e.cutoff).map(|e| e.color)
    }

    /// Draw `r ~ U[0, 1)` and [`pick`](Self::pick).
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Color> {
        self.pick(rng.random::<f32>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Where a column's emissive tint comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum EmissiveSource {
    /// Weighted palette, intensities pre-multiplied.
    Palette(WeightedPalette),
    /// Single tint shared by every column.
    Tint(Color),
    /// No tint: white, multiplier 1.
    Neutral,
}

impl EmissiveSource {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Color {
        match self {
            EmissiveSource::Palette(palette) => palette.sample(rng).unwrap_or(Color::WHITE),
            EmissiveSource::Tint(color) => *color,
            EmissiveSource::Neutral => Color::WHITE,
        }
    }
}

/// Parsed colour sources of one layer.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerStyle {
    pub flat_color: Color,
    pub base_palette: Option<WeightedPalette>,
    pub emissive: EmissiveSource,
    /// Material-level emissive (`emissive × emissive_intensity`, black when unset).
    pub material_emissive: Color,
}

impl LayerStyle {
    /// Resolve the colour options of a layer. Unparseable colours are logged
    /// and replaced: the flat colour by the default column colour, palette
    /// entries are skipped.
    pub fn from_options(options: &LayerOptions) -> Self {
        let flat_color = parse_or(&options.color, crate::options::DEFAULT_COLUMN_COLOR);

        let base_palette = WeightedPalette::new(parse_base_entries(&options.colors));

        let emissive_tint = options.emissive.as_deref().and_then(parse_logged);
        let emissive = if let Some(palette) =
            WeightedPalette::new(parse_emissive_entries(&options.emissive_colors))
        {
            EmissiveSource::Palette(palette)
        } else if let Some(tint) = emissive_tint {
            EmissiveSource::Tint(tint.scaled(options.emissive_intensity.unwrap_or(1.0)))
        } else {
            EmissiveSource::Neutral
        };

        let material_emissive = emissive_tint
            .map(|c| c.scaled(options.emissive_intensity.unwrap_or(0.0)))
            .unwrap_or(Color::BLACK);

        Self {
            flat_color,
            base_palette,
            emissive,
            material_emissive,
        }
    }

    /// Base colour draw: palette when present, flat colour otherwise or when
    /// the draw misses every cutoff.
    pub fn sample_base<R: Rng + ?Sized>(&self, rng: &mut R) -> Color {
        match &self.base_palette {
            Some(palette) => palette.sample(rng).unwrap_or(self.flat_color),
            None => self.flat_color,
        }
    }
}

fn parse_logged(hex: &str) -> Option<Color> {
    let parsed = Color::from_hex(hex);
    if parsed.is_none() {
        warn!("Ignoring invalid colour '{hex}'");
    }
    parsed
}

fn parse_or(hex: &str, fallback: &str) -> Color {
    parse_logged(hex)
        .or_else(|| Color::from_hex(fallback))
        .unwrap_or(Color::WHITE)
}

fn parse_base_entries(entries: &[ColorRatio]) -> Vec<(Color, f32)> {
    entries
        .iter()
        .filter_map(|e| parse_logged(&e.color).map(|c| (c, e.ratio)))
        .collect()
}

fn parse_emissive_entries(entries: &[EmissiveRatio]) -> Vec<(Color, f32)> {
    entries
        .iter()
        .filter_map(|e| {
            parse_logged(&e.color).map(|c| (c.scaled(e.intensity.unwrap_or(1.0)), e.ratio))
        })
        .collect()
}
