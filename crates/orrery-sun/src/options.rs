//! Configuration surface of the voxel sun.

use serde::{Deserialize, Serialize};

/// Flat column colour used when no palette is configured.
pub const DEFAULT_COLUMN_COLOR: &str = "#d9c19a";

/// One entry of a weighted base-colour palette.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColorRatio {
    /// Hex colour, e.g. `"#ffb347"`.
    pub color: String,
    /// Relative weight; entries are normalized to sum to 1.
    pub ratio: f32,
}

/// One entry of a weighted emissive palette.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmissiveRatio {
    pub color: String,
    pub ratio: f32,
    /// Multiplier baked into the colour (defaults to 1).
    #[serde(default)]
    pub intensity: Option<f32>,
}

/// How a pointer click on the sun drives the radial push.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum InteractionMode {
    /// Every click pushes both layers out and retracts them after the pulse duration.
    #[default]
    Pulse,
    /// Clicks alternate between pushed out and retracted; no automatic retraction.
    Toggle,
}

/// Per-layer placement and shading options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayerOptions {
    /// Radius of the reference sphere the columns stand on.
    pub radius: f32,
    /// Cross-section side length of every column.
    pub column_side: f32,
    /// Shortest column length.
    pub min_len: f32,
    /// Longest column length.
    pub max_len: f32,
    /// Uniform per-axis position jitter.
    pub jitter: f32,
    /// Flat colour used when `colors` is empty.
    pub color: String,
    /// Weighted base-colour palette.
    pub colors: Vec<ColorRatio>,
    /// Material emissive colour; also the instance tint when no emissive palette is set.
    pub emissive: Option<String>,
    /// Material emissive intensity.
    pub emissive_intensity: Option<f32>,
    /// Weighted per-column emissive palette.
    pub emissive_colors: Vec<EmissiveRatio>,
    /// Enables emissive brightness oscillation.
    pub flicker: bool,
    pub flicker_speed: f32,
    pub flicker_amp: f32,
    /// Length-axis breathing speed; kind default when unset.
    pub breathing_speed: Option<f32>,
    /// Length-axis breathing amplitude; kind default when unset.
    pub breathing_amp: Option<f32>,
}

impl Default for LayerOptions {
    fn default() -> Self {
        Self {
            radius: 1.0,
            column_side: 0.1,
            min_len: 0.2,
            max_len: 0.5,
            jitter: 0.0,
            color: DEFAULT_COLUMN_COLOR.to_string(),
            colors: Vec::new(),
            emissive: None,
            emissive_intensity: None,
            emissive_colors: Vec::new(),
            flicker: true,
            flicker_speed: 1.0,
            flicker_amp: 0.15,
            breathing_speed: None,
            breathing_amp: None,
        }
    }
}

/// Continuous vertex ripple applied in the shader.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SurfaceRipple {
    /// Mean per-column ripple amplitude.
    pub base_amp: f32,
    /// Uniform spread around `base_amp`.
    pub jitter_amp: f32,
    /// Spatial frequency along the column's local up axis.
    pub frequency: f32,
    /// Temporal speed.
    pub speed: f32,
}

impl Default for SurfaceRipple {
    fn default() -> Self {
        Self {
            base_amp: 0.035,
            jitter_amp: 0.015,
            frequency: 8.0,
            speed: 1.0,
        }
    }
}

/// Composite options for the two-layer voxel sun.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SunOptions {
    /// Longitude divisions.
    pub columns_phi: u32,
    /// Latitude divisions.
    pub columns_theta: u32,
    pub core: LayerOptions,
    pub shell: LayerOptions,
    /// Longitude shift of the shell lattice, in `[0, 1)`.
    pub phi_stagger: f32,
    /// Extra clearance between a layer's radius and its columns.
    pub gap_safety: f32,
    /// Shell counter-rotation rate about Y (rad/s).
    pub counter_rotate: f32,
    /// Group yaw rate (rad/s).
    pub spin_rate: f32,
    /// Placement seed; drawn at startup when unset.
    pub seed: Option<u64>,
    pub interaction: InteractionMode,
    /// Radial push of the core when expanded.
    pub core_push: f32,
    /// Radial push of the shell when expanded.
    pub shell_push: f32,
    /// Delay before a pulse retracts both layers.
    pub pulse_ms: u64,
    /// Decay rate of the radial offset toward its target.
    pub offset_damping: f32,
    pub ripple: SurfaceRipple,
    /// Rim-light exponent; `0` disables the rim term.
    pub fresnel_pow: f32,
    pub rim_strength: f32,
}

impl Default for SunOptions {
    fn default() -> Self {
        Self {
            columns_phi: 48,
            columns_theta: 24,
            core: LayerOptions {
                radius: 1.2,
                column_side: 0.12,
                min_len: 0.2,
                max_len: 0.6,
                jitter: 0.01,
                colors: vec![
                    ColorRatio { color: "#ffb347".into(), ratio: 0.6 },
                    ColorRatio { color: "#ff7f27".into(), ratio: 0.3 },
                    ColorRatio { color: "#fff1a8".into(), ratio: 0.1 },
                ],
                emissive: Some("#ff8c1a".into()),
                emissive_intensity: Some(1.6),
                ..LayerOptions::default()
            },
            shell: LayerOptions {
                radius: 2.0,
                column_side: 0.16,
                min_len: 0.3,
                max_len: 0.9,
                jitter: 0.02,
                color: DEFAULT_COLUMN_COLOR.to_string(),
                emissive: Some("#ffffff".into()),
                emissive_intensity: Some(1.0),
                emissive_colors: vec![
                    EmissiveRatio { color: "#ff5a1f".into(), ratio: 0.7, intensity: Some(0.8) },
                    EmissiveRatio { color: "#ffd36b".into(), ratio: 0.3, intensity: Some(1.5) },
                ],
                flicker_speed: 1.4,
                flicker_amp: 0.25,
                ..LayerOptions::default()
            },
            phi_stagger: 0.5 / 48.0,
            gap_safety: 0.02,
            counter_rotate: 0.15,
            spin_rate: 0.25,
            seed: None,
            interaction: InteractionMode::Pulse,
            core_push: 2.0,
            shell_push: 7.0,
            pulse_ms: 1260,
            offset_damping: 6.0,
            ripple: SurfaceRipple::default(),
            fresnel_pow: 0.0,
            rim_strength: 1.0,
        }
    }
}
