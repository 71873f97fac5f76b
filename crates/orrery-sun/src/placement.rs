//! Column placement: one oriented, randomly sized box per lattice direction.

use glam::{Quat, Vec3};
use orrery_math::{Color, rotation_from_up};
use rand::Rng;
use tracing::warn;

use crate::options::{LayerOptions, SurfaceRipple};
use crate::palette::LayerStyle;
use crate::sampler::DirectionSample;

/// Hue and lightness jitter applied once to every base colour.
pub const COLOR_JITTER: f32 = 0.03;

/// One placed column. The rest pose never changes after placement.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnInstance {
    pub rest_position: Vec3,
    pub rest_orientation: Quat,
    /// `(side, length, side)`; the local Y axis is the length axis.
    pub rest_scale: Vec3,
    pub outward_normal: Vec3,
    pub base_color: Color,
    pub emissive_color: Color,
    pub surface_amplitude: f32,
    pub surface_phase: f32,
    pub flicker_phase: f32,
}

/// Current pose of a column derived from its rest pose.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnTransform {
    pub position: Vec3,
    pub orientation: Quat,
    pub scale: Vec3,
}

impl ColumnInstance {
    /// Pose after pushing the column `radial_offset` along its outward normal
    /// and scaling its length by `breathing`.
    pub fn posed(&self, radial_offset: f32, breathing: f32) -> ColumnTransform {
        ColumnTransform {
            position: self.rest_position + self.outward_normal * radial_offset,
            orientation: self.rest_orientation,
            scale: Vec3::new(
                self.rest_scale.x,
                self.rest_scale.y * breathing,
                self.rest_scale.z,
            ),
        }
    }

    pub fn rest_transform(&self) -> ColumnTransform {
        ColumnTransform {
            position: self.rest_position,
            orientation: self.rest_orientation,
            scale: self.rest_scale,
        }
    }
}

/// Inputs shared by every column of a layer.
pub struct PlacementParams<'a> {
    pub layer: &'a LayerOptions,
    pub style: &'a LayerStyle,
    pub gap_safety: f32,
    pub phi_shift: f32,
    pub ripple: &'a SurfaceRipple,
}

/// Length bounds with `min <= max`; swapped and warned otherwise.
pub fn length_bounds(layer: &LayerOptions) -> (f32, f32) {
    let (min, max) = (layer.min_len.max(0.0), layer.max_len.max(0.0));
    if min > max {
        warn!("Column min_len {min} exceeds max_len {max}; swapping bounds");
        (max, min)
    } else {
        (min, max)
    }
}

fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..hi) } else { lo }
}

/// Place one column per sample, in sample order.
pub fn place_columns<R: Rng + ?Sized>(
    samples: &[DirectionSample],
    params: &PlacementParams<'_>,
    rng: &mut R,
) -> Vec<ColumnInstance> {
    let (min_len, max_len) = length_bounds(params.layer);
    let jitter = params.layer.jitter.max(0.0);
    let side = params.layer.column_side;
    let ripple = params.ripple;

    samples
        .iter()
        .map(|sample| {
            let normal = sample.shifted(params.phi_shift).normal();
            let length = uniform(rng, min_len, max_len);

            let mut center = normal * (params.layer.radius + params.gap_safety + length * 0.5);
            if jitter > 0.0 {
                center += Vec3::new(
                    rng.random_range(-jitter..=jitter),
                    rng.random_range(-jitter..=jitter),
                    rng.random_range(-jitter..=jitter),
                );
            }

            let orientation = rotation_from_up(normal);

            let base_color = params.style.sample_base(rng).offset_hsl(
                uniform(rng, -COLOR_JITTER, COLOR_JITTER),
                0.0,
                uniform(rng, -COLOR_JITTER, COLOR_JITTER),
            );
            let emissive_color = params.style.emissive.sample(rng);

            let spread = ripple.jitter_amp.abs();
            let surface_amplitude = (ripple.base_amp + uniform(rng, -spread, spread)).max(0.0);
            let surface_phase = uniform(rng, 0.0, std::f32::consts::TAU);
            let flicker_phase = uniform(rng, 0.0, std::f32::consts::TAU);

            ColumnInstance {
                rest_position: center,
                rest_orientation: orientation,
                rest_scale: Vec3::new(side, length, side),
                outward_normal: orientation * Vec3::Y,
                base_color,
                emissive_color,
                surface_amplitude,
                surface_phase,
                flicker_phase,
            }
        })
        .collect()
}
