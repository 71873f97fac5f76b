//! Instanced voxel layer: a fixed set of columns posed every frame from a
//! shared radial offset and breathing oscillator.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use orrery_math::{Color, Ray};

use crate::options::LayerOptions;
use crate::placement::{ColumnInstance, ColumnTransform};

/// Which concentric layer of the sun.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Core,
    Shell,
}

impl LayerKind {
    pub const ALL: [LayerKind; 2] = [LayerKind::Core, LayerKind::Shell];

    /// Default `(speed, amplitude)` of the length-axis breathing.
    pub fn default_breathing(self) -> (f32, f32) {
        match self {
            LayerKind::Core => (0.9, 0.10),
            LayerKind::Shell => (0.9, 0.18),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LayerKind::Core => "core",
            LayerKind::Shell => "shell",
        }
    }
}

/// Length-axis breathing oscillator shared by a layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Breathing {
    pub speed: f32,
    pub amp: f32,
}

impl Breathing {
    pub fn for_layer(kind: LayerKind, options: &LayerOptions) -> Self {
        let (speed, amp) = kind.default_breathing();
        Self {
            speed: options.breathing_speed.unwrap_or(speed),
            amp: options.breathing_amp.unwrap_or(amp),
        }
    }

    /// `1 + amp·sin(speed·t + phase)`.
    pub fn factor(&self, t: f32, phase: f32) -> f32 {
        1.0 + self.amp * (self.speed * t + phase).sin()
    }
}

/// Per-instance vertex data uploaded to the GPU.
///
/// `emissive.w` carries the flicker phase; `surface` is
/// `(amplitude, phase, 0, 0)`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ColumnInstanceRaw {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub emissive: [f32; 4],
    pub surface: [f32; 4],
}

impl ColumnInstanceRaw {
    pub fn new(transform: &ColumnTransform, column: &ColumnInstance) -> Self {
        let model = Mat4::from_scale_rotation_translation(
            transform.scale,
            transform.orientation,
            transform.position,
        );
        let Color { r, g, b } = column.base_color;
        let e = column.emissive_color;
        Self {
            model: model.to_cols_array_2d(),
            color: [r, g, b, 1.0],
            emissive: [e.r, e.g, e.b, column.flicker_phase],
            surface: [column.surface_amplitude, column.surface_phase, 0.0, 0.0],
        }
    }
}

/// Nearest column hit along a ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnHit {
    pub index: usize,
    pub distance: f32,
}

/// One layer of columns.
pub struct VoxelLayer {
    kind: LayerKind,
    columns: Vec<ColumnInstance>,
    transforms: Vec<ColumnTransform>,
    breathing: Breathing,
    radial_offset: f32,
}

impl VoxelLayer {
    pub fn new(kind: LayerKind, columns: Vec<ColumnInstance>, breathing: Breathing) -> Self {
        let transforms = columns.iter().map(ColumnInstance::rest_transform).collect();
        Self {
            kind,
            columns,
            transforms,
            breathing,
            radial_offset: 0.0,
        }
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[ColumnInstance] {
        &self.columns
    }

    pub fn transforms(&self) -> &[ColumnTransform] {
        &self.transforms
    }

    pub fn breathing(&self) -> Breathing {
        self.breathing
    }

    pub fn radial_offset(&self) -> f32 {
        self.radial_offset
    }

    /// Recompute every current transform from the rest pose, the shared
    /// radial offset and the breathing oscillator at time `t`.
    pub fn apply(&mut self, radial_offset: f32, t: f32) {
        self.radial_offset = radial_offset;
        let breathing = self.breathing;
        for (column, transform) in self.columns.iter().zip(self.transforms.iter_mut()) {
            *transform = column.posed(radial_offset, breathing.factor(t, column.surface_phase));
        }
    }

    /// Pose every column with an explicit breathing factor.
    pub fn apply_uniform(&mut self, radial_offset: f32, breathing_factor: f32) {
        self.radial_offset = radial_offset;
        for (column, transform) in self.columns.iter().zip(self.transforms.iter_mut()) {
            *transform = column.posed(radial_offset, breathing_factor);
        }
    }

    /// Restore the rest pose.
    pub fn reset(&mut self) {
        self.apply_uniform(0.0, 1.0);
    }

    /// Instance buffer contents in column order.
    pub fn instance_data(&self) -> Vec<ColumnInstanceRaw> {
        self.columns
            .iter()
            .zip(&self.transforms)
            .map(|(column, transform)| ColumnInstanceRaw::new(transform, column))
            .collect()
    }

    /// Nearest column intersected by a ray given in layer-local space.
    pub fn raycast(&self, ray: &Ray) -> Option<ColumnHit> {
        self.transforms
            .iter()
            .enumerate()
            .filter_map(|(index, transform)| {
                ray.intersect_box(transform.position, transform.orientation, transform.scale)
                    .map(|distance| ColumnHit { index, distance })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::SurfaceRipple;
    use crate::palette::LayerStyle;
    use crate::placement::{PlacementParams, place_columns};
    use crate::sampler::sample_sphere;
    use glam::Vec3;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn layer(kind: LayerKind, phi: u32, theta: u32) -> VoxelLayer {
        let options = LayerOptions {
            jitter: 0.02,
            ..LayerOptions::default()
        };
        let style = LayerStyle::from_options(&options);
        let ripple = SurfaceRipple::default();
        let params = PlacementParams {
            layer: &options,
            style: &style,
            gap_safety: 0.02,
            phi_shift: 0.0,
            ripple: &ripple,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let columns = place_columns(&sample_sphere(phi, theta), &params, &mut rng);
        VoxelLayer::new(kind, columns, Breathing::for_layer(kind, &options))
    }

    #[test]
    fn test_reset_restores_rest_pose() {
        let mut layer = layer(LayerKind::Shell, 16, 8);
        let rest: Vec<_> = layer.transforms().to_vec();
        layer.apply(7.0, 3.3);
        assert_ne!(layer.transforms(), rest.as_slice());
        layer.reset();
        for (current, column) in layer.transforms().iter().zip(layer.columns()) {
            assert!((current.position - column.rest_position).length() < 1e-5);
            assert!(current.orientation.abs_diff_eq(column.rest_orientation, 1e-6));
            assert!((current.scale - column.rest_scale).length() < 1e-6);
        }
    }

    #[test]
    fn test_apply_changes_only_pose() {
        let mut layer = layer(LayerKind::Core, 8, 4);
        let colors: Vec<_> = layer.columns().iter().map(|c| c.base_color).collect();
        layer.apply(2.0, 1.0);
        let after: Vec<_> = layer.columns().iter().map(|c| c.base_color).collect();
        assert_eq!(colors, after);
        for (current, column) in layer.transforms().iter().zip(layer.columns()) {
            let shift = current.position - column.rest_position;
            assert!((shift - column.outward_normal * 2.0).length() < 1e-4);
            assert_eq!(current.scale.x, column.rest_scale.x);
            assert_eq!(current.scale.z, column.rest_scale.z);
        }
    }

    #[test]
    fn test_breathing_scales_length_per_phase() {
        let mut layer = layer(LayerKind::Shell, 8, 4);
        let t = 2.0;
        layer.apply(0.0, t);
        let breathing = layer.breathing();
        for (current, column) in layer.transforms().iter().zip(layer.columns()) {
            let expected = column.rest_scale.y * (1.0 + 0.18 * (0.9 * t + column.surface_phase).sin());
            assert!((current.scale.y - expected).abs() < 1e-5);
            assert_eq!(breathing.amp, 0.18);
        }
    }

    #[test]
    fn test_empty_layer_is_noop() {
        let mut layer = VoxelLayer::new(LayerKind::Core, Vec::new(), Breathing { speed: 1.0, amp: 0.1 });
        layer.apply(5.0, 1.0);
        assert!(layer.is_empty());
        assert!(layer.instance_data().is_empty());
        assert!(layer.raycast(&Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z)).is_none());
    }

    #[test]
    fn test_instance_data_layout() {
        let layer = layer(LayerKind::Core, 4, 2);
        let raw = layer.instance_data();
        assert_eq!(raw.len(), layer.len());
        assert_eq!(std::mem::size_of::<ColumnInstanceRaw>(), 112);
        let first = &layer.columns()[0];
        assert_eq!(raw[0].emissive[3], first.flicker_phase);
        assert_eq!(raw[0].surface[0], first.surface_amplitude);
        let translation = raw[0].model[3];
        assert!((Vec3::new(translation[0], translation[1], translation[2]) - first.rest_position).length() < 1e-5);
    }

    #[test]
    fn test_raycast_hits_nearest_column() {
        let layer = layer(LayerKind::Core, 24, 12);
        let hit = layer
            .raycast(&Ray::new(Vec3::new(0.0, 0.0, 20.0), Vec3::NEG_Z))
            .expect("ray through the centre must hit a column");
        let column = &layer.transforms()[hit.index];
        assert!(column.position.z > 0.0);
        assert!(hit.distance > 0.0 && hit.distance < 20.0);
    }
}
