//! Configuration surface of one orbiting planet.

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Surface look of the planet sphere.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Basic,
    Metal,
    Grid,
    Holo,
    Toon,
    Lowpoly,
    Morph,
    /// Slowly distorting sphere.
    Wobble,
    /// Sphere drawn as its triangle wireframe.
    Wire,
}

impl Variant {
    /// Selector passed to the planet shader.
    pub fn shader_id(self) -> u32 {
        match self {
            Variant::Basic => 0,
            Variant::Metal => 1,
            Variant::Grid => 2,
            Variant::Holo => 3,
            Variant::Toon => 4,
            Variant::Lowpoly => 5,
            Variant::Morph => 6,
            Variant::Wobble => 7,
            Variant::Wire => 8,
        }
    }

    /// Holographic spheres blend over the scene instead of writing depth.
    pub fn is_translucent(self) -> bool {
        matches!(self, Variant::Holo)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlanetOptions {
    /// Hex base colour.
    pub color: String,
    pub orbit_radius: f32,
    /// Orbital angular speed in rad/s.
    pub orbit_angular_speed: f32,
    /// Sphere radius.
    pub size: f32,
    pub variant: Variant,
    /// Draw a tilted ring around the sphere.
    pub ring: bool,
    /// Card target orientation, Euler XYZ radians.
    pub card_rotation: [f32; 3],
    /// Full card extents once focused.
    pub card_size: [f32; 3],
    /// Entrance spin magnitude per axis, Euler XYZ radians.
    pub appear_spin: [f32; 3],
    /// Amplitude of the mid-transition scale pop.
    pub appear_overshoot: f32,
    /// Orientation of the orbital plane, Euler XYZ radians.
    pub orbit_plane_rotation: [f32; 3],
    /// Starting orbital angle; drawn from the scene seed when unset.
    pub phase_offset: Option<f32>,
}

impl Default for PlanetOptions {
    fn default() -> Self {
        Self {
            color: "#cccccc".to_string(),
            orbit_radius: 5.0,
            orbit_angular_speed: 0.05,
            size: 0.5,
            variant: Variant::Basic,
            ring: false,
            card_rotation: [0.22, -0.29, 0.0],
            card_size: [6.4, 4.0, 0.12],
            appear_spin: [0.0, std::f32::consts::PI, 0.0],
            appear_overshoot: 0.12,
            orbit_plane_rotation: [0.0; 3],
            phase_offset: None,
        }
    }
}

/// Euler XYZ angles to a quaternion.
pub fn euler_xyz(angles: [f32; 3]) -> Quat {
    Quat::from_euler(EulerRot::XYZ, angles[0], angles[1], angles[2])
}

pub(crate) fn euler_xyz_scaled(angles: [f32; 3], factor: f32) -> Quat {
    euler_xyz((Vec3::from_array(angles) * factor).to_array())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_names_are_lowercase() {
        let options: PlanetOptions = ron::from_str("(variant: holo, ring: true)").unwrap();
        assert_eq!(options.variant, Variant::Holo);
        assert!(options.ring);
        assert_eq!(options.orbit_radius, PlanetOptions::default().orbit_radius);
    }

    #[test]
    fn test_shader_ids_are_distinct() {
        let variants = [
            Variant::Basic,
            Variant::Metal,
            Variant::Grid,
            Variant::Holo,
            Variant::Toon,
            Variant::Lowpoly,
            Variant::Morph,
            Variant::Wobble,
            Variant::Wire,
        ];
        let mut ids: Vec<u32> = variants.iter().map(|v| v.shader_id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), variants.len());
    }

    #[test]
    fn test_parses_wobble_and_wire() {
        let wobble: PlanetOptions = ron::from_str("(variant: wobble)").unwrap();
        assert_eq!(wobble.variant, Variant::Wobble);
        let wire: PlanetOptions = ron::from_str("(variant: wire)").unwrap();
        assert_eq!(wire.variant, Variant::Wire);
        assert!(!wire.variant.is_translucent());
    }

    #[test]
    fn test_euler_zero_is_identity() {
        assert_eq!(euler_xyz([0.0; 3]), Quat::IDENTITY);
        let half = euler_xyz_scaled([0.0, 2.0, 0.0], 0.5);
        assert!(half.abs_diff_eq(Quat::from_rotation_y(1.0), 1e-6));
    }
}
