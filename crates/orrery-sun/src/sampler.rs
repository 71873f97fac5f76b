//! Latitude/longitude lattice of directions over the unit sphere.

use glam::Vec3;

/// Normalized longitude (`u`) and latitude (`v`) of one lattice point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionSample {
    /// Longitude in `[0, 1)`.
    pub u: f32,
    /// Latitude in `[0, 1]`, `0` at the north pole.
    pub v: f32,
}

impl DirectionSample {
    /// Shift the longitude by `phi_shift`, wrapping into `[0, 1)`.
    pub fn shifted(self, phi_shift: f32) -> Self {
        Self {
            u: (self.u + phi_shift).rem_euclid(1.0),
            v: self.v,
        }
    }

    /// Outward unit vector for this sample: `theta = v·π`, `phi = u·2π`.
    pub fn normal(self) -> Vec3 {
        let theta = self.v * std::f32::consts::PI;
        let phi = self.u * std::f32::consts::TAU;
        let sin_t = theta.sin();
        orrery_math::normalize_or_up(Vec3::new(sin_t * phi.cos(), theta.cos(), sin_t * phi.sin()))
    }
}

/// Number of samples [`sample_sphere`] yields for the given divisions.
pub fn sample_count(columns_phi: u32, columns_theta: u32) -> usize {
    if columns_phi == 0 || columns_theta == 0 {
        return 0;
    }
    (columns_theta as usize + 1) * columns_phi as usize
}

/// Row-major lattice: latitude rows `0..=columns_theta` outer, longitude
/// columns `0..columns_phi` inner. Pure function of its inputs.
///
/// Zero divisions yield an empty lattice.
pub fn sample_sphere(columns_phi: u32, columns_theta: u32) -> Vec<DirectionSample> {
    let mut samples = Vec::with_capacity(sample_count(columns_phi, columns_theta));
    if columns_phi == 0 || columns_theta == 0 {
        return samples;
    }
    for t in 0..=columns_theta {
        let v = t as f32 / columns_theta as f32;
        for p in 0..columns_phi {
            let u = p as f32 / columns_phi as f32;
            samples.push(DirectionSample { u, v });
        }
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_matches_lattice_size() {
        for (phi, theta) in [(1, 1), (4, 2), (48, 24), (7, 13)] {
            let samples = sample_sphere(phi, theta);
            assert_eq!(samples.len(), ((theta + 1) * phi) as usize);
            assert_eq!(samples.len(), sample_count(phi, theta));
        }
    }

    #[test]
    fn test_deterministic_sequence() {
        assert_eq!(sample_sphere(16, 8), sample_sphere(16, 8));
    }

    #[test]
    fn test_row_major_order() {
        let samples = sample_sphere(4, 2);
        assert_eq!(samples[0], DirectionSample { u: 0.0, v: 0.0 });
        assert_eq!(samples[1], DirectionSample { u: 0.25, v: 0.0 });
        assert_eq!(samples[4], DirectionSample { u: 0.0, v: 0.5 });
        assert_eq!(samples[11], DirectionSample { u: 0.75, v: 1.0 });
    }

    #[test]
    fn test_zero_divisions_yield_empty() {
        assert!(sample_sphere(0, 8).is_empty());
        assert!(sample_sphere(8, 0).is_empty());
    }

    #[test]
    fn test_shift_wraps() {
        let s = DirectionSample { u: 0.75, v: 0.5 }.shifted(0.5);
        assert!((s.u - 0.25).abs() < 1e-6);
        assert_eq!(s.v, 0.5);
        let unshifted = DirectionSample { u: 0.3, v: 0.1 }.shifted(1.0);
        assert!((unshifted.u - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_normals_are_unit_and_poles_align() {
        for s in sample_sphere(12, 6) {
            assert!((s.normal().length() - 1.0).abs() < 1e-5);
        }
        let north = DirectionSample { u: 0.3, v: 0.0 }.normal();
        assert!((north - Vec3::Y).length() < 1e-5);
        let south = DirectionSample { u: 0.3, v: 1.0 }.normal();
        assert!((south - Vec3::NEG_Y).length() < 1e-5);
        let equator = DirectionSample { u: 0.0, v: 0.5 }.normal();
        assert!((equator - Vec3::X).length() < 1e-5);
    }
}
