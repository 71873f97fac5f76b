//! Pointer rays and the primitive intersections used for picking.

use glam::{Quat, Vec3};

use crate::orient::normalize_or_up;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
}

impl Ray {
    /// Build a ray; `direction` is normalized (degenerate input points up).
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: normalize_or_up(direction),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Nearest non-negative distance to a sphere, or `None` on a miss.
    /// A ray starting inside the sphere reports the exit distance.
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - radius * radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let sqrt_disc = disc.sqrt();
        let near = -b - sqrt_disc;
        let far = -b + sqrt_disc;
        if near >= 0.0 {
            Some(near)
        } else if far >= 0.0 {
            Some(far)
        } else {
            None
        }
    }

    /// Distance to a box of full extents `size` centred at `center` and
    /// rotated by `orientation`, or `None` on a miss. Slab test in box space.
    pub fn intersect_box(&self, center: Vec3, orientation: Quat, size: Vec3) -> Option<f32> {
        let inv_rot = orientation.inverse();
        let origin = inv_rot * (self.origin - center);
        let direction = inv_rot * self.direction;
        let half = size.abs() * 0.5;

        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;
        for axis in 0..3 {
            let o = origin[axis];
            let d = direction[axis];
            let h = half[axis];
            if d.abs() < 1e-8 {
                if o < -h || o > h {
                    return None;
                }
                continue;
            }
            let (mut t0, mut t1) = ((-h - o) / d, (h - o) / d);
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        if t_max < 0.0 {
            return None;
        }
        Some(if t_min >= 0.0 { t_min } else { t_max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_hit_front_face() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, -5.0));
        let t = ray.intersect_sphere(Vec3::ZERO, 2.0).unwrap();
        assert!((t - 8.0).abs() < 1e-5);
        assert!((ray.at(t) - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-5);
    }

    #[test]
    fn test_sphere_miss_and_behind() {
        let ray = Ray::new(Vec3::new(5.0, 0.0, 10.0), Vec3::NEG_Z);
        assert!(ray.intersect_sphere(Vec3::ZERO, 2.0).is_none());
        let away = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::Z);
        assert!(away.intersect_sphere(Vec3::ZERO, 2.0).is_none());
    }

    #[test]
    fn test_ray_inside_sphere_reports_exit() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let t = ray.intersect_sphere(Vec3::ZERO, 3.0).unwrap();
        assert!((t - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_box_hit_rotated() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        let rot = Quat::from_rotation_y(std::f32::consts::FRAC_PI_4);
        let t = ray
            .intersect_box(Vec3::ZERO, rot, Vec3::new(2.0, 2.0, 2.0))
            .unwrap();
        // Corner of the rotated cube faces the ray.
        assert!((t - (10.0 - 2f32.sqrt())).abs() < 1e-4);
    }

    #[test]
    fn test_box_miss_and_parallel() {
        let ray = Ray::new(Vec3::new(3.0, 0.0, 10.0), Vec3::NEG_Z);
        assert!(ray.intersect_box(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE).is_none());
        let inside = Ray::new(Vec3::ZERO, Vec3::X);
        let t = inside
            .intersect_box(Vec3::ZERO, Quat::IDENTITY, Vec3::new(4.0, 1.0, 1.0))
            .unwrap();
        assert!((t - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_degenerate_direction() {
        let ray = Ray::new(Vec3::ONE, Vec3::ZERO);
        assert_eq!(ray.direction, Vec3::Y);
    }
}
