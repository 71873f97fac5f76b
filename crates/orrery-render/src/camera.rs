//! Look-at camera with reverse-Z perspective and cursor picking rays.

use glam::{Mat4, Vec2, Vec3, Vec4};
use orrery_math::Ray;

#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Camera at `position` looking at `target` with a vertical FOV in degrees.
    pub fn looking_at(position: Vec3, target: Vec3, fov_y_degrees: f32) -> Self {
        Self {
            position,
            target,
            fov_y: fov_y_degrees.to_radians(),
            ..Self::default()
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    /// Near and far are swapped so the near plane lands on depth 1.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect_ratio, self.far, self.near)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    pub fn set_aspect_ratio(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect_ratio = width / height;
        }
    }

    /// World-space ray through a cursor position given in physical pixels,
    /// origin top-left.
    pub fn cursor_ray(&self, cursor: Vec2, viewport: Vec2) -> Ray {
        let ndc = Vec2::new(
            2.0 * cursor.x / viewport.x.max(1.0) - 1.0,
            1.0 - 2.0 * cursor.y / viewport.y.max(1.0),
        );
        let inv = self.view_projection_matrix().inverse();
        let unproject = |depth: f32| {
            let p = inv * Vec4::new(ndc.x, ndc.y, depth, 1.0);
            p.truncate() / p.w
        };
        let near = unproject(1.0);
        let far = unproject(0.0);
        Ray::new(self.position, far - near)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 10.0),
            target: Vec3::ZERO,
            fov_y: 50f32.to_radians(),
            aspect_ratio: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_z_depth_ordering() {
        let camera = Camera::default();
        let vp = camera.view_projection_matrix();
        let depth = |p: Vec3| {
            let clip = vp * p.extend(1.0);
            clip.z / clip.w
        };
        let near = depth(Vec3::new(0.0, 0.0, 9.0));
        let far = depth(Vec3::new(0.0, 0.0, -100.0));
        assert!(near > far, "closer points must have larger depth: {near} vs {far}");
        assert!((0.0..=1.0).contains(&near));
        assert!((0.0..=1.0).contains(&far));
    }

    #[test]
    fn test_center_ray_points_at_target() {
        let camera = Camera::looking_at(Vec3::new(-15.5, -11.0, 50.0), Vec3::ZERO, 50.0);
        let viewport = Vec2::new(1280.0, 720.0);
        let ray = camera.cursor_ray(viewport * 0.5, viewport);
        assert!((ray.direction - camera.forward()).length() < 1e-4);
        assert_eq!(ray.origin, camera.position);
    }

    #[test]
    fn test_corner_rays_diverge() {
        let camera = Camera::default();
        let viewport = Vec2::new(800.0, 600.0);
        let top_left = camera.cursor_ray(Vec2::ZERO, viewport);
        let bottom_right = camera.cursor_ray(viewport, viewport);
        assert!(top_left.direction.x < 0.0 && top_left.direction.y > 0.0);
        assert!(bottom_right.direction.x > 0.0 && bottom_right.direction.y < 0.0);
        let half_fov = top_left.direction.angle_between(camera.forward());
        assert!(half_fov > camera.fov_y * 0.5);
    }

    #[test]
    fn test_aspect_ratio_ignores_zero_size() {
        let mut camera = Camera::default();
        camera.set_aspect_ratio(0.0, 600.0);
        assert_eq!(camera.aspect_ratio, 16.0 / 9.0);
        camera.set_aspect_ratio(800.0, 400.0);
        assert_eq!(camera.aspect_ratio, 2.0);
    }
}
