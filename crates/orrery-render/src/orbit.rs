//! Drag-to-orbit camera control with inertial damping. Zoom and pan are
//! not offered; the camera keeps its distance to the pivot.

use glam::{Vec2, Vec3};
use orrery_math::damp_factor;

use crate::camera::Camera;

/// Keeps the camera off the poles, where the look-at basis degenerates.
const POLAR_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitControls {
    pub target: Vec3,
    radius: f32,
    /// Azimuth about +Y, measured from +Z.
    azimuth: f32,
    /// Angle from +Y.
    polar: f32,
    /// Rotation still to be applied, `(azimuth, polar)`.
    pending: Vec2,
    /// Share of `pending` applied per 60 Hz frame; `0` applies drags at once.
    pub damping: f32,
    pub rotate_speed: f32,
}

impl OrbitControls {
    /// Orbit `camera.target` from where the camera currently sits.
    pub fn from_camera(camera: &Camera, damping: f32, rotate_speed: f32) -> Self {
        let offset = camera.position - camera.target;
        let radius = offset.length();
        let (azimuth, polar) = if radius > f32::EPSILON {
            (
                offset.x.atan2(offset.z),
                (offset.y / radius).clamp(-1.0, 1.0).acos(),
            )
        } else {
            (0.0, std::f32::consts::FRAC_PI_2)
        };
        Self {
            target: camera.target,
            radius,
            azimuth,
            polar: polar.clamp(POLAR_EPSILON, std::f32::consts::PI - POLAR_EPSILON),
            pending: Vec2::ZERO,
            damping: damping.clamp(0.0, 1.0),
            rotate_speed,
        }
    }

    /// Queue rotation for a pointer drag of `delta` physical pixels. A drag
    /// the full viewport height turns the camera once around.
    pub fn drag(&mut self, delta: Vec2, viewport_height: f32) {
        let scale = std::f32::consts::TAU * self.rotate_speed / viewport_height.max(1.0);
        self.pending -= delta * scale;
    }

    /// Advance by `dt` seconds and return whether the camera moved.
    pub fn update(&mut self, dt: f32) -> bool {
        if self.pending.length_squared() < 1e-12 {
            self.pending = Vec2::ZERO;
            return false;
        }
        let share = if self.damping <= 0.0 || self.damping >= 1.0 {
            1.0
        } else {
            damp_factor(-60.0 * (1.0 - self.damping).ln(), dt)
        };
        let step = self.pending * share;
        self.pending -= step;
        self.azimuth += step.x;
        self.polar = (self.polar + step.y)
            .clamp(POLAR_EPSILON, std::f32::consts::PI - POLAR_EPSILON);
        step != Vec2::ZERO
    }

    pub fn position(&self) -> Vec3 {
        let (sin_polar, cos_polar) = self.polar.sin_cos();
        let (sin_azimuth, cos_azimuth) = self.azimuth.sin_cos();
        self.target
            + Vec3::new(
                sin_polar * sin_azimuth,
                cos_polar,
                sin_polar * cos_azimuth,
            ) * self.radius
    }

    pub fn apply(&self, camera: &mut Camera) {
        camera.position = self.position();
        camera.target = self.target;
    }

    pub fn is_settled(&self) -> bool {
        self.pending.length_squared() < 1e-12
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controls(damping: f32) -> OrbitControls {
        let camera = Camera::looking_at(Vec3::new(0.0, 5.0, 20.0), Vec3::ZERO, 50.0);
        OrbitControls::from_camera(&camera, damping, 1.0)
    }

    #[test]
    fn test_from_camera_reproduces_position() {
        let c = controls(0.05);
        assert!((c.position() - Vec3::new(0.0, 5.0, 20.0)).length() < 1e-4);
    }

    #[test]
    fn test_drag_keeps_distance_to_pivot() {
        let mut c = controls(0.05);
        let radius = c.position().length();
        c.drag(Vec2::new(120.0, -40.0), 720.0);
        for _ in 0..200 {
            c.update(1.0 / 60.0);
            assert!((c.position().length() - radius).abs() < 1e-3);
        }
    }

    #[test]
    fn test_damping_spreads_drag_over_frames() {
        let mut c = controls(0.05);
        c.drag(Vec2::new(72.0, 0.0), 720.0);
        let start = c.azimuth;
        c.update(1.0 / 60.0);
        let first = c.azimuth - start;
        // One frame applies the damping share of the tenth-turn drag.
        assert!((first + 0.05 * std::f32::consts::TAU / 10.0).abs() < 1e-4);
        for _ in 0..600 {
            c.update(1.0 / 60.0);
        }
        assert!(c.is_settled());
        assert!((c.azimuth - start + std::f32::consts::TAU / 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_damping_is_frame_rate_independent() {
        let mut a = controls(0.05);
        let mut b = controls(0.05);
        a.drag(Vec2::new(50.0, 30.0), 720.0);
        b.drag(Vec2::new(50.0, 30.0), 720.0);
        for _ in 0..30 {
            a.update(1.0 / 30.0);
        }
        for _ in 0..60 {
            b.update(1.0 / 60.0);
        }
        assert!((a.position() - b.position()).length() < 1e-3);
    }

    #[test]
    fn test_polar_is_clamped_off_the_poles() {
        let mut c = controls(1.0);
        // Dragging down swings the camera over the top.
        c.drag(Vec2::new(0.0, 5000.0), 720.0);
        c.update(1.0 / 60.0);
        assert_eq!(c.polar, POLAR_EPSILON);
        assert!(c.position().is_finite());
        c.drag(Vec2::new(0.0, -10000.0), 720.0);
        c.update(1.0 / 60.0);
        assert_eq!(c.polar, std::f32::consts::PI - POLAR_EPSILON);
    }

    #[test]
    fn test_zero_damping_turns_immediately() {
        let mut c = controls(0.0);
        c.drag(Vec2::new(72.0, 0.0), 720.0);
        let start = c.azimuth;
        assert!(c.update(1.0 / 60.0));
        assert!((c.azimuth - start + std::f32::consts::TAU / 10.0).abs() < 1e-5);
        assert!(c.is_settled());
    }

    #[test]
    fn test_idle_controls_report_no_motion() {
        let mut c = controls(0.05);
        assert!(!c.update(1.0 / 60.0));
        let mut camera = Camera::default();
        c.apply(&mut camera);
        assert!((camera.position - Vec3::new(0.0, 5.0, 20.0)).length() < 1e-4);
        assert_eq!(camera.target, Vec3::ZERO);
    }
}
