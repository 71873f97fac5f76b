//! Exponential smoothing toward a target.
//!
//! Each step closes the fraction `1 - exp(-lambda * dt)` of the remaining gap,
//! so two steps of `dt / 2` land exactly where one step of `dt` does. The
//! fraction stays in `[0, 1)`, so the approach is monotonic and never overshoots.

use glam::{Quat, Vec3};

/// Fraction of the remaining distance covered in one step of `dt` seconds.
///
/// Negative or non-finite inputs produce `0.0` (no movement).
pub fn damp_factor(lambda: f32, dt: f32) -> f32 {
    let k = lambda * dt;
    if !k.is_finite() || k <= 0.0 {
        return 0.0;
    }
    1.0 - (-k).exp()
}

/// Move `current` toward `target` with decay rate `lambda` over `dt` seconds.
pub fn damp(current: f32, target: f32, lambda: f32, dt: f32) -> f32 {
    current + (target - current) * damp_factor(lambda, dt)
}

/// Component-wise [`damp`] for vectors.
pub fn damp_vec3(current: Vec3, target: Vec3, lambda: f32, dt: f32) -> Vec3 {
    current.lerp(target, damp_factor(lambda, dt))
}

/// Spherical [`damp`] for orientations.
pub fn damp_quat(current: Quat, target: Quat, lambda: f32, dt: f32) -> Quat {
    current.slerp(target, damp_factor(lambda, dt)).normalize()
}
