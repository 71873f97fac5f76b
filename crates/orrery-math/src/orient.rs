//! Orientation helpers that never propagate NaN from degenerate input.

use glam::{Quat, Vec3};

/// Normalize `v`, falling back to `+Y` when `v` is zero-length or not finite.
pub fn normalize_or_up(v: Vec3) -> Vec3 {
    v.try_normalize().unwrap_or(Vec3::Y)
}

/// Shortest-arc rotation taking the canonical up axis (`+Y`) onto `direction`.
///
/// Degenerate directions resolve to the identity rotation.
pub fn rotation_from_up(direction: Vec3) -> Quat {
    Quat::from_rotation_arc(Vec3::Y, normalize_or_up(direction))
}
