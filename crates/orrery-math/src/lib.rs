//! Frame-rate independent smoothing, easing curves, orientation helpers,
//! picking rays and colour math shared by the voxel sun and the planets.

mod color;
mod damp;
mod easing;
mod orient;
mod ray;

pub use color::Color;
pub use damp::{damp, damp_factor, damp_quat, damp_vec3};
pub use easing::{EASE_BACK_OVERSHOOT, ease_out_back};
pub use orient::{normalize_or_up, rotation_from_up};
pub use ray::Ray;
