//! Planet animation: orbit, focus blend and the sphere-to-card morph.
//!
//! [`PlanetState::step`] is a pure function of the previous state, the
//! resolved [`PlanetParams`] and the frame input, so every transition can be
//! driven deterministically without a GPU.

use glam::{Quat, Vec3};
use orrery_math::{Color, damp, damp_quat, damp_vec3, ease_out_back};
use tracing::warn;

use crate::options::{PlanetOptions, euler_xyz, euler_xyz_scaled};

/// Focus blend approach rate.
pub const FOCUS_RATE: f32 = 4.0;
/// Approach rate of the planet toward the focus point.
pub const POSITION_RATE: f32 = 5.0;
/// Approach rate of the card orientation.
pub const ORIENTATION_RATE: f32 = 6.0;
/// Sphere self-rotation about Y (rad/s).
pub const SELF_ROTATION_SPEED: f32 = 0.2;
/// Card edge length before focusing, relative to the planet size.
pub const CARD_BASELINE: f32 = 0.5;

/// Options resolved into the quantities the step function consumes.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanetParams {
    pub color: Color,
    pub orbit_radius: f32,
    pub orbit_angular_speed: f32,
    pub orbit_plane: Quat,
    pub size: f32,
    pub card_baseline: Vec3,
    pub card_size: Vec3,
    pub card_target: Quat,
    pub appear_spin: [f32; 3],
    pub appear_overshoot: f32,
}

impl PlanetParams {
    pub fn from_options(options: &PlanetOptions) -> Self {
        let color = Color::from_hex(&options.color).unwrap_or_else(|| {
            warn!("Invalid planet colour '{}', using white", options.color);
            Color::WHITE
        });
        let size = options.size.max(0.0);
        Self {
            color,
            orbit_radius: options.orbit_radius,
            orbit_angular_speed: options.orbit_angular_speed,
            orbit_plane: euler_xyz(options.orbit_plane_rotation),
            size,
            card_baseline: Vec3::splat(size * CARD_BASELINE),
            card_size: Vec3::from_array(options.card_size),
            card_target: euler_xyz(options.card_rotation),
            appear_spin: options.appear_spin,
            appear_overshoot: options.appear_overshoot,
        }
    }

    /// Point on the orbit at `angle`.
    pub fn orbit_position(&self, angle: f32) -> Vec3 {
        self.orbit_plane
            * Vec3::new(
                self.orbit_radius * angle.cos(),
                self.orbit_radius * angle.sin(),
                0.0,
            )
    }

    /// Card extents at `blend` before the pop is applied.
    pub fn card_shape(&self, blend: f32) -> Vec3 {
        self.card_baseline.lerp(self.card_size, blend)
    }

    /// Target card orientation at `blend`: the scaled target composed with
    /// the decaying entrance spin.
    pub fn card_orientation_target(&self, blend: f32) -> Quat {
        let scaled_target = Quat::IDENTITY.slerp(self.card_target, blend);
        let spin = euler_xyz_scaled(self.appear_spin, 1.0 - ease_out_back(blend));
        (scaled_target * spin).normalize()
    }

    /// `1 + overshoot·sin(ease_out_back(blend)·π)`.
    ///
    /// The eased blend reaches 0.5 early, so the swell peaks near
    /// blend 0.13. Once the eased value passes 1 (blend ≈ 0.37) the sine goes
    /// negative and the card dips a few percent under its shape before
    /// settling at blend 1.
    pub fn pop(&self, blend: f32) -> f32 {
        1.0 + self.appear_overshoot * (ease_out_back(blend) * std::f32::consts::PI).sin()
    }
}

/// Inputs of one animation frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameInput {
    /// Seconds since the previous frame.
    pub dt: f32,
    /// Whether this planet is the current selection.
    pub focused: bool,
    pub focus_point: Vec3,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlanetState {
    pub orbit_angle: f32,
    /// `0` orbiting as a sphere, `1` fully presented as a card.
    pub focus_blend: f32,
    pub position: Vec3,
    /// Self-rotation angle about Y.
    pub spin_angle: f32,
    pub card_orientation: Quat,
    pub card_scale: Vec3,
}

impl PlanetState {
    /// Resting state on the orbit at `phase`.
    pub fn initial(params: &PlanetParams, phase: f32) -> Self {
        Self {
            orbit_angle: phase,
            focus_blend: 0.0,
            position: params.orbit_position(phase),
            spin_angle: 0.0,
            card_orientation: params.card_orientation_target(0.0),
            card_scale: params.card_shape(0.0) * params.pop(0.0),
        }
    }

    /// Advance one frame.
    pub fn step(&self, params: &PlanetParams, input: FrameInput) -> Self {
        let dt = if input.dt.is_finite() { input.dt.max(0.0) } else { 0.0 };
        let target_blend = if input.focused { 1.0 } else { 0.0 };
        let focus_blend = damp(self.focus_blend, target_blend, FOCUS_RATE, dt).clamp(0.0, 1.0);

        let (orbit_angle, position) = if input.focused {
            (
                self.orbit_angle,
                damp_vec3(self.position, input.focus_point, POSITION_RATE, dt),
            )
        } else {
            let angle = self.orbit_angle + params.orbit_angular_speed * dt;
            // Glide back from wherever focusing left the planet.
            let orbit = params.orbit_position(angle);
            (angle, orbit.lerp(self.position, focus_blend))
        };

        let card_orientation = damp_quat(
            self.card_orientation,
            params.card_orientation_target(focus_blend),
            ORIENTATION_RATE,
            dt,
        );
        let card_scale = params.card_shape(focus_blend) * params.pop(focus_blend);

        Self {
            orbit_angle,
            focus_blend,
            position,
            spin_angle: (self.spin_angle + SELF_ROTATION_SPEED * dt) % std::f32::consts::TAU,
            card_orientation,
            card_scale,
        }
    }

    pub fn sphere_opacity(&self) -> f32 {
        1.0 - self.focus_blend
    }

    pub fn card_opacity(&self) -> f32 {
        self.focus_blend
    }

    pub fn sphere_rotation(&self) -> Quat {
        Quat::from_rotation_y(self.spin_angle)
    }
}

/// One planet: its options, resolved parameters and animation state.
pub struct Planet {
    options: PlanetOptions,
    params: PlanetParams,
    state: PlanetState,
}

impl Planet {
    /// `fallback_phase` is used when the options carry no phase offset.
    pub fn new(options: PlanetOptions, fallback_phase: f32) -> Self {
        let params = PlanetParams::from_options(&options);
        let phase = options.phase_offset.unwrap_or(fallback_phase);
        let state = PlanetState::initial(&params, phase);
        Self {
            options,
            params,
            state,
        }
    }

    pub fn options(&self) -> &PlanetOptions {
        &self.options
    }

    pub fn params(&self) -> &PlanetParams {
        &self.params
    }

    pub fn state(&self) -> &PlanetState {
        &self.state
    }

    pub fn update(&mut self, input: FrameInput) {
        self.state = self.state.step(&self.params, input);
    }
}
