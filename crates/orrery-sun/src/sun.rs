//! The two-layer voxel sun: placement, group rotation, breathing and the
//! click-driven radial push.

use std::time::Duration;

use glam::{EulerRot, Mat4, Quat};
use orrery_math::{Color, Ray, damp};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::layer::{Breathing, LayerKind, VoxelLayer};
use crate::options::{InteractionMode, LayerOptions, SunOptions};
use crate::palette::LayerStyle;
use crate::placement::{PlacementParams, place_columns};
use crate::pulse::PulseTimers;
use crate::sampler::sample_sphere;

/// Amplitude of the group's X wobble.
const WOBBLE_AMP: f32 = 0.1;
/// Angular frequency of the group's X wobble.
const WOBBLE_FREQ: f32 = 0.2;

/// Radial offset of one layer, damped toward its target.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RadialOffset {
    pub current: f32,
    pub target: f32,
}

impl RadialOffset {
    fn stepped(self, lambda: f32, dt: f32) -> Self {
        Self {
            current: damp(self.current, self.target, lambda, dt),
            target: self.target,
        }
    }
}

/// Time-varying state of the sun, advanced by [`SunMotion::step`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SunMotion {
    pub core: RadialOffset,
    pub shell: RadialOffset,
    pub expanded: bool,
    /// Shared oscillator time in seconds.
    pub time: f32,
}

impl SunMotion {
    /// Damp both offsets over `dt` and adopt the continuous clock value `t`.
    pub fn step(self, dt: f32, t: f32, lambda: f32) -> Self {
        Self {
            core: self.core.stepped(lambda, dt),
            shell: self.shell.stepped(lambda, dt),
            expanded: self.expanded,
            time: t,
        }
    }

    fn with_targets(self, expanded: bool, core: f32, shell: f32) -> Self {
        Self {
            core: RadialOffset { target: core, ..self.core },
            shell: RadialOffset { target: shell, ..self.shell },
            expanded,
            time: self.time,
        }
    }

    pub fn offset(&self, kind: LayerKind) -> RadialOffset {
        match kind {
            LayerKind::Core => self.core,
            LayerKind::Shell => self.shell,
        }
    }
}

/// Shading parameters that stay constant for a layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerShading {
    pub material_emissive: Color,
    pub flicker_speed: f32,
    /// Zero when flicker is disabled.
    pub flicker_amp: f32,
}

impl LayerShading {
    fn new(options: &LayerOptions, style: &LayerStyle) -> Self {
        Self {
            material_emissive: style.material_emissive,
            flicker_speed: options.flicker_speed,
            flicker_amp: if options.flicker { options.flicker_amp } else { 0.0 },
        }
    }
}

/// A column hit by a pointer ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SunHit {
    pub layer: LayerKind,
    pub index: usize,
    pub distance: f32,
}

pub struct VoxelSun {
    options: SunOptions,
    seed: u64,
    core: VoxelLayer,
    shell: VoxelLayer,
    core_shading: LayerShading,
    shell_shading: LayerShading,
    motion: SunMotion,
    timers: PulseTimers,
}

impl VoxelSun {
    /// Place both layers. The shell lattice is shifted by `phi_stagger`.
    pub fn new(options: SunOptions) -> Self {
        let seed = options.seed.unwrap_or_else(rand::random);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let samples = sample_sphere(options.columns_phi, options.columns_theta);

        let core_style = LayerStyle::from_options(&options.core);
        let shell_style = LayerStyle::from_options(&options.shell);

        let core_columns = place_columns(
            &samples,
            &PlacementParams {
                layer: &options.core,
                style: &core_style,
                gap_safety: options.gap_safety,
                phi_shift: 0.0,
                ripple: &options.ripple,
            },
            &mut rng,
        );
        let shell_columns = place_columns(
            &samples,
            &PlacementParams {
                layer: &options.shell,
                style: &shell_style,
                gap_safety: options.gap_safety,
                phi_shift: options.phi_stagger,
                ripple: &options.ripple,
            },
            &mut rng,
        );

        info!(
            "Voxel sun placed: seed {seed}, {} core + {} shell columns",
            core_columns.len(),
            shell_columns.len()
        );

        Self {
            core: VoxelLayer::new(
                LayerKind::Core,
                core_columns,
                Breathing::for_layer(LayerKind::Core, &options.core),
            ),
            shell: VoxelLayer::new(
                LayerKind::Shell,
                shell_columns,
                Breathing::for_layer(LayerKind::Shell, &options.shell),
            ),
            core_shading: LayerShading::new(&options.core, &core_style),
            shell_shading: LayerShading::new(&options.shell, &shell_style),
            options,
            seed,
            motion: SunMotion::default(),
            timers: PulseTimers::new(),
        }
    }

    pub fn options(&self) -> &SunOptions {
        &self.options
    }

    /// Seed the placement was drawn from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn motion(&self) -> SunMotion {
        self.motion
    }

    pub fn layer(&self, kind: LayerKind) -> &VoxelLayer {
        match kind {
            LayerKind::Core => &self.core,
            LayerKind::Shell => &self.shell,
        }
    }

    pub fn shading(&self, kind: LayerKind) -> LayerShading {
        match kind {
            LayerKind::Core => self.core_shading,
            LayerKind::Shell => self.shell_shading,
        }
    }

    pub fn pending_pulses(&self) -> usize {
        self.timers.pending()
    }

    /// Handle a pointer click on either layer at clock time `at`.
    pub fn click(&mut self, at: Duration) {
        let (core_push, shell_push) = (self.options.core_push, self.options.shell_push);
        match self.options.interaction {
            InteractionMode::Pulse => {
                self.motion = self.motion.with_targets(true, core_push, shell_push);
                self.timers
                    .schedule(at, Duration::from_millis(self.options.pulse_ms));
                debug!(pending = self.timers.pending(), "Sun pulse");
            }
            InteractionMode::Toggle => {
                let expanded = !self.motion.expanded;
                self.motion = if expanded {
                    self.motion.with_targets(true, core_push, shell_push)
                } else {
                    self.motion.with_targets(false, 0.0, 0.0)
                };
                debug!(expanded, "Sun toggle");
            }
        }
    }

    /// Advance by `dt` seconds with the continuous clock at `elapsed`.
    pub fn update(&mut self, dt: f32, elapsed: Duration) {
        if self.timers.fire_due(elapsed) > 0 {
            self.motion = self.motion.with_targets(false, 0.0, 0.0);
        }
        let t = elapsed.as_secs_f32();
        self.motion = self.motion.step(dt, t, self.options.offset_damping);
        self.core.apply(self.motion.core.current, t);
        self.shell.apply(self.motion.shell.current, t);
    }

    /// Whole-sun rotation: yaw at `spin_rate` plus a slow X wobble.
    pub fn group_rotation(&self) -> Quat {
        let t = self.motion.time;
        Quat::from_euler(
            EulerRot::XYZ,
            (t * WOBBLE_FREQ).sin() * WOBBLE_AMP,
            t * self.options.spin_rate,
            0.0,
        )
    }

    /// Rotation of a layer relative to the group.
    pub fn local_rotation(&self, kind: LayerKind) -> Quat {
        match kind {
            LayerKind::Core => Quat::IDENTITY,
            LayerKind::Shell => Quat::from_rotation_y(-self.motion.time * self.options.counter_rotate),
        }
    }

    /// Layer-to-world rotation.
    pub fn layer_rotation(&self, kind: LayerKind) -> Quat {
        self.group_rotation() * self.local_rotation(kind)
    }

    pub fn layer_transform(&self, kind: LayerKind) -> Mat4 {
        Mat4::from_quat(self.layer_rotation(kind))
    }

    /// Nearest column hit across both layers for a world-space ray.
    pub fn raycast(&self, ray: &Ray) -> Option<SunHit> {
        LayerKind::ALL
            .into_iter()
            .filter_map(|kind| {
                let inv = self.layer_rotation(kind).inverse();
                let local = Ray::new(inv * ray.origin, inv * ray.direction);
                self.layer(kind)
                    .raycast(&local)
                    .map(|hit| SunHit {
                        layer: kind,
                        index: hit.index,
                        distance: hit.distance,
                    })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}
