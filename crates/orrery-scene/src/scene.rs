//! Scene composition: the voxel sun, one planet per section and the selection.

use std::time::Duration;

use glam::Vec3;
use orrery_math::Ray;
use orrery_planet::{FrameInput, Planet, PlanetOptions, Variant};
use orrery_sun::{SunOptions, VoxelSun};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::pointer::{PickHit, PickTarget, pick};
use crate::selection::{Section, SelectionStore};

/// Offset applied to the sun seed for the planet phase stream.
const PHASE_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

/// Scene-level settings: camera and focus point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneOptions {
    /// Where a focused planet settles, in world space.
    pub focus_point: [f32; 3],
    pub camera_position: [f32; 3],
    /// Pivot of the drag orbit.
    pub camera_target: [f32; 3],
    /// Vertical field of view in degrees.
    pub camera_fov_deg: f32,
    /// Share of the remaining orbit velocity applied per 60 Hz frame.
    pub camera_damping: f32,
    /// Drag sensitivity; 1 turns the camera a full circle per viewport height.
    pub camera_rotate_speed: f32,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            focus_point: [-6.0, -4.0, 20.0],
            camera_position: [-15.5, -11.0, 50.0],
            camera_target: [0.0, 0.0, 0.0],
            camera_fov_deg: 50.0,
            camera_damping: 0.05,
            camera_rotate_speed: 1.0,
        }
    }
}

/// One planet per section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlanetLineup {
    pub profile: PlanetOptions,
    pub tech: PlanetOptions,
    pub experience: PlanetOptions,
}

impl Default for PlanetLineup {
    fn default() -> Self {
        // Per-frame increments of 0.001 / 0.0008 / 0.0006 rad at 60 fps.
        Self {
            profile: PlanetOptions {
                color: "#44ff99".to_string(),
                orbit_radius: 4.0,
                orbit_angular_speed: 0.06,
                size: 0.4,
                variant: Variant::Metal,
                ring: true,
                ..PlanetOptions::default()
            },
            tech: PlanetOptions {
                color: "#55aaff".to_string(),
                orbit_radius: 6.0,
                orbit_angular_speed: 0.048,
                size: 0.75,
                variant: Variant::Grid,
                ring: true,
                ..PlanetOptions::default()
            },
            experience: PlanetOptions {
                color: "#cccccc".to_string(),
                orbit_radius: 8.0,
                orbit_angular_speed: 0.036,
                size: 0.5,
                variant: Variant::Holo,
                ring: false,
                ..PlanetOptions::default()
            },
        }
    }
}

impl PlanetLineup {
    pub fn get(&self, section: Section) -> &PlanetOptions {
        match section {
            Section::Profile => &self.profile,
            Section::Tech => &self.tech,
            Section::Experience => &self.experience,
        }
    }
}

pub struct Scene {
    options: SceneOptions,
    sun: VoxelSun,
    planets: [Planet; 3],
    selection: SelectionStore,
}

impl Scene {
    pub fn new(sun: SunOptions, lineup: &PlanetLineup, options: SceneOptions) -> Self {
        let sun = VoxelSun::new(sun);
        let mut rng = ChaCha8Rng::seed_from_u64(sun.seed() ^ PHASE_STREAM);
        let planets = Section::ALL.map(|section| {
            let fallback = rng.random_range(0.0..std::f32::consts::TAU);
            Planet::new(lineup.get(section).clone(), fallback)
        });
        info!(seed = sun.seed(), "scene composed");
        Self {
            options,
            sun,
            planets,
            selection: SelectionStore::new(),
        }
    }

    pub fn options(&self) -> &SceneOptions {
        &self.options
    }

    pub fn sun(&self) -> &VoxelSun {
        &self.sun
    }

    pub fn planet(&self, section: Section) -> &Planet {
        &self.planets[section.index()]
    }

    pub fn planets(&self) -> impl Iterator<Item = (Section, &Planet)> {
        Section::ALL.into_iter().zip(self.planets.iter())
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionStore {
        &mut self.selection
    }

    pub fn focus_point(&self) -> Vec3 {
        Vec3::from_array(self.options.focus_point)
    }

    /// Advance one frame. `elapsed` is the continuous scene clock.
    pub fn update(&mut self, dt: f32, elapsed: Duration) {
        self.sun.update(dt, elapsed);
        let selected = self.selection.get();
        let focus_point = self.focus_point();
        for (section, planet) in Section::ALL.into_iter().zip(self.planets.iter_mut()) {
            planet.update(FrameInput {
                dt,
                focused: selected == Some(section),
                focus_point,
            });
        }
    }

    pub fn pick(&self, ray: &Ray) -> Option<PickHit> {
        pick(ray, &self.sun, self.planets())
    }

    /// Dispatch a pointer press to the nearest object under `ray`. A miss
    /// leaves the selection alone; the modal backdrop owns dismissal.
    pub fn click(&mut self, ray: &Ray, at: Duration) -> Option<PickTarget> {
        let hit = self.pick(ray);
        match hit.map(|h| h.target) {
            Some(PickTarget::SunColumn { layer, index }) => {
                debug!(layer = layer.label(), index, "sun clicked");
                self.sun.click(at);
            }
            Some(PickTarget::Planet(section)) => {
                debug!(section = section.label(), "planet clicked");
                self.selection.open(section);
            }
            None => {}
        }
        hit.map(|h| h.target)
    }
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
