//! Pointer picking against the sun's columns and the planets.

use orrery_math::Ray;
use orrery_planet::Planet;
use orrery_sun::{LayerKind, VoxelSun};

use crate::selection::Section;

/// Surfaces fainter than this do not take clicks.
const PICKABLE_OPACITY: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickTarget {
    SunColumn { layer: LayerKind, index: usize },
    Planet(Section),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub target: PickTarget,
    pub distance: f32,
}

/// Distance to the planet's visible sphere or card, whichever is nearer.
pub fn pick_planet(ray: &Ray, planet: &Planet) -> Option<f32> {
    let state = planet.state();
    let sphere = (state.sphere_opacity() > PICKABLE_OPACITY)
        .then(|| ray.intersect_sphere(state.position, planet.params().size))
        .flatten();
    let card = (state.card_opacity() > PICKABLE_OPACITY)
        .then(|| ray.intersect_box(state.position, state.card_orientation, state.card_scale))
        .flatten();
    match (sphere, card) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Nearest object under the ray. Only the nearest receives the click.
pub fn pick<'p>(
    ray: &Ray,
    sun: &VoxelSun,
    planets: impl IntoIterator<Item = (Section, &'p Planet)>,
) -> Option<PickHit> {
    let sun_hit = sun.raycast(ray).map(|hit| PickHit {
        target: PickTarget::SunColumn {
            layer: hit.layer,
            index: hit.index,
        },
        distance: hit.distance,
    });
    planets
        .into_iter()
        .filter_map(|(section, planet)| {
            pick_planet(ray, planet).map(|distance| PickHit {
                target: PickTarget::Planet(section),
                distance,
            })
        })
        .chain(sun_hit)
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}
