//! Scene composition for the orrery: section selection, the modal host,
//! pointer picking and the per-frame step that drives the sun and planets.

pub mod overlay;
pub mod pointer;
pub mod scene;
pub mod selection;

pub use overlay::{ClickOutcome, ModalHost, Rect, modal_rect};
pub use pointer::{PickHit, PickTarget, pick, pick_planet};
pub use scene::{PlanetLineup, Scene, SceneOptions};
pub use selection::{Section, SelectionStore};
