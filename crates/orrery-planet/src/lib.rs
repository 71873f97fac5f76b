//! Orbiting planets: orbit integration, focus blending, the sphere-to-card
//! morph, and their wgpu renderer.

pub mod controller;
pub mod options;
pub mod renderer;
pub mod shader;

pub use controller::{
    CARD_BASELINE, FOCUS_RATE, FrameInput, ORIENTATION_RATE, POSITION_RATE, Planet, PlanetParams,
    PlanetState, SELF_ROTATION_SPEED,
};
pub use options::{PlanetOptions, Variant, euler_xyz};
pub use renderer::{DrawPass, MeshKind, PlanetRenderer, SurfaceDraw, planet_surfaces};
pub use shader::{
    PLANET_FS_ENTRY, PLANET_SHADER_NAME, PLANET_SHADER_SOURCE, PLANET_VS_ENTRY,
    PlanetCameraUniform, SURFACE_CARD, SURFACE_RING, SurfaceUniforms,
};
