//! Procedural two-layer voxel sun: sphere lattice, column placement with
//! weighted palettes, instanced layers, the click-driven radial pulse and the
//! instanced renderer.

pub mod layer;
pub mod options;
pub mod palette;
pub mod placement;
pub mod pulse;
pub mod renderer;
pub mod sampler;
pub mod shader;
pub mod sun;

pub use layer::{Breathing, ColumnHit, ColumnInstanceRaw, LayerKind, VoxelLayer};
pub use options::{
    ColorRatio, DEFAULT_COLUMN_COLOR, EmissiveRatio, InteractionMode, LayerOptions, SunOptions,
    SurfaceRipple,
};
pub use palette::{EmissiveSource, LayerStyle, WeightedPalette};
pub use placement::{ColumnInstance, ColumnTransform, PlacementParams, place_columns};
pub use pulse::PulseTimers;
pub use renderer::{VoxelLighting, VoxelSunRenderer, layer_uniforms};
pub use sampler::{DirectionSample, sample_count, sample_sphere};
pub use shader::{
    LayerUniforms, VOXEL_FS_ENTRY, VOXEL_SHADER_NAME, VOXEL_SHADER_SOURCE, VOXEL_VS_ENTRY,
    VoxelCameraUniform,
};
pub use sun::{LayerShading, RadialOffset, SunHit, SunMotion, VoxelSun};
