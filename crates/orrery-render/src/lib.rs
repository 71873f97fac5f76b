//! wgpu bootstrap for the orrery: device and surface, reverse-Z depth, the
//! scene camera and its orbit controls, shared meshes, the shader library,
//! the star backdrop, bloom and the render passes.

pub mod bloom;
pub mod camera;
pub mod depth;
pub mod gpu;
pub mod mesh;
pub mod orbit;
pub mod pass;
pub mod shader;
pub mod starfield;

pub use bloom::{
    BLOOM_SHADER_NAME, BLOOM_SHADER_SOURCE, BloomPipeline, BloomSettings, HDR_FORMAT,
};
pub use camera::Camera;
pub use depth::DepthBuffer;
pub use gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
pub use mesh::{MeshData, MeshVertex, annulus, feature_edges, icosphere, unit_cube, uv_sphere};
pub use orbit::OrbitControls;
pub use pass::{SPACE_BLACK, begin_overlay_pass, begin_scene_pass};
pub use shader::{ShaderError, ShaderLibrary};
pub use starfield::{
    STARFIELD_SHADER_NAME, STARFIELD_SHADER_SOURCE, StarfieldOptions, StarfieldRenderer,
};
