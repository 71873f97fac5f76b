//! Statically authored WGSL for the instanced voxel layers.
//!
//! Every per-instance attribute (emissive tint, flicker phase, ripple
//! amplitude and phase) and every layer uniform (flicker, ripple, rim) is
//! declared up front; both layers share the program and differ only in
//! their uniform values.

use bytemuck::{Pod, Zeroable};

/// Name the program is registered under in the shader library.
pub const VOXEL_SHADER_NAME: &str = "orrery-voxel";
/// Vertex entry point.
pub const VOXEL_VS_ENTRY: &str = "vs_voxel";
/// Fragment entry point.
pub const VOXEL_FS_ENTRY: &str = "fs_voxel";

/// Camera uniform (group 0).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct VoxelCameraUniform {
    pub view_proj: [[f32; 4]; 4],
    /// World-space eye position; `w` unused.
    pub camera_pos: [f32; 4],
}

/// Per-layer uniform (group 1).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LayerUniforms {
    /// Layer-to-world transform.
    pub model: [[f32; 4]; 4],
    /// Material emissive colour; `w` unused.
    pub material_emissive: [f32; 4],
    /// `(speed, amp, time, _)`.
    pub flicker: [f32; 4],
    /// `(frequency, speed, time, _)`.
    pub surface: [f32; 4],
    /// `(fresnel_pow, rim_strength, _, _)`.
    pub rim: [f32; 4],
    /// Direction toward the light in `xyz`, ambient term in `w`.
    pub light: [f32; 4],
}

pub const VOXEL_SHADER_SOURCE: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
};

struct LayerUniforms {
    model: mat4x4<f32>,
    material_emissive: vec4<f32>,
    flicker: vec4<f32>,
    surface: vec4<f32>,
    rim: vec4<f32>,
    light: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

@group(1) @binding(0)
var<uniform> layer: LayerUniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
    @location(7) color: vec4<f32>,
    // xyz tint, w flicker phase
    @location(8) emissive: vec4<f32>,
    // x amplitude, y phase
    @location(9) surface: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) color: vec3<f32>,
    @location(3) emissive: vec3<f32>,
    @location(4) flicker_phase: f32,
};

@vertex
fn vs_voxel(vertex: VertexInput, inst: InstanceInput) -> VertexOutput {
    let instance_model = mat4x4<f32>(inst.model_0, inst.model_1, inst.model_2, inst.model_3);
    let model = layer.model * instance_model;

    // Continuous ripple along the surface normal, keyed on the column's local height.
    let ripple = inst.surface.x * sin(
        layer.surface.x * vertex.position.y + layer.surface.y * layer.surface.z + inst.surface.y
    );
    let displaced = vertex.position + vertex.normal * ripple;

    let world = model * vec4<f32>(displaced, 1.0);

    var out: VertexOutput;
    out.clip_position = camera.view_proj * world;
    out.world_pos = world.xyz;
    out.world_normal = normalize((model * vec4<f32>(vertex.normal, 0.0)).xyz);
    out.color = inst.color.rgb;
    out.emissive = inst.emissive.rgb;
    out.flicker_phase = inst.emissive.w;
    return out;
}

@fragment
fn fs_voxel(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = normalize(in.world_normal);
    let light_dir = normalize(layer.light.xyz);
    let diffuse = max(dot(n, light_dir), 0.0);
    let lit = in.color * (layer.light.w + (1.0 - layer.light.w) * diffuse);

    let flicker = 1.0 + layer.flicker.y * sin(layer.flicker.x * layer.flicker.z + in.flicker_phase);
    var emissive = layer.material_emissive.rgb * in.emissive * flicker;

    if (layer.rim.x > 0.0) {
        let view_dir = normalize(camera.camera_pos.xyz - in.world_pos);
        let facing = clamp(dot(n, view_dir), 0.0, 1.0);
        emissive += in.emissive * pow(1.0 - facing, layer.rim.x) * layer.rim.y;
    }

    return vec4<f32>(lit + emissive, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sizes_are_gpu_aligned() {
        assert_eq!(std::mem::size_of::<VoxelCameraUniform>(), 80);
        assert_eq!(std::mem::size_of::<LayerUniforms>(), 144);
        assert_eq!(std::mem::size_of::<LayerUniforms>() % 16, 0);
    }

    #[test]
    fn test_source_declares_entry_points_and_attributes() {
        assert!(VOXEL_SHADER_SOURCE.contains(&format!("fn {VOXEL_VS_ENTRY}(")));
        assert!(VOXEL_SHADER_SOURCE.contains(&format!("fn {VOXEL_FS_ENTRY}(")));
        for location in [0, 1, 3, 4, 5, 6, 7, 8, 9] {
            assert!(
                VOXEL_SHADER_SOURCE.contains(&format!("@location({location})")),
                "missing vertex location {location}"
            );
        }
    }
}
