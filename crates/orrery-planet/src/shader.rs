//! Statically authored WGSL for planet spheres, rings and cards.
//!
//! One program covers every surface; `params.x` selects the look.

use bytemuck::{Pod, Zeroable};

pub const PLANET_SHADER_NAME: &str = "orrery-planet";
pub const PLANET_VS_ENTRY: &str = "vs_planet";
pub const PLANET_FS_ENTRY: &str = "fs_planet";

/// Surface selector beyond the sphere variants.
pub const SURFACE_RING: u32 = 9;
pub const SURFACE_CARD: u32 = 10;
/// White outline drawn over the lowpoly sphere.
pub const SURFACE_EDGES: u32 = 11;

/// Longitude and latitude cells of the wireframe grid; matches the sphere mesh.
pub const WIRE_DIVISIONS: u32 = 32;

/// Camera uniform (group 0).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct PlanetCameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
}

/// Per-surface uniform (group 1).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SurfaceUniforms {
    pub model: [[f32; 4]; 4],
    /// Base colour in `rgb`, opacity in `a`.
    pub color: [f32; 4],
    /// `(surface kind, time, a, b)`: morph amplitude and frequency, or
    /// wobble distortion and speed.
    pub params: [f32; 4],
}

pub const PLANET_SHADER_SOURCE: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
};

struct SurfaceUniforms {
    model: mat4x4<f32>,
    color: vec4<f32>,
    params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

@group(1) @binding(0)
var<uniform> surface: SurfaceUniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

const AMBIENT: f32 = 0.25;
const HOLO_TINT: vec3<f32> = vec3<f32>(0.255, 0.878, 1.0);
const WIRE_DIVISIONS: f32 = 32.0;

fn surface_kind() -> u32 {
    return u32(surface.params.x + 0.5);
}

fn hash3(p: vec3<f32>) -> f32 {
    return fract(sin(dot(p, vec3<f32>(127.1, 311.7, 74.7))) * 43758.5453123);
}

fn noise3(p: vec3<f32>) -> f32 {
    let i = floor(p);
    let f = fract(p);
    let u = f * f * (3.0 - 2.0 * f);
    return mix(
        mix(
            mix(hash3(i + vec3<f32>(0.0, 0.0, 0.0)), hash3(i + vec3<f32>(1.0, 0.0, 0.0)), u.x),
            mix(hash3(i + vec3<f32>(0.0, 1.0, 0.0)), hash3(i + vec3<f32>(1.0, 1.0, 0.0)), u.x),
            u.y
        ),
        mix(
            mix(hash3(i + vec3<f32>(0.0, 0.0, 1.0)), hash3(i + vec3<f32>(1.0, 0.0, 1.0)), u.x),
            mix(hash3(i + vec3<f32>(0.0, 1.0, 1.0)), hash3(i + vec3<f32>(1.0, 1.0, 1.0)), u.x),
            u.y
        ),
        u.z
    );
}

@vertex
fn vs_planet(in: VertexInput) -> VertexOutput {
    var position = in.position;
    let kind = surface_kind();
    if (kind == 6u) {
        // Breathing noise displacement along the normal.
        let n = noise3(in.normal * surface.params.w + vec3<f32>(surface.params.y * 0.8));
        position = position + normalize(in.normal) * (n - 0.5) * 2.0 * surface.params.z;
    } else if (kind == 7u) {
        // Radial distortion scaled by distort².
        let drift = vec3<f32>(surface.params.y * surface.params.w * 0.1);
        let n = noise3(in.position * 1.5 + drift) * 2.0 - 1.0;
        position = position * (1.0 + n * surface.params.z * surface.params.z);
    }
    let world = surface.model * vec4<f32>(position, 1.0);

    var out: VertexOutput;
    out.clip_position = camera.view_proj * world;
    out.world_pos = world.xyz;
    out.world_normal = normalize((surface.model * vec4<f32>(in.normal, 0.0)).xyz);
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_planet(in: VertexOutput, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    let kind = surface_kind();
    let time = surface.params.y;
    let base = surface.color.rgb;
    let opacity = surface.color.a;

    var n = normalize(in.world_normal);
    if (!front) {
        n = -n;
    }
    // The sun sits at the origin.
    let to_light = normalize(-in.world_pos);
    let view_dir = normalize(camera.camera_pos.xyz - in.world_pos);
    let diffuse = max(dot(n, to_light), 0.0);
    let rim = pow(1.0 - max(dot(n, view_dir), 0.0), 2.0);

    // Wire cells: u along longitude, v down from the north pole.
    let cell = vec2<f32>(in.uv.x, 1.0 - in.uv.y) * WIRE_DIVISIONS;
    let cell_width = max(fwidth(cell), vec2<f32>(1e-4));

    var color = base * (AMBIENT + (1.0 - AMBIENT) * diffuse);
    var alpha = opacity;

    switch kind {
        case 1u: {
            let half_dir = normalize(to_light + view_dir);
            let specular = pow(max(dot(n, half_dir), 0.0), 64.0);
            color = base * (0.1 + 0.4 * diffuse) + vec3<f32>(specular) + base * rim * 0.6;
        }
        case 2u: {
            var uv = in.uv * 6.0;
            uv.x = uv.x + sin(time * 0.8 + uv.y * 2.5) * 0.1;
            uv.y = uv.y + cos(time * 0.6 + uv.x * 2.0) * 0.1;
            let line = step(0.95, fract(uv.x)) + step(0.95, fract(uv.y));
            let glow = smoothstep(0.0, 0.2, line);
            color = mix(base * 0.25, vec3<f32>(1.0), glow);
        }
        case 3u: {
            let lines = step(0.8, fract(in.world_pos.y * 5.0 + time * 4.0));
            let grain = noise3(vec3<f32>(in.world_pos.xy * 0.5 + vec2<f32>(time * 0.5), 0.0));
            color = HOLO_TINT * (0.4 + 0.6 * rim) + vec3<f32>(lines) * 0.35 + vec3<f32>(grain * 0.15);
            alpha = opacity * 0.65 * (0.6 + 0.4 * rim);
        }
        case 4u: {
            let band = floor(diffuse * 3.0) / 3.0;
            color = mix(vec3<f32>(0.04), base, min(band * 1.5 + 0.2, 1.0));
            if (band > 0.9) {
                color = mix(color, vec3<f32>(1.0), 0.5);
            }
        }
        case 5u: {
            let flat_n = normalize(cross(dpdx(in.world_pos), dpdy(in.world_pos)));
            let flat_diffuse = abs(dot(flat_n, to_light));
            color = base * (AMBIENT + (1.0 - AMBIENT) * flat_diffuse);
        }
        case 6u: {
            color = base * (0.6 + 0.4 * rim);
        }
        case 7u: {
            let half_dir = normalize(to_light + view_dir);
            let specular = pow(max(dot(n, half_dir), 0.0), 24.0);
            color = color + vec3<f32>(specular * 0.25);
        }
        case 8u: {
            // Grid lines plus the quad diagonal the mesh is split along.
            let f = fract(cell);
            let to_u = min(f.x, 1.0 - f.x) / cell_width.x;
            let to_v = min(f.y, 1.0 - f.y) / cell_width.y;
            let to_diagonal = abs(f.x - f.y) / length(cell_width);
            let line = 1.0 - smoothstep(0.5, 1.5, min(min(to_u, to_v), to_diagonal));
            if (line < 0.01) {
                discard;
            }
            color = base;
            alpha = opacity * line;
        }
        case 10u: {
            color = base * (0.55 + 0.45 * diffuse) + vec3<f32>(rim * 0.25);
        }
        case 11u: {
            color = vec3<f32>(1.0);
        }
        default: {}
    }

    return vec4<f32>(color, alpha);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sizes_are_gpu_aligned() {
        assert_eq!(std::mem::size_of::<PlanetCameraUniform>(), 80);
        assert_eq!(std::mem::size_of::<SurfaceUniforms>(), 96);
    }

    #[test]
    fn test_source_handles_every_surface_kind() {
        assert!(PLANET_SHADER_SOURCE.contains(&format!("fn {PLANET_VS_ENTRY}(")));
        assert!(PLANET_SHADER_SOURCE.contains(&format!("fn {PLANET_FS_ENTRY}(")));
        for kind in [1, 2, 3, 4, 5, 6, 7, 8, SURFACE_CARD, SURFACE_EDGES] {
            assert!(
                PLANET_SHADER_SOURCE.contains(&format!("case {kind}u")),
                "missing surface kind {kind}"
            );
        }
    }

    #[test]
    fn test_wire_grid_matches_constant() {
        assert!(PLANET_SHADER_SOURCE.contains(&format!(
            "const WIRE_DIVISIONS: f32 = {WIRE_DIVISIONS}.0;"
        )));
    }
}
