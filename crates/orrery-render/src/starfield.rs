//! Background star shell: seeded point placement and an instanced,
//! additively blended billboard renderer.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};
use orrery_math::Color;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::depth::DepthBuffer;

pub const STARFIELD_SHADER_NAME: &str = "orrery-starfield";

/// Lightness of every star colour.
const STAR_LIGHTNESS: f32 = 0.9;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StarfieldOptions {
    pub enabled: bool,
    pub count: u32,
    /// Inner radius of the shell.
    pub radius: f32,
    /// Thickness of the shell beyond `radius`.
    pub depth: f32,
    /// Size multiplier applied to every star.
    pub factor: f32,
    /// Hue saturation; `0` gives white stars.
    pub saturation: f32,
    /// Soft round falloff instead of hard squares.
    pub fade: bool,
    /// Twinkle rate.
    pub speed: f32,
}

impl Default for StarfieldOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            count: 5000,
            radius: 100.0,
            depth: 50.0,
            factor: 4.0,
            saturation: 0.0,
            fade: true,
            speed: 1.0,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct StarInstance {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 4],
}

/// Place the stars. The shell radius shrinks by a random step per star, so
/// early stars sit near `radius + depth` and late ones near `radius`.
pub fn generate_stars(options: &StarfieldOptions, seed: u64) -> Vec<StarInstance> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let count = options.count.max(1);
    let increment = options.depth / count as f32;
    let mut r = options.radius + options.depth;

    (0..options.count)
        .map(|i| {
            r -= increment * rng.random::<f32>();
            let polar = (1.0 - 2.0 * rng.random::<f32>()).clamp(-1.0, 1.0).acos();
            let azimuth = rng.random::<f32>() * std::f32::consts::TAU;
            let direction = Vec3::new(
                polar.sin() * azimuth.sin(),
                polar.cos(),
                polar.sin() * azimuth.cos(),
            );
            let hue = i as f32 / count as f32;
            let color = Color::from_hsl(hue, options.saturation, STAR_LIGHTNESS).to_array();
            StarInstance {
                position: (direction * r).to_array(),
                size: (0.5 + 0.5 * rng.random::<f32>()) * options.factor,
                color: [color[0], color[1], color[2], 1.0],
            }
        })
        .collect()
}

/// On-screen diameter in pixels of a star of `size` at view depth `distance`.
pub fn star_pixel_size(size: f32, distance: f32, time: f32) -> f32 {
    size * (30.0 / distance.max(1e-3)) * (3.0 + (time + 100.0).sin())
}

/// Opacity of a faded star at `d` from its centre, in sprite units (edge at 0.5).
pub fn star_fade(d: f32) -> f32 {
    1.0 / (1.0 + (16.0 * (d - 0.25)).exp())
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct StarUniform {
    view_proj: [[f32; 4]; 4],
    viewport: [f32; 2],
    time: f32,
    fade: f32,
}

pub const STARFIELD_SHADER_SOURCE: &str = r#"
struct Stars {
    view_proj: mat4x4<f32>,
    viewport: vec2<f32>,
    time: f32,
    fade: f32,
};

@group(0) @binding(0)
var<uniform> stars: Stars;

struct StarInput {
    @location(0) position: vec3<f32>,
    @location(1) size: f32,
    @location(2) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
    @location(1) sprite: vec2<f32>,
};

@vertex
fn vs_star(@builtin(vertex_index) idx: u32, star: StarInput) -> VertexOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-0.5, -0.5),
        vec2<f32>(0.5, -0.5),
        vec2<f32>(0.5, 0.5),
        vec2<f32>(-0.5, -0.5),
        vec2<f32>(0.5, 0.5),
        vec2<f32>(-0.5, 0.5),
    );
    let corner = corners[idx % 6u];
    let center = stars.view_proj * vec4<f32>(star.position, 1.0);
    // clip.w is the view depth under a perspective projection.
    let pixels = star.size * (30.0 / max(center.w, 1e-3)) * (3.0 + sin(stars.time + 100.0));
    let offset = corner * pixels * 2.0 / stars.viewport * center.w;

    var out: VertexOutput;
    out.clip_position = center + vec4<f32>(offset, 0.0, 0.0);
    out.color = star.color;
    out.sprite = corner;
    return out;
}

@fragment
fn fs_star(in: VertexOutput) -> @location(0) vec4<f32> {
    var opacity = 1.0;
    if (stars.fade > 0.5) {
        let d = length(in.sprite);
        opacity = 1.0 / (1.0 + exp(16.0 * (d - 0.25)));
    }
    return vec4<f32>(in.color.rgb * opacity, opacity);
}
"#;

const INSTANCE_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32, 2 => Float32x4];

pub struct StarfieldRenderer {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    instance_buffer: Option<wgpu::Buffer>,
    star_count: u32,
    fade: bool,
    speed: f32,
}

impl StarfieldRenderer {
    pub fn new(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        color_format: wgpu::TextureFormat,
    ) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("starfield-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: std::num::NonZeroU64::new(
                        std::mem::size_of::<StarUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("starfield-layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("starfield-pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_star"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<StarInstance>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &INSTANCE_ATTRIBUTES,
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(DepthBuffer::transparent_state()),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_star"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState {
                        color: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::One,
                            dst_factor: wgpu::BlendFactor::One,
                            operation: wgpu::BlendOperation::Add,
                        },
                        alpha: wgpu::BlendComponent::OVER,
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("starfield-uniforms"),
            size: std::mem::size_of::<StarUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("starfield-bg"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            pipeline,
            uniform_buffer,
            bind_group,
            instance_buffer: None,
            star_count: 0,
            fade: true,
            speed: 1.0,
        }
    }

    /// Regenerate the shell. A disabled or empty field draws nothing.
    pub fn set_stars(&mut self, device: &wgpu::Device, options: &StarfieldOptions, seed: u64) {
        use wgpu::util::DeviceExt;

        self.fade = options.fade;
        self.speed = options.speed;
        if !options.enabled || options.count == 0 {
            self.instance_buffer = None;
            self.star_count = 0;
            return;
        }
        let instances = generate_stars(options, seed);
        self.instance_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("starfield-instances"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        }));
        self.star_count = instances.len() as u32;
        log::info!("Starfield: {} stars", self.star_count);
    }

    pub fn star_count(&self) -> u32 {
        self.star_count
    }

    pub fn update(&self, queue: &wgpu::Queue, view_proj: Mat4, viewport: Vec2, time: f32) {
        let uniform = StarUniform {
            view_proj: view_proj.to_cols_array_2d(),
            viewport: viewport.max(Vec2::ONE).to_array(),
            time: time * self.speed,
            fade: if self.fade { 1.0 } else { 0.0 },
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    pub fn render<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        let Some(instances) = &self.instance_buffer else {
            return;
        };
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, instances.slice(..));
        pass.draw(0..6, 0..self.star_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stars_fill_the_shell() {
        let options = StarfieldOptions::default();
        let stars = generate_stars(&options, 11);
        assert_eq!(stars.len(), 5000);
        for star in &stars {
            let r = Vec3::from_array(star.position).length();
            assert!(r >= options.radius - 1e-3 && r <= options.radius + options.depth + 1e-3);
            assert!(star.size >= 0.5 * options.factor && star.size <= options.factor);
        }
        // Radii shrink monotonically from the outer edge.
        let radii: Vec<f32> = stars
            .iter()
            .map(|s| Vec3::from_array(s.position).length())
            .collect();
        assert!(radii.windows(2).all(|w| w[1] <= w[0] + 1e-3));
    }

    #[test]
    fn test_unsaturated_stars_are_white() {
        let stars = generate_stars(&StarfieldOptions::default(), 3);
        for star in stars.iter().step_by(97) {
            for channel in &star.color[..3] {
                assert!((channel - STAR_LIGHTNESS).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_saturation_spreads_hues() {
        let options = StarfieldOptions {
            saturation: 1.0,
            count: 300,
            ..StarfieldOptions::default()
        };
        let stars = generate_stars(&options, 3);
        assert_ne!(stars[0].color, stars[100].color);
        assert_ne!(stars[100].color, stars[200].color);
    }

    #[test]
    fn test_same_seed_same_sky() {
        let options = StarfieldOptions {
            count: 200,
            ..StarfieldOptions::default()
        };
        assert_eq!(generate_stars(&options, 9), generate_stars(&options, 9));
        assert_ne!(generate_stars(&options, 9), generate_stars(&options, 10));
    }

    #[test]
    fn test_sky_covers_both_hemispheres() {
        let stars = generate_stars(&StarfieldOptions::default(), 5);
        let above = stars.iter().filter(|s| s.position[1] > 0.0).count();
        assert!((2000..3000).contains(&above), "{above} of 5000 above the equator");
    }

    #[test]
    fn test_fade_is_soft_disc() {
        assert!((star_fade(0.25) - 0.5).abs() < 1e-6);
        assert!(star_fade(0.0) > 0.98);
        assert!(star_fade(0.5) < 0.02);
        assert!(star_fade(0.1) > star_fade(0.3));
    }

    #[test]
    fn test_pixel_size_shrinks_with_distance_and_twinkles() {
        let near = star_pixel_size(4.0, 100.0, 0.0);
        let far = star_pixel_size(4.0, 150.0, 0.0);
        assert!(near > far);
        let sizes: Vec<f32> = (0..20).map(|t| star_pixel_size(4.0, 100.0, t as f32 * 0.3)).collect();
        let min = sizes.iter().cloned().fold(f32::MAX, f32::min);
        let max = sizes.iter().cloned().fold(f32::MIN, f32::max);
        assert!(min >= 4.0 * 0.3 * 2.0 - 1e-4 && max <= 4.0 * 0.3 * 4.0 + 1e-4);
        assert!(max - min > 0.5);
    }

    #[test]
    fn test_instance_layout_matches_struct() {
        assert_eq!(std::mem::size_of::<StarInstance>(), 32);
        assert_eq!(std::mem::size_of::<StarUniform>(), 80);
    }
}
