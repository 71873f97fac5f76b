//! Bloom post-process between the HDR scene pass and the swapchain.
//!
//! The scene renders into an `Rgba16Float` target. Bright pixels are
//! extracted with a smooth luminance ramp, blurred down and back up a mip
//! chain, then added over the ACES-tonemapped scene.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

pub const BLOOM_SHADER_NAME: &str = "orrery-bloom";

/// Format of the scene target and every mip of the blur chain.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BloomSettings {
    pub enabled: bool,
    /// Luminance where the glow starts to ramp in.
    pub threshold: f32,
    /// Width of the ramp above `threshold`; full glow at `threshold + smoothing`.
    pub smoothing: f32,
    pub intensity: f32,
    /// Mip levels below full resolution. Each level halves the size.
    pub iterations: u32,
    /// Tap offset in texels for the down and up filters.
    pub radius: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 0.2,
            smoothing: 0.9,
            intensity: 1.5,
            iterations: 5,
            radius: 1.0,
        }
    }
}

impl BloomSettings {
    fn is_active(&self) -> bool {
        self.enabled && self.iterations > 0 && self.intensity > 0.0
    }

    fn params(&self) -> BloomParams {
        BloomParams {
            threshold: self.threshold,
            smoothing: self.smoothing,
            intensity: self.intensity,
            radius: self.radius,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct BloomParams {
    threshold: f32,
    smoothing: f32,
    intensity: f32,
    radius: f32,
}

/// Rec. 709 luminance, as the extract pass computes it.
pub fn luminance(rgb: [f32; 3]) -> f32 {
    rgb[0] * 0.2126 + rgb[1] * 0.7152 + rgb[2] * 0.0722
}

/// Share of a pixel with luminance `luma` that feeds the blur.
pub fn bloom_weight(luma: f32, settings: &BloomSettings) -> f32 {
    let edge = settings.smoothing.max(1e-4);
    let t = ((luma - settings.threshold) / edge).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Sizes of the blur chain for a `width` x `height` scene.
pub fn mip_extents(width: u32, height: u32, iterations: u32) -> Vec<(u32, u32)> {
    let mut extents = Vec::with_capacity(iterations as usize);
    let (mut w, mut h) = ((width / 2).max(1), (height / 2).max(1));
    for _ in 0..iterations {
        extents.push((w, h));
        w = (w / 2).max(1);
        h = (h / 2).max(1);
    }
    extents
}

pub const BLOOM_SHADER_SOURCE: &str = r#"
struct BloomParams {
    threshold: f32,
    smoothing: f32,
    intensity: f32,
    radius: f32,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@group(0) @binding(0) var<uniform> params: BloomParams;
@group(1) @binding(0) var input_tex: texture_2d<f32>;
@group(1) @binding(1) var input_sampler: sampler;

@vertex
fn vs_fullscreen(@builtin(vertex_index) idx: u32) -> VertexOutput {
    let uv = vec2<f32>(f32((idx << 1u) & 2u), f32(idx & 2u));
    var out: VertexOutput;
    out.position = vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(uv.x, 1.0 - uv.y);
    return out;
}

@fragment
fn fs_extract(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(input_tex, input_sampler, in.uv).rgb;
    let luma = dot(color, vec3<f32>(0.2126, 0.7152, 0.0722));
    let weight = smoothstep(params.threshold, params.threshold + max(params.smoothing, 1e-4), luma);
    return vec4<f32>(color * weight, 1.0);
}

@fragment
fn fs_downsample(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = params.radius / vec2<f32>(textureDimensions(input_tex));
    let a = textureSample(input_tex, input_sampler, in.uv + vec2(-texel.x, -texel.y)).rgb;
    let b = textureSample(input_tex, input_sampler, in.uv + vec2( texel.x, -texel.y)).rgb;
    let c = textureSample(input_tex, input_sampler, in.uv + vec2(-texel.x,  texel.y)).rgb;
    let d = textureSample(input_tex, input_sampler, in.uv + vec2( texel.x,  texel.y)).rgb;
    return vec4<f32>((a + b + c + d) * 0.25, 1.0);
}

@fragment
fn fs_upsample(in: VertexOutput) -> @location(0) vec4<f32> {
    // 3x3 tent.
    let texel = params.radius / vec2<f32>(textureDimensions(input_tex));
    var sum = textureSample(input_tex, input_sampler, in.uv).rgb * 4.0;
    sum += textureSample(input_tex, input_sampler, in.uv + vec2(-texel.x, 0.0)).rgb * 2.0;
    sum += textureSample(input_tex, input_sampler, in.uv + vec2( texel.x, 0.0)).rgb * 2.0;
    sum += textureSample(input_tex, input_sampler, in.uv + vec2(0.0, -texel.y)).rgb * 2.0;
    sum += textureSample(input_tex, input_sampler, in.uv + vec2(0.0,  texel.y)).rgb * 2.0;
    sum += textureSample(input_tex, input_sampler, in.uv + vec2(-texel.x, -texel.y)).rgb;
    sum += textureSample(input_tex, input_sampler, in.uv + vec2( texel.x, -texel.y)).rgb;
    sum += textureSample(input_tex, input_sampler, in.uv + vec2(-texel.x,  texel.y)).rgb;
    sum += textureSample(input_tex, input_sampler, in.uv + vec2( texel.x,  texel.y)).rgb;
    return vec4<f32>(sum / 16.0, 1.0);
}

@fragment
fn fs_tonemap(in: VertexOutput) -> @location(0) vec4<f32> {
    let hdr = textureSample(input_tex, input_sampler, in.uv).rgb;
    let mapped = clamp(
        (hdr * (2.51 * hdr + 0.03)) / (hdr * (2.43 * hdr + 0.59) + 0.14),
        vec3<f32>(0.0),
        vec3<f32>(1.0),
    );
    return vec4<f32>(mapped, 1.0);
}

@fragment
fn fs_composite(in: VertexOutput) -> @location(0) vec4<f32> {
    let glow = textureSample(input_tex, input_sampler, in.uv).rgb;
    return vec4<f32>(glow * params.intensity, 1.0);
}
"#;

const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent::OVER,
};

/// A sampled render target.
struct Target {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
}

pub struct BloomPipeline {
    settings: BloomSettings,
    texture_bgl: wgpu::BindGroupLayout,
    extract_pipeline: wgpu::RenderPipeline,
    downsample_pipeline: wgpu::RenderPipeline,
    upsample_pipeline: wgpu::RenderPipeline,
    tonemap_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    sampler: wgpu::Sampler,
    params_buffer: wgpu::Buffer,
    params_bind_group: wgpu::BindGroup,
    hdr: Target,
    mips: Vec<Target>,
    size: (u32, u32),
}

impl BloomPipeline {
    pub fn new(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        settings: BloomSettings,
    ) -> Self {
        use wgpu::util::DeviceExt;

        let params_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bloom-params-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: std::num::NonZeroU64::new(
                        std::mem::size_of::<BloomParams>() as u64,
                    ),
                },
                count: None,
            }],
        });
        let texture_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bloom-texture-bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("bloom-layout"),
            bind_group_layouts: &[&params_bgl, &texture_bgl],
            immediate_size: 0,
        });

        let pipeline = |entry: &str, format: wgpu::TextureFormat, blend: Option<wgpu::BlendState>| {
            fullscreen_pipeline(device, shader, &layout, entry, format, blend)
        };
        let extract_pipeline = pipeline("fs_extract", HDR_FORMAT, None);
        let downsample_pipeline = pipeline("fs_downsample", HDR_FORMAT, None);
        let upsample_pipeline = pipeline("fs_upsample", HDR_FORMAT, Some(ADDITIVE));
        let tonemap_pipeline = pipeline("fs_tonemap", surface_format, None);
        let composite_pipeline = pipeline("fs_composite", surface_format, Some(ADDITIVE));

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("bloom-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("bloom-params"),
            contents: bytemuck::bytes_of(&settings.params()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let params_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("bloom-params-bg"),
            layout: &params_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: params_buffer.as_entire_binding(),
            }],
        });

        let (width, height) = (width.max(1), height.max(1));
        let hdr = create_target(device, &texture_bgl, &sampler, "bloom-hdr", width, height);
        let mips =
            create_mip_chain(device, &texture_bgl, &sampler, width, height, settings.iterations);

        log::info!(
            "Bloom ready: {} mips, threshold {}, intensity {}",
            mips.len(),
            settings.threshold,
            settings.intensity
        );

        Self {
            settings,
            texture_bgl,
            extract_pipeline,
            downsample_pipeline,
            upsample_pipeline,
            tonemap_pipeline,
            composite_pipeline,
            sampler,
            params_buffer,
            params_bind_group,
            hdr,
            mips,
            size: (width, height),
        }
    }

    /// The target the scene pass draws into.
    pub fn hdr_view(&self) -> &wgpu::TextureView {
        &self.hdr.view
    }

    pub fn settings(&self) -> &BloomSettings {
        &self.settings
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if self.size == (width, height) {
            return;
        }
        self.hdr = create_target(
            device,
            &self.texture_bgl,
            &self.sampler,
            "bloom-hdr",
            width,
            height,
        );
        self.mips = create_mip_chain(
            device,
            &self.texture_bgl,
            &self.sampler,
            width,
            height,
            self.settings.iterations,
        );
        self.size = (width, height);
    }

    /// Apply new settings; the chain is rebuilt only when its depth changes.
    pub fn update_settings(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        settings: BloomSettings,
    ) {
        if settings.iterations != self.settings.iterations {
            let (width, height) = self.size;
            self.mips = create_mip_chain(
                device,
                &self.texture_bgl,
                &self.sampler,
                width,
                height,
                settings.iterations,
            );
        }
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&settings.params()));
        self.settings = settings;
    }

    /// Tonemap the HDR scene onto `surface_view`, adding the glow when active.
    pub fn execute(&self, encoder: &mut wgpu::CommandEncoder, surface_view: &wgpu::TextureView) {
        let clear = wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT);
        let glow = self.settings.is_active() && !self.mips.is_empty();

        if glow {
            self.run_pass(
                encoder,
                &self.extract_pipeline,
                &self.hdr,
                &self.mips[0].view,
                clear,
                "bloom-extract",
            );
            for i in 1..self.mips.len() {
                self.run_pass(
                    encoder,
                    &self.downsample_pipeline,
                    &self.mips[i - 1],
                    &self.mips[i].view,
                    clear,
                    "bloom-downsample",
                );
            }
            for i in (0..self.mips.len() - 1).rev() {
                self.run_pass(
                    encoder,
                    &self.upsample_pipeline,
                    &self.mips[i + 1],
                    &self.mips[i].view,
                    wgpu::LoadOp::Load,
                    "bloom-upsample",
                );
            }
        }

        self.run_pass(
            encoder,
            &self.tonemap_pipeline,
            &self.hdr,
            surface_view,
            wgpu::LoadOp::Clear(wgpu::Color::BLACK),
            "bloom-tonemap",
        );
        if glow {
            self.run_pass(
                encoder,
                &self.composite_pipeline,
                &self.mips[0],
                surface_view,
                wgpu::LoadOp::Load,
                "bloom-composite",
            );
        }
    }

    fn run_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pipeline: &wgpu::RenderPipeline,
        source: &Target,
        target_view: &wgpu::TextureView,
        load: wgpu::LoadOp<wgpu::Color>,
        label: &str,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.params_bind_group, &[]);
        pass.set_bind_group(1, &source.bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    fragment_entry: &str,
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(fragment_entry),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_fullscreen"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview_mask: None,
        cache: None,
    })
}

fn create_target(
    device: &wgpu::Device,
    texture_bgl: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    label: &str,
    width: u32,
    height: u32,
) -> Target {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: HDR_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout: texture_bgl,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });
    Target {
        _texture: texture,
        view,
        bind_group,
    }
}

fn create_mip_chain(
    device: &wgpu::Device,
    texture_bgl: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    width: u32,
    height: u32,
    iterations: u32,
) -> Vec<Target> {
    mip_extents(width, height, iterations)
        .into_iter()
        .enumerate()
        .map(|(i, (w, h))| {
            log::trace!("Bloom mip {i}: {w}x{h}");
            create_target(device, texture_bgl, sampler, "bloom-mip", w, h)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = BloomSettings::default();
        assert!(settings.enabled);
        assert_eq!(settings.threshold, 0.2);
        assert_eq!(settings.smoothing, 0.9);
        assert_eq!(settings.intensity, 1.5);
        assert_eq!(settings.iterations, 5);
    }

    #[test]
    fn test_weight_ramps_between_threshold_and_smoothing() {
        let settings = BloomSettings::default();
        assert_eq!(bloom_weight(0.1, &settings), 0.0);
        assert_eq!(bloom_weight(0.2, &settings), 0.0);
        assert!((bloom_weight(0.65, &settings) - 0.5).abs() < 1e-5);
        assert_eq!(bloom_weight(1.1, &settings), 1.0);
        assert_eq!(bloom_weight(4.0, &settings), 1.0);

        let mut last = 0.0;
        for i in 0..=20 {
            let w = bloom_weight(0.2 + 0.9 * i as f32 / 20.0, &settings);
            assert!(w >= last);
            last = w;
        }
    }

    #[test]
    fn test_dark_space_does_not_glow() {
        let settings = BloomSettings::default();
        let backdrop = luminance([0.004, 0.004, 0.012]);
        assert_eq!(bloom_weight(backdrop, &settings), 0.0);
        assert!(bloom_weight(luminance([1.0, 0.4, 0.1]), &settings) > 0.2);
    }

    #[test]
    fn test_zero_smoothing_is_a_step() {
        let settings = BloomSettings {
            smoothing: 0.0,
            ..BloomSettings::default()
        };
        assert_eq!(bloom_weight(0.19, &settings), 0.0);
        assert_eq!(bloom_weight(0.21, &settings), 1.0);
    }

    #[test]
    fn test_mip_extents_halve_and_floor_at_one() {
        assert_eq!(
            mip_extents(1920, 1080, 5),
            vec![(960, 540), (480, 270), (240, 135), (120, 67), (60, 33)]
        );
        assert_eq!(mip_extents(4, 2, 3), vec![(2, 1), (1, 1), (1, 1)]);
        assert!(mip_extents(800, 600, 0).is_empty());
    }

    #[test]
    fn test_inactive_when_disabled_or_flat() {
        assert!(BloomSettings::default().is_active());
        for settings in [
            BloomSettings { enabled: false, ..Default::default() },
            BloomSettings { iterations: 0, ..Default::default() },
            BloomSettings { intensity: 0.0, ..Default::default() },
        ] {
            assert!(!settings.is_active());
        }
    }

    #[test]
    fn test_params_uniform_size() {
        assert_eq!(std::mem::size_of::<BloomParams>(), 16);
    }

    #[test]
    fn test_partial_settings_from_ron() {
        let settings: BloomSettings = ron::from_str("(intensity: 0.5)").unwrap();
        assert_eq!(settings.intensity, 0.5);
        assert_eq!(settings.threshold, 0.2);
    }
}
