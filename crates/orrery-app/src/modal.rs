//! Draws the modal host: a dimmed backdrop and the centred panel.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use orrery_render::DepthBuffer;
use orrery_scene::Rect;

pub const BACKDROP_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 0.25];
pub const PANEL_COLOR: [f32; 4] = [12.0 / 255.0, 12.0 / 255.0, 12.0 / 255.0, 0.92];

pub const MODAL_SHADER_SOURCE: &str = r#"
struct ModalUniforms {
    backdrop: vec4<f32>,
    backdrop_color: vec4<f32>,
    panel: vec4<f32>,
    panel_color: vec4<f32>,
};

@group(0) @binding(0) var<uniform> modal: ModalUniforms;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_modal(
    @builtin(vertex_index) vertex: u32,
    @builtin(instance_index) instance: u32,
) -> VertexOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(0.0, 0.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(0.0, 0.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(0.0, 1.0),
    );
    var rect = modal.backdrop;
    var color = modal.backdrop_color;
    if (instance == 1u) {
        rect = modal.panel;
        color = modal.panel_color;
    }
    var out: VertexOutput;
    out.clip_position = vec4<f32>(mix(rect.xy, rect.zw, corners[vertex]), 0.0, 1.0);
    out.color = color;
    return out;
}

@fragment
fn fs_modal(in: VertexOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

/// Rects in clip space as `(x0, y0, x1, y1)`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ModalUniforms {
    pub backdrop: [f32; 4],
    pub backdrop_color: [f32; 4],
    pub panel: [f32; 4],
    pub panel_color: [f32; 4],
}

fn to_clip(rect: &Rect, viewport: Vec2) -> [f32; 4] {
    let viewport = viewport.max(Vec2::ONE);
    let min = rect.min / viewport;
    let max = rect.max() / viewport;
    [
        min.x * 2.0 - 1.0,
        1.0 - min.y * 2.0,
        max.x * 2.0 - 1.0,
        1.0 - max.y * 2.0,
    ]
}

/// Uniforms for an open modal whose panel is `panel` in pixels.
pub fn modal_uniforms(panel: &Rect, viewport: Vec2) -> ModalUniforms {
    ModalUniforms {
        backdrop: [-1.0, 1.0, 1.0, -1.0],
        backdrop_color: BACKDROP_COLOR,
        panel: to_clip(panel, viewport),
        panel_color: PANEL_COLOR,
    }
}

pub struct ModalRenderer {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    visible: bool,
}

impl ModalRenderer {
    pub fn new(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        color_format: wgpu::TextureFormat,
    ) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("modal-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("modal-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("modal-pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_modal"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            // Drawn over the tonemapped frame, after bloom.
            depth_stencil: Some(wgpu::DepthStencilState {
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                ..DepthBuffer::opaque_state()
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_modal"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("modal-uniforms"),
            size: std::mem::size_of::<ModalUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("modal-bg"),
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
            visible: false,
        }
    }

    /// `panel` is `None` while the modal is closed.
    pub fn update(&mut self, queue: &wgpu::Queue, panel: Option<Rect>, viewport: Vec2) {
        self.visible = panel.is_some();
        if let Some(panel) = panel {
            let uniforms = modal_uniforms(&panel, viewport);
            queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
        }
    }

    pub fn render<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        if !self.visible {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.draw(0..6, 0..2);
    }
}
