//! Instanced wgpu renderer for the two voxel layers.

use bytemuck::Zeroable;
use glam::{Mat4, Vec3};
use orrery_render::{DepthBuffer, MeshVertex, unit_cube};

use crate::layer::{ColumnInstanceRaw, LayerKind};
use crate::shader::{LayerUniforms, VOXEL_FS_ENTRY, VOXEL_VS_ENTRY, VoxelCameraUniform};
use crate::sun::VoxelSun;

impl ColumnInstanceRaw {
    const ATTRIBUTES: [wgpu::VertexAttribute; 7] = wgpu::vertex_attr_array![
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
        8 => Float32x4,
        9 => Float32x4,
    ];

    const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<ColumnInstanceRaw>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &Self::ATTRIBUTES,
    };
}

/// Scene lighting shared by both layers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoxelLighting {
    pub direction: Vec3,
    pub ambient: f32,
}

impl Default for VoxelLighting {
    fn default() -> Self {
        Self {
            direction: Vec3::new(0.4, 1.0, 0.6),
            ambient: 0.35,
        }
    }
}

/// Build the uniform block of one layer for the current frame.
pub fn layer_uniforms(sun: &VoxelSun, kind: LayerKind, lighting: VoxelLighting) -> LayerUniforms {
    let shading = sun.shading(kind);
    let options = sun.options();
    let t = sun.motion().time;
    let e = shading.material_emissive;
    LayerUniforms {
        model: sun.layer_transform(kind).to_cols_array_2d(),
        material_emissive: [e.r, e.g, e.b, 0.0],
        flicker: [shading.flicker_speed, shading.flicker_amp, t, 0.0],
        surface: [options.ripple.frequency, options.ripple.speed, t, 0.0],
        rim: [options.fresnel_pow, options.rim_strength, 0.0, 0.0],
        light: [
            lighting.direction.x,
            lighting.direction.y,
            lighting.direction.z,
            lighting.ambient,
        ],
    }
}

struct LayerResources {
    kind: LayerKind,
    instance_buffer: wgpu::Buffer,
    capacity: usize,
    instance_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

fn create_instance_buffer(device: &wgpu::Device, kind: LayerKind, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(&format!("voxel-{}-instances", kind.label())),
        size: (capacity.max(1) * std::mem::size_of::<ColumnInstanceRaw>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Draws both voxel layers with one instanced call each.
pub struct VoxelSunRenderer {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    layers: Vec<LayerResources>,
    pub lighting: VoxelLighting,
}

impl VoxelSunRenderer {
    /// Create the pipeline and per-layer buffers from the compiled voxel
    /// program. Depth follows [`DepthBuffer`] (reverse-Z).
    pub fn new(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        color_format: wgpu::TextureFormat,
    ) -> Self {
        use wgpu::util::DeviceExt;

        let camera_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("voxel-camera-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: std::num::NonZeroU64::new(
                        std::mem::size_of::<VoxelCameraUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let layer_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("voxel-layer-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: std::num::NonZeroU64::new(
                        std::mem::size_of::<LayerUniforms>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("voxel-pipeline-layout"),
            bind_group_layouts: &[&camera_bgl, &layer_bgl],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("voxel-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some(VOXEL_VS_ENTRY),
                buffers: &[MeshVertex::LAYOUT, ColumnInstanceRaw::LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(DepthBuffer::opaque_state()),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some(VOXEL_FS_ENTRY),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        let cube = unit_cube();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("voxel-cube-vertices"),
            contents: bytemuck::cast_slice(&cube.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("voxel-cube-indices"),
            contents: bytemuck::cast_slice(&cube.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let camera = VoxelCameraUniform {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            camera_pos: [0.0; 4],
        };
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("voxel-camera"),
            contents: bytemuck::bytes_of(&camera),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("voxel-camera-bg"),
            layout: &camera_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let layers = LayerKind::ALL
            .into_iter()
            .map(|kind| {
                let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("voxel-{}-uniforms", kind.label())),
                    contents: bytemuck::bytes_of(&LayerUniforms::zeroed()),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("voxel-{}-bg", kind.label())),
                    layout: &layer_bgl,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    }],
                });
                LayerResources {
                    kind,
                    instance_buffer: create_instance_buffer(device, kind, 0),
                    capacity: 0,
                    instance_count: 0,
                    uniform_buffer,
                    bind_group,
                }
            })
            .collect();

        log::info!("Voxel sun renderer initialized");

        Self {
            pipeline,
            vertex_buffer,
            index_buffer,
            index_count: cube.index_count(),
            camera_buffer,
            camera_bind_group,
            layers,
            lighting: VoxelLighting::default(),
        }
    }

    /// Upload this frame's camera, layer uniforms and instance transforms.
    /// Instance buffers grow when the sun was rebuilt with more columns.
    pub fn update(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view_proj: Mat4,
        camera_pos: Vec3,
        sun: &VoxelSun,
    ) {
        let camera = VoxelCameraUniform {
            view_proj: view_proj.to_cols_array_2d(),
            camera_pos: camera_pos.extend(1.0).to_array(),
        };
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&camera));

        let lighting = self.lighting;
        for resources in &mut self.layers {
            let instances = sun.layer(resources.kind).instance_data();
            if instances.len() > resources.capacity {
                resources.instance_buffer =
                    create_instance_buffer(device, resources.kind, instances.len());
                resources.capacity = instances.len();
                log::debug!(
                    "Voxel {} instance buffer grown to {}",
                    resources.kind.label(),
                    instances.len()
                );
            }
            if !instances.is_empty() {
                queue.write_buffer(&resources.instance_buffer, 0, bytemuck::cast_slice(&instances));
            }
            resources.instance_count = instances.len() as u32;

            let uniforms = layer_uniforms(sun, resources.kind, lighting);
            queue.write_buffer(&resources.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
        }
    }

    /// Draw both layers. Empty layers are skipped.
    pub fn render<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.camera_bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        for resources in &self.layers {
            if resources.instance_count == 0 {
                continue;
            }
            pass.set_bind_group(1, &resources.bind_group, &[]);
            pass.set_vertex_buffer(1, resources.instance_buffer.slice(..));
            pass.draw_indexed(0..self.index_count, 0, 0..resources.instance_count);
        }
    }
}
