//! wgpu renderer for planets: sphere, optional ring and the focus card.

use glam::{Mat4, Quat, Vec3};
use orrery_render::{
    DepthBuffer, MeshData, MeshVertex, annulus, feature_edges, icosphere, unit_cube, uv_sphere,
};

use crate::controller::Planet;
use crate::options::Variant;
use crate::shader::{
    PLANET_FS_ENTRY, PLANET_VS_ENTRY, PlanetCameraUniform, SURFACE_CARD, SURFACE_EDGES,
    SURFACE_RING, SurfaceUniforms, WIRE_DIVISIONS,
};

/// Ring tilt about X.
pub const RING_TILT: f32 = std::f32::consts::PI / 2.5;
/// Ring radii relative to the planet size.
pub const RING_INNER: f32 = 1.2;
pub const RING_OUTER: f32 = 1.9;
pub const RING_OPACITY: f32 = 0.6;
/// Morph displacement relative to the sphere radius.
pub const MORPH_AMPLITUDE: f32 = 0.25;
pub const MORPH_FREQUENCY: f32 = 3.0;
/// Wobble distortion strength and drift speed.
pub const WOBBLE_DISTORT: f32 = 0.3;
pub const WOBBLE_SPEED: f32 = 2.0;
/// Lowpoly outline: scale over the sphere and crease angle in degrees.
pub const EDGE_SCALE: f32 = 1.001;
pub const EDGE_THRESHOLD_DEGREES: f32 = 1.0;
/// Surfaces fainter than this are not drawn.
const MIN_VISIBLE_OPACITY: f32 = 1e-3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeshKind {
    Sphere,
    CoarseSphere,
    Edges,
    Ring,
    Card,
}

/// Which pipeline a surface is drawn with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawPass {
    /// Back-face culled, writes depth.
    Opaque,
    /// Line list over the lowpoly sphere, depth-tested only.
    Edges,
    /// Double-sided, depth-tested only.
    Overlay,
}

impl DrawPass {
    fn rank(self) -> u8 {
        match self {
            DrawPass::Opaque => 0,
            DrawPass::Edges => 1,
            DrawPass::Overlay => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceDraw {
    pub mesh: MeshKind,
    pub pass: DrawPass,
    pub uniforms: SurfaceUniforms,
}

fn uniforms(model: Mat4, color: [f32; 3], opacity: f32, kind: u32, time: f32) -> SurfaceUniforms {
    let (a, b) = if kind == Variant::Wobble.shader_id() {
        (WOBBLE_DISTORT, WOBBLE_SPEED)
    } else {
        (MORPH_AMPLITUDE, MORPH_FREQUENCY)
    };
    SurfaceUniforms {
        model: model.to_cols_array_2d(),
        color: [color[0], color[1], color[2], opacity],
        params: [kind as f32, time, a, b],
    }
}

/// Visible surfaces of a planet for this frame: sphere, lowpoly outline,
/// ring, card.
pub fn planet_surfaces(planet: &Planet, time: f32) -> Vec<SurfaceDraw> {
    let params = planet.params();
    let state = planet.state();
    let options = planet.options();
    let color = params.color.to_array();
    let mut draws = Vec::with_capacity(4);

    let sphere_opacity = state.sphere_opacity();
    if sphere_opacity > MIN_VISIBLE_OPACITY {
        let model = Mat4::from_scale_rotation_translation(
            Vec3::splat(params.size),
            state.sphere_rotation(),
            state.position,
        );
        let pass = if options.variant.is_translucent() || sphere_opacity < 0.999 {
            DrawPass::Overlay
        } else {
            DrawPass::Opaque
        };
        let mesh = if options.variant == Variant::Lowpoly {
            MeshKind::CoarseSphere
        } else {
            MeshKind::Sphere
        };
        draws.push(SurfaceDraw {
            mesh,
            pass,
            uniforms: uniforms(model, color, sphere_opacity, options.variant.shader_id(), time),
        });

        if options.variant == Variant::Lowpoly {
            let model = Mat4::from_scale_rotation_translation(
                Vec3::splat(params.size * EDGE_SCALE),
                state.sphere_rotation(),
                state.position,
            );
            draws.push(SurfaceDraw {
                mesh: MeshKind::Edges,
                pass: DrawPass::Edges,
                uniforms: uniforms(model, [1.0; 3], sphere_opacity, SURFACE_EDGES, time),
            });
        }

        if options.ring {
            let model = Mat4::from_scale_rotation_translation(
                Vec3::splat(params.size),
                Quat::from_rotation_x(RING_TILT),
                state.position,
            );
            draws.push(SurfaceDraw {
                mesh: MeshKind::Ring,
                pass: DrawPass::Overlay,
                uniforms: uniforms(model, color, RING_OPACITY * sphere_opacity, SURFACE_RING, time),
            });
        }
    }

    let card_opacity = state.card_opacity();
    if card_opacity > MIN_VISIBLE_OPACITY {
        let model = Mat4::from_scale_rotation_translation(
            state.card_scale,
            state.card_orientation,
            state.position,
        );
        draws.push(SurfaceDraw {
            mesh: MeshKind::Card,
            pass: DrawPass::Overlay,
            uniforms: uniforms(model, color, card_opacity, SURFACE_CARD, time),
        });
    }

    draws
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn new(device: &wgpu::Device, label: &str, mesh: &MeshData) -> Self {
        use wgpu::util::DeviceExt;
        Self {
            vertex_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label}-vertices")),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            index_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label}-indices")),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            }),
            index_count: mesh.index_count(),
        }
    }
}

struct SurfaceSlot {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Draws every planet surface: opaque ones, then outlines, then overlays.
pub struct PlanetRenderer {
    opaque_pipeline: wgpu::RenderPipeline,
    edges_pipeline: wgpu::RenderPipeline,
    overlay_pipeline: wgpu::RenderPipeline,
    surface_bgl: wgpu::BindGroupLayout,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    sphere: GpuMesh,
    coarse_sphere: GpuMesh,
    edges: GpuMesh,
    ring: GpuMesh,
    card: GpuMesh,
    slots: Vec<SurfaceSlot>,
    draws: Vec<(MeshKind, DrawPass)>,
}

impl PlanetRenderer {
    pub fn new(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        color_format: wgpu::TextureFormat,
    ) -> Self {
        use wgpu::util::DeviceExt;

        let uniform_entry = |size: usize| wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: std::num::NonZeroU64::new(size as u64),
            },
            count: None,
        };
        let camera_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("planet-camera-bgl"),
            entries: &[uniform_entry(std::mem::size_of::<PlanetCameraUniform>())],
        });
        let surface_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("planet-surface-bgl"),
            entries: &[uniform_entry(std::mem::size_of::<SurfaceUniforms>())],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("planet-pipeline-layout"),
            bind_group_layouts: &[&camera_bgl, &surface_bgl],
            immediate_size: 0,
        });

        let make_pipeline = |label: &str,
                             topology: wgpu::PrimitiveTopology,
                             cull_mode: Option<wgpu::Face>,
                             depth: wgpu::DepthStencilState| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some(PLANET_VS_ENTRY),
                    buffers: &[MeshVertex::LAYOUT],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                primitive: wgpu::PrimitiveState {
                    topology,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode,
                    ..Default::default()
                },
                depth_stencil: Some(depth),
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some(PLANET_FS_ENTRY),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: color_format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                multiview_mask: None,
                cache: None,
            })
        };
        let opaque_pipeline = make_pipeline(
            "planet-opaque-pipeline",
            wgpu::PrimitiveTopology::TriangleList,
            Some(wgpu::Face::Back),
            DepthBuffer::opaque_state(),
        );
        let edges_pipeline = make_pipeline(
            "planet-edges-pipeline",
            wgpu::PrimitiveTopology::LineList,
            None,
            DepthBuffer::transparent_state(),
        );
        let overlay_pipeline = make_pipeline(
            "planet-overlay-pipeline",
            wgpu::PrimitiveTopology::TriangleList,
            None,
            DepthBuffer::transparent_state(),
        );

        let lowpoly = icosphere(1.0, 1);
        let outline = MeshData {
            indices: feature_edges(&lowpoly, EDGE_THRESHOLD_DEGREES),
            vertices: lowpoly.vertices.clone(),
        };

        let camera = PlanetCameraUniform {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            camera_pos: [0.0; 4],
        };
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("planet-camera"),
            contents: bytemuck::bytes_of(&camera),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("planet-camera-bg"),
            layout: &camera_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        log::info!("Planet renderer initialized");

        Self {
            opaque_pipeline,
            edges_pipeline,
            overlay_pipeline,
            surface_bgl,
            camera_buffer,
            camera_bind_group,
            sphere: GpuMesh::new(
                device,
                "planet-sphere",
                &uv_sphere(1.0, WIRE_DIVISIONS, WIRE_DIVISIONS),
            ),
            coarse_sphere: GpuMesh::new(device, "planet-lowpoly", &lowpoly),
            edges: GpuMesh::new(device, "planet-lowpoly-edges", &outline),
            ring: GpuMesh::new(device, "planet-ring", &annulus(RING_INNER, RING_OUTER, 64)),
            card: GpuMesh::new(device, "planet-card", &unit_cube()),
            slots: Vec::new(),
            draws: Vec::new(),
        }
    }

    fn create_slot(&self, device: &wgpu::Device) -> SurfaceSlot {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("planet-surface-uniforms"),
            size: std::mem::size_of::<SurfaceUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("planet-surface-bg"),
            layout: &self.surface_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        SurfaceSlot { buffer, bind_group }
    }

    /// Upload this frame's surfaces, ordered by pass.
    pub fn update<'p>(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view_proj: Mat4,
        camera_pos: Vec3,
        planets: impl IntoIterator<Item = &'p Planet>,
        time: f32,
    ) {
        let camera = PlanetCameraUniform {
            view_proj: view_proj.to_cols_array_2d(),
            camera_pos: camera_pos.extend(1.0).to_array(),
        };
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&camera));

        let mut surfaces: Vec<SurfaceDraw> = planets
            .into_iter()
            .flat_map(|planet| planet_surfaces(planet, time))
            .collect();
        surfaces.sort_by_key(|s| s.pass.rank());

        while self.slots.len() < surfaces.len() {
            let slot = self.create_slot(device);
            self.slots.push(slot);
        }
        self.draws.clear();
        for (surface, slot) in surfaces.iter().zip(&self.slots) {
            queue.write_buffer(&slot.buffer, 0, bytemuck::bytes_of(&surface.uniforms));
            self.draws.push((surface.mesh, surface.pass));
        }
    }

    pub fn render<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        pass.set_bind_group(0, &self.camera_bind_group, &[]);
        let mut current: Option<DrawPass> = None;
        for ((mesh_kind, draw_pass), slot) in self.draws.iter().zip(&self.slots) {
            if current != Some(*draw_pass) {
                pass.set_pipeline(match draw_pass {
                    DrawPass::Opaque => &self.opaque_pipeline,
                    DrawPass::Edges => &self.edges_pipeline,
                    DrawPass::Overlay => &self.overlay_pipeline,
                });
                current = Some(*draw_pass);
            }
            let mesh = match mesh_kind {
                MeshKind::Sphere => &self.sphere,
                MeshKind::CoarseSphere => &self.coarse_sphere,
                MeshKind::Edges => &self.edges,
                MeshKind::Ring => &self.ring,
                MeshKind::Card => &self.card,
            };
            pass.set_bind_group(1, &slot.bind_group, &[]);
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::FrameInput;
    use crate::options::PlanetOptions;

    fn planet(variant: Variant, ring: bool) -> Planet {
        Planet::new(
            PlanetOptions {
                variant,
                ring,
                phase_offset: Some(0.0),
                ..PlanetOptions::default()
            },
            0.0,
        )
    }

    fn focus(planet: &mut Planet, frames: usize) {
        for _ in 0..frames {
            planet.update(FrameInput {
                dt: 1.0 / 60.0,
                focused: true,
                focus_point: Vec3::new(0.0, 0.0, 20.0),
            });
        }
    }

    #[test]
    fn test_orbiting_planet_draws_sphere_and_ring() {
        let draws = planet_surfaces(&planet(Variant::Metal, true), 0.0);
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].mesh, MeshKind::Sphere);
        assert_eq!(draws[0].pass, DrawPass::Opaque);
        assert_eq!(draws[0].uniforms.params[0], 1.0);
        assert_eq!(draws[1].mesh, MeshKind::Ring);
        assert!((draws[1].uniforms.color[3] - RING_OPACITY).abs() < 1e-6);
    }

    #[test]
    fn test_variant_selects_mesh_and_pass() {
        let lowpoly = planet_surfaces(&planet(Variant::Lowpoly, false), 0.0);
        assert_eq!(lowpoly[0].mesh, MeshKind::CoarseSphere);
        let holo = planet_surfaces(&planet(Variant::Holo, false), 0.0);
        assert_eq!(holo[0].pass, DrawPass::Overlay);
        let wire = planet_surfaces(&planet(Variant::Wire, false), 0.0);
        assert_eq!(wire[0].mesh, MeshKind::Sphere);
        assert_eq!(wire[0].pass, DrawPass::Opaque);
        assert_eq!(wire[0].uniforms.params[0], Variant::Wire.shader_id() as f32);
    }

    #[test]
    fn test_lowpoly_gets_white_outline() {
        let p = planet(Variant::Lowpoly, false);
        let draws = planet_surfaces(&p, 0.0);
        assert_eq!(draws.len(), 2);
        let edges = &draws[1];
        assert_eq!(edges.mesh, MeshKind::Edges);
        assert_eq!(edges.pass, DrawPass::Edges);
        assert_eq!(&edges.uniforms.color[..3], &[1.0, 1.0, 1.0]);
        assert_eq!(edges.uniforms.color[3], draws[0].uniforms.color[3]);
        assert_eq!(edges.uniforms.params[0], SURFACE_EDGES as f32);
        let (scale, _, _) = Mat4::from_cols_array_2d(&edges.uniforms.model)
            .to_scale_rotation_translation();
        assert!((scale.x - p.params().size * EDGE_SCALE).abs() < 1e-5);

        assert!(
            planet_surfaces(&planet(Variant::Basic, false), 0.0)
                .iter()
                .all(|d| d.mesh != MeshKind::Edges)
        );
    }

    #[test]
    fn test_wobble_carries_distortion_params() {
        let draws = planet_surfaces(&planet(Variant::Wobble, false), 3.0);
        assert_eq!(
            draws[0].uniforms.params,
            [Variant::Wobble.shader_id() as f32, 3.0, WOBBLE_DISTORT, WOBBLE_SPEED]
        );
        let morph = planet_surfaces(&planet(Variant::Morph, false), 3.0);
        assert_eq!(morph[0].uniforms.params[2], MORPH_AMPLITUDE);
        assert_eq!(morph[0].uniforms.params[3], MORPH_FREQUENCY);
    }

    #[test]
    fn test_focus_cross_fades_into_card() {
        let mut p = planet(Variant::Basic, true);
        focus(&mut p, 20);
        let draws = planet_surfaces(&p, 1.0);
        let sphere = draws.iter().find(|d| d.mesh == MeshKind::Sphere).unwrap();
        let card = draws.iter().find(|d| d.mesh == MeshKind::Card).unwrap();
        assert_eq!(sphere.pass, DrawPass::Overlay);
        assert!((sphere.uniforms.color[3] + card.uniforms.color[3] - 1.0).abs() < 1e-5);

        focus(&mut p, 600);
        let draws = planet_surfaces(&p, 2.0);
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].mesh, MeshKind::Card);
        assert_eq!(draws[0].uniforms.params[0], SURFACE_CARD as f32);
    }

    fn create_test_device() -> Option<wgpu::Device> {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });
            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions::default())
                .await
                .ok()?;
            let (device, _queue) = adapter
                .request_device(&wgpu::DeviceDescriptor::default())
                .await
                .ok()?;
            Some(device)
        })
    }

    #[test]
    fn test_renderer_creation() {
        let Some(device) = create_test_device() else {
            return;
        };
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("planet-test"),
            source: wgpu::ShaderSource::Wgsl(crate::shader::PLANET_SHADER_SOURCE.into()),
        });
        let renderer =
            PlanetRenderer::new(&device, &shader, wgpu::TextureFormat::Bgra8UnormSrgb);
        assert_eq!(renderer.card.index_count, 36);
        assert!(renderer.coarse_sphere.index_count < renderer.sphere.index_count);
        assert_eq!(renderer.edges.index_count, 120 * 2);
        assert!(renderer.slots.is_empty());
    }

    #[test]
    fn test_ring_is_tilted_and_scaled() {
        let p = planet(Variant::Basic, true);
        let draws = planet_surfaces(&p, 0.0);
        let model = Mat4::from_cols_array_2d(&draws[1].uniforms.model);
        let (scale, rotation, translation) = model.to_scale_rotation_translation();
        assert!((scale - Vec3::splat(p.params().size)).length() < 1e-5);
        assert!(rotation.abs_diff_eq(Quat::from_rotation_x(RING_TILT), 1e-5));
        assert!((translation - p.state().position).length() < 1e-5);
    }
}
