//! Render bootstrap and per-frame drawing of the scene.

use glam::{Vec2, Vec3};
use orrery_config::RenderConfig;
use orrery_math::{Color, normalize_or_up};
use orrery_planet::{PLANET_SHADER_NAME, PLANET_SHADER_SOURCE, PlanetRenderer};
use orrery_render::{
    BLOOM_SHADER_NAME, BLOOM_SHADER_SOURCE, BloomPipeline, Camera, DepthBuffer, HDR_FORMAT,
    RenderContext, SPACE_BLACK, STARFIELD_SHADER_NAME, STARFIELD_SHADER_SOURCE, ShaderError,
    ShaderLibrary, StarfieldRenderer, SurfaceError, begin_overlay_pass, begin_scene_pass,
};
use orrery_scene::{Rect, Scene};
use orrery_sun::{VOXEL_SHADER_NAME, VOXEL_SHADER_SOURCE, VoxelLighting, VoxelSunRenderer};
use tracing::{debug, info, warn};

use crate::modal::{MODAL_SHADER_SOURCE, ModalRenderer};

pub const MODAL_SHADER_NAME: &str = "orrery-modal";

/// Every program the orrery draws with, by library name.
pub const SCENE_SHADERS: [(&str, &str); 5] = [
    (STARFIELD_SHADER_NAME, STARFIELD_SHADER_SOURCE),
    (VOXEL_SHADER_NAME, VOXEL_SHADER_SOURCE),
    (PLANET_SHADER_NAME, PLANET_SHADER_SOURCE),
    (BLOOM_SHADER_NAME, BLOOM_SHADER_SOURCE),
    (MODAL_SHADER_NAME, MODAL_SHADER_SOURCE),
];

/// Keeps the star sky independent of the sun's column layout.
const STAR_STREAM: u64 = 0x5747_4152_5346_4c44;

/// Compile the scene programs into `library`. Runs once at start-up; a
/// second call fails with [`ShaderError::AlreadyRegistered`].
pub fn register_scene_shaders(
    library: &mut ShaderLibrary,
    device: &wgpu::Device,
) -> Result<(), ShaderError> {
    for (name, source) in SCENE_SHADERS {
        library.register(device, name, source)?;
    }
    Ok(())
}

/// Backdrop colour from `#rrggbb`, or the default space black.
pub fn clear_color(hex: &str) -> wgpu::Color {
    match Color::from_hex(hex) {
        Some(c) => wgpu::Color {
            r: f64::from(c.r),
            g: f64::from(c.g),
            b: f64::from(c.b),
            a: 1.0,
        },
        None => {
            warn!(hex, "invalid clear colour, using default");
            SPACE_BLACK
        }
    }
}

pub fn lighting(config: &RenderConfig) -> VoxelLighting {
    VoxelLighting {
        direction: normalize_or_up(Vec3::from_array(config.light_direction)),
        ambient: config.ambient,
    }
}

/// Draws the scene into an HDR target, blooms and tonemaps it onto the
/// swapchain, then lays the modal over the result.
pub struct SceneRenderer {
    depth: DepthBuffer,
    stars: StarfieldRenderer,
    voxel: VoxelSunRenderer,
    planets: PlanetRenderer,
    bloom: BloomPipeline,
    modal: ModalRenderer,
    clear: wgpu::Color,
    config: RenderConfig,
    star_seed: u64,
}

impl SceneRenderer {
    /// `seed` is the scene seed; the star sky derives its own stream from it.
    pub fn new(
        gpu: &RenderContext,
        config: &RenderConfig,
        seed: u64,
    ) -> Result<Self, ShaderError> {
        let device = &gpu.device;
        let surface_format = gpu.surface_format;
        let mut shaders = ShaderLibrary::new();
        register_scene_shaders(&mut shaders, device)?;

        let (width, height) = gpu.size();
        let star_shader = shaders.get(STARFIELD_SHADER_NAME)?;
        let voxel_shader = shaders.get(VOXEL_SHADER_NAME)?;
        let planet_shader = shaders.get(PLANET_SHADER_NAME)?;
        let bloom_shader = shaders.get(BLOOM_SHADER_NAME)?;
        let modal_shader = shaders.get(MODAL_SHADER_NAME)?;

        let star_seed = seed ^ STAR_STREAM;
        let mut stars = StarfieldRenderer::new(device, &star_shader, HDR_FORMAT);
        stars.set_stars(device, &config.stars, star_seed);
        let mut voxel = VoxelSunRenderer::new(device, &voxel_shader, HDR_FORMAT);
        voxel.lighting = lighting(config);
        let planets = PlanetRenderer::new(device, &planet_shader, HDR_FORMAT);
        let bloom = BloomPipeline::new(
            device,
            &bloom_shader,
            surface_format,
            width,
            height,
            config.bloom,
        );
        let modal = ModalRenderer::new(device, &modal_shader, surface_format);
        info!(width, height, shaders = shaders.len(), "scene renderer ready");

        Ok(Self {
            depth: DepthBuffer::new(device, width, height),
            stars,
            voxel,
            planets,
            bloom,
            modal,
            clear: clear_color(&config.clear_color),
            config: config.clone(),
            star_seed,
        })
    }

    /// Take over edited render settings. The star shell is regenerated only
    /// when its options or the seed changed.
    pub fn apply_config(&mut self, gpu: &RenderContext, config: &RenderConfig, seed: u64) {
        let star_seed = seed ^ STAR_STREAM;
        if config.stars != self.config.stars || star_seed != self.star_seed {
            self.stars.set_stars(&gpu.device, &config.stars, star_seed);
            self.star_seed = star_seed;
        }
        if config.bloom != self.config.bloom {
            self.bloom.update_settings(&gpu.device, &gpu.queue, config.bloom);
        }
        if config.vsync != self.config.vsync {
            warn!("vsync changes apply on the next start");
        }
        self.voxel.lighting = lighting(config);
        self.clear = clear_color(&config.clear_color);
        self.config = config.clone();
        debug!("render settings applied");
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth.resize(device, width, height);
        self.bloom.resize(device, width, height);
    }

    /// Upload the frame, draw stars, sun and planets, bloom them onto the
    /// swapchain and finish with the modal when open.
    pub fn render(
        &mut self,
        gpu: &RenderContext,
        camera: &Camera,
        scene: &Scene,
        modal: Option<Rect>,
    ) -> Result<(), SurfaceError> {
        let view_proj = camera.view_projection_matrix();
        let (width, height) = gpu.size();
        let time = scene.sun().motion().time;
        let viewport = Vec2::new(width as f32, height as f32);

        self.stars.update(&gpu.queue, view_proj, viewport, time);
        self.voxel
            .update(&gpu.device, &gpu.queue, view_proj, camera.position, scene.sun());
        self.planets.update(
            &gpu.device,
            &gpu.queue,
            view_proj,
            camera.position,
            scene.planets().map(|(_, planet)| planet),
            time,
        );
        self.modal.update(&gpu.queue, modal, viewport);

        let frame = gpu.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("orrery-frame"),
            });
        {
            let mut pass =
                begin_scene_pass(&mut encoder, self.bloom.hdr_view(), &self.depth, self.clear);
            self.stars.render(&mut pass);
            self.voxel.render(&mut pass);
            self.planets.render(&mut pass);
        }
        self.bloom.execute(&mut encoder, &view);
        {
            let mut pass = begin_overlay_pass(&mut encoder, &view, &self.depth);
            self.modal.render(&mut pass);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_clear_color_parses_hex() {
        let c = clear_color("#ff0000");
        assert_eq!((c.r, c.g, c.b, c.a), (1.0, 0.0, 0.0, 1.0));
        assert_eq!(clear_color("not a colour"), SPACE_BLACK);
    }

    #[test]
    fn test_lighting_direction_is_normalized() {
        let config = RenderConfig {
            light_direction: [0.0, 0.0, 5.0],
            ..RenderConfig::default()
        };
        let light = lighting(&config);
        assert_eq!(light.direction, Vec3::Z);
        let degenerate = lighting(&RenderConfig {
            light_direction: [0.0; 3],
            ..RenderConfig::default()
        });
        assert_eq!(degenerate.direction, Vec3::Y);
    }

    #[test]
    fn test_scene_shaders_have_unique_names() {
        let mut names: Vec<&str> = SCENE_SHADERS.iter().map(|(name, _)| *name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SCENE_SHADERS.len());
    }

    #[test]
    fn test_shader_registration_is_one_time() {
        let Some(device) = create_test_device() else {
            return;
        };
        let mut library = ShaderLibrary::new();
        register_scene_shaders(&mut library, &device).unwrap();
        assert_eq!(library.len(), SCENE_SHADERS.len());
        assert!(library.contains(PLANET_SHADER_NAME));
        let again = register_scene_shaders(&mut library, &device);
        assert!(matches!(again, Err(ShaderError::AlreadyRegistered { .. })));
    }

    #[test]
    fn test_pipelines_build_from_library() {
        let Some(device) = create_test_device() else {
            return;
        };
        let mut library = ShaderLibrary::new();
        register_scene_shaders(&mut library, &device).unwrap();
        let surface_format = wgpu::TextureFormat::Bgra8UnormSrgb;
        let star_shader = library.get(STARFIELD_SHADER_NAME).unwrap();
        let voxel_shader = library.get(VOXEL_SHADER_NAME).unwrap();
        let planet_shader = library.get(PLANET_SHADER_NAME).unwrap();
        let bloom_shader = library.get(BLOOM_SHADER_NAME).unwrap();
        let modal_shader = library.get(MODAL_SHADER_NAME).unwrap();

        let mut stars = StarfieldRenderer::new(&device, &star_shader, HDR_FORMAT);
        stars.set_stars(&device, &RenderConfig::default().stars, 1);
        assert_eq!(stars.star_count(), 5000);
        let _voxel = VoxelSunRenderer::new(&device, &voxel_shader, HDR_FORMAT);
        let _planets = PlanetRenderer::new(&device, &planet_shader, HDR_FORMAT);
        let bloom = BloomPipeline::new(
            &device,
            &bloom_shader,
            surface_format,
            640,
            360,
            RenderConfig::default().bloom,
        );
        assert_eq!(bloom.settings().intensity, 1.5);
        let _modal = ModalRenderer::new(&device, &modal_shader, surface_format);
    }
}
