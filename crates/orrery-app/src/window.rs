//! Window creation and event handling via winit.
//!
//! [`AppState`] implements winit's [`ApplicationHandler`]: it owns the scene,
//! forwards pointer and keyboard input to it, orbits the camera on drags,
//! picks up edits to `config.ron` and renders once per redraw.

use std::sync::Arc;

use glam::{Vec2, Vec3};
use orrery_config::Config;
use orrery_render::{
    Camera, OrbitControls, RenderContext, SurfaceError, init_render_context_blocking,
};
use orrery_scene::{ClickOutcome, ModalHost, Scene, Section};
use tracing::{debug, error, info, instrument, warn};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::frame_clock::{FrameClock, FrameTick};
use crate::reload::ConfigWatch;
use crate::render::SceneRenderer;

/// Pointer travel in physical pixels below which a press and release is a click.
pub const CLICK_SLOP: f32 = 3.0;

pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ))
}

/// Keyboard commands understood by the orrery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// Dismiss the modal.
    Dismiss,
    /// Menu entry: open a section.
    Open(Section),
    /// Menu close.
    Close,
}

impl KeyCommand {
    pub fn from_key(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::Escape => Some(Self::Dismiss),
            KeyCode::Digit1 | KeyCode::Numpad1 => Some(Self::Open(Section::Profile)),
            KeyCode::Digit2 | KeyCode::Numpad2 => Some(Self::Open(Section::Tech)),
            KeyCode::Digit3 | KeyCode::Numpad3 => Some(Self::Open(Section::Experience)),
            KeyCode::Digit0 | KeyCode::Numpad0 => Some(Self::Close),
            _ => None,
        }
    }
}

pub struct AppState {
    config: Config,
    window: Option<Arc<Window>>,
    gpu: Option<RenderContext>,
    renderer: Option<SceneRenderer>,
    camera: Camera,
    orbit: OrbitControls,
    scene: Scene,
    modal: ModalHost,
    clock: FrameClock,
    watch: Option<ConfigWatch>,
    /// Last cursor position in physical pixels.
    cursor: Vec2,
    /// Where the left button went down, while it is held.
    press: Option<Vec2>,
    dragging: bool,
    /// Physical surface size; tracks resizes before the GPU exists.
    viewport: Vec2,
}

fn scene_camera(scene: &Scene, viewport: Vec2) -> (Camera, OrbitControls) {
    let options = scene.options();
    let mut camera = Camera::looking_at(
        Vec3::from_array(options.camera_position),
        Vec3::from_array(options.camera_target),
        options.camera_fov_deg,
    );
    camera.set_aspect_ratio(viewport.x, viewport.y);
    let orbit =
        OrbitControls::from_camera(&camera, options.camera_damping, options.camera_rotate_speed);
    (camera, orbit)
}

impl AppState {
    pub fn with_config(config: Config) -> Self {
        let scene = Scene::new(config.sun.clone(), &config.planets, config.scene.clone());
        let viewport = Vec2::new(config.window.width as f32, config.window.height as f32);
        let (camera, orbit) = scene_camera(&scene, viewport);
        Self {
            config,
            window: None,
            gpu: None,
            renderer: None,
            camera,
            orbit,
            scene,
            modal: ModalHost::default(),
            clock: FrameClock::new(),
            watch: None,
            cursor: Vec2::ZERO,
            press: None,
            dragging: false,
            viewport,
        }
    }

    /// Poll `watch` for edits to the config file while running.
    pub fn with_watch(mut self, watch: ConfigWatch) -> Self {
        self.watch = Some(watch);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn handle_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport = Vec2::new(width as f32, height as f32);
        self.camera.set_aspect_ratio(self.viewport.x, self.viewport.y);
        if let Some(gpu) = &mut self.gpu {
            gpu.resize(width, height);
            if let Some(renderer) = &mut self.renderer {
                renderer.resize(&gpu.device, width, height);
            }
        }
        info!("Window resized to {}x{}", width, height);
    }

    /// Track the cursor. Holding the left button past [`CLICK_SLOP`] turns
    /// the press into a camera drag, unless the modal covers the scene.
    pub fn handle_cursor(&mut self, position: Vec2) {
        let delta = position - self.cursor;
        self.cursor = position;
        let Some(origin) = self.press else {
            return;
        };
        if self.scene.selection().get().is_some() {
            return;
        }
        if !self.dragging && position.distance(origin) > CLICK_SLOP {
            self.dragging = true;
            debug!("camera drag started");
        }
        if self.dragging {
            self.orbit.drag(delta, self.viewport.y);
        }
    }

    pub fn handle_press(&mut self) {
        self.press = Some(self.cursor);
        self.dragging = false;
    }

    /// A release that ends a press without a drag is a click.
    pub fn handle_release(&mut self) {
        if self.press.take().is_some() && !self.dragging {
            self.handle_click();
        }
        self.dragging = false;
    }

    pub fn handle_key(&mut self, command: KeyCommand) {
        let selection = self.scene.selection_mut();
        match command {
            KeyCommand::Dismiss => {
                self.modal.handle_escape(selection);
            }
            KeyCommand::Open(section) => selection.open(section),
            KeyCommand::Close => selection.close(),
        }
    }

    /// Click: the modal sees it first, then the scene.
    pub fn handle_click(&mut self) {
        let outcome = self
            .modal
            .handle_click(self.scene.selection_mut(), self.viewport, self.cursor);
        if outcome != ClickOutcome::PassThrough {
            return;
        }
        let ray = self.camera.cursor_ray(self.cursor, self.viewport);
        let target = self.scene.click(&ray, self.clock.elapsed());
        debug!(?target, x = self.cursor.x, y = self.cursor.y, "pointer press");
    }

    /// Advance the scene by one frame of wall time.
    pub fn step(&mut self) {
        let tick = self.clock.tick();
        self.advance(tick);
    }

    fn advance(&mut self, tick: FrameTick) {
        if let Some(config) = self.watch.as_mut().and_then(|w| w.poll(tick.elapsed)) {
            self.apply_config(config);
        }
        self.scene.update(tick.dt, tick.elapsed);
        if self.orbit.update(tick.dt) {
            self.orbit.apply(&mut self.camera);
        }
    }

    /// Switch to edited settings. The scene is rebuilt, keeping the open
    /// section, only when the sun, planets or scene options changed; render
    /// settings go straight to the renderer.
    pub fn apply_config(&mut self, config: Config) {
        let scene_changed = config.sun != self.config.sun
            || config.planets != self.config.planets
            || config.scene != self.config.scene;
        if scene_changed {
            let open = self.scene.selection().get();
            // An unseeded sun keeps its current layout.
            let mut sun = config.sun.clone();
            sun.seed = sun.seed.or(Some(self.scene.sun().seed()));
            self.scene = Scene::new(sun, &config.planets, config.scene.clone());
            self.scene.selection_mut().set(open);
            if config.scene != self.config.scene {
                (self.camera, self.orbit) = scene_camera(&self.scene, self.viewport);
            }
            info!(seed = self.scene.sun().seed(), "scene rebuilt from config");
        }
        if let (Some(gpu), Some(renderer)) = (&self.gpu, &mut self.renderer) {
            renderer.apply_config(gpu, &config.render, self.scene.sun().seed());
        }
        if config.window.title != self.config.window.title {
            if let Some(window) = &self.window {
                window.set_title(&config.window.title);
            }
        }
        if config.window.width != self.config.window.width
            || config.window.height != self.config.window.height
            || config.debug != self.config.debug
        {
            debug!("window size and log filter changes apply on the next start");
        }
        self.config = config;
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.step();
        let panel = self.modal.layout(self.scene.selection(), self.viewport);
        let (Some(gpu), Some(renderer)) = (&mut self.gpu, &mut self.renderer) else {
            return;
        };
        match renderer.render(gpu, &self.camera, &self.scene, panel) {
            Ok(()) => {}
            Err(SurfaceError::Lost) => {
                let (w, h) = (self.viewport.x as u32, self.viewport.y as u32);
                gpu.resize(w, h);
            }
            Err(SurfaceError::OutOfMemory) => {
                error!("GPU out of memory");
                event_loop.exit();
            }
            Err(SurfaceError::Timeout) => {
                warn!("Surface timeout, skipping frame");
            }
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window = match event_loop.create_window(window_attributes_from_config(&self.config)) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Window creation failed: {e}");
                event_loop.exit();
                return;
            }
        };

        let gpu = match init_render_context_blocking(window.clone(), self.config.render.vsync) {
            Ok(gpu) => gpu,
            Err(e) => {
                error!("GPU initialization failed: {e}");
                event_loop.exit();
                return;
            }
        };
        match SceneRenderer::new(&gpu, &self.config.render, self.scene.sun().seed()) {
            Ok(renderer) => self.renderer = Some(renderer),
            Err(e) => {
                error!("Renderer initialization failed: {e}");
                event_loop.exit();
                return;
            }
        }
        let (width, height) = gpu.size();
        self.gpu = Some(gpu);
        self.handle_resize(width, height);

        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => self.handle_resize(size.width, size.height),
            WindowEvent::CursorMoved { position, .. } => {
                self.handle_cursor(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => self.handle_press(),
                ElementState::Released => self.handle_release(),
            },
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(command) = KeyCommand::from_key(code) {
                    self.handle_key(command);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Run the orrery until the window closes, re-reading settings through
/// `watch` when given.
#[instrument(skip(config, watch))]
pub fn run(
    config: Config,
    watch: Option<ConfigWatch>,
) -> Result<(), winit::error::EventLoopError> {
    let event_loop = EventLoop::new()?;
    let mut app = AppState::with_config(config);
    if let Some(watch) = watch {
        app = app.with_watch(watch);
    }
    event_loop.run_app(&mut app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use orrery_config::CliArgs;
    use orrery_planet::Variant;
    use orrery_scene::modal_rect;
    use std::time::Duration;

    fn app() -> AppState {
        let mut config = Config::default();
        config.sun.seed = Some(5);
        config.sun.columns_phi = 12;
        config.sun.columns_theta = 6;
        // Between the default camera and the sun, so nothing occludes it.
        config.planets.experience.phase_offset = Some((-11.0f32).atan2(-15.5));
        AppState::with_config(config)
    }

    #[test]
    fn test_keys_map_to_commands() {
        assert_eq!(KeyCommand::from_key(KeyCode::Escape), Some(KeyCommand::Dismiss));
        assert_eq!(
            KeyCommand::from_key(KeyCode::Digit2),
            Some(KeyCommand::Open(Section::Tech))
        );
        assert_eq!(KeyCommand::from_key(KeyCode::Numpad0), Some(KeyCommand::Close));
        assert_eq!(KeyCommand::from_key(KeyCode::KeyW), None);
    }

    #[test]
    fn test_menu_keys_drive_selection() {
        let mut app = app();
        app.handle_key(KeyCommand::Open(Section::Experience));
        assert_eq!(app.scene().selection().get(), Some(Section::Experience));
        app.handle_key(KeyCommand::Close);
        assert_eq!(app.scene().selection().get(), None);
        app.handle_key(KeyCommand::Open(Section::Profile));
        app.handle_key(KeyCommand::Dismiss);
        assert_eq!(app.scene().selection().get(), None);
    }

    #[test]
    fn test_backdrop_click_closes_panel_click_keeps() {
        let mut app = app();
        app.handle_key(KeyCommand::Open(Section::Tech));
        let viewport = app.viewport();

        app.handle_cursor(viewport * 0.5);
        app.handle_click();
        assert_eq!(app.scene().selection().get(), Some(Section::Tech));

        let rect = modal_rect(viewport, Vec2::new(960.0, 640.0));
        app.handle_cursor(rect.min - Vec2::splat(4.0));
        app.handle_click();
        assert_eq!(app.scene().selection().get(), None);
    }

    #[test]
    fn test_click_on_planet_opens_section() {
        let mut app = app();
        let position = app.scene().planet(Section::Experience).state().position;
        let clip = app.camera().view_projection_matrix().project_point3(position);
        let viewport = app.viewport();
        let cursor = Vec2::new(
            (clip.x + 1.0) * 0.5 * viewport.x,
            (1.0 - clip.y) * 0.5 * viewport.y,
        );
        app.handle_cursor(cursor);
        app.handle_click();
        assert_eq!(app.scene().selection().get(), Some(Section::Experience));
    }

    fn frames(app: &mut AppState, count: usize) {
        for _ in 0..count {
            let tick = app.clock.advance(Duration::from_millis(250));
            app.advance(tick);
        }
    }

    fn planet_cursor(app: &AppState, section: Section) -> Vec2 {
        let position = app.scene().planet(section).state().position;
        let clip = app.camera().view_projection_matrix().project_point3(position);
        let viewport = app.viewport();
        Vec2::new(
            (clip.x + 1.0) * 0.5 * viewport.x,
            (1.0 - clip.y) * 0.5 * viewport.y,
        )
    }

    #[test]
    fn test_press_and_release_in_place_clicks() {
        let mut app = app();
        let cursor = planet_cursor(&app, Section::Experience);
        app.handle_cursor(cursor);
        app.handle_press();
        app.handle_cursor(cursor + Vec2::new(1.0, 1.0));
        assert_eq!(app.scene().selection().get(), None);
        app.handle_release();
        assert_eq!(app.scene().selection().get(), Some(Section::Experience));
    }

    #[test]
    fn test_drag_orbits_camera_without_clicking() {
        let mut app = app();
        let start = app.camera().position;
        let radius = start.length();
        let cursor = planet_cursor(&app, Section::Experience);
        app.handle_cursor(cursor);
        app.handle_press();
        app.handle_cursor(cursor + Vec2::new(40.0, 0.0));
        app.handle_cursor(cursor + Vec2::new(120.0, 10.0));
        app.handle_release();
        assert_eq!(app.scene().selection().get(), None);

        frames(&mut app, 4);
        let moved = app.camera().position;
        assert!((moved - start).length() > 0.5);
        assert!((moved.length() - radius).abs() < 1e-3);
        assert_eq!(app.camera().target, Vec3::ZERO);
    }

    #[test]
    fn test_open_modal_blocks_camera_drag() {
        let mut app = app();
        app.handle_key(KeyCommand::Open(Section::Tech));
        let start = app.camera().position;
        let center = app.viewport() * 0.5;
        app.handle_cursor(center);
        app.handle_press();
        app.handle_cursor(center + Vec2::new(200.0, 0.0));
        app.handle_release();
        frames(&mut app, 4);
        assert_eq!(app.camera().position, start);
        assert_eq!(app.scene().selection().get(), Some(Section::Tech));
    }

    #[test]
    fn test_config_edit_rebuilds_scene_and_keeps_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.sun.columns_phi = 12;
        config.sun.columns_theta = 6;
        config.save(dir.path()).unwrap();
        let watch = ConfigWatch::new(dir.path().to_path_buf(), CliArgs::default(), config.clone());
        let mut app = AppState::with_config(watch.effective()).with_watch(watch);
        let seed = app.scene().sun().seed();
        app.handle_key(KeyCommand::Open(Section::Tech));

        config.planets.tech.variant = Variant::Wire;
        config.render.bloom.intensity = 0.5;
        config.save(dir.path()).unwrap();
        frames(&mut app, 8);

        assert_eq!(app.config().planets.tech.variant, Variant::Wire);
        assert_eq!(app.config().render.bloom.intensity, 0.5);
        assert_eq!(app.scene().planet(Section::Tech).options().variant, Variant::Wire);
        assert_eq!(app.scene().selection().get(), Some(Section::Tech));
        assert_eq!(app.scene().sun().seed(), seed);
    }

    #[test]
    fn test_camera_settings_reset_the_orbit() {
        let mut app = app();
        let mut config = app.config().clone();
        config.scene.camera_fov_deg = 35.0;
        config.scene.camera_position = [0.0, 10.0, 30.0];
        app.apply_config(config);
        assert!((app.camera().fov_y - 35f32.to_radians()).abs() < 1e-6);
        assert_eq!(app.camera().position, Vec3::new(0.0, 10.0, 30.0));
        frames(&mut app, 2);
        assert!((app.camera().position - Vec3::new(0.0, 10.0, 30.0)).length() < 1e-4);
    }

    #[test]
    fn test_resize_updates_aspect_and_ignores_zero() {
        let mut app = app();
        app.handle_resize(1920, 1080);
        assert_eq!(app.viewport(), Vec2::new(1920.0, 1080.0));
        assert!((app.camera().aspect_ratio - 1920.0 / 1080.0).abs() < 1e-6);
        app.handle_resize(0, 0);
        assert_eq!(app.viewport(), Vec2::new(1920.0, 1080.0));
    }
}
