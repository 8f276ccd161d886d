//! Gunrun -- main loop and application entry point.
//!
//! Architecture: winit drives the event loop via `ApplicationHandler`. The game
//! runs two cadences off one loop (see `LoopTiming`):
//!
//!   1. every iteration (`about_to_wait`): measure dt, drain debounced key
//!      events, advance the world by one model tick
//!   2. when the frame timer fires: request a redraw
//!   3. sleep out the rest of the model interval
//!
//! `RedrawRequested` only reads the world: entities are queued into the sprite
//! batch, drawn, and the egui overlay is composited on top.
//!
//! Hot reload: the scene JSON is watched via mtime polling and the whole
//! world is rebuilt from it between ticks. A scene that fails to load or
//! validate is logged and the running world is kept.

mod animation;
#[cfg(test)]
mod replay;
mod scene;
mod world;

use std::path::PathBuf;
use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use animation::AnimationRegistry;
use gr_core::input::{InputState, Key};
use gr_core::time::{LoopTiming, SystemClock};
use gr_devtools::{DebugOverlay, OverlayStats};
use gr_platform::window::PlatformConfig;
use gr_render::{GpuContext, ScreenProjection, SpriteBatch, SpritePipeline, TextureCache};
use scene::{load_scene_from_path, validate_animation_refs, SceneFile, SceneWatcher};
use world::World;

const SCENE_PATH: &str = "assets/scenes/range.json";
const TEXTURE_ROOT: &str = "assets";
/// Sky blue behind the range.
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.117,
    g: 0.216,
    b: 1.0,
    a: 1.0,
};

/// All mutable game state lives here. Constructed lazily in
/// `ApplicationHandler::resumed` once the window and GPU surface exist.
struct EngineState {
    window: Arc<Window>,
    gpu: GpuContext,
    sprite_pipeline: SpritePipeline,
    sprite_batch: SpriteBatch,
    textures: TextureCache,
    debug_overlay: DebugOverlay,
    timing: LoopTiming<SystemClock>,
    input: InputState,

    // --- Hot-reloadable content -------------------------------------------------
    scene_path: PathBuf,
    scene_watcher: SceneWatcher,
    scene: SceneFile,
    world: World,

    paused: bool,
    single_step_requested: bool,
}

impl EngineState {
    fn new(window: Arc<Window>) -> Result<Self, String> {
        let gpu = GpuContext::new(window.clone())?;
        let sprite_pipeline = SpritePipeline::new(&gpu.device, gpu.surface_format);
        let debug_overlay = DebugOverlay::new(&gpu.device, gpu.surface_format, &window);
        let mut textures = TextureCache::new(TEXTURE_ROOT);

        let scene_path = PathBuf::from(SCENE_PATH);
        let scene_watcher = SceneWatcher::new(scene_path.clone());
        let (scene, world) = build_world(&scene_path, &gpu, &sprite_pipeline, &mut textures)
            .map_err(|err| {
                format!(
                    "Failed to load initial scene '{}': {}",
                    scene_path.display(),
                    err
                )
            })?;

        let projection = ScreenProjection::new(scene.world.screen_width, scene.world.screen_height);
        let sprite_batch = SpriteBatch::new(&gpu.device, &sprite_pipeline, projection);
        let timing = LoopTiming::new(SystemClock::new(), &scene.timing);

        log::info!(
            "Scene '{}' loaded: model {}ms/tick, frame {}ms",
            scene.scene_id,
            timing.model_interval_ms(),
            timing.frame_interval_ms()
        );

        Ok(Self {
            window,
            gpu,
            sprite_pipeline,
            sprite_batch,
            textures,
            debug_overlay,
            timing,
            input: InputState::new(),
            scene_path,
            scene_watcher,
            scene,
            world,
            paused: false,
            single_step_requested: false,
        })
    }

    fn reload_scene(&mut self, reason: &str) {
        match build_world(
            &self.scene_path,
            &self.gpu,
            &self.sprite_pipeline,
            &mut self.textures,
        ) {
            Ok((scene, world)) => {
                self.timing.apply(&scene.timing);
                self.scene = scene;
                self.world = world;
                let config = self.world.config();
                self.sprite_batch.set_projection(
                    &self.gpu.queue,
                    ScreenProjection::new(config.screen_width, config.screen_height),
                );
                log::info!(
                    "Scene reloaded ({reason}): {} ({})",
                    self.scene.scene_id,
                    self.scene.version
                );
            }
            Err(err) => {
                log::error!("Scene reload failed ({reason}): {err}");
            }
        }
    }

    /// One loop iteration. Returns false when the game should exit.
    fn tick(&mut self) -> bool {
        if self.input.is_just_pressed(Key::Escape) {
            return false;
        }
        if self.input.is_just_pressed(Key::F3) {
            self.debug_overlay.toggle();
        }
        if self.scene_watcher.should_reload() {
            self.reload_scene("file watcher");
        }

        let dt = self.timing.begin_tick();
        self.input.end_frame();

        // While paused, key events stay queued so the player state machine
        // sees every press and release once the model resumes.
        if !self.paused || self.single_step_requested {
            self.single_step_requested = false;
            let events = self.input.drain_events();
            self.world.update_model(dt, &events);
        }

        if self.timing.render_due() {
            self.window.request_redraw();
        }
        self.timing.end_tick();
        true
    }

    fn overlay_stats(&self) -> OverlayStats {
        let player = self.world.player();
        let body = player.body();
        let memory_bytes = self.textures.memory_bytes() + self.sprite_batch.buffer_bytes();
        OverlayStats {
            draw_calls: self.sprite_batch.draw_call_count() as u32,
            sprite_count: self.sprite_batch.sprite_count() as u32,
            texture_count: self.textures.len() as u32,
            fallback_textures: self.textures.fallback_count() as u32,
            memory_estimate_mb: memory_bytes as f32 / (1024.0 * 1024.0),
            player_state: player.state().to_string(),
            player_velocity: (body.velocity_x, body.velocity_y),
            player_health: player.health(),
            bullet_count: self.world.bullets().len() as u32,
            shots_fired: self.world.shots_fired(),
            hits: self.world.hits(),
            paused: self.paused,
        }
    }

    fn render(&mut self) {
        if self.gpu.size.0 == 0 || self.gpu.size.1 == 0 {
            return;
        }

        let Some((output, view)) = self.gpu.begin_frame() else {
            return;
        };

        self.world.compose_frame(&mut self.sprite_batch);
        let stats = self.overlay_stats();

        let (egui_primitives, egui_textures_delta, overlay_actions) =
            self.debug_overlay
                .prepare(&self.window, &self.timing, Some(stats));

        if overlay_actions.toggle_pause {
            self.paused = !self.paused;
            log::info!(
                "Simulation {}",
                if self.paused { "PAUSED" } else { "RESUMED" }
            );
        }
        if overlay_actions.single_step {
            self.single_step_requested = true;
        }
        if overlay_actions.reload_scene {
            self.reload_scene("overlay button");
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gpu.size.0, self.gpu.size.1],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.sprite_batch.render(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &view,
            &self.sprite_pipeline,
            &self.textures,
            CLEAR_COLOR,
        );

        self.debug_overlay.upload(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &egui_primitives,
            &egui_textures_delta,
            &screen_descriptor,
        );

        {
            let mut egui_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();

            self.debug_overlay
                .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
        }

        self.debug_overlay.cleanup(&egui_textures_delta);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

/// Load and validate the scene, its animation files, and build the world.
fn build_world(
    scene_path: &std::path::Path,
    gpu: &GpuContext,
    pipeline: &SpritePipeline,
    textures: &mut TextureCache,
) -> Result<(SceneFile, World), String> {
    let scene = load_scene_from_path(scene_path)?;
    let registry = AnimationRegistry::load_all(scene.animations.as_slice())?;
    validate_animation_refs(&scene, &registry)?;
    log::debug!("Registered {} animation files", registry.len());
    let mut loader = textures.loader(&gpu.device, &gpu.queue, pipeline);
    let world = World::from_scene(&scene, &registry, &mut loader)?;
    Ok((scene, world))
}

struct App {
    config: PlatformConfig,
    state: Option<EngineState>,
}

impl App {
    fn new() -> Self {
        Self {
            config: PlatformConfig::default(),
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window = gr_platform::window::create_window(event_loop, &self.config)
            .unwrap_or_else(|err| panic!("{err}"));
        let state = EngineState::new(window).unwrap_or_else(|err| panic!("Startup failed: {err}"));
        self.state = Some(state);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(state) = self.state.as_mut() {
            if !state.tick() {
                log::info!("Escape pressed, exiting.");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        let egui_consumed = state
            .debug_overlay
            .handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(game_key) = map_key(key_code) {
                        route_key(&mut state.input, game_key, event.state, egui_consumed);
                    }
                }
            }

            WindowEvent::RedrawRequested => state.render(),

            _ => {}
        }
    }
}

/// Presses egui claimed stay out of the game; releases always land so a key
/// never sticks in the held set.
fn route_key(input: &mut InputState, key: Key, element_state: ElementState, egui_consumed: bool) {
    match element_state {
        ElementState::Pressed if !egui_consumed => input.key_down(key),
        ElementState::Pressed => {}
        ElementState::Released => input.key_up(key),
    }
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::ArrowDown => Some(Key::Down),
        KeyCode::Space => Some(Key::Space),
        KeyCode::ControlLeft => Some(Key::LCtrl),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::F3 => Some(Key::F3),
        _ => None,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Gunrun starting...");

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app).expect("Event loop error");
}
