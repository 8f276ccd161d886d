//! Debug overlay rendered via egui on top of the firing range.
//!
//! Integration pattern: egui requires a three-phase render split because
//! `egui_wgpu::Renderer::render()` needs a `RenderPass<'static>`, while
//! `begin_render_pass` borrows the encoder. The phases are:
//!
//!   1. `prepare()` -- run egui UI logic, produce tessellated primitives
//!   2. `upload()`  -- upload textures and update GPU buffers (borrows encoder mutably)
//!   3. `paint()`   -- render into a new render pass with `forget_lifetime()`
//!   4. `cleanup()` -- free textures egui no longer references
//!
//! The overlay only builds its window when `visible` is true (toggled by F3),
//! but egui event handling is always active so the overlay can intercept
//! clicks when it is shown.

use gr_core::time::{Clock, LoopTiming};
use winit::window::Window;

#[derive(Debug, Clone, Default)]
pub struct OverlayStats {
    pub draw_calls: u32,
    pub sprite_count: u32,
    pub texture_count: u32,
    /// Textures replaced by placeholders
    pub fallback_textures: u32,
    /// Estimated GPU memory usage in megabytes
    pub memory_estimate_mb: f32,
    pub player_state: String,
    pub player_velocity: (f32, f32),
    pub player_health: i32,
    pub bullet_count: u32,
    pub shots_fired: u64,
    pub hits: u64,
    /// Whether the model is paused
    pub paused: bool,
}

#[derive(Debug, Clone, Default)]
pub struct OverlayActions {
    pub toggle_pause: bool,
    /// Advance one model tick while paused
    pub single_step: bool,
    pub reload_scene: bool,
}

/// Timing lines shown at the top of the overlay.
pub fn timing_lines<C: Clock + Clone>(timing: &LoopTiming<C>) -> Vec<String> {
    vec![
        format!("FPS: {:.1}", timing.smoothed_fps),
        format!("Frame time: {:.2} ms", timing.smoothed_frame_time_ms),
        format!(
            "Model: {} ms/tick, last dt {} ms",
            timing.model_interval_ms(),
            timing.last_dt_ms
        ),
        format!("Ticks: {}", timing.tick_count),
        format!("Frames: {}", timing.frame_count),
    ]
}

/// Game-state lines shown below the timing block.
pub fn stats_lines(stats: &OverlayStats) -> Vec<String> {
    vec![
        format!("Player: {}", stats.player_state),
        format!(
            "Velocity: ({:+.4}, {:+.4})",
            stats.player_velocity.0, stats.player_velocity.1
        ),
        format!("Health: {}", stats.player_health),
        format!("Bullets: {}", stats.bullet_count),
        format!("Shots: {} ({} hits)", stats.shots_fired, stats.hits),
        format!("Draw calls: {}", stats.draw_calls),
        format!("Sprites: {}", stats.sprite_count),
        format!(
            "Textures: {} ({} placeholder)",
            stats.texture_count, stats.fallback_textures
        ),
        format!("Memory: {:.1} MB", stats.memory_estimate_mb),
    ]
}

pub struct DebugOverlay {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub visible: bool,
}

impl DebugOverlay {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        window: &Window,
    ) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            visible: false,
        }
    }

    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.egui_winit_state.on_window_event(window, event);
        response.consumed
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        log::info!("Debug overlay: {}", if self.visible { "ON" } else { "OFF" });
    }

    pub fn prepare<C: Clock + Clone>(
        &mut self,
        window: &Window,
        timing: &LoopTiming<C>,
        stats: Option<OverlayStats>,
    ) -> (
        Vec<egui::ClippedPrimitive>,
        egui::TexturesDelta,
        OverlayActions,
    ) {
        let mut actions = OverlayActions::default();
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if !self.visible {
                return;
            }
            egui::Window::new("Debug")
                .default_pos([10.0, 10.0])
                .show(ctx, |ui| {
                    for line in timing_lines(timing) {
                        ui.label(line);
                    }
                    let Some(ref stats) = stats else {
                        return;
                    };
                    ui.separator();
                    for line in stats_lines(stats) {
                        ui.label(line);
                    }

                    ui.separator();
                    ui.horizontal(|ui| {
                        let pause_label = if stats.paused { "Resume" } else { "Pause" };
                        if ui.button(pause_label).clicked() {
                            actions.toggle_pause = true;
                        }
                        if stats.paused && ui.button("Step").clicked() {
                            actions.single_step = true;
                        }
                        if ui.button("Reload scene").clicked() {
                            actions.reload_scene = true;
                        }
                    });
                    if stats.paused {
                        ui.label("\u{23f8} PAUSED");
                    }
                });
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta, actions)
    }

    /// Upload textures and update buffers. Call before creating the egui render pass.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    /// Render into an existing render pass. Call after `upload()`.
    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    /// Free textures that egui no longer needs. Call after rendering.
    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}
