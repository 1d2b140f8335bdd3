use egui::epaint::Shadow;

use super::config::{DrawFlags, ViewMode};

pub struct DebugStats {
    pub fps: u32,
    pub frame_time_avg_ms: f32,
    pub resolution: (u32, u32),
    pub view_mode: ViewMode,

    pub seed: u64,
    pub segments: usize,
    pub leaves: usize,
    pub ring_points: usize,
    pub strip_indices: usize,
    pub joint_triangles: usize,
}

/// What the user asked for through the panel this frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct OverlayResponse {
    pub regrow: bool,
    pub toggle_view: bool,
}

pub struct DebugOverlay {
    pub visible: bool,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl DebugOverlay {
    pub fn new(
        window: &winit::window::Window,
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let egui_ctx = egui::Context::default();

        // Dark, semi-transparent, small monospace white font
        let mut visuals = egui::Visuals::dark();
        visuals.window_fill = egui::Color32::from_rgba_premultiplied(0, 0, 0, 180);
        visuals.window_stroke = egui::Stroke::NONE;
        visuals.window_shadow = Shadow::NONE;
        visuals.override_text_color = Some(egui::Color32::WHITE);
        egui_ctx.set_visuals(visuals);

        let mut style = (*egui_ctx.style()).clone();
        style.override_font_id = Some(egui::FontId::monospace(13.0));
        egui_ctx.set_style(style);

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            device,
            surface_format,
            None,  // drawn in its own pass, no depth
            1,     // msaa samples
            false, // no dithering
        );

        Self {
            visible: false,
            egui_ctx,
            egui_state,
            egui_renderer,
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn handle_window_event(
        &mut self,
        window: &winit::window::Window,
        event: &winit::event::WindowEvent,
    ) -> egui_winit::EventResponse {
        self.egui_state.on_window_event(window, event)
    }

    /// Render one egui frame on top of `view`. With `stats` present the F12
    /// panel is shown, and its checkboxes edit `flags` in place.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        window: &winit::window::Window,
        view: &wgpu::TextureView,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
        stats: Option<&DebugStats>,
        flags: &mut DrawFlags,
    ) -> OverlayResponse {
        let raw_input = self.egui_state.take_egui_input(window);
        let mut response = OverlayResponse::default();

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            let Some(stats) = stats else { return };

            egui::Area::new(egui::Id::new("debug_overlay"))
                .fixed_pos(egui::pos2(10.0, 10.0))
                .show(ctx, |ui| {
                    egui::Frame::none()
                        .fill(egui::Color32::from_rgba_premultiplied(0, 0, 0, 180))
                        .inner_margin(egui::Margin::same(8.0))
                        .rounding(4.0)
                        .show(ui, |ui: &mut egui::Ui| {
                            ui.label(format!(
                                "FPS: {}  ({:.2} ms)",
                                stats.fps, stats.frame_time_avg_ms
                            ));
                            ui.label(format!(
                                "Resolution: {} x {}",
                                stats.resolution.0, stats.resolution.1
                            ));
                            ui.label(format!("Seed: {}", stats.seed));
                            ui.label(format!(
                                "Segments: {}  Leaves: {}",
                                stats.segments, stats.leaves
                            ));
                            ui.label(format!("Ring points: {}", stats.ring_points));
                            ui.label(format!(
                                "Strip indices: {}  Joint tris: {}",
                                stats.strip_indices, stats.joint_triangles
                            ));

                            ui.separator();
                            ui.checkbox(&mut flags.skeleton, "F1 skeleton");
                            ui.checkbox(&mut flags.rings, "F2 rings");
                            ui.checkbox(&mut flags.stick_lines, "F3 stick lines");
                            ui.checkbox(&mut flags.stick_bark, "F4 stick bark");
                            ui.checkbox(&mut flags.joint_bark, "F5 joint bark");

                            ui.separator();
                            ui.horizontal(|ui| {
                                let mode = match stats.view_mode {
                                    ViewMode::Flat => "2D",
                                    ViewMode::Perspective => "3D",
                                };
                                if ui.button(format!("Tab view: {mode}")).clicked() {
                                    response.toggle_view = true;
                                }
                                if ui.button("R regrow").clicked() {
                                    response.regrow = true;
                                }
                            });
                        });
                });
        });

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let tris = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, &tris, screen_descriptor);

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.egui_renderer
                .render(&mut render_pass.forget_lifetime(), &tris, screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        response
    }
}
