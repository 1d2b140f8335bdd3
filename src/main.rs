// Procedural bark tree viewer.
// Grows a random binary tree, wraps it in bark and shows it on a turntable.
//
// Usage: bark_trees [config.json]
//
// Keys:
//   F1..F5  toggle skeleton / rings / stick lines / stick bark / joint bark
//   F12     stats panel
//   Tab     2D / 3D view
//   R       regrow with a fresh seed
//   Esc     quit

mod engine;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use log::{error, info, warn};
use winit::{
    event::{ElementState, Event as WinitEvent, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use engine::camera::TurntableCamera;
use engine::debug_overlay::{DebugOverlay, DebugStats};
use engine::input::InputState;
use engine::renderer::Renderer;
use engine::{DrawFlags, Tree, TreeBuilder, TreeConfig, TreeError, TreeResult};

// ============================================================================
// APPLICATION STATE
// ============================================================================

struct State {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    renderer: Renderer,
    overlay: DebugOverlay,

    tree_config: TreeConfig,
    tree: Tree,
    flags: DrawFlags,
    camera: TurntableCamera,
    input: InputState,

    last_update: Instant,
    // FPS bookkeeping, refreshed once per second
    frame_count: u32,
    last_fps_update: Instant,
    fps: u32,
    frame_time_avg_ms: f32,
}

impl State {
    async fn new(window: Arc<Window>, tree_config: TreeConfig) -> TreeResult<Self> {
        let tree = TreeBuilder::new(tree_config.clone())?.build();
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| TreeError::Gpu(format!("surface creation failed: {e}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| TreeError::Gpu("no compatible adapter".into()))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .map_err(|e| TreeError::Gpu(format!("device request failed: {e}")))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| TreeError::Gpu("surface reports no formats".into()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = Renderer::new(&device, surface_format, (config.width, config.height), &tree);
        let overlay = DebugOverlay::new(&window, &device, surface_format);
        let camera = TurntableCamera::new(tree_config.zoom_scale, tree_config.view_mode);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            renderer,
            overlay,
            flags: tree_config.draw,
            tree_config,
            tree,
            camera,
            input: InputState::new(),
            last_update: Instant::now(),
            frame_count: 0,
            last_fps_update: Instant::now(),
            fps: 0,
            frame_time_avg_ms: 0.0,
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.renderer.resize(&self.device, (new_size.width, new_size.height));
        }
    }

    /// Regrow with a fresh seed, keeping every other setting.
    fn regrow(&mut self) {
        let config = TreeConfig { seed: None, ..self.tree_config.clone() };
        match TreeBuilder::new(config) {
            Ok(builder) => {
                self.tree = builder.build();
                self.renderer.set_tree(&self.device, &self.tree);
            }
            Err(e) => warn!("Regrow skipped: {e}"),
        }
    }

    fn toggle_view(&mut self) {
        self.camera.mode = self.camera.mode.toggled();
        info!("View mode: {:?}", self.camera.mode);
    }

    fn update(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_update).as_secs_f32();
        self.last_update = now;

        let toggles = [
            (KeyCode::F1, &mut self.flags.skeleton),
            (KeyCode::F2, &mut self.flags.rings),
            (KeyCode::F3, &mut self.flags.stick_lines),
            (KeyCode::F4, &mut self.flags.stick_bark),
            (KeyCode::F5, &mut self.flags.joint_bark),
        ];
        for (key, flag) in toggles {
            if self.input.was_key_pressed(key) {
                *flag = !*flag;
            }
        }
        if self.input.was_key_pressed(KeyCode::F12) {
            self.overlay.toggle();
        }
        if self.input.was_key_pressed(KeyCode::Tab) {
            self.toggle_view();
        }
        if self.input.was_key_pressed(KeyCode::KeyR) {
            self.regrow();
        }
        self.input.end_frame();

        self.camera.update(dt);

        self.frame_count += 1;
        let since = (now - self.last_fps_update).as_secs_f32();
        if since >= 1.0 {
            self.fps = self.frame_count;
            self.frame_time_avg_ms = since * 1000.0 / self.frame_count as f32;
            self.frame_count = 0;
            self.last_fps_update = now;
        }
    }

    fn stats(&self) -> DebugStats {
        DebugStats {
            fps: self.fps,
            frame_time_avg_ms: self.frame_time_avg_ms,
            resolution: (self.size.width, self.size.height),
            view_mode: self.camera.mode,
            seed: self.tree.seed,
            segments: self.tree.skeleton.segment_count(),
            leaves: self.tree.skeleton.leaves.len(),
            ring_points: self.tree.rings.len(),
            strip_indices: self.tree.stick_bark.index_count(),
            joint_triangles: self.tree.joint_triangle_count(),
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let aspect = self.config.width as f32 / self.config.height as f32;
        let matrices = self.camera.matrices(aspect);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.renderer
            .draw_frame(&self.queue, &mut encoder, &view, &matrices, self.flags);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: self.window.scale_factor() as f32,
        };
        let stats = self.overlay.visible.then(|| self.stats());
        let response = self.overlay.render(
            &self.device,
            &self.queue,
            &mut encoder,
            &self.window,
            &view,
            &screen_descriptor,
            stats.as_ref(),
            &mut self.flags,
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        if response.toggle_view {
            self.toggle_view();
        }
        if response.regrow {
            self.regrow();
        }
        Ok(())
    }
}

// ============================================================================
// MAIN
// ============================================================================

fn load_config() -> TreeResult<TreeConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading config from {path}");
            TreeConfig::load(Path::new(&path))
        }
        None => Ok(TreeConfig::default()),
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let tree_config = load_config()?;

    let event_loop = EventLoop::new()?;

    let window_attributes = Window::default_attributes()
        .with_title("Bark Trees")
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

    let window = Arc::new(event_loop.create_window(window_attributes)?);

    let mut state = pollster::block_on(State::new(window.clone(), tree_config))?;

    event_loop.run(move |event, control_flow| {
        match event {
            WinitEvent::WindowEvent {
                ref event,
                window_id,
            } if window_id == window.id() => {
                let egui_response = state.overlay.handle_window_event(&window, event);
                if !egui_response.consumed {
                    state.input.process_event(event);
                }

                match event {
                    WindowEvent::CloseRequested => control_flow.exit(),
                    WindowEvent::KeyboardInput { event: key_event, .. }
                        if key_event.state == ElementState::Pressed
                            && key_event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
                    {
                        control_flow.exit()
                    }
                    WindowEvent::Resized(physical_size) => {
                        state.resize(*physical_size);
                    }
                    WindowEvent::RedrawRequested => {
                        state.update();
                        match state.render() {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                                state.resize(state.size)
                            }
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                error!("Out of GPU memory");
                                control_flow.exit()
                            }
                            Err(e) => warn!("{e:?}"),
                        }
                    }
                    _ => {}
                }
            }
            WinitEvent::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        error!("{e}");
        std::process::exit(1);
    }
}
