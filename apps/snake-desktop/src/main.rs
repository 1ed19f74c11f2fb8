mod config;

use anyhow::{Context, Result};
use clap::Parser;
use config::AppConfig;
use egui::Context as EguiContext;
use snake_input::{Action, KeyBindings};
use snake_kernel::{GameLoop, SimEvent, SimState};
use snake_render::{RgbaImage, Scene};
use snake_render_wgpu::{SnakeRenderer, SnakeStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "snake-desktop", about = "Snake on a GPU-rendered grid")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// App config (YAML): game rules, window, textures
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// RNG seed for fruit placement; overrides the config file
    #[arg(short, long)]
    seed: Option<u64>,
}

/// Game state and everything the player can change with input.
struct AppState {
    game: GameLoop,
    bindings: KeyBindings,
    show_hud: bool,
    last_frame: Instant,
    quit_requested: bool,
}

impl AppState {
    fn new(game: GameLoop) -> Self {
        Self {
            game,
            bindings: KeyBindings::default(),
            show_hud: true,
            last_frame: Instant::now(),
            quit_requested: false,
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Steer(direction) => {
                self.game.steer(direction);
            }
            Action::TogglePause => {
                let state = self.game.toggle_pause();
                tracing::info!(?state, "pause toggled");
            }
            Action::Restart => self.game.restart(),
            Action::ToggleHud => self.show_hud = !self.show_hud,
            Action::Quit => self.quit_requested = true,
        }
    }

    fn update(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.game.update(dt);

        for event in self.game.drain_events() {
            match event {
                SimEvent::Died { cause, at } => {
                    tracing::info!(?cause, %at, score = self.game.simulation().score(), "game over");
                }
                SimEvent::Grew { length } => tracing::info!(length, "snake grew"),
                SimEvent::BoardFull => tracing::info!("board full"),
                other => tracing::trace!(event = ?other, "sim event"),
            }
        }
    }

    fn draw_hud(&mut self, ctx: &EguiContext) {
        if !self.show_hud {
            return;
        }
        let sim = self.game.simulation();
        let (score, length, ticks, state) = (sim.score(), sim.len(), sim.ticks(), sim.state());
        let waiting = sim.head().direction.is_none() && sim.pending_direction().is_none();

        egui::Area::new(egui::Id::new("hud"))
            .anchor(egui::Align2::LEFT_TOP, [8.0, 8.0])
            .show(ctx, |ui| {
                ui.label(
                    egui::RichText::new(format!("Score {score}   Length {length}"))
                        .strong()
                        .color(egui::Color32::WHITE),
                );
                ui.small(format!("tick {ticks}  seed {:#x}", self.game.seed()));
                if waiting {
                    ui.small("Arrows / WASD to start");
                }
            });

        let banner = match state {
            SimState::Running => None,
            SimState::Paused => Some(("Paused", "Space or P to resume")),
            SimState::Dead => Some(("Game over", "R to restart")),
        };
        if let Some((title, hint)) = banner {
            let mut restart = false;
            egui::Window::new(title)
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(format!("Score: {score}"));
                    ui.label(hint);
                    if state == SimState::Dead && ui.button("Restart").clicked() {
                        restart = true;
                    }
                });
            if restart {
                self.game.restart();
            }
        }
    }
}

struct GpuApp {
    config: AppConfig,
    state: AppState,
    window: Option<Arc<Window>>,
    surface: Option<wgpu::Surface<'static>>,
    device: Option<wgpu::Device>,
    queue: Option<wgpu::Queue>,
    surface_config: Option<wgpu::SurfaceConfiguration>,
    renderer: Option<SnakeRenderer>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
    startup_error: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(config: AppConfig, game: GameLoop) -> Self {
        Self {
            config,
            state: AppState::new(game),
            window: None,
            surface: None,
            device: None,
            queue: None,
            surface_config: None,
            renderer: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
            startup_error: None,
        }
    }

    /// Create the window, GPU device and every render resource.
    fn load(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = Arc::new(event_loop.create_window(attrs).context("creating window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .context("creating surface")?;
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no suitable GPU adapter")?;
        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("snake_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("creating device")?;

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(caps.formats.first())
            .copied()
            .context("surface reports no formats")?;
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let style = SnakeStyle {
            head: load_sprite(self.config.textures.head.as_deref(), "head", || {
                RgbaImage::head_sprite(64)
            }),
            fruit: load_sprite(self.config.textures.fruit.as_deref(), "fruit", || {
                RgbaImage::fruit_sprite(64)
            }),
            clear_color: self.config.window.clear_color,
        };
        let renderer = SnakeRenderer::new(
            &device,
            &queue,
            format,
            self.config.game.board_size(),
            surface_config.width,
            surface_config.height,
            &style,
        )?;

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, format, None, 1, false);

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            width = surface_config.width,
            height = surface_config.height,
            "GPU initialized"
        );

        self.window = Some(window);
        self.surface = Some(surface);
        self.device = Some(device);
        self.queue = Some(queue);
        self.surface_config = Some(surface_config);
        self.renderer = Some(renderer);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);
        self.state.last_frame = Instant::now();
        Ok(())
    }

    /// Release GPU resources before the device goes away.
    fn unload(&mut self) {
        if let Some(mut renderer) = self.renderer.take() {
            renderer.dispose();
        }
        self.egui_renderer = None;
        self.egui_winit = None;
        self.surface = None;
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        let (Some(surface), Some(device), Some(surface_config)) =
            (&self.surface, &self.device, &mut self.surface_config)
        else {
            return;
        };
        surface_config.width = size.width.max(1);
        surface_config.height = size.height.max(1);
        surface.configure(device, surface_config);
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(surface_config.width, surface_config.height);
        }
    }

    fn redraw(&mut self) {
        self.state.update();

        let (
            Some(window),
            Some(surface),
            Some(device),
            Some(queue),
            Some(surface_config),
            Some(renderer),
            Some(egui_winit),
            Some(egui_renderer),
        ) = (
            &self.window,
            &self.surface,
            &self.device,
            &self.queue,
            &self.surface_config,
            &self.renderer,
            &mut self.egui_winit,
            &mut self.egui_renderer,
        )
        else {
            return;
        };

        let output = match surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                surface.configure(device, surface_config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let scene = Scene::capture(self.state.game.simulation(), self.state.game.alpha());
        renderer.render(device, queue, &view, &scene);

        let raw_input = egui_winit.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            self.state.draw_hud(ctx);
        });
        egui_winit.handle_platform_output(window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [surface_config.width, surface_config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            egui_renderer.update_texture(device, queue, *id, image_delta);
        }
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("hud_encoder"),
        });
        egui_renderer.update_buffers(device, queue, &mut encoder, &paint_jobs, &screen_descriptor);
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("hud_pass"),
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
            egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            egui_renderer.free_texture(id);
        }

        output.present();
        window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.load(event_loop) {
            tracing::error!("startup failed: {e:#}");
            self.unload();
            self.startup_error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(egui_winit), Some(window)) = (&mut self.egui_winit, &self.window) {
            if egui_winit.on_window_event(window, &event).consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                self.unload();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => self.resize(size),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat,
                        ..
                    },
                ..
            } => {
                let Some(action) = self.state.bindings.action_for(key) else {
                    return;
                };
                if repeat && action.is_edge_triggered() {
                    return;
                }
                self.state.handle_action(action);
                if self.state.quit_requested {
                    self.unload();
                    event_loop.exit();
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.unload();
        tracing::info!(
            score = self.state.game.simulation().score(),
            "snake-desktop exiting"
        );
    }
}

/// Decode a sprite file, falling back to the built-in image on any failure.
fn load_sprite(path: Option<&Path>, what: &str, fallback: fn() -> RgbaImage) -> RgbaImage {
    let Some(path) = path else {
        return fallback();
    };
    match RgbaImage::open(path) {
        Ok(image) => {
            tracing::info!(what, path = %path.display(), "loaded sprite texture");
            image
        }
        Err(e) => {
            tracing::warn!(what, "{e}; using built-in sprite");
            fallback()
        }
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    let seed = cli.seed.or(config.game.seed).unwrap_or_else(clock_seed);
    let game = GameLoop::new(config.game.clone(), seed)?;
    tracing::info!(
        seed,
        board = config.game.board_size(),
        tick_interval = config.game.tick_interval,
        "snake-desktop starting"
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(config, game);
    event_loop.run_app(&mut app)?;

    match app.startup_error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
