use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use clap::Parser;
use glam::Vec3;
use snake_common::Transform;
use snake_render::{BufferLayout, Renderable, RgbaImage, ScalarType};
use snake_render_wgpu::{
    BindState, DEPTH_FORMAT, FlyCamera, GpuMesh, ProgramDescriptor, ShaderProgram, Texture,
    depth_view, uniform_layout,
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

const DEFAULT_SHADER: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/sandbox.wgsl");

#[derive(Parser)]
#[command(name = "render-sandbox", about = "Textured quad with a fly camera")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// WGSL file with `vs_main` / `fs_main` entry points
    #[arg(long)]
    shader: Option<PathBuf>,

    /// Image for the quad; a checkerboard is used when absent or unreadable
    #[arg(long)]
    texture: Option<PathBuf>,
}

/// Unit quad in the XY plane with texture coordinates.
struct TexturedQuad;

impl Renderable for TexturedQuad {
    fn label(&self) -> &'static str {
        "textured_quad"
    }

    fn vertex_data(&self) -> Vec<f32> {
        #[rustfmt::skip]
        let v = vec![
            -0.5, -0.5, 0.0, 0.0, 1.0,
             0.5, -0.5, 0.0, 1.0, 1.0,
             0.5,  0.5, 0.0, 1.0, 0.0,
            -0.5,  0.5, 0.0, 0.0, 0.0,
        ];
        v
    }

    fn index_data(&self) -> Vec<u32> {
        vec![0, 1, 2, 0, 2, 3]
    }

    fn attribute_layout(&self) -> BufferLayout {
        BufferLayout::new()
            .with(ScalarType::F32, 3)
            .with(ScalarType::F32, 2)
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
}

/// Camera and quad, driven by held keys.
struct SandboxState {
    camera: FlyCamera,
    quad: Transform,
    keys_held: HashSet<KeyCode>,
    last_frame: Instant,
    spin_speed: f32,
}

impl SandboxState {
    fn new() -> Self {
        Self {
            camera: FlyCamera::default(),
            quad: Transform::default(),
            keys_held: HashSet::new(),
            last_frame: Instant::now(),
            spin_speed: 1.5,
        }
    }

    fn axis(&self, positive: KeyCode, negative: KeyCode) -> f32 {
        let held = |k: KeyCode| self.keys_held.contains(&k) as i32 as f32;
        held(positive) - held(negative)
    }

    fn update(&mut self, dt: f32) {
        let input = Vec3::new(
            self.axis(KeyCode::KeyD, KeyCode::KeyA),
            self.axis(KeyCode::Space, KeyCode::ShiftLeft),
            self.axis(KeyCode::KeyW, KeyCode::KeyS),
        );
        self.camera.fly(input, dt);

        let look = 1.2 * dt;
        self.camera.look(
            self.axis(KeyCode::ArrowRight, KeyCode::ArrowLeft) * look,
            self.axis(KeyCode::ArrowUp, KeyCode::ArrowDown) * look,
        );

        let spin = self.axis(KeyCode::KeyQ, KeyCode::KeyE);
        if spin != 0.0 {
            self.quad.rotate_axis(Vec3::Y, spin * self.spin_speed * dt);
        }
    }

    fn uniforms(&self) -> Uniforms {
        Uniforms {
            view_proj: self.camera.view_projection().to_cols_array_2d(),
            model: self.quad.matrix().to_cols_array_2d(),
        }
    }
}

/// GPU resources of the sandbox scene.
struct SandboxGpu {
    program: ShaderProgram,
    mesh: GpuMesh,
    texture: Texture,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    depth: wgpu::TextureView,
}

impl SandboxGpu {
    fn dispose(&mut self) {
        self.program.dispose();
        self.mesh.dispose();
        self.texture.dispose();
        self.uniform_buffer.destroy();
    }
}

struct SandboxApp {
    cli: Cli,
    state: SandboxState,
    window: Option<Arc<Window>>,
    surface: Option<wgpu::Surface<'static>>,
    device: Option<wgpu::Device>,
    queue: Option<wgpu::Queue>,
    surface_config: Option<wgpu::SurfaceConfiguration>,
    gpu: Option<SandboxGpu>,
    startup_error: Option<anyhow::Error>,
}

impl SandboxApp {
    fn new(cli: Cli) -> Self {
        Self {
            cli,
            state: SandboxState::new(),
            window: None,
            surface: None,
            device: None,
            queue: None,
            surface_config: None,
            gpu: None,
            startup_error: None,
        }
    }

    fn load(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("render sandbox")
            .with_inner_size(PhysicalSize::new(800u32, 600));
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
                label: Some("sandbox_device"),
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
        self.state
            .camera
            .resize(surface_config.width, surface_config.height);

        let image = match &self.cli.texture {
            Some(path) => RgbaImage::open(path).unwrap_or_else(|e| {
                tracing::warn!("{e}; using checkerboard");
                RgbaImage::checker(256, 8)
            }),
            None => RgbaImage::checker(256, 8),
        };

        let uniform_layout = uniform_layout(&device);
        let texture_layout = Texture::bind_group_layout(&device);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sandbox_uniforms"),
            contents: bytemuck::bytes_of(&self.state.uniforms()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sandbox_uniform_bind_group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let mesh = GpuMesh::new(&device, &TexturedQuad)?;
        let shader_path = self
            .cli
            .shader
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SHADER));
        let program = ShaderProgram::from_path(
            &device,
            &ProgramDescriptor {
                label: "sandbox_program",
                vertex_buffers: &[mesh.vertex_buffer_layout()],
                bind_group_layouts: &[&uniform_layout, &texture_layout],
                topology: TexturedQuad.topology(),
                target_format: format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                depth_format: Some(DEPTH_FORMAT),
            },
            &shader_path,
        )?;
        let texture = match Texture::from_image(&device, &queue, &texture_layout, "sandbox_texture", &image) {
            Ok(texture) => texture,
            Err(e) => {
                tracing::warn!("{e}; using checkerboard");
                Texture::from_image(
                    &device,
                    &queue,
                    &texture_layout,
                    "sandbox_texture",
                    &RgbaImage::checker(256, 8),
                )?
            }
        };
        let depth = depth_view(&device, surface_config.width, surface_config.height);

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            shader = %shader_path.display(),
            "sandbox ready"
        );

        self.gpu = Some(SandboxGpu {
            program,
            mesh,
            texture,
            uniform_buffer,
            uniform_bind_group,
            depth,
        });
        self.window = Some(window);
        self.surface = Some(surface);
        self.device = Some(device);
        self.queue = Some(queue);
        self.surface_config = Some(surface_config);
        self.state.last_frame = Instant::now();
        Ok(())
    }

    fn unload(&mut self) {
        if let Some(mut gpu) = self.gpu.take() {
            gpu.dispose();
        }
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
        self.state
            .camera
            .resize(surface_config.width, surface_config.height);
        if let Some(gpu) = &mut self.gpu {
            gpu.depth = depth_view(device, surface_config.width, surface_config.height);
        }
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = (now - self.state.last_frame).as_secs_f32().min(0.1);
        self.state.last_frame = now;
        self.state.update(dt);

        let (Some(window), Some(surface), Some(device), Some(queue), Some(surface_config), Some(gpu)) = (
            &self.window,
            &self.surface,
            &self.device,
            &self.queue,
            &self.surface_config,
            &self.gpu,
        ) else {
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

        queue.write_buffer(&gpu.uniform_buffer, 0, bytemuck::bytes_of(&self.state.uniforms()));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("sandbox_encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sandbox_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.08,
                            g: 0.08,
                            b: 0.1,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &gpu.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            let mut binds = BindState::new();
            if gpu.program.bind(&mut pass, &mut binds) {
                pass.set_bind_group(0, &gpu.uniform_bind_group, &[]);
                if gpu.texture.bind(&mut pass, 1) {
                    gpu.mesh.draw(&mut pass, 0..1);
                }
            }
        }
        queue.submit(std::iter::once(encoder.finish()));
        output.present();
        window.request_redraw();
    }
}

impl ApplicationHandler for SandboxApp {
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
                        state,
                        ..
                    },
                ..
            } => {
                if key == KeyCode::Escape && state == ElementState::Pressed {
                    self.unload();
                    event_loop.exit();
                } else if state == ElementState::Pressed {
                    self.state.keys_held.insert(key);
                } else {
                    self.state.keys_held.remove(&key);
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
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = SandboxApp::new(cli);
    event_loop.run_app(&mut app)?;

    match app.startup_error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
