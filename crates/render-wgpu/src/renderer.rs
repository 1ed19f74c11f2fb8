use crate::camera::GridCamera;
use crate::error::GpuError;
use crate::mesh::GpuMesh;
use crate::program::{BindState, ProgramDescriptor, ShaderProgram, uniform_layout};
use crate::shaders::{self, INSTANCE_LOCATION};
use crate::texture::Texture;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use snake_render::{
    BoardLines, FruitShape, HeadShape, Renderable, RgbaImage, Scene, SegmentShape, Sprite,
};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    tint: [f32; 4],
}

impl InstanceData {
    const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        INSTANCE_LOCATION => Float32x4,
        INSTANCE_LOCATION + 1 => Float32x4,
        INSTANCE_LOCATION + 2 => Float32x4,
        INSTANCE_LOCATION + 3 => Float32x4,
        INSTANCE_LOCATION + 4 => Float32x4,
    ];

    pub fn from_sprite(sprite: &Sprite) -> Self {
        let cols = sprite.transform.matrix().to_cols_array_2d();
        Self {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
            tint: sprite.tint,
        }
    }

    pub fn model(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&[self.model_0, self.model_1, self.model_2, self.model_3])
    }

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Per-frame instance list in draw order, with the instance index of each
/// component.
#[derive(Debug, Default, PartialEq)]
struct FrameInstances {
    data: Vec<InstanceData>,
    fruit: Option<u32>,
    body: std::ops::Range<u32>,
    head: u32,
}

impl FrameInstances {
    fn build(scene: &Scene) -> Self {
        let mut data = Vec::with_capacity(scene.sprite_count());
        let fruit = scene.fruit.as_ref().map(|f| {
            data.push(InstanceData::from_sprite(f));
            0
        });
        let body_start = data.len() as u32;
        data.extend(scene.body.iter().map(InstanceData::from_sprite));
        let body = body_start..data.len() as u32;
        let head = data.len() as u32;
        data.push(InstanceData::from_sprite(&scene.head));
        Self {
            data,
            fruit,
            body,
            head,
        }
    }
}

/// Draws a captured [`Scene`]: clear, board lines, fruit, one draw per body
/// segment, then the head.
pub struct SnakeRenderer {
    board_program: ShaderProgram,
    body_program: ShaderProgram,
    sprite_program: ShaderProgram,
    board_mesh: GpuMesh,
    segment_mesh: GpuMesh,
    head_mesh: GpuMesh,
    fruit_mesh: GpuMesh,
    head_texture: Texture,
    fruit_texture: Texture,
    uniform_buffer: Option<wgpu::Buffer>,
    uniform_bind_group: wgpu::BindGroup,
    instance_buffer: Option<wgpu::Buffer>,
    max_instances: u32,
    camera: GridCamera,
    clear_color: wgpu::Color,
}

/// Side length of the built-in head and fruit sprites.
const SPRITE_SIZE: u32 = 64;

/// Textures and colours a [`SnakeRenderer`] is built with.
pub struct SnakeStyle {
    pub head: RgbaImage,
    pub fruit: RgbaImage,
    pub clear_color: [f32; 4],
}

impl Default for SnakeStyle {
    fn default() -> Self {
        Self {
            head: RgbaImage::head_sprite(SPRITE_SIZE),
            fruit: RgbaImage::fruit_sprite(SPRITE_SIZE),
            clear_color: [0.0, 0.0, 1.0, 1.0],
        }
    }
}

impl SnakeRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        board_size: i32,
        width: u32,
        height: u32,
        style: &SnakeStyle,
    ) -> Result<Self, GpuError> {
        let camera = GridCamera::new(board_size, width, height);

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera_uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms {
                view_proj: camera.view_projection().to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let uniform_layout = uniform_layout(device);
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera_bind_group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        let texture_layout = Texture::bind_group_layout(device);

        let board_mesh = GpuMesh::new(device, &BoardLines::new(board_size))?;
        let segment_mesh = GpuMesh::new(device, &SegmentShape)?;
        let head_mesh = GpuMesh::new(device, &HeadShape)?;
        let fruit_mesh = GpuMesh::new(device, &FruitShape)?;

        let board_program = ShaderProgram::from_wgsl(
            device,
            &ProgramDescriptor {
                label: "board_program",
                vertex_buffers: &[board_mesh.vertex_buffer_layout()],
                bind_group_layouts: &[&uniform_layout],
                topology: BoardLines::new(board_size).topology(),
                target_format: surface_format,
                blend: Some(wgpu::BlendState::REPLACE),
                depth_format: None,
            },
            shaders::BOARD_SHADER,
        )?;
        let body_program = ShaderProgram::from_wgsl(
            device,
            &ProgramDescriptor {
                label: "body_program",
                vertex_buffers: &[segment_mesh.vertex_buffer_layout(), InstanceData::layout()],
                bind_group_layouts: &[&uniform_layout],
                topology: SegmentShape.topology(),
                target_format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                depth_format: None,
            },
            shaders::BODY_SHADER,
        )?;
        // Head and fruit share one vertex layout, so one program serves both.
        let sprite_program = ShaderProgram::from_wgsl(
            device,
            &ProgramDescriptor {
                label: "sprite_program",
                vertex_buffers: &[head_mesh.vertex_buffer_layout(), InstanceData::layout()],
                bind_group_layouts: &[&uniform_layout, &texture_layout],
                topology: HeadShape.topology(),
                target_format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                depth_format: None,
            },
            shaders::SPRITE_SHADER,
        )?;

        let head_texture = sprite_texture(device, queue, &texture_layout, "head_texture", &style.head, || {
            RgbaImage::head_sprite(SPRITE_SIZE)
        })?;
        let fruit_texture =
            sprite_texture(device, queue, &texture_layout, "fruit_texture", &style.fruit, || {
                RgbaImage::fruit_sprite(SPRITE_SIZE)
            })?;

        // Every cell occupied plus the fruit and one spare.
        let cells = u32::try_from(board_size.max(1))
            .ok()
            .and_then(|side| side.checked_mul(side))
            .ok_or(GpuError::BoardTooLarge(board_size))?;
        let max_instances = cells.checked_add(2).ok_or(GpuError::BoardTooLarge(board_size))?;
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: max_instances as u64 * std::mem::size_of::<InstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let [r, g, b, a] = style.clear_color.map(f64::from);
        tracing::info!(board_size, max_instances, "snake renderer ready");

        Ok(Self {
            board_program,
            body_program,
            sprite_program,
            board_mesh,
            segment_mesh,
            head_mesh,
            fruit_mesh,
            head_texture,
            fruit_texture,
            uniform_buffer: Some(uniform_buffer),
            uniform_bind_group,
            instance_buffer: Some(instance_buffer),
            max_instances,
            camera,
            clear_color: wgpu::Color { r, g, b, a },
        })
    }

    pub fn camera(&self) -> &GridCamera {
        &self.camera
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.resize(width, height);
        tracing::debug!(width, height, aspect = self.camera.aspect, "camera resized");
    }

    pub fn is_disposed(&self) -> bool {
        self.instance_buffer.is_none()
    }

    /// Render one frame into `view`.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        scene: &Scene,
    ) {
        let (Some(uniform_buffer), Some(instance_buffer)) =
            (&self.uniform_buffer, &self.instance_buffer)
        else {
            tracing::warn!("render on disposed renderer ignored");
            return;
        };

        queue.write_buffer(
            uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms {
                view_proj: self.camera.view_projection().to_cols_array_2d(),
            }),
        );

        let mut frame = FrameInstances::build(scene);
        if frame.data.len() > self.max_instances as usize {
            tracing::warn!(
                sprites = frame.data.len(),
                capacity = self.max_instances,
                "scene exceeds instance capacity, skipping frame"
            );
            frame = FrameInstances::default();
        }
        if !frame.data.is_empty() {
            queue.write_buffer(instance_buffer, 0, bytemuck::cast_slice(&frame.data));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("snake_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("snake_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            let mut binds = BindState::new();
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            if self.board_program.bind(&mut pass, &mut binds) {
                self.board_mesh.draw(&mut pass, 0..1);
            }

            if !frame.data.is_empty() {
                pass.set_vertex_buffer(1, instance_buffer.slice(..));

                if let Some(i) = frame.fruit {
                    if self.sprite_program.bind(&mut pass, &mut binds)
                        && self.fruit_texture.bind(&mut pass, 1)
                    {
                        self.fruit_mesh.draw(&mut pass, i..i + 1);
                    }
                }

                for i in frame.body.clone() {
                    if self.body_program.bind(&mut pass, &mut binds) {
                        self.segment_mesh.draw(&mut pass, i..i + 1);
                    }
                }

                if self.sprite_program.bind(&mut pass, &mut binds)
                    && self.head_texture.bind(&mut pass, 1)
                {
                    self.head_mesh.draw(&mut pass, frame.head..frame.head + 1);
                }
            }

            tracing::trace!(
                sprites = frame.data.len(),
                pipeline_switches = binds.switches(),
                "frame encoded"
            );
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Release every GPU resource. Calling it again is a no-op.
    pub fn dispose(&mut self) {
        if self.is_disposed() {
            tracing::debug!("renderer already disposed");
            return;
        }
        for program in [
            &mut self.board_program,
            &mut self.body_program,
            &mut self.sprite_program,
        ] {
            program.dispose();
        }
        for mesh in [
            &mut self.board_mesh,
            &mut self.segment_mesh,
            &mut self.head_mesh,
            &mut self.fruit_mesh,
        ] {
            mesh.dispose();
        }
        self.head_texture.dispose();
        self.fruit_texture.dispose();
        for buffer in [self.uniform_buffer.take(), self.instance_buffer.take()]
            .into_iter()
            .flatten()
        {
            buffer.destroy();
        }
        tracing::info!("snake renderer disposed");
    }
}

/// Upload a sprite, swapping in the built-in image when the device rejects its size.
fn sprite_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    label: &str,
    image: &RgbaImage,
    fallback: fn() -> RgbaImage,
) -> Result<Texture, GpuError> {
    match Texture::from_image(device, queue, layout, label, image) {
        Err(e @ GpuError::TextureTooLarge { .. }) => {
            tracing::warn!("{e}; using built-in sprite");
            Texture::from_image(device, queue, layout, label, &fallback())
        }
        other => other,
    }
}

impl Drop for SnakeRenderer {
    fn drop(&mut self) {
        if !self.is_disposed() {
            tracing::warn!("snake renderer dropped without dispose()");
            self.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;
    use snake_common::Direction;
    use snake_kernel::{GameConfig, SnakeSimulation};

    fn scene() -> Scene {
        let mut sim = SnakeSimulation::new(GameConfig::default(), 3).unwrap();
        sim.set_direction(Direction::North);
        sim.tick();
        Scene::capture(&sim, 0.0)
    }

    #[test]
    fn instances_follow_draw_order() {
        let scene = scene();
        let frame = FrameInstances::build(&scene);
        assert_eq!(frame.data.len(), scene.sprite_count());
        assert_eq!(frame.fruit, Some(0));
        assert_eq!(frame.body, 1..4);
        assert_eq!(frame.head, 4);
    }

    #[test]
    fn missing_fruit_shifts_body_down() {
        let mut scene = scene();
        scene.fruit = None;
        let frame = FrameInstances::build(&scene);
        assert_eq!(frame.fruit, None);
        assert_eq!(frame.body, 0..3);
        assert_eq!(frame.head, 3);
    }

    #[test]
    fn instance_matrix_places_sprite() {
        let scene = scene();
        let data = InstanceData::from_sprite(&scene.head);
        let corner = data.model() * Vec4::new(1.0, 1.0, 0.0, 1.0);
        // head on (5,6), centre (4.5, 5.5), facing north so unrotated
        assert!((corner.x - 5.0).abs() < 1e-5);
        assert!((corner.y - 6.0).abs() < 1e-5);
        assert_eq!(data.tint, scene.head.tint);
    }

    #[test]
    fn instance_layout_matches_struct() {
        let layout = InstanceData::layout();
        assert_eq!(layout.array_stride, 80);
        assert_eq!(layout.attributes[0].shader_location, INSTANCE_LOCATION);
        assert_eq!(layout.attributes[4].offset, 64);
    }

    #[test]
    fn built_in_sprites_fit_the_smallest_device_limit() {
        let max = wgpu::Limits::downlevel_webgl2_defaults().max_texture_dimension_2d;
        crate::texture::check_dimensions("head", SPRITE_SIZE, SPRITE_SIZE, max).unwrap();
        let oversized = RgbaImage::filled(max + 1, 1, [0; 4]);
        assert!(matches!(
            crate::texture::check_dimensions("head", oversized.width, oversized.height, max),
            Err(GpuError::TextureTooLarge { .. })
        ));
    }

    #[test]
    fn default_style_uses_procedural_sprites() {
        let style = SnakeStyle::default();
        assert_eq!((style.head.width, style.head.height), (64, 64));
        assert_eq!(style.clear_color, [0.0, 0.0, 1.0, 1.0]);
    }
}
