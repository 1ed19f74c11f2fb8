use crate::error::GpuError;
use snake_render::{BufferLayout, ScalarType, Topology};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_PROGRAM_ID: AtomicU32 = AtomicU32::new(1);

/// Process-unique handle of a [`ShaderProgram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(u32);

impl ProgramId {
    fn next() -> Self {
        Self(NEXT_PROGRAM_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Which program is currently bound on a render pass.
///
/// Threaded through the draw calls of one pass so consecutive draws with
/// the same program skip the pipeline switch.
#[derive(Debug, Default)]
pub struct BindState {
    program: Option<ProgramId>,
    switches: u32,
}

impl BindState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<ProgramId> {
        self.program
    }

    /// Number of pipeline switches issued so far.
    pub fn switches(&self) -> u32 {
        self.switches
    }

    /// Record `id` as bound. Returns `false` when it already was.
    pub fn should_bind(&mut self, id: ProgramId) -> bool {
        if self.program == Some(id) {
            return false;
        }
        self.program = Some(id);
        self.switches += 1;
        true
    }

    /// Forget the bound program, e.g. after a program was disposed.
    pub fn clear(&mut self) {
        self.program = None;
    }
}

/// Fixed-function state of a render pipeline, everything but the WGSL source.
pub struct ProgramDescriptor<'a> {
    pub label: &'a str,
    pub vertex_buffers: &'a [wgpu::VertexBufferLayout<'a>],
    pub bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    pub topology: Topology,
    pub target_format: wgpu::TextureFormat,
    pub blend: Option<wgpu::BlendState>,
    pub depth_format: Option<wgpu::TextureFormat>,
}

/// A compiled WGSL module and the render pipeline built from it.
pub struct ShaderProgram {
    id: ProgramId,
    label: String,
    pipeline: Option<wgpu::RenderPipeline>,
}

impl ShaderProgram {
    /// Compile `source` and build the pipeline. Validation errors are
    /// collected with an error scope instead of reaching the device's
    /// uncaptured error handler.
    pub fn from_wgsl(
        device: &wgpu::Device,
        desc: &ProgramDescriptor<'_>,
        source: &str,
    ) -> Result<Self, GpuError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(desc.label),
            bind_group_layouts: desc.bind_group_layouts,
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(desc.label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: desc.vertex_buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: desc.target_format,
                    blend: desc.blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: primitive_topology(desc.topology),
                ..Default::default()
            },
            depth_stencil: desc.depth_format.map(|format| wgpu::DepthStencilState {
                format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(GpuError::ShaderCompile {
                label: desc.label.to_owned(),
                message: err.to_string(),
            });
        }

        let id = ProgramId::next();
        tracing::debug!(label = desc.label, ?id, "shader program created");
        Ok(Self {
            id,
            label: desc.label.to_owned(),
            pipeline: Some(pipeline),
        })
    }

    /// Read WGSL from a file and compile it like [`from_wgsl`](Self::from_wgsl).
    pub fn from_path(
        device: &wgpu::Device,
        desc: &ProgramDescriptor<'_>,
        path: impl AsRef<Path>,
    ) -> Result<Self, GpuError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| GpuError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), bytes = source.len(), "read shader source");
        Self::from_wgsl(device, desc, &source)
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Set this program's pipeline on `pass` unless it is already bound.
    /// Returns whether the program is usable.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>, state: &mut BindState) -> bool {
        let Some(pipeline) = &self.pipeline else {
            tracing::warn!(label = %self.label, "bind on disposed shader program ignored");
            return false;
        };
        if state.should_bind(self.id) {
            pass.set_pipeline(pipeline);
        }
        true
    }

    pub fn is_disposed(&self) -> bool {
        self.pipeline.is_none()
    }

    /// Release the pipeline. Calling it again is a no-op.
    pub fn dispose(&mut self) {
        if self.pipeline.take().is_some() {
            tracing::debug!(label = %self.label, "shader program disposed");
        } else {
            tracing::debug!(label = %self.label, "shader program already disposed");
        }
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        if !self.is_disposed() {
            tracing::warn!(label = %self.label, "shader program dropped without dispose()");
            self.dispose();
        }
    }
}

/// Layout of the camera uniform at group 0, binding 0.
pub fn uniform_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("camera_bind_group_layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

pub fn primitive_topology(topology: Topology) -> wgpu::PrimitiveTopology {
    match topology {
        Topology::Triangles => wgpu::PrimitiveTopology::TriangleList,
        Topology::Lines => wgpu::PrimitiveTopology::LineList,
    }
}

/// Translate a [`BufferLayout`] into wgpu attributes at consecutive shader
/// locations starting from `first_location`.
pub fn vertex_attributes(
    layout: &BufferLayout,
    first_location: u32,
) -> Result<Vec<wgpu::VertexAttribute>, GpuError> {
    layout
        .offsets()
        .zip(first_location..)
        .map(|((offset, attr), shader_location)| {
            Ok(wgpu::VertexAttribute {
                format: vertex_format(attr.scalar, attr.count, attr.normalized)?,
                offset: offset as u64,
                shader_location,
            })
        })
        .collect()
}

fn vertex_format(scalar: ScalarType, count: u32, normalized: bool) -> Result<wgpu::VertexFormat, GpuError> {
    use wgpu::VertexFormat as F;
    let format = match (scalar, count, normalized) {
        (ScalarType::F32, 1, _) => F::Float32,
        (ScalarType::F32, 2, _) => F::Float32x2,
        (ScalarType::F32, 3, _) => F::Float32x3,
        (ScalarType::F32, 4, _) => F::Float32x4,
        (ScalarType::U32, 1, false) => F::Uint32,
        (ScalarType::U32, 2, false) => F::Uint32x2,
        (ScalarType::U32, 3, false) => F::Uint32x3,
        (ScalarType::U32, 4, false) => F::Uint32x4,
        (ScalarType::I32, 1, false) => F::Sint32,
        (ScalarType::I32, 2, false) => F::Sint32x2,
        (ScalarType::I32, 3, false) => F::Sint32x3,
        (ScalarType::I32, 4, false) => F::Sint32x4,
        (ScalarType::U8, 2, false) => F::Uint8x2,
        (ScalarType::U8, 4, false) => F::Uint8x4,
        (ScalarType::U8, 2, true) => F::Unorm8x2,
        (ScalarType::U8, 4, true) => F::Unorm8x4,
        _ => {
            return Err(GpuError::UnsupportedAttribute {
                scalar,
                count,
                normalized,
            });
        }
    };
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_state_skips_rebinding_same_program() {
        let (a, b) = (ProgramId::next(), ProgramId::next());
        let mut state = BindState::new();
        assert!(state.should_bind(a));
        assert!(!state.should_bind(a));
        assert!(state.should_bind(b));
        assert!(state.should_bind(a));
        assert_eq!(state.switches(), 3);
        assert_eq!(state.current(), Some(a));
        state.clear();
        assert!(state.should_bind(a));
    }

    #[test]
    fn program_ids_are_unique() {
        assert_ne!(ProgramId::next(), ProgramId::next());
    }

    #[test]
    fn attributes_follow_layout_offsets() {
        let layout = BufferLayout::new()
            .with(ScalarType::F32, 2)
            .with(ScalarType::F32, 4);
        let attrs = vertex_attributes(&layout, 0).unwrap();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].format, wgpu::VertexFormat::Float32x2);
        assert_eq!(attrs[1].offset, 8);
        assert_eq!(attrs[1].shader_location, 1);
    }

    #[test]
    fn attributes_start_at_requested_location() {
        let layout = BufferLayout::new().with(ScalarType::F32, 3);
        let attrs = vertex_attributes(&layout, 4).unwrap();
        assert_eq!(attrs[0].shader_location, 4);
    }

    #[test]
    fn normalized_bytes_map_to_unorm() {
        let mut layout = BufferLayout::new();
        layout.push(ScalarType::U8, 4, true);
        let attrs = vertex_attributes(&layout, 0).unwrap();
        assert_eq!(attrs[0].format, wgpu::VertexFormat::Unorm8x4);
    }

    #[test]
    fn unsupported_attribute_is_an_error() {
        let layout = BufferLayout::new().with(ScalarType::U8, 3);
        let err = vertex_attributes(&layout, 0).unwrap_err();
        assert!(matches!(err, GpuError::UnsupportedAttribute { count: 3, .. }));
    }

    #[test]
    fn topology_maps_to_wgpu() {
        assert_eq!(
            primitive_topology(Topology::Lines),
            wgpu::PrimitiveTopology::LineList
        );
        assert_eq!(
            primitive_topology(Topology::Triangles),
            wgpu::PrimitiveTopology::TriangleList
        );
    }
}
