use crate::error::GpuError;
use crate::program::{primitive_topology, vertex_attributes};
use snake_render::Renderable;
use std::ops::Range;
use wgpu::util::DeviceExt;

/// Vertex and index buffers uploaded from a [`Renderable`] shape.
pub struct GpuMesh {
    label: &'static str,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    index_count: u32,
    stride: u64,
    attributes: Vec<wgpu::VertexAttribute>,
    topology: wgpu::PrimitiveTopology,
}

impl GpuMesh {
    pub fn new(device: &wgpu::Device, shape: &dyn Renderable) -> Result<Self, GpuError> {
        let label = shape.label();
        let layout = shape.attribute_layout();
        let attributes = vertex_attributes(&layout, 0)?;
        let vertices = shape.vertex_data();
        let indices = shape.index_data();

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        tracing::debug!(
            label,
            vertices = shape.vertex_count(),
            indices = indices.len(),
            "mesh uploaded"
        );

        Ok(Self {
            label,
            vertex_buffer: Some(vertex_buffer),
            index_buffer: Some(index_buffer),
            index_count: indices.len() as u32,
            stride: layout.stride() as u64,
            attributes,
            topology: primitive_topology(shape.topology()),
        })
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn topology(&self) -> wgpu::PrimitiveTopology {
        self.topology
    }

    /// Per-vertex layout for slot 0 of a pipeline drawing this mesh.
    pub fn vertex_buffer_layout(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.attributes,
        }
    }

    /// Bind the buffers to slot 0 and issue one indexed draw.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, instances: Range<u32>) {
        let (Some(vertices), Some(indices)) = (&self.vertex_buffer, &self.index_buffer) else {
            tracing::warn!(label = self.label, "draw on disposed mesh ignored");
            return;
        };
        pass.set_vertex_buffer(0, vertices.slice(..));
        pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, instances);
    }

    pub fn is_disposed(&self) -> bool {
        self.vertex_buffer.is_none()
    }

    /// Destroy the GPU buffers. Calling it again is a no-op.
    pub fn dispose(&mut self) {
        let vertices = self.vertex_buffer.take();
        let indices = self.index_buffer.take();
        if vertices.is_none() && indices.is_none() {
            tracing::debug!(label = self.label, "mesh already disposed");
            return;
        }
        for buffer in vertices.iter().chain(indices.iter()) {
            buffer.destroy();
        }
        tracing::debug!(label = self.label, "mesh disposed");
    }
}

impl Drop for GpuMesh {
    fn drop(&mut self) {
        if !self.is_disposed() {
            tracing::warn!(label = self.label, "mesh dropped without dispose()");
            self.dispose();
        }
    }
}
