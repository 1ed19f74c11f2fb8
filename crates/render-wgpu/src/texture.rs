use crate::error::GpuError;
use snake_render::RgbaImage;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Sampled 2D texture with its bind group (texture at binding 0, sampler at 1).
pub struct Texture {
    label: String,
    width: u32,
    height: u32,
    texture: Option<wgpu::Texture>,
    bind_group: Option<wgpu::BindGroup>,
}

impl Texture {
    /// Layout matching the group-1 declarations of the sprite shaders.
    pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        })
    }

    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        label: &str,
        image: &RgbaImage,
    ) -> Result<Self, GpuError> {
        check_dimensions(
            label,
            image.width,
            image.height,
            device.limits().max_texture_dimension_2d,
        )?;
        let size = wgpu::Extent3d {
            width: image.width.max(1),
            height: image.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        if image.width > 0 && image.height > 0 {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &image.pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * image.width),
                    rows_per_image: Some(image.height),
                },
                size,
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        tracing::debug!(label, width = image.width, height = image.height, "texture uploaded");
        Ok(Self {
            label: label.to_owned(),
            width: image.width,
            height: image.height,
            texture: Some(texture),
            bind_group: Some(bind_group),
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Set the bind group at `index`. Returns whether the texture is usable.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>, index: u32) -> bool {
        match &self.bind_group {
            Some(group) => {
                pass.set_bind_group(index, group, &[]);
                true
            }
            None => {
                tracing::warn!(label = %self.label, "bind on disposed texture ignored");
                false
            }
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.texture.is_none()
    }

    /// Destroy the GPU texture. Calling it again is a no-op.
    pub fn dispose(&mut self) {
        self.bind_group = None;
        match self.texture.take() {
            Some(texture) => {
                texture.destroy();
                tracing::debug!(label = %self.label, "texture disposed");
            }
            None => tracing::debug!(label = %self.label, "texture already disposed"),
        }
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        if !self.is_disposed() {
            tracing::warn!(label = %self.label, "texture dropped without dispose()");
            self.dispose();
        }
    }
}

/// Images wider or taller than `max` cannot be uploaded as one 2D texture.
pub fn check_dimensions(label: &str, width: u32, height: u32, max: u32) -> Result<(), GpuError> {
    if width > max || height > max {
        return Err(GpuError::TextureTooLarge {
            label: label.to_owned(),
            width,
            height,
            max,
        });
    }
    Ok(())
}

/// Depth attachment sized to the surface.
pub fn depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_up_to_the_limit_pass() {
        check_dimensions("head", 64, 64, 8192).unwrap();
        check_dimensions("head", 8192, 1, 8192).unwrap();
    }

    #[test]
    fn oversized_image_is_rejected() {
        let err = check_dimensions("head", 10_000, 10_000, 8192).unwrap_err();
        assert!(matches!(
            err,
            GpuError::TextureTooLarge { width: 10_000, max: 8192, .. }
        ));
        assert!(err.to_string().contains("`head`"));
    }

    #[test]
    fn one_oversized_side_is_enough() {
        assert!(check_dimensions("fruit", 16, 8193, 8192).is_err());
    }
}
