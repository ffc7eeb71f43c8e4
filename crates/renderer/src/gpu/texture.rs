use wgpu::util::{DeviceExt, TextureDataOrder};

use crate::logo::LogoImage;

/// GPU copy of the logo plus the sampler the fragment shader reads it with.
pub(crate) struct LogoTexture {
    pub _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl LogoTexture {
    /// Fully transparent 1x1 stand-in used until the logo is decoded, or when
    /// no logo was configured.
    pub fn placeholder(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::upload(device, queue, "placeholder logo texture", 1, 1, &[0, 0, 0, 0])
    }

    /// Uploads the decoded logo. Rows are already bottom-first, so texture
    /// row zero lines up with `v = 0` in the shader.
    pub fn from_image(device: &wgpu::Device, queue: &wgpu::Queue, logo: &LogoImage) -> Self {
        Self::upload(
            device,
            queue,
            "logo texture",
            logo.width(),
            logo.height(),
            logo.pixels(),
        )
    }

    fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        width: u32,
        height: u32,
        data: &[u8],
    ) -> Self {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            TextureDataOrder::LayerMajor,
            data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("logo sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            _texture: texture,
            view,
            sampler,
        }
    }
}
