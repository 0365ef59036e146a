use wgpu::util::{DeviceExt, TextureDataOrder};

use crate::noise::{generate, NoiseSeed};

/// Identity of the uploaded noise texture. A different key means the
/// texture is regenerated and the bind group rebuilt.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NoiseKey {
    pub seed: NoiseSeed,
    pub size: u32,
    pub pixelated: bool,
}

pub(crate) struct NoiseBinding {
    pub key: NoiseKey,
    pub bind_group: wgpu::BindGroup,
    _texture: wgpu::Texture,
}

impl NoiseBinding {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        key: NoiseKey,
    ) -> Self {
        let image = generate(&key.seed, key.size);
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("noise texture"),
                size: wgpu::Extent3d {
                    width: image.size(),
                    height: image.size(),
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
            image.as_rgba(),
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let filter = if key.pixelated {
            wgpu::FilterMode::Nearest
        } else {
            wgpu::FilterMode::Linear
        };
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("noise sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("noise bind group"),
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

        tracing::debug!(
            seed = %key.seed,
            size = key.size,
            pixelated = key.pixelated,
            "uploaded noise texture"
        );

        Self {
            key,
            bind_group,
            _texture: texture,
        }
    }
}
