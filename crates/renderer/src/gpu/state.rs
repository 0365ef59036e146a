use std::sync::mpsc;

use anyhow::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, trace, warn};

use crate::error::RenderError;
use crate::types::{ContextOptions, Size};

use super::context::{AdapterProfile, GpuContext, SurfaceTarget};
use super::noise::{NoiseBinding, NoiseKey};
use super::pipeline::{GrainPipeline, PipelineLayouts};
use super::uniforms::GrainUniforms;

const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const BYTES_PER_PIXEL: u32 = 4;

enum RenderTarget {
    Surface(SurfaceTarget),
    Offscreen(OffscreenTarget),
}

struct OffscreenTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: Size,
}

impl OffscreenTarget {
    fn new(device: &wgpu::Device, size: Size) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen color target"),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OFFSCREEN_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            size,
        }
    }
}

/// Every GPU resource one renderer owns. Built all at once; dropping it
/// releases everything.
pub(crate) struct GpuState {
    context: GpuContext,
    target: RenderTarget,
    layouts: PipelineLayouts,
    pipeline: GrainPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    noise: NoiseBinding,
}

impl GpuState {
    pub(crate) fn headless(size: Size, options: &ContextOptions, noise: NoiseKey) -> Result<Self> {
        let context = GpuContext::headless(options)?;
        context.check_dimensions(size.width, size.height)?;
        let target = RenderTarget::Offscreen(OffscreenTarget::new(&context.device, size));
        Ok(Self::assemble(context, target, OFFSCREEN_FORMAT, noise))
    }

    pub(crate) fn for_surface<T>(
        window: &T,
        size: Size,
        options: &ContextOptions,
        noise: NoiseKey,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let (context, surface) = GpuContext::with_surface(window, size, options)?;
        let format = surface.config.format;
        Ok(Self::assemble(
            context,
            RenderTarget::Surface(surface),
            format,
            noise,
        ))
    }

    fn assemble(
        context: GpuContext,
        target: RenderTarget,
        format: wgpu::TextureFormat,
        noise: NoiseKey,
    ) -> Self {
        let layouts = PipelineLayouts::new(&context.device);
        let pipeline = GrainPipeline::new(&context.device, &layouts, format);

        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("grain uniform buffer"),
            size: std::mem::size_of::<GrainUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("grain uniform bind group"),
                layout: &layouts.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

        let noise = NoiseBinding::new(
            &context.device,
            &context.queue,
            &layouts.noise_layout,
            noise,
        );

        Self {
            context,
            target,
            layouts,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            noise,
        }
    }

    pub(crate) fn adapter_profile(&self) -> &AdapterProfile {
        &self.context.profile
    }

    pub(crate) fn is_offscreen(&self) -> bool {
        matches!(self.target, RenderTarget::Offscreen(_))
    }

    pub(crate) fn size(&self) -> Size {
        match &self.target {
            RenderTarget::Surface(surface) => {
                Size::new(surface.config.width, surface.config.height)
            }
            RenderTarget::Offscreen(offscreen) => offscreen.size,
        }
    }

    pub(crate) fn resize(&mut self, size: Size) {
        if size == self.size() || size.width == 0 || size.height == 0 {
            return;
        }
        if let Err(err) = self.context.check_dimensions(size.width, size.height) {
            warn!(error = %err, "ignoring resize beyond GPU limits");
            return;
        }
        match &mut self.target {
            RenderTarget::Surface(surface) => surface.resize(&self.context.device, size),
            RenderTarget::Offscreen(offscreen) => {
                *offscreen = OffscreenTarget::new(&self.context.device, size);
            }
        }
        debug!(%size, "resized render target");
    }

    /// Swaps in a new noise texture when the key changed.
    pub(crate) fn ensure_noise(&mut self, key: NoiseKey) {
        if self.noise.key == key {
            return;
        }
        self.noise = NoiseBinding::new(
            &self.context.device,
            &self.context.queue,
            &self.layouts.noise_layout,
            key,
        );
    }

    pub(crate) fn draw(&mut self, uniforms: &GrainUniforms) -> Result<(), RenderError> {
        self.context
            .queue
            .write_buffer(&self.uniform_buffer, 0, uniforms.as_bytes());

        match &self.target {
            RenderTarget::Surface(surface) => {
                let frame = match surface.surface.get_current_texture() {
                    Ok(frame) => frame,
                    Err(err) => {
                        if matches!(err, wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) {
                            surface.reconfigure(&self.context.device);
                        }
                        return Err(err.into());
                    }
                };
                let view = frame
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                self.submit(&view);
                frame.present();
            }
            RenderTarget::Offscreen(offscreen) => self.submit(&offscreen.view),
        }
        trace!("frame submitted");
        Ok(())
    }

    fn submit(&self, view: &wgpu::TextureView) {
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("grain encoder"),
                });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("grain pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&self.pipeline.pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_bind_group(1, &self.noise.bind_group, &[]);
            render_pass.draw(0..4, 0..1);
        }
        self.context.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Copies the offscreen target back into host memory.
    pub(crate) fn read_back(&self) -> Result<image::RgbaImage, RenderError> {
        let RenderTarget::Offscreen(offscreen) = &self.target else {
            return Err(RenderError::Readback(
                "window surfaces cannot be read back".to_string(),
            ));
        };
        let Size { width, height } = offscreen.size;
        let unpadded = width * BYTES_PER_PIXEL;
        let bytes_per_row = unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

        let buffer = self.context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback buffer"),
            size: u64::from(bytes_per_row) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("readback encoder"),
                });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &offscreen.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.context.queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.context
            .device
            .poll(wgpu::PollType::Wait)
            .map_err(|err| RenderError::Readback(err.to_string()))?;
        receiver
            .recv()
            .map_err(|_| RenderError::Readback("map callback never ran".to_string()))?
            .map_err(|err| RenderError::Readback(err.to_string()))?;

        let mut pixels = Vec::with_capacity((unpadded * height) as usize);
        {
            let data = slice.get_mapped_range();
            for row in data.chunks_exact(bytes_per_row as usize) {
                pixels.extend_from_slice(&row[..unpadded as usize]);
            }
        }
        buffer.unmap();

        image::RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
            RenderError::Readback("readback produced a short pixel buffer".to_string())
        })
    }
}
