use anyhow::{anyhow, Context as AnyhowContext, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::types::{ContextOptions, GpuPowerPreference, Size};

/// Summary of the adapter a context ended up on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterProfile {
    pub name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
}

impl AdapterProfile {
    fn from_info(info: &wgpu::AdapterInfo) -> Self {
        Self {
            name: info.name.clone(),
            backend: info.backend,
            device_type: info.device_type,
        }
    }

    pub fn is_software(&self) -> bool {
        matches!(self.device_type, wgpu::DeviceType::Cpu)
    }
}

pub(crate) struct GpuContext {
    _instance: wgpu::Instance,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub profile: AdapterProfile,
    pub max_dimension: u32,
}

/// Swapchain half of a window-backed context.
pub(crate) struct SurfaceTarget {
    pub surface: wgpu::Surface<'static>,
    pub config: wgpu::SurfaceConfiguration,
}

impl SurfaceTarget {
    pub(crate) fn resize(&mut self, device: &wgpu::Device, size: Size) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(device, &self.config);
    }

    pub(crate) fn reconfigure(&self, device: &wgpu::Device) {
        self.surface.configure(device, &self.config);
    }
}

impl GpuContext {
    /// Acquires a device with no presentation surface.
    pub(crate) fn headless(options: &ContextOptions) -> Result<Self> {
        let instance = create_instance(options);
        let adapter = request_adapter(&instance, None, options)?;
        Self::finish(instance, adapter)
    }

    /// Acquires a device able to present to `target`.
    ///
    /// `target` must outlive the returned surface; callers keep the window
    /// alive alongside the context.
    pub(crate) fn with_surface<T>(
        target: &T,
        size: Size,
        options: &ContextOptions,
    ) -> Result<(Self, SurfaceTarget)>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let instance = create_instance(options);

        let window_handle = target
            .window_handle()
            .map_err(|err| anyhow!("failed to acquire window handle: {err}"))?;
        let display_handle = target
            .display_handle()
            .map_err(|err| anyhow!("failed to acquire display handle: {err}"))?;

        let surface = unsafe {
            instance.create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
                raw_display_handle: display_handle.as_raw(),
                raw_window_handle: window_handle.as_raw(),
            })
        }
        .context("failed to create rendering surface")?;

        let adapter = request_adapter(&instance, Some(&surface), options)?;
        let surface_caps = surface.get_capabilities(&adapter);
        let Some(&first_format) = surface_caps.formats.first() else {
            anyhow::bail!("surface reports no supported formats for this adapter");
        };
        // Stop colors are already gamma-encoded; an sRGB swapchain would
        // encode them twice.
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .unwrap_or_else(|| {
                tracing::warn!(
                    fallback = ?first_format,
                    "no non-sRGB surface format available; colors will be re-encoded"
                );
                first_format
            });
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let context = Self::finish(instance, adapter)?;
        let width = size.width.max(1);
        let height = size.height.max(1);
        context.check_dimensions(width, height)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&context.device, &config);
        tracing::debug!(?format, width, height, "configured window surface");

        Ok((context, SurfaceTarget { surface, config }))
    }

    fn finish(instance: wgpu::Instance, adapter: wgpu::Adapter) -> Result<Self> {
        let profile = AdapterProfile::from_info(&adapter.get_info());
        let limits = adapter.limits();
        tracing::debug!(
            name = %profile.name,
            backend = ?profile.backend,
            device_type = ?profile.device_type,
            is_software = profile.is_software(),
            "selected GPU adapter"
        );

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("grain device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits.clone(),
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::default(),
        }))
        .context("failed to create GPU device")?;

        Ok(Self {
            _instance: instance,
            device,
            queue,
            profile,
            max_dimension: limits.max_texture_dimension_2d,
        })
    }

    pub(crate) fn check_dimensions(&self, width: u32, height: u32) -> Result<()> {
        if width > self.max_dimension || height > self.max_dimension {
            anyhow::bail!(
                "GPU max texture dimension is {max}, requested surface is {width}x{height}",
                max = self.max_dimension
            );
        }
        Ok(())
    }
}

fn create_instance(options: &ContextOptions) -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: options.backends.to_wgpu(),
        flags: wgpu::InstanceFlags::default(),
        memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
        backend_options: wgpu::BackendOptions::default(),
    })
}

fn request_adapter(
    instance: &wgpu::Instance,
    surface: Option<&wgpu::Surface<'_>>,
    options: &ContextOptions,
) -> Result<wgpu::Adapter> {
    let power_preference = match options.power_preference {
        GpuPowerPreference::Low => wgpu::PowerPreference::LowPower,
        GpuPowerPreference::High => wgpu::PowerPreference::HighPerformance,
    };
    pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference,
        compatible_surface: surface,
        force_fallback_adapter: options.force_fallback_adapter,
    }))
    .context("failed to find a suitable GPU adapter")
}
