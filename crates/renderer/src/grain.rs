use std::sync::Arc;

use tracing::{debug, trace, warn};
use winit::window::Window;

use crate::error::{ContextUnavailableError, RenderError};
use crate::frame::{frame_parameters, FrameParameters};
use crate::gpu::{AdapterProfile, GpuState, GrainUniforms, NoiseKey};
use crate::runtime::{BoxedTimeSource, SystemTimeSource, TimeSource};
use crate::types::{Callbacks, GradientSource, ReadyCallback, RenderOptions, Size};

/// Draws a grainy gradient onto one target.
///
/// A renderer whose GPU context could not be acquired is *idle*: it keeps
/// accepting options and geometry, but every draw is a no-op.
pub struct GrainRenderer {
    gpu: Option<GpuState>,
    source: GradientSource,
    options: RenderOptions,
    size: Size,
    clock: BoxedTimeSource,
    on_ready: Option<ReadyCallback>,
    // Declared after `gpu` so the surface is dropped before its window.
    _window: Option<Arc<Window>>,
}

impl GrainRenderer {
    /// Renders into an offscreen texture of the scaled output size.
    pub fn headless(
        size: Size,
        source: impl Into<GradientSource>,
        options: RenderOptions,
        callbacks: Callbacks,
    ) -> Self {
        let options = options.normalized();
        let output = size.scaled(options.resolution_scale);
        let gpu = GpuState::headless(output, &options.context, noise_key(&options));
        Self::from_parts(gpu, size, source.into(), options, callbacks, None)
    }

    /// Renders into the swapchain of `window`, which the renderer keeps alive.
    pub fn for_window(
        window: Arc<Window>,
        source: impl Into<GradientSource>,
        options: RenderOptions,
        callbacks: Callbacks,
    ) -> Self {
        let options = options.normalized();
        let inner = window.inner_size();
        let size = Size::new(inner.width, inner.height);
        let gpu = GpuState::for_surface(
            window.as_ref(),
            size,
            &options.context,
            noise_key(&options),
        );
        Self::from_parts(gpu, size, source.into(), options, callbacks, Some(window))
    }

    fn from_parts(
        gpu: anyhow::Result<GpuState>,
        size: Size,
        source: GradientSource,
        options: RenderOptions,
        mut callbacks: Callbacks,
        window: Option<Arc<Window>>,
    ) -> Self {
        let gpu = match gpu {
            Ok(gpu) => Some(gpu),
            Err(err) => {
                let error = ContextUnavailableError::new(&err);
                warn!(reason = error.reason(), "renderer left idle");
                if let Some(report) = callbacks.on_context_error.as_mut() {
                    report(&error);
                }
                None
            }
        };
        Self {
            gpu,
            source,
            options,
            size,
            clock: Box::new(SystemTimeSource::new()),
            on_ready: callbacks.on_ready,
            _window: window,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.gpu.is_none()
    }

    pub fn adapter(&self) -> Option<&AdapterProfile> {
        self.gpu.as_ref().map(GpuState::adapter_profile)
    }

    /// Caller-facing size, before the resolution scale.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Pixel size the gradient is evaluated at.
    pub fn output_size(&self) -> Size {
        self.size.scaled(self.options.resolution_scale)
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn source(&self) -> &GradientSource {
        &self.source
    }

    /// Replaces the options. The noise texture is only regenerated when its
    /// seed, size or filter changed.
    pub fn set_options(&mut self, options: RenderOptions) {
        self.options = options.normalized();
        let key = noise_key(&self.options);
        let target = self.target_size();
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.ensure_noise(key);
            gpu.resize(target);
        }
    }

    pub fn set_source(&mut self, source: impl Into<GradientSource>) {
        self.source = source.into();
    }

    /// Swaps the clock; the new one is reset before use.
    pub fn set_clock(&mut self, mut clock: BoxedTimeSource) {
        clock.reset();
        self.clock = clock;
    }

    pub fn resize(&mut self, size: Size) {
        if size == self.size {
            return;
        }
        debug!(from = %self.size, to = %size, "renderer resized");
        self.size = size;
        let target = self.target_size();
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.resize(target);
        }
    }

    /// Inputs for the animation driver. An idle renderer never asks for
    /// frames.
    pub fn driver_inputs(&self) -> scheduler::DriverInputs {
        let inputs = self.options.driver_inputs(&self.source);
        if self.is_idle() {
            return scheduler::DriverInputs {
                paused: true,
                ..inputs
            };
        }
        inputs
    }

    /// Evaluates one frame without touching the GPU.
    pub fn parameters_at(&self, elapsed_ms: f64) -> Result<FrameParameters, RenderError> {
        Ok(frame_parameters(
            &self.source,
            &self.options,
            self.size,
            elapsed_ms,
        )?)
    }

    /// Draws at the clock's current time.
    pub fn draw(&mut self) -> Result<(), RenderError> {
        let sample = self.clock.sample();
        trace!(
            frame = sample.frame_index,
            elapsed_ms = sample.elapsed_ms,
            "drawing frame"
        );
        self.draw_at(sample.elapsed_ms)
    }

    pub fn draw_at(&mut self, elapsed_ms: f64) -> Result<(), RenderError> {
        let Some(gpu) = self.gpu.as_mut() else {
            trace!("idle renderer skipped a frame");
            return Ok(());
        };
        let params = frame_parameters(&self.source, &self.options, self.size, elapsed_ms)?;
        gpu.draw(&GrainUniforms::from_frame(&params))?;
        if let Some(ready) = self.on_ready.take() {
            debug!(output = %params.output, "first frame drawn");
            ready();
        }
        Ok(())
    }

    /// Draws one frame offscreen and returns its pixels.
    pub fn render_to_image(&mut self, elapsed_ms: f64) -> Result<image::RgbaImage, RenderError> {
        match self.gpu.as_ref() {
            None => return Err(RenderError::Idle),
            Some(gpu) if !gpu.is_offscreen() => {
                return Err(RenderError::Readback(
                    "window surfaces cannot be read back".to_string(),
                ))
            }
            Some(_) => {}
        }
        self.draw_at(elapsed_ms)?;
        match self.gpu.as_ref() {
            Some(gpu) => gpu.read_back(),
            None => Err(RenderError::Idle),
        }
    }

    fn target_size(&self) -> Size {
        match self.gpu.as_ref() {
            Some(gpu) if gpu.is_offscreen() => self.output_size(),
            _ => self.size,
        }
    }
}

impl scheduler::FrameSink for GrainRenderer {
    type Error = RenderError;

    fn draw(&mut self) -> Result<(), Self::Error> {
        GrainRenderer::draw(self)
    }
}

fn noise_key(options: &RenderOptions) -> NoiseKey {
    NoiseKey {
        seed: options.noise_seed.clone(),
        size: options.noise_texture_size,
        pixelated: options.pixelated,
    }
}
