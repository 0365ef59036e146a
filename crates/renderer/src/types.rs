use std::fmt;

use serde::Serialize;

use crate::error::ContextUnavailableError;
use crate::noise::{NoiseSeed, DEFAULT_NOISE_SIZE};

/// Largest noise texture the renderer will allocate.
pub const MAX_NOISE_SIZE: u32 = 4096;

/// Smallest accepted resolution scale.
pub const MIN_RESOLUTION_SCALE: f32 = 0.1;

/// Pixel dimensions of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `round(w * scale) × round(h * scale)`, never smaller than 1×1.
    pub fn scaled(self, scale: f32) -> Self {
        let scale_axis = |value: u32| ((value as f32 * scale).round() as u32).max(1);
        Self {
            width: scale_axis(self.width),
            height: scale_axis(self.height),
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Where the gradient description comes from on each draw.
pub enum GradientSource {
    Static(String),
    /// Called with the elapsed milliseconds and the caller's surface size.
    Animated(Box<dyn Fn(f64, Size) -> String>),
    /// Steps through a fixed list of descriptions.
    Cycle(GradientCycle),
}

impl GradientSource {
    /// Whether the description can change between frames.
    pub fn is_animated(&self) -> bool {
        match self {
            GradientSource::Static(_) => false,
            GradientSource::Animated(_) => true,
            GradientSource::Cycle(cycle) => cycle.gradients.len() > 1,
        }
    }

    pub fn resolve(&self, elapsed_ms: f64, size: Size) -> String {
        match self {
            GradientSource::Static(text) => text.clone(),
            GradientSource::Animated(produce) => produce(elapsed_ms, size),
            GradientSource::Cycle(cycle) => cycle.at(elapsed_ms).to_string(),
        }
    }
}

impl fmt::Debug for GradientSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradientSource::Static(text) => f.debug_tuple("Static").field(text).finish(),
            GradientSource::Animated(_) => f.write_str("Animated(..)"),
            GradientSource::Cycle(cycle) => f.debug_tuple("Cycle").field(cycle).finish(),
        }
    }
}

impl From<&str> for GradientSource {
    fn from(value: &str) -> Self {
        GradientSource::Static(value.to_string())
    }
}

impl From<String> for GradientSource {
    fn from(value: String) -> Self {
        GradientSource::Static(value)
    }
}

/// Keyframed gradients, each shown for `period_ms` before the next.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientCycle {
    pub gradients: Vec<String>,
    pub period_ms: f64,
}

impl GradientCycle {
    pub fn new(gradients: Vec<String>, period_ms: f64) -> Self {
        Self {
            gradients,
            period_ms,
        }
    }

    /// An empty cycle yields an empty description, which fails to parse.
    pub fn at(&self, elapsed_ms: f64) -> &str {
        let len = self.gradients.len();
        if len == 0 {
            return "";
        }
        let step = if self.period_ms.is_finite() && self.period_ms > 0.0 && elapsed_ms > 0.0 {
            (elapsed_ms / self.period_ms).floor() as usize
        } else {
            0
        };
        &self.gradients[step % len]
    }
}

/// GPU power hint forwarded to adapter selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    #[default]
    Low,
    High,
}

/// Backend restriction for the wgpu instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuBackend {
    #[default]
    Auto,
    Vulkan,
    Metal,
    Dx12,
    Gl,
}

impl GpuBackend {
    pub(crate) fn to_wgpu(self) -> wgpu::Backends {
        match self {
            GpuBackend::Auto => wgpu::Backends::all(),
            GpuBackend::Vulkan => wgpu::Backends::VULKAN,
            GpuBackend::Metal => wgpu::Backends::METAL,
            GpuBackend::Dx12 => wgpu::Backends::DX12,
            GpuBackend::Gl => wgpu::Backends::GL,
        }
    }
}

impl std::str::FromStr for GpuBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" | "all" => Ok(GpuBackend::Auto),
            "vulkan" | "vk" => Ok(GpuBackend::Vulkan),
            "metal" => Ok(GpuBackend::Metal),
            "dx12" | "d3d12" => Ok(GpuBackend::Dx12),
            "gl" | "opengl" | "gles" => Ok(GpuBackend::Gl),
            other => Err(format!("unknown GPU backend '{other}'")),
        }
    }
}

/// Options passed straight through to GPU context creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContextOptions {
    /// Prefer a software adapter over hardware.
    pub force_fallback_adapter: bool,
    pub power_preference: GpuPowerPreference,
    pub backends: GpuBackend,
}

/// Caller-facing render options. Construct freely and pass through
/// [`RenderOptions::normalized`]; the renderer only ever stores normalized
/// values.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub noise_texture_size: u32,
    pub noise_seed: NoiseSeed,
    pub shimmer_speed: f32,
    pub preserve_aspect: bool,
    /// Point-sample the noise texture instead of filtering it.
    pub pixelated: bool,
    pub paused: bool,
    pub resolution_scale: f32,
    /// Added to every elapsed time before it reaches the gradient source.
    pub initial_time_ms: f64,
    pub root_font_size: f32,
    pub context: ContextOptions,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            noise_texture_size: DEFAULT_NOISE_SIZE,
            noise_seed: NoiseSeed::default(),
            shimmer_speed: 0.0,
            preserve_aspect: true,
            pixelated: false,
            paused: false,
            resolution_scale: 1.0,
            initial_time_ms: 0.0,
            root_font_size: gradient::DEFAULT_ROOT_FONT_SIZE,
            context: ContextOptions::default(),
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces out-of-range values with usable ones.
    pub fn normalized(mut self) -> Self {
        if self.noise_texture_size == 0 {
            self.noise_texture_size = DEFAULT_NOISE_SIZE;
        } else if self.noise_texture_size > MAX_NOISE_SIZE {
            tracing::warn!(
                requested = self.noise_texture_size,
                clamped = MAX_NOISE_SIZE,
                "noise texture size clamped"
            );
            self.noise_texture_size = MAX_NOISE_SIZE;
        }
        if !self.shimmer_speed.is_finite() {
            self.shimmer_speed = 0.0;
        }
        if !self.resolution_scale.is_finite() {
            self.resolution_scale = 1.0;
        } else if self.resolution_scale < MIN_RESOLUTION_SCALE {
            tracing::warn!(
                requested = self.resolution_scale,
                clamped = MIN_RESOLUTION_SCALE,
                "resolution scale clamped"
            );
            self.resolution_scale = MIN_RESOLUTION_SCALE;
        }
        if !self.initial_time_ms.is_finite() {
            self.initial_time_ms = 0.0;
        }
        if !self.root_font_size.is_finite() || self.root_font_size <= 0.0 {
            self.root_font_size = gradient::DEFAULT_ROOT_FONT_SIZE;
        }
        self
    }

    pub fn driver_inputs(&self, source: &GradientSource) -> scheduler::DriverInputs {
        scheduler::DriverInputs {
            animated_gradient: source.is_animated(),
            shimmer_speed: self.shimmer_speed,
            paused: self.paused,
        }
    }
}

pub type ReadyCallback = Box<dyn FnOnce()>;
pub type ContextErrorCallback = Box<dyn FnMut(&ContextUnavailableError)>;

/// Lifecycle notifications.
#[derive(Default)]
pub struct Callbacks {
    /// Fires exactly once, after the first successful draw.
    pub on_ready: Option<ReadyCallback>,
    /// Fires when the GPU context cannot be acquired.
    pub on_context_error: Option<ContextErrorCallback>,
}

impl Callbacks {
    pub fn on_ready(mut self, callback: impl FnOnce() + 'static) -> Self {
        self.on_ready = Some(Box::new(callback));
        self
    }

    pub fn on_context_error(
        mut self,
        callback: impl FnMut(&ContextUnavailableError) + 'static,
    ) -> Self {
        self.on_context_error = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_ready", &self.on_ready.is_some())
            .field("on_context_error", &self.on_context_error.is_some())
            .finish()
    }
}
