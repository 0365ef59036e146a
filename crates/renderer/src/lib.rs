//! Renderer crate for the grainy gradient tool.
//!
//! Glues the gradient evaluator, the seeded noise texture and a single `wgpu`
//! program together. The flow for one frame is:
//!
//! ```text
//!   GradientSource ──▶ frame_parameters() ──▶ GrainUniforms ──▶ GPU UBO
//!        (string)        parse + evaluate          │
//!                                                  ▼
//!   NoiseImage ──────────────────────────────▶ quad draw ──▶ surface / readback
//! ```
//!
//! [`GrainRenderer`] owns every GPU resource for one target (an offscreen
//! texture or a winit window surface). [`window::run_preview`] wires it to an
//! [`scheduler::AnimationDriver`] inside a winit event loop, and
//! [`cpu::render_cpu`] reproduces the same frame without a GPU.

mod compile;
pub mod cpu;
mod error;
mod frame;
mod gpu;
mod grain;
pub mod noise;
pub mod runtime;
mod types;
pub mod window;

pub use error::{ContextUnavailableError, RenderError};
pub use frame::{frame_parameters, shimmer_offset, FrameParameters, SHIMMER_PERIOD_MS};
pub use gpu::{AdapterProfile, GrainUniforms};
pub use grain::GrainRenderer;
pub use noise::{generate, NoiseImage, NoiseSeed, DEFAULT_NOISE_SEED, DEFAULT_NOISE_SIZE};
pub use types::{
    Callbacks, ContextErrorCallback, ContextOptions, GpuBackend, GpuPowerPreference,
    GradientCycle, GradientSource, ReadyCallback, RenderOptions, Size, MAX_NOISE_SIZE,
    MIN_RESOLUTION_SCALE,
};
