//! GPU side of the grain renderer.
//!
//! - `context` owns wgpu instance/adapter/device wiring and, for windows, the
//!   swapchain configuration.
//! - `pipeline` builds the single quad pipeline and its two bind group
//!   layouts (uniforms, noise).
//! - `noise` uploads the noise texture and rebuilds it when the seed, size or
//!   filter changes.
//! - `uniforms` mirrors the std140 `GrainParams` block.
//! - `state` bundles everything into `GpuState`, which draws and reads back.

mod context;
mod noise;
mod pipeline;
mod state;
mod uniforms;

pub use context::AdapterProfile;
pub(crate) use noise::NoiseKey;
pub(crate) use state::GpuState;
pub use uniforms::GrainUniforms;
