//! Software rendition of the grain pipeline.
//!
//! Follows the same steps as the shaders: interpolate the corner factors
//! at each pixel center, sample the repeating noise texture at
//! `uv * scale + shimmer`, then pick a stop color with
//! [`gradient::dither::shade`]. Used for exports on machines without a GPU
//! and as an oracle in tests.

use gradient::dither::{blend_at, shade};

use crate::frame::{frame_parameters, FrameParameters};
use crate::noise::{generate, NoiseImage};
use crate::types::{GradientSource, RenderOptions, Size};

/// Renders one frame from already evaluated parameters.
///
/// Corner factors are interpolated bilinearly, while the GPU interpolates
/// them per triangle across the strip. Opposite corners always sum to one,
/// clamped or not, so both interpolations produce the same field.
pub fn render_reference(
    params: &FrameParameters,
    noise: &NoiseImage,
    pixelated: bool,
) -> image::RgbaImage {
    let Size { width, height } = params.output;
    let [scale_x, scale_y] = params.scale;
    let shimmer = params.shimmer;
    image::RgbaImage::from_fn(width, height, |x, y| {
        let u = (x as f32 + 0.5) / width as f32;
        let v = (y as f32 + 0.5) / height as f32;
        let blend = blend_at(&params.gradient.corners, u, v);
        let sample = noise.sample(u * scale_x + shimmer, v * scale_y + shimmer, pixelated);
        let [r, g, b] = shade(&params.gradient, blend, sample).to_u8();
        image::Rgba([r, g, b, 255])
    })
}

/// Evaluates and renders one frame entirely on the CPU.
pub fn render_cpu(
    source: &GradientSource,
    options: &RenderOptions,
    size: Size,
    elapsed_ms: f64,
) -> Result<image::RgbaImage, gradient::MalformedGradientError> {
    let options = options.clone().normalized();
    let params = frame_parameters(source, &options, size, elapsed_ms)?;
    let noise = generate(&options.noise_seed, options.noise_texture_size);
    tracing::debug!(output = %params.output, "rendering frame on the CPU");
    Ok(render_reference(&params, &noise, options.pixelated))
}
