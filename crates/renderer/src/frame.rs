use std::f32::consts::E;

use gradient::{evaluate_with, EvaluatedGradient, Layout, MalformedGradientError};
use serde::Serialize;

use crate::types::{GradientSource, RenderOptions, Size};

/// Milliseconds for the noise to drift one full texture at unit speed.
pub const SHIMMER_PERIOD_MS: f64 = 1000.0 * 60.0 * 10.0;

/// Everything one draw needs besides GPU resources.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameParameters {
    /// Caller-facing surface size.
    pub size: Size,
    /// Pixel size actually rendered, after the resolution scale.
    pub output: Size,
    /// Elapsed time including the configured initial offset.
    pub elapsed_ms: f64,
    /// The resolved gradient description.
    pub description: String,
    /// Noise repeat factor per axis.
    pub scale: [f32; 2],
    /// Noise offset, wrapped into `[0, 1)`.
    pub shimmer: f32,
    pub gradient: EvaluatedGradient,
}

/// Resolves, parses and evaluates the gradient for one frame.
pub fn frame_parameters(
    source: &GradientSource,
    options: &RenderOptions,
    size: Size,
    elapsed_ms: f64,
) -> Result<FrameParameters, MalformedGradientError> {
    let elapsed_ms = elapsed_ms + options.initial_time_ms;
    let output = size.scaled(options.resolution_scale);
    let description = source.resolve(elapsed_ms, size);
    let spec = gradient::parse(&description)?;
    let layout = Layout::new(output.width, output.height)
        .with_preserve_aspect(options.preserve_aspect)
        .with_root_font_size(options.root_font_size);
    let gradient = evaluate_with(&spec, &layout);

    let noise_size = options.noise_texture_size.max(1) as f32;
    let scale = [
        output.width as f32 / noise_size * E,
        output.height as f32 / noise_size * E,
    ];
    let shimmer = shimmer_offset(options.shimmer_speed, elapsed_ms);
    tracing::trace!(%output, elapsed_ms, shimmer, stops = gradient.count, "prepared frame");

    Ok(FrameParameters {
        size,
        output,
        elapsed_ms,
        description,
        scale,
        shimmer,
        gradient,
    })
}

/// Noise drift for `speed` after `elapsed_ms`, wrapped into `[0, 1)` because
/// the noise texture repeats every unit.
pub fn shimmer_offset(speed: f32, elapsed_ms: f64) -> f32 {
    let offset = f64::from(speed) * elapsed_ms / SHIMMER_PERIOD_MS;
    if offset.is_finite() {
        offset.rem_euclid(1.0) as f32
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_uses_output_pixels_over_noise_size() {
        let options = RenderOptions {
            noise_texture_size: 100,
            resolution_scale: 0.5,
            ..RenderOptions::default()
        };
        let params = frame_parameters(
            &GradientSource::from("linear-gradient(red, blue)"),
            &options,
            Size::new(400, 200),
            0.0,
        )
        .unwrap();
        assert_eq!(params.output, Size::new(200, 100));
        assert!((params.scale[0] - 2.0 * E).abs() < 1e-5);
        assert!((params.scale[1] - E).abs() < 1e-5);
    }

    #[test]
    fn shimmer_advances_with_time_and_wraps() {
        assert_eq!(shimmer_offset(0.0, 123_456.0), 0.0);
        assert!((shimmer_offset(1.0, 60_000.0) - 0.1).abs() < 1e-6);
        assert!((shimmer_offset(2.0, 60_000.0) - 0.2).abs() < 1e-6);
        // a full unit of drift wraps back to zero
        assert!(shimmer_offset(1.0, 600_000.0).abs() < 1e-6);
        assert!((shimmer_offset(-1.0, 60_000.0) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn initial_time_reaches_the_source() {
        let options = RenderOptions {
            initial_time_ms: 2000.0,
            ..RenderOptions::default()
        };
        let source = GradientSource::Animated(Box::new(|elapsed, size| {
            assert_eq!(size, Size::new(10, 10));
            if elapsed >= 2000.0 {
                "linear-gradient(white, black)".to_string()
            } else {
                "linear-gradient(black, white)".to_string()
            }
        }));
        let params = frame_parameters(&source, &options, Size::new(10, 10), 0.0).unwrap();
        assert_eq!(params.elapsed_ms, 2000.0);
        assert_eq!(params.gradient.colors[0], gradient::Rgb::WHITE);
    }

    #[test]
    fn malformed_gradients_propagate() {
        let err = frame_parameters(
            &GradientSource::from("conic-gradient(red, blue)"),
            &RenderOptions::default(),
            Size::new(10, 10),
            0.0,
        )
        .unwrap_err();
        assert!(matches!(err, MalformedGradientError::UnsupportedType(_)));
    }
}
