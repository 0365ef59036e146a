//! CPU mirror of the fragment stage's stop selection.
//!
//! The GPU path and the software reference renderer both pick a color the
//! same way: find the bracket `[offsets[i], offsets[i + 1])` containing the
//! blend factor, normalize the factor within it, and choose between the two
//! bracketing colors by comparing against a noise sample. No color is ever
//! mixed, so every output pixel is exactly one of the stop colors.

use crate::color::Rgb;
use crate::evaluate::{EvaluatedGradient, MAX_STOPS};

/// Picks the stop color for one pixel.
///
/// `blend` is the interpolated corner factor, `noise` a sample in `[0, 1]`.
/// Factors below the first offset take the first color outright. When
/// non-monotonic offsets make several brackets match, the last one wins.
pub fn shade(gradient: &EvaluatedGradient, blend: f32, noise: f32) -> Rgb {
    let mut color = gradient.colors[0];
    for index in 0..MAX_STOPS - 1 {
        let start = gradient.offsets[index];
        let end = gradient.offsets[index + 1];
        if blend >= start && blend < end {
            let position = (blend - start) / (end - start);
            color = if noise < position {
                gradient.colors[index + 1]
            } else {
                gradient.colors[index]
            };
        }
    }
    color
}

/// Bilinearly interpolates the four corner factors.
///
/// `u` runs left to right and `v` top to bottom, both in `[0, 1]`.
pub fn blend_at(corners: &[f32; 4], u: f32, v: f32) -> f32 {
    let [top_left, top_right, bottom_left, bottom_right] = *corners;
    let top = top_left + (top_right - top_left) * u;
    let bottom = bottom_left + (bottom_right - bottom_left) * u;
    top + (bottom - top) * v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{evaluate, parse};

    fn black_to_white() -> EvaluatedGradient {
        let spec = parse("linear-gradient(90deg, #000, #fff)").unwrap();
        evaluate(&spec, 400, 200, true)
    }

    #[test]
    fn picks_only_stop_colors() {
        let gradient = black_to_white();
        for blend_step in 0..=20 {
            for noise_step in 0..=20 {
                let color = shade(&gradient, blend_step as f32 / 20.0, noise_step as f32 / 20.0);
                assert!(color == Rgb::BLACK || color == Rgb::WHITE);
            }
        }
    }

    #[test]
    fn noise_threshold_splits_the_bracket() {
        let gradient = black_to_white();
        assert_eq!(shade(&gradient, 0.25, 0.1), Rgb::WHITE);
        assert_eq!(shade(&gradient, 0.25, 0.9), Rgb::BLACK);
        assert_eq!(shade(&gradient, 0.75, 0.5), Rgb::WHITE);
    }

    #[test]
    fn outside_the_stops_uses_end_colors() {
        let spec = parse("linear-gradient(red 20%, blue 60%)").unwrap();
        let gradient = evaluate(&spec, 100, 100, true);
        let red = gradient.colors[0];
        let blue = gradient.colors[1];
        assert_eq!(shade(&gradient, 0.1, 0.0), red);
        assert_eq!(shade(&gradient, 0.9, 0.0), blue);
        assert_eq!(shade(&gradient, 1.0, 0.99), blue);
    }

    #[test]
    fn finite_sentinel_behaves_like_infinity() {
        let mut gradient = black_to_white();
        let expected: Vec<Rgb> = (0..=10)
            .map(|step| shade(&gradient, step as f32 / 10.0, 0.3))
            .collect();
        for offset in &mut gradient.offsets[gradient.count..] {
            *offset = f32::MAX;
        }
        let actual: Vec<Rgb> = (0..=10)
            .map(|step| shade(&gradient, step as f32 / 10.0, 0.3))
            .collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn blend_at_hits_the_corners() {
        let corners = [0.1, 0.9, 0.2, 0.8];
        assert_eq!(blend_at(&corners, 0.0, 0.0), 0.1);
        assert_eq!(blend_at(&corners, 1.0, 0.0), 0.9);
        assert_eq!(blend_at(&corners, 0.0, 1.0), 0.2);
        assert_eq!(blend_at(&corners, 1.0, 1.0), 0.8);
        assert!((blend_at(&corners, 0.5, 0.5) - 0.5).abs() < 1e-6);
    }
}
