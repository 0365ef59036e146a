use serde::Serialize;

use crate::color::Rgb;
use crate::parse::{GradientSpec, LengthUnit, StopPosition};

/// Hard capacity of the shader's color/offset tables.
pub const MAX_STOPS: usize = 8;

/// Offset stored in unused slots so no bracket past the last stop can match.
pub const OFFSET_SENTINEL: f32 = f32::INFINITY;

/// Root font size assumed when the host does not report one.
pub const DEFAULT_ROOT_FONT_SIZE: f32 = 16.0;

/// Geometry and host inputs the evaluator needs besides the gradient itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub width: f32,
    pub height: f32,
    pub preserve_aspect: bool,
    pub root_font_size: f32,
}

impl Layout {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as f32,
            height: height as f32,
            preserve_aspect: true,
            root_font_size: DEFAULT_ROOT_FONT_SIZE,
        }
    }

    pub fn with_preserve_aspect(mut self, preserve_aspect: bool) -> Self {
        self.preserve_aspect = preserve_aspect;
        self
    }

    pub fn with_root_font_size(mut self, root_font_size: f32) -> Self {
        self.root_font_size = root_font_size;
        self
    }

    /// Length of the surface diagonal, never below one pixel.
    pub fn diagonal(&self) -> f32 {
        (self.width * self.width + self.height * self.height)
            .sqrt()
            .max(1.0)
    }
}

/// Fixed-size uniform payload for one draw.
///
/// `corners` are ordered top-left, top-right, bottom-left, bottom-right.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluatedGradient {
    pub count: usize,
    pub colors: [Rgb; MAX_STOPS],
    pub offsets: [f32; MAX_STOPS],
    pub corners: [f32; 4],
}

pub fn evaluate(
    spec: &GradientSpec,
    width: u32,
    height: u32,
    preserve_aspect: bool,
) -> EvaluatedGradient {
    evaluate_with(
        spec,
        &Layout::new(width, height).with_preserve_aspect(preserve_aspect),
    )
}

pub fn evaluate_with(spec: &GradientSpec, layout: &Layout) -> EvaluatedGradient {
    let total = spec.stops.len();
    let count = total.clamp(1, MAX_STOPS);
    if total > MAX_STOPS {
        tracing::debug!(
            stops = total,
            capacity = MAX_STOPS,
            "gradient has more stops than the shader supports; ignoring the rest"
        );
    }

    let diagonal = layout.diagonal();
    let spacing = total.saturating_sub(1).max(1) as f32;
    let mut colors = [Rgb::BLACK; MAX_STOPS];
    let mut offsets = [OFFSET_SENTINEL; MAX_STOPS];
    for (index, stop) in spec.stops.iter().take(count).enumerate() {
        colors[index] = stop.color;
        offsets[index] = resolve_offset(
            stop.position,
            index as f32 / spacing,
            diagonal,
            layout.root_font_size,
        );
    }
    let last = colors[count - 1];
    for slot in &mut colors[count..] {
        *slot = last;
    }

    EvaluatedGradient {
        count,
        colors,
        offsets,
        corners: corner_factors(spec.angle, layout),
    }
}

fn resolve_offset(position: StopPosition, even: f32, diagonal: f32, root_font_size: f32) -> f32 {
    match position {
        StopPosition::Implicit => even,
        StopPosition::Explicit { value: None, .. } => even,
        StopPosition::Explicit {
            value: Some(value),
            unit,
        } => match unit {
            LengthUnit::Percent => value / 100.0,
            LengthUnit::Pixels => value / diagonal,
            LengthUnit::FontRelative => value * root_font_size / diagonal,
        },
    }
}

/// Projects each rectangle corner onto the gradient axis and rescales the
/// projection from `[-1, 1]` into `[0, 1]`.
fn corner_factors(angle: f32, layout: &Layout) -> [f32; 4] {
    let (dir_y, dir_x) = angle.sin_cos();
    let (x, y) = if layout.preserve_aspect {
        let diagonal = layout.diagonal();
        (layout.width / diagonal, layout.height / diagonal)
    } else {
        (1.0, 1.0)
    };
    [(-x, y), (x, y), (-x, -y), (x, -y)]
        .map(|(cx, cy)| (dir_x * cx + dir_y * cy).clamp(-1.0, 1.0) * 0.5 + 0.5)
}

#[cfg(test)]
mod tests {
    use std::f32::consts::TAU;

    use super::*;
    use crate::parse;

    fn close(actual: f32, expected: f32) -> bool {
        (actual - expected).abs() < 1e-4
    }

    #[test]
    fn end_to_end_black_to_white() {
        let spec = parse("linear-gradient(90deg, #000, #fff)").unwrap();
        let evaluated = evaluate(&spec, 400, 200, true);
        assert_eq!(evaluated.count, 2);
        assert_eq!(evaluated.colors[0], Rgb::BLACK);
        assert_eq!(evaluated.colors[1], Rgb::WHITE);
        assert_eq!(evaluated.offsets[0], 0.0);
        assert_eq!(evaluated.offsets[1], 1.0);
        assert!(evaluated.offsets[2..]
            .iter()
            .all(|offset| *offset == OFFSET_SENTINEL));
    }

    #[test]
    fn pads_tables_with_last_color_and_sentinel() {
        for count in 1..=MAX_STOPS {
            let stops: Vec<String> = (0..count).map(|i| format!("#{:02x}0000", i * 20)).collect();
            let spec = parse(&format!("linear-gradient({})", stops.join(", "))).unwrap();
            let evaluated = evaluate(&spec, 320, 240, true);
            assert_eq!(evaluated.count, count);
            for slot in count..MAX_STOPS {
                assert_eq!(evaluated.colors[slot], evaluated.colors[count - 1]);
                assert_eq!(evaluated.offsets[slot], OFFSET_SENTINEL);
            }
        }
    }

    #[test]
    fn extra_stops_are_ignored() {
        let stops = vec!["red"; 11].join(", ");
        let spec = parse(&format!("linear-gradient({stops})")).unwrap();
        let evaluated = evaluate(&spec, 100, 100, true);
        assert_eq!(evaluated.count, MAX_STOPS);
        // spacing still counts every stop, including the dropped ones
        assert!(close(evaluated.offsets[1], 0.1));
    }

    #[test]
    fn single_stop_sits_at_zero() {
        let spec = parse("linear-gradient(red)").unwrap();
        let evaluated = evaluate(&spec, 10, 10, true);
        assert_eq!(evaluated.count, 1);
        assert_eq!(evaluated.offsets[0], 0.0);
        assert_eq!(evaluated.offsets[1], OFFSET_SENTINEL);
    }

    #[test]
    fn implicit_positions_use_index_among_all_stops() {
        let spec = parse("linear-gradient(red, lime 10%, blue, white)").unwrap();
        let evaluated = evaluate(&spec, 100, 100, true);
        assert!(close(evaluated.offsets[0], 0.0));
        assert!(close(evaluated.offsets[1], 0.1));
        assert!(close(evaluated.offsets[2], 2.0 / 3.0));
        assert!(close(evaluated.offsets[3], 1.0));
    }

    #[test]
    fn non_monotonic_offsets_keep_input_order() {
        let spec = parse("linear-gradient(red 80%, blue 20%)").unwrap();
        let evaluated = evaluate(&spec, 100, 100, true);
        assert!(close(evaluated.offsets[0], 0.8));
        assert!(close(evaluated.offsets[1], 0.2));
    }

    #[test]
    fn lengths_are_divided_by_the_diagonal() {
        let spec = parse("linear-gradient(red 50px, blue 2em, white 1rem)").unwrap();
        let evaluated = evaluate_with(&spec, &Layout::new(30, 40).with_root_font_size(10.0));
        assert!(close(evaluated.offsets[0], 1.0));
        assert!(close(evaluated.offsets[1], 0.4));
        assert!(close(evaluated.offsets[2], 0.2));
    }

    #[test]
    fn zero_sized_surface_uses_unit_diagonal() {
        let spec = parse("linear-gradient(red 1px, blue)").unwrap();
        let evaluated = evaluate(&spec, 0, 0, true);
        assert!(close(evaluated.offsets[0], 1.0));
        assert!(evaluated.corners.iter().all(|corner| close(*corner, 0.5)));
    }

    #[test]
    fn malformed_length_falls_back_to_even_spacing() {
        let spec = parse("linear-gradient(red, lime 1.2.3px, blue)").unwrap();
        let evaluated = evaluate(&spec, 100, 100, true);
        assert!(close(evaluated.offsets[1], 0.5));
    }

    #[test]
    fn corners_stay_in_unit_range() {
        let sizes = [(1, 1), (400, 200), (1, 5000), (1920, 1080), (0, 7)];
        for step in 0..64 {
            let angle = step as f32 / 64.0 * TAU;
            for (width, height) in sizes {
                for preserve_aspect in [true, false] {
                    let spec = GradientSpec {
                        angle,
                        stops: parse("linear-gradient(red, blue)").unwrap().stops,
                    };
                    let evaluated = evaluate(&spec, width, height, preserve_aspect);
                    for corner in evaluated.corners {
                        assert!((0.0..=1.0).contains(&corner), "{corner} out of range");
                    }
                }
            }
        }
    }

    #[test]
    fn to_right_is_symmetric_on_a_square() {
        let spec = parse("linear-gradient(to right, red, blue)").unwrap();
        let [top_left, top_right, bottom_left, bottom_right] =
            evaluate(&spec, 256, 256, true).corners;
        assert!(close(top_left + top_right, 1.0));
        assert!(close(bottom_left + bottom_right, 1.0));
        assert!(close(top_left, bottom_left));
        assert!(top_left < 0.5 && top_right > 0.5);
    }

    #[test]
    fn to_bottom_matches_180deg() {
        let keyword = parse("linear-gradient(to bottom, red, blue)").unwrap();
        let numeric = parse("linear-gradient(180deg, red, blue)").unwrap();
        let default = parse("linear-gradient(red, blue)").unwrap();
        let a = evaluate(&keyword, 300, 150, true).corners;
        let b = evaluate(&numeric, 300, 150, true).corners;
        let c = evaluate(&default, 300, 150, true).corners;
        for index in 0..4 {
            assert!(close(a[index], b[index]));
            assert!(close(a[index], c[index]));
        }
        // top corners start the ramp, bottom corners end it
        assert!(a[0] < 0.5 && a[2] > 0.5);
    }

    #[test]
    fn opposite_corners_sum_to_one_even_when_clamped() {
        for degrees in (0..360).step_by(15) {
            let spec = parse(&format!("linear-gradient({degrees}deg, red, blue)")).unwrap();
            for preserve_aspect in [true, false] {
                let [top_left, top_right, bottom_left, bottom_right] =
                    evaluate(&spec, 640, 120, preserve_aspect).corners;
                assert!(close(top_left + bottom_right, 1.0), "{degrees}deg");
                assert!(close(top_right + bottom_left, 1.0), "{degrees}deg");
            }
        }
    }

    #[test]
    fn stretched_corners_reach_the_ends_of_the_ramp() {
        let spec = parse("linear-gradient(to bottom, red, blue)").unwrap();
        let corners = evaluate(&spec, 640, 120, false).corners;
        assert!(close(corners[0], 0.0));
        assert!(close(corners[1], 0.0));
        assert!(close(corners[2], 1.0));
        assert!(close(corners[3], 1.0));
    }
}
