//! CSS `linear-gradient()` parsing and evaluation for the grain renderer.
//!
//! [`parse`] turns a gradient description into a [`GradientSpec`], and
//! [`evaluate`] resolves that against a surface size into the fixed-size
//! tables the fragment shader consumes. Nothing in this crate touches the GPU.

mod color;
pub mod dither;
mod error;
mod evaluate;
mod parse;

pub use color::{parse_color, Rgb};
pub use error::MalformedGradientError;
pub use evaluate::{
    evaluate, evaluate_with, EvaluatedGradient, Layout, DEFAULT_ROOT_FONT_SIZE, MAX_STOPS,
    OFFSET_SENTINEL,
};
pub use parse::{
    normalize_angle, parse, ColorStop, GradientSpec, LengthUnit, StopPosition, DEFAULT_ANGLE,
};
