use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

use nom::number::complete::float;

use crate::color::{parse_color, Rgb};
use crate::error::MalformedGradientError;

/// Orientation used when a gradient omits one: pointing down the surface.
pub const DEFAULT_ANGLE: f32 = 3.0 * FRAC_PI_2;

const ABSOLUTE_UNITS: &[(&str, f32)] = &[
    ("px", 1.0),
    ("in", 96.0),
    ("cm", 96.0 / 2.54),
    ("mm", 96.0 / 25.4),
    ("q", 96.0 / 101.6),
    ("pt", 96.0 / 72.0),
    ("pc", 16.0),
];

/// A parsed linear gradient.
///
/// `angle` is in radians, normalized into `[0, 2π)`, measured counter-clockwise
/// from "pointing right" with y growing upwards.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientSpec {
    pub angle: f32,
    pub stops: Vec<ColorStop>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorStop {
    pub color: Rgb,
    pub position: StopPosition,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopPosition {
    /// Evenly spaced by index among all stops.
    Implicit,
    /// `value` is `None` when the numeric part of the literal did not parse.
    Explicit { value: Option<f32>, unit: LengthUnit },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LengthUnit {
    Percent,
    /// Absolute length already converted to CSS pixels.
    Pixels,
    /// `em`/`rem`, scaled by the root font size at evaluation time.
    FontRelative,
}

/// Parses exactly one `linear-gradient(...)`.
pub fn parse(text: &str) -> Result<GradientSpec, MalformedGradientError> {
    let trimmed = text.trim();
    let gradients = split_top_level(trimmed, ',')?;
    if gradients.len() > 1 {
        return Err(MalformedGradientError::MultipleGradients(gradients.len()));
    }
    let Some(source) = gradients.first() else {
        return Err(MalformedGradientError::syntax("empty gradient description"));
    };

    let (name, arguments) = split_function(source)?;
    match name.to_ascii_lowercase().as_str() {
        "linear-gradient" => {}
        other if other.ends_with("-gradient") => {
            return Err(MalformedGradientError::UnsupportedType(other.to_string()));
        }
        other => {
            return Err(MalformedGradientError::syntax(format!(
                "expected linear-gradient(), found '{other}'"
            )));
        }
    }

    let parts = split_top_level(arguments, ',')?;
    let (angle, stop_parts) = match parts.split_first() {
        Some((first, rest)) => match parse_orientation(first)? {
            Some(angle) => (angle, rest),
            None => (DEFAULT_ANGLE, parts.as_slice()),
        },
        None => (DEFAULT_ANGLE, parts.as_slice()),
    };

    let mut stops = Vec::with_capacity(stop_parts.len());
    for part in stop_parts {
        parse_color_stop(part, &mut stops)?;
    }
    if stops.is_empty() {
        return Err(MalformedGradientError::NoColorStops);
    }

    Ok(GradientSpec {
        angle: normalize_angle(angle),
        stops,
    })
}

/// Wraps an angle into `[0, 2π)`.
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

fn split_function(source: &str) -> Result<(&str, &str), MalformedGradientError> {
    let open = source
        .find('(')
        .ok_or_else(|| MalformedGradientError::syntax(format!("'{source}' is not a function")))?;
    let inner = source[open + 1..]
        .strip_suffix(')')
        .ok_or_else(|| MalformedGradientError::syntax("gradient is missing a closing ')'"))?;
    Ok((source[..open].trim(), inner.trim()))
}

/// Splits on `separator` outside of parentheses, trimming each piece.
fn split_top_level(input: &str, separator: char) -> Result<Vec<&str>, MalformedGradientError> {
    let mut parts = Vec::new();
    let mut depth: usize = 0;
    let mut start = 0;
    for (index, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| MalformedGradientError::syntax("unbalanced ')'"))?;
            }
            c if c == separator && depth == 0 => {
                parts.push(input[start..index].trim());
                start = index + c.len_utf8();
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(MalformedGradientError::syntax("unbalanced '('"));
    }
    let tail = input[start..].trim();
    if !tail.is_empty() || !parts.is_empty() {
        parts.push(tail);
    }
    if parts.iter().any(|part| part.is_empty()) {
        return Err(MalformedGradientError::syntax("empty list entry"));
    }
    Ok(parts)
}

/// Splits on whitespace outside of parentheses.
fn split_tokens(input: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth: usize = 0;
    let mut start = None;
    for (index, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c.is_whitespace() && depth == 0 => {
                if let Some(begin) = start.take() {
                    tokens.push(&input[begin..index]);
                }
                continue;
            }
            _ => {}
        }
        start.get_or_insert(index);
    }
    if let Some(begin) = start {
        tokens.push(&input[begin..]);
    }
    tokens
}

/// Returns `Ok(None)` when the first argument is a color stop rather than an
/// orientation.
fn parse_orientation(part: &str) -> Result<Option<f32>, MalformedGradientError> {
    let lowered = part.to_ascii_lowercase();
    let tokens = split_tokens(&lowered);
    if tokens.first() == Some(&"to") {
        return direction_keywords(&tokens[1..]).map(Some);
    }
    if tokens.len() == 1 {
        if let Some(angle) = css_angle(tokens[0]) {
            return Ok(Some(angle));
        }
    }
    Ok(None)
}

fn direction_keywords(words: &[&str]) -> Result<f32, MalformedGradientError> {
    let mut horizontal = None;
    let mut vertical = None;
    for word in words {
        let slot = match *word {
            "left" | "right" => &mut horizontal,
            "top" | "bottom" => &mut vertical,
            other => {
                return Err(MalformedGradientError::syntax(format!(
                    "unknown direction keyword '{other}'"
                )))
            }
        };
        if slot.replace(*word).is_some() {
            return Err(MalformedGradientError::syntax("repeated direction keyword"));
        }
    }

    let angle = match (horizontal, vertical) {
        (Some("right"), None) => 0.0,
        (None, Some("top")) => FRAC_PI_2,
        (Some("left"), None) => PI,
        (None, Some("bottom")) => 3.0 * FRAC_PI_2,
        (Some("right"), Some("top")) => FRAC_PI_4,
        (Some("left"), Some("top")) => 3.0 * FRAC_PI_4,
        (Some("left"), Some("bottom")) => 5.0 * FRAC_PI_4,
        (Some("right"), Some("bottom")) => 7.0 * FRAC_PI_4,
        _ => return Err(MalformedGradientError::syntax("'to' needs a direction")),
    };
    Ok(angle)
}

/// Recognizes a CSS `<angle>` token and rotates it into the evaluator's
/// convention. CSS measures clockwise from "up"; the evaluator measures
/// counter-clockwise from "right".
///
/// Returns `None` when the token is not shaped like an angle at all. A token
/// that is shaped like one but whose number does not parse yields angle 0.
fn css_angle(token: &str) -> Option<f32> {
    const UNITS: &[(&str, f32)] = &[
        ("deg", PI / 180.0),
        ("grad", PI / 200.0),
        ("rad", 1.0),
        ("turn", TAU),
    ];
    let starts_numeric = token
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.'));
    if !starts_numeric {
        return None;
    }

    let (number, radians_per_unit) = match UNITS
        .iter()
        .find(|(suffix, _)| token.ends_with(suffix))
    {
        Some((suffix, factor)) => (&token[..token.len() - suffix.len()], *factor),
        // Unitless zero is a valid CSS angle.
        None if token.parse::<f32>() == Ok(0.0) => (token, 0.0),
        None => return None,
    };

    // CSS angles run clockwise from "to top"; this keeps `180deg` equal to
    // `to bottom` in the y-up, counter-clockwise convention.
    match parse_number(number) {
        Some(value) => Some(FRAC_PI_2 - value * radians_per_unit),
        None => {
            tracing::trace!(token, "unparseable gradient angle; using 0");
            Some(0.0)
        }
    }
}

fn parse_color_stop(
    part: &str,
    stops: &mut Vec<ColorStop>,
) -> Result<(), MalformedGradientError> {
    let tokens = split_tokens(part);
    let Some((color_token, positions)) = tokens.split_first() else {
        return Err(MalformedGradientError::syntax("empty color stop"));
    };
    if positions.len() > 2 {
        return Err(MalformedGradientError::syntax(format!(
            "too many positions in color stop '{part}'"
        )));
    }

    let color = match parse_color(color_token) {
        Ok(color) => color,
        Err(_) if positions.is_empty() && parse_position(color_token).is_ok() => {
            return Err(MalformedGradientError::syntax(format!(
                "color hint '{part}' is not supported"
            )));
        }
        Err(err) => return Err(err),
    };

    if positions.is_empty() {
        stops.push(ColorStop {
            color,
            position: StopPosition::Implicit,
        });
    }
    for token in positions {
        stops.push(ColorStop {
            color,
            position: parse_position(token)?,
        });
    }
    Ok(())
}

fn parse_position(token: &str) -> Result<StopPosition, MalformedGradientError> {
    let lowered = token.to_ascii_lowercase();
    let (number, unit, scale) = if let Some(number) = lowered.strip_suffix('%') {
        (number, LengthUnit::Percent, 1.0)
    } else if let Some(number) = lowered.strip_suffix("rem") {
        (number, LengthUnit::FontRelative, 1.0)
    } else if let Some(number) = lowered.strip_suffix("em") {
        (number, LengthUnit::FontRelative, 1.0)
    } else if let Some((suffix, scale)) = ABSOLUTE_UNITS
        .iter()
        .find(|(suffix, _)| lowered.ends_with(suffix))
    {
        (
            &lowered[..lowered.len() - suffix.len()],
            LengthUnit::Pixels,
            *scale,
        )
    } else if lowered.parse::<f32>() == Ok(0.0) {
        (lowered.as_str(), LengthUnit::Pixels, 1.0)
    } else {
        return Err(MalformedGradientError::syntax(format!(
            "unsupported stop position '{token}'"
        )));
    };

    let numeric_shape = number
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | 'e'));
    if number.is_empty() || !numeric_shape {
        return Err(MalformedGradientError::syntax(format!(
            "unsupported stop position '{token}'"
        )));
    }
    let value = parse_number(number).map(|value| value * scale);
    if value.is_none() {
        tracing::trace!(token, "unparseable stop position; using even spacing");
    }
    Ok(StopPosition::Explicit { value, unit })
}

/// Parses a complete, finite decimal number.
fn parse_number(text: &str) -> Option<f32> {
    match float::<_, nom::error::Error<&str>>(text) {
        Ok(("", value)) if value.is_finite() => Some(value),
        _ => None,
    }
}
