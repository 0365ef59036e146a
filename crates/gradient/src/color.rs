use nom::{
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::all_consuming,
    number::complete::float,
    sequence::{delimited, preceded},
    IResult,
};
use serde::Serialize;

use crate::error::MalformedGradientError;

/// Normalized RGB triple. Components live in `[0, 1]`.
///
/// Alpha is accepted by the parser and dropped: the renderer composites opaque
/// colors only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    fn from_packed(rgb: u32) -> Self {
        Self::from_u8((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Quantizes to 8-bit channels the way a UNORM render target would.
    pub fn to_u8(self) -> [u8; 3] {
        let quantize = |value: f32| (value.clamp(0.0, 1.0) * 255.0).round() as u8;
        [quantize(self.r), quantize(self.g), quantize(self.b)]
    }
}

/// Parses a CSS color: hex, `rgb()/rgba()`, `hsl()/hsla()` or a named color.
pub fn parse_color(input: &str) -> Result<Rgb, MalformedGradientError> {
    let trimmed = input.trim();
    let parsed = if trimmed.starts_with('#') {
        parse_hex(trimmed)
    } else if trimmed.contains('(') {
        parse_color_function(trimmed)
    } else {
        named_color(trimmed)
    };
    parsed.ok_or_else(|| MalformedGradientError::InvalidColor(trimmed.to_string()))
}

fn hex_digits(input: &str) -> IResult<&str, &str> {
    preceded(char('#'), take_while1(|c: char| c.is_ascii_hexdigit()))(input)
}

fn parse_hex(input: &str) -> Option<Rgb> {
    let (_, digits) = all_consuming(hex_digits)(input).ok()?;
    let nibble = |index: usize| u8::from_str_radix(&digits[index..=index], 16).ok();
    let byte = |index: usize| u8::from_str_radix(&digits[index..index + 2], 16).ok();
    match digits.len() {
        3 | 4 => Some(Rgb::from_u8(
            nibble(0)? * 17,
            nibble(1)? * 17,
            nibble(2)? * 17,
        )),
        6 | 8 => Some(Rgb::from_u8(byte(0)?, byte(2)?, byte(4)?)),
        _ => None,
    }
}

fn color_function(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, name) = take_while1(|c: char| c.is_ascii_alphabetic())(input)?;
    let (input, body) = delimited(
        preceded(multispace0, char('(')),
        take_while(|c: char| c != ')'),
        char(')'),
    )(input)?;
    Ok((input, (name, body)))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Component {
    Number(f32),
    Percent(f32),
    Degrees(f32),
}

fn component(token: &str) -> Option<Component> {
    let (rest, value) = float::<_, nom::error::Error<&str>>(token).ok()?;
    if !value.is_finite() {
        return None;
    }
    match rest.to_ascii_lowercase().as_str() {
        "" => Some(Component::Number(value)),
        "%" => Some(Component::Percent(value)),
        "deg" => Some(Component::Degrees(value)),
        "rad" => Some(Component::Degrees(value.to_degrees())),
        "grad" => Some(Component::Degrees(value * 0.9)),
        "turn" => Some(Component::Degrees(value * 360.0)),
        _ => None,
    }
}

fn parse_color_function(input: &str) -> Option<Rgb> {
    let (_, (name, body)) = all_consuming(color_function)(input).ok()?;
    let components = body
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(component)
        .collect::<Option<Vec<_>>>()?;
    if !(3..=4).contains(&components.len()) {
        return None;
    }
    if let Some(alpha) = components.get(3) {
        if matches!(alpha, Component::Degrees(_)) {
            return None;
        }
    }

    match name.to_ascii_lowercase().as_str() {
        "rgb" | "rgba" => {
            let channel = |component: Component| match component {
                Component::Number(value) => Some((value / 255.0).clamp(0.0, 1.0)),
                Component::Percent(value) => Some((value / 100.0).clamp(0.0, 1.0)),
                Component::Degrees(_) => None,
            };
            Some(Rgb::new(
                channel(components[0])?,
                channel(components[1])?,
                channel(components[2])?,
            ))
        }
        "hsl" | "hsla" => {
            let hue = match components[0] {
                Component::Number(value) | Component::Degrees(value) => value,
                Component::Percent(_) => return None,
            };
            let fraction = |component: Component| match component {
                Component::Number(value) | Component::Percent(value) => {
                    Some((value / 100.0).clamp(0.0, 1.0))
                }
                Component::Degrees(_) => None,
            };
            Some(hsl_to_rgb(
                hue,
                fraction(components[1])?,
                fraction(components[2])?,
            ))
        }
        _ => None,
    }
}

fn hsl_to_rgb(hue_degrees: f32, saturation: f32, lightness: f32) -> Rgb {
    let hue = hue_degrees.rem_euclid(360.0) / 360.0;
    if saturation <= 0.0 {
        return Rgb::new(lightness, lightness, lightness);
    }
    let q = if lightness < 0.5 {
        lightness * (1.0 + saturation)
    } else {
        lightness + saturation - lightness * saturation
    };
    let p = 2.0 * lightness - q;
    let channel = |offset: f32| {
        let t = (hue + offset).rem_euclid(1.0);
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };
    Rgb::new(channel(1.0 / 3.0), channel(0.0), channel(-1.0 / 3.0))
}

fn named_color(name: &str) -> Option<Rgb> {
    let lowered = name.to_ascii_lowercase();
    NAMED_COLORS
        .iter()
        .find(|(candidate, _)| *candidate == lowered)
        .map(|(_, packed)| Rgb::from_packed(*packed))
}

const NAMED_COLORS: &[(&str, u32)] = &[
    ("aliceblue", 0xf0f8ff),
    ("antiquewhite", 0xfaebd7),
    ("aqua", 0x00ffff),
    ("aquamarine", 0x7fffd4),
    ("azure", 0xf0ffff),
    ("beige", 0xf5f5dc),
    ("bisque", 0xffe4c4),
    ("black", 0x000000),
    ("blanchedalmond", 0xffebcd),
    ("blue", 0x0000ff),
    ("blueviolet", 0x8a2be2),
    ("brown", 0xa52a2a),
    ("burlywood", 0xdeb887),
    ("cadetblue", 0x5f9ea0),
    ("chartreuse", 0x7fff00),
    ("chocolate", 0xd2691e),
    ("coral", 0xff7f50),
    ("cornflowerblue", 0x6495ed),
    ("cornsilk", 0xfff8dc),
    ("crimson", 0xdc143c),
    ("cyan", 0x00ffff),
    ("darkblue", 0x00008b),
    ("darkcyan", 0x008b8b),
    ("darkgoldenrod", 0xb8860b),
    ("darkgray", 0xa9a9a9),
    ("darkgreen", 0x006400),
    ("darkgrey", 0xa9a9a9),
    ("darkkhaki", 0xbdb76b),
    ("darkmagenta", 0x8b008b),
    ("darkolivegreen", 0x556b2f),
    ("darkorange", 0xff8c00),
    ("darkorchid", 0x9932cc),
    ("darkred", 0x8b0000),
    ("darksalmon", 0xe9967a),
    ("darkseagreen", 0x8fbc8f),
    ("darkslateblue", 0x483d8b),
    ("darkslategray", 0x2f4f4f),
    ("darkslategrey", 0x2f4f4f),
    ("darkturquoise", 0x00ced1),
    ("darkviolet", 0x9400d3),
    ("deeppink", 0xff1493),
    ("deepskyblue", 0x00bfff),
    ("dimgray", 0x696969),
    ("dimgrey", 0x696969),
    ("dodgerblue", 0x1e90ff),
    ("firebrick", 0xb22222),
    ("floralwhite", 0xfffaf0),
    ("forestgreen", 0x228b22),
    ("fuchsia", 0xff00ff),
    ("gainsboro", 0xdcdcdc),
    ("ghostwhite", 0xf8f8ff),
    ("gold", 0xffd700),
    ("goldenrod", 0xdaa520),
    ("gray", 0x808080),
    ("green", 0x008000),
    ("greenyellow", 0xadff2f),
    ("grey", 0x808080),
    ("honeydew", 0xf0fff0),
    ("hotpink", 0xff69b4),
    ("indianred", 0xcd5c5c),
    ("indigo", 0x4b0082),
    ("ivory", 0xfffff0),
    ("khaki", 0xf0e68c),
    ("lavender", 0xe6e6fa),
    ("lavenderblush", 0xfff0f5),
    ("lawngreen", 0x7cfc00),
    ("lemonchiffon", 0xfffacd),
    ("lightblue", 0xadd8e6),
    ("lightcoral", 0xf08080),
    ("lightcyan", 0xe0ffff),
    ("lightgoldenrodyellow", 0xfafad2),
    ("lightgray", 0xd3d3d3),
    ("lightgreen", 0x90ee90),
    ("lightgrey", 0xd3d3d3),
    ("lightpink", 0xffb6c1),
    ("lightsalmon", 0xffa07a),
    ("lightseagreen", 0x20b2aa),
    ("lightskyblue", 0x87cefa),
    ("lightslategray", 0x778899),
    ("lightslategrey", 0x778899),
    ("lightsteelblue", 0xb0c4de),
    ("lightyellow", 0xffffe0),
    ("lime", 0x00ff00),
    ("limegreen", 0x32cd32),
    ("linen", 0xfaf0e6),
    ("magenta", 0xff00ff),
    ("maroon", 0x800000),
    ("mediumaquamarine", 0x66cdaa),
    ("mediumblue", 0x0000cd),
    ("mediumorchid", 0xba55d3),
    ("mediumpurple", 0x9370db),
    ("mediumseagreen", 0x3cb371),
    ("mediumslateblue", 0x7b68ee),
    ("mediumspringgreen", 0x00fa9a),
    ("mediumturquoise", 0x48d1cc),
    ("mediumvioletred", 0xc71585),
    ("midnightblue", 0x191970),
    ("mintcream", 0xf5fffa),
    ("mistyrose", 0xffe4e1),
    ("moccasin", 0xffe4b5),
    ("navajowhite", 0xffdead),
    ("navy", 0x000080),
    ("oldlace", 0xfdf5e6),
    ("olive", 0x808000),
    ("olivedrab", 0x6b8e23),
    ("orange", 0xffa500),
    ("orangered", 0xff4500),
    ("orchid", 0xda70d6),
    ("palegoldenrod", 0xeee8aa),
    ("palegreen", 0x98fb98),
    ("paleturquoise", 0xafeeee),
    ("palevioletred", 0xdb7093),
    ("papayawhip", 0xffefd5),
    ("peachpuff", 0xffdab9),
    ("peru", 0xcd853f),
    ("pink", 0xffc0cb),
    ("plum", 0xdda0dd),
    ("powderblue", 0xb0e0e6),
    ("purple", 0x800080),
    ("rebeccapurple", 0x663399),
    ("red", 0xff0000),
    ("rosybrown", 0xbc8f8f),
    ("royalblue", 0x4169e1),
    ("saddlebrown", 0x8b4513),
    ("salmon", 0xfa8072),
    ("sandybrown", 0xf4a460),
    ("seagreen", 0x2e8b57),
    ("seashell", 0xfff5ee),
    ("sienna", 0xa0522d),
    ("silver", 0xc0c0c0),
    ("skyblue", 0x87ceeb),
    ("slateblue", 0x6a5acd),
    ("slategray", 0x708090),
    ("slategrey", 0x708090),
    ("snow", 0xfffafa),
    ("springgreen", 0x00ff7f),
    ("steelblue", 0x4682b4),
    ("tan", 0xd2b48c),
    ("teal", 0x008080),
    ("thistle", 0xd8bfd8),
    ("tomato", 0xff6347),
    ("transparent", 0x000000),
    ("turquoise", 0x40e0d0),
    ("violet", 0xee82ee),
    ("wheat", 0xf5deb3),
    ("white", 0xffffff),
    ("whitesmoke", 0xf5f5f5),
    ("yellow", 0xffff00),
    ("yellowgreen", 0x9acd32),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(color: Rgb, expected: [f32; 3]) {
        for (actual, wanted) in color.to_array().iter().zip(expected) {
            assert!(
                (actual - wanted).abs() < 1e-3,
                "expected {expected:?}, got {color:?}"
            );
        }
    }

    #[test]
    fn parses_short_and_long_hex() {
        approx(parse_color("#000").unwrap(), [0.0, 0.0, 0.0]);
        approx(parse_color("#fff").unwrap(), [1.0, 1.0, 1.0]);
        approx(parse_color("#ff8000").unwrap(), [1.0, 128.0 / 255.0, 0.0]);
        approx(parse_color("#ff800080").unwrap(), [1.0, 128.0 / 255.0, 0.0]);
        approx(parse_color("#f80c").unwrap(), [1.0, 136.0 / 255.0, 0.0]);
    }

    #[test]
    fn rejects_bad_hex_lengths() {
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("#ggg").is_err());
        assert!(parse_color("#").is_err());
    }

    #[test]
    fn parses_rgb_functions_in_both_syntaxes() {
        approx(parse_color("rgb(255, 0, 0)").unwrap(), [1.0, 0.0, 0.0]);
        approx(parse_color("rgba(0, 255, 0, 0.5)").unwrap(), [0.0, 1.0, 0.0]);
        approx(parse_color("rgb(0 0 255 / 50%)").unwrap(), [0.0, 0.0, 1.0]);
        approx(parse_color("rgb(100%, 50%, 0%)").unwrap(), [1.0, 0.5, 0.0]);
    }

    #[test]
    fn parses_hsl() {
        approx(parse_color("hsl(0, 100%, 50%)").unwrap(), [1.0, 0.0, 0.0]);
        approx(parse_color("hsl(120deg 100% 25%)").unwrap(), [0.0, 0.5, 0.0]);
        approx(parse_color("hsla(240, 100%, 50%, 0.3)").unwrap(), [0.0, 0.0, 1.0]);
        approx(parse_color("hsl(0, 0%, 50%)").unwrap(), [0.5, 0.5, 0.5]);
    }

    #[test]
    fn parses_named_colors_case_insensitively() {
        approx(parse_color("RebeccaPurple").unwrap(), [0.4, 0.2, 0.6]);
        approx(parse_color("white").unwrap(), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn unknown_color_is_reported_with_its_text() {
        assert_eq!(
            parse_color("notacolor"),
            Err(MalformedGradientError::InvalidColor("notacolor".into()))
        );
        assert!(parse_color("rgb(1, 2)").is_err());
        assert!(parse_color("cmyk(0, 0, 0, 0)").is_err());
    }

    #[test]
    fn quantizes_to_bytes() {
        assert_eq!(Rgb::new(1.0, 0.5, 0.0).to_u8(), [255, 128, 0]);
        assert_eq!(Rgb::new(2.0, -1.0, 0.0).to_u8(), [255, 0, 0]);
    }
}
