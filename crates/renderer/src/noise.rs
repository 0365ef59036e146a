//! Seeded grayscale noise used to dither between color stops.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DEFAULT_NOISE_SEED: &str = "grainy";
pub const DEFAULT_NOISE_SIZE: u32 = 256;

/// Seed for [`generate`]. Numbers are keyed by their decimal form, so
/// `Number(42.0)` and `Text("42")` produce the same texture.
#[derive(Debug, Clone, PartialEq)]
pub enum NoiseSeed {
    Text(String),
    Number(f64),
}

impl NoiseSeed {
    pub fn key(&self) -> String {
        match self {
            NoiseSeed::Text(text) => text.clone(),
            NoiseSeed::Number(value) => value.to_string(),
        }
    }
}

impl Default for NoiseSeed {
    fn default() -> Self {
        NoiseSeed::Text(DEFAULT_NOISE_SEED.to_string())
    }
}

impl fmt::Display for NoiseSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl From<&str> for NoiseSeed {
    fn from(value: &str) -> Self {
        NoiseSeed::Text(value.to_string())
    }
}

impl From<String> for NoiseSeed {
    fn from(value: String) -> Self {
        NoiseSeed::Text(value)
    }
}

impl From<f64> for NoiseSeed {
    fn from(value: f64) -> Self {
        NoiseSeed::Number(value)
    }
}

/// Square RGBA noise texture. Every pixel is gray with alpha 255.
#[derive(Clone, PartialEq, Eq)]
pub struct NoiseImage {
    size: u32,
    pixels: Vec<u8>,
}

impl fmt::Debug for NoiseImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoiseImage")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl NoiseImage {
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn as_rgba(&self) -> &[u8] {
        &self.pixels
    }

    /// Gray level of the texel at `(x, y)`, wrapping both coordinates.
    pub fn value_at(&self, x: i64, y: i64) -> u8 {
        let size = i64::from(self.size);
        let x = x.rem_euclid(size) as usize;
        let y = y.rem_euclid(size) as usize;
        self.pixels[(y * self.size as usize + x) * 4]
    }

    /// Samples at normalized coordinates with repeat addressing, mirroring
    /// the GPU sampler. `nearest` selects point sampling over bilinear.
    pub fn sample(&self, u: f32, v: f32, nearest: bool) -> f32 {
        let size = self.size as f32;
        if nearest {
            let x = (u * size).floor() as i64;
            let y = (v * size).floor() as i64;
            return f32::from(self.value_at(x, y)) / 255.0;
        }
        let x = u * size - 0.5;
        let y = v * size - 0.5;
        let (x0, y0) = (x.floor(), y.floor());
        let (fx, fy) = (x - x0, y - y0);
        let (x0, y0) = (x0 as i64, y0 as i64);
        let texel = |dx: i64, dy: i64| f32::from(self.value_at(x0 + dx, y0 + dy)) / 255.0;
        let top = texel(0, 0) + (texel(1, 0) - texel(0, 0)) * fx;
        let bottom = texel(0, 1) + (texel(1, 1) - texel(0, 1)) * fx;
        top + (bottom - top) * fy
    }

    pub fn to_image(&self) -> image::RgbaImage {
        image::RgbaImage::from_fn(self.size, self.size, |x, y| {
            let value = self.value_at(i64::from(x), i64::from(y));
            image::Rgba([value, value, value, 255])
        })
    }
}

/// Generates a `size`×`size` noise texture. Pure: equal inputs give
/// byte-identical output.
pub fn generate(seed: &NoiseSeed, size: u32) -> NoiseImage {
    let size = size.max(1);
    let key = seed.key();
    let mut rng = StdRng::from_seed(mix_key(&key));
    let texels = size as usize * size as usize;
    let mut pixels = Vec::with_capacity(texels * 4);
    for _ in 0..texels {
        let value = (rng.gen::<f64>() * 255.0).floor() as u8;
        pixels.extend_from_slice(&[value, value, value, 255]);
    }
    tracing::debug!(seed = %key, size, "generated noise texture");
    NoiseImage { size, pixels }
}

/// Folds an arbitrary-length key into a fixed RNG seed, smearing each byte
/// into the previous contents of its slot.
fn mix_key(key: &str) -> [u8; 32] {
    let mut seed = [0u8; 32];
    let mut smear: u32 = 0;
    for (index, byte) in key.bytes().enumerate() {
        let slot = index % seed.len();
        smear ^= u32::from(seed[slot]) * 19;
        seed[slot] = smear.wrapping_add(u32::from(byte)) as u8;
    }
    seed
}
