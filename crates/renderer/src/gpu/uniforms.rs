use bytemuck::{Pod, Zeroable};
use gradient::MAX_STOPS;

use crate::frame::FrameParameters;

/// CPU mirror of the `GrainParams` uniform block (std140).
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrainUniforms {
    pub scale: [f32; 2],
    pub shimmer: f32,
    pub _padding0: f32,
    pub corners: [f32; 4],
    pub colors: [[f32; 4]; MAX_STOPS],
    pub offsets: [[f32; 4]; MAX_STOPS / 4],
}

unsafe impl Zeroable for GrainUniforms {}
unsafe impl Pod for GrainUniforms {}

impl GrainUniforms {
    pub fn from_frame(frame: &FrameParameters) -> Self {
        let gradient = &frame.gradient;
        let colors = gradient.colors.map(|color| {
            let [r, g, b] = color.to_array();
            [r, g, b, 1.0]
        });
        let mut offsets = [[0.0; 4]; MAX_STOPS / 4];
        for (index, offset) in gradient.offsets.iter().enumerate() {
            // sentinels go up as the largest finite float
            offsets[index / 4][index % 4] = if offset.is_finite() {
                *offset
            } else {
                f32::MAX
            };
        }
        Self {
            scale: frame.scale,
            shimmer: frame.shimmer,
            _padding0: 0.0,
            corners: gradient.corners,
            colors,
            offsets,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::frame_parameters;
    use crate::types::{GradientSource, RenderOptions, Size};

    fn uniforms_for(description: &str) -> GrainUniforms {
        let frame = frame_parameters(
            &GradientSource::from(description),
            &RenderOptions::default(),
            Size::new(400, 200),
            0.0,
        )
        .unwrap();
        GrainUniforms::from_frame(&frame)
    }

    #[test]
    fn layout_matches_std140_block() {
        assert_eq!(std::mem::size_of::<GrainUniforms>(), 192);
        assert_eq!(std::mem::align_of::<GrainUniforms>(), 16);
        assert_eq!(std::mem::offset_of!(GrainUniforms, corners), 16);
        assert_eq!(std::mem::offset_of!(GrainUniforms, colors), 32);
        assert_eq!(std::mem::offset_of!(GrainUniforms, offsets), 160);
    }

    #[test]
    fn packs_offsets_and_replaces_sentinels() {
        let uniforms = uniforms_for("linear-gradient(90deg, #000, #fff)");
        assert_eq!(uniforms.offsets[0], [0.0, 1.0, f32::MAX, f32::MAX]);
        assert_eq!(uniforms.offsets[1], [f32::MAX; 4]);
        assert_eq!(uniforms.colors[0], [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(uniforms.colors[1], [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(uniforms.colors[7], [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn bytes_cover_the_whole_block() {
        let uniforms = uniforms_for("linear-gradient(red, lime 30%, blue 60%, white)");
        let bytes = uniforms.as_bytes();
        assert_eq!(bytes.len(), 192);
        let third_offset = f32::from_ne_bytes(bytes[168..172].try_into().unwrap());
        assert!((third_offset - 0.6).abs() < 1e-6);
    }
}
