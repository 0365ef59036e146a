use std::borrow::Cow;

use wgpu::naga::ShaderStage;

/// Compiles the quad vertex shader that forwards per-corner blend factors.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("grain quad vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(vertex_source()),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    })
}

/// Compiles the fragment shader that dithers between color stops.
pub(crate) fn compile_fragment_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("grain fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(fragment_source()),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    })
}

fn vertex_source() -> String {
    format!("#version 450\n{PARAMS_BLOCK}\n{VERTEX_BODY}")
}

fn fragment_source() -> String {
    format!("#version 450\n{PARAMS_BLOCK}\n{FRAGMENT_BODY}")
}

/// Uniform block shared by both stages.
///
/// The layout must match [`GrainUniforms`](crate::gpu::GrainUniforms):
/// `offsets` packs eight floats into two vec4s because std140 pads scalar
/// arrays to 16 bytes per element.
const PARAMS_BLOCK: &str = r"layout(std140, set = 0, binding = 0) uniform GrainParams {
    vec2 scale;
    float shimmer;
    float _padding0;
    vec4 corners;
    vec4 colors[8];
    vec4 offsets[2];
} params;
";

/// Four-vertex triangle strip: top-left, top-right, bottom-left, bottom-right.
const VERTEX_BODY: &str = r"layout(location = 0) out vec2 v_uv;
layout(location = 1) out float v_blend;

const vec2 positions[4] = vec2[4](
    vec2(-1.0, 1.0),
    vec2(1.0, 1.0),
    vec2(-1.0, -1.0),
    vec2(1.0, -1.0)
);

void main() {
    int index = int(gl_VertexIndex);
    vec2 pos = positions[index];
    v_uv = vec2(pos.x * 0.5 + 0.5, 0.5 - pos.y * 0.5);
    v_blend = params.corners[index];
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

const FRAGMENT_BODY: &str = r"layout(location = 0) in vec2 v_uv;
layout(location = 1) in float v_blend;
layout(location = 0) out vec4 out_color;

layout(set = 1, binding = 0) uniform texture2D noise_texture;
layout(set = 1, binding = 1) uniform sampler noise_sampler;

float stop_offset(int index) {
    return params.offsets[index / 4][index % 4];
}

void main() {
    vec2 noise_uv = v_uv * params.scale + vec2(params.shimmer);
    float noise = texture(sampler2D(noise_texture, noise_sampler), noise_uv).r;

    vec3 color = params.colors[0].rgb;
    for (int i = 0; i < 7; i++) {
        float start = stop_offset(i);
        float end = stop_offset(i + 1);
        if (v_blend >= start && v_blend < end) {
            float position = (v_blend - start) / (end - start);
            color = noise < position ? params.colors[i + 1].rgb : params.colors[i].rgb;
        }
    }
    out_color = vec4(color, 1.0);
}
";

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::naga::front::glsl::{Frontend, Options};
    use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};

    fn validate(source: &str, stage: ShaderStage) {
        let module = Frontend::default()
            .parse(&Options::from(stage), source)
            .unwrap_or_else(|err| panic!("{stage:?} stage failed to parse: {err:?}"));
        Validator::new(ValidationFlags::all(), Capabilities::all())
            .validate(&module)
            .unwrap_or_else(|err| panic!("{stage:?} stage failed validation: {err:?}"));
    }

    #[test]
    fn vertex_stage_passes_naga_validation() {
        validate(&vertex_source(), ShaderStage::Vertex);
    }

    #[test]
    fn fragment_stage_passes_naga_validation() {
        validate(&fragment_source(), ShaderStage::Fragment);
    }

    #[test]
    fn both_stages_share_the_uniform_block() {
        let vertex = vertex_source();
        let fragment = fragment_source();
        assert!(vertex.starts_with("#version 450"));
        assert!(fragment.starts_with("#version 450"));
        assert!(vertex.contains(PARAMS_BLOCK));
        assert!(fragment.contains(PARAMS_BLOCK));
    }

    #[test]
    fn fragment_walks_every_bracket() {
        let fragment = fragment_source();
        assert!(fragment.contains("i < 7"));
        assert!(fragment.contains("noise < position"));
        assert!(fragment.contains("params.colors[0].rgb"));
    }
}
