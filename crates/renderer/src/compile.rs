use std::borrow::Cow;

use wgpu::naga::ShaderStage;

/// Compiles the static full-screen triangle vertex shader.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("fullscreen triangle vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(VERTEX_SHADER_GLSL),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    })
}

/// Compiles the light-ray fragment shader.
pub(crate) fn compile_fragment_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("light ray fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(EFFECT_FRAGMENT_GLSL),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    })
}

/// Light-ray fragment shader.
///
/// The uniform block layout must match [`EffectUniforms`](crate::gpu::EffectUniforms)
/// field for field. The math mirrors `crate::effect`. Texture reads use an
/// explicit LOD because the march loop exits on a per-pixel condition.
pub(crate) const EFFECT_FRAGMENT_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform EffectParams {
    vec2 resolution;
    vec2 mouse;
    float time;
    float texture_ratio;
    float target_width;
    float is_moving;
    float ray_weight;
    float ray_decay;
    float ray_step;
    int max_steps;
    float mouse_influence;
    float drift_amplitude;
    float logo_brightness;
    float logo_opacity;
} params;

layout(set = 1, binding = 0) uniform texture2D logo_texture;
layout(set = 1, binding = 1) uniform sampler logo_sampler;

float hash(vec2 p) {
    return fract(sin(dot(p, vec2(12.9898, 78.233))) * 43758.5453);
}

vec2 scaled_logo_uv(vec2 uv) {
    float screen_aspect = params.resolution.x / params.resolution.y;
    float scale = params.target_width / params.resolution.x;
    vec2 logo = uv - 0.5;
    logo.x *= screen_aspect / params.texture_ratio;
    logo /= scale;
    return logo + 0.5;
}

float logo_alpha(vec2 uv) {
    vec2 coord = scaled_logo_uv(uv);
    if (coord.x < 0.0 || coord.x > 1.0 || coord.y < 0.0 || coord.y > 1.0) {
        return 0.0;
    }
    return textureLod(sampler2D(logo_texture, logo_sampler), coord, 0.0).a;
}

void main() {
    // wgpu's gl_FragCoord has a top-left origin; the effect works bottom-left.
    vec2 frag = vec2(gl_FragCoord.x, params.resolution.y - gl_FragCoord.y);
    vec2 uv = frag / params.resolution;
    vec2 mouse = params.mouse / params.resolution;

    vec2 mouse_shift = (mouse - 0.5) * params.mouse_influence;
    vec2 auto_shift = vec2(cos(params.time * 0.5), sin(params.time * 0.3)) * params.drift_amplitude;
    vec2 ray_origin = vec2(0.5) - mix(auto_shift, mouse_shift, params.is_moving);

    float illumination = 0.0;
    float weight = params.ray_weight;
    float dither = hash(uv + params.time);
    vec2 ray_dir = uv - ray_origin;

    for (int i = 0; i < params.max_steps; i++) {
        float t = (float(i) + dither) * params.ray_step;
        if (t > 1.0) {
            break;
        }
        illumination += logo_alpha(uv - ray_dir * t) * weight;
        weight *= params.ray_decay;
    }

    float grain = hash(uv * (params.time + 1.0));
    vec3 ray_color = vec3(illumination * (0.4 + 0.6 * grain));

    float center_alpha = logo_alpha(uv);
    vec3 color = mix(ray_color, vec3(params.logo_brightness), center_alpha * params.logo_opacity);

    float dist = distance(uv, vec2(0.5));
    color *= 1.0 - smoothstep(0.4, 1.0, dist);

    outColor = vec4(color, 1.0);
}
";

/// Minimal full-screen triangle vertex shader. Vertices 0..3 land on
/// (-1,-1), (3,-1) and (-1,3), covering the viewport with one triangle.
const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

void main() {
    int index = int(gl_VertexIndex);
    vec2 pos = vec2(float((index << 1) & 2), float(index & 2)) * 2.0 - 1.0;
    v_uv = pos * 0.5 + vec2(0.5, 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";
