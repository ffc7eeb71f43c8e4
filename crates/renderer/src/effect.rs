//! CPU reference of the light-ray fragment shader.
//!
//! Every function here mirrors a piece of `EFFECT_FRAGMENT_GLSL` in
//! `compile.rs`; keep the two in step. The reference powers headless still
//! export and the numeric tests of the effect.

use image::{Rgba, RgbaImage};

use crate::logo::LogoImage;
use crate::types::EffectParams;

/// Per-frame inputs, the CPU counterpart of the dynamic uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInputs {
    /// Viewport size in pixels.
    pub resolution: [f32; 2],
    /// Cursor position in pixels, bottom-left origin.
    pub mouse: [f32; 2],
    pub time: f32,
    /// Movement intensity in `[0, 1]`.
    pub is_moving: f32,
    /// Logo width over height.
    pub texture_ratio: f32,
}

impl FrameInputs {
    /// Idle frame with the cursor centred, as shown before any pointer input.
    pub fn idle(width: u32, height: u32, time: f32, texture_ratio: f32) -> Self {
        let resolution = [width.max(1) as f32, height.max(1) as f32];
        Self {
            resolution,
            mouse: [resolution[0] * 0.5, resolution[1] * 0.5],
            time,
            is_moving: 0.0,
            texture_ratio,
        }
    }
}

/// Outcome of marching one ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayMarch {
    pub illumination: f32,
    /// Iterations executed, including the one that hit the `t > 1` guard.
    pub steps: u32,
}

pub fn hash(p: [f32; 2]) -> f32 {
    let v = (p[0] * 12.9898 + p[1] * 78.233).sin() * 43758.5453;
    v - v.floor()
}

fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn inside_unit_square(p: [f32; 2]) -> bool {
    (0.0..=1.0).contains(&p[0]) && (0.0..=1.0).contains(&p[1])
}

/// Maps screen uv to logo uv so the logo is centred and keeps its aspect
/// ratio. The logo is `target_width * height / width` pixels tall, so it
/// keeps a constant share of the viewport width as the window changes aspect.
pub fn scaled_logo_uv(
    uv: [f32; 2],
    resolution: [f32; 2],
    texture_ratio: f32,
    target_width: f32,
) -> [f32; 2] {
    let screen_aspect = resolution[0] / resolution[1];
    let scale = target_width / resolution[0];
    let mut logo = [uv[0] - 0.5, uv[1] - 0.5];
    logo[0] *= screen_aspect / texture_ratio;
    logo[0] /= scale;
    logo[1] /= scale;
    [logo[0] + 0.5, logo[1] + 0.5]
}

/// Focal point the rays radiate from. It moves opposite the cursor so the
/// rays point toward it, and wanders slowly while the pointer is idle.
pub fn ray_origin(mouse_uv: [f32; 2], time: f32, is_moving: f32, params: &EffectParams) -> [f32; 2] {
    let mouse_shift = [
        (mouse_uv[0] - 0.5) * params.mouse_influence,
        (mouse_uv[1] - 0.5) * params.mouse_influence,
    ];
    let auto_shift = [
        (time * 0.5).cos() * params.drift_amplitude,
        (time * 0.3).sin() * params.drift_amplitude,
    ];
    [
        0.5 - mix(auto_shift[0], mouse_shift[0], is_moving),
        0.5 - mix(auto_shift[1], mouse_shift[1], is_moving),
    ]
}

/// Accumulates logo alpha along the segment from `uv` back to `origin`.
///
/// Sampling stops once the march passes the origin (`t > 1`) so the logo is
/// never smeared from the far side, and never runs more than
/// `params.max_steps` iterations.
pub fn march_illumination<F>(
    uv: [f32; 2],
    origin: [f32; 2],
    dither: f32,
    params: &EffectParams,
    mut logo_alpha: F,
) -> RayMarch
where
    F: FnMut([f32; 2]) -> f32,
{
    let ray_dir = [uv[0] - origin[0], uv[1] - origin[1]];
    let mut illumination = 0.0;
    let mut weight = params.ray_weight;
    let mut steps = 0;

    for i in 0..params.clamped_steps() {
        steps += 1;
        let t = (i as f32 + dither) * params.ray_step;
        if t > 1.0 {
            break;
        }
        let sample = [uv[0] - ray_dir[0] * t, uv[1] - ray_dir[1] * t];
        illumination += logo_alpha(sample) * weight;
        weight *= params.ray_decay;
    }

    RayMarch {
        illumination,
        steps,
    }
}

fn logo_alpha_at(
    logo: Option<&LogoImage>,
    uv: [f32; 2],
    frame: &FrameInputs,
    params: &EffectParams,
) -> f32 {
    let Some(logo) = logo else {
        return 0.0;
    };
    let coord = scaled_logo_uv(uv, frame.resolution, frame.texture_ratio, params.target_width);
    if inside_unit_square(coord) {
        logo.sample_alpha(coord)
    } else {
        0.0
    }
}

/// Colour of one pixel; `frag_coord` is the pixel centre with a bottom-left
/// origin.
pub fn shade(
    frag_coord: [f32; 2],
    frame: &FrameInputs,
    params: &EffectParams,
    logo: Option<&LogoImage>,
) -> [f32; 3] {
    let uv = [
        frag_coord[0] / frame.resolution[0],
        frag_coord[1] / frame.resolution[1],
    ];
    let mouse = [
        frame.mouse[0] / frame.resolution[0],
        frame.mouse[1] / frame.resolution[1],
    ];

    let origin = ray_origin(mouse, frame.time, frame.is_moving, params);
    let dither = hash([uv[0] + frame.time, uv[1] + frame.time]);
    let march = march_illumination(uv, origin, dither, params, |sample| {
        logo_alpha_at(logo, sample, frame, params)
    });

    let grain = hash([uv[0] * (frame.time + 1.0), uv[1] * (frame.time + 1.0)]);
    let ray = march.illumination * (0.4 + 0.6 * grain);

    let logo_alpha = logo_alpha_at(logo, uv, frame, params);
    let mut color = mix(ray, params.logo_brightness, logo_alpha * params.logo_opacity);

    let dx = uv[0] - 0.5;
    let dy = uv[1] - 0.5;
    let dist = (dx * dx + dy * dy).sqrt();
    color *= 1.0 - smoothstep(0.4, 1.0, dist);

    [color, color, color]
}

/// Renders a full frame on the CPU.
pub fn render_frame(
    frame: &FrameInputs,
    params: &EffectParams,
    logo: Option<&LogoImage>,
) -> RgbaImage {
    let width = frame.resolution[0].max(1.0) as u32;
    let height = frame.resolution[1].max(1.0) as u32;
    RgbaImage::from_fn(width, height, |x, row| {
        let frag_coord = [x as f32 + 0.5, (height - 1 - row) as f32 + 0.5];
        let rgb = shade(frag_coord, frame, params, logo);
        let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgba([to_byte(rgb[0]), to_byte(rgb[1]), to_byte(rgb[2]), 255])
    })
}
