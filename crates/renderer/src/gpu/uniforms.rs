use bytemuck::{Pod, Zeroable};

use crate::logo::LogoImage;
use crate::types::EffectParams;

/// CPU mirror of the `EffectParams` uniform block in the fragment shader.
///
/// Every member is a scalar or a `vec2`, so the std140 layout packs without
/// padding and `#[repr(C)]` matches it byte for byte (64 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct EffectUniforms {
    pub resolution: [f32; 2],
    pub mouse: [f32; 2],
    pub time: f32,
    pub texture_ratio: f32,
    pub target_width: f32,
    pub is_moving: f32,
    pub ray_weight: f32,
    pub ray_decay: f32,
    pub ray_step: f32,
    pub max_steps: i32,
    pub mouse_influence: f32,
    pub drift_amplitude: f32,
    pub logo_brightness: f32,
    pub logo_opacity: f32,
}

impl EffectUniforms {
    #[cfg(test)]
    pub(crate) const FIELD_NAMES: [&'static str; 14] = [
        "resolution",
        "mouse",
        "time",
        "texture_ratio",
        "target_width",
        "is_moving",
        "ray_weight",
        "ray_decay",
        "ray_step",
        "max_steps",
        "mouse_influence",
        "drift_amplitude",
        "logo_brightness",
        "logo_opacity",
    ];

    /// Uniforms for a fresh viewport: cursor centred, no movement, and a
    /// square texture ratio until the logo arrives.
    pub fn new(width: u32, height: u32, params: &EffectParams) -> Self {
        let width = width.max(1) as f32;
        let height = height.max(1) as f32;
        Self {
            resolution: [width, height],
            mouse: [width * 0.5, height * 0.5],
            time: 0.0,
            texture_ratio: 1.0,
            target_width: params.target_width,
            is_moving: 0.0,
            ray_weight: params.ray_weight,
            ray_decay: params.ray_decay,
            ray_step: params.ray_step,
            max_steps: params.clamped_steps() as i32,
            mouse_influence: params.mouse_influence,
            drift_amplitude: params.drift_amplitude,
            logo_brightness: params.logo_brightness,
            logo_opacity: params.logo_opacity,
        }
    }

    /// Writes the new viewport size. Zero-area sizes (minimised windows) are
    /// ignored and reported as `false`.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.resolution = [width as f32, height as f32];
        true
    }

    pub fn set_mouse(&mut self, mouse: [f32; 2]) {
        self.mouse = mouse;
    }

    pub fn set_texture_ratio(&mut self, ratio: f32) {
        if ratio.is_finite() && ratio > 0.0 {
            self.texture_ratio = ratio;
        }
    }

    pub fn logo_installed(&mut self, logo: &LogoImage) {
        self.set_texture_ratio(logo.aspect_ratio());
    }

    pub fn update_frame(&mut self, time: f32, is_moving: f32) {
        self.time = time;
        self.is_moving = is_moving.clamp(0.0, 1.0);
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<EffectUniforms>(), 64);
        let uniforms = EffectUniforms::new(800, 600, &EffectParams::default());
        assert_eq!(uniforms.as_bytes().len(), 64);
    }

    #[test]
    fn new_uniforms_start_idle_and_centred() {
        let params = EffectParams::default();
        let uniforms = EffectUniforms::new(800, 600, &params);
        assert_eq!(uniforms.resolution, [800.0, 600.0]);
        assert_eq!(uniforms.mouse, [400.0, 300.0]);
        assert_eq!(uniforms.texture_ratio, 1.0);
        assert_eq!(uniforms.is_moving, 0.0);
        assert_eq!(uniforms.target_width, 300.0);
        assert_eq!(uniforms.max_steps, 100);
    }

    #[test]
    fn resize_writes_exact_resolution() {
        let mut uniforms = EffectUniforms::new(800, 600, &EffectParams::default());
        assert!(uniforms.resize(1913, 1047));
        assert_eq!(uniforms.resolution, [1913.0, 1047.0]);
        let bytes = uniforms.as_bytes();
        assert_eq!(&bytes[0..4], 1913.0f32.to_ne_bytes().as_slice());
        assert_eq!(&bytes[4..8], 1047.0f32.to_ne_bytes().as_slice());
    }

    #[test]
    fn zero_sized_resize_keeps_previous_resolution() {
        let mut uniforms = EffectUniforms::new(800, 600, &EffectParams::default());
        assert!(!uniforms.resize(0, 600));
        assert!(!uniforms.resize(800, 0));
        assert_eq!(uniforms.resolution, [800.0, 600.0]);
    }

    #[test]
    fn installed_logo_sets_width_over_height_ratio() {
        let mut uniforms = EffectUniforms::new(800, 600, &EffectParams::default());
        let logo = LogoImage::from_rgba(6, 2, vec![255; 6 * 2 * 4]).unwrap();
        uniforms.logo_installed(&logo);
        assert_eq!(uniforms.texture_ratio, 3.0);
        let bytes = uniforms.as_bytes();
        assert_eq!(&bytes[20..24], 3.0f32.to_ne_bytes().as_slice());
    }

    #[test]
    fn texture_ratio_ignores_invalid_values() {
        let mut uniforms = EffectUniforms::new(10, 10, &EffectParams::default());
        uniforms.set_texture_ratio(2.5);
        assert_eq!(uniforms.texture_ratio, 2.5);
        uniforms.set_texture_ratio(f32::NAN);
        uniforms.set_texture_ratio(0.0);
        assert_eq!(uniforms.texture_ratio, 2.5);
    }

    #[test]
    fn movement_intensity_is_clamped() {
        let mut uniforms = EffectUniforms::new(10, 10, &EffectParams::default());
        uniforms.update_frame(1.0, 1.7);
        assert_eq!(uniforms.is_moving, 1.0);
        uniforms.update_frame(2.0, -0.2);
        assert_eq!(uniforms.is_moving, 0.0);
        assert_eq!(uniforms.time, 2.0);
    }

    #[test]
    fn step_count_is_capped() {
        let params = EffectParams {
            max_steps: 100_000,
            ..EffectParams::default()
        };
        let uniforms = EffectUniforms::new(10, 10, &params);
        assert_eq!(uniforms.max_steps, crate::types::MAX_RAY_STEPS as i32);
    }
}
