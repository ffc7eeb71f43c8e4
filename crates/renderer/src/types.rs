use std::path::PathBuf;

use crate::runtime::RenderPolicy;

/// Background colour behind the effect (`#0a0a0a`).
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 10.0 / 255.0,
    g: 10.0 / 255.0,
    b: 10.0 / 255.0,
    a: 1.0,
};

/// Upper bound on ray-march iterations the shader will honour.
pub const MAX_RAY_STEPS: u32 = 512;

/// Anti-aliasing policy for the render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Antialiasing {
    /// Pick the highest sample count supported by the surface format.
    #[default]
    Auto,
    /// Disable MSAA and render directly into the swapchain.
    Off,
    /// Request a specific MSAA sample count (clamped to what the device supports).
    Samples(u32),
}

/// Constants of the light-ray effect, shared by the GPU shader and the CPU
/// reference renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectParams {
    /// Logo scale: the logo is `target_width * height / width` pixels tall.
    pub target_width: f32,
    /// Contribution of the first ray sample.
    pub ray_weight: f32,
    /// Per-step multiplier applied to the sample weight.
    pub ray_decay: f32,
    /// Distance travelled along the ray per step, in units of the ray length.
    pub ray_step: f32,
    pub max_steps: u32,
    /// How far the focal point follows the cursor.
    pub mouse_influence: f32,
    /// Radius of the idle focal-point wander.
    pub drift_amplitude: f32,
    pub logo_brightness: f32,
    pub logo_opacity: f32,
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            target_width: 300.0,
            ray_weight: 0.15,
            ray_decay: 0.95,
            ray_step: 0.015,
            max_steps: 100,
            mouse_influence: 0.8,
            drift_amplitude: 0.05,
            logo_brightness: 0.9,
            logo_opacity: 0.95,
        }
    }
}

impl EffectParams {
    pub(crate) fn clamped_steps(&self) -> u32 {
        self.max_steps.min(MAX_RAY_STEPS)
    }
}

/// Rates for the movement-intensity envelope, expressed per 60 Hz frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionParams {
    /// Fraction of the gap to the target closed each frame.
    pub smoothing: f32,
    /// Amount subtracted from the target each frame.
    pub decay: f32,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            smoothing: 0.05,
            decay: 0.01,
        }
    }
}

/// Immutable configuration passed to the renderer at start-up.
///
/// `RendererConfig` mirrors the merged CLI flags and config file: which logo
/// to light, how large the window should be, and how frames are produced.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Window size (or export size) in physical pixels.
    pub surface_size: (u32, u32),
    /// Raster image lit by the rays. `None` renders rays without a logo.
    pub logo_path: Option<PathBuf>,
    /// Anti-aliasing mode requested by the caller.
    pub antialiasing: Antialiasing,
    pub effect: EffectParams,
    pub motion: MotionParams,
    /// High-level render behaviour requested by the caller.
    pub policy: RenderPolicy,
}

impl Default for RendererConfig {
    /// Provides a 1280x720 animated configuration with no logo selected.
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            logo_path: None,
            antialiasing: Antialiasing::default(),
            effect: EffectParams::default(),
            motion: MotionParams::default(),
            policy: RenderPolicy::default(),
        }
    }
}
