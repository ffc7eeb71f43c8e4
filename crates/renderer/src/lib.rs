//! Renderer crate for logolight.
//!
//! Draws a logo lit by radial light rays that follow the mouse, with film
//! grain and a vignette. The overall flow is:
//!
//! ```text
//!   CLI / config file
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ WindowState ──▶ winit event loop ──▶ render_frame()
//!          │                                      │
//!          │                                      └─▶ EffectUniforms ─▶ GPU UBO
//!          └──▶ export_still ──▶ effect::render_frame ──▶ PNG
//! ```
//!
//! `WindowState` owns all GPU resources (surface, device, pipeline, uniforms,
//! logo texture) while `Renderer` is the thin entry point that chooses between
//! the interactive window and a headless still export. The fragment shader is
//! plain Vulkan GLSL compiled through naga; `effect` holds a CPU port of the
//! same math used for exports and tests.

mod compile;
pub mod effect;
mod export;
mod gpu;
pub mod logo;
pub mod motion;
pub mod pointer;
pub mod runtime;
mod types;
mod window;

use std::path::PathBuf;

use anyhow::Result;

pub use runtime::{RenderPolicy, TimeSample};
pub use types::{
    Antialiasing, EffectParams, MotionParams, RendererConfig, CLEAR_COLOR, MAX_RAY_STEPS,
};

/// High-level entry point that owns the chosen configuration.
pub struct Renderer {
    config: RendererConfig,
}

/// What a completed run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The window was closed by the user.
    WindowClosed,
    /// A still frame was written to the given path.
    Exported(PathBuf),
}

impl Renderer {
    /// Builds a renderer for the supplied configuration.
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Runs the configured policy to completion.
    ///
    /// Windowed policies block on the event loop until the window closes and
    /// must be called from the main thread. `RenderPolicy::Export` renders
    /// headlessly and returns as soon as the PNG is written.
    pub fn run(self) -> Result<RunOutcome> {
        match &self.config.policy {
            RenderPolicy::Export { time, path } => {
                let written = export::export_still(&self.config, *time, path)?;
                Ok(RunOutcome::Exported(written))
            }
            RenderPolicy::Animate { .. } | RenderPolicy::Still { .. } => {
                window::run_window(self.config)?;
                Ok(RunOutcome::WindowClosed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn export_policy_runs_without_a_window() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frame.png");
        let config = RendererConfig {
            surface_size: (32, 18),
            policy: RenderPolicy::Export {
                time: 0.5,
                path: path.clone(),
            },
            ..RendererConfig::default()
        };
        let outcome = Renderer::new(config).run().unwrap();
        assert_eq!(outcome, RunOutcome::Exported(path.clone()));
        assert!(path.exists());
    }
}
