use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::ImageFormat;
use tracing::{info, warn};

use crate::effect::{render_frame, FrameInputs};
use crate::logo::LogoImage;
use crate::types::RendererConfig;

/// Renders a single idle frame at `time` on the CPU and writes it to `path`
/// as PNG. No window or GPU is involved.
pub(crate) fn export_still(config: &RendererConfig, time: f32, path: &Path) -> Result<PathBuf> {
    let (width, height) = config.surface_size;
    if width == 0 || height == 0 {
        anyhow::bail!("cannot export a {width}x{height} frame");
    }

    let logo = config
        .logo_path
        .as_deref()
        .and_then(|logo_path| match LogoImage::open(logo_path) {
            Ok(logo) => Some(logo),
            Err(err) => {
                warn!(path = %logo_path.display(), error = %err, "failed to load logo; exporting rays only");
                None
            }
        });
    let texture_ratio = logo.as_ref().map(LogoImage::aspect_ratio).unwrap_or(1.0);

    let frame = FrameInputs::idle(width, height, time, texture_ratio);
    let image = render_frame(&frame, &config.effect, logo.as_ref());

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    image
        .save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("failed to write still frame to {}", path.display()))?;

    info!(path = %path.display(), width, height, time, "exported still frame");
    Ok(path.to_path_buf())
}
