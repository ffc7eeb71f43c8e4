use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{bounded, Receiver, TryRecvError};
use image::imageops::flip_vertical_in_place;
use image::GenericImageView;

/// Decoded logo pixels, stored bottom row first so that `v = 0` addresses the
/// bottom of the image like the shader's coordinate space.
#[derive(Clone)]
pub struct LogoImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl std::fmt::Debug for LogoImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogoImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl LogoImage {
    pub fn open(path: &Path) -> Result<Self> {
        let image = image::open(path)
            .with_context(|| format!("failed to open logo at {}", path.display()))?;
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            anyhow::bail!("logo at {} has no pixels", path.display());
        }
        let mut rgba = image.to_rgba8();
        flip_vertical_in_place(&mut rgba);
        Ok(Self {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }

    /// Builds a logo from top-row-first RGBA8 pixels.
    pub fn from_rgba(width: u32, height: u32, mut pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            anyhow::bail!(
                "logo buffer of {} bytes does not match {width}x{height} RGBA",
                pixels.len()
            );
        }
        let stride = width as usize * 4;
        let rows = height as usize;
        for row in 0..rows / 2 {
            let (top, bottom) = pixels.split_at_mut((rows - 1 - row) * stride);
            top[row * stride..(row + 1) * stride].swap_with_slice(&mut bottom[..stride]);
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width over height; feeds the shader's `texture_ratio`.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// RGBA8 pixels, bottom row first.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Bilinear alpha lookup with clamp-to-edge addressing; `uv` has a
    /// bottom-left origin.
    pub fn sample_alpha(&self, uv: [f32; 2]) -> f32 {
        let x = uv[0] * self.width as f32 - 0.5;
        let y = uv[1] * self.height as f32 - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;

        let a00 = self.alpha_at(x0 as i64, y0 as i64);
        let a10 = self.alpha_at(x0 as i64 + 1, y0 as i64);
        let a01 = self.alpha_at(x0 as i64, y0 as i64 + 1);
        let a11 = self.alpha_at(x0 as i64 + 1, y0 as i64 + 1);

        let bottom = a00 + (a10 - a00) * fx;
        let top = a01 + (a11 - a01) * fx;
        bottom + (top - bottom) * fy
    }

    fn alpha_at(&self, x: i64, y: i64) -> f32 {
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        let offset = (y * self.width as usize + x) * 4 + 3;
        self.pixels[offset] as f32 / 255.0
    }
}

/// Decodes the logo on a worker thread so the first frames are not held up
/// by image decoding.
pub struct LogoLoader {
    path: PathBuf,
    receiver: Receiver<Result<LogoImage>>,
}

impl LogoLoader {
    pub fn spawn(path: PathBuf) -> Result<Self> {
        let (sender, receiver) = bounded(1);
        let worker_path = path.clone();
        thread::Builder::new()
            .name("logolight-logo".into())
            .spawn(move || {
                let _ = sender.send(LogoImage::open(&worker_path));
            })
            .map_err(|err| anyhow!("failed to spawn logo loader thread: {err}"))?;
        Ok(Self { path, receiver })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the decode result once it is available.
    pub fn poll(&self) -> Option<Result<LogoImage>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(anyhow!(
                "logo loader exited before returning a result"
            ))),
        }
    }

    #[cfg(test)]
    fn wait(self) -> Result<LogoImage> {
        self.receiver
            .recv()
            .map_err(|_| anyhow!("logo loader exited before returning a result"))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    /// 4x2 image: top row opaque, bottom row transparent.
    fn write_test_logo(dir: &TempDir) -> PathBuf {
        let mut image = RgbaImage::from_pixel(4, 2, Rgba([255, 255, 255, 0]));
        for x in 0..4 {
            image.put_pixel(x, 0, Rgba([255, 255, 255, 255]));
        }
        let path = dir.path().join("logo.png");
        image.save(&path).unwrap();
        path
    }

    #[test]
    fn aspect_ratio_is_width_over_height() {
        let dir = TempDir::new().unwrap();
        let logo = LogoImage::open(&write_test_logo(&dir)).unwrap();
        assert_eq!((logo.width(), logo.height()), (4, 2));
        assert_eq!(logo.aspect_ratio(), 2.0);
    }

    #[test]
    fn pixels_are_stored_bottom_row_first() {
        let dir = TempDir::new().unwrap();
        let logo = LogoImage::open(&write_test_logo(&dir)).unwrap();
        // row 0 is the image's bottom (transparent) row
        assert_eq!(logo.pixels()[3], 0);
        assert_eq!(logo.pixels()[4 * 4 + 3], 255);
        assert_eq!(logo.sample_alpha([0.5, 0.0]), 0.0);
        assert_eq!(logo.sample_alpha([0.5, 1.0]), 1.0);
        assert!((logo.sample_alpha([0.5, 0.5]) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn from_rgba_matches_decoded_layout() {
        let dir = TempDir::new().unwrap();
        let path = write_test_logo(&dir);
        let decoded = LogoImage::open(&path).unwrap();
        let raw = image::open(&path).unwrap().to_rgba8();
        let built = LogoImage::from_rgba(4, 2, raw.into_raw()).unwrap();
        assert_eq!(built.pixels(), decoded.pixels());
        assert!(LogoImage::from_rgba(4, 2, vec![0; 3]).is_err());
    }

    #[test]
    fn loader_reports_decoded_logo() {
        let dir = TempDir::new().unwrap();
        let loader = LogoLoader::spawn(write_test_logo(&dir)).unwrap();
        let logo = loader.wait().unwrap();
        assert_eq!(logo.aspect_ratio(), 2.0);
    }

    #[test]
    fn loader_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let loader = LogoLoader::spawn(dir.path().join("missing.png")).unwrap();
        assert!(loader.wait().is_err());
    }
}
