use std::time::{Duration, Instant};

use anyhow::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, info, warn};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::logo::{LogoImage, LogoLoader};
use crate::runtime::TimeSample;
use crate::types::{RendererConfig, CLEAR_COLOR};

use super::context::{AdapterProfile, GpuContext};
use super::pipeline::EffectPipeline;
use super::texture::LogoTexture;
use super::uniforms::EffectUniforms;

struct MultisampleTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl MultisampleTarget {
    fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
        sample_count: u32,
    ) -> Self {
        let extent = wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("msaa color target"),
            size: extent,
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }

    fn for_context(context: &GpuContext) -> Option<Self> {
        (context.sample_count > 1).then(|| {
            Self::new(
                &context.device,
                context.surface_format,
                context.size,
                context.sample_count,
            )
        })
    }
}

/// Owns every GPU resource needed to draw the effect into a window surface.
pub(crate) struct GpuState {
    context: GpuContext,
    pipeline: EffectPipeline,
    uniforms: EffectUniforms,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    _logo: LogoTexture,
    logo_bind_group: wgpu::BindGroup,
    logo_loader: Option<LogoLoader>,
    multisample_target: Option<MultisampleTarget>,
    frames_since_last_update: u32,
    last_fps_update: Instant,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        config: &RendererConfig,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, initial_size, config.antialiasing)?;
        let pipeline =
            EffectPipeline::new(&context.device, context.surface_format, context.sample_count);

        let uniforms =
            EffectUniforms::new(context.size.width, context.size.height, &config.effect);
        let uniform_buffer =
            context
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("effect uniforms"),
                    contents: uniforms.as_bytes(),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
        let uniform_bind_group = pipeline.uniform_bind_group(&context.device, &uniform_buffer);

        let logo = LogoTexture::placeholder(&context.device, &context.queue);
        let logo_bind_group = pipeline.logo_bind_group(&context.device, &logo);

        let logo_loader = match &config.logo_path {
            Some(path) => match LogoLoader::spawn(path.clone()) {
                Ok(loader) => Some(loader),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "logo will not be shown");
                    None
                }
            },
            None => None,
        };

        let multisample_target = MultisampleTarget::for_context(&context);

        Ok(Self {
            context,
            pipeline,
            uniforms,
            uniform_buffer,
            uniform_bind_group,
            _logo: logo,
            logo_bind_group,
            logo_loader,
            multisample_target,
            frames_since_last_update: 0,
            last_fps_update: Instant::now(),
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn adapter_profile(&self) -> &AdapterProfile {
        &self.context.adapter_profile
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if !self.uniforms.resize(new_size.width, new_size.height) {
            return;
        }
        self.context.resize(new_size);
        self.multisample_target = MultisampleTarget::for_context(&self.context);
    }

    /// Reconfigures the swapchain with the current size after a lost or
    /// outdated surface.
    pub(crate) fn recover_surface(&mut self) {
        self.context.reconfigure();
    }

    /// Draws one frame. `mouse` is in pixels with a bottom-left origin.
    pub(crate) fn render(
        &mut self,
        mouse: [f32; 2],
        is_moving: f32,
        time_sample: TimeSample,
    ) -> Result<(), wgpu::SurfaceError> {
        self.poll_logo();

        let frame = self.context.surface.get_current_texture()?;

        let now = Instant::now();
        self.frames_since_last_update += 1;
        let elapsed_since_fps_update = now.saturating_duration_since(self.last_fps_update);
        if elapsed_since_fps_update >= Duration::from_secs(1) {
            let fps = self.frames_since_last_update as f32 / elapsed_since_fps_update.as_secs_f32();
            self.frames_since_last_update = 0;
            self.last_fps_update = now;
            debug!(
                fps = fps.round(),
                frame = time_sample.frame_index,
                time = time_sample.seconds,
                is_moving,
                "render stats"
            );
        }

        self.uniforms.set_mouse(mouse);
        self.uniforms.update_frame(time_sample.seconds, is_moving);
        self.context
            .queue
            .write_buffer(&self.uniform_buffer, 0, self.uniforms.as_bytes());

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("render encoder"),
                });
        self.encode_draw(&mut encoder, &view);
        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn encode_draw(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let (attachment_view, resolve_target) = match self.multisample_target.as_ref() {
            Some(msaa) => (&msaa.view, Some(view)),
            None => (view, None),
        };
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("light ray pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: attachment_view,
                depth_slice: None,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        render_pass.set_pipeline(&self.pipeline.pipeline);
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        render_pass.set_bind_group(1, &self.logo_bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }

    /// Swaps in the decoded logo once the loader thread delivers it. A failed
    /// decode leaves the transparent placeholder bound, so only rays render.
    fn poll_logo(&mut self) {
        let Some(loader) = self.logo_loader.as_ref() else {
            return;
        };
        let Some(result) = loader.poll() else {
            return;
        };
        let path = loader.path().to_path_buf();
        self.logo_loader = None;

        match result {
            Ok(image) => {
                if let Err(err) = self.install_logo(&image) {
                    warn!(path = %path.display(), error = %err, "logo will not be shown");
                    return;
                }
                info!(
                    path = %path.display(),
                    width = image.width(),
                    height = image.height(),
                    "logo loaded"
                );
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to load logo; rendering rays only");
            }
        }
    }

    fn install_logo(&mut self, image: &LogoImage) -> Result<()> {
        check_logo_fits(image, self.context.device.limits().max_texture_dimension_2d)?;
        let texture = LogoTexture::from_image(&self.context.device, &self.context.queue, image);
        self.logo_bind_group = self.pipeline.logo_bind_group(&self.context.device, &texture);
        self.uniforms.logo_installed(image);
        self._logo = texture;
        Ok(())
    }
}

fn check_logo_fits(image: &LogoImage, max_dimension: u32) -> Result<()> {
    if image.width() > max_dimension || image.height() > max_dimension {
        anyhow::bail!(
            "logo is {}x{} but the GPU supports at most {max_dimension} pixels per side",
            image.width(),
            image.height()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logo(width: u32, height: u32) -> LogoImage {
        LogoImage::from_rgba(width, height, vec![0; (width * height * 4) as usize]).unwrap()
    }

    #[test]
    fn logo_within_texture_limit_is_accepted() {
        assert!(check_logo_fits(&logo(8, 4), 8).is_ok());
    }

    #[test]
    fn oversized_logo_is_rejected() {
        let err = check_logo_fits(&logo(9, 4), 8).unwrap_err();
        assert!(err.to_string().contains("9x4"), "{err}");
        assert!(check_logo_fits(&logo(4, 9), 8).is_err());
    }
}
