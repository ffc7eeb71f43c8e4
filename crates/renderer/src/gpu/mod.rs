//! wgpu side of the renderer.
//!
//! - `context` owns the instance, adapter, device and surface, and rebuilds
//!   swapchain state when the window resizes.
//! - `pipeline` builds the single light-ray render pipeline and its two bind
//!   group layouts.
//! - `texture` uploads the logo (or a transparent placeholder).
//! - `uniforms` mirrors the shader's uniform block.
//! - `state` glues everything together behind the `GpuState` API used by
//!   `window`.

mod context;
mod pipeline;
mod state;
mod texture;
mod uniforms;

pub(crate) use state::GpuState;
#[cfg(test)]
pub(crate) use uniforms::EffectUniforms;
