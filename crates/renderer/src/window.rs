use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use tracing::{error, info, warn};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::gpu::GpuState;
use crate::motion::MotionState;
use crate::pointer::PointerState;
use crate::runtime::{
    time_source_for_policy, BoxedTimeSource, FrameScheduler, RenderPolicy, TimeSample,
};
use crate::types::RendererConfig;

const SOFTWARE_FPS_CAP: f32 = 15.0;

/// GPU state plus the input-driven parts of the effect for one window.
pub(crate) struct WindowState {
    // Declared before `window` so the surface is dropped first.
    gpu: GpuState,
    window: Arc<Window>,
    pointer: PointerState,
    motion: MotionState,
    last_frame: Option<Instant>,
}

impl WindowState {
    pub(crate) fn new(window: Arc<Window>, config: &RendererConfig) -> Result<Self> {
        let size = window.inner_size();
        let gpu = GpuState::new(window.as_ref(), size, config)?;
        Ok(Self {
            gpu,
            window,
            pointer: PointerState::new(),
            motion: MotionState::new(config.motion),
            last_frame: None,
        })
    }

    pub(crate) fn window(&self) -> &Window {
        self.window.as_ref()
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.gpu.size()
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.gpu.resize(new_size);
    }

    pub(crate) fn handle_cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        self.pointer.moved_to(position.x, position.y);
        self.motion.pointer_moved();
    }

    pub(crate) fn motion_settled(&self) -> bool {
        self.motion.is_settled()
    }

    pub(crate) fn render_frame(
        &mut self,
        time_sample: TimeSample,
        now: Instant,
    ) -> Result<(), wgpu::SurfaceError> {
        let elapsed = self
            .last_frame
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or(Duration::ZERO);
        self.last_frame = Some(now);
        let is_moving = self.motion.advance(elapsed);

        let size = self.size();
        let mouse = self.pointer.shader_position(size.width, size.height);
        self.gpu.render(mouse, is_moving, time_sample)
    }

    fn recover_surface(&mut self) {
        self.gpu.recover_surface();
    }
}

/// Couples the frame scheduler with the time source for the active policy.
pub(crate) struct RenderPolicyDriver {
    scheduler: FrameScheduler,
    time_source: BoxedTimeSource,
}

impl RenderPolicyDriver {
    pub(crate) fn new(policy: &RenderPolicy) -> Self {
        Self {
            scheduler: FrameScheduler::new(policy),
            time_source: time_source_for_policy(policy),
        }
    }

    pub(crate) fn sample(&mut self) -> TimeSample {
        self.time_source.sample()
    }

    pub(crate) fn mark_rendered(&mut self, now: Instant) {
        self.scheduler.mark_rendered(now);
    }

    pub(crate) fn invalidate(&mut self) {
        self.scheduler.invalidate();
    }

    pub(crate) fn ready_for_frame(&self, now: Instant) -> bool {
        self.scheduler.ready_for_frame(now)
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }
}

/// Applies the software-rasterizer frame cap when the caller left the rate
/// uncapped. Returns the cap that was applied, if any.
pub(crate) fn apply_software_cap(policy: &mut RenderPolicy, is_software: bool) -> Option<f32> {
    if !is_software {
        return None;
    }
    match policy {
        RenderPolicy::Animate { target_fps } if target_fps.is_none() => {
            *target_fps = Some(SOFTWARE_FPS_CAP);
            Some(SOFTWARE_FPS_CAP)
        }
        _ => None,
    }
}

fn is_escape(event: &KeyEvent) -> bool {
    event.state == ElementState::Pressed
        && matches!(event.logical_key, Key::Named(NamedKey::Escape))
}

/// Opens the window and drives the effect until the user closes it.
pub(crate) fn run_window(config: RendererConfig) -> Result<()> {
    let event_loop =
        EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let window_size = PhysicalSize::new(config.surface_size.0, config.surface_size.1);
    let window = WindowBuilder::new()
        .with_title("logolight")
        .with_inner_size(window_size)
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);

    let mut state = WindowState::new(window, &config)
        .map_err(|err| anyhow!("failed to initialise window renderer: {err}"))?;

    let profile = state.gpu.adapter_profile().clone();
    let mut policy = config.policy.clone();
    if let Some(cap) = apply_software_cap(&mut policy, profile.is_software()) {
        warn!(
            adapter = %profile.name,
            backend = ?profile.backend,
            cap,
            "software rasterizer detected; capping to {} FPS (override with --fps)",
            cap
        );
    }
    let continuous = matches!(policy, RenderPolicy::Animate { .. });
    let mut policy_driver = RenderPolicyDriver::new(&policy);
    info!(
        adapter = %profile.name,
        width = state.size().width,
        height = state.size().height,
        ?policy,
        "window ready"
    );
    state.window().request_redraw();

    let run_result = event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
            match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    elwt.exit();
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if is_escape(&event) {
                        elwt.exit();
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    state.handle_cursor_moved(position);
                    if !continuous {
                        policy_driver.invalidate();
                    }
                }
                WindowEvent::Resized(new_size) => {
                    state.resize(new_size);
                    policy_driver.invalidate();
                    state.window().request_redraw();
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    match state.render_frame(policy_driver.sample(), now) {
                        Ok(()) => {
                            policy_driver.mark_rendered(now);
                            // Still frames keep redrawing until the rays settle.
                            if !continuous && !state.motion_settled() {
                                policy_driver.invalidate();
                            }
                        }
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            state.recover_surface();
                            policy_driver.invalidate();
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            error!("surface out of memory; exiting");
                            elwt.exit();
                        }
                        Err(wgpu::SurfaceError::Timeout) => {
                            warn!("surface timeout; retrying next frame");
                        }
                        Err(other) => {
                            warn!(error = ?other, "surface error; retrying next frame");
                        }
                    }
                }
                _ => {}
            }
        }
        Event::AboutToWait => {
            let now = Instant::now();
            if policy_driver.ready_for_frame(now) {
                tracing::trace!("scheduler: issuing redraw now");
                state.window().request_redraw();
                elwt.set_control_flow(ControlFlow::Wait);
            } else if let Some(deadline) = policy_driver.next_deadline() {
                tracing::trace!(
                    deadline_ms = deadline.saturating_duration_since(now).as_millis(),
                    "scheduler: waiting until next frame"
                );
                elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
            } else {
                elwt.set_control_flow(ControlFlow::Wait);
            }
        }
        _ => {}
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}
