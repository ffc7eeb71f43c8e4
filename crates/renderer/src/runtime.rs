use std::path::PathBuf;
use std::time::{Duration, Instant};

/// High-level behaviour requested by the caller.
///
/// The render policy decides whether frames animate continuously, are
/// evaluated at a fixed timestamp, or are written to disk without a window.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderPolicy {
    /// Run the render loop continuously, optionally clamping the frame rate.
    Animate {
        /// Optional requested frames-per-second cap.
        target_fps: Option<f32>,
    },
    /// Keep showing a single frame evaluated at a fixed timestamp.
    Still {
        /// Timestamp to evaluate the effect at (seconds).
        time: f32,
    },
    /// Render one frame headlessly and write it to disk as PNG.
    Export {
        /// Timestamp to evaluate the effect at (seconds).
        time: f32,
        /// Destination path for the exported file.
        path: PathBuf,
    },
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self::Animate { target_fps: None }
    }
}

/// Snapshot of the time state supplied to the shader uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Elapsed wall-clock or simulated time in seconds.
    pub seconds: f32,
    /// Monotonic frame counter for the running session.
    pub frame_index: u64,
}

impl TimeSample {
    pub fn new(seconds: f32, frame_index: u64) -> Self {
        Self {
            seconds,
            frame_index,
        }
    }
}

/// Abstraction over where time values originate from.
pub trait TimeSource: Send {
    /// Produces a time sample for the next frame.
    fn sample(&mut self) -> TimeSample;
}

/// Time source backed by the system monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
    frame: u64,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
            frame: 0,
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn sample(&mut self) -> TimeSample {
        let elapsed = self.origin.elapsed();
        let sample = TimeSample::new(elapsed.as_secs_f32(), self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Time source that always reports a fixed timestamp.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeSource {
    time: f32,
    frame: u64,
}

impl FixedTimeSource {
    pub fn new(time: f32) -> Self {
        Self { time, frame: 0 }
    }
}

impl TimeSource for FixedTimeSource {
    fn sample(&mut self) -> TimeSample {
        let sample = TimeSample::new(self.time, self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

pub type BoxedTimeSource = Box<dyn TimeSource + Send>;

/// Builds a time source suited to the requested render policy.
pub fn time_source_for_policy(policy: &RenderPolicy) -> BoxedTimeSource {
    match policy {
        RenderPolicy::Animate { .. } => Box::new(SystemTimeSource::new()),
        RenderPolicy::Still { time } | RenderPolicy::Export { time, .. } => {
            Box::new(FixedTimeSource::new(*time))
        }
    }
}

/// Decides when the window loop should issue the next redraw.
///
/// Uncapped animation redraws as soon as the previous frame was handed to the
/// swapchain and lets the present mode pace it against the display refresh.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    interval: Option<Duration>,
    continuous: bool,
    last_frame: Option<Instant>,
    dirty: bool,
}

impl FrameScheduler {
    pub fn new(policy: &RenderPolicy) -> Self {
        let (interval, continuous) = match policy {
            RenderPolicy::Animate { target_fps } => (
                target_fps
                    .filter(|fps| fps.is_finite() && *fps > 0.0)
                    .map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps))),
                true,
            ),
            RenderPolicy::Still { .. } | RenderPolicy::Export { .. } => (None, false),
        };
        Self {
            interval,
            continuous,
            last_frame: None,
            dirty: true,
        }
    }

    pub fn ready_for_frame(&self, now: Instant) -> bool {
        if !self.continuous {
            return self.dirty;
        }
        match (self.interval, self.last_frame) {
            (Some(interval), Some(last)) => now >= last + interval,
            _ => true,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        if !self.continuous {
            return None;
        }
        match (self.interval, self.last_frame) {
            (Some(interval), Some(last)) => Some(last + interval),
            _ => None,
        }
    }

    pub fn mark_rendered(&mut self, now: Instant) {
        self.last_frame = Some(now);
        self.dirty = false;
    }

    /// Forces a redraw of still frames, e.g. after a resize.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }
}
