//! Movement-intensity envelope.
//!
//! Pointer movement pushes the target to 1.0; every frame the current value
//! eases toward the target while the target bleeds back to zero. The shader
//! uses the current value to blend idle drift with cursor-driven rays.

use std::time::Duration;

use crate::types::MotionParams;

/// Frame rate the per-frame rates in [`MotionParams`] are expressed at.
pub const REFERENCE_FRAME_RATE: f32 = 60.0;

/// Long stalls (window drags, debugger pauses) count as at most this many frames.
const MAX_CATCHUP_FRAMES: f32 = 120.0;

const SETTLED_THRESHOLD: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionState {
    current: f32,
    target: f32,
    params: MotionParams,
    /// Set when movement starts from rest; the next step counts as one frame.
    resuming: bool,
}

impl MotionState {
    pub fn new(params: MotionParams) -> Self {
        Self {
            current: 0.0,
            target: 0.0,
            params,
            resuming: false,
        }
    }

    pub fn intensity(&self) -> f32 {
        self.current
    }

    pub fn pointer_moved(&mut self) {
        if self.is_settled() {
            // The gap since the last frame was spent idle, not easing.
            self.resuming = true;
        }
        self.target = 1.0;
    }

    /// True once the envelope has returned to rest and further frames would
    /// not change the intensity visibly.
    pub fn is_settled(&self) -> bool {
        self.target <= 0.0 && self.current < SETTLED_THRESHOLD
    }

    /// Steps the envelope forward by `elapsed` and returns the new intensity.
    pub fn advance(&mut self, elapsed: Duration) -> f32 {
        let mut frames =
            (elapsed.as_secs_f32() * REFERENCE_FRAME_RATE).clamp(0.0, MAX_CATCHUP_FRAMES);
        if frames <= 0.0 {
            return self.current;
        }
        if std::mem::take(&mut self.resuming) {
            frames = frames.min(1.0);
        }

        let smoothing = self.params.smoothing.clamp(0.0, 1.0);
        let blend = 1.0 - (1.0 - smoothing).powf(frames);
        self.current += (self.target - self.current) * blend;
        self.current = self.current.clamp(0.0, 1.0);
        self.target = (self.target - self.params.decay * frames).max(0.0);
        self.current
    }
}

impl Default for MotionState {
    fn default() -> Self {
        Self::new(MotionParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_nanos(16_666_667);

    #[test]
    fn idle_state_stays_at_zero() {
        let mut motion = MotionState::default();
        for _ in 0..100 {
            assert_eq!(motion.advance(FRAME), 0.0);
        }
    }

    #[test]
    fn single_frame_matches_per_frame_update() {
        let mut motion = MotionState::default();
        motion.pointer_moved();
        let value = motion.advance(FRAME);
        assert!((value - 0.05).abs() < 1e-4, "got {value}");
        // target dropped by one decay step
        assert!((motion.target - 0.99).abs() < 1e-4);
    }

    #[test]
    fn intensity_rises_then_decays_back() {
        let mut motion = MotionState::default();
        motion.pointer_moved();
        let mut peak: f32 = 0.0;
        for _ in 0..60 {
            peak = peak.max(motion.advance(FRAME));
        }
        assert!(peak > 0.5);
        for _ in 0..600 {
            motion.advance(FRAME);
        }
        assert!(motion.intensity() < 0.01);
    }

    #[test]
    fn intensity_stays_in_unit_range() {
        let mut motion = MotionState::new(MotionParams {
            smoothing: 1.0,
            decay: 1.0,
        });
        let steps = [
            Duration::ZERO,
            FRAME,
            Duration::from_millis(1),
            Duration::from_secs(3),
            Duration::from_millis(250),
        ];
        for (index, step) in steps.iter().cycle().take(200).enumerate() {
            if index % 3 == 0 {
                motion.pointer_moved();
            }
            let value = motion.advance(*step);
            assert!((0.0..=1.0).contains(&value), "intensity {value} out of range");
        }
    }

    #[test]
    fn target_never_goes_negative() {
        let mut motion = MotionState::default();
        motion.pointer_moved();
        motion.advance(FRAME);
        motion.advance(Duration::from_secs(10));
        assert_eq!(motion.target, 0.0);
        assert!(motion.intensity() >= 0.0);
    }

    #[test]
    fn settles_after_movement_stops() {
        let mut motion = MotionState::default();
        assert!(motion.is_settled());
        motion.pointer_moved();
        assert!(!motion.is_settled());
        for _ in 0..1200 {
            motion.advance(FRAME);
        }
        assert!(motion.is_settled());
    }

    #[test]
    fn movement_after_a_long_idle_gap_eases_in() {
        let mut motion = MotionState::default();
        motion.pointer_moved();
        for _ in 0..1200 {
            motion.advance(FRAME);
        }
        assert!(motion.is_settled());

        // A paused still frame wakes up seconds after its last redraw.
        motion.pointer_moved();
        let first = motion.advance(Duration::from_secs(3));
        assert!((first - 0.05).abs() < 1e-3, "got {first}");
        let second = motion.advance(FRAME);
        assert!(second > first && second < 0.15, "got {second}");
    }

    #[test]
    fn catch_up_still_applies_while_moving() {
        let mut motion = MotionState::default();
        motion.pointer_moved();
        motion.advance(FRAME);
        motion.pointer_moved();
        let value = motion.advance(FRAME * 10);
        assert!(value > 0.3, "got {value}");
    }

    #[test]
    fn zero_elapsed_is_a_no_op() {
        let mut motion = MotionState::default();
        motion.pointer_moved();
        assert_eq!(motion.advance(Duration::ZERO), 0.0);
        assert_eq!(motion.target, 1.0);
    }
}
