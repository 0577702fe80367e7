//! Frame clock utilities for timeline math.
//!
//! Every clip in a composition is normalized to one frame rate, so all
//! durations eventually have to land on whole frames. This module provides:
//! - Conversion between seconds and frame counts
//! - The one-frame tolerance used to judge timeline drift

/// Converts between seconds and whole frames at a fixed rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameClock {
    fps: u32,
}

impl FrameClock {
    /// Create a clock for the given frame rate (clamped to at least 1).
    pub fn new(fps: u32) -> Self {
        Self { fps: fps.max(1) }
    }

    /// Frame rate in frames per second.
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Duration of a single frame in seconds.
    pub fn frame_secs(&self) -> f64 {
        1.0 / self.fps as f64
    }

    /// Nearest frame index for a timestamp.
    pub fn frame_at(&self, secs: f64) -> u64 {
        (secs.max(0.0) * self.fps as f64).round() as u64
    }

    /// Duration in seconds of a whole number of frames.
    pub fn frames_to_secs(&self, frames: u64) -> f64 {
        frames as f64 / self.fps as f64
    }

    /// Whether two durations agree within one frame.
    pub fn within_one_frame(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.frame_secs() + 1e-9
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_secs_at_25fps() {
        let clock = FrameClock::new(25);
        assert!((clock.frame_secs() - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_frame_at_rounds_to_nearest() {
        let clock = FrameClock::new(25);
        assert_eq!(clock.frame_at(5.5), 138);
        assert_eq!(clock.frame_at(0.019), 0);
        assert_eq!(clock.frame_at(0.021), 1);
        assert_eq!(clock.frame_at(-1.0), 0);
    }

    #[test]
    fn test_one_frame_tolerance() {
        let clock = FrameClock::new(25);
        assert!(clock.within_one_frame(33.0, 33.04));
        assert!(!clock.within_one_frame(33.0, 33.05));
    }

    #[test]
    fn test_zero_fps_is_clamped() {
        let clock = FrameClock::new(0);
        assert_eq!(clock.fps(), 1);
        assert_eq!(clock.frames_to_secs(3), 3.0);
    }
}
