//! Duration synchronization.
//!
//! Scripted scene durations are word-count estimates written before any
//! audio exists. Once narration is synthesized its measured length becomes
//! the truth: every scene is scaled by `measured / scripted_total` and then
//! assigned whole frames from rounded cumulative boundaries, so the frame
//! total always equals `round(measured * fps)`.

use reelsmith_common::clock::FrameClock;
use serde::Serialize;

/// Timing of one scene after synchronization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneTiming {
    pub scene_number: u32,

    /// Duration written in the script.
    pub scripted_secs: f64,

    /// Scaled duration in seconds.
    pub effective_secs: f64,

    /// Offset of the scene on the synchronized timeline.
    pub start_secs: f64,

    /// Whole frames allotted to the scene.
    pub frames: u64,
}

/// Synchronized timeline for a whole script.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelinePlan {
    pub narration_secs: f64,
    pub scripted_total_secs: f64,
    pub scale: f64,
    pub fps: u32,
    pub scenes: Vec<SceneTiming>,
}

/// Ratio of measured narration to the scripted total.
///
/// Falls back to 1.0 when the scripted total is not positive.
pub fn scale_factor(narration_secs: f64, scripted_total_secs: f64) -> f64 {
    if !scripted_total_secs.is_finite() || scripted_total_secs <= 0.0 {
        tracing::warn!(
            scripted_total_secs,
            "Scripted scene durations sum to zero; keeping scripted timing"
        );
        return 1.0;
    }
    narration_secs / scripted_total_secs
}

fn sanitize(secs: f64) -> f64 {
    if secs.is_finite() && secs > 0.0 {
        secs
    } else {
        0.0
    }
}

impl TimelinePlan {
    /// Build the plan from ordered `(scene_number, scripted_secs)` pairs.
    pub fn build(scripted: &[(u32, f64)], narration_secs: f64, clock: FrameClock) -> Self {
        let scripted_total_secs: f64 = scripted.iter().map(|(_, secs)| sanitize(*secs)).sum();
        let scale = scale_factor(narration_secs, scripted_total_secs);

        let mut scenes = Vec::with_capacity(scripted.len());
        let mut start_secs = 0.0f64;
        let mut start_frame = 0u64;

        for (scene_number, secs) in scripted {
            let scripted_secs = sanitize(*secs);
            let effective_secs = scripted_secs * scale;
            let end_secs = start_secs + effective_secs;
            let end_frame = clock.frame_at(end_secs).max(start_frame);

            scenes.push(SceneTiming {
                scene_number: *scene_number,
                scripted_secs,
                effective_secs,
                start_secs,
                frames: end_frame - start_frame,
            });

            start_secs = end_secs;
            start_frame = end_frame;
        }

        tracing::debug!(
            narration_secs,
            scripted_total_secs,
            scale,
            scenes = scenes.len(),
            "Synchronized scene durations"
        );

        Self {
            narration_secs,
            scripted_total_secs,
            scale,
            fps: clock.fps(),
            scenes,
        }
    }

    /// Sum of scaled scene durations.
    pub fn total_secs(&self) -> f64 {
        self.scenes.iter().map(|s| s.effective_secs).sum()
    }

    /// Sum of allotted frames.
    pub fn total_frames(&self) -> u64 {
        self.scenes.iter().map(|s| s.frames).sum()
    }
}
