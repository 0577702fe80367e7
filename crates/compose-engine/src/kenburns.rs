//! Ken Burns motion for still-image scenes.
//!
//! The source image is upscaled to twice the output size before `zoompan`
//! so sub-pixel motion stays smooth. The variant is picked from the scene's
//! position in the script, so re-running a job reproduces the same motion.

use serde::Serialize;

/// Peak zoom of the zoom-in and zoom-out variants.
pub const MAX_ZOOM: f64 = 1.15;

/// Per-frame zoom increment.
pub const ZOOM_STEP: f64 = 0.001;

/// Fixed zoom held while panning.
pub const PAN_ZOOM: f64 = 1.10;

/// Pan/zoom motion applied to a still image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum KenBurnsMotion {
    ZoomIn,
    ZoomOut,
    PanLeftRight,
    PanTopBottom,
}

impl KenBurnsMotion {
    pub const ALL: [KenBurnsMotion; 4] = [
        KenBurnsMotion::ZoomIn,
        KenBurnsMotion::ZoomOut,
        KenBurnsMotion::PanLeftRight,
        KenBurnsMotion::PanTopBottom,
    ];

    /// Motion for the scene at 0-based `index` in script order.
    pub fn for_scene_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KenBurnsMotion::ZoomIn => "zoom-in",
            KenBurnsMotion::ZoomOut => "zoom-out",
            KenBurnsMotion::PanLeftRight => "pan-left-right",
            KenBurnsMotion::PanTopBottom => "pan-top-bottom",
        }
    }

    /// `z`, `x` and `y` expressions for `zoompan`.
    pub fn zoompan_expr(&self, frames: u64) -> String {
        let span = frames.max(1);
        match self {
            KenBurnsMotion::ZoomIn => format!(
                "z='min(zoom+{ZOOM_STEP},{MAX_ZOOM})':x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)'"
            ),
            KenBurnsMotion::ZoomOut => format!(
                "z='if(eq(on,1),{MAX_ZOOM},max(zoom-{ZOOM_STEP},1.0))':x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)'"
            ),
            KenBurnsMotion::PanLeftRight => format!(
                "z='{PAN_ZOOM:.2}':x='(iw-iw/zoom)*on/{span}':y='ih/2-(ih/zoom/2)'"
            ),
            KenBurnsMotion::PanTopBottom => format!(
                "z='{PAN_ZOOM:.2}':x='iw/2-(iw/zoom/2)':y='(ih-ih/zoom)*on/{span}'"
            ),
        }
    }
}

impl std::fmt::Display for KenBurnsMotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full `-vf` chain for a Ken Burns clip.
pub fn ken_burns_filter(
    motion: KenBurnsMotion,
    frames: u64,
    width: u32,
    height: u32,
    fps: u32,
) -> String {
    format!(
        "scale={}:{},zoompan={}:d={}:s={width}x{height}:fps={fps}",
        width * 2,
        height * 2,
        motion.zoompan_expr(frames),
        frames.max(1),
    )
}
