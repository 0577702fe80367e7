//! Per-scene clip rendering.
//!
//! Each scene becomes one canonical clip: a Ken Burns animation of its still
//! image, or its pre-generated video reprojected onto the output frame. A
//! scene that cannot be rendered is logged and dropped; it never aborts the
//! job.

use std::path::PathBuf;

use reelsmith_script_model::{LoadedScript, Scene, VisualType};
use serde::Serialize;

use crate::kenburns::KenBurnsMotion;
use crate::scratch::ScratchDir;
use crate::timing::SceneTiming;
use crate::transform::{MediaTransform, TransformOp};

/// A scene with its assets resolved against the filesystem.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneAssets {
    pub scene_number: u32,

    /// 0-based position in script order.
    pub index: usize,

    pub kind: VisualType,

    /// Still image, only if it exists.
    pub image: Option<PathBuf>,

    /// Video clip, only if it exists.
    pub video: Option<PathBuf>,
}

impl SceneAssets {
    pub fn resolve(loaded: &LoadedScript, index: usize, scene: &Scene) -> Self {
        Self {
            scene_number: scene.scene_number,
            index,
            kind: scene.visual_kind(),
            image: loaded.existing_asset(scene.image_path.as_deref()),
            video: loaded.existing_asset(scene.video_path.as_deref()),
        }
    }
}

/// How a scene's clip is produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipSource {
    /// Animate a still image.
    Image {
        path: PathBuf,
        motion: KenBurnsMotion,
        /// True when a video-clip scene fell back to its image.
        fallback: bool,
    },
    /// Normalize a video clip.
    Video { path: PathBuf },
}

/// Pick the render strategy for a scene, or `None` when it has no usable
/// asset.
pub fn clip_source(assets: &SceneAssets) -> Option<ClipSource> {
    let motion = KenBurnsMotion::for_scene_index(assets.index);
    match assets.kind {
        VisualType::VideoClip => match (&assets.video, &assets.image) {
            (Some(video), _) => Some(ClipSource::Video {
                path: video.clone(),
            }),
            (None, Some(image)) => Some(ClipSource::Image {
                path: image.clone(),
                motion,
                fallback: true,
            }),
            (None, None) => None,
        },
        VisualType::StaticImage => assets.image.as_ref().map(|image| ClipSource::Image {
            path: image.clone(),
            motion,
            fallback: false,
        }),
    }
}

/// Build the transform for a scene's clip.
pub fn clip_op(source: &ClipSource, timing: &SceneTiming, output: PathBuf) -> TransformOp {
    match source {
        ClipSource::Image { path, motion, .. } => TransformOp::KenBurns {
            image: path.clone(),
            motion: *motion,
            frames: timing.frames,
            output,
        },
        ClipSource::Video { path } => TransformOp::NormalizeClip {
            input: path.clone(),
            frames: timing.frames,
            output,
        },
    }
}

/// A scene that made it into the timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedClip {
    pub scene_number: u32,
    pub path: PathBuf,
    /// `ken-burns:<motion>`, `ken-burns-fallback:<motion>` or `video`.
    pub method: String,
}

/// A scene that was dropped, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedScene {
    pub scene_number: u32,
    pub reason: String,
}

/// Outcome of rendering every scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClipRenderOutcome {
    pub clips: Vec<RenderedClip>,
    pub skipped: Vec<SkippedScene>,
}

impl ClipRenderOutcome {
    pub fn clip_paths(&self) -> Vec<PathBuf> {
        self.clips.iter().map(|clip| clip.path.clone()).collect()
    }
}

/// Render one clip per scene in order.
///
/// `on_scene` is called before each scene with `(position, total, scene_number)`.
pub fn render_clips(
    scenes: &[SceneAssets],
    timings: &[SceneTiming],
    scratch: &ScratchDir,
    backend: &mut dyn MediaTransform,
    on_scene: &mut dyn FnMut(usize, usize, u32),
) -> ClipRenderOutcome {
    let mut outcome = ClipRenderOutcome::default();
    let total = scenes.len();

    for (position, (assets, timing)) in scenes.iter().zip(timings).enumerate() {
        on_scene(position, total, assets.scene_number);

        match render_scene(assets, timing, scratch, backend) {
            Ok(clip) => {
                tracing::info!(
                    scene = clip.scene_number,
                    method = %clip.method,
                    secs = timing.effective_secs,
                    frames = timing.frames,
                    "Rendered scene clip"
                );
                outcome.clips.push(clip);
            }
            Err(reason) => {
                tracing::warn!(
                    scene = assets.scene_number,
                    reason = %reason,
                    "Skipping scene"
                );
                outcome.skipped.push(SkippedScene {
                    scene_number: assets.scene_number,
                    reason,
                });
            }
        }
    }

    outcome
}

fn render_scene(
    assets: &SceneAssets,
    timing: &SceneTiming,
    scratch: &ScratchDir,
    backend: &mut dyn MediaTransform,
) -> Result<RenderedClip, String> {
    let source = clip_source(assets).ok_or_else(|| match assets.kind {
        VisualType::VideoClip => "no video or image found".to_string(),
        VisualType::StaticImage => "image not found".to_string(),
    })?;

    if timing.frames == 0 {
        return Err("scene has no duration after synchronization".to_string());
    }

    let method = match &source {
        ClipSource::Image {
            motion,
            fallback: true,
            ..
        } => {
            tracing::info!(
                scene = assets.scene_number,
                "Video not found; using Ken Burns fallback"
            );
            format!("ken-burns-fallback:{motion}")
        }
        ClipSource::Image { motion, .. } => format!("ken-burns:{motion}"),
        ClipSource::Video { .. } => "video".to_string(),
    };

    let output = scratch.clip(assets.index);
    let op = clip_op(&source, timing, output.clone());
    backend.apply(&op).map_err(|err| err.to_string())?;

    Ok(RenderedClip {
        scene_number: assets.scene_number,
        path: output,
        method,
    })
}
