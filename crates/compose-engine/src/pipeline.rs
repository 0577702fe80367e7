//! Composition job orchestration.
//!
//! Stages run in a fixed order, each blocking on its media transform:
//! synchronize, render clips, concatenate, mix audio, then (optionally)
//! write captions and burn them in. Every intermediate lives in a per-job
//! scratch directory and the final video is moved onto its canonical path
//! only after every stage has succeeded.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use reelsmith_captions::{save_captions, CaptionMode, CaptionTrack, NarratedSpan};
use reelsmith_common::clock::FrameClock;
use reelsmith_common::config::AppConfig;
use reelsmith_common::error::{ReelError, ReelResult};
use reelsmith_script_model::{word_timeline_problem, LoadedScript, OutputLayout};
use serde::Serialize;

use crate::clip::{render_clips, RenderedClip, SceneAssets, SkippedScene};
use crate::concat::write_concat_list;
use crate::ffmpeg::FfmpegBackend;
use crate::mix::{select_music, AudioMode};
use crate::scratch::ScratchDir;
use crate::timing::TimelinePlan;
use crate::transform::{MediaTransform, MusicBed, TransformOp};

/// Progress callback for composition jobs.
pub type ProgressCallback = Box<dyn Fn(ComposeProgress) + Send>;

/// Composition progress report.
#[derive(Debug, Clone)]
pub struct ComposeProgress {
    /// Current stage.
    pub stage: ComposeStage,

    /// Units finished within the stage.
    pub completed: usize,

    /// Units in the stage.
    pub total: usize,

    /// Human-readable detail.
    pub message: String,
}

/// Stages of a composition job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeStage {
    Preparing,
    RenderingClips,
    Concatenating,
    Mixing,
    Captioning,
    Burning,
    Finalizing,
    Complete,
}

impl ComposeStage {
    pub fn label(&self) -> &'static str {
        match self {
            ComposeStage::Preparing => "preparing",
            ComposeStage::RenderingClips => "rendering clips",
            ComposeStage::Concatenating => "concatenating",
            ComposeStage::Mixing => "mixing audio",
            ComposeStage::Captioning => "captioning",
            ComposeStage::Burning => "burning subtitles",
            ComposeStage::Finalizing => "finalizing",
            ComposeStage::Complete => "complete",
        }
    }
}

/// Where the subtitle decision comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubtitleChoice {
    /// Use the script's `subtitles` flag.
    #[default]
    FromScript,
    Enabled,
    Disabled,
}

impl SubtitleChoice {
    /// `--no-subtitles` wins over `--subtitles`.
    pub fn from_flags(subtitles: bool, no_subtitles: bool) -> Self {
        if no_subtitles {
            SubtitleChoice::Disabled
        } else if subtitles {
            SubtitleChoice::Enabled
        } else {
            SubtitleChoice::FromScript
        }
    }

    pub fn resolve(self, script_requested: bool) -> bool {
        match self {
            SubtitleChoice::FromScript => script_requested,
            SubtitleChoice::Enabled => true,
            SubtitleChoice::Disabled => false,
        }
    }
}

/// Per-invocation switches.
#[derive(Debug, Clone, Default)]
pub struct ComposeOptions {
    /// Skip background music even when the script has one.
    pub no_music: bool,

    pub subtitles: SubtitleChoice,
}

/// A composition job ready to run.
#[derive(Debug, Clone)]
pub struct ComposeJob {
    /// Script document to compose; results are written back to it.
    pub script_path: PathBuf,

    pub options: ComposeOptions,

    pub config: AppConfig,
}

/// Summary of a finished job.
#[derive(Debug, Clone, Serialize)]
pub struct ComposeReport {
    pub job_id: String,
    pub title: String,
    pub style: Option<String>,
    pub output_path: PathBuf,

    /// Measured duration of the final video.
    pub duration_secs: f64,

    /// Measured narration duration.
    pub narration_secs: f64,

    /// `duration_secs - narration_secs`.
    pub drift_secs: f64,

    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub aspect: String,
    pub audio: AudioMode,
    pub captions: Option<CaptionMode>,
    pub srt_path: Option<PathBuf>,
    pub ass_path: Option<PathBuf>,
    pub scenes_total: usize,
    pub clips: Vec<RenderedClip>,
    pub skipped: Vec<SkippedScene>,
    pub timeline: TimelinePlan,

    /// Scratch directory left on disk, if any.
    pub scratch_kept: Option<PathBuf>,

    pub finished_at: DateTime<Utc>,
}

impl ComposeReport {
    pub fn scenes_rendered(&self) -> usize {
        self.clips.len()
    }
}

/// Compose a script into a finished video with the ffmpeg backend.
///
/// This is the main entry point. The job itself is blocking and runs on
/// tokio's blocking pool.
pub async fn compose_script(
    job: ComposeJob,
    progress: Option<ProgressCallback>,
) -> ReelResult<ComposeReport> {
    tracing::info!(script = %job.script_path.display(), "Starting composition");

    tokio::task::spawn_blocking(move || {
        let mut backend = FfmpegBackend::new(job.config.profile.clone());
        compose_with(&job, &mut backend, progress.as_ref())
    })
    .await
    .map_err(|e| ReelError::render(format!("composition task failed: {e}")))?
}

fn emit(
    progress: Option<&ProgressCallback>,
    stage: ComposeStage,
    completed: usize,
    total: usize,
    message: impl Into<String>,
) {
    if let Some(cb) = progress {
        cb(ComposeProgress {
            stage,
            completed,
            total,
            message: message.into(),
        });
    }
}

/// Everything resolved before the first transcode.
struct PreparedJob {
    loaded: LoadedScript,
    layout: OutputLayout,
    narration: PathBuf,
    narration_secs: f64,
    music: Option<MusicBed>,
    narration_volume: f64,
    subtitles: bool,
    scenes: Vec<SceneAssets>,
    plan: TimelinePlan,
}

/// Products of the media stages.
struct StageOutputs {
    clips: Vec<RenderedClip>,
    skipped: Vec<SkippedScene>,
    captions: Option<(CaptionMode, PathBuf, PathBuf)>,

    /// Finished video, still inside the scratch directory.
    staged: PathBuf,

    final_path: PathBuf,
    duration_secs: f64,
}

/// Run a composition job against any media backend.
pub fn compose_with(
    job: &ComposeJob,
    backend: &mut dyn MediaTransform,
    progress: Option<&ProgressCallback>,
) -> ReelResult<ComposeReport> {
    let started = std::time::Instant::now();
    emit(progress, ComposeStage::Preparing, 0, 1, "Loading script");

    job.config.profile.validate()?;
    if !backend.is_available() {
        return Err(ReelError::unsupported(
            "No supported media backend found (expected ffmpeg and ffprobe in PATH)",
        ));
    }
    tracing::info!(backend = backend.name(), "Using media backend");

    let mut prepared = prepare(job, backend)?;
    let scratch = ScratchDir::create(&prepared.layout.video_dir)?;
    tracing::info!(
        job_id = %scratch.job_id(),
        scratch = %scratch.path().display(),
        "Prepared composition job"
    );

    let outputs = match run_stages(job, &prepared, &scratch, backend, progress)
        .and_then(|outputs| finalize(&mut prepared, outputs, progress))
    {
        Ok(outputs) => outputs,
        Err(err) => {
            tracing::error!(
                error = %err,
                scratch = %scratch.path().display(),
                "Composition failed; keeping scratch directory for inspection"
            );
            return Err(err);
        }
    };

    let job_id = scratch.job_id().to_string();
    let scratch_kept = if job.config.compose.keep_scratch {
        Some(scratch.path().to_path_buf())
    } else {
        let path = scratch.path().to_path_buf();
        if let Err(err) = scratch.remove() {
            tracing::warn!(error = %err, path = %path.display(), "Failed to remove scratch directory");
            Some(path)
        } else {
            None
        }
    };

    let profile = &job.config.profile;
    let report = ComposeReport {
        job_id,
        title: prepared.loaded.script.title.clone(),
        style: prepared.loaded.script.style.clone(),
        output_path: outputs.final_path,
        duration_secs: outputs.duration_secs,
        narration_secs: prepared.narration_secs,
        drift_secs: outputs.duration_secs - prepared.narration_secs,
        width: profile.width,
        height: profile.height,
        fps: profile.fps,
        aspect: profile.aspect_label(),
        audio: if prepared.music.is_some() {
            AudioMode::NarrationWithMusic
        } else {
            AudioMode::NarrationOnly
        },
        captions: outputs.captions.as_ref().map(|(mode, _, _)| *mode),
        srt_path: outputs.captions.as_ref().map(|(_, srt, _)| srt.clone()),
        ass_path: outputs.captions.map(|(_, _, ass)| ass),
        scenes_total: prepared.scenes.len(),
        clips: outputs.clips,
        skipped: outputs.skipped,
        timeline: prepared.plan,
        scratch_kept,
        finished_at: Utc::now(),
    };

    tracing::info!(
        output = %report.output_path.display(),
        duration_secs = report.duration_secs,
        scenes = report.scenes_rendered(),
        skipped = report.skipped.len(),
        elapsed_secs = started.elapsed().as_secs_f64(),
        "Composition finished"
    );
    emit(progress, ComposeStage::Complete, 1, 1, "Done");

    Ok(report)
}

fn prepare(job: &ComposeJob, backend: &mut dyn MediaTransform) -> ReelResult<PreparedJob> {
    let loaded = LoadedScript::load(&job.script_path).map_err(|e| ReelError::script(e.to_string()))?;
    let script = &loaded.script;

    let ordered = script.ordered_scenes();
    if ordered.is_empty() {
        return Err(ReelError::script("Script has no scenes"));
    }

    let narration = loaded
        .narration_audio()
        .ok_or_else(|| ReelError::MissingNarration {
            path: script.narration_audio_path().map(Path::to_path_buf),
        })?;

    let mix = script.mix_config();
    let available_music = loaded.music();
    if available_music.is_none() {
        if let Some(path) = script.music_path() {
            tracing::info!(path = %path.display(), "Music not found; using narration only");
        }
    }
    let mut music = select_music(available_music, job.options.no_music, mix.music_volume);

    let layout = OutputLayout::for_script(&loaded.path, &script.title)?;
    std::fs::create_dir_all(&layout.video_dir)?;

    let narration_secs = backend.probe_duration(&narration)?;
    if !narration_secs.is_finite() || narration_secs <= 0.0 {
        return Err(ReelError::timing(format!(
            "Narration {} has no measurable duration",
            narration.display()
        )));
    }
    tracing::info!(narration_secs, "Measured narration");

    if let Some(bed) = &music {
        match backend.probe_duration(&bed.path) {
            Ok(music_secs) => {
                tracing::info!(music_secs, volume = bed.volume, "Measured music");
                if music_secs < narration_secs {
                    tracing::debug!("Music is shorter than narration; the bed will end early");
                }
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    path = %bed.path.display(),
                    "Music could not be probed; using narration only"
                );
                music = None;
            }
        }
    }

    let clock = FrameClock::new(job.config.profile.fps);
    let scripted: Vec<(u32, f64)> = ordered
        .iter()
        .map(|scene| (scene.scene_number, scene.duration))
        .collect();
    let plan = TimelinePlan::build(&scripted, narration_secs, clock);
    tracing::info!(
        scale = plan.scale,
        scripted_total_secs = plan.scripted_total_secs,
        total_frames = plan.total_frames(),
        "Scaled scene durations to narration"
    );

    let scenes = ordered
        .iter()
        .enumerate()
        .map(|(index, scene)| SceneAssets::resolve(&loaded, index, scene))
        .collect();
    let subtitles = job.options.subtitles.resolve(script.subtitles_requested());

    Ok(PreparedJob {
        narration,
        narration_secs,
        music,
        narration_volume: mix.narration_volume,
        subtitles,
        scenes,
        plan,
        layout,
        loaded,
    })
}

fn run_stages(
    job: &ComposeJob,
    prepared: &PreparedJob,
    scratch: &ScratchDir,
    backend: &mut dyn MediaTransform,
    progress: Option<&ProgressCallback>,
) -> ReelResult<StageOutputs> {
    let profile = &job.config.profile;

    let outcome = render_clips(
        &prepared.scenes,
        &prepared.plan.scenes,
        scratch,
        backend,
        &mut |position, total, scene_number| {
            emit(
                progress,
                ComposeStage::RenderingClips,
                position,
                total,
                format!("Scene {scene_number}"),
            );
        },
    );

    let required = job.config.compose.min_rendered_scenes.max(1);
    if outcome.clips.len() < required {
        return Err(ReelError::no_clips(format!(
            "{} of {} scenes rendered (at least {required} required)",
            outcome.clips.len(),
            prepared.scenes.len()
        )));
    }
    emit(
        progress,
        ComposeStage::RenderingClips,
        prepared.scenes.len(),
        prepared.scenes.len(),
        format!(
            "{} rendered, {} skipped",
            outcome.clips.len(),
            outcome.skipped.len()
        ),
    );

    emit(
        progress,
        ComposeStage::Concatenating,
        0,
        1,
        format!("Concatenating {} clips", outcome.clips.len()),
    );
    write_concat_list(&outcome.clip_paths(), &scratch.concat_list())?;
    backend.apply(&TransformOp::Concat {
        list_file: scratch.concat_list(),
        output: scratch.combined(),
    })?;

    let mode = if prepared.music.is_some() {
        AudioMode::NarrationWithMusic
    } else {
        AudioMode::NarrationOnly
    };
    emit(progress, ComposeStage::Mixing, 0, 1, mode.label());
    backend.apply(&TransformOp::MixAudio {
        video: scratch.combined(),
        narration: prepared.narration.clone(),
        narration_volume: prepared.narration_volume,
        music: prepared.music.clone(),
        output: scratch.with_audio(),
    })?;

    let mut final_source = scratch.with_audio();
    let mut captions = None;

    if prepared.subtitles {
        emit(progress, ComposeStage::Captioning, 0, 1, "Writing captions");
        let track = build_captions(job, prepared);

        if track.is_empty() {
            tracing::warn!("No narration text to caption; skipping subtitle burn");
        } else {
            let files = save_captions(
                &track,
                &prepared.layout.srt_path(),
                &prepared.layout.ass_path(),
                profile.width,
                profile.height,
            )
            .map_err(|e| ReelError::caption(format!("failed to write captions: {e}")))?;
            tracing::info!(
                mode = track.mode.as_str(),
                cues = track.cues.len(),
                srt = %files.srt.display(),
                "Wrote captions"
            );

            emit(
                progress,
                ComposeStage::Burning,
                0,
                1,
                format!("Burning {} captions", track.mode.as_str()),
            );
            backend.apply(&TransformOp::BurnSubtitles {
                video: scratch.with_audio(),
                subtitles: files.ass.clone(),
                output: scratch.burned(),
            })?;

            final_source = scratch.burned();
            captions = Some((track.mode, files.srt, files.ass));
        }
    }

    let duration_secs = backend.probe_duration(&final_source)?;
    let clock = FrameClock::new(profile.fps);
    if !clock.within_one_frame(duration_secs, prepared.narration_secs) {
        tracing::warn!(
            duration_secs,
            narration_secs = prepared.narration_secs,
            drift_secs = duration_secs - prepared.narration_secs,
            "Final video drifts from narration by more than one frame"
        );
    }

    Ok(StageOutputs {
        clips: outcome.clips,
        skipped: outcome.skipped,
        captions,
        staged: final_source,
        final_path: prepared.layout.final_video(),
        duration_secs,
    })
}

/// Move the staged video onto its canonical path and record the result in
/// the script. The canonical path only holds a video once both succeed.
fn finalize(
    prepared: &mut PreparedJob,
    outputs: StageOutputs,
    progress: Option<&ProgressCallback>,
) -> ReelResult<StageOutputs> {
    emit(progress, ComposeStage::Finalizing, 0, 1, "Moving video into place");
    let (staged, final_path) = (&outputs.staged, &outputs.final_path);
    std::fs::rename(staged, final_path).map_err(|e| {
        ReelError::transform(
            "finalize",
            format!(
                "could not move {} to {}: {e}",
                staged.display(),
                final_path.display()
            ),
        )
    })?;

    let loaded = &mut prepared.loaded;
    loaded
        .script
        .record_result(final_path.clone(), outputs.duration_secs);

    if let Err(err) = loaded.save() {
        if let Err(undo) = std::fs::rename(final_path, staged) {
            tracing::warn!(error = %undo, "Could not return video to scratch; removing it");
            if let Err(remove) = std::fs::remove_file(final_path) {
                tracing::error!(
                    error = %remove,
                    path = %final_path.display(),
                    "Failed to remove unrecorded video"
                );
            }
        }
        return Err(ReelError::script(format!(
            "failed to write results back: {err}"
        )));
    }

    Ok(outputs)
}

/// Word-synced captions when timestamps exist, scene-level otherwise.
fn build_captions(job: &ComposeJob, prepared: &PreparedJob) -> CaptionTrack {
    let script = &prepared.loaded.script;
    let words = script.word_timestamps();
    if let Some(problem) = words.and_then(word_timeline_problem) {
        tracing::warn!(problem = %problem, "Word timestamps are out of order");
    }

    let ordered = script.ordered_scenes();
    let spans: Vec<NarratedSpan<'_>> = ordered
        .iter()
        .zip(&prepared.plan.scenes)
        .map(|(scene, timing)| NarratedSpan {
            text: scene.narration_text(),
            duration_secs: timing.effective_secs,
        })
        .collect();

    CaptionTrack::build(
        words,
        &spans,
        prepared.narration_secs,
        job.config.captions.words_per_chunk,
        job.config.captions.wrap_threshold_chars,
    )
}
