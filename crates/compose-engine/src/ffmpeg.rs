//! ffmpeg / ffprobe media backend.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};

use reelsmith_common::config::OutputProfile;
use reelsmith_common::error::{ReelError, ReelResult};
use serde::Deserialize;

use crate::burn::ass_filter;
use crate::kenburns::ken_burns_filter;
use crate::mix::mix_filter;
use crate::transform::{MediaTransform, TransformOp};

/// Characters of ffmpeg stderr kept in error messages.
const STDERR_TAIL_CHARS: usize = 500;

/// Seconds without progress before a stall warning is logged.
const STALL_WARNING_SECS: u64 = 10;

/// Backend that shells out to `ffmpeg` and `ffprobe` on `PATH`.
pub struct FfmpegBackend {
    profile: OutputProfile,
}

impl FfmpegBackend {
    pub fn new(profile: OutputProfile) -> Self {
        Self { profile }
    }

    fn run_ffmpeg(&self, op: &TransformOp) -> ReelResult<()> {
        let args = ffmpeg_args(op, &self.profile);
        let stage = op.stage();
        let expected_secs = expected_duration_secs(op, self.profile.fps);

        tracing::debug!(stage, args = ?args, "Running ffmpeg");
        let mut cmd = Command::new("ffmpeg");
        cmd.args(&args).stdout(Stdio::piped()).stderr(Stdio::piped());

        let start = std::time::Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|e| ReelError::transform(stage, format!("failed to start ffmpeg: {e}")))?;

        tracing::debug!(pid = child.id(), stage, "ffmpeg process started");

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelError::transform(stage, "failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelError::transform(stage, "failed to capture ffmpeg stderr"))?;

        // Drain stderr concurrently to avoid ffmpeg blocking on a full stderr pipe.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let mut reader = BufReader::new(stdout);
        let mut line = String::new();

        let mut latest_progress = ProgressState::default();
        let mut last_progress_secs = 0.0f64;
        let mut last_progress_wall = std::time::Instant::now();
        loop {
            line.clear();
            let bytes = reader.read_line(&mut line).map_err(|e| {
                ReelError::transform(stage, format!("failed reading ffmpeg progress: {e}"))
            })?;
            if bytes == 0 {
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if let Some((key, value)) = trimmed.split_once('=') {
                latest_progress.update(key, value);
                if key == "progress" {
                    if latest_progress.out_time_secs > last_progress_secs + 0.001 {
                        last_progress_secs = latest_progress.out_time_secs;
                        last_progress_wall = std::time::Instant::now();
                    }
                    tracing::trace!(
                        stage,
                        out_time_secs = latest_progress.out_time_secs,
                        fraction = latest_progress.fraction(expected_secs),
                        "ffmpeg progress"
                    );
                    if last_progress_wall.elapsed().as_secs() >= STALL_WARNING_SECS {
                        tracing::warn!(
                            stage,
                            out_time_secs = latest_progress.out_time_secs,
                            elapsed_secs = start.elapsed().as_secs_f64(),
                            "No ffmpeg progress advancement for 10s"
                        );
                        last_progress_wall = std::time::Instant::now();
                    }
                }
            }
        }

        let status = child
            .wait()
            .map_err(|e| ReelError::transform(stage, format!("failed to wait on ffmpeg: {e}")))?;

        let stderr_output = stderr_task
            .join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            return Err(ReelError::transform(
                stage,
                format!(
                    "ffmpeg exited with {}: {}",
                    status,
                    stderr_tail(&stderr_output, STDERR_TAIL_CHARS)
                ),
            ));
        }

        tracing::debug!(
            stage,
            elapsed_secs = start.elapsed().as_secs_f64(),
            output = %op.output().display(),
            "ffmpeg finished"
        );
        Ok(())
    }
}

impl MediaTransform for FfmpegBackend {
    fn apply(&mut self, op: &TransformOp) -> ReelResult<()> {
        self.run_ffmpeg(op)
    }

    fn probe_duration(&mut self, path: &Path) -> ReelResult<f64> {
        probe_duration(path)
    }

    fn is_available(&self) -> bool {
        command_exists("ffmpeg") && command_exists("ffprobe")
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Build the ffmpeg argument list for an operation.
pub fn ffmpeg_args(op: &TransformOp, profile: &OutputProfile) -> Vec<String> {
    let mut args: Vec<String> = [
        "-y",
        "-hide_banner",
        "-loglevel",
        "error",
        "-nostats",
        "-progress",
        "pipe:1",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    match op {
        TransformOp::KenBurns {
            image,
            motion,
            frames,
            output,
        } => {
            args.extend([
                "-loop".to_string(),
                "1".to_string(),
                "-i".to_string(),
                image.display().to_string(),
                "-vf".to_string(),
                ken_burns_filter(*motion, *frames, profile.width, profile.height, profile.fps),
                "-frames:v".to_string(),
                (*frames).max(1).to_string(),
            ]);
            args.append(&mut video_codec_args(profile));
            args.push("-an".to_string());
            args.push(output.display().to_string());
        }
        TransformOp::NormalizeClip {
            input,
            frames,
            output,
        } => {
            let (w, h) = (profile.width, profile.height);
            let frames = (*frames).max(1);
            let hold_secs = frames as f64 / profile.fps.max(1) as f64;
            args.extend([
                "-i".to_string(),
                input.display().to_string(),
                "-vf".to_string(),
                format!(
                    "scale={w}:{h}:force_original_aspect_ratio=decrease,\
                     pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={},\
                     tpad=stop_mode=clone:stop_duration={hold_secs:.3}",
                    profile.fps
                ),
                "-frames:v".to_string(),
                frames.to_string(),
                "-r".to_string(),
                profile.fps.to_string(),
            ]);
            args.append(&mut video_codec_args(profile));
            args.push("-an".to_string());
            args.push(output.display().to_string());
        }
        TransformOp::Concat { list_file, output } => {
            args.extend([
                "-f".to_string(),
                "concat".to_string(),
                "-safe".to_string(),
                "0".to_string(),
                "-i".to_string(),
                list_file.display().to_string(),
                "-c".to_string(),
                "copy".to_string(),
                output.display().to_string(),
            ]);
        }
        TransformOp::MixAudio {
            video,
            narration,
            narration_volume,
            music,
            output,
        } => {
            args.extend([
                "-i".to_string(),
                video.display().to_string(),
                "-i".to_string(),
                narration.display().to_string(),
            ]);
            match music {
                Some(bed) => {
                    args.extend([
                        "-i".to_string(),
                        bed.path.display().to_string(),
                        "-filter_complex".to_string(),
                        mix_filter(*narration_volume, bed.volume),
                        "-map".to_string(),
                        "0:v".to_string(),
                        "-map".to_string(),
                        "[aout]".to_string(),
                    ]);
                }
                None => {
                    args.extend([
                        "-map".to_string(),
                        "0:v".to_string(),
                        "-map".to_string(),
                        "1:a".to_string(),
                        "-ac".to_string(),
                        "2".to_string(),
                    ]);
                }
            }
            args.extend([
                "-c:v".to_string(),
                "copy".to_string(),
                "-c:a".to_string(),
                "aac".to_string(),
                "-b:a".to_string(),
                format!("{}k", profile.audio_bitrate_kbps.max(64)),
                "-shortest".to_string(),
                output.display().to_string(),
            ]);
        }
        TransformOp::BurnSubtitles {
            video,
            subtitles,
            output,
        } => {
            args.extend([
                "-i".to_string(),
                video.display().to_string(),
                "-vf".to_string(),
                ass_filter(subtitles),
            ]);
            args.append(&mut video_codec_args(profile));
            args.extend([
                "-c:a".to_string(),
                "copy".to_string(),
                output.display().to_string(),
            ]);
        }
    }

    args
}

fn video_codec_args(profile: &OutputProfile) -> Vec<String> {
    vec![
        "-c:v".to_string(),
        profile.video_codec.clone(),
        "-pix_fmt".to_string(),
        profile.pixel_format.clone(),
        "-preset".to_string(),
        profile.preset.clone(),
        "-crf".to_string(),
        profile.crf.to_string(),
    ]
}

/// Output length an operation is expected to produce, when known up front.
fn expected_duration_secs(op: &TransformOp, fps: u32) -> Option<f64> {
    match op {
        TransformOp::KenBurns { frames, .. } | TransformOp::NormalizeClip { frames, .. } => {
            Some(*frames as f64 / fps.max(1) as f64)
        }
        _ => None,
    }
}

fn stderr_tail(stderr: &str, max_chars: usize) -> &str {
    let trimmed = stderr.trim();
    let count = trimmed.chars().count();
    if count <= max_chars {
        return trimmed;
    }
    let skip = count - max_chars;
    match trimmed.char_indices().nth(skip) {
        Some((idx, _)) => &trimmed[idx..],
        None => trimmed,
    }
}

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            "out_time_ms" => {
                if let Ok(ms) = value.parse::<f64>() {
                    self.out_time_secs = ms / 1_000_000.0;
                }
            }
            "out_time_us" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }

    fn fraction(&self, expected_secs: Option<f64>) -> f64 {
        if self.complete {
            return 1.0;
        }
        match expected_secs {
            Some(expected) if expected > 0.0 => (self.out_time_secs / expected).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    #[serde(default)]
    duration: Option<String>,
}

/// Container duration in seconds as reported by ffprobe.
pub fn probe_duration(path: &Path) -> ReelResult<f64> {
    if !path.is_file() {
        return Err(ReelError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .map_err(|e| ReelError::transform("probe", format!("failed to start ffprobe: {e}")))?;

    if !output.status.success() {
        return Err(ReelError::transform(
            "probe",
            format!(
                "ffprobe exited with {} for {}: {}",
                output.status,
                path.display(),
                stderr_tail(&String::from_utf8_lossy(&output.stderr), STDERR_TAIL_CHARS)
            ),
        ));
    }

    parse_probe_duration(&String::from_utf8_lossy(&output.stdout))?.ok_or_else(|| {
        ReelError::transform(
            "probe",
            format!("no usable duration reported for {}", path.display()),
        )
    })
}

fn parse_probe_duration(json: &str) -> ReelResult<Option<f64>> {
    let probe: ProbeOutput = serde_json::from_str(json)?;
    let duration = probe
        .format
        .and_then(|format| format.duration)
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs > 0.0);
    Ok(duration)
}

/// Whether `binary` resolves on `PATH`.
pub fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
