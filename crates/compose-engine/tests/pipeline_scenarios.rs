//! End-to-end composition scenarios driven through a recording media
//! backend, so no ffmpeg is needed.

use std::path::{Path, PathBuf};

use reelsmith_captions::CaptionMode;
use reelsmith_common::config::AppConfig;
use reelsmith_common::error::{ReelError, ReelResult};
use reelsmith_compose_engine::mix::AudioMode;
use reelsmith_compose_engine::{
    compose_with, ComposeJob, ComposeOptions, ComposeStage, MediaTransform, SubtitleChoice,
    TransformOp,
};
use serde_json::{json, Value};

struct FakeTransform {
    ops: Vec<TransformOp>,
    probes: Vec<PathBuf>,
    narration_secs: f64,
    available: bool,
    /// Image file names whose Ken Burns render fails.
    failing_images: Vec<&'static str>,
    /// Stage whose whole-timeline operation fails.
    failing_stage: Option<&'static str>,
    /// File name whose duration cannot be measured.
    unmeasurable_file: Option<&'static str>,
}

impl FakeTransform {
    fn new(narration_secs: f64) -> Self {
        Self {
            ops: vec![],
            probes: vec![],
            narration_secs,
            available: true,
            failing_images: vec![],
            failing_stage: None,
            unmeasurable_file: None,
        }
    }

    fn stages(&self) -> Vec<&'static str> {
        self.ops.iter().map(TransformOp::stage).collect()
    }

    fn mix_op(&self) -> Option<&TransformOp> {
        self.ops
            .iter()
            .find(|op| matches!(op, TransformOp::MixAudio { .. }))
    }
}

impl MediaTransform for FakeTransform {
    fn apply(&mut self, op: &TransformOp) -> ReelResult<()> {
        self.ops.push(op.clone());
        if self.failing_stage == Some(op.stage()) {
            return Err(ReelError::transform(op.stage(), "exit status 1: broken pipe"));
        }
        if let TransformOp::KenBurns { image, .. } = op {
            let name = image.file_name().unwrap().to_string_lossy().to_string();
            if self.failing_images.contains(&name.as_str()) {
                return Err(ReelError::transform(op.stage(), "exit status 1: corrupt image"));
            }
        }
        std::fs::write(op.output(), format!("{op:?}"))?;
        Ok(())
    }

    fn probe_duration(&mut self, path: &Path) -> ReelResult<f64> {
        self.probes.push(path.to_path_buf());
        let name = path.file_name().unwrap().to_string_lossy();
        if self.unmeasurable_file == Some(name.as_ref()) {
            return Err(ReelError::transform("probe", "moov atom not found"));
        }
        if name.starts_with("music") {
            Ok(60.0)
        } else {
            Ok(self.narration_secs)
        }
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn name(&self) -> &str {
        "fake"
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    root: PathBuf,
    script_path: PathBuf,
}

impl Fixture {
    /// Script under `<tmp>/INPUT/octopus/` with narration, music and one
    /// image per scene written next to it.
    fn new(script: Value) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let script_dir = root.join("INPUT").join("octopus");
        std::fs::create_dir_all(script_dir.join("images")).unwrap();
        std::fs::create_dir_all(script_dir.join("audio")).unwrap();

        std::fs::write(script_dir.join("audio/narration.mp3"), b"narration").unwrap();
        std::fs::write(script_dir.join("audio/music.mp3"), b"music").unwrap();
        for n in 1..=6 {
            std::fs::write(script_dir.join(format!("images/{n}.png")), b"png").unwrap();
        }
        std::fs::write(script_dir.join("images/bad.png"), b"png").unwrap();

        let script_path = script_dir.join("script.json");
        std::fs::write(
            &script_path,
            serde_json::to_string_pretty(&script).unwrap(),
        )
        .unwrap();

        Self {
            _dir: dir,
            root,
            script_path,
        }
    }

    fn video_dir(&self) -> PathBuf {
        self.root.join("OUTPUT").join("octopus").join("video")
    }

    fn job(&self, options: ComposeOptions) -> ComposeJob {
        ComposeJob {
            script_path: self.script_path.clone(),
            options,
            config: AppConfig::default(),
        }
    }

    fn scratch_dirs(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(self.video_dir()) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .map(|e| e.path())
                .filter(|p| {
                    p.file_name()
                        .map(|n| n.to_string_lossy().starts_with(".scratch-"))
                        .unwrap_or(false)
                })
                .collect(),
            Err(_) => vec![],
        }
    }

    fn script_json(&self) -> Value {
        serde_json::from_str(&std::fs::read_to_string(&self.script_path).unwrap()).unwrap()
    }
}

fn image_scene(n: u32, narration: &str) -> Value {
    json!({
        "sceneNumber": n,
        "duration": 5,
        "visualType": "web",
        "imagePath": format!("images/{n}.png"),
        "narration": narration,
        "imageSearchQuery": "octopus"
    })
}

fn base_script(scenes: Vec<Value>) -> Value {
    json!({
        "title": "Why Octopuses Are Weird",
        "style": "educational",
        "visualMode": "mixed",
        "config": { "musicVolume": 0.2, "musicPrompt": "lofi" },
        "audioPath": "audio/narration.mp3",
        "musicPath": "audio/music.mp3",
        "scenes": scenes
    })
}

#[test]
fn test_full_job_writes_video_captions_and_results() {
    let mut script = base_script(vec![
        image_scene(1, "Octopuses have three hearts."),
        image_scene(2, ""),
        image_scene(3, "And their blood is blue."),
    ]);
    script["subtitles"] = json!(true);
    let fx = Fixture::new(script);
    let mut backend = FakeTransform::new(16.5);

    let report = compose_with(&fx.job(ComposeOptions::default()), &mut backend, None).unwrap();

    assert_eq!(
        backend.stages(),
        vec![
            "ken-burns",
            "ken-burns",
            "ken-burns",
            "concat",
            "audio mix",
            "subtitle burn"
        ]
    );

    let final_video = fx.video_dir().join("why-octopuses-are-weird.mp4");
    assert_eq!(report.output_path, final_video);
    assert!(final_video.is_file());
    assert_eq!(report.audio, AudioMode::NarrationWithMusic);
    assert_eq!(report.captions, Some(CaptionMode::SceneLevel));
    assert_eq!(report.scenes_rendered(), 3);
    assert!(report.scratch_kept.is_none());
    assert!(fx.scratch_dirs().is_empty());

    let srt = std::fs::read_to_string(fx.video_dir().join("why-octopuses-are-weird.srt")).unwrap();
    assert!(srt.contains("1\n00:00:00,000 --> 00:00:05,500\nOctopuses have three hearts."));
    assert!(srt.contains("2\n00:00:11,000 --> 00:00:16,500\nAnd their blood is blue."));
    assert!(fx.video_dir().join("why-octopuses-are-weird.ass").is_file());

    let written = fx.script_json();
    assert_eq!(
        written["outputVideo"].as_str().map(PathBuf::from),
        Some(final_video)
    );
    assert_eq!(written["actualDuration"].as_f64(), Some(16.5));
    assert_eq!(written["visualMode"], json!("mixed"));
    assert_eq!(written["scenes"][0]["imageSearchQuery"], json!("octopus"));
}

#[test]
fn test_six_scenes_are_stretched_to_narration() {
    let scenes = (1..=6).map(|n| image_scene(n, "Words.")).collect();
    let fx = Fixture::new(base_script(scenes));
    let mut backend = FakeTransform::new(33.0);

    let report = compose_with(&fx.job(ComposeOptions::default()), &mut backend, None).unwrap();

    let frames: Vec<u64> = backend
        .ops
        .iter()
        .filter_map(|op| match op {
            TransformOp::KenBurns { frames, .. } => Some(*frames),
            _ => None,
        })
        .collect();
    assert_eq!(frames.len(), 6);
    assert_eq!(frames.iter().sum::<u64>(), 825);
    assert!(frames.iter().all(|f| *f == 137 || *f == 138));
    assert!((report.timeline.scale - 1.1).abs() < 1e-9);
    assert!((report.timeline.total_secs() - 33.0).abs() < 1e-9);
}

#[test]
fn test_motion_cycles_by_scene_position() {
    let scenes = (1..=5).map(|n| image_scene(n, "Words.")).collect();
    let fx = Fixture::new(base_script(scenes));
    let mut backend = FakeTransform::new(25.0);

    compose_with(&fx.job(ComposeOptions::default()), &mut backend, None).unwrap();

    let motions: Vec<String> = backend
        .ops
        .iter()
        .filter_map(|op| match op {
            TransformOp::KenBurns { motion, .. } => Some(motion.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(
        motions,
        vec!["zoom-in", "zoom-out", "pan-left-right", "pan-top-bottom", "zoom-in"]
    );
}

#[test]
fn test_video_scene_without_video_falls_back_to_image() {
    let fx = Fixture::new(base_script(vec![json!({
        "sceneNumber": 1,
        "duration": 5,
        "visualType": "video",
        "videoPath": "videos/missing.mp4",
        "imagePath": "images/1.png"
    })]));
    let mut backend = FakeTransform::new(5.0);

    let report = compose_with(&fx.job(ComposeOptions::default()), &mut backend, None).unwrap();

    assert_eq!(backend.stages()[0], "ken-burns");
    assert!(report.clips[0].method.starts_with("ken-burns-fallback"));
}

#[test]
fn test_existing_video_is_normalized_to_scene_duration() {
    let fx = Fixture::new(base_script(vec![
        image_scene(1, "One."),
        json!({
            "sceneNumber": 2,
            "duration": 5,
            "visualType": "video",
            "videoPath": "videos/2.mp4"
        }),
    ]));
    let video_dir = fx.script_path.parent().unwrap().join("videos");
    std::fs::create_dir_all(&video_dir).unwrap();
    std::fs::write(video_dir.join("2.mp4"), b"mp4").unwrap();
    let mut backend = FakeTransform::new(12.0);

    compose_with(&fx.job(ComposeOptions::default()), &mut backend, None).unwrap();

    match &backend.ops[1] {
        TransformOp::NormalizeClip { input, frames, .. } => {
            assert!(input.ends_with("videos/2.mp4"));
            assert_eq!(*frames, 150);
        }
        other => panic!("expected normalize, got {other:?}"),
    }
}

#[test]
fn test_failing_scene_is_isolated() {
    let mut bad = image_scene(2, "Broken.");
    bad["imagePath"] = json!("images/bad.png");
    let fx = Fixture::new(base_script(vec![
        image_scene(1, "One."),
        bad,
        json!({ "sceneNumber": 3, "duration": 5, "imagePath": "images/nope.png" }),
        image_scene(4, "Four."),
    ]));
    let mut backend = FakeTransform::new(20.0);
    backend.failing_images = vec!["bad.png"];

    let report = compose_with(&fx.job(ComposeOptions::default()), &mut backend, None).unwrap();

    assert_eq!(report.scenes_rendered(), 2);
    let skipped: Vec<u32> = report.skipped.iter().map(|s| s.scene_number).collect();
    assert_eq!(skipped, vec![2, 3]);

    let concat_list = backend
        .ops
        .iter()
        .find_map(|op| match op {
            TransformOp::Concat { list_file, .. } => Some(list_file.clone()),
            _ => None,
        })
        .unwrap();
    assert!(!concat_list.exists(), "scratch should be cleaned up");
    let clips: Vec<u32> = report.clips.iter().map(|c| c.scene_number).collect();
    assert_eq!(clips, vec![1, 4]);
}

#[test]
fn test_no_renderable_scene_fails_without_touching_outputs() {
    let fx = Fixture::new(base_script(vec![
        json!({ "sceneNumber": 1, "duration": 5, "imagePath": "images/missing.png" }),
        json!({ "sceneNumber": 2, "duration": 5, "visualType": "video" }),
    ]));
    let before = std::fs::read_to_string(&fx.script_path).unwrap();
    let mut backend = FakeTransform::new(10.0);

    let err = compose_with(&fx.job(ComposeOptions::default()), &mut backend, None).unwrap_err();

    assert!(matches!(err, ReelError::NoClips { .. }));
    assert!(err.to_string().starts_with("No clips created"));
    assert!(backend.ops.is_empty());
    assert!(!fx.video_dir().join("why-octopuses-are-weird.mp4").exists());
    assert_eq!(std::fs::read_to_string(&fx.script_path).unwrap(), before);
    assert_eq!(fx.scratch_dirs().len(), 1, "scratch is kept for inspection");
}

#[test]
fn test_missing_narration_fails_before_any_transcode() {
    let mut script = base_script(vec![image_scene(1, "One.")]);
    script["audioPath"] = json!("audio/absent.mp3");
    let fx = Fixture::new(script);
    let mut backend = FakeTransform::new(5.0);

    let err = compose_with(&fx.job(ComposeOptions::default()), &mut backend, None).unwrap_err();

    assert!(matches!(err, ReelError::MissingNarration { path: Some(_) }));
    assert!(backend.ops.is_empty());
    assert!(backend.probes.is_empty());
    assert!(fx.scratch_dirs().is_empty());
}

#[test]
fn test_missing_backend_is_fatal() {
    let fx = Fixture::new(base_script(vec![image_scene(1, "One.")]));
    let mut backend = FakeTransform::new(5.0);
    backend.available = false;

    let err = compose_with(&fx.job(ComposeOptions::default()), &mut backend, None).unwrap_err();
    assert!(matches!(err, ReelError::Unsupported { .. }));
    assert!(backend.ops.is_empty());
}

#[test]
fn test_missing_music_mixes_narration_only() {
    let mut script = base_script(vec![image_scene(1, "One.")]);
    script["musicPath"] = json!("audio/absent.mp3");
    let fx = Fixture::new(script);
    let mut backend = FakeTransform::new(5.0);

    let report = compose_with(&fx.job(ComposeOptions::default()), &mut backend, None).unwrap();

    assert_eq!(report.audio, AudioMode::NarrationOnly);
    match backend.mix_op() {
        Some(TransformOp::MixAudio { music, .. }) => assert!(music.is_none()),
        other => panic!("expected mix, got {other:?}"),
    }
}

#[test]
fn test_no_music_flag_skips_existing_music() {
    let fx = Fixture::new(base_script(vec![image_scene(1, "One.")]));
    let mut backend = FakeTransform::new(5.0);
    let options = ComposeOptions {
        no_music: true,
        ..ComposeOptions::default()
    };

    let report = compose_with(&fx.job(options), &mut backend, None).unwrap();

    assert_eq!(report.audio, AudioMode::NarrationOnly);
    assert!(!backend
        .probes
        .iter()
        .any(|p| p.ends_with("audio/music.mp3")));
}

#[test]
fn test_music_volume_comes_from_script_config() {
    let fx = Fixture::new(base_script(vec![image_scene(1, "One.")]));
    let mut backend = FakeTransform::new(5.0);

    compose_with(&fx.job(ComposeOptions::default()), &mut backend, None).unwrap();

    match backend.mix_op() {
        Some(TransformOp::MixAudio {
            narration_volume,
            music: Some(bed),
            ..
        }) => {
            assert_eq!(*narration_volume, 1.0);
            assert_eq!(bed.volume, 0.2);
        }
        other => panic!("expected mix with music, got {other:?}"),
    }
}

#[test]
fn test_disabled_subtitles_move_mixed_output_unchanged() {
    let mut script = base_script(vec![image_scene(1, "One.")]);
    script["subtitles"] = json!(true);
    let fx = Fixture::new(script);
    let mut backend = FakeTransform::new(5.0);
    let options = ComposeOptions {
        subtitles: SubtitleChoice::from_flags(true, true),
        ..ComposeOptions::default()
    };

    let report = compose_with(&fx.job(options), &mut backend, None).unwrap();

    assert!(!backend.stages().contains(&"subtitle burn"));
    assert!(report.captions.is_none());
    let mixed = format!("{:?}", backend.mix_op().unwrap());
    assert_eq!(std::fs::read_to_string(&report.output_path).unwrap(), mixed);
    assert!(!fx.video_dir().join("why-octopuses-are-weird.srt").exists());
}

#[test]
fn test_word_timestamps_produce_synced_captions() {
    let mut script = base_script(vec![image_scene(1, "The quick fox jumps.")]);
    script["wordTimestamps"] = json!([
        { "word": "the", "start": 0.0, "end": 0.2 },
        { "word": "quick", "start": 0.2, "end": 0.5 },
        { "word": "fox", "start": 0.5, "end": 0.9 },
        { "word": "jumps", "start": 0.9, "end": 1.3 }
    ]);
    let fx = Fixture::new(script);
    let mut backend = FakeTransform::new(1.3);
    let options = ComposeOptions {
        subtitles: SubtitleChoice::Enabled,
        ..ComposeOptions::default()
    };

    let report = compose_with(&fx.job(options), &mut backend, None).unwrap();

    assert_eq!(report.captions, Some(CaptionMode::WordSynced));
    let srt = std::fs::read_to_string(report.srt_path.unwrap()).unwrap();
    assert!(srt.contains("1\n00:00:00,000 --> 00:00:00,900\nthe quick fox\n"));
    assert!(srt.contains("2\n00:00:00,900 --> 00:00:01,300\njumps\n"));

    let ass = std::fs::read_to_string(report.ass_path.unwrap()).unwrap();
    assert!(ass.contains("Style: Default,Raleway,140,"));
    assert!(ass.contains("Dialogue: 0,0:00:00.00,0:00:00.90,Default,,0,0,0,,the quick fox"));
}

#[test]
fn test_progress_reports_each_stage_in_order() {
    use std::sync::{Arc, Mutex};

    let fx = Fixture::new(base_script(vec![
        image_scene(1, "One."),
        image_scene(2, "Two."),
    ]));
    let mut backend = FakeTransform::new(10.0);
    let seen: Arc<Mutex<Vec<ComposeStage>>> = Arc::new(Mutex::new(vec![]));
    let sink = Arc::clone(&seen);
    let callback: reelsmith_compose_engine::ProgressCallback = Box::new(move |p| {
        let mut stages = sink.lock().unwrap();
        if stages.last() != Some(&p.stage) {
            stages.push(p.stage);
        }
    });

    compose_with(
        &fx.job(ComposeOptions::default()),
        &mut backend,
        Some(&callback),
    )
    .unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            ComposeStage::Preparing,
            ComposeStage::RenderingClips,
            ComposeStage::Concatenating,
            ComposeStage::Mixing,
            ComposeStage::Finalizing,
            ComposeStage::Complete,
        ]
    );
}

#[test]
fn test_keep_scratch_leaves_intermediates() {
    let fx = Fixture::new(base_script(vec![image_scene(1, "One.")]));
    let mut backend = FakeTransform::new(5.0);
    let mut job = fx.job(ComposeOptions::default());
    job.config.compose.keep_scratch = true;

    let report = compose_with(&job, &mut backend, None).unwrap();

    let kept = report.scratch_kept.unwrap();
    assert!(kept.join("clip-001.mp4").is_file());
    assert!(kept.join("combined.mp4").is_file());
}

fn video_scene(n: u32) -> Value {
    json!({
        "sceneNumber": n,
        "duration": 5,
        "visualType": "video",
        "videoPath": format!("videos/{n}.mp4"),
        "narration": "Words."
    })
}

#[test]
fn test_six_video_scenes_keep_frame_allocation() {
    let scenes = (1..=6).map(video_scene).collect();
    let fx = Fixture::new(base_script(scenes));
    let video_dir = fx.script_path.parent().unwrap().join("videos");
    std::fs::create_dir_all(&video_dir).unwrap();
    for n in 1..=6 {
        std::fs::write(video_dir.join(format!("{n}.mp4")), b"mp4").unwrap();
    }
    let mut backend = FakeTransform::new(33.0);

    let report = compose_with(&fx.job(ComposeOptions::default()), &mut backend, None).unwrap();

    let frames: Vec<u64> = backend
        .ops
        .iter()
        .filter_map(|op| match op {
            TransformOp::NormalizeClip { frames, .. } => Some(*frames),
            _ => None,
        })
        .collect();
    assert_eq!(frames.len(), 6);
    assert_eq!(frames.iter().sum::<u64>(), 825);
    let planned: Vec<u64> = report.timeline.scenes.iter().map(|s| s.frames).collect();
    assert_eq!(frames, planned);
}

/// Everything a fatal failure must leave alone.
fn assert_nothing_published(fx: &Fixture, script_before: &str) {
    assert!(!fx.video_dir().join("why-octopuses-are-weird.mp4").exists());
    assert_eq!(std::fs::read_to_string(&fx.script_path).unwrap(), script_before);
    assert_eq!(fx.scratch_dirs().len(), 1, "scratch is kept for inspection");
}

#[test]
fn test_whole_timeline_stage_failures_are_fatal() {
    for stage in ["concat", "audio mix", "subtitle burn"] {
        let fx = Fixture::new(base_script(vec![
            image_scene(1, "One."),
            image_scene(2, "Two."),
        ]));
        let before = std::fs::read_to_string(&fx.script_path).unwrap();
        let mut backend = FakeTransform::new(10.0);
        backend.failing_stage = Some(stage);
        let options = ComposeOptions {
            subtitles: SubtitleChoice::Enabled,
            ..ComposeOptions::default()
        };

        let err = compose_with(&fx.job(options), &mut backend, None).unwrap_err();

        match &err {
            ReelError::Transform { stage: failed, .. } => assert_eq!(failed, stage),
            other => panic!("expected {stage} failure, got {other:?}"),
        }
        assert_eq!(backend.stages().last(), Some(&stage));
        assert_nothing_published(&fx, &before);
    }
}

#[test]
fn test_unmeasurable_final_video_publishes_nothing() {
    let fx = Fixture::new(base_script(vec![image_scene(1, "One.")]));
    let before = std::fs::read_to_string(&fx.script_path).unwrap();
    let mut backend = FakeTransform::new(5.0);
    backend.unmeasurable_file = Some("with-audio.mp4");

    let err = compose_with(&fx.job(ComposeOptions::default()), &mut backend, None).unwrap_err();

    assert!(matches!(err, ReelError::Transform { .. }));
    assert_nothing_published(&fx, &before);
}

#[test]
fn test_failed_write_back_withdraws_the_video() {
    let fx = Fixture::new(base_script(vec![image_scene(1, "One.")]));
    let before = std::fs::read_to_string(&fx.script_path).unwrap();
    // A directory in the way of the temp file makes the save fail.
    std::fs::create_dir(fx.script_path.with_file_name("script.json.tmp")).unwrap();
    let mut backend = FakeTransform::new(5.0);

    let err = compose_with(&fx.job(ComposeOptions::default()), &mut backend, None).unwrap_err();

    assert!(matches!(err, ReelError::Script { .. }));
    assert_nothing_published(&fx, &before);
    assert!(fx.scratch_dirs()[0].join("with-audio.mp4").is_file());
}
