//! Compose a script into a finished video.

use std::path::PathBuf;

use reelsmith_common::config::AppConfig;
use reelsmith_compose_engine::{
    compose_script, ComposeJob, ComposeOptions, ComposeProgress, ComposeReport, ComposeStage,
    SubtitleChoice,
};

pub async fn run(
    script: PathBuf,
    no_music: bool,
    subtitles: bool,
    no_subtitles: bool,
    json: bool,
    config: AppConfig,
) -> anyhow::Result<()> {
    println!("Composing script: {}", script.display());
    println!(
        "  Format: {}x{} ({}) @ {}fps",
        config.profile.width,
        config.profile.height,
        config.profile.aspect_label(),
        config.profile.fps
    );

    let job = ComposeJob {
        script_path: script,
        options: ComposeOptions {
            no_music,
            subtitles: SubtitleChoice::from_flags(subtitles, no_subtitles),
        },
        config,
    };

    let progress_cb: Box<dyn Fn(ComposeProgress) + Send> = Box::new(|p| match p.stage {
        ComposeStage::RenderingClips if p.completed < p.total => {
            println!("  [{}/{}] {}", p.completed + 1, p.total, p.message);
        }
        ComposeStage::Complete => {}
        _ => println!("{}: {}", capitalize(p.stage.label()), p.message),
    });

    let report = compose_script(job, Some(progress_cb))
        .await
        .map_err(|e| anyhow::anyhow!("Composition failed: {e}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    Ok(())
}

fn print_summary(report: &ComposeReport) {
    println!("\n{}", "=".repeat(50));
    println!("Short video complete!");
    println!("  Output: {}", report.output_path.display());
    println!(
        "  Duration: {:.1}s (narration {:.1}s, drift {:+.3}s)",
        report.duration_secs, report.narration_secs, report.drift_secs
    );
    println!(
        "  Format: {}x{} ({}) @ {}fps",
        report.width, report.height, report.aspect, report.fps
    );
    println!("  Style: {}", report.style.as_deref().unwrap_or("N/A"));
    println!("  Audio: {}", report.audio.label());
    println!(
        "  Scenes: {} of {} rendered",
        report.scenes_rendered(),
        report.scenes_total
    );
    for skipped in &report.skipped {
        println!(
            "    skipped scene {}: {}",
            skipped.scene_number, skipped.reason
        );
    }
    match (&report.captions, &report.srt_path, &report.ass_path) {
        (Some(mode), Some(srt), Some(ass)) => {
            println!("  Captions: {} (burned in)", mode.as_str());
            println!("    {}", srt.display());
            println!("    {}", ass.display());
        }
        _ => println!("  Captions: none"),
    }
    if let Some(scratch) = &report.scratch_kept {
        println!("  Scratch kept: {}", scratch.display());
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
