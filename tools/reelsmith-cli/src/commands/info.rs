//! Show script information.

use std::path::PathBuf;

use anyhow::Context;
use reelsmith_common::config::AppConfig;
use reelsmith_script_model::{LoadedScript, OutputLayout, VisualType};

pub fn run(script: PathBuf, config: &AppConfig) -> anyhow::Result<()> {
    let loaded = LoadedScript::load(&script)
        .with_context(|| format!("Failed to load script {}", script.display()))?;
    let s = &loaded.script;

    println!("Script: {}", s.title);
    println!("  Style: {}", s.style.as_deref().unwrap_or("N/A"));
    println!("  Orientation: {}", s.orientation.as_deref().unwrap_or("N/A"));
    println!();

    let video_scenes = s
        .scenes
        .iter()
        .filter(|scene| scene.visual_kind() == VisualType::VideoClip)
        .count();
    println!("Scenes: {}", s.scenes.len());
    println!("  Static image: {}", s.scenes.len() - video_scenes);
    println!("  Video clip: {video_scenes}");
    match s.target_duration {
        Some(target) => println!(
            "  Scripted total: {:.1}s (target {:.1}s)",
            s.scripted_total_secs(),
            target
        ),
        None => println!("  Scripted total: {:.1}s", s.scripted_total_secs()),
    }
    println!();

    let words = s.narration_text().split_whitespace().count();
    println!("Narration:");
    println!(
        "  Words: {words} (~{:.1}s at {} words/s)",
        s.estimated_narration_secs(config.compose.words_per_second),
        config.compose.words_per_second
    );
    match (s.narration_audio_path(), loaded.narration_audio()) {
        (Some(_), Some(found)) => println!("  Audio: {}", found.display()),
        (Some(path), None) => println!("  Audio: {} (missing)", path.display()),
        (None, _) => println!("  Audio: not set"),
    }
    match s.word_timestamps() {
        Some(words) => println!("  Word timestamps: {}", words.len()),
        None => println!("  Word timestamps: none"),
    }
    println!();

    let mix = s.mix_config();
    println!("Audio mix:");
    match (s.music_path(), loaded.music()) {
        (Some(_), Some(found)) => println!("  Music: {}", found.display()),
        (Some(path), None) => println!("  Music: {} (missing)", path.display()),
        (None, _) => println!("  Music: none"),
    }
    println!(
        "  Volumes: narration {} / music {}",
        mix.narration_volume, mix.music_volume
    );
    println!(
        "  Subtitles: {}",
        if s.subtitles_requested() { "on" } else { "off" }
    );
    println!();

    let layout = OutputLayout::for_script(&loaded.path, &s.title)?;
    println!("Output:");
    println!("  Target: {}", layout.final_video().display());
    match (&s.output_video, s.actual_duration) {
        (Some(video), Some(duration)) => {
            println!("  Last result: {} ({duration:.1}s)", video.display())
        }
        (Some(video), None) => println!("  Last result: {}", video.display()),
        _ => println!("  Last result: none"),
    }

    Ok(())
}
