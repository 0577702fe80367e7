//! Check the media toolchain.

use reelsmith_common::config::{config_file_path, AppConfig};
use reelsmith_compose_engine::ffmpeg::command_exists;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Reelsmith System Check");
    println!("{}", "=".repeat(50));

    let mut all_ok = true;
    for binary in ["ffmpeg", "ffprobe"] {
        if command_exists(binary) {
            println!("[OK] {binary} found in PATH");
        } else {
            println!("[MISSING] {binary} not found in PATH");
            all_ok = false;
        }
    }

    let config_path = config_file_path();
    if config_path.exists() {
        println!("[OK] Config: {}", config_path.display());
    } else {
        println!("[INFO] Config: defaults ({} not found)", config_path.display());
    }

    let profile = &config.profile;
    match profile.validate() {
        Ok(()) => println!(
            "[OK] Output profile: {}x{} ({}) @ {}fps, {} {} crf {}",
            profile.width,
            profile.height,
            profile.aspect_label(),
            profile.fps,
            profile.video_codec,
            profile.preset,
            profile.crf
        ),
        Err(e) => {
            println!("[ERROR] Output profile: {e}");
            all_ok = false;
        }
    }

    println!();
    if all_ok {
        println!("All required tools are available. Reelsmith is ready.");
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "Some requirements are missing. Install ffmpeg (which ships ffprobe) and check your config."
        ))
    }
}
