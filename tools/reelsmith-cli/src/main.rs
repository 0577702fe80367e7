//! Reelsmith CLI — Command-line interface for composing short-form videos.
//!
//! Usage:
//!   reelsmith compose <SCRIPT>    Compose a script into a finished video
//!   reelsmith validate <SCRIPT>   Check a script and its assets
//!   reelsmith info <SCRIPT>       Show script information
//!   reelsmith check               Check the media toolchain

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reelsmith_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "reelsmith",
    about = "Compose vertical short-form videos from narrated scene scripts",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose a script into a finished video
    Compose {
        /// Path to the script document
        script: PathBuf,

        /// Don't include background music
        #[arg(long)]
        no_music: bool,

        /// Burn captions into the video
        #[arg(long)]
        subtitles: bool,

        /// Never burn captions (overrides --subtitles and the script)
        #[arg(long)]
        no_subtitles: bool,

        /// Print the final report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check a script and its referenced assets
    Validate {
        /// Path to the script document
        script: PathBuf,
    },

    /// Show script information
    Info {
        /// Path to the script document
        script: PathBuf,
    },

    /// Check that ffmpeg and ffprobe are available
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut config, config_problem) = AppConfig::load();
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    reelsmith_common::logging::init_logging(&config.logging);
    if let Some(problem) = config_problem {
        tracing::warn!("{problem}");
    }

    match cli.command {
        Commands::Compose {
            script,
            no_music,
            subtitles,
            no_subtitles,
            json,
        } => commands::compose::run(script, no_music, subtitles, no_subtitles, json, config).await,
        Commands::Validate { script } => commands::validate::run(script),
        Commands::Info { script } => commands::info::run(script, &config),
        Commands::Check => commands::check::run(&config),
    }
}
