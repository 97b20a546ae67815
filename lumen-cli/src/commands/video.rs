//! Video command handlers

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use lumen_core::domain::media::{InlineMedia, VideoAspectRatio};
use std::path::PathBuf;

use super::output_path;
use crate::config::Config;

/// Video subcommands
#[derive(Subcommand)]
pub enum VideoCommands {
    /// Generate a video from a prompt, optionally starting from an image
    Generate {
        /// What should happen in the video
        prompt: String,

        /// Starting frame
        #[arg(long)]
        image: Option<PathBuf>,

        /// Either 16:9 or 9:16
        #[arg(long, default_value = "16:9")]
        aspect_ratio: VideoAspectRatio,

        /// Output file (defaults to a random name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Handle video commands
///
/// # Arguments
/// * `command` - The video command to execute
/// * `config` - The CLI configuration
pub async fn handle_video_command(command: VideoCommands, config: &Config) -> Result<()> {
    let client = config.api_client()?;

    match command {
        VideoCommands::Generate {
            prompt,
            image,
            aspect_ratio,
            output,
        } => {
            println!(
                "{}",
                "Generating video, this can take a few minutes (Ctrl-C to cancel)...".cyan()
            );

            let video = match image {
                Some(path) => {
                    let still = InlineMedia::read_file(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    client
                        .generate_video_from_image(&still, &prompt, aspect_ratio, &config.cancel)
                        .await
                }
                None => {
                    client
                        .generate_video_from_text(&prompt, aspect_ratio, &config.cancel)
                        .await
                }
            }
            .context("Video generation failed")?;

            let path = output_path(output, video.extension());
            video
                .save_to(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;

            println!(
                "{} {} ({} bytes)",
                "✓ Saved".green().bold(),
                path.display(),
                video.len()
            );

            Ok(())
        }
    }
}
