//! Analysis command handlers
//!
//! Asks the analysis model about a single image or a sequence of frames
//! and prints its answer.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use lumen_core::domain::media::InlineMedia;
use std::path::{Path, PathBuf};

use crate::config::Config;

/// Analyze subcommands
#[derive(Subcommand)]
pub enum AnalyzeCommands {
    /// Analyze one image
    Image {
        /// Image to analyze
        input: PathBuf,

        /// Question or instruction about the image
        prompt: String,
    },
    /// Analyze an ordered sequence of video frames
    Frames {
        /// Frame images, in playback order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Question or instruction about the frames
        #[arg(short, long)]
        prompt: String,
    },
}

/// Handle analyze commands
///
/// # Arguments
/// * `command` - The analyze command to execute
/// * `config` - The CLI configuration
pub async fn handle_analyze_command(command: AnalyzeCommands, config: &Config) -> Result<()> {
    let client = config.api_client()?;

    let answer = match command {
        AnalyzeCommands::Image { input, prompt } => {
            let image = read_media(&input)?;
            println!("{}", format!("Analyzing {}...", input.display()).cyan());
            client
                .analyze_image(&image, &prompt, &config.cancel)
                .await
                .context("Image analysis failed")?
        }
        AnalyzeCommands::Frames { files, prompt } => {
            let frames = files
                .iter()
                .map(|path| read_media(path))
                .collect::<Result<Vec<_>>>()?;
            println!("{}", format!("Analyzing {} frame(s)...", frames.len()).cyan());
            client
                .analyze_video_frames(&frames, &prompt, &config.cancel)
                .await
                .context("Frame analysis failed")?
        }
    };

    println!();
    println!("{}", answer);

    Ok(())
}

fn read_media(path: &Path) -> Result<InlineMedia> {
    InlineMedia::read_file(path).with_context(|| format!("Failed to read {}", path.display()))
}
