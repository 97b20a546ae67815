//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod analyze;
mod image;
mod text;
mod video;

pub use analyze::AnalyzeCommands;
pub use image::ImageCommands;
pub use video::VideoCommands;

use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;
use uuid::Uuid;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Image generation and editing
    Image {
        #[command(subcommand)]
        command: ImageCommands,
    },
    /// Video generation
    Video {
        #[command(subcommand)]
        command: VideoCommands,
    },
    /// Image and video-frame analysis
    Analyze {
        #[command(subcommand)]
        command: AnalyzeCommands,
    },
    /// Generate text from a prompt
    Text {
        /// The prompt
        prompt: String,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
///
/// # Returns
/// Result indicating success or failure
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Image { command } => image::handle_image_command(command, config).await,
        Commands::Video { command } => video::handle_video_command(command, config).await,
        Commands::Analyze { command } => analyze::handle_analyze_command(command, config).await,
        Commands::Text { prompt } => text::generate_text(&prompt, config).await,
    }
}

/// Where to write a generated file
///
/// Falls back to `<uuid>.<extension>` in the current directory.
fn output_path(output: Option<PathBuf>, extension: &str) -> PathBuf {
    output.unwrap_or_else(|| PathBuf::from(format!("{}.{}", Uuid::new_v4(), extension)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_keeps_explicit_path() {
        let path = output_path(Some(PathBuf::from("out/fox.png")), "png");
        assert_eq!(path, PathBuf::from("out/fox.png"));
    }

    #[test]
    fn test_output_path_defaults_to_uuid() {
        let path = output_path(None, "mp4");
        let name = path.to_str().unwrap();

        assert!(name.ends_with(".mp4"));
        assert!(Uuid::parse_str(name.trim_end_matches(".mp4")).is_ok());
    }
}
