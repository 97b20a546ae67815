//! Image command handlers
//!
//! Generates new images from prompts and edits existing ones.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use lumen_core::domain::artifact::GeneratedImage;
use lumen_core::domain::media::{ImageAspectRatio, InlineMedia};
use std::path::PathBuf;

use super::output_path;
use crate::config::Config;

/// Image subcommands
#[derive(Subcommand)]
pub enum ImageCommands {
    /// Generate an image from a prompt
    Generate {
        /// What the image should show
        prompt: String,

        /// One of 1:1, 3:4, 4:3, 9:16, 16:9
        #[arg(long, default_value = "1:1")]
        aspect_ratio: ImageAspectRatio,

        /// Output file (defaults to a random name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Edit an image according to a prompt
    Edit {
        /// Image to edit
        input: PathBuf,

        /// The edit to apply
        prompt: String,

        /// Output file (defaults to a random name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Handle image commands
///
/// # Arguments
/// * `command` - The image command to execute
/// * `config` - The CLI configuration
pub async fn handle_image_command(command: ImageCommands, config: &Config) -> Result<()> {
    let client = config.api_client()?;

    match command {
        ImageCommands::Generate {
            prompt,
            aspect_ratio,
            output,
        } => {
            println!("{}", format!("Generating {} image...", aspect_ratio).cyan());
            let image = client
                .generate_image(&prompt, aspect_ratio, &config.cancel)
                .await
                .context("Image generation failed")?;
            save_image(&image, output)
        }
        ImageCommands::Edit {
            input,
            prompt,
            output,
        } => {
            let source = InlineMedia::read_file(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            println!("{}", format!("Editing {}...", input.display()).cyan());
            let image = client
                .edit_image(&source, &prompt, &config.cancel)
                .await
                .context("Image edit failed")?;
            save_image(&image, output)
        }
    }
}

fn save_image(image: &GeneratedImage, output: Option<PathBuf>) -> Result<()> {
    let path = output_path(output, image.extension());
    image
        .save_to(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!(
        "{} {} ({} bytes)",
        "✓ Saved".green().bold(),
        path.display(),
        image.bytes().len()
    );

    Ok(())
}
