//! Text command handler

use anyhow::{Context, Result};

use crate::config::Config;

/// Generate text from a prompt and print it
pub async fn generate_text(prompt: &str, config: &Config) -> Result<()> {
    let client = config.api_client()?;

    let text = client
        .generate_text(prompt, &config.cancel)
        .await
        .context("Text generation failed")?;

    println!("{}", text);

    Ok(())
}
