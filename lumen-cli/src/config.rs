//! Configuration module
//!
//! Loads the client configuration from the environment and overlays the
//! command-line flags on top of it.

use anyhow::{Context, Result};
use lumen_client::{ClientConfig, EnvCredential, LumenClient};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Values given on the command line, which win over the environment
#[derive(Debug, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub max_attempts: Option<u32>,
}

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Settings for the API client
    pub client: ClientConfig,

    /// Cancelled on Ctrl-C
    pub cancel: CancellationToken,
}

impl Config {
    /// Loads and validates the configuration
    pub fn load(overrides: Overrides) -> Result<Self> {
        Self::build(ClientConfig::from_env(), overrides)
    }

    fn build(env: Result<ClientConfig>, overrides: Overrides) -> Result<Self> {
        let mut client = env.context("Invalid environment configuration")?;

        if let Some(base_url) = overrides.base_url {
            client.base_url = base_url;
        }

        if let Some(max_attempts) = overrides.max_attempts {
            client.retry.max_attempts = max_attempts;
        }

        client.validate().context("Invalid configuration")?;
        debug!("Loaded configuration: {:?}", client);

        Ok(Self {
            client,
            cancel: CancellationToken::new(),
        })
    }

    /// Builds an API client reading its key from the environment
    pub fn api_client(&self) -> Result<LumenClient> {
        LumenClient::from_config(&self.client, EnvCredential::default())
            .context("Failed to create API client")
    }
}
