//! API credential resolution
//!
//! The key is looked up every time a call starts, never cached by the client,
//! so a key changed mid-session is picked up by the next call.

use std::fmt;

/// Environment variables checked by [`EnvCredential::default`], in order
pub const DEFAULT_KEY_VARS: [&str; 2] = ["LUMEN_API_KEY", "GEMINI_API_KEY"];

/// Supplies the API key at call time
pub trait CredentialProvider: Send + Sync {
    /// Current key, or `None` when no key is configured
    fn api_key(&self) -> Option<String>;
}

impl<F> CredentialProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn api_key(&self) -> Option<String> {
        self()
    }
}

/// A fixed key
#[derive(Clone)]
pub struct StaticCredential(String);

impl StaticCredential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl fmt::Debug for StaticCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticCredential(<redacted>)")
    }
}

impl CredentialProvider for StaticCredential {
    fn api_key(&self) -> Option<String> {
        Some(self.0.clone()).filter(|key| !key.is_empty())
    }
}

/// Reads the key from environment variables on every call
///
/// The first variable holding a non-empty value wins.
#[derive(Debug, Clone)]
pub struct EnvCredential {
    vars: Vec<String>,
}

impl EnvCredential {
    pub fn new<I, S>(vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for EnvCredential {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_VARS)
    }
}

impl CredentialProvider for EnvCredential {
    fn api_key(&self) -> Option<String> {
        self.vars
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
    }
}
