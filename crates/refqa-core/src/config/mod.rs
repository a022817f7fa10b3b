mod env;
mod types;

#[cfg(test)]
mod tests;

pub use env::OPENAI_KEY_VARS;
pub use types::*;

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};

/// Config file used when neither `--config` nor `REFQA_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str::<Self>(&content)
                .with_context(|| format!("failed to parse config file {}", path.display()))?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error when the OpenAI provider has no API key, `top_k` is
    /// zero, `min_score` is not a cosine score, or no category is configured.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.llm.provider == ProviderKind::OpenAi && self.secrets.openai_api_key.is_none() {
            bail!("missing OPENAI_API_KEY environment variable");
        }
        if self.index.top_k == 0 {
            bail!("index.top_k must be at least 1");
        }
        if !(-1.0..=1.0).contains(&self.index.min_score) {
            bail!(
                "index.min_score must be between -1.0 and 1.0, got {}",
                self.index.min_score
            );
        }
        if self.categories.is_empty() {
            bail!("at least one category must be configured");
        }
        Ok(())
    }
}

/// `explicit` (the `--config` flag), then `REFQA_CONFIG`, then the default path.
#[must_use]
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("REFQA_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}

/// Load `.env` from the working directory or its parents into the process
/// environment. A missing file only produces a warning.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {
            tracing::warn!(".env file not found, using system environment variables");
        }
        Err(e) => tracing::warn!("failed to load .env: {e}"),
    }
}
