use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::completion::GeminiClient;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-001";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Settings for the text-completion provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl CompletionSettings {
    pub fn resolve(
        api_key: Option<String>,
        model: String,
        base_url: String,
    ) -> anyhow::Result<Self> {
        let api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .context("GOOGLE_GENAI_API_KEY must be set to use the chat assistant")?;

        Ok(Self {
            api_key,
            model,
            base_url,
        })
    }

    pub fn client(&self) -> GeminiClient {
        GeminiClient::new(&self.base_url, &self.model, &self.api_key)
    }
}

/// `RUST_LOG` wins when set; otherwise `info`, or `debug` with `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
