use std::time::Duration;

use crate::errors::ClientError;

/// Configuration for the OpenRouter client.
#[derive(Clone, Debug)]
pub struct OpenRouterConfig {
    /// API key used for bearer auth.
    pub api_key: String,
    /// Base URL of the OpenRouter-compatible endpoint.
    ///
    /// Useful for proxies or local test servers.
    pub base_url: String,
    /// Value of the `HTTP-Referer` attribution header, when set.
    pub referer: Option<String>,
    /// Value of the `X-Title` attribution header.
    pub title: String,
    /// Default HTTP timeout for requests.
    pub timeout: Duration,
}

impl OpenRouterConfig {
    /// Creates a config with defaults and the provided API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://openrouter.ai/api".to_string(),
            referer: None,
            title: "Real AI".to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Builds a config from the environment.
    ///
    /// `OPENROUTER_API_KEY` is required; `OPENROUTER_BASE_URL` and
    /// `OPENROUTER_REFERER` are optional overrides.
    pub fn from_env() -> Result<Self, ClientError> {
        let api_key = std::env::var("OPENROUTER_API_KEY").unwrap_or_default();
        if api_key.trim().is_empty() {
            return Err(ClientError::Config(
                "missing OPENROUTER_API_KEY for OpenRouter client".into(),
            ));
        }
        let mut config = Self::new(api_key);
        if let Some(base_url) = non_empty_env("OPENROUTER_BASE_URL") {
            config = config.base_url(base_url);
        }
        if let Some(referer) = non_empty_env("OPENROUTER_REFERER") {
            config = config.referer(referer);
        }
        Ok(config)
    }

    /// Overrides the API base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the `HTTP-Referer` header value.
    pub fn referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    /// Overrides the `X-Title` header value.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Overrides the default HTTP timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn chat_completions_url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        )
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
