//! OpenRouter chat-completions integration.
//!
//! `OpenRouterClient` implements [`ChatTransport`](crate::transport::ChatTransport),
//! so it can be driven directly or handed to [`ChatStream`](crate::run::ChatStream).
mod client;
mod config;

pub use client::{EMPTY_RESPONSE_FALLBACK, OpenRouterClient};
pub use config::OpenRouterConfig;
