/// OpenRouter transport and configuration.
pub mod openrouter;
