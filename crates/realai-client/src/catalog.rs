/// One selectable chat model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ModelInfo {
    /// Routing id sent as the request `model` field.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Vendor that trains the model.
    pub provider: &'static str,
}

const fn model(id: &'static str, name: &'static str, provider: &'static str) -> ModelInfo {
    ModelInfo { id, name, provider }
}

/// Models offered for selection, in display order.
pub const AVAILABLE_MODELS: &[ModelInfo] = &[
    model("openai/gpt-5.2", "GPT-5.2", "OpenAI"),
    model("openai/gpt-4o", "GPT-4o", "OpenAI"),
    model("openai/gpt-4o-mini", "GPT-4o Mini", "OpenAI"),
    model("openai/gpt-4-turbo", "GPT-4 Turbo", "OpenAI"),
    model("anthropic/claude-opus-4.5", "Claude Opus 4.5", "Anthropic"),
    model("anthropic/claude-3.5-sonnet", "Claude 3.5 Sonnet", "Anthropic"),
    model("anthropic/claude-3-haiku", "Claude 3 Haiku", "Anthropic"),
    model("google/gemini-3-pro-preview", "Gemini 3 Pro", "Google"),
    model("google/gemini-3-flash-preview", "Gemini 3 Flash", "Google"),
    model("google/gemini-pro-1.5", "Gemini Pro 1.5", "Google"),
    model("google/gemini-flash-1.5", "Gemini Flash 1.5", "Google"),
    model("meta-llama/llama-3.1-70b-instruct", "Llama 3.1 70B", "Meta"),
    model("meta-llama/llama-3.1-8b-instruct", "Llama 3.1 8B", "Meta"),
    model("deepseek/deepseek-v3.2", "DeepSeek V3.2", "DeepSeek"),
    model("deepseek/deepseek-chat", "DeepSeek Chat", "DeepSeek"),
    model("qwen/qwen-2.5-72b-instruct", "Qwen 2.5 72B", "Alibaba"),
];

/// Model used when the caller does not pick one.
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Looks up a catalog entry by routing id.
pub fn find_model(id: &str) -> Option<&'static ModelInfo> {
    AVAILABLE_MODELS.iter().find(|m| m.id == id)
}

/// Iterates the catalog entries of one vendor.
pub fn models_by_provider(provider: &str) -> impl Iterator<Item = &'static ModelInfo> + '_ {
    AVAILABLE_MODELS
        .iter()
        .filter(move |m| m.provider.eq_ignore_ascii_case(provider))
}
