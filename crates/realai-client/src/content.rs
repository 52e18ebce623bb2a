/// Author of a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message of the conversation history sent with a request.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    /// Plain text or a provider-specific array of content parts.
    pub content: serde_json::Value,
}

impl ChatMessage {
    /// Creates a plain-text message.
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: serde_json::Value::String(text.into()),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::text(Role::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::text(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::text(Role::Assistant, text)
    }

    /// Returns true when the message carries no usable content.
    pub(crate) fn is_blank(&self) -> bool {
        match &self.content {
            serde_json::Value::Null => true,
            serde_json::Value::String(text) => text.trim().is_empty(),
            serde_json::Value::Array(parts) => parts.is_empty(),
            _ => false,
        }
    }
}

/// Final aggregated result of one decoded stream.
#[derive(Clone, Debug, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct StreamOutput {
    /// Every text increment concatenated in arrival order.
    pub text: String,
    /// Image resources in order of first appearance, without duplicates.
    ///
    /// Each entry is either a remote URL or a `data:<media-type>;base64,...`
    /// string.
    pub images: Vec<String>,
}

impl StreamOutput {
    /// Returns true when neither text nor images were produced.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.images.is_empty()
    }

    /// Iterates over images that are embedded-data strings.
    pub fn embedded_images(&self) -> impl Iterator<Item = &str> {
        self.images
            .iter()
            .map(String::as_str)
            .filter(|image| image.starts_with("data:"))
    }
}
