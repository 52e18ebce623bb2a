use crate::content::ChatMessage;
use crate::errors::ClientError;

/// Body of one chat-completion request.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ChatRequest {
    /// Routing id of the model (see `catalog::AVAILABLE_MODELS`).
    pub model: String,
    /// Conversation history, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Ask the endpoint for an SSE stream instead of one JSON body.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

impl ChatRequest {
    /// Creates a streaming request with no messages yet.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            stream: true,
        }
    }

    /// Appends one message.
    pub fn message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// Appends every message of `messages` in order.
    pub fn messages(mut self, messages: impl IntoIterator<Item = ChatMessage>) -> Self {
        self.messages.extend(messages);
        self
    }

    /// Sets whether the response should be streamed.
    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Checks the request before it is sent.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.model.trim().is_empty() {
            return Err(ClientError::Validation("model must not be empty".into()));
        }
        if self.messages.is_empty() {
            return Err(ClientError::Validation(
                "at least one message is required".into(),
            ));
        }
        if self.messages.iter().all(ChatMessage::is_blank) {
            return Err(ClientError::Validation(
                "messages must not all be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_stream_flag_only_when_set() {
        let request = ChatRequest::new("openai/gpt-4o").message(ChatMessage::user("hi"));
        let body = serde_json::to_value(&request).expect("body");
        assert_eq!(
            body,
            serde_json::json!({
                "model": "openai/gpt-4o",
                "messages": [{"role": "user", "content": "hi"}],
                "stream": true,
            })
        );

        let body = serde_json::to_value(request.stream(false)).expect("body");
        assert!(body.get("stream").is_none());
    }

    #[test]
    fn validation_rejects_missing_model_and_messages() {
        let err = ChatRequest::new(" ")
            .message(ChatMessage::user("hi"))
            .validate()
            .expect_err("empty model");
        assert!(matches!(err, ClientError::Validation(msg) if msg.contains("model")));

        let err = ChatRequest::new("m").validate().expect_err("no messages");
        assert!(matches!(err, ClientError::Validation(msg) if msg.contains("at least one")));

        let err = ChatRequest::new("m")
            .message(ChatMessage::user("  "))
            .validate()
            .expect_err("blank");
        assert!(matches!(err, ClientError::Validation(msg) if msg.contains("empty")));
    }

    #[test]
    fn keeps_history_order() {
        let request = ChatRequest::new("m").messages([
            ChatMessage::system("be brief"),
            ChatMessage::user("q1"),
            ChatMessage::assistant("a1"),
            ChatMessage::user("q2"),
        ]);
        assert!(request.validate().is_ok());
        assert_eq!(request.messages.len(), 4);
        assert_eq!(request.messages[3], ChatMessage::user("q2"));
    }
}
