use futures::StreamExt as _;
use tracing::debug;

use crate::abort::AbortSignal;
use crate::content::{ChatMessage, StreamOutput};
use crate::decode::StreamSink;
use crate::errors::{ClientError, StreamError};
use crate::request::ChatRequest;
use crate::transport::{ByteStream, ChatTransport, stream_chat};

use super::config::OpenRouterConfig;

const OPENROUTER: &str = "openrouter";

/// Returned by `send_message` when the completion carries no text.
pub const EMPTY_RESPONSE_FALLBACK: &str = "no response content";

/// Client for OpenRouter's chat-completions endpoint.
pub struct OpenRouterClient {
    client: reqwest::Client,
    config: OpenRouterConfig,
}

impl OpenRouterClient {
    /// Creates a client from explicit configuration.
    pub fn new(config: OpenRouterConfig) -> Result<Self, ClientError> {
        if config.api_key.trim().is_empty() {
            return Err(ClientError::Config(
                "OpenRouter config api_key must not be empty".into(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Creates a client using `OPENROUTER_API_KEY`.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(OpenRouterConfig::from_env()?)
    }

    pub fn config(&self) -> &OpenRouterConfig {
        &self.config
    }

    /// Sends the conversation without streaming and returns the reply text.
    ///
    /// A reply without text yields [`EMPTY_RESPONSE_FALLBACK`].
    pub async fn send_message(
        &self,
        messages: &[ChatMessage],
        model: &str,
    ) -> Result<String, ClientError> {
        let request = ChatRequest::new(model)
            .messages(messages.iter().cloned())
            .stream(false);
        request.validate()?;
        let response = self.send(&request).await?;
        let body: serde_json::Value = response.json().await.map_err(|e| {
            ClientError::Protocol(format!("invalid OpenRouter response body: {e}"))
        })?;
        Ok(completion_text(&body).unwrap_or_else(|| EMPTY_RESPONSE_FALLBACK.to_string()))
    }

    /// Streams the reply, calling `sink` for every text increment and image.
    pub async fn send_message_stream<S>(
        &self,
        messages: &[ChatMessage],
        model: &str,
        sink: &mut S,
        abort: Option<AbortSignal>,
    ) -> Result<StreamOutput, ClientError>
    where
        S: StreamSink + Send + ?Sized,
    {
        let request = ChatRequest::new(model).messages(messages.iter().cloned());
        stream_chat(self, &request, sink, abort).await
    }

    async fn send(&self, request: &ChatRequest) -> Result<reqwest::Response, ClientError> {
        debug!(model = %request.model, stream = request.stream, messages = request.messages.len(), "sending OpenRouter request");
        let mut http_req = self
            .client
            .post(self.config.chat_completions_url())
            .bearer_auth(&self.config.api_key)
            .header("X-Title", &self.config.title)
            .json(request);
        if let Some(referer) = self.config.referer.as_deref() {
            http_req = http_req.header("HTTP-Referer", referer);
        }

        let response = http_req
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("OpenRouter request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_response(status.as_u16(), &body));
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl ChatTransport for OpenRouterClient {
    fn name(&self) -> &str {
        OPENROUTER
    }

    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, ClientError> {
        let response = self.send(request).await?;
        let bytes = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| StreamError::transport(format!("OpenRouter stream read failed: {e}")))
        });
        Ok(Box::pin(bytes))
    }
}

/// Maps a non-success response to `ClientError::Provider`, preferring the
/// upstream `error.message`.
pub(crate) fn error_from_response(status: u16, body: &str) -> ClientError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")?
                .get("message")?
                .as_str()
                .map(ToOwned::to_owned)
        })
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| format!("request failed with status {status}"));
    ClientError::provider(status, message)
}

/// Text of `choices[0].message.content` for a non-streaming completion.
pub(crate) fn completion_text(body: &serde_json::Value) -> Option<String> {
    let content = body.get("choices")?.get(0)?.get("message")?.get("content")?;
    let text = match content {
        serde_json::Value::String(text) => text.clone(),
        serde_json::Value::Array(parts) => parts
            .iter()
            .filter(|part| part.get("type").and_then(|t| t.as_str()) == Some("text"))
            .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
            .collect(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::Callbacks;
    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};

    #[test]
    fn error_prefers_upstream_message() {
        let err = error_from_response(402, r#"{"error":{"message":"Insufficient credits","code":402}}"#);
        assert_eq!(err, ClientError::provider(402, "Insufficient credits"));
    }

    #[test]
    fn error_falls_back_to_status() {
        for body in ["", "<html>bad gateway</html>", r#"{"error":{}}"#, r#"{"error":{"message":" "}}"#] {
            assert_eq!(
                error_from_response(502, body),
                ClientError::provider(502, "request failed with status 502"),
                "body {body:?}"
            );
        }
    }

    #[test]
    fn completion_text_reads_string_and_parts() {
        let body = serde_json::json!({"choices":[{"message":{"content":"hi"}}]});
        assert_eq!(completion_text(&body).as_deref(), Some("hi"));

        let body = serde_json::json!({"choices":[{"message":{"content":[
            {"type":"text","text":"a"},
            {"type":"image_url","image_url":{"url":"https://x/a.png"}},
            {"type":"text","text":"b"}
        ]}}]});
        assert_eq!(completion_text(&body).as_deref(), Some("ab"));

        for body in [
            serde_json::json!({"choices":[]}),
            serde_json::json!({"choices":[{"message":{"content":""}}]}),
            serde_json::json!({"choices":[{"message":{"content":null}}]}),
        ] {
            assert_eq!(completion_text(&body), None);
        }
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let err = OpenRouterClient::new(OpenRouterConfig::new("  ")).err();
        assert!(matches!(err, Some(ClientError::Config(_))));
    }

    /// Accepts one connection, records the raw request, and replies with
    /// `response` before closing.
    async fn serve_once(response: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut raw = Vec::new();
            let mut buf = [0_u8; 4096];
            while !request_complete(&raw) {
                let n = socket.read(&mut buf).await.expect("read");
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
            }
            socket
                .write_all(response.as_bytes())
                .await
                .expect("write");
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&raw).into_owned()
        });
        (format!("http://{addr}"), handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            return false;
        };
        let length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        body.len() >= length
    }

    fn http_response(status: &str, content_type: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\ncontent-type: {content_type}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn client_for(base_url: &str) -> OpenRouterClient {
        OpenRouterClient::new(
            OpenRouterConfig::new("test-key")
                .base_url(base_url)
                .referer("https://app.example"),
        )
        .expect("client")
    }

    #[tokio::test]
    async fn streams_from_local_server_with_auth_headers() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
            ": OPENROUTER PROCESSING\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
            "data: [DONE]\n\n",
        );
        let (base_url, server) = serve_once(http_response("200 OK", "text/event-stream", body)).await;
        let client = client_for(&base_url);

        let mut texts = Vec::new();
        let output = client
            .send_message_stream(
                &[ChatMessage::user("hi")],
                "openai/gpt-4o-mini",
                &mut Callbacks::new(|t: &str| texts.push(t.to_owned())),
                None,
            )
            .await
            .expect("stream");
        assert_eq!(output.text, "Hello");
        assert_eq!(texts, ["Hel", "lo"]);

        let raw = server.await.expect("server").to_ascii_lowercase();
        assert!(raw.starts_with("post /v1/chat/completions"));
        assert!(raw.contains("authorization: bearer test-key"));
        assert!(raw.contains("http-referer: https://app.example"));
        assert!(raw.contains("x-title: real ai"));
        assert!(raw.contains("\"stream\":true"));
    }

    #[tokio::test]
    async fn non_success_status_maps_to_provider_error() {
        let (base_url, server) = serve_once(http_response(
            "401 Unauthorized",
            "application/json",
            r#"{"error":{"message":"No auth credentials found","code":401}}"#,
        ))
        .await;
        let err = client_for(&base_url)
            .send_message_stream(&[ChatMessage::user("hi")], "m", &mut (), None)
            .await
            .expect_err("401");
        assert_eq!(err, ClientError::provider(401, "No auth credentials found"));
        let _ = server.await;
    }

    #[tokio::test]
    async fn send_message_returns_content_or_fallback() {
        let (base_url, server) = serve_once(http_response(
            "200 OK",
            "application/json",
            r#"{"choices":[{"message":{"role":"assistant","content":"pong"}}]}"#,
        ))
        .await;
        let text = client_for(&base_url)
            .send_message(&[ChatMessage::user("ping")], "m")
            .await
            .expect("reply");
        assert_eq!(text, "pong");
        let raw = server.await.expect("server");
        assert!(!raw.contains("\"stream\""));

        let (base_url, server) = serve_once(http_response(
            "200 OK",
            "application/json",
            r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#,
        ))
        .await;
        let text = client_for(&base_url)
            .send_message(&[ChatMessage::user("ping")], "m")
            .await
            .expect("reply");
        assert_eq!(text, EMPTY_RESPONSE_FALLBACK);
        let _ = server.await;
    }

    #[tokio::test]
    async fn env_gated_smoke_stream_if_key_present() {
        if std::env::var("OPENROUTER_API_KEY")
            .unwrap_or_default()
            .trim()
            .is_empty()
        {
            eprintln!("skipping OpenRouter smoke test (OPENROUTER_API_KEY missing)");
            return;
        }

        let client = OpenRouterClient::from_env().expect("client");
        let mut increments = 0_usize;
        let result = client
            .send_message_stream(
                &[ChatMessage::user("Reply with the single word: ok")],
                crate::catalog::DEFAULT_MODEL,
                &mut Callbacks::new(|_: &str| increments += 1),
                None,
            )
            .await;
        assert!(result.is_ok(), "OpenRouter smoke failed: {result:?}");
        assert!(increments > 0);
    }
}
