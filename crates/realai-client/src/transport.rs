use std::pin::Pin;

use crate::abort::AbortSignal;
use crate::content::StreamOutput;
use crate::decode::{StreamSink, decode_stream};
use crate::errors::{ClientError, StreamError};
use crate::request::ChatRequest;

/// Raw response body of a streaming request.
pub type ByteStream =
    Pin<Box<dyn futures::Stream<Item = Result<bytes::Bytes, StreamError>> + Send + 'static>>;

/// Contract implemented by HTTP integrations.
///
/// Implementations own request construction, authentication, and mapping of
/// non-success statuses to `ClientError::Provider`. Decoding the returned
/// bytes is left to the caller.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Short name used in logs (for example `openrouter`).
    fn name(&self) -> &str;

    /// Sends `request` and returns the response body once streaming begins.
    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, ClientError>;
}

/// Sends `request` through `transport` and decodes the streamed response.
///
/// The abort signal is honored both while the request is being opened and
/// while waiting for chunks.
pub async fn stream_chat<T, S>(
    transport: &T,
    request: &ChatRequest,
    sink: &mut S,
    mut abort: Option<AbortSignal>,
) -> Result<StreamOutput, ClientError>
where
    T: ChatTransport + ?Sized,
    S: StreamSink + ?Sized,
{
    request.validate()?;
    if !request.stream {
        return Err(ClientError::Validation(
            "stream_chat requires a streaming request".into(),
        ));
    }
    tracing::debug!(transport = transport.name(), model = %request.model, messages = request.messages.len(), "opening chat stream");

    let bytes = match abort.as_mut() {
        Some(signal) => {
            tokio::select! {
                biased;
                _ = signal.aborted() => return Err(StreamError::Cancelled.into()),
                opened = transport.open_stream(request) => opened?,
            }
        }
        None => transport.open_stream(request).await?,
    };

    Ok(decode_stream(bytes, sink, abort).await?)
}
