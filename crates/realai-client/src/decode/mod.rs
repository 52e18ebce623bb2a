//! Streaming decode pipeline: raw SSE bytes in, text increments and image
//! resources out.
//!
//! ```text
//! bytes -> FrameReader -> EventRecord -> PayloadKind -> {text, ImageAggregator} -> StreamSink
//! ```
//!
//! [`decode_stream`] drives a [`DecodeSession`] over an async byte source. The
//! only suspension point is the wait for the next chunk; everything between
//! chunks runs synchronously.

mod frame;
mod images;
mod payload;
mod session;
mod sink;

use futures::{Stream, StreamExt as _};
use tracing::debug;

use crate::abort::AbortSignal;
use crate::content::StreamOutput;
use crate::errors::StreamError;

pub use frame::FrameReader;
pub use images::{DEFAULT_MEDIA_TYPE, ImageAggregator, embedded_data, split_embedded_data};
pub use payload::{
    Choice, ChunkPayload, ContentPart, Delta, EventRecord, GeneratedAsset, ImageDescriptor,
    ImageSource, ImageUrl, Message, MessageContent, PayloadKind,
};
pub use session::{DecodeSession, SessionStats};
pub use sink::{Callbacks, ChannelSink, StreamSink};

/// Decodes a whole byte stream, invoking `sink` as content is recognized.
///
/// Returns the aggregated text and de-duplicated images once the source ends.
/// A failing source yields `StreamError::Transport`; an aborted `abort`
/// signal yields `StreamError::Cancelled` at the next wait for data.
/// Malformed records never fail the call.
pub async fn decode_stream<St, B, E, S>(
    bytes: St,
    sink: &mut S,
    mut abort: Option<AbortSignal>,
) -> Result<StreamOutput, StreamError>
where
    St: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<StreamError>,
    S: StreamSink + ?Sized,
{
    let mut bytes = std::pin::pin!(bytes);
    let mut session = DecodeSession::new();
    debug!(session = %session.id(), "stream decode started");

    loop {
        let next = match abort.as_mut() {
            Some(signal) => {
                if signal.is_aborted() {
                    debug!(session = %session.id(), "stream decode aborted");
                    return Err(StreamError::Cancelled);
                }
                tokio::select! {
                    biased;
                    _ = signal.aborted() => {
                        debug!(session = %session.id(), "stream decode aborted");
                        return Err(StreamError::Cancelled);
                    }
                    next = bytes.next() => next,
                }
            }
            None => bytes.next().await,
        };

        match next {
            Some(Ok(chunk)) => session.push_chunk(chunk.as_ref(), sink),
            Some(Err(err)) => {
                let err = err.into();
                debug!(session = %session.id(), error = %err, "byte source failed");
                return Err(err);
            }
            None => break,
        }
    }

    Ok(session.finish(sink))
}

/// Decodes a complete in-memory response body.
///
/// Equivalent to feeding `body` as a single chunk to [`decode_stream`].
pub fn decode_body<S: StreamSink + ?Sized>(body: &[u8], sink: &mut S) -> StreamOutput {
    let mut session = DecodeSession::new();
    session.push_chunk(body, sink);
    session.finish(sink)
}
