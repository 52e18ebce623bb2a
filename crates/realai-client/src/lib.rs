//! Streaming chat-completion client that rebuilds interleaved text and image
//! output from server-sent-event chunks.
//!
//! The decoder in [`decode`] is transport-agnostic: feed it any stream of byte
//! chunks and it reports each text increment and each newly seen image as
//! soon as it is recognized, then returns the aggregated [`StreamOutput`].
//! [`vendors::openrouter`] supplies an HTTP transport for OpenRouter.
//!
//! # Streaming a reply (OpenRouter)
//!
//! ```no_run
//! use realai_client::prelude::*;
//! use realai_client::vendors::openrouter::OpenRouterClient;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ClientError> {
//! let client = OpenRouterClient::from_env()?;
//! let history = [ChatMessage::user("Draw a small red square and describe it")];
//!
//! let mut sink = Callbacks::new(|text: &str| print!("{text}"))
//!     .with_image(|image: &str| eprintln!("\n[image: {} chars]", image.len()));
//! let output = client
//!     .send_message_stream(&history, DEFAULT_MODEL, &mut sink, None)
//!     .await?;
//!
//! println!("\n{} image(s)", output.images.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Decoding a captured body
//!
//! ```
//! use realai_client::decode::decode_body;
//!
//! let body = b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\ndata: [DONE]\n\n";
//! let output = decode_body(body, &mut ());
//! assert_eq!(output.text, "Hi");
//! assert!(output.images.is_empty());
//! ```

/// Cooperative cancellation for in-flight streams.
pub mod abort;
/// Models offered to users.
pub mod catalog;
/// Conversation messages and aggregated stream output.
pub mod content;
pub mod decode;
/// Public error types.
pub mod errors;
/// Optional `tracing` subscriber setup.
pub mod observability;
/// Common imports for typical usage.
pub mod prelude;
/// Chat-completion request body.
pub mod request;
/// Background stream driver with an event channel.
pub mod run;
/// Events emitted by [`run::ChatStream`].
pub mod stream;
/// Transport contract and the generic stream entry point.
pub mod transport;
/// Vendor-specific integrations.
pub mod vendors;

pub use abort::{AbortHandle, AbortSignal};
pub use catalog::{AVAILABLE_MODELS, DEFAULT_MODEL, ModelInfo};
pub use content::{ChatMessage, Role, StreamOutput};
pub use decode::{Callbacks, ChannelSink, DecodeSession, StreamSink, decode_body, decode_stream};
pub use errors::{ClientError, StreamError};
pub use observability::init_observability;
pub use request::ChatRequest;
pub use run::ChatStream;
pub use stream::StreamEvent;
pub use transport::{ByteStream, ChatTransport, stream_chat};
