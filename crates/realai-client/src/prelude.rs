//! Common imports for typical client usage.
pub use crate::{
    AbortHandle, Callbacks, ChatMessage, ChatRequest, ChatStream, ChatTransport, ClientError,
    DEFAULT_MODEL, StreamError, StreamEvent, StreamOutput, StreamSink,
};
