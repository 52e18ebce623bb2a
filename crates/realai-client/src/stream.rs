use crate::content::StreamOutput;
use crate::errors::ClientError;

/// Normalized events delivered by `ChannelSink` and `ChatStream`.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamEvent {
    /// One text increment, exactly as decoded.
    TextDelta { seq: u64, text: String },
    /// A newly recognized, non-duplicate image resource.
    Image { seq: u64, image: String },
    /// Terminal success event with the aggregated output.
    Completed { output: StreamOutput },
    /// Terminal failure event.
    Error { error: ClientError },
}

impl StreamEvent {
    /// Returns true for `Completed` and `Error`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Error { .. })
    }
}
