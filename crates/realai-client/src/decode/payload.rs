//! Wire shapes of one streamed chat-completion chunk and their classification.
//!
//! Every field is optional so an unfamiliar provider extension only costs the
//! part it touches. A record that is not JSON, or whose known fields carry an
//! incompatible type, is classified as malformed.

use serde::Deserialize;

use super::frame::DATA_PREFIX;

/// Literal payload that marks the end of the stream.
pub(crate) const DONE_SENTINEL: &str = "[DONE]";

/// One parsed event record.
#[derive(Debug)]
pub enum EventRecord {
    /// `data: [DONE]`.
    Done,
    /// A structured payload.
    Payload(ChunkPayload),
    /// Anything that failed to parse; carries the parser message for logging.
    Malformed(String),
}

impl EventRecord {
    /// Strips the `data: ` prefix and parses the remainder.
    pub fn parse(record: &str) -> Self {
        let data = record.strip_prefix(DATA_PREFIX).unwrap_or(record);
        if data == DONE_SENTINEL {
            return Self::Done;
        }
        match serde_json::from_str::<ChunkPayload>(data) {
            Ok(payload) => Self::Payload(payload),
            Err(err) => Self::Malformed(err.to_string()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ChunkPayload {
    #[serde(default)]
    pub choices: Option<Vec<Choice>>,
    /// Completed assets returned by image-generation style providers.
    #[serde(default)]
    pub data: Option<Vec<GeneratedAsset>>,
    /// In-band error object some providers send instead of a delta.
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub delta: Option<Delta>,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub content: Option<MessageContent>,
    #[serde(default)]
    pub images: Option<Vec<ImageDescriptor>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub content: Option<MessageContent>,
}

/// `content` is either a plain string or an ordered list of typed parts.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ContentPart {
    #[serde(rename = "text")]
    Text {
        #[serde(default)]
        text: Option<String>,
    },
    #[serde(rename = "image_url")]
    ImageUrl {
        #[serde(default)]
        image_url: Option<ImageUrl>,
    },
    #[serde(rename = "image")]
    Image {
        #[serde(default)]
        source: Option<ImageSource>,
    },
    /// Part types this client does not render (audio, reasoning, ...).
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageUrl {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageSource {
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
}

/// Entry of `delta.images`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImageDescriptor {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub image_url: Option<ImageUrl>,
    #[serde(default)]
    pub index: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub b64_json: Option<String>,
}

/// Entry of a top-level `data` list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GeneratedAsset {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub b64_json: Option<String>,
}

/// Closed set of shapes a payload can contribute.
///
/// Shapes are not exclusive: one payload may yield several kinds, returned in
/// the order they must be processed.
#[derive(Debug)]
pub enum PayloadKind {
    /// `choices[0].delta.content`.
    DeltaText(MessageContent),
    /// `choices[0].delta.images`.
    DeltaImages(Vec<ImageDescriptor>),
    /// `choices[0].message.content` typed parts.
    FinalMessage(Vec<ContentPart>),
    /// Top-level `data` list of finished assets.
    GenerationResults(Vec<GeneratedAsset>),
}

impl ChunkPayload {
    /// Splits the payload into the kinds it carries. Only `choices[0]` is used.
    pub fn classify(self) -> Vec<PayloadKind> {
        let mut kinds = Vec::new();
        if let Some(choice) = self.choices.and_then(|c| c.into_iter().next()) {
            if let Some(delta) = choice.delta {
                if let Some(content) = delta.content {
                    kinds.push(PayloadKind::DeltaText(content));
                }
                if let Some(images) = delta.images.filter(|i| !i.is_empty()) {
                    kinds.push(PayloadKind::DeltaImages(images));
                }
            }
            if let Some(MessageContent::Parts(parts)) = choice.message.and_then(|m| m.content) {
                kinds.push(PayloadKind::FinalMessage(parts));
            }
        }
        if let Some(assets) = self.data.filter(|d| !d.is_empty()) {
            kinds.push(PayloadKind::GenerationResults(assets));
        }
        kinds
    }

    /// Human-readable message of an in-band error object, if any.
    pub fn error_message(&self) -> Option<String> {
        let error = self.error.as_ref()?;
        error
            .get("message")
            .and_then(|v| v.as_str())
            .map(ToOwned::to_owned)
            .or_else(|| Some(error.to_string()))
    }
}
