use std::collections::hash_map::RandomState;
use std::collections::{BTreeMap, HashSet};
use std::hash::BuildHasher as _;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{debug, warn};

use super::payload::{ContentPart, GeneratedAsset, ImageDescriptor, ImageSource};

/// Media type assumed for embedded payloads that do not declare one.
pub const DEFAULT_MEDIA_TYPE: &str = "image/png";

/// Wraps a base64 payload into an embedded-data string.
pub fn embedded_data(media_type: &str, base64_payload: &str) -> String {
    format!("data:{media_type};base64,{base64_payload}")
}

/// Splits `data:<media-type>;base64,<payload>` into its media type and payload.
///
/// Returns `None` for anything that is not a base64 data string.
pub fn split_embedded_data(value: &str) -> Option<(&str, &str)> {
    let (meta, payload) = value.strip_prefix("data:")?.split_once(',')?;
    let media_type = meta.strip_suffix(";base64")?;
    Some((media_type, payload))
}

fn is_remote_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

#[derive(Debug, Default)]
struct Fragment {
    media_type: Option<String>,
    data: String,
}

/// Collects image resources from every encoding a provider may use.
///
/// Complete references are appended as they arrive. Index-keyed base64
/// fragments stay buffered until [`ImageAggregator::finalize_fragments`],
/// because no single event tells whether a fragment is the last one.
#[derive(Debug, Default)]
pub struct ImageAggregator {
    images: Vec<String>,
    /// Hashes of `images`; embedded payloads can be megabytes long.
    seen: HashSet<u64>,
    hasher: RandomState,
    fragments: BTreeMap<u64, Fragment>,
}

impl ImageAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a finished resource unless an identical string is already
    /// present. Returns the resource when it was newly appended.
    pub fn push_complete(&mut self, image: String) -> Option<&str> {
        if image.is_empty() {
            return None;
        }
        let hash = self.hasher.hash_one(&image);
        if !self.seen.insert(hash) && self.images.contains(&image) {
            return None;
        }
        self.images.push(image);
        self.images.last().map(String::as_str)
    }

    /// Appends base64 text to the buffer entry for `index`.
    pub fn push_fragment(&mut self, index: u64, chunk: &str, media_type: Option<&str>) {
        let fragment = self.fragments.entry(index).or_default();
        if fragment.media_type.is_none() {
            fragment.media_type = media_type.map(ToOwned::to_owned);
        }
        fragment.data.push_str(chunk);
    }

    /// Handles one `delta.images` entry.
    ///
    /// `b64_json` is always a fragment, buffered under index `0` when the
    /// descriptor has none. A URL is a fragment only when the descriptor
    /// carries an explicit `index` and the URL is not a remote address; a
    /// `data:` string then contributes its payload portion. Fragments are
    /// reported at finalization, not here, so an indexed `data:` URL is
    /// deferred to the end of the stream even when it is already complete.
    /// Repeating the exact `data:` URL already buffered for an index is
    /// ignored.
    pub fn push_descriptor(&mut self, descriptor: ImageDescriptor) -> Option<&str> {
        if let Some(chunk) = descriptor.b64_json.filter(|c| !c.is_empty()) {
            self.push_fragment(descriptor.index.unwrap_or(0), &chunk, None);
            return None;
        }

        let url = descriptor
            .image_url
            .and_then(|image_url| image_url.url)
            .or(descriptor.url)
            .filter(|url| !url.is_empty());
        let Some(url) = url else {
            debug!(kind = ?descriptor.kind, "image descriptor without url or data");
            return None;
        };

        match descriptor.index {
            Some(index) if !is_remote_url(&url) => {
                match split_embedded_data(&url) {
                    Some((media_type, payload))
                        if self.repeats_fragment(index, media_type, payload) =>
                    {
                        debug!(index, "ignoring repeated image data url");
                    }
                    Some((media_type, payload)) => {
                        self.push_fragment(index, payload, Some(media_type))
                    }
                    None => self.push_fragment(index, &url, None),
                }
                None
            }
            _ => self.push_complete(url),
        }
    }

    fn repeats_fragment(&self, index: u64, media_type: &str, payload: &str) -> bool {
        self.fragments.get(&index).is_some_and(|fragment| {
            fragment.media_type.as_deref() == Some(media_type) && fragment.data == payload
        })
    }

    /// Handles an `image_url` or `image` content part; other parts are ignored.
    pub fn push_part(&mut self, part: ContentPart) -> Option<&str> {
        let image = match part {
            ContentPart::ImageUrl { image_url } => image_url.and_then(|u| u.url)?,
            ContentPart::Image { source } => source_to_resource(source?)?,
            ContentPart::Text { .. } | ContentPart::Unsupported => return None,
        };
        self.push_complete(image)
    }

    /// Handles one entry of a completed-asset list.
    pub fn push_asset(&mut self, asset: GeneratedAsset) -> Option<&str> {
        let image = match (asset.url.filter(|u| !u.is_empty()), asset.b64_json) {
            (Some(url), _) => url,
            (None, Some(b64)) if !b64.is_empty() => embedded_data(DEFAULT_MEDIA_TYPE, &b64),
            _ => return None,
        };
        self.push_complete(image)
    }

    /// Number of indices with buffered fragments.
    pub fn pending_fragments(&self) -> usize {
        self.fragments.len()
    }

    /// Wraps every buffered fragment into an embedded-data string, in index
    /// order, and returns the ones that were newly appended.
    ///
    /// Payloads that do not decode as base64 are still emitted.
    pub fn finalize_fragments(&mut self) -> Vec<String> {
        let fragments = std::mem::take(&mut self.fragments);
        let mut appended = Vec::new();
        for (index, fragment) in fragments {
            if fragment.data.is_empty() {
                continue;
            }
            if let Err(err) = BASE64.decode(fragment.data.as_bytes()) {
                warn!(index, error = %err, "image fragment does not decode as base64");
            }
            let media_type = fragment.media_type.as_deref().unwrap_or(DEFAULT_MEDIA_TYPE);
            let image = embedded_data(media_type, &fragment.data);
            if let Some(image) = self.push_complete(image) {
                appended.push(image.to_owned());
            }
        }
        appended
    }

    /// Images appended so far, in order of first appearance.
    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn into_images(self) -> Vec<String> {
        self.images
    }
}

fn source_to_resource(source: ImageSource) -> Option<String> {
    let data = source.data.filter(|d| !d.is_empty())?;
    if data.starts_with("data:") {
        return Some(data);
    }
    let media_type = source.media_type.as_deref().unwrap_or(DEFAULT_MEDIA_TYPE);
    Some(embedded_data(media_type, &data))
}
