use std::time::Instant;

use tracing::{debug, info, warn};

use crate::content::StreamOutput;

use super::frame::FrameReader;
use super::images::ImageAggregator;
use super::payload::{ContentPart, EventRecord, MessageContent, PayloadKind};
use super::sink::StreamSink;

/// All mutable state of one decode call.
///
/// Construct one per response; nothing is shared between sessions.
#[derive(Debug)]
pub struct DecodeSession {
    id: uuid::Uuid,
    frames: FrameReader,
    images: ImageAggregator,
    text: String,
    stats: SessionStats,
    started: Instant,
}

/// Counters reported when a session finishes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub bytes_received: usize,
    pub records: usize,
    pub malformed_records: usize,
    pub text_increments: usize,
    pub saw_done: bool,
}

impl DecodeSession {
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            frames: FrameReader::new(),
            images: ImageAggregator::new(),
            text: String::new(),
            stats: SessionStats::default(),
            started: Instant::now(),
        }
    }

    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Text aggregated so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Feeds one raw chunk and dispatches every record it completes.
    pub fn push_chunk<S: StreamSink + ?Sized>(&mut self, chunk: &[u8], sink: &mut S) {
        self.stats.bytes_received += chunk.len();
        for record in self.frames.push(chunk) {
            self.push_record(&record, sink);
        }
    }

    /// Dispatches one complete `data: ` record.
    pub fn push_record<S: StreamSink + ?Sized>(&mut self, record: &str, sink: &mut S) {
        self.stats.records += 1;
        match EventRecord::parse(record) {
            EventRecord::Done => {
                self.stats.saw_done = true;
                debug!(session = %self.id, records = self.stats.records, "stream [DONE] marker received");
            }
            EventRecord::Malformed(reason) => {
                self.stats.malformed_records += 1;
                debug!(session = %self.id, %reason, "discarding malformed event record");
            }
            EventRecord::Payload(payload) => {
                if let Some(message) = payload.error_message() {
                    warn!(session = %self.id, %message, "provider reported an in-band error");
                }
                for kind in payload.classify() {
                    self.route(kind, sink);
                }
            }
        }
    }

    fn route<S: StreamSink + ?Sized>(&mut self, kind: PayloadKind, sink: &mut S) {
        match kind {
            PayloadKind::DeltaText(MessageContent::Text(text)) => self.emit_text(&text, sink),
            PayloadKind::DeltaText(MessageContent::Parts(parts)) => {
                for part in parts {
                    match part {
                        ContentPart::Text { text } => {
                            self.emit_text(text.as_deref().unwrap_or_default(), sink);
                        }
                        other => {
                            if let Some(image) = self.images.push_part(other) {
                                sink.on_image(image);
                            }
                        }
                    }
                }
            }
            PayloadKind::DeltaImages(descriptors) => {
                for descriptor in descriptors {
                    if let Some(image) = self.images.push_descriptor(descriptor) {
                        sink.on_image(image);
                    }
                }
            }
            PayloadKind::FinalMessage(parts) => {
                for part in parts {
                    if let Some(image) = self.images.push_part(part) {
                        sink.on_image(image);
                    }
                }
            }
            PayloadKind::GenerationResults(assets) => {
                for asset in assets {
                    if let Some(image) = self.images.push_asset(asset) {
                        sink.on_image(image);
                    }
                }
            }
        }
    }

    fn emit_text<S: StreamSink + ?Sized>(&mut self, text: &str, sink: &mut S) {
        if text.is_empty() {
            return;
        }
        self.stats.text_increments += 1;
        sink.on_text(text);
        self.text.push_str(text);
    }

    /// Ends the stream: drops any unterminated record, finalizes buffered
    /// image fragments, and returns the aggregated result.
    pub fn finish<S: StreamSink + ?Sized>(mut self, sink: &mut S) -> StreamOutput {
        let discarded = self.frames.finish();
        if discarded > 0 {
            debug!(session = %self.id, discarded, "dropping unterminated trailing record");
        }
        for image in self.images.finalize_fragments() {
            sink.on_image(&image);
        }
        let output = StreamOutput {
            text: self.text,
            images: self.images.into_images(),
        };
        info!(
            session = %self.id,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            bytes = self.stats.bytes_received,
            records = self.stats.records,
            malformed = self.stats.malformed_records,
            text_increments = self.stats.text_increments,
            images = output.images.len(),
            saw_done = self.stats.saw_done,
            "stream decode finished"
        );
        output
    }
}

impl Default for DecodeSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        texts: Vec<String>,
        images: Vec<String>,
    }

    impl StreamSink for Recorder {
        fn on_text(&mut self, text: &str) {
            self.texts.push(text.to_owned());
        }

        fn on_image(&mut self, image: &str) {
            self.images.push(image.to_owned());
        }
    }

    fn decode(chunks: &[&str]) -> (StreamOutput, Recorder, SessionStats) {
        let mut session = DecodeSession::new();
        let mut recorder = Recorder::default();
        for chunk in chunks {
            session.push_chunk(chunk.as_bytes(), &mut recorder);
        }
        let stats = session.stats();
        let output = session.finish(&mut recorder);
        (output, recorder, stats)
    }

    #[test]
    fn hello_scenario_yields_two_increments() {
        let (output, recorder, stats) = decode(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n",
            "data: [DONE]\n",
        ]);
        assert_eq!(output.text, "Hello");
        assert_eq!(recorder.texts, ["Hel", "lo"]);
        assert!(output.images.is_empty());
        assert!(recorder.images.is_empty());
        assert!(stats.saw_done);
        assert_eq!(stats.text_increments, 2);
    }

    #[test]
    fn malformed_record_between_valid_ones_is_skipped() {
        let (output, recorder, stats) = decode(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n",
        ]);
        assert_eq!(output.text, "ab");
        assert_eq!(recorder.texts, ["a", "b"]);
        assert_eq!(stats.malformed_records, 1);
        assert_eq!(stats.records, 3);
    }

    #[test]
    fn empty_and_null_content_fire_no_callback() {
        let (output, recorder, _) = decode(&[
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":null}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":[{\"type\":\"text\",\"text\":\"\"}]}}]}\n",
        ]);
        assert!(output.is_empty());
        assert!(recorder.texts.is_empty());
    }

    #[test]
    fn multipart_delta_routes_text_and_images_in_order() {
        let (output, recorder, _) = decode(&[concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":[",
            "{\"type\":\"text\",\"text\":\"look: \"},",
            "{\"type\":\"image_url\",\"image_url\":{\"url\":\"https://x/cat.png\"}},",
            "{\"type\":\"text\",\"text\":\"done\"}",
            "]}}]}\n"
        )]);
        assert_eq!(output.text, "look: done");
        assert_eq!(recorder.texts, ["look: ", "done"]);
        assert_eq!(output.images, ["https://x/cat.png"]);
        assert_eq!(recorder.images, ["https://x/cat.png"]);
    }

    #[test]
    fn fragmented_image_is_reassembled_after_stream_end() {
        let (output, recorder, _) = decode(&[
            "data: {\"choices\":[{\"delta\":{\"images\":[{\"index\":0,\"b64_json\":\"iVBOR\"}]}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"images\":[{\"index\":0,\"b64_json\":\"w0KGgo\"}]}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"images\":[{\"index\":0,\"b64_json\":\"=\"}]}}]}\n",
            "data: [DONE]\n",
        ]);
        assert_eq!(output.images, ["data:image/png;base64,iVBORw0KGgo="]);
        assert_eq!(recorder.images, output.images);
    }

    #[test]
    fn final_message_duplicate_fires_image_callback_once() {
        let (output, recorder, _) = decode(&[
            "data: {\"choices\":[{\"delta\":{\"images\":[{\"type\":\"image_url\",\"image_url\":{\"url\":\"https://x/a.png\"}}]}}]}\n",
            "data: {\"choices\":[{\"message\":{\"content\":[{\"type\":\"image_url\",\"image_url\":{\"url\":\"https://x/a.png\"}}]}}]}\n",
            "data: [DONE]\n",
        ]);
        assert_eq!(output.images, ["https://x/a.png"]);
        assert_eq!(recorder.images, ["https://x/a.png"]);
    }

    #[test]
    fn duplicates_across_all_sources_appear_once() {
        let png = "data:image/png;base64,QUJD";
        let (output, recorder, _) = decode(&[
            "data: {\"choices\":[{\"delta\":{\"content\":[{\"type\":\"image\",\"source\":{\"data\":\"QUJD\"}}]}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"images\":[{\"image_url\":{\"url\":\"data:image/png;base64,QUJD\"}}]}}]}\n",
            "data: {\"data\":[{\"b64_json\":\"QUJD\"},{\"url\":\"https://x/z.png\"}]}\n",
            "data: {\"choices\":[{\"message\":{\"content\":[{\"type\":\"image\",\"source\":{\"data\":\"QUJD\",\"media_type\":\"image/png\"}}]}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"images\":[{\"index\":3,\"b64_json\":\"QUJD\"}]}}]}\n",
        ]);
        assert_eq!(output.images, [png, "https://x/z.png"]);
        assert_eq!(recorder.images, output.images);
    }

    #[test]
    fn complete_references_precede_finalized_fragments() {
        let (output, _, _) = decode(&[
            "data: {\"choices\":[{\"delta\":{\"images\":[{\"index\":0,\"b64_json\":\"QQ==\"}]}}]}\n",
            "data: {\"data\":[{\"url\":\"https://x/late.png\"}]}\n",
        ]);
        assert_eq!(
            output.images,
            ["https://x/late.png", "data:image/png;base64,QQ=="]
        );
    }

    #[test]
    fn unterminated_trailing_record_is_not_decoded() {
        let (output, recorder, _) = decode(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"kept\"}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lost\"}}]}",
        ]);
        assert_eq!(output.text, "kept");
        assert_eq!(recorder.texts, ["kept"]);
    }

    #[test]
    fn in_band_error_does_not_stop_decoding() {
        let (output, _, stats) = decode(&[
            "data: {\"error\":{\"message\":\"upstream hiccup\"}}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"still here\"}}]}\n",
        ]);
        assert_eq!(output.text, "still here");
        assert_eq!(stats.malformed_records, 0);
    }
}
