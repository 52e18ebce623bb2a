use tokio::sync::mpsc;

use crate::stream::StreamEvent;

/// Receives decoded content synchronously, as soon as it is recognized.
pub trait StreamSink {
    /// Called once per text increment with exactly that increment.
    fn on_text(&mut self, text: &str);

    /// Called once per newly appended, non-duplicate image resource.
    fn on_image(&mut self, image: &str) {
        let _ = image;
    }
}

impl<T: StreamSink + ?Sized> StreamSink for &mut T {
    fn on_text(&mut self, text: &str) {
        (**self).on_text(text);
    }

    fn on_image(&mut self, image: &str) {
        (**self).on_image(image);
    }
}

/// Discards everything; useful when only the aggregated result matters.
impl StreamSink for () {
    fn on_text(&mut self, _text: &str) {}
}

type Callback<'a> = Box<dyn FnMut(&str) + Send + 'a>;

/// Closure-backed sink with a required text callback and an optional image
/// callback.
pub struct Callbacks<'a> {
    on_text: Callback<'a>,
    on_image: Option<Callback<'a>>,
}

impl<'a> Callbacks<'a> {
    pub fn new(on_text: impl FnMut(&str) + Send + 'a) -> Self {
        Self {
            on_text: Box::new(on_text),
            on_image: None,
        }
    }

    /// Sets the image callback.
    pub fn with_image(mut self, on_image: impl FnMut(&str) + Send + 'a) -> Self {
        self.on_image = Some(Box::new(on_image));
        self
    }
}

impl StreamSink for Callbacks<'_> {
    fn on_text(&mut self, text: &str) {
        (self.on_text)(text);
    }

    fn on_image(&mut self, image: &str) {
        if let Some(on_image) = self.on_image.as_mut() {
            on_image(image);
        }
    }
}

/// Forwards decoded content as `StreamEvent`s to another task.
///
/// Events are dropped silently once the receiver is gone; the decode itself
/// keeps running so the aggregated result is still returned.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<StreamEvent>,
    seq: u64,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<StreamEvent>) -> Self {
        Self { tx, seq: 0 }
    }

    /// Creates a sink together with the receiver of its events.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StreamEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    fn send(&mut self, event: StreamEvent) {
        let _ = self.tx.send(event);
        self.seq = self.seq.saturating_add(1);
    }

    /// Sends the closing `Completed`/`Error` event.
    pub(crate) fn send_terminal(&mut self, event: StreamEvent) {
        debug_assert!(event.is_terminal());
        let _ = self.tx.send(event);
    }
}

impl StreamSink for ChannelSink {
    fn on_text(&mut self, text: &str) {
        let seq = self.seq;
        self.send(StreamEvent::TextDelta {
            seq,
            text: text.to_owned(),
        });
    }

    fn on_image(&mut self, image: &str) {
        let seq = self.seq;
        self.send(StreamEvent::Image {
            seq,
            image: image.to_owned(),
        });
    }
}
