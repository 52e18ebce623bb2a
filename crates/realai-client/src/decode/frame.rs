/// Prefix shared by every forwarded event record.
pub(crate) const DATA_PREFIX: &str = "data: ";

/// Splits a raw byte stream into complete `data: ` event records.
///
/// Bytes are decoded as UTF-8 in streaming mode: a multi-byte sequence cut by
/// a chunk boundary is held back until its remaining bytes arrive. Invalid
/// sequences are replaced with U+FFFD instead of failing the stream.
#[derive(Debug, Default)]
pub struct FrameReader {
    /// Undecoded bytes of an incomplete trailing UTF-8 sequence.
    pending: Vec<u8>,
    /// Decoded text after the last newline seen so far.
    carry: String,
}

impl FrameReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns the event records it completed.
    ///
    /// Lines not starting with `data: ` are dropped. A trailing `\r` is
    /// stripped so CRLF streams yield the same records as LF streams.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        // The carry holds no newline before this push.
        let scan_from = self.carry.len();
        self.decode_into_carry(chunk);

        let Some(last_newline) = self.carry[scan_from..].rfind('\n') else {
            return Vec::new();
        };
        let tail = self.carry.split_off(scan_from + last_newline + 1);
        let complete = std::mem::replace(&mut self.carry, tail);

        complete
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .filter(|line| line.starts_with(DATA_PREFIX))
            .map(ToOwned::to_owned)
            .collect()
    }

    /// Number of carried bytes not yet terminated by a newline.
    pub fn carried_len(&self) -> usize {
        self.carry.len() + self.pending.len()
    }

    /// Ends the stream and returns how many carried bytes were discarded.
    ///
    /// An unterminated trailing record is never emitted.
    pub fn finish(self) -> usize {
        self.carried_len()
    }

    fn decode_into_carry(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);
        let mut consumed = 0;
        while consumed < self.pending.len() {
            match std::str::from_utf8(&self.pending[consumed..]) {
                Ok(text) => {
                    self.carry.push_str(text);
                    consumed = self.pending.len();
                }
                Err(err) => {
                    let valid_end = consumed + err.valid_up_to();
                    self.carry
                        .push_str(&String::from_utf8_lossy(&self.pending[consumed..valid_end]));
                    match err.error_len() {
                        Some(invalid_len) => {
                            self.carry.push(char::REPLACEMENT_CHARACTER);
                            consumed = valid_end + invalid_len;
                        }
                        None => {
                            consumed = valid_end;
                            break;
                        }
                    }
                }
            }
        }
        self.pending.drain(..consumed);
    }
}
