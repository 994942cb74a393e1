/// One delimited record extracted from the response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub text: String,
}

impl Frame {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Re-segments arbitrarily sized reads into `\n`-delimited frames.
///
/// Bytes are buffered until a delimiter is seen. `\n` never appears inside a
/// multi-byte UTF-8 sequence, so a character split across two reads is
/// reassembled before its record is decoded.
#[derive(Debug, Default)]
pub struct ByteFramer {
    buf: Vec<u8>,
    bytes_seen: u64,
    frames_yielded: u64,
}

impl ByteFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one read and returns every record completed by it, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Frame> {
        self.bytes_seen = self.bytes_seen.saturating_add(chunk.len() as u64);
        if chunk.is_empty() {
            return Vec::new();
        }
        // Only the new bytes can contain a delimiter not yet consumed.
        let search_from = self.buf.len();
        self.buf.extend_from_slice(chunk);
        if !self.buf[search_from..].contains(&b'\n') {
            return Vec::new();
        }

        let mut frames = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buf[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            if let Some(frame) = self.make_frame(start, end) {
                frames.push(frame);
            }
            start = end + 1;
        }
        self.buf.drain(..start);
        frames
    }

    /// Flushes the undelimited remainder once the source reports end of stream.
    pub fn finish(&mut self) -> Option<Frame> {
        let end = self.buf.len();
        let frame = self.make_frame(0, end);
        self.buf.clear();
        frame
    }

    /// Number of buffered bytes still waiting for a delimiter.
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }

    pub fn bytes_seen(&self) -> u64 {
        self.bytes_seen
    }

    pub fn frames_yielded(&self) -> u64 {
        self.frames_yielded
    }

    fn make_frame(&mut self, start: usize, end: usize) -> Option<Frame> {
        let text = String::from_utf8_lossy(&self.buf[start..end]);
        let text = text.trim_end_matches('\r');
        if text.trim().is_empty() {
            return None;
        }
        self.frames_yielded = self.frames_yielded.saturating_add(1);
        Some(Frame::new(text))
    }
}
