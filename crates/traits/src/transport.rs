//! Host-pipeline transport traits.
//!
//! The filter core only ever sees the host's byte-stream transport through
//! [`ChunkSink`] and its response-metadata surface through [`ResponseMeta`].
//! [`BufferSink`] and [`RecordedResponse`] are the in-memory implementations
//! the test suites run against.

/// Downstream end of the host's byte-stream transport.
///
/// Output chunks are handed over in production order; `end` signals
/// end-of-stream exactly once per response.
pub trait ChunkSink {
    /// Hand one chunk of output bytes downstream.
    fn write_chunk(&mut self, data: &[u8]);

    /// Propagate end-of-stream downstream.
    fn end(&mut self);
}

/// The host's response-metadata surface.
///
/// All of these must be callable before the final output chunk is
/// acknowledged, so that the host can finalize headers.
pub trait ResponseMeta {
    /// Set the outgoing content-type string.
    fn set_content_type(&mut self, content_type: &str);

    /// Set a precise content length for fixed-length framing.
    fn set_content_length(&mut self, length: u64);

    /// Remove any content length inherited from the unfiltered response.
    fn unset_content_length(&mut self);

    /// Select chunked-transfer framing for this response.
    fn set_chunked(&mut self, chunked: bool);
}

/// A [`ChunkSink`] that collects all output into a buffer.
#[derive(Debug, Default)]
pub struct BufferSink {
    pub data: Vec<u8>,
    pub chunks: usize,
    pub ended: bool,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChunkSink for BufferSink {
    fn write_chunk(&mut self, data: &[u8]) {
        self.data.extend_from_slice(data);
        self.chunks += 1;
    }

    fn end(&mut self) {
        self.ended = true;
    }
}

/// A [`ResponseMeta`] that records what the filter sets.
#[derive(Debug, Default)]
pub struct RecordedResponse {
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub chunked: bool,
}

impl RecordedResponse {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResponseMeta for RecordedResponse {
    fn set_content_type(&mut self, content_type: &str) {
        self.content_type = Some(content_type.to_string());
    }

    fn set_content_length(&mut self, length: u64) {
        self.content_length = Some(length);
    }

    fn unset_content_length(&mut self) {
        self.content_length = None;
    }

    fn set_chunked(&mut self, chunked: bool) {
        self.chunked = chunked;
    }
}
