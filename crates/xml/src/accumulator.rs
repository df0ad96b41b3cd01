//! Incremental parse accumulator.
//!
//! One accumulator exists per request. Chunks are fed strictly in arrival
//! order by the single worker owning the request; `finalize` consumes the
//! accumulator, so a second finalize or a feed-after-finalize is a compile
//! error rather than a runtime contract violation.

use crate::document::XmlDocument;
use crate::error::XmlError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccumulatorState {
    #[default]
    Empty,
    Accumulating,
}

/// Accumulates the ordered byte chunks of one request body and produces a
/// parsed [`XmlDocument`] exactly once.
#[derive(Debug, Default)]
pub struct ParseAccumulator {
    buf: Vec<u8>,
    state: AccumulatorState,
}

impl ParseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AccumulatorState {
        self.state
    }

    /// Appends one chunk in arrival order.
    pub fn feed(&mut self, chunk: &[u8]) {
        self.state = AccumulatorState::Accumulating;
        self.buf.extend_from_slice(chunk);
    }

    /// Signals end-of-stream and yields the assembled document.
    ///
    /// An accumulator that never received a chunk (zero-byte body) yields
    /// [`XmlError::NoDocument`], never an empty-tree success.
    pub fn finalize(self) -> Result<XmlDocument, XmlError> {
        if self.state == AccumulatorState::Empty {
            return Err(XmlError::NoDocument);
        }
        XmlDocument::parse(&self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_boundary_independence() {
        let mut split = ParseAccumulator::new();
        split.feed(b"<a>");
        split.feed(b"</a>");
        let split_doc = split.finalize().unwrap();

        let mut whole = ParseAccumulator::new();
        whole.feed(b"<a></a>");
        let whole_doc = whole.finalize().unwrap();

        assert_eq!(split_doc, whole_doc);
    }

    #[test]
    fn test_chunk_split_inside_tag() {
        let mut acc = ParseAccumulator::new();
        acc.feed(b"<root att");
        acc.feed(b"r=\"v\"><chi");
        acc.feed(b"ld/></root>");
        let doc = acc.finalize().unwrap();
        assert_eq!(doc.root.attribute("attr"), Some("v"));
        assert_eq!(doc.root.child_elements().count(), 1);
    }

    #[test]
    fn test_state_tracks_first_chunk() {
        let mut acc = ParseAccumulator::new();
        assert_eq!(acc.state(), AccumulatorState::Empty);
        acc.feed(b"<a/>");
        assert_eq!(acc.state(), AccumulatorState::Accumulating);
    }

    #[test]
    fn test_finalize_without_chunks_is_parse_error() {
        let acc = ParseAccumulator::new();
        assert!(matches!(acc.finalize(), Err(XmlError::NoDocument)));
    }

    #[test]
    fn test_empty_chunk_still_leaves_empty_body_malformed() {
        let mut acc = ParseAccumulator::new();
        acc.feed(b"");
        // A fed-but-empty body is no longer `Empty`, but it still cannot
        // parse into a document.
        assert!(acc.finalize().is_err());
    }

    #[test]
    fn test_malformed_body_is_parse_error() {
        let mut acc = ParseAccumulator::new();
        acc.feed(b"<a><b></a>");
        assert!(acc.finalize().is_err());
    }
}
