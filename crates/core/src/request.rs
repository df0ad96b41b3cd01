//! Per-request state.
//!
//! Each in-flight response carries a [`Request`]: the request path the
//! resolver uses as its base, the protocol facts the framing decision
//! needs, and the note slots an earlier pipeline stage may have filled
//! in before the body reached the filter.

use xflow_xml::{ParseAccumulator, XmlDocument};

/// Handoff slots written by upstream stages and consumed by the filter.
///
/// `stylesheet` names a cache entry to use instead of document
/// autodiscovery. `document` is a pre-parsed tree that bypasses body
/// parsing entirely; any accumulated body bytes are discarded when it
/// is set.
#[derive(Debug, Default)]
pub struct RequestNotes {
    pub stylesheet: Option<String>,
    pub document: Option<XmlDocument>,
}

#[derive(Debug)]
pub struct Request {
    /// Absolute request-space path of the resource being served.
    pub path: String,
    /// Protocol version as (major, minor), e.g. (1, 1) for HTTP/1.1.
    pub protocol: (u32, u32),
    pub is_subrequest: bool,
    pub notes: RequestNotes,
    pub(crate) accumulator: Option<ParseAccumulator>,
}

impl Request {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            protocol: (1, 1),
            is_subrequest: false,
            notes: RequestNotes::default(),
            accumulator: None,
        }
    }

    pub fn with_protocol(mut self, major: u32, minor: u32) -> Self {
        self.protocol = (major, minor);
        self
    }

    pub fn as_subrequest(mut self) -> Self {
        self.is_subrequest = true;
        self
    }

    /// Selects a cached stylesheet by id for this request, overriding both
    /// document autodiscovery and any scope-configured default.
    pub fn set_stylesheet(&mut self, id: impl Into<String>) {
        self.notes.stylesheet = Some(id.into());
    }

    /// Hands the filter an already-parsed document. Body bytes received on
    /// this request are ignored from this point on.
    pub fn set_document(&mut self, doc: XmlDocument) {
        self.notes.document = Some(doc);
    }
}
