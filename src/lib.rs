//! xflow: a streaming XML response filter.
//!
//! An XML response body is accumulated chunk by chunk, parsed once complete,
//! transformed through a resolved XSLT program, and streamed back out with
//! the right content type and length framing. Stylesheets come from a
//! process-wide cache of precompiled programs or from the document's own
//! `xml-stylesheet` directive.
//!
//! The crates compose as:
//!
//! - `xflow-traits`: resource-provider and transport abstractions
//! - `xflow-xml`: owned document model, chunk accumulator, serializer,
//!   XInclude expansion
//! - `xflow-resource`: relative-URI resolution and per-request loading
//! - `xflow-xslt`: stylesheet compiler and template executor
//! - `xflow-core`: scope options, the cache, and the filter itself

pub use xflow_core::{
    BodyChunk, Decl, FilterError, FilterStatus, OptionFlags, Request, ScopeOptions,
    StylesheetCache, TransformFilter, parse_options,
};
pub use xflow_resource::{DocRootResourceProvider, InMemoryResourceProvider, RequestLoader};
pub use xflow_traits::{
    BufferSink, ChunkSink, RecordedResponse, ResourceError, ResourceProvider, ResponseMeta,
};
pub use xflow_xml::{OutputMethod, ParseAccumulator, XmlDocument, XmlError};
pub use xflow_xslt::{CompiledStylesheet, XsltError, compile, compile_bytes};
