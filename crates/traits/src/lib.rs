//! Seam traits shared across the xflow filter crates.
//!
//! This crate defines the contracts between the filter core and its host
//! environment:
//!
//! - [`ResourceProvider`]: pluggable loading of stylesheets, documents and
//!   included resources
//! - [`ChunkSink`]: the downstream end of the host's byte-stream transport
//! - [`ResponseMeta`]: the host's response-metadata surface (content type,
//!   content length, framing)
//!
//! The filter core never touches the host server or the filesystem directly;
//! everything flows through these traits.

mod resource;
mod transport;

pub use resource::{InMemoryResourceProvider, ResourceError, ResourceProvider, SharedResourceData};
pub use transport::{BufferSink, ChunkSink, RecordedResponse, ResponseMeta};
