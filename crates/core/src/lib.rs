//! Filter core for xflow.
//!
//! Ties the document, stylesheet and resource crates into the response
//! filter itself: directory-scoped option inheritance, the process-wide
//! stylesheet cache, per-request notes, stylesheet resolution, and the
//! transform executor that streams serialized output downstream.
//!
//! ## Request flow
//!
//! ```ignore
//! let filter = TransformFilter::new(options, cache);
//! let mut request = filter.new_request("/site/pages/index.xml", (1, 1), false);
//! let status = filter.process(
//!     &mut request,
//!     [BodyChunk::Data(b"<doc/>"), BodyChunk::End],
//!     &mut sink,
//!     &mut meta,
//! );
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod filter;
pub mod options;
pub mod request;
mod resolve;
mod transform;

pub use cache::StylesheetCache;
pub use config::parse_options;
pub use error::{FilterError, FilterStatus};
pub use filter::{BodyChunk, TransformFilter};
pub use options::{Decl, OptionFlags, ScopeOptions};
pub use request::Request;
