//! Owned XML document model for the xflow filter.
//!
//! This crate provides:
//!
//! - [`XmlDocument`] / [`XmlElement`] / [`XmlNode`]: an owned tree built from
//!   quick-xml events, which outlives the byte buffers it was parsed from
//! - [`ParseAccumulator`]: the incremental chunk-by-chunk parse state machine
//! - [`serialize_nodes`]: streaming serialization with xml/html/text output
//!   methods
//! - [`expand_includes`]: in-place XInclude expansion via a pluggable
//!   [`DocumentLoader`]

pub mod accumulator;
pub mod document;
pub mod error;
pub mod include;
pub mod serialize;

pub use accumulator::ParseAccumulator;
pub use document::{Pi, XmlDocument, XmlElement, XmlNode};
pub use error::XmlError;
pub use include::{DocumentLoader, expand_includes};
pub use serialize::{OutputMethod, serialize_nodes};
