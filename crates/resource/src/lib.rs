//! Resource loading for the xflow filter.
//!
//! This crate provides:
//!
//! - [`DocRootResourceProvider`]: serves resources from a document root on
//!   the local filesystem
//! - [`resolve_reference`]: relative-URI resolution against a request's
//!   source location
//! - [`RequestLoader`]: the per-request loader threaded explicitly through
//!   include expansion and stylesheet resolution (there is no process-global
//!   loader hook)
//!
//! For convenience, the in-memory provider from xflow-traits is re-exported:
//! - [`InMemoryResourceProvider`]: pre-populated in-memory storage

mod filesystem;
mod loader;
mod uri;

pub use filesystem::DocRootResourceProvider;
pub use loader::RequestLoader;
pub use uri::{UriRef, resolve_reference};

// Re-export the in-memory provider from xflow-traits for convenience
pub use xflow_traits::InMemoryResourceProvider;
