//! ResourceProvider trait for abstracting resource loading.
//!
//! This trait lets the filter load stylesheets, pre-compiled sources and
//! included documents without being tied to direct filesystem access.

use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;

/// Error type for resource loading operations.
#[derive(Error, Debug, Clone)]
pub enum ResourceError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Failed to load resource '{path}': {message}")]
    LoadFailed { path: String, message: String },

    #[error("Access denied for resource '{0}'")]
    AccessDenied(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ResourceError {
    fn from(err: std::io::Error) -> Self {
        ResourceError::Io(err.to_string())
    }
}

/// Shared resource data type (reference-counted bytes).
pub type SharedResourceData = Arc<Vec<u8>>;

/// A trait for loading resources from various sources.
///
/// This abstraction allows the filter to read stylesheet sources and
/// included documents from:
/// - Local filesystem
/// - In-memory storage (tests, embedded configurations)
/// - A host server's own virtual filesystem
///
/// Providers must be shareable across concurrently running requests.
pub trait ResourceProvider: Send + Sync + Debug {
    /// Load a resource by its path/URI.
    ///
    /// Returns the resource data as a shared byte vector, or an error if it
    /// cannot be read.
    fn load(&self, path: &str) -> Result<SharedResourceData, ResourceError>;

    /// Check if a resource exists.
    fn exists(&self, path: &str) -> bool;

    /// Returns a human-readable name for this provider (for logging).
    fn name(&self) -> &'static str;
}

/// An in-memory resource provider.
///
/// Resources are stored in memory and must be pre-populated before use.
/// This is the simplest provider and is what the test suites run against.
#[derive(Debug, Default)]
pub struct InMemoryResourceProvider {
    resources: std::sync::RwLock<std::collections::HashMap<String, SharedResourceData>>,
}

impl InMemoryResourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource to the in-memory store.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::LoadFailed` if the internal lock is poisoned.
    pub fn add(&self, path: impl Into<String>, data: Vec<u8>) -> Result<(), ResourceError> {
        let path_string = path.into();
        let mut resources = self
            .resources
            .write()
            .map_err(|_| ResourceError::LoadFailed {
                path: path_string.clone(),
                message: "resource store lock poisoned".to_string(),
            })?;
        resources.insert(path_string, Arc::new(data));
        Ok(())
    }

    /// Get the number of resources in the store.
    ///
    /// Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.resources.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Check if the store is empty.
    ///
    /// Returns `true` if the lock is poisoned (safe default).
    pub fn is_empty(&self) -> bool {
        self.resources.read().map(|r| r.is_empty()).unwrap_or(true)
    }
}

impl ResourceProvider for InMemoryResourceProvider {
    fn load(&self, path: &str) -> Result<SharedResourceData, ResourceError> {
        let resources = self
            .resources
            .read()
            .map_err(|_| ResourceError::LoadFailed {
                path: path.to_string(),
                message: "resource store lock poisoned".to_string(),
            })?;
        resources
            .get(path)
            .cloned()
            .ok_or_else(|| ResourceError::NotFound(path.to_string()))
    }

    fn exists(&self, path: &str) -> bool {
        self.resources
            .read()
            .map(|r| r.contains_key(path))
            .unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "InMemoryResourceProvider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_provider_add_and_load() {
        let provider = InMemoryResourceProvider::new();
        provider
            .add("style.xsl", b"<xsl:stylesheet/>".to_vec())
            .unwrap();

        let data = provider.load("style.xsl").unwrap();
        assert_eq!(&*data, b"<xsl:stylesheet/>");
    }

    #[test]
    fn test_in_memory_provider_not_found() {
        let provider = InMemoryResourceProvider::new();
        let result = provider.load("nonexistent.xsl");
        assert!(matches!(result, Err(ResourceError::NotFound(_))));
    }

    #[test]
    fn test_in_memory_provider_exists() {
        let provider = InMemoryResourceProvider::new();
        provider.add("exists.xml", vec![]).unwrap();

        assert!(provider.exists("exists.xml"));
        assert!(!provider.exists("not_exists.xml"));
    }

    #[test]
    fn test_in_memory_provider_overwrite() {
        let provider = InMemoryResourceProvider::new();
        provider.add("doc.xml", b"original".to_vec()).unwrap();
        provider.add("doc.xml", b"updated".to_vec()).unwrap();

        let data = provider.load("doc.xml").unwrap();
        assert_eq!(&*data, b"updated");
        assert_eq!(provider.len(), 1);
    }

    #[test]
    fn test_resource_error_display() {
        let err = ResourceError::NotFound("style.xsl".to_string());
        assert!(err.to_string().contains("style.xsl"));

        let err = ResourceError::LoadFailed {
            path: "doc.xml".to_string(),
            message: "permission denied".to_string(),
        };
        assert!(err.to_string().contains("doc.xml"));
        assert!(err.to_string().contains("permission denied"));
    }

    #[test]
    fn test_resource_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let resource_err: ResourceError = io_err.into();
        assert!(matches!(resource_err, ResourceError::Io(_)));
    }
}
