//! Document-root filesystem provider.
//!
//! Serves stylesheets and included documents from a directory tree, with
//! checks that resolved paths stay inside the root.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use xflow_traits::{ResourceError, ResourceProvider, SharedResourceData};

/// A resource provider rooted at a document directory.
///
/// Paths handed to it are absolute request-space paths (the output of
/// relative-URI resolution, e.g. `/site/pages/img.xml`) and are mapped under
/// the root. Attempts to escape the root return `AccessDenied`.
#[derive(Debug)]
pub struct DocRootResourceProvider {
    root: PathBuf,
    /// Canonicalized root for escape checks
    canonical_root: Option<PathBuf>,
}

impl DocRootResourceProvider {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        // May fail if the root does not exist yet
        let canonical = root.canonicalize().ok();
        Self {
            root,
            canonical_root: canonical,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a request-space path under the root, rejecting escapes.
    fn map_path(&self, path: &str) -> Option<PathBuf> {
        let relative = path.trim_start_matches('/');
        let full_path = self.root.join(relative);

        if let Ok(canonical) = full_path.canonicalize()
            && let Some(ref root) = self.canonical_root
        {
            if canonical.starts_with(root) {
                return Some(canonical);
            }
            return None;
        }

        // If canonicalization fails (file doesn't exist), reject any path
        // still carrying parent components.
        for component in Path::new(relative).components() {
            if let std::path::Component::ParentDir = component {
                return None;
            }
        }

        Some(full_path)
    }
}

impl ResourceProvider for DocRootResourceProvider {
    fn load(&self, path: &str) -> Result<SharedResourceData, ResourceError> {
        let full_path = self
            .map_path(path)
            .ok_or_else(|| ResourceError::AccessDenied(path.to_string()))?;

        std::fs::read(&full_path).map(Arc::new).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ResourceError::NotFound(path.to_string())
            } else {
                ResourceError::LoadFailed {
                    path: path.to_string(),
                    message: e.to_string(),
                }
            }
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.map_path(path).map(|p| p.exists()).unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "DocRootResourceProvider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_docroot_provider_load_existing_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("style.xsl"), b"<xsl/>").unwrap();

        let provider = DocRootResourceProvider::new(dir.path());
        let data = provider.load("/style.xsl").unwrap();
        assert_eq!(&*data, b"<xsl/>");
    }

    #[test]
    fn test_docroot_provider_relative_and_absolute_equivalent() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("doc.xml"), b"<a/>").unwrap();

        let provider = DocRootResourceProvider::new(dir.path());
        assert!(provider.exists("/doc.xml"));
        assert!(provider.exists("doc.xml"));
    }

    #[test]
    fn test_docroot_provider_not_found() {
        let dir = tempdir().unwrap();
        let provider = DocRootResourceProvider::new(dir.path());

        let result = provider.load("/nonexistent.xsl");
        assert!(matches!(result, Err(ResourceError::NotFound(_))));
    }

    #[test]
    fn test_docroot_provider_blocks_escape() {
        let dir = tempdir().unwrap();
        let provider = DocRootResourceProvider::new(dir.path());

        assert!(provider.load("/../../../etc/passwd").is_err());
        assert!(!provider.exists("/../../../etc/passwd"));
    }

    #[test]
    fn test_docroot_provider_nested_paths() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/part.xml"), b"<part/>").unwrap();

        let provider = DocRootResourceProvider::new(dir.path());
        let data = provider.load("/sub/part.xml").unwrap();
        assert_eq!(&*data, b"<part/>");
    }
}
