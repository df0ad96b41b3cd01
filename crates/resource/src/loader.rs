//! Per-request resource loader.
//!
//! Every resource reference discovered while processing a request (include
//! hrefs, stylesheet directives, fresh stylesheet paths) goes through one
//! [`RequestLoader`] value carrying that request's source location and
//! loading policy. The loader is passed explicitly down the call chain;
//! two concurrent requests cannot see each other's base location.

use crate::uri::resolve_reference;
use log::debug;
use xflow_traits::{ResourceError, ResourceProvider};
use xflow_xml::{DocumentLoader, XmlError};

pub struct RequestLoader<'a> {
    /// Filesystem path of the request's source document.
    request_path: &'a str,
    provider: Option<&'a dyn ResourceProvider>,
    /// Route loads through the provider instead of the host filesystem.
    use_provider: bool,
    /// Permit direct host-filesystem reads.
    allow_host_fs: bool,
}

impl<'a> RequestLoader<'a> {
    pub fn new(
        request_path: &'a str,
        provider: Option<&'a dyn ResourceProvider>,
        use_provider: bool,
        allow_host_fs: bool,
    ) -> Self {
        Self {
            request_path,
            provider,
            use_provider,
            allow_host_fs,
        }
    }

    pub fn request_path(&self) -> &str {
        self.request_path
    }

    /// Resolves `href` against the request location and loads it.
    ///
    /// Network references are refused here; includes and stylesheet loads
    /// never leave the local resource space.
    pub fn load(&self, href: &str) -> Result<Vec<u8>, ResourceError> {
        let resolved = resolve_reference(href, self.request_path);
        debug!("loading '{href}' as '{resolved}'");

        let path = match resolved.strip_prefix("file://") {
            Some(path) => path,
            None if !resolved.contains("://") => resolved.as_str(),
            None => {
                return Err(ResourceError::AccessDenied(format!(
                    "{resolved} (remote fetch suppressed)"
                )));
            }
        };

        if self.use_provider
            && let Some(provider) = self.provider
        {
            return provider.load(path).map(|data| data.to_vec());
        }
        if !self.allow_host_fs {
            return Err(ResourceError::AccessDenied(format!(
                "{path} (host filesystem access disabled)"
            )));
        }
        std::fs::read(path).map_err(|e| {
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
}

impl DocumentLoader for RequestLoader<'_> {
    fn load_resource(&self, href: &str) -> Result<Vec<u8>, XmlError> {
        self.load(href).map_err(|e| XmlError::Load {
            href: href.to_string(),
            message: e.to_string(),
        })
    }
}
