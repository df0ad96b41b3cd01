//! Stylesheet resolution.
//!
//! Precedence: an explicit id set on the request wins over everything;
//! otherwise the document's own `xml-stylesheet` directive decides.
//! A cache hit yields a shared program, a directive (or a missed id)
//! yields a freshly compiled one.

use crate::cache::StylesheetCache;
use crate::error::FilterError;
use log::debug;
use std::sync::Arc;
use xflow_resource::RequestLoader;
use xflow_xml::XmlDocument;
use xflow_xslt::CompiledStylesheet;

/// A resolved, ready-to-apply program, tagged with how it was obtained.
///
/// Cached programs are shared with the cache and must outlive nothing;
/// fresh programs are owned by the request that compiled them and are
/// dropped when the response completes.
#[derive(Debug)]
pub enum ResolvedProgram {
    Cached(Arc<CompiledStylesheet>),
    Fresh(Arc<CompiledStylesheet>),
}

impl ResolvedProgram {
    pub fn program(&self) -> &CompiledStylesheet {
        match self {
            ResolvedProgram::Cached(p) | ResolvedProgram::Fresh(p) => p,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, ResolvedProgram::Cached(_))
    }
}

fn load_and_compile(href: &str, loader: &RequestLoader) -> Result<ResolvedProgram, FilterError> {
    let source = loader
        .load(href)
        .map_err(|e| FilterError::Resolution(format!("error loading stylesheet '{href}': {e}")))?;
    let compiled = xflow_xslt::compile_bytes(&source).map_err(|e| {
        FilterError::Resolution(format!("error compiling stylesheet '{href}': {e}"))
    })?;
    Ok(ResolvedProgram::Fresh(Arc::new(compiled)))
}

/// Picks the program for this response.
pub fn resolve_program(
    requested: Option<&str>,
    doc: &XmlDocument,
    cache: &StylesheetCache,
    loader: &RequestLoader,
) -> Result<ResolvedProgram, FilterError> {
    if let Some(id) = requested {
        if let Some(compiled) = cache.lookup(id) {
            debug!("stylesheet id '{id}' resolved from cache");
            return Ok(ResolvedProgram::Cached(Arc::clone(compiled)));
        }
        // An id that misses the cache is treated as a location and
        // compiled for this request alone.
        debug!("stylesheet id '{id}' not cached, compiling per-request");
        return load_and_compile(id, loader);
    }

    if let Some(href) = doc.stylesheet_directive() {
        debug!("using document stylesheet directive '{href}'");
        return load_and_compile(&href, loader);
    }

    Err(FilterError::Resolution(
        "no stylesheet: document carries no xml-stylesheet directive and none was configured"
            .to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
        <xsl:template match="/"><out/></xsl:template>
    </xsl:stylesheet>"#;

    fn bare_loader() -> RequestLoader<'static> {
        RequestLoader::new("/site/index.xml", None, false, false)
    }

    #[test]
    fn test_explicit_id_beats_directive() {
        let mut cache = StylesheetCache::new();
        cache.insert_compiled("main", xflow_xslt::compile(SHEET).unwrap());
        let doc =
            XmlDocument::parse_str("<?xml-stylesheet type=\"text/xsl\" href=\"other.xsl\"?><r/>")
                .unwrap();

        let resolved =
            resolve_program(Some("main"), &doc, &cache, &bare_loader()).unwrap();
        assert!(resolved.is_cached());
    }

    #[test]
    fn test_directive_compiles_fresh() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("style.xsl"), SHEET).unwrap();
        let request_path = format!("{}/page.xml", dir.path().display());
        let loader = RequestLoader::new(&request_path, None, false, true);

        let doc =
            XmlDocument::parse_str("<?xml-stylesheet type=\"text/xsl\" href=\"style.xsl\"?><r/>")
                .unwrap();
        let resolved = resolve_program(None, &doc, &StylesheetCache::new(), &loader).unwrap();
        assert!(!resolved.is_cached());
    }

    #[test]
    fn test_missed_id_falls_back_to_loading() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("style.xsl"), SHEET).unwrap();
        let request_path = format!("{}/page.xml", dir.path().display());
        let loader = RequestLoader::new(&request_path, None, false, true);

        let doc = XmlDocument::parse_str("<r/>").unwrap();
        let resolved =
            resolve_program(Some("style.xsl"), &doc, &StylesheetCache::new(), &loader).unwrap();
        assert!(!resolved.is_cached());
    }

    #[test]
    fn test_no_source_is_resolution_error() {
        let doc = XmlDocument::parse_str("<r/>").unwrap();
        let err =
            resolve_program(None, &doc, &StylesheetCache::new(), &bare_loader()).unwrap_err();
        assert!(matches!(err, FilterError::Resolution(_)));
    }
}
