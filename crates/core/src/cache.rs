//! Process-wide stylesheet cache.
//!
//! Populated from cache-preload directive pairs at configuration-load time,
//! then shared read-only across requests (the filter holds it behind `Arc`
//! and no mutation API is reachable after that, which is what makes
//! lock-free concurrent lookups safe). Dropping the cache drops every
//! compiled program exactly once.

use crate::error::FilterError;
use log::info;
use std::collections::HashMap;
use std::sync::Arc;
use xflow_xslt::CompiledStylesheet;

#[derive(Debug, Default)]
pub struct StylesheetCache {
    entries: HashMap<String, Arc<CompiledStylesheet>>,
}

impl StylesheetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles the stylesheet at `source_path` and caches it under `id`.
    ///
    /// Load-time only. A compile failure is a configuration error and
    /// rejects the scope that declared the pair.
    pub fn insert(&mut self, id: impl Into<String>, source_path: &str) -> Result<(), FilterError> {
        let id = id.into();
        let source = std::fs::read(source_path).map_err(|e| {
            FilterError::Config(format!(
                "error reading stylesheet '{source_path}' for cache id '{id}': {e}"
            ))
        })?;
        let compiled = xflow_xslt::compile_bytes(&source).map_err(|e| {
            FilterError::Config(format!(
                "error compiling stylesheet '{source_path}' for cache id '{id}': {e}"
            ))
        })?;
        self.insert_compiled(id, compiled);
        Ok(())
    }

    /// Caches an already-compiled program under `id`.
    pub fn insert_compiled(&mut self, id: impl Into<String>, compiled: CompiledStylesheet) {
        let id = id.into();
        info!("cached precompiled stylesheet '{id}'");
        self.entries.insert(id, Arc::new(compiled));
    }

    /// Exact-match lookup. Returns a non-owning handle; the program stays
    /// alive for the cache's whole lifetime.
    pub fn lookup(&self, id: &str) -> Option<&Arc<CompiledStylesheet>> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
