//! The response filter itself.
//!
//! A [`TransformFilter`] is built once per scope from merged options and the
//! shared cache, then invoked for any number of requests. Body chunks are
//! accumulated verbatim until end-of-stream; only then does parsing,
//! resolution, transformation and serialization run.

use crate::cache::StylesheetCache;
use crate::error::{FilterError, FilterStatus};
use crate::options::ScopeOptions;
use crate::request::Request;
use crate::transform::run_transform;
use log::error;
use std::sync::Arc;
use xflow_traits::{ChunkSink, ResourceProvider, ResponseMeta};
use xflow_xml::ParseAccumulator;

/// One unit of the incoming body stream.
#[derive(Debug, Clone, Copy)]
pub enum BodyChunk<'a> {
    Data(&'a [u8]),
    End,
}

pub struct TransformFilter {
    options: ScopeOptions,
    cache: Arc<StylesheetCache>,
    provider: Option<Arc<dyn ResourceProvider>>,
}

impl TransformFilter {
    pub fn new(options: ScopeOptions, cache: Arc<StylesheetCache>) -> Self {
        Self {
            options,
            cache,
            provider: None,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn ResourceProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Starts request state for one response, seeding the stylesheet note
    /// from the scope's configured default (if any).
    pub fn new_request(
        &self,
        path: impl Into<String>,
        protocol: (u32, u32),
        is_subrequest: bool,
    ) -> Request {
        let mut request = Request::new(path).with_protocol(protocol.0, protocol.1);
        if is_subrequest {
            request = request.as_subrequest();
        }
        request.notes.stylesheet = self.options.stylesheet.clone();
        request
    }

    /// Feeds body chunks through the filter. On error, logs the cause and
    /// reports an internal server error; nothing is written downstream.
    pub fn process<'a>(
        &self,
        request: &mut Request,
        chunks: impl IntoIterator<Item = BodyChunk<'a>>,
        sink: &mut dyn ChunkSink,
        meta: &mut dyn ResponseMeta,
    ) -> FilterStatus {
        match self.try_process(request, chunks, sink, meta) {
            Ok(()) => FilterStatus::Ok,
            Err(e) => {
                error!("{e}");
                e.status()
            }
        }
    }

    fn try_process<'a>(
        &self,
        request: &mut Request,
        chunks: impl IntoIterator<Item = BodyChunk<'a>>,
        sink: &mut dyn ChunkSink,
        meta: &mut dyn ResponseMeta,
    ) -> Result<(), FilterError> {
        for chunk in chunks {
            match chunk {
                BodyChunk::Data(data) => {
                    if request.accumulator.is_none() {
                        // The upstream length describes the untransformed
                        // body and is wrong from here on.
                        meta.unset_content_length();
                        request.accumulator = Some(ParseAccumulator::new());
                    }
                    if let Some(acc) = request.accumulator.as_mut() {
                        acc.feed(data);
                    }
                }
                BodyChunk::End => return self.finish(request, sink, meta),
            }
        }
        Ok(())
    }

    /// End-of-stream: obtain the document and run the transform.
    fn finish(
        &self,
        request: &mut Request,
        sink: &mut dyn ChunkSink,
        meta: &mut dyn ResponseMeta,
    ) -> Result<(), FilterError> {
        let accumulator = request.accumulator.take();
        let doc = match request.notes.document.take() {
            // A pre-parsed document bypasses body parsing entirely.
            Some(doc) => doc,
            None => {
                let acc = accumulator
                    .ok_or_else(|| FilterError::Parse("empty response body".to_string()))?;
                acc.finalize()
                    .map_err(|e| FilterError::Parse(e.to_string()))?
            }
        };

        let chunked = request.protocol >= (1, 1) && !request.is_subrequest;
        if chunked {
            meta.set_chunked(true);
        }

        run_transform(
            doc,
            &request.path,
            request.notes.stylesheet.as_deref(),
            self.options.flags(),
            &self.cache,
            self.provider.as_deref(),
            chunked,
            meta,
            sink,
        )
    }
}
