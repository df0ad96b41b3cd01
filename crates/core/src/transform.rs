//! The transform executor: everything that happens once the complete
//! document is in hand. Include expansion, stylesheet resolution,
//! template application, content-type negotiation, serialization, and
//! length framing, in that order.

use crate::cache::StylesheetCache;
use crate::error::FilterError;
use crate::options::OptionFlags;
use crate::resolve::resolve_program;
use log::{debug, warn};
use xflow_resource::RequestLoader;
use xflow_traits::{ChunkSink, ResourceProvider, ResponseMeta};
use xflow_xml::{OutputMethod, XmlDocument, expand_includes, serialize_nodes};

/// Decides the outgoing content-type from the program's output
/// declaration, falling back to the document's own encoding and then to
/// the output method. No match at all leaves the type untouched.
fn negotiate_content_type(
    media_type: Option<&str>,
    declared_encoding: Option<&str>,
    doc_encoding: Option<&str>,
    method: Option<OutputMethod>,
    meta: &mut dyn ResponseMeta,
) {
    if let Some(media) = media_type {
        if let Some(enc) = declared_encoding {
            debug!("media type is '{media}', encoding is '{enc}'");
            meta.set_content_type(&format!("{media}; charset={enc}"));
        } else if let Some(enc) = doc_encoding {
            debug!("media type is '{media}', encoding is '{enc}' (from document)");
            meta.set_content_type(&format!("{media}; charset={enc}"));
        } else {
            debug!("media type is '{media}', no encoding");
            meta.set_content_type(media);
        }
    } else if method == Some(OutputMethod::Html) {
        meta.set_content_type("text/html");
    } else {
        warn!("no content type was set");
    }
}

/// Runs the complete transform for one response.
///
/// `chunked` reports the framing decision already taken by the filter
/// entry point; when fixed-length framing is in effect the serialized
/// byte count becomes the content length.
#[allow(clippy::too_many_arguments)]
pub(crate) fn run_transform(
    mut doc: XmlDocument,
    request_path: &str,
    requested_stylesheet: Option<&str>,
    flags: OptionFlags,
    cache: &StylesheetCache,
    provider: Option<&dyn ResourceProvider>,
    chunked: bool,
    meta: &mut dyn ResponseMeta,
    sink: &mut dyn ChunkSink,
) -> Result<(), FilterError> {
    let loader = RequestLoader::new(
        request_path,
        provider,
        flags.contains(OptionFlags::PROVIDER_FS),
        !flags.contains(OptionFlags::NO_HOST_FS),
    );

    if flags.contains(OptionFlags::XINCLUDES) {
        expand_includes(&mut doc, &loader)
            .map_err(|e| FilterError::Transform(format!("include expansion failed: {e}")))?;
    }

    let resolved = resolve_program(requested_stylesheet, &doc, cache, &loader)?;
    let program = resolved.program();

    let result = program
        .apply(&doc)
        .map_err(|e| FilterError::Transform(e.to_string()))?;

    negotiate_content_type(
        program.output.media_type.as_deref(),
        program.output.encoding.as_deref(),
        doc.encoding.as_deref(),
        program.output.method,
        meta,
    );

    let method = program.output.method.unwrap_or(OutputMethod::Xml);
    let length = serialize_nodes(&result, method, program.output.encoding.as_deref(), sink)
        .map_err(|e| FilterError::Transform(format!("serialization failed: {e}")))?;

    if !chunked {
        meta.set_content_length(length);
    }
    sink.end();
    Ok(())
}
