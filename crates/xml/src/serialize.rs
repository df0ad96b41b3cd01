//! Streaming serialization of a result tree.
//!
//! Output is written through the host's [`ChunkSink`] as it is produced, and
//! the total byte count is returned so the caller can finalize length
//! framing before acknowledging end-of-stream.

use crate::document::{XmlElement, XmlNode};
use crate::error::XmlError;
use std::io::Write;
use xflow_traits::ChunkSink;

/// Declared output method of a transformation program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMethod {
    Xml,
    Html,
    Text,
}

impl OutputMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "xml" => Some(OutputMethod::Xml),
            "html" => Some(OutputMethod::Html),
            "text" => Some(OutputMethod::Text),
            _ => None,
        }
    }
}

/// Adapts a [`ChunkSink`] to [`std::io::Write`], counting bytes on the way
/// through.
struct SinkWriter<'a> {
    sink: &'a mut dyn ChunkSink,
    written: u64,
}

impl Write for SinkWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.sink.write_chunk(buf);
        self.written += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Serializes a result-tree node list with the given output method,
/// streaming chunks into `sink`. Returns the total number of bytes written.
///
/// The sink's end-of-stream is NOT signalled here; the transform executor
/// sets length framing first and then ends the stream.
///
/// Output bytes are always UTF-8. A declared `encoding` is echoed into the
/// XML declaration (and by the caller into the content type) as a label
/// only; no transcoding is performed, so declaring a non-UTF-8 encoding is
/// sound only for documents whose output is ASCII.
pub fn serialize_nodes(
    nodes: &[XmlNode],
    method: OutputMethod,
    encoding: Option<&str>,
    sink: &mut dyn ChunkSink,
) -> Result<u64, XmlError> {
    let mut writer = SinkWriter { sink, written: 0 };
    match method {
        OutputMethod::Xml => {
            match encoding {
                Some(enc) => write!(writer, "<?xml version=\"1.0\" encoding=\"{enc}\"?>\n")?,
                None => writer.write_all(b"<?xml version=\"1.0\"?>\n")?,
            }
            for node in nodes {
                write_node(&mut writer, node, false)?;
            }
        }
        OutputMethod::Html => {
            for node in nodes {
                write_node(&mut writer, node, true)?;
            }
        }
        OutputMethod::Text => {
            for node in nodes {
                write_text_only(&mut writer, node)?;
            }
        }
    }
    Ok(writer.written)
}

/// HTML void elements are serialized without an end tag.
fn is_html_void(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

fn write_node(w: &mut impl Write, node: &XmlNode, html: bool) -> Result<(), XmlError> {
    match node {
        XmlNode::Element(e) => write_element(w, e, html),
        XmlNode::Text(t) => {
            write!(w, "{}", escape_text(t))?;
            Ok(())
        }
        XmlNode::Comment(c) => {
            write!(w, "<!--{c}-->")?;
            Ok(())
        }
        XmlNode::Pi(pi) => {
            if pi.data.is_empty() {
                write!(w, "<?{}?>", pi.target)?;
            } else {
                write!(w, "<?{} {}?>", pi.target, pi.data)?;
            }
            Ok(())
        }
    }
}

fn write_element(w: &mut impl Write, elem: &XmlElement, html: bool) -> Result<(), XmlError> {
    write!(w, "<{}", elem.name)?;
    for (key, value) in &elem.attributes {
        write!(w, " {}=\"{}\"", key, escape_attr(value))?;
    }
    if elem.children.is_empty() {
        if html {
            if is_html_void(&elem.name) {
                write!(w, ">")?;
            } else {
                write!(w, "></{}>", elem.name)?;
            }
        } else {
            write!(w, "/>")?;
        }
        return Ok(());
    }
    write!(w, ">")?;
    for child in &elem.children {
        write_node(w, child, html)?;
    }
    write!(w, "</{}>", elem.name)?;
    Ok(())
}

fn write_text_only(w: &mut impl Write, node: &XmlNode) -> Result<(), XmlError> {
    match node {
        XmlNode::Text(t) => write!(w, "{t}")?,
        XmlNode::Element(e) => {
            for child in &e.children {
                write_text_only(w, child)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn escape_text(text: &str) -> std::borrow::Cow<'_, str> {
    quick_xml::escape::partial_escape(text)
}

fn escape_attr(text: &str) -> std::borrow::Cow<'_, str> {
    quick_xml::escape::escape(text)
}
