//! Owned XML document tree built from quick-xml events.
//!
//! The accumulator hands out byte buffers that do not survive the request's
//! parse phase, so the tree owns all of its strings.

use crate::error::XmlError;
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesRef, BytesStart, Event as XmlEvent};

/// A processing instruction (`<?target data?>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pi {
    pub target: String,
    pub data: String,
}

/// One node in the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    Comment(String),
    Pi(Pi),
}

/// An element with owned name, attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Looks up an attribute by exact name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The element's local name (after any namespace prefix).
    pub fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// Concatenated text content of this element and its descendants.
    pub fn text_value(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    /// Child elements, skipping text/comment/PI nodes.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }
}

fn collect_text(nodes: &[XmlNode], out: &mut String) {
    for node in nodes {
        match node {
            XmlNode::Text(t) => out.push_str(t),
            XmlNode::Element(e) => collect_text(&e.children, out),
            _ => {}
        }
    }
}

/// A fully parsed document: prolog processing instructions, the declared
/// encoding (if any) and the single root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    /// Character encoding declared in the XML declaration, if present.
    pub encoding: Option<String>,
    /// Processing instructions appearing before the root element.
    pub prolog: Vec<Pi>,
    pub root: XmlElement,
}

impl XmlDocument {
    /// Parses a complete document from bytes.
    ///
    /// The accumulator guarantees the bytes arrive here in original order;
    /// this function does one pass over them.
    pub fn parse(bytes: &[u8]) -> Result<Self, XmlError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| XmlError::Malformed(format!("input is not valid UTF-8: {e}")))?;
        Self::parse_str(text)
    }

    pub fn parse_str(text: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(false);

        let mut encoding: Option<String> = None;
        let mut prolog: Vec<Pi> = Vec::new();
        let mut root: Option<XmlElement> = None;
        // Open-element stack; the tree is assembled as end tags arrive.
        let mut stack: Vec<XmlElement> = Vec::new();

        loop {
            match reader.read_event()? {
                XmlEvent::Decl(e) => {
                    if let Some(Ok(enc)) = e.encoding() {
                        encoding = Some(String::from_utf8_lossy(&enc).into_owned());
                    }
                }
                XmlEvent::PI(e) => {
                    let pi = parse_pi(std::str::from_utf8(e.as_ref())?);
                    if stack.is_empty() && root.is_none() {
                        prolog.push(pi);
                    } else if let Some(parent) = stack.last_mut() {
                        parent.children.push(XmlNode::Pi(pi));
                    }
                }
                XmlEvent::Start(e) => {
                    if stack.is_empty() && root.is_some() {
                        return Err(XmlError::Malformed(
                            "content after the root element".to_string(),
                        ));
                    }
                    stack.push(element_from_start(&e)?);
                }
                XmlEvent::Empty(e) => {
                    let elem = element_from_start(&e)?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(XmlNode::Element(elem)),
                        None if root.is_none() => root = Some(elem),
                        None => {
                            return Err(XmlError::Malformed(
                                "content after the root element".to_string(),
                            ));
                        }
                    }
                }
                XmlEvent::End(_) => {
                    let elem = stack.pop().ok_or_else(|| {
                        XmlError::Malformed("unmatched end tag".to_string())
                    })?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(XmlNode::Element(elem)),
                        None => root = Some(elem),
                    }
                }
                XmlEvent::Text(e) => {
                    let raw = std::str::from_utf8(e.as_ref())?;
                    let text = unescape(raw)?.into_owned();
                    if let Some(parent) = stack.last_mut() {
                        push_text(parent, text);
                    } else if !text.trim().is_empty() {
                        return Err(XmlError::Malformed(
                            "text outside the root element".to_string(),
                        ));
                    }
                }
                // Entity and character references arrive as their own
                // events, not as part of the surrounding text.
                XmlEvent::GeneralRef(e) => {
                    let text = resolve_general_ref(&e)?;
                    match stack.last_mut() {
                        Some(parent) => push_text(parent, text),
                        None => {
                            return Err(XmlError::Malformed(
                                "text outside the root element".to_string(),
                            ));
                        }
                    }
                }
                XmlEvent::CData(e) => {
                    let text = std::str::from_utf8(e.as_ref())?.to_string();
                    if let Some(parent) = stack.last_mut() {
                        push_text(parent, text);
                    }
                }
                XmlEvent::Comment(e) => {
                    let text = std::str::from_utf8(e.as_ref())?.to_string();
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(XmlNode::Comment(text));
                    }
                }
                XmlEvent::DocType(_) => {}
                XmlEvent::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(XmlError::Malformed(format!(
                "unclosed element '{}'",
                stack.last().map(|e| e.name.as_str()).unwrap_or("?")
            )));
        }
        match root {
            Some(root) => Ok(Self {
                encoding,
                prolog,
                root,
            }),
            None => Err(XmlError::NoDocument),
        }
    }

    /// Finds an `xml-stylesheet` processing instruction in the prolog and
    /// returns its `href` pseudo-attribute.
    pub fn stylesheet_directive(&self) -> Option<&str> {
        self.prolog
            .iter()
            .find(|pi| pi.target == "xml-stylesheet")
            .and_then(|pi| pseudo_attribute(&pi.data, "href"))
    }
}

fn element_from_start(e: &BytesStart<'_>) -> Result<XmlElement, XmlError> {
    let name = std::str::from_utf8(e.name().as_ref())?.to_string();
    let mut elem = XmlElement::new(name);
    for attr in e.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
        let value = attr.unescape_value()?.into_owned();
        elem.attributes.push((key, value));
    }
    Ok(elem)
}

/// Appends text to the parent, coalescing into a preceding text node so a
/// run of text and references forms one node.
fn push_text(parent: &mut XmlElement, text: String) {
    if let Some(XmlNode::Text(last)) = parent.children.last_mut() {
        last.push_str(&text);
    } else {
        parent.children.push(XmlNode::Text(text));
    }
}

/// Resolves a character reference or one of the five predefined entities.
/// Anything else is undeclared and rejects the document.
fn resolve_general_ref(e: &BytesRef<'_>) -> Result<String, XmlError> {
    if let Some(ch) = e.resolve_char_ref()? {
        return Ok(ch.to_string());
    }
    let name = std::str::from_utf8(e.as_ref())?;
    let resolved = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "apos" => "'",
        "quot" => "\"",
        other => {
            return Err(XmlError::Malformed(format!(
                "undeclared entity reference '&{other};'"
            )));
        }
    };
    Ok(resolved.to_string())
}

fn parse_pi(content: &str) -> Pi {
    match content.split_once(char::is_whitespace) {
        Some((target, data)) => Pi {
            target: target.to_string(),
            data: data.trim_start().to_string(),
        },
        None => Pi {
            target: content.to_string(),
            data: String::new(),
        },
    }
}

/// Extracts a pseudo-attribute (`name="value"` or `name='value'`) from
/// processing-instruction data.
fn pseudo_attribute<'a>(data: &'a str, name: &str) -> Option<&'a str> {
    let mut rest = data;
    while let Some(pos) = rest.find(name) {
        let after = &rest[pos + name.len()..];
        // Must be a whole token followed by '='.
        let preceded_ok = pos == 0
            || rest[..pos]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_whitespace());
        let after = after.trim_start();
        if preceded_ok && let Some(after) = after.strip_prefix('=') {
            let after = after.trim_start();
            let quote = after.chars().next()?;
            if quote == '"' || quote == '\'' {
                let inner = &after[1..];
                return inner.find(quote).map(|end| &inner[..end]);
            }
        }
        rest = &rest[pos + name.len()..];
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_document() {
        let doc = XmlDocument::parse(b"<a><b x=\"1\">hi</b></a>").unwrap();
        assert_eq!(doc.root.name, "a");
        let b = doc.root.child_elements().next().unwrap();
        assert_eq!(b.name, "b");
        assert_eq!(b.attribute("x"), Some("1"));
        assert_eq!(b.text_value(), "hi");
    }

    #[test]
    fn test_parse_captures_declared_encoding() {
        let doc =
            XmlDocument::parse(b"<?xml version=\"1.0\" encoding=\"UTF-8\"?><a/>").unwrap();
        assert_eq!(doc.encoding.as_deref(), Some("UTF-8"));
    }

    #[test]
    fn test_parse_empty_input_is_no_document() {
        assert!(matches!(XmlDocument::parse(b""), Err(XmlError::NoDocument)));
        assert!(matches!(
            XmlDocument::parse(b"   \n"),
            Err(XmlError::NoDocument)
        ));
    }

    #[test]
    fn test_parse_unclosed_element_fails() {
        assert!(XmlDocument::parse(b"<a><b>").is_err());
    }

    #[test]
    fn test_parse_entities_unescaped() {
        let doc = XmlDocument::parse(b"<a>a &amp; b</a>").unwrap();
        assert_eq!(doc.root.text_value(), "a & b");
        // References coalesce with the surrounding text into one node.
        assert_eq!(doc.root.children.len(), 1);
    }

    #[test]
    fn test_parse_predefined_and_character_references() {
        let doc = XmlDocument::parse(b"<a>Tom &amp; Jerry &lt;3 &#65;&#x42;</a>").unwrap();
        assert_eq!(doc.root.text_value(), "Tom & Jerry <3 AB");
    }

    #[test]
    fn test_parse_undeclared_entity_fails() {
        assert!(matches!(
            XmlDocument::parse(b"<a>&nope;</a>"),
            Err(XmlError::Malformed(_))
        ));
    }

    #[test]
    fn test_stylesheet_directive() {
        let doc = XmlDocument::parse(
            b"<?xml-stylesheet type=\"text/xsl\" href=\"style.xsl\"?><a/>",
        )
        .unwrap();
        assert_eq!(doc.stylesheet_directive(), Some("style.xsl"));
    }

    #[test]
    fn test_stylesheet_directive_single_quotes() {
        let doc = XmlDocument::parse(b"<?xml-stylesheet href='s.xsl'?><a/>").unwrap();
        assert_eq!(doc.stylesheet_directive(), Some("s.xsl"));
    }

    #[test]
    fn test_no_stylesheet_directive() {
        let doc = XmlDocument::parse(b"<a/>").unwrap();
        assert_eq!(doc.stylesheet_directive(), None);
    }

    #[test]
    fn test_pi_inside_root_is_not_a_directive() {
        let doc =
            XmlDocument::parse(b"<a><?xml-stylesheet href=\"s.xsl\"?></a>").unwrap();
        assert_eq!(doc.stylesheet_directive(), None);
    }

    #[test]
    fn test_local_name() {
        let e = XmlElement::new("xsl:template");
        assert_eq!(e.local_name(), "template");
        let e = XmlElement::new("plain");
        assert_eq!(e.local_name(), "plain");
    }
}
