//! In-place XInclude expansion.
//!
//! Inclusion failures are recoverable: a failed include degrades to its
//! `xi:fallback` content, or to nothing, with a warning in the log. The
//! loader decides what may be fetched at all (network fetches are refused
//! there), so expansion itself never reaches outside the request.

use crate::document::{XmlDocument, XmlElement, XmlNode};
use crate::error::XmlError;
use log::warn;
use std::collections::HashMap;

pub const XINCLUDE_NS: &str = "http://www.w3.org/2001/XInclude";

/// Nesting guard for include-of-include chains.
const MAX_INCLUDE_DEPTH: usize = 16;

/// Turns a resource reference into readable bytes during include expansion
/// or stylesheet autodiscovery.
///
/// Implementations carry the request's own base location, so resolution is
/// request-scoped by construction; there is no process-global loader state.
pub trait DocumentLoader {
    fn load_resource(&self, href: &str) -> Result<Vec<u8>, XmlError>;
}

/// Expands `xi:include` elements in place.
pub fn expand_includes(doc: &mut XmlDocument, loader: &dyn DocumentLoader) -> Result<(), XmlError> {
    let mut scope = HashMap::new();
    expand_element(&mut doc.root, loader, &mut scope, 0);
    Ok(())
}

fn expand_element(
    elem: &mut XmlElement,
    loader: &dyn DocumentLoader,
    scope: &mut HashMap<String, String>,
    depth: usize,
) {
    // Namespace declarations on this element shadow outer bindings for the
    // duration of the subtree walk.
    let mut shadowed: Vec<(String, Option<String>)> = Vec::new();
    for (key, value) in &elem.attributes {
        let prefix = if key == "xmlns" {
            Some(String::new())
        } else {
            key.strip_prefix("xmlns:").map(str::to_string)
        };
        if let Some(prefix) = prefix {
            shadowed.push((prefix.clone(), scope.get(&prefix).cloned()));
            scope.insert(prefix, value.clone());
        }
    }

    let mut rebuilt = Vec::with_capacity(elem.children.len());
    for child in elem.children.drain(..) {
        match child {
            XmlNode::Element(mut e) => {
                if is_include(&e, scope) {
                    rebuilt.extend(expand_one(&e, loader, scope, depth));
                } else {
                    expand_element(&mut e, loader, scope, depth);
                    rebuilt.push(XmlNode::Element(e));
                }
            }
            other => rebuilt.push(other),
        }
    }
    elem.children = rebuilt;

    for (prefix, previous) in shadowed {
        match previous {
            Some(uri) => {
                scope.insert(prefix, uri);
            }
            None => {
                scope.remove(&prefix);
            }
        }
    }
}

fn is_include(elem: &XmlElement, scope: &HashMap<String, String>) -> bool {
    if elem.local_name() != "include" {
        return false;
    }
    let prefix = match elem.name.split_once(':') {
        Some((prefix, _)) => prefix,
        None => "",
    };
    // Declarations on the include element itself also count.
    let own = if prefix.is_empty() {
        elem.attribute("xmlns")
    } else {
        let qualified = format!("xmlns:{prefix}");
        elem.attribute(&qualified)
    };
    let bound = own.or_else(|| scope.get(prefix).map(String::as_str));
    bound == Some(XINCLUDE_NS)
}

/// Expands a single include element into replacement nodes, degrading to
/// fallback content (or nothing) on any failure.
fn expand_one(
    elem: &XmlElement,
    loader: &dyn DocumentLoader,
    scope: &mut HashMap<String, String>,
    depth: usize,
) -> Vec<XmlNode> {
    if depth >= MAX_INCLUDE_DEPTH {
        warn!("XInclude nesting deeper than {MAX_INCLUDE_DEPTH}, dropping include");
        return fallback_nodes(elem);
    }
    let Some(href) = elem.attribute("href") else {
        warn!("XInclude element without href, dropping");
        return fallback_nodes(elem);
    };
    let parse_as_text = elem.attribute("parse") == Some("text");

    let bytes = match loader.load_resource(href) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("XInclude of '{href}' failed: {e}");
            return fallback_nodes(elem);
        }
    };

    if parse_as_text {
        return vec![XmlNode::Text(String::from_utf8_lossy(&bytes).into_owned())];
    }
    match XmlDocument::parse(&bytes) {
        Ok(doc) => {
            let mut root = doc.root;
            expand_element(&mut root, loader, scope, depth + 1);
            vec![XmlNode::Element(root)]
        }
        Err(e) => {
            warn!("XInclude of '{href}' is not well-formed: {e}");
            fallback_nodes(elem)
        }
    }
}

fn fallback_nodes(elem: &XmlElement) -> Vec<XmlNode> {
    elem.child_elements()
        .find(|e| e.local_name() == "fallback")
        .map(|fb| fb.children.clone())
        .unwrap_or_default()
}
