//! Stylesheet compilation.
//!
//! The source is parsed into an owned tree first, then walked into the
//! instruction AST. Anything outside the supported subset is a compilation
//! error; at cache-preload time that rejects the configuration scope, at
//! request time it fails the request.

use crate::ast::{AttrTemplate, CompiledStylesheet, Instruction, OutputSpec, TemplateRule};
use crate::error::XsltError;
use crate::pattern::{LocationPath, Pattern, TestExpr};
use log::debug;
use xflow_xml::{OutputMethod, XmlDocument, XmlElement, XmlNode};

pub const XSLT_NS: &str = "http://www.w3.org/1999/XSL/Transform";

/// Compiles a stylesheet from source text.
pub fn compile(source: &str) -> Result<CompiledStylesheet, XsltError> {
    let doc = XmlDocument::parse_str(source)?;
    let root = &doc.root;

    let xsl_prefix = xsl_prefix(root).ok_or_else(|| {
        XsltError::Compilation(format!(
            "root element '{}' is not an XSLT stylesheet",
            root.name
        ))
    })?;
    if !matches!(root.local_name(), "stylesheet" | "transform") {
        return Err(XsltError::Compilation(format!(
            "root element '{}' is not an XSLT stylesheet",
            root.name
        )));
    }

    let mut output = OutputSpec::default();
    let mut rules = Vec::new();

    for child in root.child_elements() {
        match xsl_local(child, &xsl_prefix) {
            Some("output") => {
                if let Some(m) = child.attribute("method") {
                    output.method = Some(OutputMethod::parse(m).ok_or_else(|| {
                        XsltError::Compilation(format!("unknown output method '{m}'"))
                    })?);
                }
                output.media_type = child.attribute("media-type").map(str::to_string);
                output.encoding = child.attribute("encoding").map(str::to_string);
            }
            Some("template") => {
                let pattern = match child.attribute("match") {
                    Some(m) => Pattern::parse(m)?,
                    None => {
                        return Err(XsltError::Compilation(
                            "xsl:template without a match pattern".to_string(),
                        ));
                    }
                };
                let body = compile_body(child, &xsl_prefix)?;
                rules.push(TemplateRule { pattern, body });
            }
            Some(other) => {
                return Err(XsltError::Compilation(format!(
                    "unsupported top-level instruction 'xsl:{other}'"
                )));
            }
            None => {
                return Err(XsltError::Compilation(format!(
                    "unexpected top-level element '{}'",
                    child.name
                )));
            }
        }
    }

    debug!("compiled stylesheet with {} template rules", rules.len());
    Ok(CompiledStylesheet { output, rules })
}

/// Compiles a stylesheet from raw bytes, as loaded by a resource provider.
pub fn compile_bytes(source: &[u8]) -> Result<CompiledStylesheet, XsltError> {
    let text = std::str::from_utf8(source)
        .map_err(|e| XsltError::Compilation(format!("stylesheet is not valid UTF-8: {e}")))?;
    compile(text)
}

/// Finds the prefix bound to the XSLT namespace on the root element.
fn xsl_prefix(root: &XmlElement) -> Option<String> {
    for (key, value) in &root.attributes {
        if value == XSLT_NS {
            if key == "xmlns" {
                return Some(String::new());
            }
            if let Some(prefix) = key.strip_prefix("xmlns:") {
                return Some(prefix.to_string());
            }
        }
    }
    None
}

/// Returns the XSLT-instruction local name if the element is in the XSLT
/// prefix, `None` for literal result elements.
fn xsl_local<'a>(elem: &'a XmlElement, xsl_prefix: &str) -> Option<&'a str> {
    match elem.name.split_once(':') {
        Some((prefix, local)) if prefix == xsl_prefix => Some(local),
        None if xsl_prefix.is_empty() => Some(&elem.name),
        _ => None,
    }
}

fn compile_body(parent: &XmlElement, xsl_prefix: &str) -> Result<Vec<Instruction>, XsltError> {
    let mut out = Vec::new();
    for child in &parent.children {
        match child {
            XmlNode::Text(text) => {
                // Whitespace-only text between instructions is stylesheet
                // formatting, not output.
                if !text.trim().is_empty() {
                    out.push(Instruction::Text(text.clone()));
                }
            }
            XmlNode::Element(elem) => out.push(compile_element(elem, xsl_prefix)?),
            XmlNode::Comment(_) | XmlNode::Pi(_) => {}
        }
    }
    Ok(out)
}

fn compile_element(elem: &XmlElement, xsl_prefix: &str) -> Result<Instruction, XsltError> {
    let Some(local) = xsl_local(elem, xsl_prefix) else {
        return compile_literal(elem, xsl_prefix);
    };
    match local {
        "value-of" => {
            let select = required_attr(elem, "select")?;
            Ok(Instruction::ValueOf(LocationPath::parse(select)?))
        }
        "apply-templates" => {
            let select = elem
                .attribute("select")
                .map(LocationPath::parse)
                .transpose()?;
            Ok(Instruction::ApplyTemplates(select))
        }
        "for-each" => {
            let select = required_attr(elem, "select")?;
            Ok(Instruction::ForEach {
                select: LocationPath::parse(select)?,
                body: compile_body(elem, xsl_prefix)?,
            })
        }
        "if" => {
            let test = required_attr(elem, "test")?;
            Ok(Instruction::If {
                test: TestExpr::parse(test)?,
                body: compile_body(elem, xsl_prefix)?,
            })
        }
        "text" => Ok(Instruction::Text(elem.text_value())),
        other => Err(XsltError::Compilation(format!(
            "unsupported instruction 'xsl:{other}'"
        ))),
    }
}

fn compile_literal(elem: &XmlElement, xsl_prefix: &str) -> Result<Instruction, XsltError> {
    let mut attributes = Vec::new();
    for (key, value) in &elem.attributes {
        // Namespace declarations for the XSLT prefix do not belong in the
        // result tree.
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        attributes.push((key.clone(), AttrTemplate::parse(value)?));
    }
    Ok(Instruction::Literal {
        name: elem.name.clone(),
        attributes,
        children: compile_body(elem, xsl_prefix)?,
    })
}

fn required_attr<'a>(elem: &'a XmlElement, name: &str) -> Result<&'a str, XsltError> {
    elem.attribute(name).ok_or_else(|| {
        XsltError::Compilation(format!("'{}' requires a '{name}' attribute", elem.name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_minimal_stylesheet() {
        let sheet = compile(
            r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
                 <xsl:template match="/"><html/></xsl:template>
               </xsl:stylesheet>"#,
        )
        .unwrap();
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.output, OutputSpec::default());
    }

    #[test]
    fn test_compile_output_declarations() {
        let sheet = compile(
            r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
                 <xsl:output method="html" media-type="application/json" encoding="ISO-8859-1"/>
               </xsl:stylesheet>"#,
        )
        .unwrap();
        assert_eq!(sheet.output.method, Some(OutputMethod::Html));
        assert_eq!(sheet.output.media_type.as_deref(), Some("application/json"));
        assert_eq!(sheet.output.encoding.as_deref(), Some("ISO-8859-1"));
    }

    #[test]
    fn test_compile_rejects_non_stylesheet_root() {
        assert!(matches!(
            compile("<html/>"),
            Err(XsltError::Compilation(_))
        ));
    }

    #[test]
    fn test_compile_rejects_unknown_instruction() {
        let result = compile(
            r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
                 <xsl:template match="/"><xsl:frobnicate/></xsl:template>
               </xsl:stylesheet>"#,
        );
        assert!(matches!(result, Err(XsltError::Compilation(_))));
    }

    #[test]
    fn test_compile_rejects_malformed_source() {
        assert!(compile("<xsl:stylesheet").is_err());
    }

    #[test]
    fn test_compile_accepts_transform_root() {
        let sheet = compile(
            r#"<x:transform version="1.0" xmlns:x="http://www.w3.org/1999/XSL/Transform">
                 <x:template match="/"><out/></x:template>
               </x:transform>"#,
        )
        .unwrap();
        assert_eq!(sheet.rules.len(), 1);
    }
}
