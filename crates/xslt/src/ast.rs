//! Compiled stylesheet representation.

use crate::error::XsltError;
use crate::executor::TemplateExecutor;
use crate::pattern::{LocationPath, Pattern, TestExpr};
use xflow_xml::{OutputMethod, XmlDocument, XmlNode};

/// Output declarations from `xsl:output`. Any of them may be absent; the
/// transform executor turns them into a content descriptor.
///
/// `encoding` labels the emitted declaration and content type; serialized
/// bytes are always UTF-8 (see `serialize_nodes`), so non-UTF-8 values are
/// only accurate for ASCII output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSpec {
    pub method: Option<OutputMethod>,
    pub media_type: Option<String>,
    pub encoding: Option<String>,
}

/// A compiled transformation program.
///
/// Compiled once (at cache-preload time or per request) and applied to any
/// number of documents; application never mutates the program.
#[derive(Debug)]
pub struct CompiledStylesheet {
    pub output: OutputSpec,
    pub(crate) rules: Vec<TemplateRule>,
}

impl CompiledStylesheet {
    /// Applies the program to a parsed document, producing a result-tree
    /// node list.
    pub fn apply(&self, doc: &XmlDocument) -> Result<Vec<XmlNode>, XsltError> {
        TemplateExecutor::new(self).run(doc)
    }
}

#[derive(Debug)]
pub(crate) struct TemplateRule {
    pub pattern: Pattern,
    pub body: Vec<Instruction>,
}

#[derive(Debug)]
pub(crate) enum Instruction {
    /// A literal result element; attribute values may contain `{expr}`
    /// value templates.
    Literal {
        name: String,
        attributes: Vec<(String, AttrTemplate)>,
        children: Vec<Instruction>,
    },
    Text(String),
    ValueOf(LocationPath),
    ApplyTemplates(Option<LocationPath>),
    ForEach {
        select: LocationPath,
        body: Vec<Instruction>,
    },
    If {
        test: TestExpr,
        body: Vec<Instruction>,
    },
}

/// An attribute value template, split into literal and expression parts.
#[derive(Debug)]
pub(crate) struct AttrTemplate(pub Vec<AvtPart>);

#[derive(Debug)]
pub(crate) enum AvtPart {
    Literal(String),
    Expr(LocationPath),
}

impl AttrTemplate {
    pub fn parse(value: &str) -> Result<Self, XsltError> {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut rest = value;
        while let Some(open) = rest.find('{') {
            if rest[open + 1..].starts_with('{') {
                literal.push_str(&rest[..=open]);
                rest = &rest[open + 2..];
                continue;
            }
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| {
                XsltError::Compilation(format!("unterminated '{{' in attribute value '{value}'"))
            })?;
            if !literal.is_empty() {
                parts.push(AvtPart::Literal(std::mem::take(&mut literal)));
            }
            parts.push(AvtPart::Expr(LocationPath::parse(&after[..close])?));
            rest = &after[close + 1..];
        }
        literal.push_str(&rest.replace("}}", "}"));
        if !literal.is_empty() {
            parts.push(AvtPart::Literal(literal));
        }
        Ok(Self(parts))
    }
}
