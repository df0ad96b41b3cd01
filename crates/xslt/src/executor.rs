//! Template execution.
//!
//! Applies the compiled rules to a source document, producing an owned
//! result-tree node list. Execution is read-only over both the program and
//! the source document, so a cached program can serve concurrent requests.

use crate::ast::{AttrTemplate, AvtPart, CompiledStylesheet, Instruction, TemplateRule};
use crate::error::XsltError;
use crate::pattern::{LocationPath, Pattern, Step, TestExpr};
use xflow_xml::{XmlDocument, XmlElement, XmlNode};

/// Guard against non-terminating apply-templates recursion.
const MAX_APPLY_DEPTH: usize = 256;

/// A borrowed view of a source-tree node during execution.
#[derive(Debug, Clone, Copy)]
enum Node<'a> {
    Root(&'a XmlDocument),
    Element(&'a XmlElement),
    Text(&'a str),
    /// An attribute value; only ever produced by a final `@name` step.
    Attribute(&'a str),
}

impl<'a> Node<'a> {
    fn string_value(&self) -> String {
        match self {
            Node::Root(doc) => doc.root.text_value(),
            Node::Element(e) => e.text_value(),
            Node::Text(t) => (*t).to_string(),
            Node::Attribute(v) => (*v).to_string(),
        }
    }

    fn children(&self) -> Vec<Node<'a>> {
        match self {
            Node::Root(doc) => vec![Node::Element(&doc.root)],
            Node::Element(e) => e
                .children
                .iter()
                .filter_map(|n| match n {
                    XmlNode::Element(e) => Some(Node::Element(e)),
                    XmlNode::Text(t) => Some(Node::Text(t)),
                    _ => None,
                })
                .collect(),
            Node::Text(_) | Node::Attribute(_) => Vec::new(),
        }
    }
}

pub(crate) struct TemplateExecutor<'a> {
    sheet: &'a CompiledStylesheet,
}

impl<'a> TemplateExecutor<'a> {
    pub fn new(sheet: &'a CompiledStylesheet) -> Self {
        Self { sheet }
    }

    pub fn run(&self, doc: &'a XmlDocument) -> Result<Vec<XmlNode>, XsltError> {
        let mut out = Vec::new();
        self.apply_to(Node::Root(doc), doc, &mut out, 0)?;
        Ok(out)
    }

    /// Applies the best matching rule to `node`, falling back to the
    /// built-in rules (recurse for root/elements, copy for text).
    fn apply_to(
        &self,
        node: Node<'a>,
        doc: &'a XmlDocument,
        out: &mut Vec<XmlNode>,
        depth: usize,
    ) -> Result<(), XsltError> {
        if depth >= MAX_APPLY_DEPTH {
            return Err(XsltError::Execution(format!(
                "apply-templates recursion deeper than {MAX_APPLY_DEPTH}"
            )));
        }
        match self.best_rule(&node, doc) {
            Some(rule) => self.execute_body(&rule.body, node, doc, out, depth),
            None => match node {
                Node::Text(t) => {
                    out.push(XmlNode::Text(t.to_string()));
                    Ok(())
                }
                Node::Attribute(v) => {
                    out.push(XmlNode::Text(v.to_string()));
                    Ok(())
                }
                _ => {
                    for child in node.children() {
                        self.apply_to(child, doc, out, depth + 1)?;
                    }
                    Ok(())
                }
            },
        }
    }

    /// Highest priority wins; among equals the later declaration wins.
    fn best_rule(&self, node: &Node<'a>, doc: &'a XmlDocument) -> Option<&'a TemplateRule> {
        let mut best: Option<&TemplateRule> = None;
        for rule in &self.sheet.rules {
            if !pattern_matches(&rule.pattern, node, doc) {
                continue;
            }
            match best {
                Some(b) if b.pattern.priority() > rule.pattern.priority() => {}
                _ => best = Some(rule),
            }
        }
        best
    }

    fn execute_body(
        &self,
        body: &'a [Instruction],
        context: Node<'a>,
        doc: &'a XmlDocument,
        out: &mut Vec<XmlNode>,
        depth: usize,
    ) -> Result<(), XsltError> {
        for instruction in body {
            match instruction {
                Instruction::Text(text) => out.push(XmlNode::Text(text.clone())),
                Instruction::ValueOf(path) => {
                    let value = evaluate(path, context, doc)
                        .first()
                        .map(Node::string_value)
                        .unwrap_or_default();
                    out.push(XmlNode::Text(value));
                }
                Instruction::ApplyTemplates(select) => {
                    let nodes = match select {
                        Some(path) => evaluate(path, context, doc),
                        None => context.children(),
                    };
                    for node in nodes {
                        self.apply_to(node, doc, out, depth + 1)?;
                    }
                }
                Instruction::ForEach { select, body } => {
                    for node in evaluate(select, context, doc) {
                        self.execute_body(body, node, doc, out, depth + 1)?;
                    }
                }
                Instruction::If { test, body } => {
                    if test_true(test, context, doc) {
                        self.execute_body(body, context, doc, out, depth + 1)?;
                    }
                }
                Instruction::Literal {
                    name,
                    attributes,
                    children,
                } => {
                    let mut elem = XmlElement::new(name.clone());
                    for (key, template) in attributes {
                        elem.attributes
                            .push((key.clone(), instantiate_avt(template, context, doc)));
                    }
                    self.execute_body(children, context, doc, &mut elem.children, depth + 1)?;
                    out.push(XmlNode::Element(elem));
                }
            }
        }
        Ok(())
    }
}

fn pattern_matches(pattern: &Pattern, node: &Node<'_>, doc: &XmlDocument) -> bool {
    match (pattern, node) {
        (Pattern::Root, Node::Root(_)) => true,
        (Pattern::AnyElement, Node::Element(_)) => true,
        (Pattern::RootElement(name), Node::Element(e)) => {
            std::ptr::eq(*e, &doc.root) && (e.name == *name || e.local_name() == name)
        }
        (Pattern::Element(name), Node::Element(e)) => {
            e.name == *name || e.local_name() == name
        }
        (Pattern::Text, Node::Text(_)) => true,
        _ => false,
    }
}

fn evaluate<'a>(path: &LocationPath, context: Node<'a>, doc: &'a XmlDocument) -> Vec<Node<'a>> {
    let mut current = if path.absolute {
        vec![Node::Root(doc)]
    } else {
        vec![context]
    };
    for step in &path.steps {
        let mut next = Vec::new();
        for node in &current {
            match step {
                Step::Current => next.push(*node),
                Step::AnyChild => {
                    next.extend(node.children().into_iter().filter(|n| matches!(n, Node::Element(_))));
                }
                Step::Text => {
                    next.extend(node.children().into_iter().filter(|n| matches!(n, Node::Text(_))));
                }
                Step::Child(name) => {
                    for child in node.children() {
                        if let Node::Element(e) = child
                            && (e.name == *name || e.local_name() == name)
                        {
                            next.push(child);
                        }
                    }
                }
                Step::Attribute(name) => {
                    if let Node::Element(e) = node
                        && let Some(value) = e.attribute(name)
                    {
                        next.push(Node::Attribute(value));
                    }
                }
            }
        }
        current = next;
    }
    current
}

fn test_true(test: &TestExpr, context: Node<'_>, doc: &XmlDocument) -> bool {
    match test {
        TestExpr::Exists(path) => !evaluate(path, context, doc).is_empty(),
        TestExpr::Equals(path, literal) => evaluate(path, context, doc)
            .first()
            .map(Node::string_value)
            .is_some_and(|v| v == *literal),
    }
}

fn instantiate_avt(template: &AttrTemplate, context: Node<'_>, doc: &XmlDocument) -> String {
    let mut out = String::new();
    for part in &template.0 {
        match part {
            AvtPart::Literal(s) => out.push_str(s),
            AvtPart::Expr(path) => {
                if let Some(node) = evaluate(path, context, doc).first() {
                    out.push_str(&node.string_value());
                }
            }
        }
    }
    out
}
