//! Match patterns and the location-path subset used in `select`/`test`
//! expressions.

use crate::error::XsltError;

/// A template-rule match pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Pattern {
    /// `match="/"`
    Root,
    /// `match="/name"` (the document element itself)
    RootElement(String),
    /// `match="*"`
    AnyElement,
    /// `match="name"`
    Element(String),
    /// `match="text()"`
    Text,
}

impl Pattern {
    pub fn parse(s: &str) -> Result<Self, XsltError> {
        match s.trim() {
            "/" => Ok(Pattern::Root),
            "*" => Ok(Pattern::AnyElement),
            "text()" => Ok(Pattern::Text),
            name if !name.is_empty() && !name.contains(['[', ']', '@']) => {
                if let Some(rest) = name.strip_prefix('/') {
                    if rest.is_empty() || rest.contains('/') {
                        return Err(XsltError::Compilation(format!(
                            "unsupported match pattern '{name}'"
                        )));
                    }
                    Ok(Pattern::RootElement(rest.to_string()))
                } else if name.contains('/') {
                    Err(XsltError::Compilation(format!(
                        "unsupported match pattern '{name}'"
                    )))
                } else {
                    Ok(Pattern::Element(name.to_string()))
                }
            }
            other => Err(XsltError::Compilation(format!(
                "unsupported match pattern '{other}'"
            ))),
        }
    }

    /// Rule-selection priority; higher wins, later declaration breaks ties.
    pub fn priority(&self) -> i32 {
        match self {
            // A root-qualified name is more specific than a bare name.
            Pattern::RootElement(_) => 1,
            Pattern::Element(_) => 0,
            Pattern::Root => 0,
            Pattern::Text => 0,
            Pattern::AnyElement => -1,
        }
    }
}

/// One step of a location path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step {
    /// `.`
    Current,
    /// `name`
    Child(String),
    /// `*`
    AnyChild,
    /// `text()`
    Text,
    /// `@name` (only valid as the final step)
    Attribute(String),
}

/// A relative or absolute location path: `a/b/@c`, `.`, `text()`, `/a/b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LocationPath {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

impl LocationPath {
    pub fn parse(s: &str) -> Result<Self, XsltError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(XsltError::Compilation("empty select expression".to_string()));
        }
        if s == "." {
            return Ok(Self {
                absolute: false,
                steps: vec![Step::Current],
            });
        }
        let (absolute, rest) = match s.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let mut steps = Vec::new();
        for seg in rest.split('/') {
            if let Some(Step::Attribute(_)) = steps.last() {
                return Err(XsltError::Compilation(format!(
                    "attribute step must be last in path '{s}'"
                )));
            }
            let step = match seg {
                "" => {
                    return Err(XsltError::Compilation(format!(
                        "empty step in path '{s}'"
                    )));
                }
                "." => Step::Current,
                "*" => Step::AnyChild,
                "text()" => Step::Text,
                seg if seg.starts_with('@') => Step::Attribute(seg[1..].to_string()),
                seg => Step::Child(seg.to_string()),
            };
            steps.push(step);
        }
        Ok(Self { absolute, steps })
    }
}

/// A `test` expression: a path, optionally compared against a string
/// literal (`path = 'value'`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TestExpr {
    Exists(LocationPath),
    Equals(LocationPath, String),
}

impl TestExpr {
    pub fn parse(s: &str) -> Result<Self, XsltError> {
        if let Some((lhs, rhs)) = s.split_once('=') {
            let rhs = rhs.trim();
            let literal = rhs
                .strip_prefix('\'')
                .and_then(|r| r.strip_suffix('\''))
                .or_else(|| rhs.strip_prefix('"').and_then(|r| r.strip_suffix('"')))
                .ok_or_else(|| {
                    XsltError::Compilation(format!(
                        "right-hand side of test '{s}' must be a quoted literal"
                    ))
                })?;
            Ok(TestExpr::Equals(
                LocationPath::parse(lhs)?,
                literal.to_string(),
            ))
        } else {
            Ok(TestExpr::Exists(LocationPath::parse(s)?))
        }
    }
}
