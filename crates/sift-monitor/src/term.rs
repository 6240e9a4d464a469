//! Extracted query terms.

use std::fmt;

use serde::Serialize;

/// Field name carried by the ANY sentinel term.
pub const ANY_FIELD: &str = "__any__";

/// What an extracted term requires of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TermKind {
    /// The document must contain this token in this field.
    Exact,
    /// No specific token can be required.
    Any,
}

/// A term extracted from a stored query.
///
/// Ordered by field, then text, then kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct QueryTerm {
    /// Field name.
    pub field: String,
    /// Normalized token.
    pub text: String,
    /// Term kind.
    pub kind: TermKind,
}

impl QueryTerm {
    /// Creates an exact term.
    pub fn new(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            text: text.into(),
            kind: TermKind::Exact,
        }
    }

    /// Returns the ANY sentinel.
    pub fn any() -> Self {
        Self {
            field: ANY_FIELD.to_string(),
            text: String::new(),
            kind: TermKind::Any,
        }
    }

    /// Returns true for the ANY sentinel.
    pub fn is_any(&self) -> bool {
        self.kind == TermKind::Any
    }
}

impl fmt::Display for QueryTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TermKind::Exact => write!(f, "{}:{}", self.field, self.text),
            TermKind::Any => write!(f, "ANY"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn ordering_is_field_then_text() {
        let terms: BTreeSet<_> = [
            QueryTerm::new("b", "a"),
            QueryTerm::new("a", "z"),
            QueryTerm::new("a", "b"),
        ]
        .into_iter()
        .collect();
        let rendered: Vec<_> = terms.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["a:b", "a:z", "b:a"]);
    }

    #[test]
    fn any_sentinel() {
        let any = QueryTerm::any();
        assert!(any.is_any());
        assert_eq!(any.to_string(), "ANY");
        assert_ne!(any, QueryTerm::new(ANY_FIELD, ""));
    }
}
