//! Error types for query lexing and parsing.

use std::fmt::Write;

use thiserror::Error;

/// Lexer error with position information.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("query syntax error: {message}\n  {input}\n  {}^", caret_pad(.position))]
pub struct LexError {
    /// Error message.
    pub message: String,
    /// Byte position in input where error occurred.
    pub position: usize,
    /// The original input string.
    pub input: String,
}

impl LexError {
    /// Creates a new lexer error.
    pub fn new(message: impl Into<String>, position: usize, input: &str) -> Self {
        Self {
            message: message.into(),
            position,
            input: input.to_string(),
        }
    }
}

/// Spaces that put a caret under byte `position`.
fn caret_pad(position: &usize) -> String {
    " ".repeat(*position)
}

/// Parse error with the byte position of the offending token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    /// Error message.
    pub message: String,
    /// Byte position of the token where the error occurred (if any).
    pub position: Option<usize>,
}

impl ParseError {
    /// Creates a new parse error.
    pub fn new(message: impl Into<String>, position: Option<usize>) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// A unified error type for query parsing.
///
/// Carries the original query string so that the error can be rendered with a
/// position indicator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render(.kind, .query.as_deref()))]
pub struct QueryError {
    /// The kind of error that occurred.
    pub kind: QueryErrorKind,
    /// The original query string (if available).
    pub query: Option<String>,
}

/// The specific kind of query error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Lexer error (tokenization failed).
    Lex {
        /// Error message.
        message: String,
        /// Byte position in input.
        position: usize,
    },
    /// Parser error (invalid syntax).
    Parse {
        /// Error message.
        message: String,
        /// Byte position in input (if available).
        position: Option<usize>,
    },
}

impl QueryErrorKind {
    /// Returns the error message.
    pub fn message(&self) -> &str {
        match self {
            Self::Lex { message, .. } | Self::Parse { message, .. } => message,
        }
    }

    /// Returns the byte position of the error, if known.
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::Lex { position, .. } => Some(*position),
            Self::Parse { position, .. } => *position,
        }
    }

    /// Returns a suggestion for common errors.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Lex { message, .. } if message.contains("unclosed quote") => {
                Some("Add a closing quote (\") to complete the phrase")
            }
            Self::Parse { message, .. } if message.contains("closing parenthesis") => {
                Some("Add a closing parenthesis ) to match the opening one")
            }
            Self::Parse { message, .. } if message.contains("AND") => {
                Some("AND requires clauses on both sides, e.g., 'title:rust AND body:async'")
            }
            Self::Parse { message, .. } if message.contains("after field") => {
                Some("Field queries look like field:value, field:\"a phrase\" or field:(a b)")
            }
            Self::Parse { message, .. } if message.contains("nested too deeply") => {
                Some("Flatten redundant parentheses")
            }
            _ => None,
        }
    }
}

/// Renders an error with the query, a caret under the position, and a hint.
fn render(kind: &QueryErrorKind, query: Option<&str>) -> String {
    let mut out = format!("query syntax error: {}\n", kind.message());

    if let Some(query) = query {
        let _ = writeln!(out, "  {query}");
        if let Some(pos) = kind.position() {
            let clamped = pos.min(query.len());
            let _ = writeln!(out, "  {}^", " ".repeat(clamped));
        }
    }

    if let Some(suggestion) = kind.suggestion() {
        let _ = write!(out, "hint: {suggestion}");
    }

    out
}

impl QueryError {
    /// Creates a lex error.
    pub fn lex(message: impl Into<String>, position: usize, query: impl Into<String>) -> Self {
        Self {
            kind: QueryErrorKind::Lex {
                message: message.into(),
                position,
            },
            query: Some(query.into()),
        }
    }

    /// Creates a parse error.
    pub fn parse(
        message: impl Into<String>,
        position: Option<usize>,
        query: Option<String>,
    ) -> Self {
        Self {
            kind: QueryErrorKind::Parse {
                message: message.into(),
                position,
            },
            query,
        }
    }

    /// Sets the query string for this error.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Returns the error message without context.
    pub fn message(&self) -> &str {
        self.kind.message()
    }

    /// Returns the byte position of the error, if known.
    pub fn position(&self) -> Option<usize> {
        self.kind.position()
    }

    /// Returns a suggestion for common errors.
    pub fn suggestion(&self) -> Option<&'static str> {
        self.kind.suggestion()
    }
}

impl From<LexError> for QueryError {
    fn from(err: LexError) -> Self {
        Self {
            kind: QueryErrorKind::Lex {
                message: err.message,
                position: err.position,
            },
            query: Some(err.input),
        }
    }
}

impl From<ParseError> for QueryError {
    fn from(err: ParseError) -> Self {
        Self {
            kind: QueryErrorKind::Parse {
                message: err.message,
                position: err.position,
            },
            query: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_error_display() {
        let err = QueryError::lex("unclosed quote", 0, "\"hello world");
        let display = err.to_string();
        assert!(display.contains("unclosed quote"));
        assert!(display.contains("\"hello world"));
        assert!(display.contains("^"));
        assert!(display.contains("hint:"));
    }

    #[test]
    fn parse_error_display() {
        let err = QueryError::parse(
            "expected closing parenthesis",
            Some(5),
            Some("(rust".to_string()),
        );
        let display = err.to_string();
        assert!(display.contains("expected closing parenthesis"));
        assert!(display.contains("(rust"));
        assert!(display.contains("     ^"));
        assert!(display.contains("hint:"));
    }

    #[test]
    fn error_with_query() {
        let err = QueryError::parse("test error", None, None).with_query("xyz:value");
        assert_eq!(err.query.as_deref(), Some("xyz:value"));
    }

    #[test]
    fn message_extraction() {
        let err = QueryError::lex("test message", 0, "query");
        assert_eq!(err.message(), "test message");
        assert_eq!(err.position(), Some(0));
    }

    #[test]
    fn lex_error_points_at_position() {
        let err = LexError::new("unclosed quote", 2, "a \"b");
        assert_eq!(
            err.to_string(),
            "query syntax error: unclosed quote\n  a \"b\n    ^"
        );
        let unified = QueryError::from(err);
        assert_eq!(unified.position(), Some(2));
        assert_eq!(unified.query.as_deref(), Some("a \"b"));
    }

    #[test]
    fn parse_error_keeps_position() {
        let err = QueryError::from(ParseError::new("unexpected token", Some(7)));
        assert_eq!(err.position(), Some(7));
        assert!(err.query.is_none());
    }

    #[test]
    fn field_error_suggestion() {
        let err = QueryError::parse("expected a value after field 'title:'", None, None);
        assert!(err.suggestion().unwrap().contains("field:value"));
    }
}
