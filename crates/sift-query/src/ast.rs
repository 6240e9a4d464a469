//! Query tree.
//!
//! Represents a parsed stored query. The tree is a closed set of node kinds so
//! that term extraction and exact evaluation can each be written as a single
//! exhaustive match.

use std::fmt;

/// Field name used by the match-all query syntax `*:*`.
pub const MATCH_ALL_FIELD: &str = "*";

/// How a clause participates in its enclosing boolean query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occur {
    /// The clause must match (`+clause`).
    Must,
    /// The clause may match (bare clause).
    Should,
    /// The clause must not match (`-clause` or `NOT clause`).
    MustNot,
}

impl Occur {
    /// Returns the syntax prefix for this occurrence.
    fn prefix(self) -> &'static str {
        match self {
            Self::Must => "+",
            Self::Should => "",
            Self::MustNot => "-",
        }
    }
}

/// A sub-query together with how it occurs in a boolean query.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    /// Occurrence of the clause.
    pub occur: Occur,
    /// The clause's query.
    pub query: Query,
}

impl Clause {
    /// Creates a mandatory clause.
    pub fn must(query: Query) -> Self {
        Self {
            occur: Occur::Must,
            query,
        }
    }

    /// Creates an optional clause.
    pub fn should(query: Query) -> Self {
        Self {
            occur: Occur::Should,
            query,
        }
    }

    /// Creates a prohibited clause.
    pub fn must_not(query: Query) -> Self {
        Self {
            occur: Occur::MustNot,
            query,
        }
    }
}

/// A parsed query tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// A single token that must appear in a field.
    Term {
        /// Field name.
        field: String,
        /// Token text.
        text: String,
    },

    /// Tokens that must appear consecutively in a field.
    Phrase {
        /// Field name.
        field: String,
        /// Tokens in order.
        terms: Vec<String>,
    },

    /// Any token in a field starting with a prefix (`field:pre*`).
    Prefix {
        /// Field name.
        field: String,
        /// Token prefix.
        prefix: String,
    },

    /// Matches every document (`*:*`).
    MatchAll,

    /// A list of clauses combined according to their occurrence.
    Boolean(Vec<Clause>),

    /// Boosted query. The factor is a scoring hint and does not change what matches.
    Boost {
        /// The boosted query.
        query: Box<Self>,
        /// The boost factor.
        factor: f32,
    },
}

impl Query {
    /// Creates a term query.
    pub fn term(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Term {
            field: field.into(),
            text: text.into(),
        }
    }

    /// Creates a boosted query.
    pub fn boost(query: Self, factor: f32) -> Self {
        Self::Boost {
            query: Box::new(query),
            factor,
        }
    }

    /// Returns true for a boolean query with at least one mandatory clause.
    pub fn is_conjunction(&self) -> bool {
        match self {
            Self::Boolean(clauses) => clauses.iter().any(|c| c.occur == Occur::Must),
            _ => false,
        }
    }

    /// Returns true for a non-empty boolean query made only of prohibited clauses.
    ///
    /// Such a query has no positive requirement of its own: it matches every
    /// document that none of its clauses match.
    pub fn is_all_negative(&self) -> bool {
        match self {
            Self::Boolean(clauses) => {
                !clauses.is_empty() && clauses.iter().all(|c| c.occur == Occur::MustNot)
            }
            Self::Boost { query, .. } => query.is_all_negative(),
            _ => false,
        }
    }

    /// Formats the query as a tree structure with the given indentation level.
    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let prefix = "  ".repeat(indent);
        match self {
            Self::Term { field, text } => writeln!(f, "{prefix}Term({field}:{text:?})"),
            Self::Phrase { field, terms } => writeln!(f, "{prefix}Phrase({field}:{terms:?})"),
            Self::Prefix { field, prefix: p } => writeln!(f, "{prefix}Prefix({field}:{p:?})"),
            Self::MatchAll => writeln!(f, "{prefix}MatchAll"),
            Self::Boolean(clauses) => {
                writeln!(f, "{prefix}Boolean")?;
                for clause in clauses {
                    writeln!(f, "{prefix}  {:?}", clause.occur)?;
                    clause.query.fmt_tree(f, indent + 2)?;
                }
                Ok(())
            }
            Self::Boost { query, factor } => {
                writeln!(f, "{prefix}Boost({factor})")?;
                query.fmt_tree(f, indent + 1)
            }
        }
    }

    /// Formats the query back into query syntax.
    ///
    /// Fields are always written explicitly, so the output parses back to the
    /// same tree regardless of the parser's default field.
    pub fn to_query_string(&self) -> String {
        match self {
            Self::Term { field, text } => format!("{field}:{text}"),
            Self::Phrase { field, terms } => format!("{field}:\"{}\"", terms.join(" ")),
            Self::Prefix { field, prefix } => format!("{field}:{prefix}*"),
            Self::MatchAll => "*:*".to_string(),
            Self::Boolean(clauses) => {
                let parts: Vec<String> = clauses
                    .iter()
                    .map(|c| format!("{}{}", c.occur.prefix(), c.query.to_query_string()))
                    .collect();
                format!("({})", parts.join(" "))
            }
            Self::Boost { query, factor } => format!("{}^{}", query.to_query_string(), factor),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}
