//! Stored query parsing.
//!
//! Turns query text into a tree whose leaves hold tokens as the document
//! analysis chain would produce them.

use std::sync::Arc;

use sift_config::FieldType;
use sift_query::{Clause, Query};

use crate::{ParseFailure, Schema, schema::canonical_number};

/// Turns stored query text into a query tree.
pub trait QueryParser: Send + Sync {
    /// Parses query text.
    fn parse(&self, text: &str) -> Result<Query, ParseFailure>;
}

/// Parses query syntax and normalizes leaves through a [`Schema`].
///
/// - text leaves are analyzed: several tokens become a phrase, none is an error
/// - numeric leaves are rendered canonically (`1.0` becomes `1`)
/// - prefixes are lowercased but not stemmed
#[derive(Debug, Clone, Default)]
pub struct StandardQueryParser {
    /// Field types and analysis chain.
    schema: Arc<Schema>,
}

impl StandardQueryParser {
    /// Creates a parser over a shared schema.
    pub fn new(schema: Arc<Schema>) -> Self {
        Self { schema }
    }

    /// Normalizes every leaf of a tree.
    fn normalize(&self, query: Query) -> Result<Query, ParseFailure> {
        match query {
            Query::Term { field, text } => self.normalize_term(field, &text),
            Query::Phrase { field, terms } => self.normalize_phrase(field, &terms),
            Query::Prefix { field, prefix } => match self.schema.field_type(&field) {
                FieldType::Text => Ok(Query::Prefix {
                    field,
                    prefix: prefix.to_lowercase(),
                }),
                field_type => Err(ParseFailure::UnsupportedOnNumeric {
                    field,
                    field_type,
                    construct: "prefix",
                }),
            },
            Query::MatchAll => Ok(Query::MatchAll),
            Query::Boolean(clauses) => clauses
                .into_iter()
                .map(|c| {
                    Ok(Clause {
                        occur: c.occur,
                        query: self.normalize(c.query)?,
                    })
                })
                .collect::<Result<Vec<_>, ParseFailure>>()
                .map(Query::Boolean),
            Query::Boost { query, factor } => Ok(Query::boost(self.normalize(*query)?, factor)),
        }
    }

    /// Normalizes a single term.
    fn normalize_term(&self, field: String, text: &str) -> Result<Query, ParseFailure> {
        match self.schema.field_type(&field) {
            FieldType::Text => self.analyzed(field, text),
            field_type => match canonical_number(field_type, text) {
                Some(token) => Ok(Query::term(field, token)),
                None => Err(ParseFailure::InvalidNumber {
                    field,
                    text: text.to_string(),
                    field_type,
                }),
            },
        }
    }

    /// Normalizes a phrase by re-analyzing its text.
    fn normalize_phrase(&self, field: String, terms: &[String]) -> Result<Query, ParseFailure> {
        match self.schema.field_type(&field) {
            FieldType::Text => self.analyzed(field, &terms.join(" ")),
            field_type => Err(ParseFailure::UnsupportedOnNumeric {
                field,
                field_type,
                construct: "phrase",
            }),
        }
    }

    /// Builds a term or phrase from the analyzed tokens of `text`.
    fn analyzed(&self, field: String, text: &str) -> Result<Query, ParseFailure> {
        let mut tokens = self.schema.analyzer().tokens(text);
        match tokens.len() {
            0 => Err(ParseFailure::NoTokens {
                field,
                text: text.to_string(),
            }),
            1 => Ok(Query::term(field, tokens.remove(0))),
            _ => Ok(Query::Phrase {
                field,
                terms: tokens,
            }),
        }
    }
}

impl QueryParser for StandardQueryParser {
    fn parse(&self, text: &str) -> Result<Query, ParseFailure> {
        let query =
            sift_query::parse(text, self.schema.default_field())?.ok_or(ParseFailure::Empty)?;
        self.normalize(query)
    }
}
