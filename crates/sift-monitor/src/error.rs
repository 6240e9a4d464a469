//! Error types for the sift-monitor crate.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;
use sift_config::FieldType;
use sift_query::QueryError;
use thiserror::Error;

/// Invalid analysis configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// The stemmer language is not supported.
    #[error("unsupported stemmer language: {0}")]
    InvalidLanguage(String),
}

/// A stored query's text could not be turned into a query tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    /// The query text is not valid syntax.
    #[error("{0}")]
    Syntax(#[from] QueryError),

    /// The query text contains no clauses.
    #[error("query is empty")]
    Empty,

    /// A term produced no tokens after analysis.
    #[error("term '{text}' in field '{field}' produces no tokens")]
    NoTokens {
        /// Field of the term.
        field: String,
        /// Original term text.
        text: String,
    },

    /// A value in a numeric field is not a number.
    #[error("'{text}' is not a valid {field_type} for field '{field}'")]
    InvalidNumber {
        /// Field of the value.
        field: String,
        /// Original value text.
        text: String,
        /// Declared type of the field.
        field_type: FieldType,
    },

    /// Numeric fields only hold single values.
    #[error("{construct} queries are not supported on {field_type} field '{field}'")]
    UnsupportedOnNumeric {
        /// Field of the query.
        field: String,
        /// Declared type of the field.
        field_type: FieldType,
        /// Query construct (phrase, prefix).
        construct: &'static str,
    },
}

/// Term extraction hit a malformed query tree.
///
/// Trees produced by the parser never trigger this; it indicates a tree built
/// by hand with empty leaves.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// A leaf has an empty field name.
    #[error("query leaf has an empty field name")]
    EmptyField,

    /// A term has empty text.
    #[error("term in field '{field}' has empty text")]
    EmptyTerm {
        /// Field of the term.
        field: String,
    },

    /// A phrase has no terms.
    #[error("phrase in field '{field}' has no terms")]
    EmptyPhrase {
        /// Field of the phrase.
        field: String,
    },
}

/// A matcher failed while confirming one candidate query.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("failed to match query {query_id}: {message}")]
pub struct MatchError {
    /// Id of the candidate query.
    pub query_id: String,
    /// What went wrong.
    pub message: String,
}

impl MatchError {
    /// Creates a match error for a query id.
    pub fn new(query_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            query_id: query_id.into(),
            message: message.into(),
        }
    }
}

/// Why a single query in an update batch was not registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorError {
    /// The query id is empty.
    #[error("query id must not be empty")]
    EmptyId,

    /// The query text could not be parsed.
    #[error("failed to parse query: {0}")]
    Parse(#[from] ParseFailure),

    /// Term extraction failed.
    #[error("failed to extract terms: {0}")]
    Extraction(#[from] ExtractionError),
}

/// Aggregate failure of an update batch.
///
/// Queries that did not fail were still committed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct UpdateError {
    /// Failures keyed by query id.
    pub failures: BTreeMap<String, MonitorError>,
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} queries failed to register", self.failures.len())?;
        for (id, error) in &self.failures {
            write!(f, "\n  {id}: {error}")?;
        }
        Ok(())
    }
}
