//! Candidate selection.
//!
//! A [`Presearcher`] turns each stored query's [`Extraction`] into index keys,
//! and each document's terms into probe keys. The [`PresearcherIndex`] maps
//! keys back to query ids; a query is a candidate for a document when one of
//! its keys is probed. ANY extractions are indexed under [`TermKey::Any`],
//! which every probe hits.
//!
//! Selection is sound: a query that matches a document is always selected.

mod filter;
mod index;
mod match_all;
mod term;

use std::{collections::BTreeSet, fmt};

pub use filter::FieldFilter;
pub use index::PresearcherIndex;
pub use match_all::MatchAllPresearcher;
use serde::Serialize;
use sift_config::{PresearcherKind, PresearcherSettings};
pub use term::{FieldTermPresearcher, TermFilteredPresearcher};

use crate::{DocumentAnalyzer, DocumentTerms, Extraction, MonitorQuery};

/// An index key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TermKey {
    /// Always probed.
    Any,
    /// A token in any field.
    Text(String),
    /// A token in a specific field.
    FieldText {
        /// Field name.
        field: String,
        /// Token.
        text: String,
    },
}

impl fmt::Display for TermKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "ANY"),
            Self::Text(text) => write!(f, "{text}"),
            Self::FieldText { field, text } => write!(f, "{field}:{text}"),
        }
    }
}

/// What the index stores for one query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexEntry {
    /// Keys under which the query is a candidate.
    pub keys: BTreeSet<TermKey>,
    /// Tokens the document's filter field must contain, if constrained.
    pub filter: Option<BTreeSet<String>>,
}

impl IndexEntry {
    /// Creates an entry that is a candidate for every document.
    pub fn always() -> Self {
        Self {
            keys: BTreeSet::from([TermKey::Any]),
            filter: None,
        }
    }

    /// Creates an unfiltered entry from keys.
    pub fn with_keys(keys: impl IntoIterator<Item = TermKey>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
            filter: None,
        }
    }
}

/// What a document presents to the index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Probe {
    /// Keys present in the document.
    pub keys: BTreeSet<TermKey>,
    /// Tokens of the document's filter field.
    pub filter_values: BTreeSet<String>,
}

/// Decides how extractions and documents become index keys.
pub trait Presearcher: Send + Sync + fmt::Debug {
    /// Short name for diagnostics.
    fn name(&self) -> &'static str;

    /// Builds the index entry for a stored query.
    fn entry(
        &self,
        query: &MonitorQuery,
        extraction: &Extraction,
        analyzer: &dyn DocumentAnalyzer,
    ) -> IndexEntry;

    /// Builds the probe for a document.
    fn probe(&self, doc: &DocumentTerms) -> Probe;
}

/// Creates the presearcher described by configuration.
pub fn from_settings(settings: &PresearcherSettings) -> Box<dyn Presearcher> {
    let filter = settings.filter_field.as_deref().map(FieldFilter::new);
    match settings.kind {
        PresearcherKind::Term => Box::new(TermFilteredPresearcher::new(filter)),
        PresearcherKind::FieldTerm => Box::new(FieldTermPresearcher::new(filter)),
        PresearcherKind::MatchAll => Box::new(MatchAllPresearcher),
    }
}
