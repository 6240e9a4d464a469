//! Term-based presearchers.

use std::collections::BTreeSet;

use super::{FieldFilter, IndexEntry, Presearcher, Probe, TermKey};
use crate::{DocumentAnalyzer, DocumentTerms, Extraction, MonitorQuery, QueryTerm};

/// Builds the index entry shared by both term presearchers.
fn term_entry(
    extraction: &Extraction,
    key: impl Fn(&QueryTerm) -> TermKey,
    filter: Option<&FieldFilter>,
    query: &MonitorQuery,
    analyzer: &dyn DocumentAnalyzer,
) -> IndexEntry {
    let keys = match extraction {
        Extraction::Any => BTreeSet::from([TermKey::Any]),
        Extraction::Terms { terms, .. } => terms.iter().map(key).collect(),
    };
    IndexEntry {
        keys,
        filter: filter.and_then(|f| f.required(query, analyzer)),
    }
}

/// Indexes queries by token text, ignoring fields.
///
/// Coarser than [`FieldTermPresearcher`]: a token in one field selects
/// queries on the same token in any field.
#[derive(Debug, Clone, Default)]
pub struct TermFilteredPresearcher {
    /// Optional metadata filter.
    filter: Option<FieldFilter>,
}

impl TermFilteredPresearcher {
    /// Creates the presearcher.
    pub fn new(filter: Option<FieldFilter>) -> Self {
        Self { filter }
    }
}

impl Presearcher for TermFilteredPresearcher {
    fn name(&self) -> &'static str {
        "term"
    }

    fn entry(
        &self,
        query: &MonitorQuery,
        extraction: &Extraction,
        analyzer: &dyn DocumentAnalyzer,
    ) -> IndexEntry {
        term_entry(
            extraction,
            |t| TermKey::Text(t.text.clone()),
            self.filter.as_ref(),
            query,
            analyzer,
        )
    }

    fn probe(&self, doc: &DocumentTerms) -> Probe {
        Probe {
            keys: doc
                .terms()
                .map(|(_, text)| TermKey::Text(text.to_string()))
                .collect(),
            filter_values: self
                .filter
                .as_ref()
                .map(|f| f.values(doc))
                .unwrap_or_default(),
        }
    }
}

/// Indexes queries by field and token text.
#[derive(Debug, Clone, Default)]
pub struct FieldTermPresearcher {
    /// Optional metadata filter.
    filter: Option<FieldFilter>,
}

impl FieldTermPresearcher {
    /// Creates the presearcher.
    pub fn new(filter: Option<FieldFilter>) -> Self {
        Self { filter }
    }
}

impl Presearcher for FieldTermPresearcher {
    fn name(&self) -> &'static str {
        "field-term"
    }

    fn entry(
        &self,
        query: &MonitorQuery,
        extraction: &Extraction,
        analyzer: &dyn DocumentAnalyzer,
    ) -> IndexEntry {
        term_entry(
            extraction,
            |t| TermKey::FieldText {
                field: t.field.clone(),
                text: t.text.clone(),
            },
            self.filter.as_ref(),
            query,
            analyzer,
        )
    }

    fn probe(&self, doc: &DocumentTerms) -> Probe {
        Probe {
            keys: doc
                .terms()
                .map(|(field, text)| TermKey::FieldText {
                    field: field.to_string(),
                    text: text.to_string(),
                })
                .collect(),
            filter_values: self
                .filter
                .as_ref()
                .map(|f| f.values(doc))
                .unwrap_or_default(),
        }
    }
}
