//! Presearcher that selects every query.

use super::{IndexEntry, Presearcher, Probe};
use crate::{DocumentAnalyzer, DocumentTerms, Extraction, MonitorQuery};

/// Makes every stored query a candidate for every document.
///
/// Equivalent to running each query against each document; useful as a
/// baseline when checking other presearchers.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchAllPresearcher;

impl Presearcher for MatchAllPresearcher {
    fn name(&self) -> &'static str {
        "match-all"
    }

    fn entry(
        &self,
        _query: &MonitorQuery,
        _extraction: &Extraction,
        _analyzer: &dyn DocumentAnalyzer,
    ) -> IndexEntry {
        IndexEntry::always()
    }

    fn probe(&self, _doc: &DocumentTerms) -> Probe {
        Probe::default()
    }
}
