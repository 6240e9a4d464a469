//! Metadata field filter.

use std::collections::BTreeSet;

use crate::{DocumentAnalyzer, DocumentTerms, FieldValue, MonitorQuery};

/// Restricts queries to documents with a matching field value.
///
/// A query whose metadata sets the filter field is only a candidate for
/// documents whose field of the same name contains the metadata value, after
/// both go through document analysis. Queries without the key are
/// unconstrained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    /// Metadata key and document field.
    field: String,
}

impl FieldFilter {
    /// Creates a filter on a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Returns the filter field.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the tokens a document must contain for this query, if any.
    pub fn required(
        &self,
        query: &MonitorQuery,
        analyzer: &dyn DocumentAnalyzer,
    ) -> Option<BTreeSet<String>> {
        let value = query.metadata.get(&self.field)?;
        let tokens: BTreeSet<String> = analyzer
            .analyze_value(&self.field, &FieldValue::Text(value.clone()))
            .into_iter()
            .collect();
        (!tokens.is_empty()).then_some(tokens)
    }

    /// Returns the tokens of the document's filter field.
    pub fn values(&self, doc: &DocumentTerms) -> BTreeSet<String> {
        doc.field(&self.field)
            .map(|f| f.distinct().clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{FieldAnalyzer, InputDocument, Schema};

    #[test]
    fn required_tokens_are_analyzed() {
        let analyzer = FieldAnalyzer::new(Arc::new(Schema::default()));
        let filter = FieldFilter::new("language");

        let query = MonitorQuery::new("q", "fox").with_metadata("language", "EN");
        assert_eq!(
            filter.required(&query, &analyzer),
            Some(BTreeSet::from(["en".to_string()]))
        );

        let unconstrained = MonitorQuery::new("q", "fox");
        assert_eq!(filter.required(&unconstrained, &analyzer), None);

        let blank = MonitorQuery::new("q", "fox").with_metadata("language", " ");
        assert_eq!(filter.required(&blank, &analyzer), None);
    }

    #[test]
    fn document_values() {
        let analyzer = FieldAnalyzer::new(Arc::new(Schema::default()));
        let doc = InputDocument::builder("d")
            .add_text("language", "en")
            .add_text("text", "fox")
            .build();
        let terms = analyzer.analyze(&doc);

        assert_eq!(
            FieldFilter::new("language").values(&terms),
            BTreeSet::from(["en".to_string()])
        );
        assert!(FieldFilter::new("region").values(&terms).is_empty());
    }
}
