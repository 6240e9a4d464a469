//! Field typing and value normalization.
//!
//! Both sides of a match go through [`Schema`]: query leaves when a stored
//! query is parsed, and field values when a document is analyzed.

use std::collections::BTreeMap;

use sift_config::{Config, FieldType};

use crate::{AnalysisError, Analyzer, FieldValue};

/// Field types, default field and analysis chain.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Field searched by unfielded query terms.
    default_field: String,
    /// Declared field types; undeclared fields are text.
    field_types: BTreeMap<String, FieldType>,
    /// Analysis chain for text fields.
    analyzer: Analyzer,
}

impl Default for Schema {
    fn default() -> Self {
        Self::new("text")
    }
}

impl Schema {
    /// Creates a schema with only text fields and no stemming.
    pub fn new(default_field: impl Into<String>) -> Self {
        Self {
            default_field: default_field.into(),
            field_types: BTreeMap::new(),
            analyzer: Analyzer::default(),
        }
    }

    /// Builds a schema from configuration.
    ///
    /// Fails if the configured stemmer is not supported.
    pub fn from_config(config: &Config) -> Result<Self, AnalysisError> {
        Ok(Self {
            default_field: config.analysis.default_field.clone(),
            field_types: config.fields.clone(),
            analyzer: Analyzer::from_stemmer_name(config.analysis.stemmer.as_deref())?,
        })
    }

    /// Declares the type of a field.
    pub fn with_field(mut self, field: impl Into<String>, field_type: FieldType) -> Self {
        self.field_types.insert(field.into(), field_type);
        self
    }

    /// Replaces the analysis chain.
    pub fn with_analyzer(mut self, analyzer: Analyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Returns the default field.
    pub fn default_field(&self) -> &str {
        &self.default_field
    }

    /// Returns the declared type of a field.
    pub fn field_type(&self, field: &str) -> FieldType {
        self.field_types.get(field).copied().unwrap_or_default()
    }

    /// Returns the analysis chain.
    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    /// Turns a field value into its tokens.
    ///
    /// Numbers always become a single canonical token. Text in a numeric field
    /// that parses as a number is canonicalized too; other text is analyzed.
    pub fn normalize(&self, field: &str, value: &FieldValue) -> Vec<String> {
        let field_type = self.field_type(field);
        match value {
            FieldValue::Integer(n) => vec![n.to_string()],
            FieldValue::Float(x) => vec![canonical_float(*x)],
            FieldValue::Text(text) => match field_type {
                FieldType::Text => self.analyzer.tokens(text),
                numeric => canonical_number(numeric, text)
                    .map_or_else(|| self.analyzer.tokens(text), |token| vec![token]),
            },
        }
    }
}

/// Renders a float the way an equal integer renders.
///
/// `1.0` becomes `"1"`, so integer and float values meet on the same token.
pub fn canonical_float(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    value.to_string()
}

/// Parses numeric query or document text into its canonical token.
///
/// Returns `None` if the text is not a finite number, or is fractional in an
/// integer field.
pub fn canonical_number(field_type: FieldType, text: &str) -> Option<String> {
    let text = text.trim();
    match field_type {
        FieldType::Integer => {
            if let Ok(n) = text.parse::<i64>() {
                return Some(n.to_string());
            }
            let value = text.parse::<f64>().ok().filter(|v| v.is_finite())?;
            (value.fract() == 0.0).then(|| canonical_float(value))
        }
        FieldType::Float | FieldType::Text => text
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(canonical_float),
    }
}
