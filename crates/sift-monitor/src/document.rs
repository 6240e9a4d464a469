//! Input documents and their analyzed terms.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    ops::Bound,
    sync::Arc,
};

use serde::{Deserialize, Serialize};

use crate::Schema;

/// Position increment between separate values of the same field.
///
/// Keeps phrases from matching across value boundaries.
const POSITION_GAP: u32 = 100;

/// A single field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Whole number.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Free text.
    Text(String),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// A document presented for matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDocument {
    /// Caller-assigned document id.
    pub id: String,
    /// Field values, in order. A field may repeat.
    pub fields: Vec<(String, FieldValue)>,
}

impl InputDocument {
    /// Starts building a document.
    pub fn builder(id: impl Into<String>) -> InputDocumentBuilder {
        InputDocumentBuilder {
            doc: Self {
                id: id.into(),
                fields: Vec::new(),
            },
        }
    }
}

/// Builder for [`InputDocument`].
#[derive(Debug, Clone)]
pub struct InputDocumentBuilder {
    /// Document under construction.
    doc: InputDocument,
}

impl InputDocumentBuilder {
    /// Adds a field value.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.doc.fields.push((name.into(), value.into()));
        self
    }

    /// Adds a text value.
    pub fn add_text(self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.field(name, FieldValue::Text(text.into()))
    }

    /// Adds an integer value.
    pub fn add_integer(self, name: impl Into<String>, value: i64) -> Self {
        self.field(name, FieldValue::Integer(value))
    }

    /// Adds a float value.
    pub fn add_float(self, name: impl Into<String>, value: f64) -> Self {
        self.field(name, FieldValue::Float(value))
    }

    /// Finishes the document.
    pub fn build(self) -> InputDocument {
        self.doc
    }
}

/// Tokens of one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTokens {
    /// `(position, token)` pairs in position order.
    tokens: Vec<(u32, String)>,
    /// Distinct tokens, for lookups and prefix scans.
    distinct: BTreeSet<String>,
}

impl FieldTokens {
    /// Appends the tokens of one value.
    fn push_value(&mut self, tokens: Vec<String>) {
        let mut position = match self.tokens.last() {
            Some((last, _)) => last + POSITION_GAP,
            None => 0,
        };
        for token in tokens {
            self.distinct.insert(token.clone());
            self.tokens.push((position, token));
            position += 1;
        }
    }

    /// Returns the `(position, token)` pairs.
    pub fn tokens(&self) -> &[(u32, String)] {
        &self.tokens
    }

    /// Returns the distinct tokens.
    pub fn distinct(&self) -> &BTreeSet<String> {
        &self.distinct
    }

    /// Returns true if the token occurs.
    pub fn contains(&self, text: &str) -> bool {
        self.distinct.contains(text)
    }

    /// Returns the positions of a token.
    pub fn positions<'a>(&'a self, text: &'a str) -> impl Iterator<Item = u32> + 'a {
        self.tokens
            .iter()
            .filter(move |(_, t)| t == text)
            .map(|(p, _)| *p)
    }

    /// Returns the tokens starting with a prefix.
    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a String> + 'a {
        self.distinct
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |t| t.starts_with(prefix))
    }

    /// Returns the start positions where the phrase occurs.
    pub fn phrase_positions(&self, terms: &[String]) -> Vec<u32> {
        if terms.is_empty() || terms.len() > self.tokens.len() {
            return Vec::new();
        }
        self.tokens
            .windows(terms.len())
            .filter(|window| {
                let start = window[0].0;
                window
                    .iter()
                    .zip(terms)
                    .enumerate()
                    .all(|(i, ((pos, token), term))| {
                        u32::try_from(i).is_ok_and(|i| *pos == start + i) && token == term
                    })
            })
            .map(|window| window[0].0)
            .collect()
    }
}

/// The analyzed terms of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentTerms {
    /// Tokens per field.
    fields: BTreeMap<String, FieldTokens>,
}

impl DocumentTerms {
    /// Creates an empty term set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the tokens of one field value.
    pub fn add(&mut self, field: impl Into<String>, tokens: Vec<String>) {
        self.fields.entry(field.into()).or_default().push_value(tokens);
    }

    /// Returns the tokens of a field.
    pub fn field(&self, field: &str) -> Option<&FieldTokens> {
        self.fields.get(field)
    }

    /// Returns true if the field contains the token.
    pub fn contains(&self, field: &str, text: &str) -> bool {
        self.field(field).is_some_and(|f| f.contains(text))
    }

    /// Returns true if the field contains the tokens consecutively.
    pub fn contains_phrase(&self, field: &str, terms: &[String]) -> bool {
        self.field(field)
            .is_some_and(|f| !f.phrase_positions(terms).is_empty())
    }

    /// Returns true if any token of the field starts with the prefix.
    pub fn has_prefix(&self, field: &str, prefix: &str) -> bool {
        self.field(field)
            .is_some_and(|f| f.with_prefix(prefix).next().is_some())
    }

    /// Returns the distinct `(field, token)` pairs.
    pub fn terms(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().flat_map(|(field, tokens)| {
            tokens
                .distinct
                .iter()
                .map(move |t| (field.as_str(), t.as_str()))
        })
    }

    /// Returns true if no field has any token.
    pub fn is_empty(&self) -> bool {
        self.fields.values().all(|f| f.tokens.is_empty())
    }
}

/// Turns documents into their term sets.
pub trait DocumentAnalyzer: Send + Sync {
    /// Analyzes every field value of a document.
    fn analyze(&self, doc: &InputDocument) -> DocumentTerms;

    /// Analyzes a single value as if it were stored in `field`.
    fn analyze_value(&self, field: &str, value: &FieldValue) -> Vec<String>;
}

/// Analyzes documents according to a [`Schema`].
#[derive(Debug, Clone, Default)]
pub struct FieldAnalyzer {
    /// Field types and analysis chain.
    schema: Arc<Schema>,
}

impl FieldAnalyzer {
    /// Creates an analyzer over a shared schema.
    pub fn new(schema: Arc<Schema>) -> Self {
        Self { schema }
    }
}

impl DocumentAnalyzer for FieldAnalyzer {
    fn analyze(&self, doc: &InputDocument) -> DocumentTerms {
        let mut terms = DocumentTerms::new();
        for (field, value) in &doc.fields {
            terms.add(field.clone(), self.schema.normalize(field, value));
        }
        terms
    }

    fn analyze_value(&self, field: &str, value: &FieldValue) -> Vec<String> {
        self.schema.normalize(field, value)
    }
}
