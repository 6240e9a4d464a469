//! Query term extraction.
//!
//! [`QueryAnalyzer`] walks a query tree and derives the terms a document must
//! contain for the query to possibly match it. The result is sound: every
//! document the query matches contains at least one extracted term, unless the
//! result is [`Extraction::Any`], in which case the query is a candidate for
//! every document.
//!
//! Rules, per node:
//! - term: the term itself
//! - phrase: its heaviest token, since every token is required
//! - prefix, match-all: ANY
//! - boost: the boosted query
//! - conjunction: the heaviest non-ANY result among the mandatory clauses,
//!   first encountered on ties; ANY when every mandatory clause is ANY
//! - disjunction: the union of the optional clauses, ANY if any of them is ANY
//! - all-negative or empty boolean: ANY
//!
//! Prohibited clauses never contribute terms.

use std::{collections::BTreeSet, fmt};

use sift_query::{Clause, Occur, Query};

use crate::{ExtractionError, QueryTerm, TermWeightor};

/// The terms a matching document must contain.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// No term can be required; the query is always a candidate.
    Any,
    /// A matching document contains at least one of these terms.
    Terms {
        /// Alternative terms. Never empty.
        terms: BTreeSet<QueryTerm>,
        /// Aggregate weight: the weight of the weakest term.
        weight: f32,
    },
}

impl Extraction {
    /// Creates a single-term extraction.
    pub fn single(term: QueryTerm, weight: f32) -> Self {
        Self::Terms {
            terms: BTreeSet::from([term]),
            weight,
        }
    }

    /// Returns true for ANY.
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Returns the aggregate weight. ANY weighs 0.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Any => 0.0,
            Self::Terms { weight, .. } => *weight,
        }
    }

    /// Returns the extracted terms; ANY is the single sentinel term.
    pub fn terms(&self) -> BTreeSet<QueryTerm> {
        match self {
            Self::Any => BTreeSet::from([QueryTerm::any()]),
            Self::Terms { terms, .. } => terms.clone(),
        }
    }
}

impl fmt::Display for Extraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "ANY"),
            Self::Terms { terms, weight } => {
                let rendered: Vec<String> = terms.iter().map(ToString::to_string).collect();
                write!(f, "{} (weight {weight:.3})", rendered.join(" | "))
            }
        }
    }
}

/// Derives [`Extraction`]s from query trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryAnalyzer;

impl QueryAnalyzer {
    /// Creates a query analyzer.
    pub fn new() -> Self {
        Self
    }

    /// Extracts the terms required by a query.
    ///
    /// Fails if any leaf of the tree is malformed, even one that would not
    /// contribute terms.
    pub fn analyze(
        &self,
        query: &Query,
        weightor: &TermWeightor,
    ) -> Result<Extraction, ExtractionError> {
        validate(query)?;
        Ok(extract(query, weightor))
    }

    /// Extracts the terms required by a query as a plain set.
    pub fn collect_terms(
        &self,
        query: &Query,
        weightor: &TermWeightor,
    ) -> Result<BTreeSet<QueryTerm>, ExtractionError> {
        Ok(self.analyze(query, weightor)?.terms())
    }
}

/// Rejects trees with empty fields, terms or phrases.
fn validate(query: &Query) -> Result<(), ExtractionError> {
    match query {
        Query::Term { field, text } => {
            check_field(field)?;
            if text.is_empty() {
                return Err(ExtractionError::EmptyTerm {
                    field: field.clone(),
                });
            }
            Ok(())
        }
        Query::Phrase { field, terms } => {
            check_field(field)?;
            if terms.is_empty() {
                return Err(ExtractionError::EmptyPhrase {
                    field: field.clone(),
                });
            }
            if terms.iter().any(String::is_empty) {
                return Err(ExtractionError::EmptyTerm {
                    field: field.clone(),
                });
            }
            Ok(())
        }
        Query::Prefix { field, .. } => check_field(field),
        Query::MatchAll => Ok(()),
        Query::Boolean(clauses) => clauses.iter().try_for_each(|c| validate(&c.query)),
        Query::Boost { query, .. } => validate(query),
    }
}

/// Rejects an empty field name.
fn check_field(field: &str) -> Result<(), ExtractionError> {
    if field.is_empty() {
        return Err(ExtractionError::EmptyField);
    }
    Ok(())
}

/// Extracts from a validated tree.
fn extract(query: &Query, weightor: &TermWeightor) -> Extraction {
    match query {
        Query::Term { field, text } => {
            let term = QueryTerm::new(field.as_str(), text.as_str());
            let weight = weightor.weigh(&term);
            Extraction::single(term, weight)
        }
        Query::Phrase { field, terms } => heaviest_phrase_term(field, terms, weightor),
        Query::Prefix { .. } | Query::MatchAll => Extraction::Any,
        Query::Boost { query, .. } => extract(query, weightor),
        Query::Boolean(clauses) => {
            if clauses.is_empty() || query.is_all_negative() {
                Extraction::Any
            } else if clauses.iter().any(|c| c.occur == Occur::Must) {
                conjunction(clauses, weightor)
            } else {
                disjunction(clauses, weightor)
            }
        }
    }
}

/// Picks the heaviest token of a phrase, first on ties.
fn heaviest_phrase_term(field: &str, terms: &[String], weightor: &TermWeightor) -> Extraction {
    let mut best: Option<(QueryTerm, f32)> = None;
    for text in terms {
        let term = QueryTerm::new(field, text.as_str());
        let weight = weightor.weigh(&term);
        if best.as_ref().is_none_or(|(_, w)| weight > *w) {
            best = Some((term, weight));
        }
    }
    match best {
        Some((term, weight)) => Extraction::single(term, weight),
        None => Extraction::Any,
    }
}

/// Keeps the most selective mandatory clause.
fn conjunction(clauses: &[Clause], weightor: &TermWeightor) -> Extraction {
    let mut best: Option<Extraction> = None;
    for clause in clauses.iter().filter(|c| c.occur == Occur::Must) {
        let result = extract(&clause.query, weightor);
        if result.is_any() {
            continue;
        }
        if best.as_ref().is_none_or(|b| result.weight() > b.weight()) {
            best = Some(result);
        }
    }
    best.unwrap_or(Extraction::Any)
}

/// Unions the optional clauses.
///
/// An all-negative child extracts to ANY, so it degrades the whole
/// disjunction like any other ANY child.
fn disjunction(clauses: &[Clause], weightor: &TermWeightor) -> Extraction {
    let mut terms = BTreeSet::new();
    let mut weight = f32::INFINITY;
    for clause in clauses.iter().filter(|c| c.occur == Occur::Should) {
        match extract(&clause.query, weightor) {
            Extraction::Any => return Extraction::Any,
            Extraction::Terms {
                terms: child,
                weight: w,
            } => {
                terms.extend(child);
                weight = weight.min(w);
            }
        }
    }
    Extraction::Terms { terms, weight }
}
