//! Exact match confirmation.
//!
//! Presearching only narrows the stored queries down to candidates. A
//! [`Matcher`] evaluates each candidate exactly against the document and
//! decides what a match reports.

use serde::Serialize;
use sift_query::{Clause, Occur, Query};

use crate::{DocumentTerms, MatchError};

/// Confirms candidate queries against a document.
pub trait Matcher: Send + Sync {
    /// Per-query payload of a confirmed match.
    type Match: Send;

    /// Evaluates one candidate. Returns `Ok(None)` if it does not match.
    fn confirm(
        &self,
        query_id: &str,
        query: &Query,
        doc: &DocumentTerms,
    ) -> Result<Option<Self::Match>, MatchError>;
}

/// A token in a document that satisfied part of a query.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Hit {
    /// Field name.
    pub field: String,
    /// Token position within the field.
    pub position: u32,
    /// The matched token.
    pub token: String,
}

/// Evaluates a query against a document, collecting hits of matched leaves.
///
/// Hits are only kept for clauses that matched; prohibited clauses never
/// contribute hits.
pub fn evaluate(query: &Query, doc: &DocumentTerms, hits: &mut Vec<Hit>) -> bool {
    match query {
        Query::Term { field, text } => {
            let Some(tokens) = doc.field(field) else {
                return false;
            };
            let before = hits.len();
            hits.extend(tokens.positions(text).map(|position| Hit {
                field: field.clone(),
                position,
                token: text.clone(),
            }));
            hits.len() > before
        }
        Query::Phrase { field, terms } => {
            let Some(tokens) = doc.field(field) else {
                return false;
            };
            let starts = tokens.phrase_positions(terms);
            for start in &starts {
                for (position, token) in (*start..).zip(terms) {
                    hits.push(Hit {
                        field: field.clone(),
                        position,
                        token: token.clone(),
                    });
                }
            }
            !starts.is_empty()
        }
        Query::Prefix { field, prefix } => {
            let Some(tokens) = doc.field(field) else {
                return false;
            };
            let before = hits.len();
            for token in tokens.with_prefix(prefix) {
                hits.extend(tokens.positions(token).map(|position| Hit {
                    field: field.clone(),
                    position,
                    token: token.clone(),
                }));
            }
            hits.len() > before
        }
        Query::MatchAll => true,
        Query::Boost { query, .. } => evaluate(query, doc, hits),
        Query::Boolean(clauses) => evaluate_boolean(clauses, doc, hits),
    }
}

/// Evaluates a boolean query.
fn evaluate_boolean(clauses: &[Clause], doc: &DocumentTerms, hits: &mut Vec<Hit>) -> bool {
    if clauses.is_empty() {
        return false;
    }

    let mut scratch = Vec::new();
    let prohibited = clauses
        .iter()
        .filter(|c| c.occur == Occur::MustNot)
        .any(|c| evaluate(&c.query, doc, &mut scratch));
    if prohibited {
        return false;
    }

    let mut local = Vec::new();
    let has_must = clauses.iter().any(|c| c.occur == Occur::Must);
    for clause in clauses.iter().filter(|c| c.occur == Occur::Must) {
        if !evaluate(&clause.query, doc, &mut local) {
            return false;
        }
    }

    let mut any_should = false;
    let mut should_matched = false;
    for clause in clauses.iter().filter(|c| c.occur == Occur::Should) {
        any_should = true;
        let mut branch = Vec::new();
        if evaluate(&clause.query, doc, &mut branch) {
            should_matched = true;
            local.append(&mut branch);
        }
    }

    // Without mandatory clauses, one optional clause must match; a query of
    // only prohibited clauses matches whatever they do not.
    let matched = has_must || should_matched || !any_should;
    if matched {
        hits.append(&mut local);
    }
    matched
}

/// Evaluates a query without collecting hits.
pub fn matches(query: &Query, doc: &DocumentTerms) -> bool {
    evaluate(query, doc, &mut Vec::new())
}

/// Payload of [`SimpleMatcher`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryMatch {
    /// Id of the matching query.
    pub query_id: String,
}

/// Reports which queries match.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleMatcher;

impl Matcher for SimpleMatcher {
    type Match = QueryMatch;

    fn confirm(
        &self,
        query_id: &str,
        query: &Query,
        doc: &DocumentTerms,
    ) -> Result<Option<Self::Match>, MatchError> {
        Ok(matches(query, doc).then(|| QueryMatch {
            query_id: query_id.to_string(),
        }))
    }
}

/// Payload of [`HighlightingMatcher`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightsMatch {
    /// Id of the matching query.
    pub query_id: String,
    /// Matched tokens, sorted by field and position.
    pub hits: Vec<Hit>,
}

/// Reports matching queries with the tokens that satisfied them.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighlightingMatcher;

impl Matcher for HighlightingMatcher {
    type Match = HighlightsMatch;

    fn confirm(
        &self,
        query_id: &str,
        query: &Query,
        doc: &DocumentTerms,
    ) -> Result<Option<Self::Match>, MatchError> {
        let mut hits = Vec::new();
        if !evaluate(query, doc, &mut hits) {
            return Ok(None);
        }
        hits.sort();
        hits.dedup();
        Ok(Some(HighlightsMatch {
            query_id: query_id.to_string(),
            hits,
        }))
    }
}
