//! Stored-query matching for sift.
//!
//! A [`Monitor`] holds a population of registered queries and, for each
//! incoming document, reports which of them match. Rather than running every
//! query, it indexes the terms each query requires and only evaluates the
//! queries whose terms the document contains.
//!
//! The pipeline:
//!
//! 1. [`QueryParser`] turns query text into a tree, normalizing leaves through
//!    the same [`Analyzer`] used for documents.
//! 2. [`QueryAnalyzer`] extracts the terms a matching document must contain,
//!    using a [`TermWeightor`] to prefer selective terms.
//! 3. A [`Presearcher`] turns extractions into keys of a [`PresearcherIndex`],
//!    and documents into probes against it.
//! 4. A [`Matcher`] confirms each candidate exactly.
//!
//! ```
//! use sift_monitor::{InputDocument, Monitor, MonitorQuery, SimpleMatcher};
//!
//! let monitor = Monitor::default();
//! monitor
//!     .update([MonitorQuery::new("q1", "+quick +fox")])
//!     .into_result()
//!     .unwrap();
//!
//! let doc = InputDocument::builder("d1")
//!     .add_text("text", "The quick brown fox")
//!     .build();
//! let matches = monitor.match_document(&doc, &SimpleMatcher);
//! assert!(matches.contains("q1"));
//! ```

#![warn(missing_docs)]

mod analyzer;
mod document;
mod error;
mod extract;
mod matcher;
mod monitor;
mod parser;
mod presearcher;
mod schema;
mod term;
mod weight;

pub use analyzer::{Analyzer, parse_language};
pub use document::{
    DocumentAnalyzer, DocumentTerms, FieldAnalyzer, FieldTokens, FieldValue, InputDocument,
    InputDocumentBuilder,
};
pub use error::{AnalysisError, ExtractionError, MatchError, MonitorError, ParseFailure, UpdateError};
pub use extract::{Extraction, QueryAnalyzer};
pub use matcher::{
    HighlightingMatcher, HighlightsMatch, Hit, Matcher, QueryMatch, SimpleMatcher, evaluate,
    matches,
};
pub use monitor::{
    BatchMatches, Matches, Monitor, MonitorBuilder, MonitorQuery, StoredQuery, UpdateReport,
};
pub use parser::{QueryParser, StandardQueryParser};
pub use presearcher::{
    FieldFilter, FieldTermPresearcher, IndexEntry, MatchAllPresearcher, Presearcher,
    PresearcherIndex, Probe, TermFilteredPresearcher, TermKey, from_settings as presearcher_from_settings,
};
pub use schema::{Schema, canonical_float, canonical_number};
pub use term::{ANY_FIELD, QueryTerm, TermKind};
pub use weight::{
    FieldWeightNorm, TermFrequencyNorm, TermWeightNorm, TermWeightor, TokenLengthNorm, WeightNorm,
};
