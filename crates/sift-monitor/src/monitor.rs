//! The stored-query monitor.
//!
//! A [`Monitor`] owns the registered queries and the presearcher index.
//! Matching reads an immutable snapshot of both; writers build the next
//! snapshot from the current one and publish it with a pointer swap, so a
//! match never observes a partially applied update.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sift_config::Config;
use sift_query::Query;
use tracing::{debug, warn};

use crate::{
    DocumentAnalyzer, Extraction, FieldAnalyzer, FieldTermPresearcher, IndexEntry, InputDocument,
    MatchError, Matcher, MonitorError, Presearcher, PresearcherIndex, QueryAnalyzer, QueryParser,
    Schema, StandardQueryParser, TermKey, TermWeightor, UpdateError, presearcher,
};

/// A query submitted for registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorQuery {
    /// Caller-assigned id. Registering the same id again replaces the query.
    pub id: String,
    /// Query text.
    pub query: String,
    /// Opaque key/value metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl MonitorQuery {
    /// Creates a query without metadata.
    pub fn new(id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            query: query.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Adds a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A registered query.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredQuery {
    /// The query as submitted.
    pub query: MonitorQuery,
    /// Parsed query tree.
    pub tree: Query,
    /// Terms extracted from the tree.
    pub extraction: Extraction,
}

/// One published version of the monitor's contents.
#[derive(Debug, Clone, Default)]
struct MonitorState {
    /// Registered queries by id.
    queries: HashMap<String, Arc<StoredQuery>>,
    /// Presearcher index over the registered queries.
    index: PresearcherIndex,
}

/// Outcome of an update batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Ids registered by the batch, in submission order.
    pub committed: Vec<String>,
    /// Ids that failed, with the reason.
    pub failures: BTreeMap<String, MonitorError>,
}

impl UpdateReport {
    /// Returns true if every query registered.
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    /// Converts failures into an error. Committed queries stay committed.
    pub fn into_result(self) -> Result<Vec<String>, UpdateError> {
        if self.failures.is_empty() {
            Ok(self.committed)
        } else {
            Err(UpdateError {
                failures: self.failures,
            })
        }
    }
}

/// Matches of one document.
#[derive(Debug, Clone, Serialize)]
pub struct Matches<T> {
    /// Id of the document.
    pub document_id: String,
    /// Matcher payload per matching query id.
    pub matches: BTreeMap<String, T>,
    /// Candidates the matcher failed on.
    pub errors: BTreeMap<String, MatchError>,
    /// Number of candidates the presearcher selected.
    pub candidates: usize,
    /// Number of registered queries in the snapshot matched against.
    pub total_queries: usize,
    /// Time spent matching.
    #[serde(skip)]
    pub elapsed: Duration,
}

impl<T> Matches<T> {
    /// Returns the number of matching queries.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Returns true if no query matched.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Returns true if the query matched.
    pub fn contains(&self, query_id: &str) -> bool {
        self.matches.contains_key(query_id)
    }

    /// Returns the payload for a query.
    pub fn get(&self, query_id: &str) -> Option<&T> {
        self.matches.get(query_id)
    }
}

/// Matches of a batch of documents, all against the same snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct BatchMatches<T> {
    /// Matches per document id.
    pub documents: BTreeMap<String, Matches<T>>,
    /// Time spent on the whole batch.
    #[serde(skip)]
    pub elapsed: Duration,
}

impl<T> BatchMatches<T> {
    /// Returns the matches of a document.
    pub fn get(&self, document_id: &str) -> Option<&Matches<T>> {
        self.documents.get(document_id)
    }
}

/// Registers stored queries and matches documents against them.
pub struct Monitor {
    /// Turns query text into trees.
    parser: Box<dyn QueryParser>,
    /// Turns documents into terms.
    analyzer: Box<dyn DocumentAnalyzer>,
    /// Decides index and probe keys.
    presearcher: Box<dyn Presearcher>,
    /// Scores extracted terms.
    weightor: TermWeightor,
    /// Extracts terms from query trees.
    query_analyzer: QueryAnalyzer,
    /// Current published state. Loaded and stored without locking.
    state: ArcSwap<MonitorState>,
    /// Serializes writers.
    writer: Mutex<()>,
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("presearcher", &self.presearcher)
            .field("weightor", &self.weightor)
            .field("queries", &self.len())
            .finish_non_exhaustive()
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Monitor {
    /// Creates a monitor with the default document analyzer.
    pub fn new(
        parser: Box<dyn QueryParser>,
        presearcher: Box<dyn Presearcher>,
        weightor: TermWeightor,
    ) -> Self {
        Self::builder()
            .parser(parser)
            .presearcher(presearcher)
            .weightor(weightor)
            .build()
    }

    /// Starts building a monitor.
    pub fn builder() -> MonitorBuilder {
        MonitorBuilder::default()
    }

    /// Creates a monitor from configuration.
    ///
    /// An unsupported stemmer disables stemming instead of failing.
    pub fn from_config(config: &Config) -> Self {
        let schema = Schema::from_config(config).unwrap_or_else(|err| {
            warn!(%err, "stemming disabled");
            config.fields.iter().fold(
                Schema::new(config.analysis.default_field.as_str()),
                |schema, (field, field_type)| schema.with_field(field.as_str(), *field_type),
            )
        });
        Self::builder()
            .schema(schema)
            .presearcher(presearcher::from_settings(&config.presearcher))
            .weightor(TermWeightor::from_settings(&config.weighting))
            .build()
    }

    /// Returns the current snapshot.
    fn snapshot(&self) -> Arc<MonitorState> {
        self.state.load_full()
    }

    /// Parses a query and derives its index entry.
    fn prepare(&self, query: MonitorQuery) -> Result<(StoredQuery, IndexEntry), MonitorError> {
        if query.id.is_empty() {
            return Err(MonitorError::EmptyId);
        }
        let tree = self.parser.parse(&query.query)?;
        let extraction = self.query_analyzer.analyze(&tree, &self.weightor)?;
        let entry = self
            .presearcher
            .entry(&query, &extraction, self.analyzer.as_ref());
        Ok((
            StoredQuery {
                query,
                tree,
                extraction,
            },
            entry,
        ))
    }

    /// Registers or replaces queries.
    ///
    /// Every query that parses is committed in one new snapshot; the others
    /// are reported in the returned [`UpdateReport`] and leave any previously
    /// registered version in place. When a batch repeats an id, only its last
    /// occurrence is registered.
    pub fn update(&self, queries: impl IntoIterator<Item = MonitorQuery>) -> UpdateReport {
        let mut latest: Vec<MonitorQuery> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for query in queries {
            match positions.get(&query.id) {
                Some(&i) => latest[i] = query,
                None => {
                    positions.insert(query.id.clone(), latest.len());
                    latest.push(query);
                }
            }
        }

        let mut report = UpdateReport::default();
        let mut prepared = Vec::new();
        for query in latest {
            let id = query.id.clone();
            match self.prepare(query) {
                Ok(item) => prepared.push(item),
                Err(err) => {
                    warn!(id = %id, error = %err, "failed to register query");
                    report.failures.insert(id, err);
                }
            }
        }
        if prepared.is_empty() {
            return report;
        }

        let _writer = self.writer.lock();
        let mut next = MonitorState::clone(&self.snapshot());
        for (stored, entry) in prepared {
            let id = stored.query.id.clone();
            next.index.index(id.as_str(), entry);
            next.queries.insert(id.clone(), Arc::new(stored));
            report.committed.push(id);
        }
        debug!(
            committed = report.committed.len(),
            failed = report.failures.len(),
            total = next.queries.len(),
            "committed query update"
        );
        self.state.store(Arc::new(next));
        report
    }

    /// Removes queries. Returns how many were registered.
    pub fn delete<I, S>(&self, ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let _writer = self.writer.lock();
        let mut next = MonitorState::clone(&self.snapshot());
        let mut removed = 0;
        for id in ids {
            let id = id.as_ref();
            if next.queries.remove(id).is_some() {
                next.index.remove(id);
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(removed, total = next.queries.len(), "deleted queries");
            self.state.store(Arc::new(next));
        }
        removed
    }

    /// Removes every query.
    pub fn clear(&self) {
        let _writer = self.writer.lock();
        self.state.store(Arc::new(MonitorState::default()));
        debug!("cleared all queries");
    }

    /// Matches a document against the registered queries.
    pub fn match_document<M: Matcher>(&self, doc: &InputDocument, matcher: &M) -> Matches<M::Match> {
        let snapshot = self.snapshot();
        self.match_in(&snapshot, doc, matcher)
    }

    /// Matches several documents against one snapshot.
    ///
    /// A repeated document id keeps the matches of its last occurrence.
    pub fn match_batch<M: Matcher>(
        &self,
        docs: &[InputDocument],
        matcher: &M,
    ) -> BatchMatches<M::Match> {
        let start = Instant::now();
        let snapshot = self.snapshot();
        let documents = docs
            .iter()
            .map(|doc| (doc.id.clone(), self.match_in(&snapshot, doc, matcher)))
            .collect();
        BatchMatches {
            documents,
            elapsed: start.elapsed(),
        }
    }

    /// Matches a document against a snapshot.
    fn match_in<M: Matcher>(
        &self,
        snapshot: &MonitorState,
        doc: &InputDocument,
        matcher: &M,
    ) -> Matches<M::Match> {
        let start = Instant::now();
        let terms = self.analyzer.analyze(doc);
        let candidates = snapshot.index.select(&self.presearcher.probe(&terms));
        debug!(
            document = %doc.id,
            candidates = candidates.len(),
            total = snapshot.queries.len(),
            "selected candidates"
        );

        let mut matches = BTreeMap::new();
        let mut errors = BTreeMap::new();
        for id in &candidates {
            let Some(stored) = snapshot.queries.get(id) else {
                continue;
            };
            match matcher.confirm(id, &stored.tree, &terms) {
                Ok(Some(payload)) => {
                    matches.insert(id.clone(), payload);
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(document = %doc.id, query = %id, error = %err, "match failed");
                    errors.insert(id.clone(), err);
                }
            }
        }

        Matches {
            document_id: doc.id.clone(),
            matches,
            errors,
            candidates: candidates.len(),
            total_queries: snapshot.queries.len(),
            elapsed: start.elapsed(),
        }
    }

    /// Returns the candidate ids for a document with the keys that selected each.
    pub fn explain_candidates(&self, doc: &InputDocument) -> BTreeMap<String, Vec<TermKey>> {
        let snapshot = self.snapshot();
        let terms = self.analyzer.analyze(doc);
        snapshot.index.explain(&self.presearcher.probe(&terms))
    }

    /// Parses and analyzes query text without registering it.
    pub fn analyze_query(&self, text: &str) -> Result<(Query, Extraction), MonitorError> {
        let tree = self.parser.parse(text)?;
        let extraction = self.query_analyzer.analyze(&tree, &self.weightor)?;
        Ok((tree, extraction))
    }

    /// Returns a registered query.
    pub fn query(&self, id: &str) -> Option<Arc<StoredQuery>> {
        self.snapshot().queries.get(id).cloned()
    }

    /// Returns the index entry of a registered query.
    pub fn index_entry(&self, id: &str) -> Option<IndexEntry> {
        self.snapshot().index.entry(id).cloned()
    }

    /// Returns the number of registered queries.
    pub fn len(&self) -> usize {
        self.snapshot().queries.len()
    }

    /// Returns true if no query is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the registered ids, sorted.
    pub fn ids(&self) -> BTreeSet<String> {
        self.snapshot().queries.keys().cloned().collect()
    }

    /// Returns the presearcher's name.
    pub fn presearcher_name(&self) -> &'static str {
        self.presearcher.name()
    }

    /// Returns the term weightor.
    pub fn weightor(&self) -> &TermWeightor {
        &self.weightor
    }
}

/// Builder for [`Monitor`].
#[derive(Default)]
pub struct MonitorBuilder {
    /// Schema for the default parser and analyzer.
    schema: Arc<Schema>,
    /// Query parser; defaults to a [`StandardQueryParser`] over the schema.
    parser: Option<Box<dyn QueryParser>>,
    /// Document analyzer; defaults to a [`FieldAnalyzer`] over the schema.
    analyzer: Option<Box<dyn DocumentAnalyzer>>,
    /// Presearcher; defaults to [`FieldTermPresearcher`].
    presearcher: Option<Box<dyn Presearcher>>,
    /// Term weightor.
    weightor: TermWeightor,
}

impl MonitorBuilder {
    /// Sets the schema used by the default parser and analyzer.
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Arc::new(schema);
        self
    }

    /// Sets the query parser.
    pub fn parser(mut self, parser: Box<dyn QueryParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Sets the document analyzer.
    pub fn analyzer(mut self, analyzer: Box<dyn DocumentAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Sets the presearcher.
    pub fn presearcher(mut self, presearcher: Box<dyn Presearcher>) -> Self {
        self.presearcher = Some(presearcher);
        self
    }

    /// Sets the term weightor.
    pub fn weightor(mut self, weightor: TermWeightor) -> Self {
        self.weightor = weightor;
        self
    }

    /// Builds the monitor.
    pub fn build(self) -> Monitor {
        let schema = self.schema;
        Monitor {
            parser: self
                .parser
                .unwrap_or_else(|| Box::new(StandardQueryParser::new(Arc::clone(&schema)))),
            analyzer: self
                .analyzer
                .unwrap_or_else(|| Box::new(FieldAnalyzer::new(Arc::clone(&schema)))),
            presearcher: self
                .presearcher
                .unwrap_or_else(|| Box::new(FieldTermPresearcher::default())),
            weightor: self.weightor,
            query_analyzer: QueryAnalyzer::new(),
            state: ArcSwap::from_pointee(MonitorState::default()),
            writer: Mutex::new(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use sift_config::FieldType;

    use super::*;
    use crate::{ParseFailure, SimpleMatcher};

    fn monitor() -> Monitor {
        Monitor::builder()
            .schema(Schema::default().with_field("age", FieldType::Integer))
            .build()
    }

    fn doc(text: &str) -> InputDocument {
        InputDocument::builder("d").add_text("text", text).build()
    }

    #[test]
    fn monitor_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Monitor>();
    }

    #[test]
    fn update_commits_successes_and_reports_failures() {
        let monitor = monitor();
        let report = monitor.update([
            MonitorQuery::new("q1", "fox"),
            MonitorQuery::new("q2", "(unclosed"),
            MonitorQuery::new("", "fox"),
            MonitorQuery::new("q3", "age:old"),
        ]);

        assert_eq!(report.committed, vec!["q1"]);
        assert_eq!(report.failures.len(), 3);
        assert!(matches!(
            report.failures["q2"],
            MonitorError::Parse(ParseFailure::Syntax(_))
        ));
        assert_eq!(report.failures[""], MonitorError::EmptyId);
        assert!(!report.is_ok());
        assert_eq!(monitor.ids(), BTreeSet::from(["q1".to_string()]));

        let err = report.into_result().unwrap_err();
        assert_eq!(err.failures.len(), 3);
    }

    #[test]
    fn failed_reregistration_keeps_previous_version() {
        let monitor = monitor();
        monitor.update([MonitorQuery::new("q1", "fox")]);
        let report = monitor.update([MonitorQuery::new("q1", "(broken")]);

        assert!(!report.is_ok());
        assert_eq!(monitor.query("q1").unwrap().query.query, "fox");
        assert!(monitor.match_document(&doc("fox"), &SimpleMatcher).contains("q1"));
    }

    #[test]
    fn last_occurrence_in_batch_wins() {
        let monitor = monitor();
        let report = monitor.update([
            MonitorQuery::new("q1", "fox"),
            MonitorQuery::new("q2", "cat"),
            MonitorQuery::new("q1", "hound"),
        ]);

        assert_eq!(report.into_result().unwrap(), vec!["q1", "q2"]);
        assert_eq!(monitor.query("q1").unwrap().query.query, "hound");
        assert!(monitor.match_document(&doc("fox"), &SimpleMatcher).is_empty());
    }

    #[test]
    fn delete_and_clear() {
        let monitor = monitor();
        monitor.update([
            MonitorQuery::new("q1", "fox"),
            MonitorQuery::new("q2", "fox"),
            MonitorQuery::new("q3", "fox"),
        ]);

        assert_eq!(monitor.delete(["q1", "missing"]), 1);
        assert_eq!(monitor.len(), 2);
        let matches = monitor.match_document(&doc("fox"), &SimpleMatcher);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches.candidates, 2);

        monitor.clear();
        assert!(monitor.is_empty());
        assert!(monitor.index_entry("q2").is_none());
    }

    #[test]
    fn snapshots_survive_later_updates() {
        let monitor = monitor();
        monitor.update([MonitorQuery::new("q1", "fox")]);
        let before = monitor.snapshot();
        monitor.delete(["q1"]);

        assert_eq!(before.queries.len(), 1);
        assert!(monitor.is_empty());
    }

    #[test]
    fn readers_and_writers_do_not_wait_on_each_other() {
        let monitor = Arc::new(monitor());
        monitor.update([MonitorQuery::new("q1", "fox")]);

        let held = monitor.writer.lock();
        let reader = {
            let monitor = Arc::clone(&monitor);
            thread::spawn(move || monitor.match_document(&doc("fox"), &SimpleMatcher).len())
        };
        assert_eq!(reader.join().unwrap(), 1);
        drop(held);

        let pinned = monitor.snapshot();
        monitor.update([MonitorQuery::new("q2", "fox")]);
        assert_eq!(pinned.queries.len(), 1);
        assert_eq!(monitor.len(), 2);
    }

    #[test]
    fn analyze_query_does_not_register() {
        let monitor = monitor();
        let (tree, extraction) = monitor.analyze_query("+Fox +hounds").unwrap();
        assert!(tree.is_conjunction());
        assert_eq!(
            extraction.terms().iter().next().map(ToString::to_string),
            Some("text:hounds".to_string())
        );
        assert!(monitor.is_empty());
    }

    #[test]
    fn from_config_falls_back_without_stemmer() {
        let mut config = Config::default();
        config.analysis.stemmer = Some("klingon".into());
        config.fields.insert("age".into(), FieldType::Integer);
        let monitor = Monitor::from_config(&config);

        monitor.update([MonitorQuery::new("q1", "age:1.0")]).into_result().unwrap();
        let doc = InputDocument::builder("d").add_integer("age", 1).build();
        assert!(monitor.match_document(&doc, &SimpleMatcher).contains("q1"));
        assert_eq!(monitor.presearcher_name(), "field-term");
    }
}
