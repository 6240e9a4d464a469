//! Inverted index from keys to query ids.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    iter,
    sync::Arc,
};

use super::{IndexEntry, Probe, TermKey};

/// Maps index keys to the ids of the queries registered under them.
///
/// Cloning is cheap: posting lists are shared and copied only when a clone
/// modifies them, so each monitor commit clones the index, applies its
/// changes, and publishes the result as a new snapshot.
#[derive(Debug, Clone, Default)]
pub struct PresearcherIndex {
    /// Query ids per key.
    postings: HashMap<TermKey, Arc<BTreeSet<String>>>,
    /// Entry per query id, so removal only touches that query's keys.
    entries: HashMap<String, Arc<IndexEntry>>,
}

impl PresearcherIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from scratch.
    pub fn rebuild(entries: impl IntoIterator<Item = (String, IndexEntry)>) -> Self {
        let mut index = Self::new();
        for (id, entry) in entries {
            index.index(id, entry);
        }
        index
    }

    /// Registers a query, replacing any previous entry for the id.
    pub fn index(&mut self, id: impl Into<String>, entry: IndexEntry) {
        let id = id.into();
        self.remove(&id);
        for key in &entry.keys {
            let posting = self.postings.entry(key.clone()).or_default();
            Arc::make_mut(posting).insert(id.clone());
        }
        self.entries.insert(id, Arc::new(entry));
    }

    /// Removes a query. Returns false if the id was not indexed.
    pub fn remove(&mut self, id: &str) -> bool {
        let Some(entry) = self.entries.remove(id) else {
            return false;
        };
        for key in &entry.keys {
            let emptied = match self.postings.get_mut(key) {
                Some(posting) => {
                    let ids = Arc::make_mut(posting);
                    ids.remove(id);
                    ids.is_empty()
                }
                None => false,
            };
            if emptied {
                self.postings.remove(key);
            }
        }
        true
    }

    /// Returns the entry of an indexed query.
    pub fn entry(&self, id: &str) -> Option<&IndexEntry> {
        self.entries.get(id).map(AsRef::as_ref)
    }

    /// Returns the ids of the queries that may match the probed document.
    pub fn select(&self, probe: &Probe) -> BTreeSet<String> {
        self.explain(probe).into_keys().collect()
    }

    /// Returns each candidate id with the keys that selected it.
    pub fn explain(&self, probe: &Probe) -> BTreeMap<String, Vec<TermKey>> {
        let mut hits: BTreeMap<String, Vec<TermKey>> = BTreeMap::new();
        let keys = probe.keys.iter().filter(|k| **k != TermKey::Any);
        for key in iter::once(&TermKey::Any).chain(keys) {
            let Some(posting) = self.postings.get(key) else {
                continue;
            };
            for id in posting.iter() {
                if self.passes_filter(id, probe) {
                    hits.entry(id.clone()).or_default().push(key.clone());
                }
            }
        }
        hits
    }

    /// Returns true if the query's filter, if any, is satisfied by the probe.
    fn passes_filter(&self, id: &str, probe: &Probe) -> bool {
        match self.entries.get(id).and_then(|e| e.filter.as_ref()) {
            Some(required) => required.is_subset(&probe.filter_values),
            None => true,
        }
    }

    /// Returns the number of indexed queries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no query is indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of distinct keys.
    pub fn key_count(&self) -> usize {
        self.postings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(t: &str) -> TermKey {
        TermKey::Text(t.to_string())
    }

    fn probe(keys: &[&str]) -> Probe {
        Probe {
            keys: keys.iter().map(|k| text(k)).collect(),
            filter_values: BTreeSet::new(),
        }
    }

    fn ids(set: &BTreeSet<String>) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    #[test]
    fn selects_intersecting_and_any() {
        let mut index = PresearcherIndex::new();
        index.index("q1", IndexEntry::with_keys([text("a"), text("b")]));
        index.index("q2", IndexEntry::with_keys([text("c")]));
        index.index("q3", IndexEntry::always());

        assert_eq!(ids(&index.select(&probe(&["b"]))), vec!["q1", "q3"]);
        assert_eq!(ids(&index.select(&probe(&["c", "z"]))), vec!["q2", "q3"]);
        assert_eq!(ids(&index.select(&probe(&[]))), vec!["q3"]);
    }

    #[test]
    fn reindex_replaces_entry() {
        let mut index = PresearcherIndex::new();
        index.index("q1", IndexEntry::with_keys([text("a")]));
        index.index("q1", IndexEntry::with_keys([text("b")]));

        assert!(index.select(&probe(&["a"])).is_empty());
        assert_eq!(ids(&index.select(&probe(&["b"]))), vec!["q1"]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.key_count(), 1);
    }

    #[test]
    fn reindex_same_entry_is_idempotent() {
        let mut once = PresearcherIndex::new();
        once.index("q1", IndexEntry::with_keys([text("a")]));
        let mut twice = once.clone();
        twice.index("q1", IndexEntry::with_keys([text("a")]));

        assert_eq!(once.len(), twice.len());
        assert_eq!(once.key_count(), twice.key_count());
        assert_eq!(
            once.explain(&probe(&["a"])),
            twice.explain(&probe(&["a"]))
        );
    }

    #[test]
    fn remove_drops_empty_postings() {
        let mut index = PresearcherIndex::new();
        index.index("q1", IndexEntry::with_keys([text("a"), text("b")]));
        index.index("q2", IndexEntry::with_keys([text("b")]));

        assert!(index.remove("q1"));
        assert!(!index.remove("q1"));
        assert_eq!(index.key_count(), 1);
        assert_eq!(ids(&index.select(&probe(&["a", "b"]))), vec!["q2"]);
    }

    #[test]
    fn clones_are_isolated() {
        let mut index = PresearcherIndex::new();
        index.index("q1", IndexEntry::with_keys([text("a")]));
        let snapshot = index.clone();
        index.index("q2", IndexEntry::with_keys([text("a")]));
        index.remove("q1");

        assert_eq!(ids(&snapshot.select(&probe(&["a"]))), vec!["q1"]);
        assert_eq!(ids(&index.select(&probe(&["a"]))), vec!["q2"]);
    }

    #[test]
    fn filter_requires_values() {
        let mut index = PresearcherIndex::new();
        let mut filtered = IndexEntry::with_keys([text("a")]);
        filtered.filter = Some(BTreeSet::from(["en".to_string()]));
        index.index("q1", filtered);
        index.index("q2", IndexEntry::with_keys([text("a")]));

        let mut english = probe(&["a"]);
        english.filter_values.insert("en".into());
        assert_eq!(ids(&index.select(&english)), vec!["q1", "q2"]);

        let mut german = probe(&["a"]);
        german.filter_values.insert("de".into());
        assert_eq!(ids(&index.select(&german)), vec!["q2"]);
    }

    #[test]
    fn explain_lists_selecting_keys() {
        let mut index = PresearcherIndex::new();
        index.index("q1", IndexEntry::with_keys([text("a"), text("b")]));
        index.index("q2", IndexEntry::always());

        let explained = index.explain(&probe(&["a", "b"]));
        assert_eq!(explained["q1"], vec![text("a"), text("b")]);
        assert_eq!(explained["q2"], vec![TermKey::Any]);
    }

    #[test]
    fn rebuild_matches_incremental() {
        let entries = vec![
            ("q1".to_string(), IndexEntry::with_keys([text("a")])),
            ("q2".to_string(), IndexEntry::with_keys([text("a"), text("b")])),
            ("q3".to_string(), IndexEntry::always()),
        ];
        let mut incremental = PresearcherIndex::new();
        incremental.index("q1", IndexEntry::with_keys([text("z")]));
        incremental.index("gone", IndexEntry::with_keys([text("a")]));
        for (id, entry) in entries.clone() {
            incremental.index(id, entry);
        }
        incremental.remove("gone");

        let rebuilt = PresearcherIndex::rebuild(entries);
        let probes: [&[&str]; 4] = [&["a"], &["b"], &["z"], &[]];
        for keys in probes {
            assert_eq!(incremental.select(&probe(keys)), rebuilt.select(&probe(keys)));
        }
        assert_eq!(incremental.key_count(), rebuilt.key_count());
    }
}
