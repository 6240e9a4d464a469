//! JSON input files for queries and documents.

use std::{collections::BTreeMap, fs, path::Path, process::ExitCode};

use serde::Deserialize;
use serde_with::{OneOrMany, serde_as};
use sift_monitor::{FieldValue, InputDocument, MonitorQuery};

/// A document as written in a documents file.
#[serde_as]
#[derive(Debug, Deserialize)]
struct RawDocument {
    /// Document id.
    id: String,
    /// Field values; a field holds one value or an array of values.
    #[serde_as(as = "BTreeMap<_, OneOrMany<_>>")]
    #[serde(default)]
    fields: BTreeMap<String, Vec<FieldValue>>,
}

impl From<RawDocument> for InputDocument {
    fn from(raw: RawDocument) -> Self {
        raw.fields
            .into_iter()
            .flat_map(|(name, values)| values.into_iter().map(move |v| (name.clone(), v)))
            .fold(Self::builder(raw.id), |doc, (name, value)| {
                doc.field(name, value)
            })
            .build()
    }
}

/// Reads a queries file: a JSON array of `{id, query, metadata?}`.
pub fn read_queries(path: &Path) -> Result<Vec<MonitorQuery>, ExitCode> {
    let contents = read_or_failure(path)?;
    parse_queries(&contents).map_err(|e| {
        eprintln!("error: invalid queries file {}: {e}", path.display());
        ExitCode::FAILURE
    })
}

/// Reads a documents file: a JSON array of `{id, fields}`.
pub fn read_documents(path: &Path) -> Result<Vec<InputDocument>, ExitCode> {
    let contents = read_or_failure(path)?;
    parse_documents(&contents).map_err(|e| {
        eprintln!("error: invalid documents file {}: {e}", path.display());
        ExitCode::FAILURE
    })
}

/// Parses queries JSON.
fn parse_queries(contents: &str) -> serde_json::Result<Vec<MonitorQuery>> {
    serde_json::from_str(contents)
}

/// Parses documents JSON.
fn parse_documents(contents: &str) -> serde_json::Result<Vec<InputDocument>> {
    let raw: Vec<RawDocument> = serde_json::from_str(contents)?;
    Ok(raw.into_iter().map(InputDocument::from).collect())
}

/// Reads a file, exiting with a consistent error.
fn read_or_failure(path: &Path) -> Result<String, ExitCode> {
    fs::read_to_string(path).map_err(|e| {
        eprintln!("error: failed to read {}: {e}", path.display());
        ExitCode::FAILURE
    })
}
