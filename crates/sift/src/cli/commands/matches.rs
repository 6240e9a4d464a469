//! Implementation of `sift match`.

use std::{
    collections::{BTreeMap, BTreeSet},
    process::ExitCode,
};

use comfy_table::{Cell, Table, presets::UTF8_FULL_CONDENSED};
use serde::Serialize;
use sift_monitor::{
    BatchMatches, HighlightingMatcher, HighlightsMatch, InputDocument, Matches, Monitor,
    QueryMatch, SimpleMatcher, UpdateReport,
};
use tracing::debug;

use crate::cli::{
    args::{MatchCommand, MatcherArg},
    context::CommandContext,
    input::{read_documents, read_queries},
    output::{dim, header, millis, print_json, subheader, warning},
};

/// Renders a matcher payload as table cells.
trait MatchRow {
    /// Column titles after the query id.
    const COLUMNS: &'static [&'static str];

    /// Cells after the query id.
    fn cells(&self) -> Vec<String>;
}

impl MatchRow for QueryMatch {
    const COLUMNS: &'static [&'static str] = &[];

    fn cells(&self) -> Vec<String> {
        Vec::new()
    }
}

impl MatchRow for HighlightsMatch {
    const COLUMNS: &'static [&'static str] = &["Hits"];

    fn cells(&self) -> Vec<String> {
        let hits = self
            .hits
            .iter()
            .map(|hit| format!("{}:{}@{}", hit.field, hit.token, hit.position))
            .collect::<Vec<_>>()
            .join(" ");
        vec![hits]
    }
}

/// JSON output for `sift match`.
#[derive(Serialize)]
struct JsonMatchOutput<'a, T> {
    /// Ids of registered queries.
    registered: &'a [String],
    /// Queries that failed to register, with the reason.
    failures: BTreeMap<&'a str, String>,
    /// Matches per document.
    documents: Vec<&'a Matches<T>>,
}

/// Registers queries, then matches every document against them.
///
/// Exits with failure if any query failed to register; documents are still
/// matched against the queries that did.
pub fn run(ctx: &CommandContext, cmd: &MatchCommand) -> ExitCode {
    let queries = match read_queries(&cmd.queries) {
        Ok(queries) => queries,
        Err(code) => return code,
    };
    let documents = match read_documents(&cmd.documents) {
        Ok(documents) => documents,
        Err(code) => return code,
    };

    debug!(
        queries = queries.len(),
        documents = documents.len(),
        "read input files"
    );

    let mut config = ctx.config.clone();
    if let Some(kind) = cmd.presearcher {
        config.presearcher.kind = kind.into();
    }
    let monitor = Monitor::from_config(&config);

    let report = monitor.update(queries);
    for (id, err) in &report.failures {
        eprintln!("error: query '{id}' failed to register: {err}");
    }

    let printed = match cmd.matcher {
        MatcherArg::Simple => {
            let batch = monitor.match_batch(&documents, &SimpleMatcher);
            render(cmd, &report, &documents, &batch)
        }
        MatcherArg::Highlight => {
            let batch = monitor.match_batch(&documents, &HighlightingMatcher);
            render(cmd, &report, &documents, &batch)
        }
    };

    if printed != ExitCode::SUCCESS || !report.is_ok() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Prints a batch in the requested format.
fn render<T>(
    cmd: &MatchCommand,
    report: &UpdateReport,
    documents: &[InputDocument],
    batch: &BatchMatches<T>,
) -> ExitCode
where
    T: MatchRow + Serialize,
{
    let ordered = in_input_order(documents, batch);

    if cmd.json {
        return print_json(&JsonMatchOutput {
            registered: &report.committed,
            failures: report
                .failures
                .iter()
                .map(|(id, err)| (id.as_str(), err.to_string()))
                .collect(),
            documents: ordered,
        });
    }

    for matches in ordered {
        print_document(matches);
    }

    let registered = format!("{} queries registered", report.committed.len());
    let summary = if report.is_ok() {
        registered
    } else {
        format!("{registered}, {} failed", report.failures.len())
    };
    println!("{}", subheader(&summary));
    println!(
        "{}",
        dim(&format!(
            "{} documents processed in {}",
            batch.documents.len(),
            millis(batch.elapsed)
        ))
    );
    ExitCode::SUCCESS
}

/// Returns each document's matches once, in the order documents were given.
fn in_input_order<'a, T>(
    documents: &[InputDocument],
    batch: &'a BatchMatches<T>,
) -> Vec<&'a Matches<T>> {
    let mut seen = BTreeSet::new();
    documents
        .iter()
        .filter(|doc| seen.insert(doc.id.as_str()))
        .filter_map(|doc| batch.get(&doc.id))
        .collect()
}

/// Prints the matches of one document.
fn print_document<T: MatchRow>(matches: &Matches<T>) {
    println!("{}", header(&matches.document_id));

    if matches.is_empty() {
        println!("  {}", dim("(no matches)"));
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        let mut columns = vec!["Query"];
        columns.extend_from_slice(T::COLUMNS);
        table.set_header(columns);
        for (id, payload) in &matches.matches {
            let mut row = vec![Cell::new(id)];
            row.extend(payload.cells().into_iter().map(Cell::new));
            table.add_row(row);
        }
        println!("{table}");
    }

    for (id, err) in &matches.errors {
        println!("  {}", warning(&format!("{id}: {}", err.message)));
    }
    println!(
        "  {}",
        dim(&format!(
            "{} matched, {} candidates of {} queries, {}",
            matches.len(),
            matches.candidates,
            matches.total_queries,
            millis(matches.elapsed)
        ))
    );
    println!();
}
