//! Implementation of `sift explain`.

use std::process::ExitCode;

use comfy_table::{Cell, Table, presets::UTF8_FULL_CONDENSED};
use serde::Serialize;
use sift_monitor::{Extraction, TermWeightor};

use crate::cli::{
    args::ExplainCommand,
    context::CommandContext,
    output::{dim, indent, print_json, subheader},
};

/// JSON form of one extracted term.
#[derive(Serialize)]
struct JsonTerm {
    /// Field name.
    field: String,
    /// Token text.
    text: String,
    /// Term weight.
    weight: f32,
}

/// JSON output for `sift explain`.
#[derive(Serialize)]
struct JsonExplain {
    /// The query as written.
    query: String,
    /// The normalized query in query syntax.
    parsed: String,
    /// True if the query is a candidate for every document.
    any: bool,
    /// Aggregate weight of the extraction.
    weight: f32,
    /// Extracted terms; empty for ANY.
    terms: Vec<JsonTerm>,
}

/// Shows how a query parses and which terms the presearcher indexes.
pub fn run(ctx: &CommandContext, cmd: &ExplainCommand) -> ExitCode {
    let monitor = ctx.monitor();
    let (tree, extraction) = match monitor.analyze_query(&cmd.query) {
        Ok(analyzed) => analyzed,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cmd.json {
        return print_json(&JsonExplain {
            query: cmd.query.clone(),
            parsed: tree.to_query_string(),
            any: extraction.is_any(),
            weight: extraction.weight(),
            terms: json_terms(&extraction, monitor.weightor()),
        });
    }

    println!("{}", subheader("Query tree:"));
    println!("{}", indent(&tree.to_string()));
    println!();

    println!("{}", subheader("Extracted terms:"));
    match &extraction {
        Extraction::Any => {
            println!("  ANY {}", dim("(candidate for every document)"));
        }
        Extraction::Terms { terms, weight } => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL_CONDENSED);
            table.set_header(vec!["Field", "Term", "Weight"]);
            for term in terms {
                table.add_row(vec![
                    Cell::new(&term.field),
                    Cell::new(&term.text),
                    Cell::new(format!("{:.3}", monitor.weightor().weigh(term))),
                ]);
            }
            println!("{table}");
            println!("{} {weight:.3}", dim("aggregate weight:"));
        }
    }
    println!();
    println!("{} {}", dim("presearcher:"), monitor.presearcher_name());

    ExitCode::SUCCESS
}

/// Collects extracted terms with their individual weights.
fn json_terms(extraction: &Extraction, weightor: &TermWeightor) -> Vec<JsonTerm> {
    match extraction {
        Extraction::Any => Vec::new(),
        Extraction::Terms { terms, .. } => terms
            .iter()
            .map(|term| JsonTerm {
                field: term.field.clone(),
                text: term.text.clone(),
                weight: weightor.weigh(term),
            })
            .collect(),
    }
}
