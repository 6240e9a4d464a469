//! Implementation of `sift check`.

use std::process::ExitCode;

use comfy_table::{Cell, Table, presets::UTF8_FULL_CONDENSED};
use sift_config::ConfigWarning;
use sift_monitor::MonitorQuery;

use crate::cli::{
    args::CheckCommand,
    context::CommandContext,
    input::read_queries,
    output::{dim, failure, header, subheader, success, warning},
};

/// Validates configuration and, if given, registers a queries file.
///
/// Exits with failure on any configuration warning or query failure.
pub fn run(ctx: &CommandContext, cmd: &CheckCommand) -> ExitCode {
    let config_ok = check_config(ctx);

    let queries_ok = match &cmd.queries {
        Some(path) => match read_queries(path) {
            Ok(queries) => check_queries(ctx, queries),
            Err(code) => return code,
        },
        None => true,
    };

    if config_ok && queries_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Reports config sources and warnings. Returns true if there are no warnings.
fn check_config(ctx: &CommandContext) -> bool {
    let config = &ctx.config;
    println!("{}", header("Configuration"));

    if config.sources.is_empty() {
        println!("  {}", dim("No configuration files found, using defaults."));
    } else {
        println!("{}", subheader("Config files (highest precedence first):"));
        for path in &config.sources {
            println!("  {}", path.display());
        }
    }
    println!();

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("{}", success("No configuration issues."));
        println!();
        return true;
    }

    println!("{}", subheader(&format!("Warnings ({}):", warnings.len())));
    for w in &warnings {
        println!("  - {}", warning(&w.to_string()));
    }
    println!();
    print_hints(&warnings);
    false
}

/// Registers queries and reports what each one extracts. Returns true if all registered.
fn check_queries(ctx: &CommandContext, queries: Vec<MonitorQuery>) -> bool {
    let monitor = ctx.monitor();
    let report = monitor.update(queries);

    println!("{}", header("Queries"));
    if !report.committed.is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec!["Query", "Indexed terms"]);
        for id in &report.committed {
            let extraction = monitor
                .query(id)
                .map(|stored| stored.extraction.to_string())
                .unwrap_or_default();
            table.add_row(vec![Cell::new(id), Cell::new(extraction)]);
        }
        println!("{table}");
    }

    for (id, err) in &report.failures {
        println!("  {} {}", failure(&format!("{id}:")), indent_error(&err.to_string()));
    }

    let summary = format!(
        "{} registered, {} failed",
        report.committed.len(),
        report.failures.len()
    );
    if report.is_ok() {
        println!("{}", success(&summary));
    } else {
        println!("{}", failure(&summary));
    }
    report.is_ok()
}

/// Indents continuation lines of a multi-line error under its id.
fn indent_error(message: &str) -> String {
    message.replace('\n', "\n    ")
}

/// Prints hints for resolving configuration warnings.
fn print_hints(warnings: &[ConfigWarning]) {
    let mut hints: Vec<&str> = warnings
        .iter()
        .map(|w| match w {
            ConfigWarning::UnknownStemmer { .. } => {
                "Set analysis.stemmer to a supported language or remove it."
            }
            ConfigWarning::NumericFilterField { .. } => {
                "Declare the filter field as text, or give queries numeric metadata values."
            }
            ConfigWarning::FilterFieldIgnored { .. } => {
                "Use the term or field-term presearcher, or remove presearcher.filter_field."
            }
            ConfigWarning::NonPositiveWeight { .. } => {
                "Weights must be greater than zero; remove the entry to use the default."
            }
        })
        .collect();
    hints.sort_unstable();
    hints.dedup();

    println!("{}", subheader("Hints:"));
    for hint in hints {
        println!("  - {hint}");
    }
}
