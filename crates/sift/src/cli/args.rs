//! Clap argument definitions for the `sift` CLI.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use sift_config::PresearcherKind;

/// Top-level CLI options.
#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Stored-query matching - find the registered queries a document matches")]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file to use instead of discovered .sift.toml files
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// Which matcher confirms candidates.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatcherArg {
    /// Report matching query ids
    #[default]
    Simple,
    /// Report matching query ids with the matched tokens
    Highlight,
}

/// Presearcher override.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresearcherArg {
    /// Index token text only
    Term,
    /// Index field and token text
    FieldTerm,
    /// Make every query a candidate
    MatchAll,
}

impl From<PresearcherArg> for PresearcherKind {
    fn from(arg: PresearcherArg) -> Self {
        match arg {
            PresearcherArg::Term => Self::Term,
            PresearcherArg::FieldTerm => Self::FieldTerm,
            PresearcherArg::MatchAll => Self::MatchAll,
        }
    }
}

/// Arguments for `sift match`.
#[derive(Args, Debug, Clone)]
pub struct MatchCommand {
    /// JSON file holding an array of {id, query, metadata?}
    #[arg(short = 'q', long)]
    pub queries: PathBuf,

    /// JSON file holding an array of {id, fields}
    #[arg(short = 'd', long)]
    pub documents: PathBuf,

    /// Matcher used to confirm candidates
    #[arg(short = 'm', long, value_enum, default_value_t)]
    pub matcher: MatcherArg,

    /// Presearcher to use instead of the configured one
    #[arg(short = 'p', long, value_enum)]
    pub presearcher: Option<PresearcherArg>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `sift explain`.
#[derive(Args, Debug, Clone)]
pub struct ExplainCommand {
    /// Query text to analyze
    pub query: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `sift check`.
#[derive(Args, Debug, Clone)]
pub struct CheckCommand {
    /// JSON file holding an array of {id, query, metadata?}
    #[arg(short = 'q', long)]
    pub queries: Option<PathBuf>,
}

/// Arguments for `sift init`.
#[derive(Args, Debug, Clone)]
pub struct InitCommand {
    /// Overwrite an existing configuration file
    #[arg(long)]
    pub force: bool,
}

/// Supported `sift` subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Register queries and match documents against them
    Match(MatchCommand),

    /// Show the parsed tree and extracted terms of a query
    Explain(ExplainCommand),

    /// Validate configuration and check that queries register
    Check(CheckCommand),

    /// Show the effective configuration
    Config,

    /// Create a .sift.toml in the current directory
    Init(InitCommand),
}

impl Commands {
    /// Returns false for commands that must work without a valid configuration.
    pub fn needs_config(&self) -> bool {
        !matches!(self, Self::Init(_))
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn match_defaults() {
        let cli = Cli::parse_from(["sift", "match", "-q", "q.json", "-d", "d.json"]);
        let Commands::Match(cmd) = cli.command else {
            panic!("expected match");
        };
        assert_eq!(cmd.matcher, MatcherArg::Simple);
        assert_eq!(cmd.presearcher, None);
        assert!(!cmd.json);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn presearcher_names() {
        let cli = Cli::parse_from([
            "sift",
            "-vv",
            "match",
            "-q",
            "q.json",
            "-d",
            "d.json",
            "--presearcher",
            "match-all",
            "--matcher",
            "highlight",
        ]);
        let Commands::Match(cmd) = cli.command else {
            panic!("expected match");
        };
        assert_eq!(
            cmd.presearcher.map(PresearcherKind::from),
            Some(PresearcherKind::MatchAll)
        );
        assert_eq!(cmd.matcher, MatcherArg::Highlight);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn init_skips_config() {
        let cli = Cli::parse_from(["sift", "init"]);
        assert!(!cli.command.needs_config());
        let cli = Cli::parse_from(["sift", "config"]);
        assert!(cli.command.needs_config());
    }
}
