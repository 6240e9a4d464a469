//! Implementation of `sift config`.

use std::process::ExitCode;

use crate::cli::{
    context::CommandContext,
    output::{Highlighter, dim},
};

/// Shows the effective configuration, preceded by the files it was merged from.
pub fn run(ctx: &CommandContext) -> ExitCode {
    let toml = match ctx.config.to_toml() {
        Ok(toml) => toml,
        Err(e) => {
            eprintln!("error: failed to serialize configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    for path in &ctx.config.sources {
        println!("{}", dim(&format!("# {}", path.display())));
    }
    print!("{}", Highlighter::new().highlight_toml(&toml));
    ExitCode::SUCCESS
}
