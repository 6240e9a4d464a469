//! Terminal styling and syntax highlighting for CLI output.

use std::{process::ExitCode, time::Duration};

use serde::Serialize;
use syntect::{
    easy::HighlightLines,
    highlighting::Style,
    parsing::SyntaxSet,
    util::{LinesWithEndings, as_24_bit_terminal_escaped},
};
use two_face::{
    syntax::extra_newlines as extra_syntaxes,
    theme::{EmbeddedLazyThemeSet, EmbeddedThemeName, extra as extra_themes},
};

/// ANSI color codes for terminal output.
pub mod colors {
    /// Bold text.
    pub const BOLD: &str = "\x1b[1m";
    /// Cyan text (for headers).
    pub const CYAN: &str = "\x1b[36m";
    /// Green text (for success).
    pub const GREEN: &str = "\x1b[32m";
    /// Yellow text (for warnings).
    pub const YELLOW: &str = "\x1b[33m";
    /// Red text (for errors).
    pub const RED: &str = "\x1b[31m";
    /// Dim/gray text (for less important info).
    pub const DIM: &str = "\x1b[2m";
    /// Reset all formatting.
    pub const RESET: &str = "\x1b[0m";
}

/// Formats a header with bold cyan styling.
pub fn header(text: &str) -> String {
    format!("{}{}{}{}", colors::BOLD, colors::CYAN, text, colors::RESET)
}

/// Formats text as a subheader (bold).
pub fn subheader(text: &str) -> String {
    format!("{}{}{}", colors::BOLD, text, colors::RESET)
}

/// Formats text as dimmed/less important.
pub fn dim(text: &str) -> String {
    format!("{}{}{}", colors::DIM, text, colors::RESET)
}

/// Formats text as a success message (green).
pub fn success(text: &str) -> String {
    format!("{}{}{}", colors::GREEN, text, colors::RESET)
}

/// Formats text as a warning (yellow).
pub fn warning(text: &str) -> String {
    format!("{}{}{}", colors::YELLOW, text, colors::RESET)
}

/// Formats text as an error (red).
pub fn failure(text: &str) -> String {
    format!("{}{}{}", colors::RED, text, colors::RESET)
}

/// Indents every line of `text` by two spaces.
pub fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Formats a duration in milliseconds.
pub fn millis(elapsed: Duration) -> String {
    format!("{:.2}ms", elapsed.as_secs_f64() * 1000.0)
}

/// Prints a value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to serialize JSON: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Highlights TOML for terminal output.
pub struct Highlighter {
    /// Syntax definitions, including TOML from the two-face extras.
    syntax_set: SyntaxSet,
    /// Embedded color themes.
    theme_set: EmbeddedLazyThemeSet,
    /// Theme in use.
    theme: EmbeddedThemeName,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter {
    /// Creates a highlighter with the Dracula theme.
    pub fn new() -> Self {
        Self {
            syntax_set: extra_syntaxes(),
            theme_set: extra_themes(),
            theme: EmbeddedThemeName::Dracula,
        }
    }

    /// Highlights TOML content. Unknown syntax falls back to plain text.
    pub fn highlight_toml(&self, content: &str) -> String {
        let syntax = self
            .syntax_set
            .find_syntax_by_extension("toml")
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());
        let mut lines = HighlightLines::new(syntax, self.theme_set.get(self.theme));

        let mut output = String::new();
        for line in LinesWithEndings::from(content) {
            let ranges: Vec<(Style, &str)> = lines
                .highlight_line(line, &self.syntax_set)
                .unwrap_or_else(|_| vec![(Style::default(), line)]);
            output.push_str(&as_24_bit_terminal_escaped(&ranges[..], false));
        }
        output.push_str(colors::RESET);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlights_toml() {
        let output = Highlighter::new().highlight_toml("[analysis]\ndefault_field = \"text\"\n");
        assert!(output.contains("\x1b["));
        assert!(output.ends_with(colors::RESET));
    }

    #[test]
    fn styles_wrap_text() {
        let h = header("Matches");
        assert!(h.starts_with(colors::BOLD));
        assert!(h.contains(colors::CYAN));
        assert!(h.ends_with(colors::RESET));
        assert!(dim("faint").contains(colors::DIM));
        assert!(failure("bad").contains(colors::RED));
    }

    #[test]
    fn indents_each_line() {
        assert_eq!(indent("a\nb"), "  a\n  b");
    }

    #[test]
    fn formats_millis() {
        assert_eq!(millis(Duration::from_micros(1500)), "1.50ms");
    }
}
