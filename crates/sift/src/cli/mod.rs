//! CLI support for the `sift` binary.

pub mod args;
pub mod commands;
pub mod context;
pub mod input;
pub mod output;

pub use context::CommandContext;
