//! Shared context for running CLI commands.

use std::{
    env,
    path::{Path, PathBuf},
    process::ExitCode,
};

use sift_config::{Config, discover_config_files};
use sift_monitor::Monitor;
use tracing::debug;

/// Command execution context built once per CLI invocation.
pub struct CommandContext {
    /// Current working directory.
    pub cwd: PathBuf,
    /// Loaded configuration (default if no config files were found).
    pub config: Config,
}

impl CommandContext {
    /// Loads the working directory and, if `needs_config`, the configuration.
    ///
    /// An explicit `--config` file replaces discovery. Commands such as `init`
    /// skip loading so they still work when an existing file is invalid.
    pub fn load(config_file: Option<&Path>, needs_config: bool) -> Result<Self, ExitCode> {
        let cwd = current_dir_or_failure()?;
        let config = if needs_config {
            load_config_or_failure(&cwd, config_file)?
        } else {
            Config::default()
        };
        Ok(Self { cwd, config })
    }

    /// Builds a monitor from the loaded configuration.
    pub fn monitor(&self) -> Monitor {
        Monitor::from_config(&self.config)
    }
}

/// Returns the current working directory or exits with a consistent error.
fn current_dir_or_failure() -> Result<PathBuf, ExitCode> {
    env::current_dir().map_err(|e| {
        eprintln!("error: could not determine current directory: {e}");
        ExitCode::FAILURE
    })
}

/// Loads configuration from an explicit file or by discovery from `cwd`.
fn load_config_or_failure(cwd: &Path, config_file: Option<&Path>) -> Result<Config, ExitCode> {
    let files = match config_file {
        Some(path) => vec![cwd.join(path)],
        None => discover_config_files(cwd),
    };
    debug!(files = ?files, "loading configuration");
    Config::load_from_files(&files).map_err(|e| {
        eprintln!("error: failed to load configuration: {e}");
        ExitCode::FAILURE
    })
}
