//! Configuration system for sift.
//!
//! sift uses TOML configuration files named `.sift.toml`. Configuration is resolved by
//! walking up the directory tree from the current working directory, collecting any
//! `.sift.toml` files found, then loading `~/.sift.toml` as the global config with
//! lowest precedence.

#![warn(missing_docs)]

mod discovery;
mod error;
mod merge;
mod parse;
mod templates;
mod validate;

use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
};

pub use discovery::{CONFIG_FILENAME, discover_config_files, global_config_path, is_global_config};
pub use error::ConfigError;
pub use merge::{ParsedConfig, merge_configs};
pub use parse::{
    RawAnalysisSettings, RawConfig, RawPresearcherSettings, RawTokenLength, RawWeightingSettings,
    parse_config_file, parse_config_str,
};
use serde::{Deserialize, Serialize};
pub use templates::config_template;
pub use validate::{ConfigWarning, SUPPORTED_STEMMERS};
use validate::validate_config;

/// Top-level merged configuration for sift.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Config {
    /// Text analysis settings.
    pub analysis: AnalysisSettings,
    /// Declared field types. Undeclared fields are text.
    pub fields: BTreeMap<String, FieldType>,
    /// Presearcher settings.
    pub presearcher: PresearcherSettings,
    /// Term weighting settings.
    pub weighting: WeightingSettings,
    /// Files the configuration was merged from, highest precedence first.
    #[serde(skip)]
    pub sources: Vec<PathBuf>,
}

impl Config {
    /// Loads configuration by discovering and merging all `.sift.toml` files
    /// relevant to `cwd`.
    ///
    /// Returns `Ok(Config::default())` if no configuration files are found.
    pub fn load(cwd: &Path) -> Result<Self, ConfigError> {
        let config_files = discover_config_files(cwd);
        Self::load_from_files(&config_files)
    }

    /// Loads configuration from a specific list of config file paths.
    ///
    /// Files should be provided in precedence order: highest precedence first.
    pub fn load_from_files(files: &[PathBuf]) -> Result<Self, ConfigError> {
        let parsed = files
            .iter()
            .map(|path| {
                let config = parse_config_file(path)?;
                Ok(ParsedConfig {
                    path: path.clone(),
                    config,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(merge_configs(&parsed))
    }

    /// Returns the declared type of a field, defaulting to text.
    pub fn field_type(&self, field: &str) -> FieldType {
        self.fields.get(field).copied().unwrap_or_default()
    }

    /// Validates the configuration and returns any warnings.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        validate_config(self)
    }

    /// Serializes the effective configuration to TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// How a field's values are turned into tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text, tokenized by the analysis chain.
    #[default]
    Text,
    /// Whole numbers, indexed as one canonical token.
    Integer,
    /// Floating point numbers, indexed as one canonical token.
    Float,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
        }
    }
}

/// Text analysis settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisSettings {
    /// Field searched by unfielded query terms.
    pub default_field: String,
    /// Stemming language; no stemming when unset.
    pub stemmer: Option<String>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            default_field: String::from("text"),
            stemmer: None,
        }
    }
}

/// Which presearcher builds candidate sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresearcherKind {
    /// Token text only, ignoring fields.
    Term,
    /// Field and token text.
    #[default]
    FieldTerm,
    /// Every query is always a candidate.
    MatchAll,
}

impl fmt::Display for PresearcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Term => write!(f, "term"),
            Self::FieldTerm => write!(f, "field-term"),
            Self::MatchAll => write!(f, "match-all"),
        }
    }
}

/// Presearcher settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PresearcherSettings {
    /// Presearcher variant.
    pub kind: PresearcherKind,
    /// Metadata key / document field used to pre-filter queries.
    pub filter_field: Option<String>,
}

/// How the weights of several norms are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combine {
    /// Multiply norm weights.
    #[default]
    Product,
    /// Add norm weights.
    Sum,
}

/// Token-length norm parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TokenLengthSettings {
    /// Upper bound of the weight.
    pub a: f32,
    /// Growth rate with token length.
    pub k: f32,
}

impl Default for TokenLengthSettings {
    fn default() -> Self {
        Self { a: 3.0, k: 0.3 }
    }
}

/// Term weighting settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightingSettings {
    /// How norm weights are combined.
    pub combine: Combine,
    /// Token-length norm parameters.
    pub token_length: TokenLengthSettings,
    /// Per-field weights.
    pub field_weights: BTreeMap<String, f32>,
    /// Per-token weights.
    pub term_weights: BTreeMap<String, f32>,
    /// Known token frequencies.
    pub frequencies: BTreeMap<String, u64>,
    /// Scale of the frequency norm.
    pub frequency_k: f32,
}

impl Default for WeightingSettings {
    fn default() -> Self {
        Self {
            combine: Combine::Product,
            token_length: TokenLengthSettings::default(),
            field_weights: BTreeMap::new(),
            term_weights: BTreeMap::new(),
            frequencies: BTreeMap::new(),
            frequency_k: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.analysis.default_field, "text");
        assert!(config.analysis.stemmer.is_none());
        assert_eq!(config.presearcher.kind, PresearcherKind::FieldTerm);
        assert_eq!(config.weighting.combine, Combine::Product);
        assert_eq!(config.weighting.token_length, TokenLengthSettings { a: 3.0, k: 0.3 });
        assert!(config.sources.is_empty());
    }

    #[test]
    fn undeclared_fields_are_text() {
        let mut config = Config::default();
        config.fields.insert("age".into(), FieldType::Integer);
        assert_eq!(config.field_type("age"), FieldType::Integer);
        assert_eq!(config.field_type("title"), FieldType::Text);
    }

    #[test]
    fn to_toml_round_trips() {
        let mut config = Config::default();
        config.fields.insert("age".into(), FieldType::Integer);
        config.presearcher.filter_field = Some("language".into());

        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[analysis]"));
        assert!(rendered.contains("kind = \"field-term\""));
        assert!(rendered.contains("age = \"integer\""));

        let raw = parse_config_str(&rendered, Path::new("effective.toml")).unwrap();
        let reparsed = merge_configs(&[ParsedConfig {
            path: PathBuf::from("effective.toml"),
            config: raw,
        }]);
        assert_eq!(reparsed.fields, config.fields);
        assert_eq!(reparsed.presearcher, config.presearcher);
        assert_eq!(reparsed.weighting, config.weighting);
    }
}
