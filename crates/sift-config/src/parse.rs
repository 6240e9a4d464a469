//! Configuration file parsing.
//!
//! Parses individual `.sift.toml` files into intermediate `RawConfig` structures
//! that preserve the optional nature of all fields before merging.

use std::{collections::HashMap, fs, path::Path};

use serde::Deserialize;

use crate::{Combine, ConfigError, FieldType, PresearcherKind};

/// Raw configuration as parsed directly from a TOML file.
///
/// All fields are optional to support partial configs that will be merged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawConfig {
    /// When true, stop discovery here - ignore parent and global configs.
    pub root: Option<bool>,
    /// Text analysis section.
    pub analysis: Option<RawAnalysisSettings>,
    /// Field name -> field type.
    pub fields: Option<HashMap<String, FieldType>>,
    /// Presearcher section.
    pub presearcher: Option<RawPresearcherSettings>,
    /// Term weighting section.
    pub weighting: Option<RawWeightingSettings>,
}

/// Raw analysis settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawAnalysisSettings {
    /// Field searched by unfielded query terms.
    pub default_field: Option<String>,
    /// Stemming language.
    pub stemmer: Option<String>,
}

/// Raw presearcher settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawPresearcherSettings {
    /// Presearcher variant.
    pub kind: Option<PresearcherKind>,
    /// Metadata key / document field used to pre-filter queries.
    pub filter_field: Option<String>,
}

/// Raw token-length norm parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawTokenLength {
    /// Upper bound of the weight.
    pub a: f32,
    /// Growth rate with token length.
    pub k: f32,
}

/// Raw weighting settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawWeightingSettings {
    /// How norm weights are combined.
    pub combine: Option<Combine>,
    /// Token-length norm parameters.
    pub token_length: Option<RawTokenLength>,
    /// Per-field weights.
    pub field_weights: Option<HashMap<String, f32>>,
    /// Per-token weights.
    pub term_weights: Option<HashMap<String, f32>>,
    /// Known token frequencies.
    pub frequencies: Option<HashMap<String, u64>>,
    /// Scale of the frequency norm.
    pub frequency_k: Option<f32>,
}

/// Parses a configuration file from disk.
pub fn parse_config_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config_str(&contents, path)
}

/// Parses configuration from a TOML string.
///
/// The `path` parameter is used for error reporting.
pub fn parse_config_str(contents: &str, path: &Path) -> Result<RawConfig, ConfigError> {
    let raw: RawConfig = toml::from_str(contents).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })?;
    check_values(&raw, path)?;
    Ok(raw)
}

/// Rejects values that cannot be turned into a working configuration.
fn check_values(raw: &RawConfig, path: &Path) -> Result<(), ConfigError> {
    let invalid = |key: &str, message: &str| ConfigError::InvalidValue {
        path: path.to_path_buf(),
        key: key.to_string(),
        message: message.to_string(),
    };

    if let Some(analysis) = &raw.analysis
        && analysis.default_field.as_deref().is_some_and(str::is_empty)
    {
        return Err(invalid("analysis.default_field", "must not be empty"));
    }

    if let Some(weighting) = &raw.weighting
        && let Some(length) = weighting.token_length
    {
        if !length.a.is_finite() || length.a < 1.0 {
            return Err(invalid("weighting.token_length.a", "must be at least 1.0"));
        }
        if !length.k.is_finite() || length.k <= 0.0 {
            return Err(invalid("weighting.token_length.k", "must be positive"));
        }
    }

    Ok(())
}

/// Checks if a config file has `root = true` set.
///
/// Returns false if the file cannot be read or parsed.
pub fn is_root_config(path: &Path) -> bool {
    let Ok(contents) = fs::read_to_string(path) else {
        return false;
    };
    let Ok(config) = toml::from_str::<RawConfig>(&contents) else {
        return false;
    };
    config.root == Some(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Result<RawConfig, ConfigError> {
        parse_config_str(toml, Path::new("test.toml"))
    }

    #[test]
    fn empty_config() {
        let config = parse("").unwrap();
        assert!(config.analysis.is_none());
        assert!(config.fields.is_none());
        assert!(config.presearcher.is_none());
        assert!(config.weighting.is_none());
    }

    #[test]
    fn full_config() {
        let config = parse(
            r#"
[analysis]
default_field = "body"
stemmer = "english"

[fields]
age = "integer"
money = "float"
title = "text"

[presearcher]
kind = "match-all"
filter_field = "language"

[weighting]
combine = "sum"
token_length = { a = 4.0, k = 0.5 }
field_weights = { title = 1.5 }
term_weights = { the = 0.1 }
frequencies = { rust = 1200 }
frequency_k = 2.0
"#,
        )
        .unwrap();

        let analysis = config.analysis.unwrap();
        assert_eq!(analysis.default_field.as_deref(), Some("body"));
        assert_eq!(analysis.stemmer.as_deref(), Some("english"));

        let fields = config.fields.unwrap();
        assert_eq!(fields["age"], FieldType::Integer);
        assert_eq!(fields["money"], FieldType::Float);
        assert_eq!(fields["title"], FieldType::Text);

        let presearcher = config.presearcher.unwrap();
        assert_eq!(presearcher.kind, Some(PresearcherKind::MatchAll));
        assert_eq!(presearcher.filter_field.as_deref(), Some("language"));

        let weighting = config.weighting.unwrap();
        assert_eq!(weighting.combine, Some(Combine::Sum));
        let length = weighting.token_length.unwrap();
        assert!((length.a - 4.0).abs() < f32::EPSILON);
        assert_eq!(weighting.frequencies.unwrap()["rust"], 1200);
        assert_eq!(weighting.frequency_k, Some(2.0));
    }

    #[test]
    fn unknown_field_type_rejected() {
        let err = parse("[fields]\nage = \"date\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml { .. }));
    }

    #[test]
    fn unknown_presearcher_rejected() {
        let err = parse("[presearcher]\nkind = \"fuzzy\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml { .. }));
    }

    #[test]
    fn unknown_key_rejected() {
        let err = parse("[analysis]\nstemer = \"english\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml { .. }));
    }

    #[test]
    fn empty_default_field_rejected() {
        let err = parse("[analysis]\ndefault_field = \"\"\n").unwrap_err();
        assert!(err.to_string().contains("analysis.default_field"));
    }

    #[test]
    fn bad_token_length_rejected() {
        let err = parse("[weighting]\ntoken_length = { a = 0.5, k = 0.3 }\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "weighting.token_length.a"));
    }
}
