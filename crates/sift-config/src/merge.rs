//! Configuration merging.
//!
//! Merges multiple `RawConfig` files into a single resolved `Config`,
//! applying precedence rules.

use std::{
    collections::{BTreeMap, HashMap},
    hash::Hash,
    path::PathBuf,
};

use crate::{
    AnalysisSettings, Config, PresearcherSettings, TokenLengthSettings, WeightingSettings,
    parse::{RawAnalysisSettings, RawConfig, RawPresearcherSettings, RawWeightingSettings},
};

/// A parsed config file with its source path.
pub struct ParsedConfig {
    /// Path to the config file.
    pub path: PathBuf,
    /// Parsed raw configuration.
    pub config: RawConfig,
}

/// Merges multiple configuration files into a single resolved `Config`.
///
/// Configs should be provided in precedence order: highest precedence first
/// (closest to the working directory), lowest precedence last (global config).
///
/// Merge rules:
/// - Scalar settings: first defined value wins
/// - Maps (`fields`, weights, frequencies): merged, first definition for each key wins
pub fn merge_configs(configs: &[ParsedConfig]) -> Config {
    let mut config = Config::default();

    // Lowest precedence first so that higher precedence overwrites.
    for parsed in configs.iter().rev() {
        apply_raw(&mut config, &parsed.config);
    }

    config.sources = configs.iter().map(|c| c.path.clone()).collect();
    config
}

/// Applies one raw config on top of `config`, overwriting any values it defines.
fn apply_raw(config: &mut Config, raw: &RawConfig) {
    if let Some(analysis) = &raw.analysis {
        apply_analysis(&mut config.analysis, analysis);
    }
    if let Some(fields) = &raw.fields {
        overlay(&mut config.fields, fields);
    }
    if let Some(presearcher) = &raw.presearcher {
        apply_presearcher(&mut config.presearcher, presearcher);
    }
    if let Some(weighting) = &raw.weighting {
        apply_weighting(&mut config.weighting, weighting);
    }
}

/// Applies raw analysis settings.
fn apply_analysis(result: &mut AnalysisSettings, raw: &RawAnalysisSettings) {
    if let Some(ref v) = raw.default_field {
        result.default_field = v.clone();
    }
    if let Some(ref v) = raw.stemmer {
        result.stemmer = Some(v.clone());
    }
}

/// Applies raw presearcher settings.
fn apply_presearcher(result: &mut PresearcherSettings, raw: &RawPresearcherSettings) {
    if let Some(v) = raw.kind {
        result.kind = v;
    }
    if let Some(ref v) = raw.filter_field {
        result.filter_field = Some(v.clone());
    }
}

/// Applies raw weighting settings.
fn apply_weighting(result: &mut WeightingSettings, raw: &RawWeightingSettings) {
    if let Some(v) = raw.combine {
        result.combine = v;
    }
    if let Some(v) = raw.token_length {
        result.token_length = TokenLengthSettings { a: v.a, k: v.k };
    }
    if let Some(ref v) = raw.field_weights {
        overlay(&mut result.field_weights, v);
    }
    if let Some(ref v) = raw.term_weights {
        overlay(&mut result.term_weights, v);
    }
    if let Some(ref v) = raw.frequencies {
        overlay(&mut result.frequencies, v);
    }
    if let Some(v) = raw.frequency_k {
        result.frequency_k = v;
    }
}

/// Copies every entry of `source` into `target`, replacing existing keys.
fn overlay<K, V>(target: &mut BTreeMap<K, V>, source: &HashMap<K, V>)
where
    K: Ord + Hash + Eq + Clone,
    V: Clone,
{
    for (key, value) in source {
        target.insert(key.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::{Combine, FieldType, PresearcherKind, parse::parse_config_str};

    fn parsed(path: &str, toml: &str) -> ParsedConfig {
        ParsedConfig {
            path: PathBuf::from(path),
            config: parse_config_str(toml, Path::new(path)).unwrap(),
        }
    }

    #[test]
    fn empty_merge_is_default() {
        let config = merge_configs(&[]);
        assert_eq!(config.analysis.default_field, "text");
        assert!(config.sources.is_empty());
    }

    #[test]
    fn closest_scalar_wins() {
        let local = parsed("/a/b/.sift.toml", "[analysis]\ndefault_field = \"body\"\n");
        let global = parsed(
            "/home/.sift.toml",
            "[analysis]\ndefault_field = \"title\"\nstemmer = \"german\"\n\n[weighting]\ncombine = \"sum\"\n",
        );

        let config = merge_configs(&[local, global]);
        assert_eq!(config.analysis.default_field, "body");
        assert_eq!(config.analysis.stemmer.as_deref(), Some("german"));
        assert_eq!(config.weighting.combine, Combine::Sum);
        assert_eq!(config.sources.len(), 2);
    }

    #[test]
    fn maps_merge_by_key() {
        let local = parsed(
            "/a/.sift.toml",
            "[fields]\nage = \"float\"\n\n[presearcher]\nkind = \"term\"\n",
        );
        let global = parsed(
            "/home/.sift.toml",
            "[fields]\nage = \"integer\"\nmoney = \"float\"\n",
        );

        let config = merge_configs(&[local, global]);
        assert_eq!(config.fields["age"], FieldType::Float);
        assert_eq!(config.fields["money"], FieldType::Float);
        assert_eq!(config.presearcher.kind, PresearcherKind::Term);
    }
}
