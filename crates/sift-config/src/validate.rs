//! Configuration validation.
//!
//! Validates a loaded configuration and reports warnings for potential issues.

use std::fmt;

use crate::{Config, FieldType, PresearcherKind};

/// Stemmer languages understood by the analysis chain.
pub const SUPPORTED_STEMMERS: &[&str] = &[
    "arabic",
    "danish",
    "dutch",
    "english",
    "finnish",
    "french",
    "german",
    "greek",
    "hungarian",
    "italian",
    "norwegian",
    "portuguese",
    "romanian",
    "russian",
    "spanish",
    "swedish",
    "tamil",
    "turkish",
];

/// A non-fatal warning about the configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarning {
    /// The stemmer language is not supported.
    UnknownStemmer {
        /// Configured language.
        name: String,
    },
    /// The filter field is declared numeric, so metadata values must be numbers.
    NumericFilterField {
        /// Name of the filter field.
        field: String,
        /// Declared type.
        field_type: FieldType,
    },
    /// A filter field is set but the match-all presearcher ignores it.
    FilterFieldIgnored {
        /// Name of the filter field.
        field: String,
    },
    /// A weight is zero or negative, which makes terms indistinguishable.
    NonPositiveWeight {
        /// Dotted key of the weight.
        key: String,
        /// Configured value.
        value: f32,
    },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownStemmer { name } => {
                write!(f, "unsupported stemmer language '{name}', stemming disabled")
            }
            Self::NumericFilterField { field, field_type } => {
                write!(
                    f,
                    "filter field '{field}' is declared {field_type}; query metadata must hold numbers"
                )
            }
            Self::FilterFieldIgnored { field } => {
                write!(
                    f,
                    "filter field '{field}' has no effect with the match-all presearcher"
                )
            }
            Self::NonPositiveWeight { key, value } => {
                write!(f, "weight {key} = {value} is not positive")
            }
        }
    }
}

/// Validates the configuration and returns any warnings.
pub fn validate_config(config: &Config) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    if let Some(name) = &config.analysis.stemmer
        && !SUPPORTED_STEMMERS.contains(&name.to_lowercase().as_str())
    {
        warnings.push(ConfigWarning::UnknownStemmer { name: name.clone() });
    }

    if let Some(field) = &config.presearcher.filter_field {
        if config.presearcher.kind == PresearcherKind::MatchAll {
            warnings.push(ConfigWarning::FilterFieldIgnored {
                field: field.clone(),
            });
        }
        let field_type = config.field_type(field);
        if field_type != FieldType::Text {
            warnings.push(ConfigWarning::NumericFilterField {
                field: field.clone(),
                field_type,
            });
        }
    }

    let weighting = &config.weighting;
    let weights = weighting
        .field_weights
        .iter()
        .map(|(k, v)| (format!("weighting.field_weights.{k}"), *v))
        .chain(
            weighting
                .term_weights
                .iter()
                .map(|(k, v)| (format!("weighting.term_weights.{k}"), *v)),
        )
        .chain([("weighting.frequency_k".to_string(), weighting.frequency_k)]);

    for (key, value) in weights {
        if value.is_nan() || value <= 0.0 {
            warnings.push(ConfigWarning::NonPositiveWeight { key, value });
        }
    }

    warnings
}
