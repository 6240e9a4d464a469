//! Configuration template for `sift init`.

/// Commented example configuration. Every setting shows its default.
const TEMPLATE: &str = r#"# sift configuration
#
# Files named .sift.toml are discovered from the working directory upwards;
# closer files take precedence. Set `root = true` to stop discovery here.

[analysis]
# Field searched by query terms without a field prefix.
default_field = "text"
# Stemming language applied to text fields (omit to disable stemming).
# stemmer = "english"

[fields]
# Numeric fields are indexed as a single canonical token, so that
# `price:1.0` and `price:1` match a document value of 1.0.
# age = "integer"
# price = "float"

[presearcher]
# "term", "field-term" or "match-all".
kind = "field-term"
# Queries whose metadata sets this key are only candidates for documents
# whose field of the same name contains the value.
# filter_field = "language"

[weighting]
# How norm weights combine: "product" or "sum".
combine = "product"
token_length = { a = 3.0, k = 0.3 }
# field_weights = { title = 1.5 }
# term_weights = { the = 0.1 }
# frequencies = { rust = 1200 }
frequency_k = 1.0
"#;

/// Returns the example configuration written by `sift init`.
pub fn config_template() -> &'static str {
    TEMPLATE
}
