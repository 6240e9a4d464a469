//! Text analysis chain shared by stored queries and documents.
//!
//! The chain is:
//! 1. `SimpleTokenizer` - splits on whitespace and punctuation
//! 2. `LowerCaser` - converts tokens to lowercase
//! 3. `RemoveLongFilter` - removes tokens longer than 40 bytes
//! 4. `Stemmer` - optional language-specific stemming
//!
//! Query terms and document values must go through the same chain, otherwise
//! a stored term can never meet the document token it was written for.

use std::fmt;

use tantivy::tokenizer::{
    Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, TextAnalyzer, TokenStream,
};

use crate::AnalysisError;

/// Maximum token length in bytes before filtering.
const MAX_TOKEN_LENGTH: usize = 40;

/// Parses a stemmer language string into a Tantivy `Language`.
///
/// Matching is case-insensitive.
pub fn parse_language(name: &str) -> Result<Language, AnalysisError> {
    match name.to_lowercase().as_str() {
        "arabic" => Ok(Language::Arabic),
        "danish" => Ok(Language::Danish),
        "dutch" => Ok(Language::Dutch),
        "english" => Ok(Language::English),
        "finnish" => Ok(Language::Finnish),
        "french" => Ok(Language::French),
        "german" => Ok(Language::German),
        "greek" => Ok(Language::Greek),
        "hungarian" => Ok(Language::Hungarian),
        "italian" => Ok(Language::Italian),
        "norwegian" => Ok(Language::Norwegian),
        "portuguese" => Ok(Language::Portuguese),
        "romanian" => Ok(Language::Romanian),
        "russian" => Ok(Language::Russian),
        "spanish" => Ok(Language::Spanish),
        "swedish" => Ok(Language::Swedish),
        "tamil" => Ok(Language::Tamil),
        "turkish" => Ok(Language::Turkish),
        other => Err(AnalysisError::InvalidLanguage(other.to_string())),
    }
}

/// Builds the Tantivy analyzer, with stemming when a language is given.
fn build_analyzer(stemmer: Option<Language>) -> TextAnalyzer {
    let builder = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(LowerCaser)
        .filter(RemoveLongFilter::limit(MAX_TOKEN_LENGTH));
    match stemmer {
        Some(language) => builder.filter(Stemmer::new(language)).build(),
        None => builder.build(),
    }
}

/// Tokenizes text values into normalized tokens.
#[derive(Clone)]
pub struct Analyzer {
    /// Underlying Tantivy analyzer; cloned per call since streams borrow it mutably.
    inner: TextAnalyzer,
    /// Stemming language, if any.
    stemmer: Option<Language>,
}

impl Analyzer {
    /// Creates an analyzer with an optional stemmer.
    pub fn new(stemmer: Option<Language>) -> Self {
        Self {
            inner: build_analyzer(stemmer),
            stemmer,
        }
    }

    /// Creates an analyzer from a stemmer language name.
    pub fn from_stemmer_name(name: Option<&str>) -> Result<Self, AnalysisError> {
        let stemmer = name.map(parse_language).transpose()?;
        Ok(Self::new(stemmer))
    }

    /// Returns the stemming language.
    pub fn stemmer(&self) -> Option<Language> {
        self.stemmer
    }

    /// Splits text into normalized tokens, in order.
    pub fn tokens(&self, text: &str) -> Vec<String> {
        let mut analyzer = self.inner.clone();
        let mut stream = analyzer.token_stream(text);
        let mut tokens = Vec::new();
        while let Some(token) = stream.next() {
            tokens.push(token.text.clone());
        }
        tokens
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer")
            .field("stemmer", &self.stemmer)
            .finish_non_exhaustive()
    }
}
