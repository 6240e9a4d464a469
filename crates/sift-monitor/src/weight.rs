//! Term weighting.
//!
//! A [`TermWeightor`] scores extracted terms by how selective they are likely
//! to be. Conjunctions use the scores to keep only their most selective
//! mandatory clause. Weighting never affects which documents match, only
//! which terms end up in the presearcher index.
//!
//! A weightor is a list of [`WeightNorm`]s whose outputs are combined by
//! product or sum. A norm that does not apply to a term is skipped.

use std::{collections::BTreeMap, fmt};

use sift_config::{Combine, WeightingSettings};

use crate::QueryTerm;

/// One weighting heuristic.
pub trait WeightNorm: Send + Sync + fmt::Debug {
    /// Returns the weight of a term, or `None` if the norm does not apply.
    fn norm(&self, term: &QueryTerm) -> Option<f32>;
}

/// Favors longer tokens.
///
/// `weight = a - (a - 1) * exp(-k * len)`, so a one-character token weighs
/// close to 1 and long tokens approach `a`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenLengthNorm {
    /// Upper bound of the weight.
    pub a: f32,
    /// Growth rate.
    pub k: f32,
}

impl Default for TokenLengthNorm {
    fn default() -> Self {
        Self { a: 3.0, k: 0.3 }
    }
}

impl WeightNorm for TokenLengthNorm {
    fn norm(&self, term: &QueryTerm) -> Option<f32> {
        let len = term.text.chars().count() as f32;
        Some(self.a - (self.a - 1.0) * (-self.k * len).exp())
    }
}

/// Fixed weights for terms in particular fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldWeightNorm {
    /// Weight per field name.
    pub weights: BTreeMap<String, f32>,
}

impl WeightNorm for FieldWeightNorm {
    fn norm(&self, term: &QueryTerm) -> Option<f32> {
        self.weights.get(&term.field).copied()
    }
}

/// Fixed weights for particular tokens, e.g. to down-weight stop words.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermWeightNorm {
    /// Weight per token.
    pub weights: BTreeMap<String, f32>,
}

impl WeightNorm for TermWeightNorm {
    fn norm(&self, term: &QueryTerm) -> Option<f32> {
        self.weights.get(&term.text).copied()
    }
}

/// Down-weights tokens known to be frequent.
///
/// `weight = k / (1 + ln(1 + freq))` for tokens with a known frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct TermFrequencyNorm {
    /// Known corpus frequency per token.
    pub frequencies: BTreeMap<String, u64>,
    /// Scale.
    pub k: f32,
}

impl WeightNorm for TermFrequencyNorm {
    fn norm(&self, term: &QueryTerm) -> Option<f32> {
        let freq = *self.frequencies.get(&term.text)? as f32;
        Some(self.k / (1.0 + freq.ln_1p()))
    }
}

/// Scores query terms for selectivity.
#[derive(Debug)]
pub struct TermWeightor {
    /// Norms in application order.
    norms: Vec<Box<dyn WeightNorm>>,
    /// How norm outputs are combined.
    combine: Combine,
}

impl Default for TermWeightor {
    fn default() -> Self {
        Self::new(Combine::Product).with_norm(TokenLengthNorm::default())
    }
}

impl TermWeightor {
    /// Creates a weightor without norms; every term weighs 1.
    pub fn new(combine: Combine) -> Self {
        Self {
            norms: Vec::new(),
            combine,
        }
    }

    /// Adds a norm.
    pub fn with_norm(mut self, norm: impl WeightNorm + 'static) -> Self {
        self.norms.push(Box::new(norm));
        self
    }

    /// Builds a weightor from configuration.
    pub fn from_settings(settings: &WeightingSettings) -> Self {
        let mut weightor = Self::new(settings.combine).with_norm(TokenLengthNorm {
            a: settings.token_length.a,
            k: settings.token_length.k,
        });
        if !settings.field_weights.is_empty() {
            weightor = weightor.with_norm(FieldWeightNorm {
                weights: settings.field_weights.clone(),
            });
        }
        if !settings.term_weights.is_empty() {
            weightor = weightor.with_norm(TermWeightNorm {
                weights: settings.term_weights.clone(),
            });
        }
        if !settings.frequencies.is_empty() {
            weightor = weightor.with_norm(TermFrequencyNorm {
                frequencies: settings.frequencies.clone(),
                k: settings.frequency_k,
            });
        }
        weightor
    }

    /// Returns the combination strategy.
    pub fn combine(&self) -> Combine {
        self.combine
    }

    /// Returns the weight of a term. Always finite and non-negative.
    ///
    /// The ANY sentinel weighs 0.
    pub fn weigh(&self, term: &QueryTerm) -> f32 {
        if term.is_any() {
            return 0.0;
        }
        let mut applied = self.norms.iter().filter_map(|n| n.norm(term)).peekable();
        if applied.peek().is_none() {
            return 1.0;
        }
        let weight: f32 = match self.combine {
            Combine::Product => applied.product(),
            Combine::Sum => applied.sum(),
        };
        if weight.is_finite() && weight > 0.0 {
            weight
        } else {
            0.0
        }
    }
}
