//! TF-IDF text normalization.
//!
//! Reproduces the word-level TF-IDF pipeline the classifiers were trained on:
//! lowercase, extract tokens of two or more word characters, drop stop words,
//! build n-grams, weight term counts by inverse document frequency, then
//! normalize. Vocabulary and idf weights come from the serialized vectorizer
//! artifact, so every model is scored in exactly its own feature space.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{ArtifactError, ModelError};

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern is a valid regex"));

/// Vector normalization applied after idf weighting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    #[default]
    L2,
    L1,
    None,
}

/// A fitted TF-IDF vectorizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    /// term → feature index
    pub vocabulary: HashMap<String, usize>,
    /// Inverse document frequency per feature index. Ignored when `use_idf` is false.
    #[serde(default)]
    pub idf: Vec<f64>,
    #[serde(default = "default_true")]
    pub lowercase: bool,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default)]
    pub stop_words: HashSet<String>,
    #[serde(default)]
    pub sublinear_tf: bool,
    #[serde(default = "default_true")]
    pub use_idf: bool,
    #[serde(default)]
    pub norm: Norm,
}

fn default_true() -> bool {
    true
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

impl TfidfVectorizer {
    /// Unigram vectorizer with unit idf weights and L2 norm.
    pub fn from_vocabulary<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let vocabulary: HashMap<String, usize> = terms
            .into_iter()
            .enumerate()
            .map(|(i, t)| (t.into(), i))
            .collect();
        let idf = vec![1.0; vocabulary.len()];
        Self {
            vocabulary,
            idf,
            lowercase: true,
            ngram_range: default_ngram_range(),
            stop_words: HashSet::new(),
            sublinear_tf: false,
            use_idf: true,
            norm: Norm::L2,
        }
    }

    /// Width of the produced feature vectors.
    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    /// Check internal consistency after deserialization.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        let n = self.n_features();
        if n == 0 {
            return Err(ArtifactError::Invalid("vectorizer vocabulary is empty".into()));
        }
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ArtifactError::Invalid(format!(
                "invalid ngram_range ({min_n}, {max_n})"
            )));
        }
        let mut seen = vec![false; n];
        for (term, &idx) in &self.vocabulary {
            if idx >= n {
                return Err(ArtifactError::Invalid(format!(
                    "term {term:?} maps to index {idx}, vocabulary has {n} entries"
                )));
            }
            if std::mem::replace(&mut seen[idx], true) {
                return Err(ArtifactError::Invalid(format!(
                    "feature index {idx} assigned to more than one term"
                )));
            }
        }
        if self.use_idf && self.idf.len() != n {
            return Err(ArtifactError::Invalid(format!(
                "idf has {} weights for {n} vocabulary terms",
                self.idf.len()
            )));
        }
        Ok(())
    }

    /// Split raw text into analyzed terms (tokens and n-grams), before vocabulary lookup.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        let tokens: Vec<&str> = TOKEN_PATTERN
            .find_iter(&text)
            .map(|m| m.as_str())
            .filter(|t| !self.stop_words.contains(*t))
            .collect();

        let (min_n, max_n) = self.ngram_range;
        if min_n == 1 && max_n == 1 {
            return tokens.into_iter().map(str::to_string).collect();
        }

        let mut terms = Vec::new();
        for n in min_n..=max_n.min(tokens.len()) {
            for window in tokens.windows(n) {
                terms.push(window.join(" "));
            }
        }
        terms
    }

    /// Transform raw text into a normalized TF-IDF feature vector.
    pub fn transform(&self, text: &str) -> Features {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for term in self.analyze(text) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(idx, tf)| {
                let tf = if self.sublinear_tf { tf.ln() + 1.0 } else { tf };
                let w = if self.use_idf {
                    tf * self.idf.get(idx).copied().unwrap_or(1.0)
                } else {
                    tf
                };
                (idx, w)
            })
            .collect();

        let norm = match self.norm {
            Norm::L2 => entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt(),
            Norm::L1 => entries.iter().map(|(_, v)| v.abs()).sum::<f64>(),
            Norm::None => 1.0,
        };
        if norm > 0.0 {
            for (_, v) in &mut entries {
                *v /= norm;
            }
        }

        Features {
            dim: self.n_features(),
            entries,
        }
    }
}

/// Sparse feature vector: (index, value) pairs sorted by index.
#[derive(Debug, Clone, PartialEq)]
pub struct Features {
    dim: usize,
    entries: Vec<(usize, f64)>,
}

impl Features {
    pub fn from_dense(values: &[f64]) -> Self {
        let entries = values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0.0)
            .map(|(i, v)| (i, *v))
            .collect();
        Self {
            dim: values.len(),
            entries,
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    /// True when no vocabulary term matched.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dot product with a dense weight row of the same width.
    pub fn dot(&self, weights: &[f64]) -> Result<f64, ModelError> {
        if weights.len() != self.dim {
            return Err(ModelError::DimensionMismatch {
                expected: weights.len(),
                actual: self.dim,
            });
        }
        Ok(self.entries.iter().map(|&(i, v)| v * weights[i]).sum())
    }
}
