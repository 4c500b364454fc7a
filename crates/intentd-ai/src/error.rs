use std::path::PathBuf;

use thiserror::Error;

/// Failure to load or validate a model artifact. Only raised at startup.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid artifact: {0}")]
    Invalid(String),

    #[error("vectorizer produces {vectorizer} features but classifier expects {classifier}")]
    FeatureMismatch { vectorizer: usize, classifier: usize },
}

/// Failure raised by a classifier while scoring a feature vector.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("feature vector has {actual} dimensions, model expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("model produced no class scores")]
    NoScores,
}

/// Lookup of an identifier the registry does not hold.
#[derive(Debug, Clone, Error)]
#[error("Model '{name}' not found. Available models: {available:?}")]
pub struct ModelNotFound {
    pub name: String,
    pub available: Vec<String>,
}
