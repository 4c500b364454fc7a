//! Inference layer: TF-IDF text normalization, linear intent classifiers,
//! the model registry and the prediction service built on top of them.

mod error;
pub use error::{ArtifactError, ModelError, ModelNotFound};

pub mod classifier;
pub mod predictor;
pub mod registry;
pub mod vectorizer;

pub use classifier::{
    ClassifierArtifact, IntentModel, LinearSvm, LogisticRegression, MultiClass, MultinomialNb,
};
pub use predictor::{PredictError, Predictor};
pub use registry::{ArtifactPaths, LoadSummary, ModelDescriptor, ModelRegistry};
pub use vectorizer::{Features, Norm, TfidfVectorizer};
