//! Prediction service: validate text, resolve the model, normalize, score.

use std::collections::BTreeMap;
use std::sync::Arc;

use intentd_core::{ModelOutcome, PredictAllResponse, PredictionResult};
use thiserror::Error;
use tracing::{debug, warn};

use crate::registry::{ModelDescriptor, ModelRegistry};
use crate::{ModelError, ModelNotFound};

/// Error text reported for a model that fails during `predict_all`.
pub const MODEL_FAILED: &str = "inference failed";

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    ModelNotFound(#[from] ModelNotFound),

    #[error("inference failed for model '{model}': {source}")]
    Inference {
        model: String,
        #[source]
        source: ModelError,
    },
}

/// Stateless prediction service over a read-only registry.
#[derive(Debug, Clone)]
pub struct Predictor {
    registry: Arc<ModelRegistry>,
}

impl Predictor {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Classify `text` with the model registered as `model_name`.
    pub fn predict(&self, text: &str, model_name: &str) -> Result<PredictionResult, PredictError> {
        validate_text(text)?;
        let descriptor = self.registry.load(model_name)?;
        let (predicted_intent, confidence) = score(&descriptor, text)?;

        debug!(
            model = model_name,
            intent = %predicted_intent,
            confidence = ?confidence,
            "prediction"
        );
        Ok(PredictionResult {
            text: text.to_string(),
            predicted_intent,
            model_used: model_name.to_string(),
            confidence,
        })
    }

    /// Classify `text` with every available model.
    ///
    /// A failing model is reported in its own entry and does not fail the call.
    pub fn predict_all(&self, text: &str) -> Result<PredictAllResponse, PredictError> {
        validate_text(text)?;

        let mut results = BTreeMap::new();
        for descriptor in self.registry.iter() {
            let outcome = match score(descriptor, text) {
                Ok((predicted_intent, confidence)) => ModelOutcome::Prediction {
                    predicted_intent,
                    confidence,
                },
                Err(e) => {
                    warn!(model = descriptor.id(), error = %e, "model failed during predict-all");
                    ModelOutcome::Failed {
                        error: MODEL_FAILED.to_string(),
                    }
                }
            };
            results.insert(descriptor.id().to_string(), outcome);
        }

        Ok(PredictAllResponse {
            text: text.to_string(),
            results,
        })
    }
}

fn validate_text(text: &str) -> Result<(), PredictError> {
    if text.trim().is_empty() {
        return Err(PredictError::Validation("Input text cannot be empty".into()));
    }
    Ok(())
}

/// Label and optional confidence (maximum class probability).
fn score(
    descriptor: &ModelDescriptor,
    text: &str,
) -> Result<(String, Option<f64>), PredictError> {
    let inference = |source| PredictError::Inference {
        model: descriptor.id().to_string(),
        source,
    };

    let features = descriptor.transform(text);
    let classifier = descriptor.classifier();
    let label = classifier.predict_label(&features).map_err(inference)?;
    let confidence = classifier
        .predict_probabilities(&features)
        .map_err(inference)?
        .and_then(|probs| probs.into_iter().reduce(f64::max))
        .map(|p| p.clamp(0.0, 1.0));

    Ok((label, confidence))
}
