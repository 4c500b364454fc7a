//! JSON bodies exchanged between the intentd server and its clients.
//!
//! Both the axum handlers and the reqwest client serialize through these
//! types, so the two sides cannot drift apart.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Body of `POST /predict`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub text: String,
    pub model_name: String,
}

/// A single prediction, echoed back with the model that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub text: String,
    pub predicted_intent: String,
    pub model_used: String,
    /// Maximum class probability. Absent for models without probability output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Body of `POST /predict-all`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictAllRequest {
    pub text: String,
}

/// Per-model outcome inside a [`PredictAllResponse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelOutcome {
    Prediction {
        predicted_intent: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        confidence: Option<f64>,
    },
    Failed {
        error: String,
    },
}

impl ModelOutcome {
    pub fn predicted_intent(&self) -> Option<&str> {
        match self {
            Self::Prediction {
                predicted_intent, ..
            } => Some(predicted_intent),
            Self::Failed { .. } => None,
        }
    }
}

/// Response of `POST /predict-all`, keyed by model identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictAllResponse {
    pub text: String,
    pub results: BTreeMap<String, ModelOutcome>,
}

/// Liveness state derived from registry readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    /// Process is up and at least one model is available.
    Ok,
    /// Process is up but no model artifact loaded.
    Degraded,
}

impl HealthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Degraded => "degraded",
        }
    }
}

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthState,
    pub models_loaded: usize,
}

/// Response of `GET /models`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
    pub description: BTreeMap<String, String>,
}

/// Response of `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
}

/// Error body returned with every 4xx/5xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
