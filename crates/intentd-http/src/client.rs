//! HTTP client for a running intentd server.

use intentd_core::{
    ErrorBody, HealthResponse, ModelsResponse, PredictAllRequest, PredictAllResponse,
    PredictionRequest, PredictionResult,
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

/// Failure talking to an intentd server.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection, TLS or body transfer failure.
    #[error("could not reach intentd: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success status and its `detail`.
    #[error("intentd answered {status}: {detail}")]
    Server { status: u16, detail: String },
    /// A success body that does not match the expected response type.
    #[error("unexpected response body: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// Status code the server answered with, if it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Typed client for the intent classification API.
pub struct IntentClient {
    http: reqwest::Client,
    base_url: String,
}

impl IntentClient {
    /// Point a client at a server root such as `http://localhost:8000`.
    /// Trailing slashes are dropped so route paths join cleanly.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Poll `/health`. A strict server answers 503 while degraded; that body
    /// is still returned rather than treated as an error.
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let url = format!("{}/health", self.base_url);
        debug!(url = %url, "checking health");
        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if status.is_success() || status == StatusCode::SERVICE_UNAVAILABLE {
            return Ok(serde_json::from_str(&body)?);
        }
        Err(server_error(status, &body))
    }

    /// List the models the server has loaded.
    pub async fn models(&self) -> Result<ModelsResponse, ClientError> {
        let url = format!("{}/models", self.base_url);
        let resp = self.http.get(&url).send().await?;
        decode(resp).await
    }

    /// Predict an intent with a single model.
    pub async fn predict(
        &self,
        text: &str,
        model_name: &str,
    ) -> Result<PredictionResult, ClientError> {
        let url = format!("{}/predict", self.base_url);
        let body = PredictionRequest {
            text: text.to_string(),
            model_name: model_name.to_string(),
        };
        debug!(url = %url, model = model_name, "requesting prediction");
        let resp = self.http.post(&url).json(&body).send().await?;
        decode(resp).await
    }

    /// Predict an intent with every model the server holds.
    pub async fn predict_all(&self, text: &str) -> Result<PredictAllResponse, ClientError> {
        let url = format!("{}/predict-all", self.base_url);
        let body = PredictAllRequest {
            text: text.to_string(),
        };
        let resp = self.http.post(&url).json(&body).send().await?;
        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(server_error(status, &body));
    }
    Ok(serde_json::from_str(&body)?)
}

/// Extract `detail` from an error body, falling back to the raw text.
fn server_error(status: StatusCode, body: &str) -> ClientError {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.detail)
        .unwrap_or_else(|_| body.to_string());
    ClientError::Server {
        status: status.as_u16(),
        detail,
    }
}
