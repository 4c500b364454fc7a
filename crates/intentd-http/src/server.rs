//! axum server exposing health, model listing and prediction endpoints.
//!
//! Every handler is stateless; the only shared state is the read-only
//! [`Predictor`]. Scoring is CPU-bound and runs on the blocking pool so it
//! never stalls the async workers.

use std::future::Future;
use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use intentd_ai::Predictor;
use intentd_core::{
    HealthResponse, HealthState, ModelsResponse, PredictAllRequest, PredictAllResponse,
    PredictionRequest, PredictionResult, RootResponse,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::ApiError;

pub const ROOT_MESSAGE: &str = "Intent Classification API is running";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    predictor: Arc<Predictor>,
    strict_health: bool,
}

impl AppState {
    pub fn new(predictor: Predictor) -> Self {
        Self {
            predictor: Arc::new(predictor),
            strict_health: false,
        }
    }

    /// Answer `/health` with 503 instead of 200 when no model is loaded.
    pub fn strict_health(mut self, strict: bool) -> Self {
        self.strict_health = strict;
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/models", get(models))
        .route("/predict", post(predict))
        .route("/predict-all", post(predict_all))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(
        %addr,
        models = state.predictor.registry().len(),
        strict_health = state.strict_health,
        "intent API listening"
    );
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: ROOT_MESSAGE.to_string(),
    })
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let registry = state.predictor.registry();
    let status = registry.health();
    let code = match status {
        HealthState::Degraded if state.strict_health => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };
    (
        code,
        Json(HealthResponse {
            status,
            models_loaded: registry.len(),
        }),
    )
}

async fn models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let registry = state.predictor.registry();
    Json(ModelsResponse {
        models: registry.list().into_iter().map(str::to_string).collect(),
        description: registry
            .iter()
            .map(|m| (m.id().to_string(), m.description().to_string()))
            .collect(),
    })
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let Json(req) = payload?;
    let predictor = Arc::clone(&state.predictor);
    let result =
        tokio::task::spawn_blocking(move || predictor.predict(&req.text, &req.model_name))
            .await??;
    Ok(Json(result))
}

async fn predict_all(
    State(state): State<AppState>,
    payload: Result<Json<PredictAllRequest>, JsonRejection>,
) -> Result<Json<PredictAllResponse>, ApiError> {
    let Json(req) = payload?;
    let predictor = Arc::clone(&state.predictor);
    let result = tokio::task::spawn_blocking(move || predictor.predict_all(&req.text)).await??;
    Ok(Json(result))
}
