//! Types shared by the intentd server, client and CLI: request and response
//! bodies plus the catalog of known models.

pub mod api;
pub mod catalog;

pub use api::{
    ErrorBody, HealthResponse, HealthState, ModelOutcome, ModelsResponse, PredictAllRequest,
    PredictAllResponse, PredictionRequest, PredictionResult, RootResponse,
};
pub use catalog::{KNOWN_MODELS, KnownModel, describe};
