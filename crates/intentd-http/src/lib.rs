//! HTTP facade: the axum server the browser UI talks to, and a typed client for it.

pub mod client;
mod error;
pub mod server;

pub use client::{ClientError, IntentClient};
pub use error::{ApiError, INTERNAL_DETAIL};
pub use server::{AppState, router, serve};
