//! JSON REST API for the age-group dashboard.
//!
//! Exposes an axum [`Router`] over a shared, immutable [`Pipeline`]. Page
//! serving, logging setup and transport are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", covid_api::api_router(pipeline.clone()))
//! ```

pub mod charts;
pub mod dataset;
pub mod error;
pub mod etag;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use covid_core::Pipeline;

pub use error::ApiError;

/// Shared state threaded through all API handlers.
#[derive(Clone)]
pub struct ApiState {
  pub pipeline:    Arc<Pipeline>,
  /// See [`etag::dataset_fingerprint`].
  pub fingerprint: [u8; 32],
}

impl ApiState {
  pub fn new(pipeline: Arc<Pipeline>) -> Self {
    let fingerprint = etag::dataset_fingerprint(&pipeline);
    Self { pipeline, fingerprint }
  }
}

/// Build a fully-materialised API router for `pipeline`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router(pipeline: Arc<Pipeline>) -> Router<()> {
  Router::new()
    .route("/dataset", get(dataset::handler))
    .route("/charts", get(charts::list))
    .route("/charts/{chart}", get(charts::get_one))
    .route("/selection", post(charts::select))
    .with_state(ApiState::new(pipeline))
}

// ─── Integration tests ────────────────────────────────────────────────────────
