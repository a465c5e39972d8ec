//! Handlers for `/charts` and `/selection`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/charts` | All six charts; optional `?ages=a,b` |
//! | `GET`  | `/charts/{chart}` | One chart by kebab-case id; 404 if unknown |
//! | `POST` | `/selection` | Body: `{"ages":[...]}`; the checklist change event |
//!
//! Without `ages` every age group is selected, matching the checklist's
//! initial state. `ages=` (present but empty) selects nothing.
//!
//! Malformed query strings and bodies are answered with the same JSON error
//! body as every other [`ApiError`].

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, QueryRejection},
  },
  http::{HeaderMap, HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use covid_core::{
  AgeGroups, AgeSelection,
  chart::ChartId,
  dashboard::on_selection_change,
};
use serde::{Deserialize, Serialize};

use crate::{
  ApiState,
  error::ApiError,
  etag::{compute_etag, if_none_match},
};

// ─── Parameters ──────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ChartParams {
  /// Comma-separated age labels.
  pub ages: Option<String>,
}

impl ChartParams {
  fn selection(&self, groups: &AgeGroups) -> AgeSelection {
    match &self.ages {
      Some(list) => AgeSelection::parse_list(list),
      None => groups.all_selected(),
    }
  }
}

/// JSON body accepted by `POST /selection`.
#[derive(Debug, Deserialize)]
pub struct SelectionBody {
  pub ages: Vec<String>,
}

// ─── Response helper ─────────────────────────────────────────────────────────

/// 304 if the client already holds `etag`, otherwise 200 with `body`.
fn conditional_json<T: Serialize>(
  headers: &HeaderMap,
  etag: &str,
  body: T,
) -> Response {
  let mut res = if if_none_match(headers, etag) {
    StatusCode::NOT_MODIFIED.into_response()
  } else {
    Json(body).into_response()
  };
  if let Ok(value) = HeaderValue::from_str(etag) {
    res.headers_mut().insert(header::ETAG, value);
  }
  res
}

// ─── All charts ──────────────────────────────────────────────────────────────

/// `GET /charts[?ages=<a>,<b>,...]`
pub async fn list(
  State(state): State<ApiState>,
  params: Result<Query<ChartParams>, QueryRejection>,
  headers: HeaderMap,
) -> Result<Response, ApiError> {
  let Query(params) = params?;
  let pipeline = &state.pipeline;
  let ages = params.selection(pipeline.age_groups());
  let etag = compute_etag(&state.fingerprint, &ChartId::ALL, &ages);
  tracing::debug!(selected = ages.len(), "charts requested");
  Ok(conditional_json(
    &headers,
    &etag,
    on_selection_change(pipeline, &ages),
  ))
}

// ─── One chart ───────────────────────────────────────────────────────────────

/// `GET /charts/{chart}[?ages=<a>,<b>,...]`
pub async fn get_one(
  State(state): State<ApiState>,
  Path(chart): Path<String>,
  params: Result<Query<ChartParams>, QueryRejection>,
  headers: HeaderMap,
) -> Result<Response, ApiError> {
  let chart = ChartId::parse(&chart)?;
  let Query(params) = params?;
  let pipeline = &state.pipeline;
  let ages = params.selection(pipeline.age_groups());
  let etag = compute_etag(&state.fingerprint, &[chart], &ages);
  Ok(conditional_json(&headers, &etag, pipeline.chart(chart, &ages)))
}

// ─── Selection event ─────────────────────────────────────────────────────────

/// `POST /selection` — body: `{"ages":["0-4","65+"]}`.
///
/// Returns the six charts keyed by chart id, in output order.
pub async fn select(
  State(state): State<ApiState>,
  body: Result<Json<SelectionBody>, JsonRejection>,
) -> Result<Response, ApiError> {
  let Json(body) = body?;
  if body.ages.iter().any(|a| a.trim().is_empty()) {
    return Err(ApiError::BadRequest("age labels must not be blank".into()));
  }
  let ages = AgeSelection::new(body.ages);
  tracing::debug!(selected = ages.len(), "selection changed");
  Ok(Json(on_selection_change(&state.pipeline, &ages)).into_response())
}
