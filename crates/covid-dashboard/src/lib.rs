//! Browser dashboard for COVID-19 statistics by age group.
//!
//! Serves a single page with an age-group checklist and six chart slots at
//! `/`, and nests the JSON API from [`covid_api`] under `/api`. The page
//! draws whatever the API returns; all data work happens in the
//! [`Pipeline`].

pub mod page;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use covid_core::Pipeline;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `DASHBOARD_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:      String,
  #[serde(default = "default_port")]
  pub port:      u16,
  /// The CSV source, loaded once at startup.
  #[serde(default = "default_data_path")]
  pub data_path: PathBuf,
  /// Browser tab title.
  #[serde(default = "default_title")]
  pub title:     String,
}

fn default_host() -> String { "127.0.0.1".into() }

fn default_port() -> u16 { 8050 }

fn default_data_path() -> PathBuf { PathBuf::from("Covid_Tan.csv") }

fn default_title() -> String { "Covid-19 Statistics Dashboard".into() }

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:      default_host(),
      port:      default_port(),
      data_path: default_data_path(),
      title:     default_title(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the dashboard [`Router`]: the page at `/`, the API under `/api`.
pub fn router(config: &ServerConfig, pipeline: Arc<Pipeline>) -> Router {
  let page = page::Page::render(&config.title, &pipeline);
  Router::new()
    .route("/", get(page::handler))
    .with_state(Arc::new(page))
    .nest("/api", covid_api::api_router(pipeline))
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use covid_core::{Dataset, Record};
  use tower::ServiceExt as _;

  fn pipeline() -> Arc<Pipeline> {
    let record = |date: &str, age: &str| Record {
      statistics_profile_date:  date.parse().unwrap(),
      age:                      age.to_string(),
      cases:                    10,
      case_by_day:              1,
      hospitalised_cases:       1,
      hospital_case_by_day:     0,
      hospitalised_covid_cases: 5,
      covid_cases_confirmed:    40,
      median_age:               41.0,
    };
    Arc::new(Pipeline::new(Dataset::new(vec![
      record("2020-03-02", "0-4"),
      record("2020-03-02", "65+"),
      record("2021-12-21", "0-4"),
      record("2021-12-21", "65+"),
    ])))
  }

  async fn get(uri: &str) -> axum::response::Response {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    router(&ServerConfig::default(), pipeline()).oneshot(req).await.unwrap()
  }

  #[tokio::test]
  async fn index_serves_html_page() {
    let resp = get("/").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let ct = resp.headers().get(header::CONTENT_TYPE).unwrap().to_str().unwrap();
    assert!(ct.starts_with("text/html"), "Content-Type: {ct}");
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let html = std::str::from_utf8(&bytes).unwrap();
    assert!(html.contains("<title>Covid-19 Statistics Dashboard</title>"));
    assert!(html.contains("Statistics Date (02/03/2020 - 21/12/2021)"));
    assert!(html.contains("id=\"checklist\""));
  }

  #[tokio::test]
  async fn api_is_nested() {
    let resp = get("/api/dataset").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["age_groups"], serde_json::json!(["0-4", "65+"]));
  }

  #[tokio::test]
  async fn unknown_path_returns_404() {
    assert_eq!(get("/nope").await.status(), StatusCode::NOT_FOUND);
  }

  #[test]
  fn config_defaults_fill_missing_keys() {
    let cfg: ServerConfig = config::Config::builder()
      .add_source(config::File::from_str("port = 9000", config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap();
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.data_path, PathBuf::from("Covid_Tan.csv"));
  }
}
