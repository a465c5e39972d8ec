//! Handler for `GET /dataset`.
//!
//! Describes what was loaded: the checklist universe and the date span the
//! dashboard's subheading shows.

use axum::{Json, extract::State};
use chrono::NaiveDate;
use covid_core::AgeGroups;
use serde::Serialize;

use crate::ApiState;

#[derive(Debug, Serialize)]
pub struct DatasetInfo {
  /// Every age group, in first-seen order. The checklist starts all ticked.
  pub age_groups:   AgeGroups,
  pub record_count: usize,
  pub first_date:   Option<NaiveDate>,
  pub last_date:    Option<NaiveDate>,
}

/// `GET /dataset`
pub async fn handler(State(state): State<ApiState>) -> Json<DatasetInfo> {
  let pipeline = &state.pipeline;
  let range = pipeline.date_range();
  Json(DatasetInfo {
    age_groups:   pipeline.age_groups().clone(),
    record_count: pipeline.records().len(),
    first_date:   range.map(|(first, _)| first),
    last_date:    range.map(|(_, last)| last),
  })
}
