//! ETag computation for chart responses.
//!
//! The dataset never changes while the process runs, so a chart response is
//! fully determined by the dataset, the charts requested and the selection.
//! ETags are SHA-256 hashes over exactly those three inputs.

use axum::http::{HeaderMap, header};
use covid_core::{AgeSelection, Pipeline, chart::ChartId};
use sha2::{Digest, Sha256};

/// Hash every record of the loaded dataset, in load order.
///
/// Computed once when the router is built; distinguishes restarts against a
/// different source file.
pub fn dataset_fingerprint(pipeline: &Pipeline) -> [u8; 32] {
  let mut hasher = Sha256::new();
  for r in pipeline.records() {
    hasher.update(r.statistics_profile_date.to_string().as_bytes());
    hasher.update(r.age.as_bytes());
    hasher.update([0u8]);
    for n in [
      r.cases,
      r.case_by_day,
      r.hospitalised_cases,
      r.hospital_case_by_day,
      r.hospitalised_covid_cases,
      r.covid_cases_confirmed,
    ] {
      hasher.update(n.to_le_bytes());
    }
    hasher.update(r.median_age.to_bits().to_le_bytes());
  }
  hasher.finalize().into()
}

/// Compute a strong, quoted ETag for `charts` under `ages`.
///
/// Stable: the same labels in any order give the same ETag. The selection
/// is left out when every requested chart ignores it.
pub fn compute_etag(
  fingerprint: &[u8; 32],
  charts: &[ChartId],
  ages: &AgeSelection,
) -> String {
  let mut hasher = Sha256::new();
  hasher.update(fingerprint);
  for chart in charts {
    let name: &'static str = (*chart).into();
    hasher.update(name.as_bytes());
    hasher.update([0u8]);
  }
  if !charts.iter().all(|c| c.is_unfiltered()) {
    hasher.update([1u8]);
    for label in ages.sorted_labels() {
      hasher.update(label.as_bytes());
      hasher.update([0u8]);
    }
  }
  format!("\"{}\"", hex::encode(hasher.finalize()))
}

/// Whether the request's `If-None-Match` already names `etag`.
///
/// Accepts `*`, comma-separated lists, weak validators and bare (unquoted)
/// tags.
pub fn if_none_match(headers: &HeaderMap, etag: &str) -> bool {
  let bare = etag.trim_matches('"');
  headers
    .get_all(header::IF_NONE_MATCH)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(','))
    .map(str::trim)
    .any(|candidate| {
      candidate == "*"
        || candidate.trim_start_matches("W/").trim_matches('"') == bare
    })
}
