//! Raw records and the age-group filter domain.
//!
//! A [`Record`] is one row of the source table: the cumulative and daily
//! counts for a single age group on a single statistics date.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ─── Columns ─────────────────────────────────────────────────────────────────

pub const COL_DATE: &str = "StatisticsProfileDate";
pub const COL_AGE: &str = "Age";
pub const COL_CASES: &str = "Cases";
pub const COL_CASE_BY_DAY: &str = "CaseByDay";
pub const COL_HOSPITALISED_CASES: &str = "HospitalisedCases";
pub const COL_HOSPITAL_CASE_BY_DAY: &str = "HospitalCaseByDay";
pub const COL_HOSPITALISED_COVID_CASES: &str = "HospitalisedCovidCases";
pub const COL_COVID_CASES_CONFIRMED: &str = "CovidCasesConfirmed";
pub const COL_MEDIAN_AGE: &str = "Median_Age";

/// Every column the source must carry. Any other column is ignored.
pub const REQUIRED_COLUMNS: [&str; 9] = [
  COL_DATE,
  COL_AGE,
  COL_CASES,
  COL_CASE_BY_DAY,
  COL_HOSPITALISED_CASES,
  COL_HOSPITAL_CASE_BY_DAY,
  COL_HOSPITALISED_COVID_CASES,
  COL_COVID_CASES_CONFIRMED,
  COL_MEDIAN_AGE,
];

// ─── Record ──────────────────────────────────────────────────────────────────

/// One row of the source table.
///
/// `(statistics_profile_date, age)` is unique across a [`Dataset`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
  #[serde(rename = "StatisticsProfileDate")]
  pub statistics_profile_date:  NaiveDate,
  #[serde(rename = "Age")]
  pub age:                      String,
  /// Cumulative confirmed cases in this age group.
  #[serde(rename = "Cases")]
  pub cases:                    u64,
  #[serde(rename = "CaseByDay")]
  pub case_by_day:              u64,
  /// Cumulative hospitalised cases in this age group.
  #[serde(rename = "HospitalisedCases")]
  pub hospitalised_cases:       u64,
  #[serde(rename = "HospitalCaseByDay")]
  pub hospital_case_by_day:     u64,
  /// Cumulative hospitalised cases across all age groups.
  #[serde(rename = "HospitalisedCovidCases")]
  pub hospitalised_covid_cases: u64,
  /// Cumulative confirmed cases across all age groups.
  #[serde(rename = "CovidCasesConfirmed")]
  pub covid_cases_confirmed:    u64,
  #[serde(rename = "Median_Age")]
  pub median_age:               f64,
}

// ─── Age groups ──────────────────────────────────────────────────────────────

/// The distinct `Age` labels of a dataset, in first-seen order.
///
/// Doubles as the universe of the dashboard's checklist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AgeGroups(Vec<String>);

impl AgeGroups {
  pub fn from_records(records: &[Record]) -> Self {
    let mut seen = HashSet::new();
    let labels = records
      .iter()
      .filter(|r| seen.insert(r.age.as_str()))
      .map(|r| r.age.clone())
      .collect();
    Self(labels)
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.0.iter().map(String::as_str)
  }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn contains(&self, label: &str) -> bool {
    self.0.iter().any(|l| l == label)
  }

  /// Index of `label` in first-seen order.
  pub fn position(&self, label: &str) -> Option<usize> {
    self.0.iter().position(|l| l == label)
  }

  /// The checklist's initial state: every group ticked.
  pub fn all_selected(&self) -> AgeSelection {
    AgeSelection::new(self.iter())
  }
}

// ─── Selection ───────────────────────────────────────────────────────────────

/// The set of age labels currently ticked in the checklist.
///
/// Labels outside the dataset's [`AgeGroups`] are accepted and match no
/// rows. The empty selection is valid and filters everything out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgeSelection(HashSet<String>);

impl AgeSelection {
  pub fn new<I, S>(labels: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self(labels.into_iter().map(Into::into).collect())
  }

  pub fn empty() -> Self { Self::default() }

  /// Parse a comma-separated label list, e.g. `"0-4,25-34"`.
  ///
  /// An empty (or all-whitespace) string is the empty selection.
  pub fn parse_list(s: &str) -> Self {
    Self::new(
      s.split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty()),
    )
  }

  pub fn contains(&self, label: &str) -> bool { self.0.contains(label) }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn len(&self) -> usize { self.0.len() }

  /// Labels in lexicographic order, for deterministic hashing and display.
  pub fn sorted_labels(&self) -> Vec<&str> {
    let mut labels: Vec<&str> = self.0.iter().map(String::as_str).collect();
    labels.sort_unstable();
    labels
  }
}

// ─── Dataset ─────────────────────────────────────────────────────────────────

/// The loader's output: every record in source order plus the age groups.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
  pub records:    Vec<Record>,
  pub age_groups: AgeGroups,
}

impl Dataset {
  /// Build a dataset from records, deriving the age groups.
  pub fn new(records: Vec<Record>) -> Self {
    let age_groups = AgeGroups::from_records(&records);
    Self { records, age_groups }
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;

  pub(crate) fn record(date: &str, age: &str, cases: u64) -> Record {
    Record {
      statistics_profile_date:  date.parse().unwrap(),
      age:                      age.to_string(),
      cases,
      case_by_day:              cases / 10,
      hospitalised_cases:       cases / 10,
      hospital_case_by_day:     cases / 100,
      hospitalised_covid_cases: 50,
      covid_cases_confirmed:    200,
      median_age:               40.0,
    }
  }

  #[test]
  fn age_groups_keep_first_seen_order() {
    let records = vec![
      record("2021-01-01", "25-34", 1),
      record("2021-01-01", "0-4", 1),
      record("2021-01-02", "25-34", 1),
      record("2021-01-02", "65+", 1),
      record("2021-01-02", "0-4", 1),
    ];
    let groups = AgeGroups::from_records(&records);
    assert_eq!(groups.iter().collect::<Vec<_>>(), vec!["25-34", "0-4", "65+"]);
    assert_eq!(groups.position("65+"), Some(2));
    assert_eq!(groups.position("15-24"), None);
  }

  #[test]
  fn all_selected_covers_every_group() {
    let records = vec![record("2021-01-01", "0-4", 1), record("2021-01-01", "5-14", 1)];
    let groups = AgeGroups::from_records(&records);
    let selection = groups.all_selected();
    assert_eq!(selection.len(), 2);
    assert!(groups.iter().all(|g| selection.contains(g)));
  }

  #[test]
  fn parse_list_trims_and_skips_blanks() {
    let s = AgeSelection::parse_list(" 0-4 , ,65+");
    assert_eq!(s.sorted_labels(), vec!["0-4", "65+"]);
    assert!(AgeSelection::parse_list("").is_empty());
    assert!(AgeSelection::parse_list("  ").is_empty());
  }

  #[test]
  fn record_serializes_with_source_column_names() {
    let json = serde_json::to_value(record("2021-01-01", "0-4", 100)).unwrap();
    for col in REQUIRED_COLUMNS {
      assert!(json.get(col).is_some(), "missing {col}");
    }
  }
}
