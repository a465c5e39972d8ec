//! Derivation & filter pipeline.
//!
//! Built once from a [`Dataset`]:
//!
//!   records
//!     └─ build_latest_snapshot() → LatestSnapshot (+ percentage columns)
//!          └─ build_tidy_relation() → TidyRelation (long form)
//!
//! After construction nothing is mutated. Every query is a read-only
//! projection of the stored tables filtered by an [`AgeSelection`].

use chrono::NaiveDate;
use serde::Serialize;

use crate::record::{AgeGroups, AgeSelection, Dataset, Record};

/// `median_age_by_date` always returns the first this-many records in load
/// order, whatever the selection.
// FIXME: this is a head slice of the raw rows, not a date window. Replace
// with a date-range filter once the intended window is known.
pub const MEDIAN_AGE_ROW_LIMIT: usize = 660;

// ─── Derived tables ──────────────────────────────────────────────────────────

/// `numerator × 100 / denominator`, or `None` when the denominator is zero.
pub fn percentage(numerator: u64, denominator: u64) -> Option<f64> {
  (denominator != 0).then(|| numerator as f64 * 100.0 / denominator as f64)
}

/// A max-date row with its derived percentage columns.
///
/// A `None` percentage marks a zero denominator and serialises as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotRow {
  #[serde(rename = "StatisticsProfileDate")]
  pub date:                             NaiveDate,
  #[serde(rename = "Age")]
  pub age:                              String,
  #[serde(rename = "Cases")]
  pub cases:                            u64,
  #[serde(rename = "HospitalisedCases")]
  pub hospitalised_cases:               u64,
  #[serde(rename = "HospitalisedCovidCases")]
  pub hospitalised_covid_cases:         u64,
  #[serde(rename = "CovidCasesConfirmed")]
  pub covid_cases_confirmed:            u64,
  /// Share of this group's cases that were hospitalised.
  #[serde(rename = "HospitalisedPercentagePerCase")]
  pub hospitalised_percentage_per_case: Option<f64>,
  /// This group's share of all hospitalised cases.
  #[serde(rename = "Hospitalised")]
  pub hospitalised:                     Option<f64>,
  /// This group's share of all confirmed cases.
  #[serde(rename = "Confirmed Cases")]
  pub confirmed_cases:                  Option<f64>,
}

impl SnapshotRow {
  fn derive(r: &Record) -> Self {
    Self {
      date:                             r.statistics_profile_date,
      age:                              r.age.clone(),
      cases:                            r.cases,
      hospitalised_cases:               r.hospitalised_cases,
      hospitalised_covid_cases:         r.hospitalised_covid_cases,
      covid_cases_confirmed:            r.covid_cases_confirmed,
      hospitalised_percentage_per_case: percentage(r.hospitalised_cases, r.cases),
      hospitalised:                     percentage(
        r.hospitalised_cases,
        r.hospitalised_covid_cases,
      ),
      confirmed_cases:                  percentage(r.cases, r.covid_cases_confirmed),
    }
  }
}

/// The records at the maximum statistics date, one per age group.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatestSnapshot {
  pub date: Option<NaiveDate>,
  pub rows: Vec<SnapshotRow>,
}

/// Which percentage a [`TidyRow`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
pub enum PercentageType {
  #[serde(rename = "Confirmed Cases")]
  #[strum(serialize = "Confirmed Cases")]
  ConfirmedCases,
  #[serde(rename = "Hospitalised")]
  #[strum(serialize = "Hospitalised")]
  Hospitalised,
}

/// One row of the long-form reshape of the snapshot's percentage columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TidyRow {
  #[serde(rename = "Age")]
  pub age:        String,
  #[serde(rename = "Type")]
  pub kind:       PercentageType,
  #[serde(rename = "Percentage")]
  pub percentage: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TidyRelation(pub Vec<TidyRow>);

/// Select the max-date rows and attach the derived percentage columns.
///
/// Rows keep their source order. An empty input yields an empty snapshot.
pub fn build_latest_snapshot(records: &[Record]) -> LatestSnapshot {
  let Some(date) = records.iter().map(|r| r.statistics_profile_date).max()
  else {
    return LatestSnapshot::default();
  };
  let rows = records
    .iter()
    .filter(|r| r.statistics_profile_date == date)
    .map(SnapshotRow::derive)
    .collect();
  LatestSnapshot { date: Some(date), rows }
}

/// Melt `(Age, Confirmed Cases, Hospitalised)` into `(Age, Type, Percentage)`.
///
/// Every age's `Confirmed Cases` row comes first, then every age's
/// `Hospitalised` row.
pub fn build_tidy_relation(snapshot: &LatestSnapshot) -> TidyRelation {
  let melt = |kind: PercentageType| {
    snapshot.rows.iter().map(move |row| TidyRow {
      age: row.age.clone(),
      kind,
      percentage: match kind {
        PercentageType::ConfirmedCases => row.confirmed_cases,
        PercentageType::Hospitalised => row.hospitalised,
      },
    })
  };
  TidyRelation(
    melt(PercentageType::ConfirmedCases)
      .chain(melt(PercentageType::Hospitalised))
      .collect(),
  )
}

// ─── Query rows ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmedCasesRow<'a> {
  #[serde(rename = "StatisticsProfileDate")]
  pub date:  NaiveDate,
  #[serde(rename = "Age")]
  pub age:   &'a str,
  #[serde(rename = "Cases")]
  pub cases: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedianAgeRow {
  #[serde(rename = "StatisticsProfileDate")]
  pub date:       NaiveDate,
  #[serde(rename = "Median_Age")]
  pub median_age: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCasesRow<'a> {
  #[serde(rename = "StatisticsProfileDate")]
  pub date:        NaiveDate,
  #[serde(rename = "Age")]
  pub age:         &'a str,
  #[serde(rename = "CaseByDay")]
  pub case_by_day: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyHospitalRow<'a> {
  #[serde(rename = "StatisticsProfileDate")]
  pub date:                 NaiveDate,
  #[serde(rename = "Age")]
  pub age:                  &'a str,
  #[serde(rename = "HospitalCaseByDay")]
  pub hospital_case_by_day: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PctHospitalRow<'a> {
  #[serde(rename = "Age")]
  pub age:                              &'a str,
  #[serde(rename = "HospitalisedPercentagePerCase")]
  pub hospitalised_percentage_per_case: Option<f64>,
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

/// Owns the loaded records and every table derived from them.
///
/// Immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Pipeline {
  records:    Vec<Record>,
  age_groups: AgeGroups,
  snapshot:   LatestSnapshot,
  tidy:       TidyRelation,
}

impl Pipeline {
  pub fn new(dataset: Dataset) -> Self {
    let Dataset { records, age_groups } = dataset;
    let snapshot = build_latest_snapshot(&records);
    let tidy = build_tidy_relation(&snapshot);
    Self { records, age_groups, snapshot, tidy }
  }

  pub fn records(&self) -> &[Record] { &self.records }

  pub fn age_groups(&self) -> &AgeGroups { &self.age_groups }

  pub fn latest_snapshot(&self) -> &LatestSnapshot { &self.snapshot }

  pub fn tidy_relation(&self) -> &TidyRelation { &self.tidy }

  pub fn latest_date(&self) -> Option<NaiveDate> { self.snapshot.date }

  /// Earliest and latest statistics dates present.
  pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
    let dates = self.records.iter().map(|r| r.statistics_profile_date);
    let first = dates.clone().min()?;
    let last = dates.max()?;
    Some((first, last))
  }

  fn selected<'a>(
    &'a self,
    ages: &AgeSelection,
  ) -> impl Iterator<Item = &'a Record> {
    self.records.iter().filter(move |r| ages.contains(&r.age))
  }

  /// Cumulative cases per selected age, by date then age-group order.
  pub fn confirmed_cases_by_date(
    &self,
    ages: &AgeSelection,
  ) -> Vec<ConfirmedCasesRow<'_>> {
    let mut rows: Vec<_> = self
      .selected(ages)
      .map(|r| ConfirmedCasesRow {
        date:  r.statistics_profile_date,
        age:   &r.age,
        cases: r.cases,
      })
      .collect();
    rows.sort_by_key(|row| {
      (row.date, self.age_groups.position(row.age).unwrap_or(usize::MAX))
    });
    rows
  }

  /// The median age of confirmed cases over the first
  /// [`MEDIAN_AGE_ROW_LIMIT`] records. Never filtered.
  pub fn median_age_by_date(&self) -> Vec<MedianAgeRow> {
    self
      .records
      .iter()
      .take(MEDIAN_AGE_ROW_LIMIT)
      .map(|r| MedianAgeRow {
        date:       r.statistics_profile_date,
        median_age: r.median_age,
      })
      .collect()
  }

  pub fn daily_cases_by_age(&self, ages: &AgeSelection) -> Vec<DailyCasesRow<'_>> {
    self
      .selected(ages)
      .map(|r| DailyCasesRow {
        date:        r.statistics_profile_date,
        age:         &r.age,
        case_by_day: r.case_by_day,
      })
      .collect()
  }

  pub fn daily_hospital_by_age(
    &self,
    ages: &AgeSelection,
  ) -> Vec<DailyHospitalRow<'_>> {
    self
      .selected(ages)
      .map(|r| DailyHospitalRow {
        date:                 r.statistics_profile_date,
        age:                  &r.age,
        hospital_case_by_day: r.hospital_case_by_day,
      })
      .collect()
  }

  pub fn pct_hospital_per_case(
    &self,
    ages: &AgeSelection,
  ) -> Vec<PctHospitalRow<'_>> {
    self
      .snapshot
      .rows
      .iter()
      .filter(|row| ages.contains(&row.age))
      .map(|row| PctHospitalRow {
        age:                              &row.age,
        hospitalised_percentage_per_case: row.hospitalised_percentage_per_case,
      })
      .collect()
  }

  pub fn relation_hospital_case(&self, ages: &AgeSelection) -> Vec<&TidyRow> {
    self.tidy.0.iter().filter(|row| ages.contains(&row.age)).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::tests::record;

  fn snapshot_record(age: &str, cases: u64, hosp: u64, hosp_total: u64, total: u64) -> Record {
    Record {
      cases,
      hospitalised_cases: hosp,
      hospitalised_covid_cases: hosp_total,
      covid_cases_confirmed: total,
      ..record("2021-01-01", age, 0)
    }
  }

  fn sample() -> Pipeline {
    Pipeline::new(Dataset::new(vec![
      record("2020-12-31", "0-4", 10),
      record("2020-12-31", "25-34", 80),
      record("2020-12-31", "65+", 50),
      snapshot_record("0-4", 20, 1, 50, 200),
      snapshot_record("25-34", 100, 10, 50, 200),
      snapshot_record("65+", 0, 0, 50, 200),
    ]))
  }

  fn all(p: &Pipeline) -> AgeSelection { p.age_groups().all_selected() }

  // ── Derivation ─────────────────────────────────────────────────────────────

  #[test]
  fn percentage_of_zero_denominator_is_undefined() {
    assert_eq!(percentage(10, 0), None);
    assert_eq!(percentage(0, 0), None);
    assert_eq!(percentage(10, 100), Some(10.0));
  }

  #[test]
  fn snapshot_has_one_row_per_age_at_max_date() {
    let p = sample();
    let snapshot = p.latest_snapshot();
    let max = "2021-01-01".parse::<NaiveDate>().unwrap();
    assert_eq!(snapshot.date, Some(max));
    assert_eq!(snapshot.rows.len(), p.age_groups().len());
    assert!(snapshot.rows.iter().all(|r| r.date == max));
    let ages: Vec<_> = snapshot.rows.iter().map(|r| r.age.as_str()).collect();
    assert_eq!(ages, vec!["0-4", "25-34", "65+"]);
  }

  #[test]
  fn snapshot_derives_all_three_percentages() {
    let p = sample();
    let row = &p.latest_snapshot().rows[1];
    assert_eq!(row.hospitalised_percentage_per_case, Some(10.0));
    assert_eq!(row.hospitalised, Some(20.0));
    assert_eq!(row.confirmed_cases, Some(50.0));
  }

  #[test]
  fn zero_cases_yields_undefined_not_a_crash() {
    let p = sample();
    let row = &p.latest_snapshot().rows[2];
    assert_eq!(row.age, "65+");
    assert_eq!(row.hospitalised_percentage_per_case, None);
    assert_eq!(row.confirmed_cases, Some(0.0));
  }

  #[test]
  fn empty_records_give_empty_tables() {
    let p = Pipeline::new(Dataset::default());
    assert_eq!(p.latest_snapshot(), &LatestSnapshot::default());
    assert!(p.tidy_relation().0.is_empty());
    assert_eq!(p.date_range(), None);
    assert!(p.median_age_by_date().is_empty());
  }

  #[test]
  fn tidy_relation_has_each_age_once_per_type() {
    let p = sample();
    let tidy = &p.tidy_relation().0;
    assert_eq!(tidy.len(), 2 * p.age_groups().len());
    for age in p.age_groups().iter() {
      let kinds: Vec<_> =
        tidy.iter().filter(|r| r.age == age).map(|r| r.kind).collect();
      assert_eq!(
        kinds,
        vec![PercentageType::ConfirmedCases, PercentageType::Hospitalised]
      );
    }
    assert_eq!(tidy[1].kind, PercentageType::ConfirmedCases);
    assert_eq!(tidy[1].percentage, Some(50.0));
    assert_eq!(tidy[4].kind, PercentageType::Hospitalised);
    assert_eq!(tidy[4].percentage, Some(20.0));
  }

  #[test]
  fn tidy_type_serialises_as_column_label() {
    let p = sample();
    let json = serde_json::to_value(&p.tidy_relation().0[0]).unwrap();
    assert_eq!(json["Type"], "Confirmed Cases");
    assert_eq!(json["Age"], "0-4");
    assert_eq!(PercentageType::Hospitalised.to_string(), "Hospitalised");
  }

  // ── Queries ────────────────────────────────────────────────────────────────

  #[test]
  fn daily_cases_is_exactly_the_selected_records() {
    let p = sample();
    let sel = AgeSelection::new(["0-4", "65+"]);
    let rows = p.daily_cases_by_age(&sel);
    let expected: Vec<_> = p
      .records()
      .iter()
      .filter(|r| sel.contains(&r.age))
      .map(|r| (r.statistics_profile_date, r.age.as_str(), r.case_by_day))
      .collect();
    let got: Vec<_> =
      rows.iter().map(|r| (r.date, r.age, r.case_by_day)).collect();
    assert_eq!(got, expected);
  }

  #[test]
  fn confirmed_cases_are_ordered_by_date_then_age_group() {
    let p = Pipeline::new(Dataset::new(vec![
      record("2021-01-02", "25-34", 3),
      record("2021-01-01", "0-4", 1),
      record("2021-01-01", "25-34", 2),
      record("2021-01-02", "0-4", 4),
    ]));
    let rows = p.confirmed_cases_by_date(&all(&p));
    let got: Vec<_> = rows.iter().map(|r| (r.age, r.cases)).collect();
    assert_eq!(got, vec![("25-34", 2), ("0-4", 1), ("25-34", 3), ("0-4", 4)]);
  }

  #[test]
  fn daily_hospital_filters_by_selection() {
    let p = sample();
    let rows = p.daily_hospital_by_age(&AgeSelection::new(["25-34"]));
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.age == "25-34"));
    assert_eq!(rows[0].hospital_case_by_day, 0);
    assert_eq!(rows[1].hospital_case_by_day, 0);
  }

  #[test]
  fn pct_hospital_per_case_for_single_age() {
    let p = sample();
    let rows = p.pct_hospital_per_case(&AgeSelection::new(["25-34"]));
    assert_eq!(rows, vec![PctHospitalRow {
      age:                              "25-34",
      hospitalised_percentage_per_case: Some(10.0),
    }]);
  }

  #[test]
  fn relation_filters_tidy_rows() {
    let p = sample();
    let rows = p.relation_hospital_case(&AgeSelection::new(["0-4"]));
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.age == "0-4"));
  }

  #[test]
  fn empty_selection_yields_no_rows() {
    let p = sample();
    let none = AgeSelection::empty();
    assert!(p.confirmed_cases_by_date(&none).is_empty());
    assert!(p.daily_cases_by_age(&none).is_empty());
    assert!(p.daily_hospital_by_age(&none).is_empty());
    assert!(p.pct_hospital_per_case(&none).is_empty());
    assert!(p.relation_hospital_case(&none).is_empty());
    assert_eq!(p.median_age_by_date().len(), p.records().len());
  }

  #[test]
  fn unknown_labels_match_nothing() {
    let p = sample();
    let sel = AgeSelection::new(["Unknown", "0-4"]);
    assert_eq!(p.daily_cases_by_age(&sel).len(), 2);
    assert!(p.daily_cases_by_age(&AgeSelection::new(["Unknown"])).is_empty());
  }

  #[test]
  fn median_age_is_capped_head_slice_in_load_order() {
    let records: Vec<_> = (0..700)
      .map(|i| {
        let date = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap()
          + chrono::Days::new(i / 10);
        Record {
          statistics_profile_date: date,
          median_age: i as f64,
          ..record("2020-01-01", &format!("g{}", i % 10), 1)
        }
      })
      .collect();
    let p = Pipeline::new(Dataset::new(records));
    let rows = p.median_age_by_date();
    assert_eq!(rows.len(), MEDIAN_AGE_ROW_LIMIT);
    assert_eq!(rows[0].median_age, 0.0);
    assert_eq!(rows[659].median_age, 659.0);
  }

  #[test]
  fn queries_are_idempotent() {
    let p = sample();
    let sel = AgeSelection::new(["0-4", "25-34"]);
    assert_eq!(p.confirmed_cases_by_date(&sel), p.confirmed_cases_by_date(&sel));
    assert_eq!(p.pct_hospital_per_case(&sel), p.pct_hospital_per_case(&sel));
    assert_eq!(p.relation_hospital_case(&sel), p.relation_hospital_case(&sel));
  }

  #[test]
  fn date_range_spans_all_records() {
    let p = sample();
    let (first, last) = p.date_range().unwrap();
    assert_eq!(first, "2020-12-31".parse::<NaiveDate>().unwrap());
    assert_eq!(last, "2021-01-01".parse::<NaiveDate>().unwrap());
    assert_eq!(p.latest_date(), Some(last));
  }
}
