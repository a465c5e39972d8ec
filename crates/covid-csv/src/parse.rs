//! Row decoding.
//!
//! Pipeline:
//!   reader
//!     └─ csv::Reader            → header row + StringRecords
//!          └─ check_headers()   → every required column present
//!               └─ RawRow       → string cells by column name
//!                    └─ decode() → Record (dates, counts, median age)

use std::{collections::HashSet, io::Read};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use covid_core::record::{
  COL_AGE, COL_CASE_BY_DAY, COL_CASES, COL_COVID_CASES_CONFIRMED,
  COL_HOSPITAL_CASE_BY_DAY, COL_HOSPITALISED_CASES,
  COL_HOSPITALISED_COVID_CASES, COL_MEDIAN_AGE, REQUIRED_COLUMNS, Record,
};
use csv::StringRecord;
use serde::Deserialize;

use crate::error::{ParseError, Result};

/// Bare date layouts; the whole cell must match.
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Date and time without an offset.
const DATETIME_FORMATS: [&str; 4] = [
  "%Y-%m-%d %H:%M:%S",
  "%Y/%m/%d %H:%M:%S",
  "%Y-%m-%dT%H:%M:%S",
  "%Y/%m/%dT%H:%M:%S",
];

/// The published export's timestamp layout, e.g. `2020/03/02 00:00:00+00`.
const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S%#z";

// ─── Raw row ─────────────────────────────────────────────────────────────────

/// The required cells of one row, undecoded. Extra columns are dropped by
/// the deserializer.
#[derive(Deserialize)]
struct RawRow {
  #[serde(rename = "StatisticsProfileDate")]
  date:                     String,
  #[serde(rename = "Age")]
  age:                      String,
  #[serde(rename = "Cases")]
  cases:                    String,
  #[serde(rename = "CaseByDay")]
  case_by_day:              String,
  #[serde(rename = "HospitalisedCases")]
  hospitalised_cases:       String,
  #[serde(rename = "HospitalCaseByDay")]
  hospital_case_by_day:     String,
  #[serde(rename = "HospitalisedCovidCases")]
  hospitalised_covid_cases: String,
  #[serde(rename = "CovidCasesConfirmed")]
  covid_cases_confirmed:    String,
  #[serde(rename = "Median_Age")]
  median_age:               String,
}

// ─── Cell decoders ───────────────────────────────────────────────────────────

pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
  let s = s.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.date_naive());
  }
  if let Ok(dt) = DateTime::parse_from_str(s, TIMESTAMP_FORMAT) {
    return Some(dt.date_naive());
  }
  DATETIME_FORMATS
    .iter()
    .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
    .map(|dt| dt.date())
    .or_else(|| {
      DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
    })
}

/// A non-negative whole count. Dataframe exports sometimes write `12.0`.
pub(crate) fn parse_count(s: &str) -> Option<u64> {
  let s = s.trim();
  if let Ok(n) = s.parse::<u64>() {
    return Some(n);
  }
  let f = s.parse::<f64>().ok()?;
  (f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64)
    .then_some(f as u64)
}

fn count(line: u64, column: &'static str, value: &str) -> Result<u64> {
  parse_count(value).ok_or_else(|| ParseError::InvalidField {
    line,
    column,
    value: value.to_owned(),
  })
}

impl RawRow {
  fn decode(self, line: u64) -> Result<Record> {
    let statistics_profile_date =
      parse_date(&self.date).ok_or_else(|| ParseError::InvalidDate {
        line,
        value: self.date.clone(),
      })?;

    let age = self.age.trim();
    if age.is_empty() {
      return Err(ParseError::InvalidField {
        line,
        column: COL_AGE,
        value: self.age.clone(),
      });
    }

    let median_age = self
      .median_age
      .trim()
      .parse::<f64>()
      .ok()
      .filter(|m| m.is_finite())
      .ok_or_else(|| ParseError::InvalidField {
        line,
        column: COL_MEDIAN_AGE,
        value: self.median_age.clone(),
      })?;

    Ok(Record {
      statistics_profile_date,
      age: age.to_owned(),
      cases: count(line, COL_CASES, &self.cases)?,
      case_by_day: count(line, COL_CASE_BY_DAY, &self.case_by_day)?,
      hospitalised_cases: count(
        line,
        COL_HOSPITALISED_CASES,
        &self.hospitalised_cases,
      )?,
      hospital_case_by_day: count(
        line,
        COL_HOSPITAL_CASE_BY_DAY,
        &self.hospital_case_by_day,
      )?,
      hospitalised_covid_cases: count(
        line,
        COL_HOSPITALISED_COVID_CASES,
        &self.hospitalised_covid_cases,
      )?,
      covid_cases_confirmed: count(
        line,
        COL_COVID_CASES_CONFIRMED,
        &self.covid_cases_confirmed,
      )?,
      median_age,
    })
  }
}

// ─── Table ───────────────────────────────────────────────────────────────────

/// Normalise header names (BOM, surrounding whitespace) and make sure every
/// required column is present.
fn check_headers(raw: &StringRecord) -> Result<StringRecord> {
  let headers: StringRecord = raw
    .iter()
    .map(|h| h.trim_start_matches('\u{feff}').trim())
    .collect();
  for column in REQUIRED_COLUMNS {
    if !headers.iter().any(|h| h == column) {
      return Err(ParseError::MissingColumn(column));
    }
  }
  Ok(headers)
}

pub(crate) fn parse_records<R: Read>(reader: R) -> Result<Vec<Record>> {
  let mut rdr = csv::ReaderBuilder::new().flexible(false).from_reader(reader);
  let headers = check_headers(rdr.headers()?)?;

  let mut records = Vec::new();
  let mut seen = HashSet::new();
  for result in rdr.records() {
    let row = result?;
    let line = row.position().map_or(0, |p| p.line());
    let raw: RawRow = row.deserialize(Some(&headers))?;
    let record = raw.decode(line)?;
    if !seen.insert((record.statistics_profile_date, record.age.clone())) {
      return Err(ParseError::DuplicateRecord {
        date: record.statistics_profile_date,
        age:  record.age,
      });
    }
    records.push(record);
  }
  Ok(records)
}
