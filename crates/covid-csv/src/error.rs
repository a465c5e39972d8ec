//! Error types for the covid-csv loader.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Any failure while loading the source table. All are fatal: no partial
/// dataset is ever returned.
#[derive(Debug, Error)]
pub enum ParseError {
  #[error("cannot read {path:?}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("malformed CSV: {0}")]
  Csv(#[from] csv::Error),

  #[error("missing required column {0:?}")]
  MissingColumn(&'static str),

  #[error("line {line}: invalid date {value:?}")]
  InvalidDate { line: u64, value: String },

  #[error("line {line}: invalid {column} value {value:?}")]
  InvalidField {
    line:   u64,
    column: &'static str,
    value:  String,
  },

  #[error("duplicate record for age {age:?} on {date}")]
  DuplicateRecord { date: NaiveDate, age: String },
}

pub type Result<T, E = ParseError> = std::result::Result<T, E>;
