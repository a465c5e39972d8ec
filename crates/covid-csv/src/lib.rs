//! CSV loader for the age-group case statistics table.
//!
//! Reads the raw source into a [`Dataset`]: every row as a typed
//! [`covid_core::Record`] in source order plus the distinct age groups.
//!
//! # Quick start
//!
//! ```no_run
//! let dataset = covid_csv::load_path("Covid_Tan.csv").unwrap();
//! println!("{} records, {} age groups", dataset.records.len(), dataset.age_groups.len());
//! ```

pub mod error;
mod parse;

use std::{fs::File, io::Read, path::Path};

use covid_core::Dataset;

pub use error::{ParseError, Result};

/// Load the table at `path`.
pub fn load_path(path: impl AsRef<Path>) -> Result<Dataset> {
  let path = path.as_ref();
  let file = File::open(path).map_err(|source| ParseError::Io {
    path: path.to_path_buf(),
    source,
  })?;
  let dataset = load_reader(file)?;
  tracing::info!(
    path = %path.display(),
    records = dataset.records.len(),
    age_groups = dataset.age_groups.len(),
    "loaded dataset"
  );
  Ok(dataset)
}

/// Load the table from any reader, e.g. an in-memory string.
pub fn load_reader<R: Read>(reader: R) -> Result<Dataset> {
  let records = parse::parse_records(reader)?;
  Ok(Dataset::new(records))
}
