//! Core types and the derivation pipeline for the COVID-19 age-group
//! dashboard.
//!
//! This crate is deliberately free of HTTP and file-format dependencies.
//! The loader (`covid-csv`) produces a [`Dataset`]; everything else is
//! computed here, once, and then only read.

pub mod chart;
pub mod dashboard;
pub mod error;
pub mod pipeline;
pub mod record;

pub use error::{Error, Result};
pub use pipeline::Pipeline;
pub use record::{AgeGroups, AgeSelection, Dataset, Record};
