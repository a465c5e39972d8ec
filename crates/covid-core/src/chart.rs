//! Chart slots and their fixed display metadata.
//!
//! The rendering layer receives a [`ChartResult`]: the rows returned by one
//! pipeline query together with the [`ChartSpec`] describing how to draw
//! them. Column names in a spec are the serialised field names of the rows.

use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::{
  Error, Result,
  pipeline::{
    ConfirmedCasesRow, DailyCasesRow, DailyHospitalRow, MedianAgeRow,
    PctHospitalRow, Pipeline, TidyRow,
  },
  record::AgeSelection,
};

// ─── Chart identity ──────────────────────────────────────────────────────────

/// One of the dashboard's six output slots, in declared order.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
  strum::Display, strum::EnumString, strum::IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ChartId {
  TotalConfirmedCases,
  MedianAge,
  DailyCases,
  DailyHospitalised,
  PctHospitalisedPerCase,
  HospitalisedVsConfirmed,
}

impl ChartId {
  pub const ALL: [ChartId; 6] = [
    ChartId::TotalConfirmedCases,
    ChartId::MedianAge,
    ChartId::DailyCases,
    ChartId::DailyHospitalised,
    ChartId::PctHospitalisedPerCase,
    ChartId::HospitalisedVsConfirmed,
  ];

  pub fn parse(s: &str) -> Result<Self> {
    ChartId::from_str(s).map_err(|_| Error::UnknownChart(s.to_owned()))
  }

  pub fn spec(self) -> &'static ChartSpec { &SPECS[self as usize] }

  /// Whether the chart ignores the checklist.
  pub fn is_unfiltered(self) -> bool { self == ChartId::MedianAge }
}

// ─── Display metadata ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
  Line,
  Bar,
  /// Bars of the same category drawn side by side, split by `color`.
  GroupedBar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
  Vertical,
  Horizontal,
}

/// Static description of how a chart is drawn.
#[derive(Debug, PartialEq, Serialize)]
pub struct ChartSpec {
  pub kind:        ChartKind,
  pub title:       &'static str,
  pub x:           &'static str,
  pub y:           &'static str,
  /// Column that splits the rows into separately coloured traces.
  pub color:       Option<&'static str>,
  pub orientation: Orientation,
  /// Column name → axis/legend label.
  #[serde(serialize_with = "labels_as_map")]
  pub labels:      &'static [(&'static str, &'static str)],
}

impl ChartSpec {
  pub fn label(&self, column: &str) -> Option<&'static str> {
    self
      .labels
      .iter()
      .find(|(c, _)| *c == column)
      .map(|(_, l)| *l)
  }
}

fn labels_as_map<S: Serializer>(
  labels: &&'static [(&'static str, &'static str)],
  serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
  serializer.collect_map(labels.iter().copied())
}

/// Indexed by `ChartId as usize`.
static SPECS: [ChartSpec; 6] = [
  ChartSpec {
    kind:        ChartKind::Line,
    title:       "Total Confirmed Cases By Date",
    x:           "StatisticsProfileDate",
    y:           "Cases",
    color:       Some("Age"),
    orientation: Orientation::Vertical,
    labels:      &[
      ("StatisticsProfileDate", "Statistics Date"),
      ("Cases", "Total Confirmed Cases"),
      ("Age", "Age Group"),
    ],
  },
  ChartSpec {
    kind:        ChartKind::Line,
    title:       "Median Age of Total Confirmed Cases By Date",
    x:           "StatisticsProfileDate",
    y:           "Median_Age",
    color:       None,
    orientation: Orientation::Vertical,
    labels:      &[
      ("StatisticsProfileDate", "Statistics Date"),
      ("Median_Age", "Median Age"),
    ],
  },
  ChartSpec {
    kind:        ChartKind::Line,
    title:       "Daily Confirmed Cases",
    x:           "StatisticsProfileDate",
    y:           "CaseByDay",
    color:       Some("Age"),
    orientation: Orientation::Vertical,
    labels:      &[
      ("StatisticsProfileDate", "Statistics Date"),
      ("CaseByDay", "Confirmed Cases"),
      ("Age", "Age Group"),
    ],
  },
  ChartSpec {
    kind:        ChartKind::Line,
    title:       "Daily Hospitalised Cases",
    x:           "StatisticsProfileDate",
    y:           "HospitalCaseByDay",
    color:       Some("Age"),
    orientation: Orientation::Vertical,
    labels:      &[
      ("StatisticsProfileDate", "Statistics Date"),
      ("HospitalCaseByDay", "Hospitalised Cases"),
      ("Age", "Age Group"),
    ],
  },
  ChartSpec {
    kind:        ChartKind::Bar,
    title:       "Percentage of Total Hospitalised Cases per Total Confirmed Cases",
    x:           "HospitalisedPercentagePerCase",
    y:           "Age",
    color:       None,
    orientation: Orientation::Horizontal,
    labels:      &[
      ("HospitalisedPercentagePerCase", "Percentage of Hospitalised Cases"),
      ("Age", "Age Group"),
    ],
  },
  ChartSpec {
    kind:        ChartKind::GroupedBar,
    title:       "Percentage of Hospitalised Cases and Confirmed Cases by Age Groups",
    x:           "Percentage",
    y:           "Age",
    color:       Some("Type"),
    orientation: Orientation::Horizontal,
    labels:      &[
      ("Percentage", "Percentage %"),
      ("Type", ""),
      ("Age", "Age Group"),
    ],
  },
];

// ─── Results ─────────────────────────────────────────────────────────────────

/// The rows for one chart, borrowed from the [`Pipeline`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChartRows<'a> {
  ConfirmedCases(Vec<ConfirmedCasesRow<'a>>),
  MedianAge(Vec<MedianAgeRow>),
  DailyCases(Vec<DailyCasesRow<'a>>),
  DailyHospital(Vec<DailyHospitalRow<'a>>),
  PctHospital(Vec<PctHospitalRow<'a>>),
  Relation(Vec<&'a TidyRow>),
}

impl ChartRows<'_> {
  pub fn len(&self) -> usize {
    match self {
      ChartRows::ConfirmedCases(r) => r.len(),
      ChartRows::MedianAge(r) => r.len(),
      ChartRows::DailyCases(r) => r.len(),
      ChartRows::DailyHospital(r) => r.len(),
      ChartRows::PctHospital(r) => r.len(),
      ChartRows::Relation(r) => r.len(),
    }
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

/// Tabular result plus display metadata for one chart slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartResult<'a> {
  pub chart: ChartId,
  pub spec:  &'static ChartSpec,
  pub rows:  ChartRows<'a>,
}

impl Pipeline {
  /// Run the query behind `chart` for the current selection.
  pub fn chart(&self, chart: ChartId, ages: &AgeSelection) -> ChartResult<'_> {
    let rows = match chart {
      ChartId::TotalConfirmedCases => {
        ChartRows::ConfirmedCases(self.confirmed_cases_by_date(ages))
      }
      ChartId::MedianAge => ChartRows::MedianAge(self.median_age_by_date()),
      ChartId::DailyCases => ChartRows::DailyCases(self.daily_cases_by_age(ages)),
      ChartId::DailyHospitalised => {
        ChartRows::DailyHospital(self.daily_hospital_by_age(ages))
      }
      ChartId::PctHospitalisedPerCase => {
        ChartRows::PctHospital(self.pct_hospital_per_case(ages))
      }
      ChartId::HospitalisedVsConfirmed => {
        ChartRows::Relation(self.relation_hospital_case(ages))
      }
    };
    ChartResult { chart, spec: chart.spec(), rows }
  }
}
