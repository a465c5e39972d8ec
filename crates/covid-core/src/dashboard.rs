//! The checklist's change handler.
//!
//! One input (the age-group selection) drives six outputs. The handler runs
//! every chart query once, in declared output order, and hands back a
//! [`DashboardUpdate`] whose fields line up with the output slots.

use serde::Serialize;

use crate::{
  Pipeline,
  chart::{ChartId, ChartResult},
  record::AgeSelection,
};

/// The six chart results produced for one selection, in output order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DashboardUpdate<'a> {
  pub total_confirmed_cases:     ChartResult<'a>,
  pub median_age:                ChartResult<'a>,
  pub daily_cases:               ChartResult<'a>,
  pub daily_hospitalised:        ChartResult<'a>,
  pub pct_hospitalised_per_case: ChartResult<'a>,
  pub hospitalised_vs_confirmed: ChartResult<'a>,
}

impl<'a> DashboardUpdate<'a> {
  /// The results as an array ordered like [`ChartId::ALL`].
  pub fn charts(&self) -> [&ChartResult<'a>; 6] {
    [
      &self.total_confirmed_cases,
      &self.median_age,
      &self.daily_cases,
      &self.daily_hospitalised,
      &self.pct_hospitalised_per_case,
      &self.hospitalised_vs_confirmed,
    ]
  }
}

/// Recompute every chart for a new checklist value.
pub fn on_selection_change<'a>(
  pipeline: &'a Pipeline,
  ages: &AgeSelection,
) -> DashboardUpdate<'a> {
  let chart = move |id| pipeline.chart(id, ages);
  DashboardUpdate {
    total_confirmed_cases:     chart(ChartId::TotalConfirmedCases),
    median_age:                chart(ChartId::MedianAge),
    daily_cases:               chart(ChartId::DailyCases),
    daily_hospitalised:        chart(ChartId::DailyHospitalised),
    pct_hospitalised_per_case: chart(ChartId::PctHospitalisedPerCase),
    hospitalised_vs_confirmed: chart(ChartId::HospitalisedVsConfirmed),
  }
}
