//! Yearly Aggregator: per-year totals of area, production and value

use crate::types::{CleanRecord, Metric, YearlyMetricRow, YearlySummary};
use std::collections::BTreeMap;

/// Sum area, production and value per year, years ascending
pub fn yearly_totals(records: &[CleanRecord]) -> Vec<YearlySummary> {
    let mut by_year: BTreeMap<i32, YearlySummary> = BTreeMap::new();

    for record in records {
        let entry = by_year.entry(record.year).or_insert_with(|| YearlySummary {
            year: record.year,
            harvested_area: 0.0,
            marketed_production: 0.0,
            farm_value: 0.0,
        });
        entry.harvested_area += record.harvested_area;
        entry.marketed_production += record.marketed_production;
        entry.farm_value += record.farm_value;
    }

    by_year.into_values().collect()
}

/// Long form: one row per (year, metric), metrics in facet order within each year
pub fn to_long(summaries: &[YearlySummary]) -> Vec<YearlyMetricRow> {
    summaries
        .iter()
        .flat_map(|summary| {
            Metric::FACET_ORDER.iter().map(move |&metric| YearlyMetricRow {
                year: summary.year,
                metric,
                value: summary.get(metric),
            })
        })
        .collect()
}
