//! Period Comparator: early vs. late era means per commodity

use crate::types::{CommodityData, Period, PeriodSummary};

/// Mean production and value per (period, commodity)
///
/// Years up to and including `last_early_year` are early, later years are
/// late. Groups without rows produce no summary. Output is early before late,
/// commodities in input order.
pub fn compare_periods(commodities: &[CommodityData], last_early_year: i32) -> Vec<PeriodSummary> {
    let mut summaries = Vec::new();

    for period in [Period::Early, Period::Late] {
        for commodity in commodities {
            let (mut production, mut value, mut observations) = (0.0, 0.0, 0usize);
            for record in commodity
                .records
                .iter()
                .filter(|r| Period::classify(r.year, last_early_year) == period)
            {
                production += record.marketed_production;
                value += record.farm_value;
                observations += 1;
            }

            if observations == 0 {
                continue;
            }

            summaries.push(PeriodSummary {
                period,
                commodity: commodity.name.clone(),
                observations,
                mean_production: production / observations as f64,
                mean_value: value / observations as f64,
            });
        }
    }

    summaries
}
