//! Top-Producer Ranker
//!
//! Lifetime totals per region, the top regions by farm value and by marketed
//! production, and the yearly series of those regions.

use crate::types::{CleanRecord, RankMetric, RegionTotals, SeriesPoint, TopProducers};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Lifetime sums of value and production per region, alphabetical
pub fn region_totals(records: &[CleanRecord]) -> Vec<RegionTotals> {
    let mut by_region: BTreeMap<&str, RegionTotals> = BTreeMap::new();

    for record in records {
        let entry = by_region
            .entry(record.region.as_str())
            .or_insert_with(|| RegionTotals {
                region: record.region.clone(),
                farm_value: 0.0,
                marketed_production: 0.0,
            });
        entry.farm_value += record.farm_value;
        entry.marketed_production += record.marketed_production;
    }

    by_region.into_values().collect()
}

/// The `n` largest regions by `metric`, descending; equal totals fall back to region name
pub fn top_regions(totals: &[RegionTotals], metric: RankMetric, n: usize) -> Vec<RegionTotals> {
    let mut ranked = totals.to_vec();
    ranked.sort_by(|a, b| {
        metric
            .of_totals(b)
            .partial_cmp(&metric.of_totals(a))
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.region.cmp(&b.region))
    });
    ranked.truncate(n);
    ranked
}

/// Top `n` by value and by production, plus the regions common to both
pub fn top_producers(records: &[CleanRecord], n: usize) -> TopProducers {
    let totals = region_totals(records);
    let by_value = top_regions(&totals, RankMetric::FarmValue, n);
    let by_production = top_regions(&totals, RankMetric::MarketedProduction, n);

    let overlap = by_value
        .iter()
        .filter(|v| by_production.iter().any(|p| p.region == v.region))
        .map(|v| v.region.clone())
        .collect();

    TopProducers {
        by_value,
        by_production,
        overlap,
    }
}

/// Yearly sums of `metric` for the given regions
///
/// Rows are ordered by year, then by the order of `regions` (rank order).
pub fn region_series(
    records: &[CleanRecord],
    regions: &[String],
    metric: RankMetric,
) -> Vec<SeriesPoint> {
    let rank: HashMap<&str, usize> = regions
        .iter()
        .enumerate()
        .map(|(idx, region)| (region.as_str(), idx))
        .collect();

    let mut sums: BTreeMap<(i32, usize), f64> = BTreeMap::new();
    for record in records {
        if let Some(&idx) = rank.get(record.region.as_str()) {
            *sums.entry((record.year, idx)).or_insert(0.0) += metric.of_record(record);
        }
    }

    sums.into_iter()
        .map(|((year, idx), value)| SeriesPoint {
            year,
            region: regions[idx].clone(),
            value,
        })
        .collect()
}

/// Region names of a ranking, in rank order
pub fn region_names(ranking: &[RegionTotals]) -> Vec<String> {
    ranking.iter().map(|r| r.region.clone()).collect()
}
