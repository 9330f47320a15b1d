//! Variability Analyzer: per-region mean, standard deviation and CV

use super::stats::{coefficient_of_variation, mean, sample_std_dev};
use crate::types::{CleanRecord, Dispersion, VariabilityRecord};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Which measure to order a variability table by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariabilityMeasure {
    Production,
    Value,
}

impl VariabilityMeasure {
    pub fn of(self, record: &VariabilityRecord) -> &Dispersion {
        match self {
            VariabilityMeasure::Production => &record.production,
            VariabilityMeasure::Value => &record.value,
        }
    }
}

fn dispersion(values: &[f64]) -> Dispersion {
    let mean = mean(values).unwrap_or(0.0);
    let std_dev = sample_std_dev(values);
    Dispersion {
        mean,
        std_dev,
        cv: coefficient_of_variation(std_dev, mean),
    }
}

/// Dispersion of production and value across each region's years, regions alphabetical
pub fn variability(records: &[CleanRecord]) -> Vec<VariabilityRecord> {
    let mut by_region: BTreeMap<&str, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for record in records {
        let (production, value) = by_region.entry(record.region.as_str()).or_default();
        production.push(record.marketed_production);
        value.push(record.farm_value);
    }

    by_region
        .into_iter()
        .map(|(region, (production, value))| VariabilityRecord {
            region: region.to_string(),
            years: production.len(),
            production: dispersion(&production),
            value: dispersion(&value),
        })
        .collect()
}

/// Most stable first: ascending CV, undefined CVs last, ties by region name
pub fn rank_by_stability(
    records: &[VariabilityRecord],
    measure: VariabilityMeasure,
) -> Vec<VariabilityRecord> {
    let mut ranked = records.to_vec();
    ranked.sort_by(|a, b| {
        let order = match (measure.of(a).cv, measure.of(b).cv) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        order.then_with(|| a.region.cmp(&b.region))
    });
    ranked
}
