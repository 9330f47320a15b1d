//! Delimited-text and JSON artifacts for downstream tooling

use crate::error::{CropError, CropResult};
use crate::pipeline::Analysis;
use crate::types::{RegionTotals, SeriesPoint};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Marker written for statistics that cannot be computed
pub const UNDEFINED: &str = "NA";

pub fn format_measure(value: Option<f64>) -> String {
    value.map_or_else(|| UNDEFINED.to_string(), |v| v.to_string())
}

#[derive(Serialize)]
struct YearlyMetricCsv<'a> {
    year: i32,
    metric: &'a str,
    value: f64,
}

#[derive(Serialize)]
struct RankingCsv<'a> {
    rank: usize,
    region: &'a str,
    farm_value: f64,
    marketed_production: f64,
}

#[derive(Serialize)]
struct VariabilityCsv<'a> {
    region: &'a str,
    years: usize,
    production_mean: f64,
    production_sd: String,
    production_cv: String,
    value_mean: f64,
    value_sd: String,
    value_cv: String,
}

#[derive(Serialize)]
struct YieldPriceCsv<'a> {
    commodity: &'a str,
    year: i32,
    measure: String,
    value: f64,
}

#[derive(Serialize)]
struct PeriodCsv<'a> {
    period: String,
    years: String,
    commodity: &'a str,
    observations: usize,
    mean_production: f64,
    mean_value: f64,
}

fn write_rows<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> CropResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_ranking(path: &Path, ranking: &[RegionTotals]) -> CropResult<()> {
    write_rows(
        path,
        ranking.iter().enumerate().map(|(idx, r)| RankingCsv {
            rank: idx + 1,
            region: &r.region,
            farm_value: r.farm_value,
            marketed_production: r.marketed_production,
        }),
    )
}

fn write_series(path: &Path, series: &[SeriesPoint]) -> CropResult<()> {
    write_rows(path, series)
}

/// File-name-safe form of a commodity name; prefixes every per-commodity CSV
pub fn file_stem(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// Write every derived table as CSV into `dir`, returning the files written
pub fn write_csv_tables(analysis: &Analysis, dir: &Path) -> CropResult<Vec<PathBuf>> {
    let mut stems: HashMap<String, &str> = HashMap::new();
    for commodity in &analysis.commodities {
        if let Some(other) = stems.insert(file_stem(&commodity.name), &commodity.name) {
            return Err(CropError::Validation(format!(
                "Commodities '{}' and '{}' would write the same CSV files",
                other, commodity.name
            )));
        }
    }

    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    for commodity in &analysis.commodities {
        let stem = file_stem(&commodity.name);
        let path = |suffix: &str| dir.join(format!("{}_{}.csv", stem, suffix));

        let p = path("yearly");
        write_rows(&p, &commodity.yearly)?;
        written.push(p);

        let p = path("yearly_long");
        write_rows(
            &p,
            commodity.yearly_long.iter().map(|r| YearlyMetricCsv {
                year: r.year,
                metric: r.metric.key(),
                value: r.value,
            }),
        )?;
        written.push(p);

        let p = path("top_value");
        write_ranking(&p, &commodity.top.by_value)?;
        written.push(p);

        let p = path("top_production");
        write_ranking(&p, &commodity.top.by_production)?;
        written.push(p);

        let p = path("top_value_series");
        write_series(&p, &commodity.top_value_series)?;
        written.push(p);

        let p = path("top_production_series");
        write_series(&p, &commodity.top_production_series)?;
        written.push(p);

        let p = path("variability");
        write_rows(
            &p,
            commodity.variability.iter().map(|v| VariabilityCsv {
                region: &v.region,
                years: v.years,
                production_mean: v.production.mean,
                production_sd: format_measure(v.production.std_dev),
                production_cv: format_measure(v.production.cv),
                value_mean: v.value.mean,
                value_sd: format_measure(v.value.std_dev),
                value_cv: format_measure(v.value.cv),
            }),
        )?;
        written.push(p);
    }

    let p = dir.join("yield_price.csv");
    write_rows(
        &p,
        analysis.yield_price.iter().map(|r| YieldPriceCsv {
            commodity: &r.commodity,
            year: r.year,
            measure: r.measure.to_string(),
            value: r.value,
        }),
    )?;
    written.push(p);

    let boundary = analysis.config.period_boundary;
    let p = dir.join("periods.csv");
    write_rows(
        &p,
        analysis.periods.iter().map(|s| PeriodCsv {
            period: s.period.to_string(),
            years: s.period.label(boundary),
            commodity: &s.commodity,
            observations: s.observations,
            mean_production: s.mean_production,
            mean_value: s.mean_value,
        }),
    )?;
    written.push(p);

    Ok(written)
}

/// Write the whole analysis as one pretty-printed JSON document
pub fn write_json(analysis: &Analysis, path: &Path) -> CropResult<()> {
    let json = serde_json::to_string_pretty(analysis)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_measure() {
        assert_eq!(format_measure(None), "NA");
        assert_eq!(format_measure(Some(0.25)), "0.25");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("Carrot"), "carrot");
        assert_eq!(file_stem("Field Tomato"), "field_tomato");
    }
}
