//! Pipeline orchestration: load → clean → every derived table

use crate::config::PipelineConfig;
use crate::core::{self, VariabilityMeasure};
use crate::error::CropResult;
use crate::excel::WorkbookLoader;
use crate::types::{
    CleanStats, CommodityData, CommodityTable, PeriodSummary, RankMetric, SeriesPoint,
    TopProducers, VariabilityRecord, YearlyMetricRow, YearlySummary, YieldPriceRow,
};
use serde::Serialize;
use tracing::info;

/// What was read from one workbook
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadSummary {
    pub sheets: Vec<String>,
    pub years: Vec<i32>,
    pub rows: usize,
}

impl LoadSummary {
    fn of(table: &CommodityTable) -> Self {
        Self {
            sheets: table.sheets.clone(),
            years: table.years(),
            rows: table.row_count(),
        }
    }
}

/// Derived tables of a single commodity
#[derive(Debug, Clone, Serialize)]
pub struct CommodityAnalysis {
    pub name: String,
    pub load: LoadSummary,
    pub clean: CleanStats,
    pub yearly: Vec<YearlySummary>,
    pub yearly_long: Vec<YearlyMetricRow>,
    pub top: TopProducers,
    pub top_value_series: Vec<SeriesPoint>,
    pub top_production_series: Vec<SeriesPoint>,
    /// Sorted by production CV, most stable first
    pub variability: Vec<VariabilityRecord>,
}

/// Every table the pipeline produces
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub generated_at: chrono::DateTime<chrono::Local>,
    pub config: PipelineConfig,
    pub commodities: Vec<CommodityAnalysis>,
    pub yield_price: Vec<YieldPriceRow>,
    pub periods: Vec<PeriodSummary>,
}

impl Analysis {
    pub fn commodity(&self, name: &str) -> Option<&CommodityAnalysis> {
        self.commodities.iter().find(|c| c.name == name)
    }
}

/// Load every configured workbook and run all stages
///
/// Any load or schema error aborts before aggregation starts.
pub fn run(config: &PipelineConfig) -> CropResult<Analysis> {
    config.validate()?;

    let mut tables = Vec::with_capacity(config.commodities.len());
    for source in &config.commodities {
        let loader = WorkbookLoader::new(&source.path, config.header_skip);
        tables.push(loader.load(&source.name)?);
    }

    analyze_tables(&tables, config)
}

/// Run all stages on already-loaded tables
pub fn analyze_tables(tables: &[CommodityTable], config: &PipelineConfig) -> CropResult<Analysis> {
    // Clean everything first so a schema error in any commodity aborts the run
    let mut cleaned = Vec::with_capacity(tables.len());
    for table in tables {
        let (records, stats) = core::clean(table, &config.aggregate_label)?;
        cleaned.push((
            LoadSummary::of(table),
            stats,
            CommodityData::new(&table.commodity, records),
        ));
    }

    let mut commodities = Vec::with_capacity(cleaned.len());
    let mut data = Vec::with_capacity(cleaned.len());
    for (load, clean, commodity) in cleaned {
        commodities.push(analyze_commodity(&commodity, load, clean, config.top_n));
        data.push(commodity);
    }

    let yield_price = core::merge_yield_price(&data);
    let periods = core::compare_periods(&data, config.period_boundary);

    info!(
        commodities = commodities.len(),
        periods = periods.len(),
        "analysis complete"
    );

    Ok(Analysis {
        generated_at: chrono::Local::now(),
        config: config.clone(),
        commodities,
        yield_price,
        periods,
    })
}

fn analyze_commodity(
    commodity: &CommodityData,
    load: LoadSummary,
    clean: CleanStats,
    top_n: usize,
) -> CommodityAnalysis {
    let records = &commodity.records;
    let yearly = core::yearly_totals(records);
    let yearly_long = core::to_long(&yearly);

    let top = core::top_producers(records, top_n);
    let top_value_series = core::region_series(
        records,
        &core::ranking::region_names(&top.by_value),
        RankMetric::FarmValue,
    );
    let top_production_series = core::region_series(
        records,
        &core::ranking::region_names(&top.by_production),
        RankMetric::MarketedProduction,
    );

    let variability =
        core::rank_by_stability(&core::variability(records), VariabilityMeasure::Production);

    CommodityAnalysis {
        name: commodity.name.clone(),
        load,
        clean,
        yearly,
        yearly_long,
        top,
        top_value_series,
        top_production_series,
        variability,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cell, Field, Period, RawRow};

    fn table(commodity: &str, rows: &[(i32, &str, f64, f64)]) -> CommodityTable {
        let columns = Field::ALL.iter().map(|f| f.column_name().to_string()).collect();
        let mut table = CommodityTable::new(commodity, columns);
        for &(year, region, production, value) in rows {
            table.sheets.push(year.to_string());
            table.rows.push(RawRow {
                sheet: year.to_string(),
                year,
                cells: vec![
                    Cell::Text(region.to_string()),
                    Cell::Number(10.0),
                    Cell::Number(2.0),
                    Cell::Number(production),
                    Cell::Number(40.0),
                    Cell::Number(value),
                ],
            });
        }
        table.sheets.dedup();
        table
    }

    #[test]
    fn test_analyze_tables_two_year_single_region() {
        let tables = vec![table("carrot", &[(2020, "A", 100.0, 50.0), (2021, "A", 200.0, 150.0)])];
        let analysis = analyze_tables(&tables, &PipelineConfig::default()).unwrap();
        let carrot = analysis.commodity("carrot").unwrap();

        assert_eq!(carrot.yearly.len(), 2);
        assert_eq!(carrot.yearly[0].marketed_production, 100.0);
        assert_eq!(carrot.yearly[1].farm_value, 150.0);
        assert_eq!(carrot.top.by_value.len(), 1);
        assert_eq!(carrot.top.overlap, vec!["A"]);
        assert!(carrot.variability[0].production.cv.unwrap() >= 0.0);
        assert_eq!(carrot.load.years, vec![2020, 2021]);
        assert_eq!(analysis.periods.len(), 1);
        assert_eq!(analysis.periods[0].period, Period::Late);
        assert_eq!(analysis.yield_price.len(), 4);
    }

    #[test]
    fn test_schema_error_in_any_commodity_aborts() {
        let good = table("carrot", &[(2020, "A", 1.0, 1.0)]);
        let bad = CommodityTable::new("tomato", vec!["region".to_string()]);
        assert!(analyze_tables(&[good, bad], &PipelineConfig::default()).is_err());
    }
}
