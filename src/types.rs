use serde::{Deserialize, Serialize};
use std::fmt;

//==============================================================================
// Raw Workbook Data
//==============================================================================

/// A single worksheet cell after import
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Numeric reading of the cell; thousands separators are tolerated, anything else is missing
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Number(_) | Cell::Empty => None,
            Cell::Text(s) => s
                .trim()
                .replace(',', "")
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite()),
        }
    }

    /// Text reading of the cell (numbers use their display form)
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Number(n) => Some(n.to_string()),
            Cell::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }
}

/// One data row of a worksheet, tagged with the year parsed from the sheet name
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub sheet: String,
    pub year: i32,
    pub cells: Vec<Cell>,
}

/// All sheets of one commodity workbook, concatenated
#[derive(Debug, Clone)]
pub struct CommodityTable {
    pub commodity: String,
    /// Normalized column labels shared by every sheet
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
    /// Sheet names in workbook order
    pub sheets: Vec<String>,
}

impl CommodityTable {
    pub fn new(commodity: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            commodity: commodity.into(),
            columns,
            rows: Vec::new(),
            sheets: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Distinct years present, ascending
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.rows.iter().map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();
        years
    }
}

//==============================================================================
// Typed Schema
//==============================================================================

/// The six measurement columns every sheet must carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Region,
    HarvestedArea,
    AverageYield,
    MarketedProduction,
    AveragePrice,
    FarmValue,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Region,
        Field::HarvestedArea,
        Field::AverageYield,
        Field::MarketedProduction,
        Field::AveragePrice,
        Field::FarmValue,
    ];

    /// Column label after header normalization
    pub fn column_name(self) -> &'static str {
        match self {
            Field::Region => "region",
            Field::HarvestedArea => "harvested_area_acres",
            Field::AverageYield => "average_yield_000_lbs_acre",
            Field::MarketedProduction => "marketed_production_000_lbs",
            Field::AveragePrice => "average_price_cents_lb",
            Field::FarmValue => "farm_value_000_dollars",
        }
    }

    /// Header as it appears in the source workbooks
    pub fn source_header(self) -> &'static str {
        match self {
            Field::Region => "Region",
            Field::HarvestedArea => "Harvested Area (acres)",
            Field::AverageYield => "Average Yield (000 lbs/acre)",
            Field::MarketedProduction => "Marketed Production (000 lbs)",
            Field::AveragePrice => "Average Price (cents/lb)",
            Field::FarmValue => "Farm Value (000 $)",
        }
    }
}

/// Column positions of every [`Field`] within a [`CommodityTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    indices: [usize; 6],
}

impl Schema {
    pub fn new(indices: [usize; 6]) -> Self {
        Self { indices }
    }

    pub fn index(&self, field: Field) -> usize {
        self.indices[field as usize]
    }
}

//==============================================================================
// Clean Records
//==============================================================================

/// A region-year observation with every measurement present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
    pub region: String,
    pub year: i32,
    /// acres
    pub harvested_area: f64,
    /// 000 lbs/acre
    pub average_yield: f64,
    /// 000 lbs
    pub marketed_production: f64,
    /// cents/lb
    pub average_price: f64,
    /// 000 $
    pub farm_value: f64,
}

/// Row accounting for one cleaning pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanStats {
    pub total_rows: usize,
    /// Rows dropped because a required field was blank or unparsable
    pub missing_values: usize,
    /// Rows dropped because they carry the aggregate label
    pub aggregate_rows: usize,
    pub kept: usize,
}

/// Cleaned rows of one commodity
#[derive(Debug, Clone, PartialEq)]
pub struct CommodityData {
    pub name: String,
    pub records: Vec<CleanRecord>,
}

impl CommodityData {
    pub fn new(name: impl Into<String>, records: Vec<CleanRecord>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }
}

//==============================================================================
// Derived Tables
//==============================================================================

/// Yearly totals metrics, in facet order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    HarvestedArea,
    FarmValue,
    MarketedProduction,
}

impl Metric {
    pub const FACET_ORDER: [Metric; 3] = [
        Metric::HarvestedArea,
        Metric::FarmValue,
        Metric::MarketedProduction,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Metric::HarvestedArea => "Harvested Area (acres)",
            Metric::FarmValue => "Farm Value ($000)",
            Metric::MarketedProduction => "Marketed Production (000 lbs)",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Metric::HarvestedArea => "harvested_area",
            Metric::FarmValue => "farm_value",
            Metric::MarketedProduction => "marketed_production",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlySummary {
    pub year: i32,
    pub harvested_area: f64,
    pub marketed_production: f64,
    pub farm_value: f64,
}

impl YearlySummary {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::HarvestedArea => self.harvested_area,
            Metric::FarmValue => self.farm_value,
            Metric::MarketedProduction => self.marketed_production,
        }
    }
}

/// Long-form yearly total: one row per (year, metric)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyMetricRow {
    pub year: i32,
    pub metric: Metric,
    pub value: f64,
}

/// Lifetime totals of one region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionTotals {
    pub region: String,
    pub farm_value: f64,
    pub marketed_production: f64,
}

/// Which lifetime total a ranking is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankMetric {
    FarmValue,
    MarketedProduction,
}

impl RankMetric {
    pub fn of_totals(self, totals: &RegionTotals) -> f64 {
        match self {
            RankMetric::FarmValue => totals.farm_value,
            RankMetric::MarketedProduction => totals.marketed_production,
        }
    }

    pub fn of_record(self, record: &CleanRecord) -> f64 {
        match self {
            RankMetric::FarmValue => record.farm_value,
            RankMetric::MarketedProduction => record.marketed_production,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RankMetric::FarmValue => "Farm Value ($000)",
            RankMetric::MarketedProduction => "Marketed Production (000 lbs)",
        }
    }
}

/// Top regions by each lifetime total
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopProducers {
    pub by_value: Vec<RegionTotals>,
    pub by_production: Vec<RegionTotals>,
    /// Regions in both lists, in by-value rank order
    pub overlap: Vec<String>,
}

/// One point of a per-region yearly series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub year: i32,
    pub region: String,
    pub value: f64,
}

/// Mean, sample standard deviation and coefficient of variation of one measure
///
/// `std_dev` and `cv` are `None` when they cannot be computed: a single
/// observation, or (for `cv`) a zero mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Dispersion {
    pub mean: f64,
    pub std_dev: Option<f64>,
    pub cv: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariabilityRecord {
    pub region: String,
    /// Number of observations (region-years)
    pub years: usize,
    pub production: Dispersion,
    pub value: Dispersion,
}

/// Measures averaged by the yield/price aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum YieldPriceMeasure {
    /// 000 lbs/acre
    Yield,
    /// $/lb
    Price,
}

impl YieldPriceMeasure {
    pub fn label(self) -> &'static str {
        match self {
            YieldPriceMeasure::Yield => "Average Yield (000 lbs/acre)",
            YieldPriceMeasure::Price => "Average Price ($/lb)",
        }
    }
}

impl fmt::Display for YieldPriceMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YieldPriceMeasure::Yield => f.write_str("yield"),
            YieldPriceMeasure::Price => f.write_str("price"),
        }
    }
}

/// Yearly averages of one commodity (wide form)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YieldPrice {
    pub year: i32,
    pub average_yield: f64,
    pub average_price_dollars: f64,
}

/// Long-form yield/price row across commodities
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YieldPriceRow {
    pub commodity: String,
    pub year: i32,
    pub measure: YieldPriceMeasure,
    pub value: f64,
}

/// Era bands for before/after comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Early,
    Late,
}

impl Period {
    /// `Early` through `last_early_year` inclusive, `Late` afterwards
    pub fn classify(year: i32, last_early_year: i32) -> Self {
        if year <= last_early_year {
            Period::Early
        } else {
            Period::Late
        }
    }

    pub fn label(self, last_early_year: i32) -> String {
        match self {
            Period::Early => format!("≤{}", last_early_year),
            Period::Late => format!("≥{}", last_early_year.saturating_add(1)),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Early => f.write_str("early"),
            Period::Late => f.write_str("late"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub period: Period,
    pub commodity: String,
    pub observations: usize,
    pub mean_production: f64,
    pub mean_value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_as_number() {
        assert_eq!(Cell::Number(12.5).as_number(), Some(12.5));
        assert_eq!(Cell::Text("1,234".to_string()).as_number(), Some(1234.0));
        assert_eq!(Cell::Text(" 7 ".to_string()).as_number(), Some(7.0));
        assert_eq!(Cell::Text("x".to_string()).as_number(), None);
        assert_eq!(Cell::Text("..".to_string()).as_number(), None);
        assert_eq!(Cell::Number(f64::NAN).as_number(), None);
        assert_eq!(Cell::Empty.as_number(), None);
    }

    #[test]
    fn test_cell_as_text() {
        assert_eq!(Cell::Text("  Essex ".to_string()).as_text(), Some("Essex".to_string()));
        assert_eq!(Cell::Text("   ".to_string()).as_text(), None);
        assert_eq!(Cell::Number(3.0).as_text(), Some("3".to_string()));
        assert_eq!(Cell::Empty.as_text(), None);
    }

    #[test]
    fn test_period_classify_boundary() {
        assert_eq!(Period::classify(2013, 2013), Period::Early);
        assert_eq!(Period::classify(2014, 2013), Period::Late);
        assert_eq!(Period::classify(1990, 2013), Period::Early);
    }

    #[test]
    fn test_period_label_at_extreme_boundary() {
        assert_eq!(Period::Early.label(2013), "≤2013");
        assert_eq!(Period::Late.label(2013), "≥2014");
        assert_eq!(Period::Late.label(i32::MAX), format!("≥{}", i32::MAX));
    }

    #[test]
    fn test_field_order_matches_schema_slots() {
        for (i, field) in Field::ALL.iter().enumerate() {
            assert_eq!(*field as usize, i);
        }
    }

    #[test]
    fn test_commodity_table_years_sorted_unique() {
        let mut table = CommodityTable::new("carrot", vec!["region".to_string()]);
        for year in [2021, 2019, 2021, 2020] {
            table.rows.push(RawRow {
                sheet: year.to_string(),
                year,
                cells: vec![Cell::Text("A".to_string())],
            });
        }
        assert_eq!(table.years(), vec![2019, 2020, 2021]);
    }
}
