//! Report exporter - Analysis → Excel (.xlsx) tables with native charts

use crate::error::{CropError, CropResult};
use crate::pipeline::{Analysis, CommodityAnalysis};
use crate::types::{
    Metric, Period, RankMetric, RegionTotals, SeriesPoint, VariabilityRecord, YieldPriceMeasure,
};
use crate::writer::UNDEFINED;
use rust_xlsxwriter::{Chart, ChartType, Format, Workbook, Worksheet};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

/// Excel limit on worksheet name length
const MAX_SHEET_NAME: usize = 31;
/// Rows between stacked charts
const CHART_STRIDE: u32 = 16;

/// Renders an [`Analysis`] as a multi-sheet workbook
pub struct ReportExporter<'a> {
    analysis: &'a Analysis,
    header: Format,
}

impl<'a> ReportExporter<'a> {
    pub fn new(analysis: &'a Analysis) -> Self {
        Self {
            analysis,
            header: Format::new().set_bold(),
        }
    }

    /// Export the report to an Excel .xlsx file
    pub fn export(&self, output_path: &Path) -> CropResult<()> {
        let mut workbook = Workbook::new();
        let mut names = SheetNames::default();

        self.export_summary(&mut workbook, &names.claim("Summary"))?;

        for commodity in &self.analysis.commodities {
            let title = title_case(&commodity.name);
            self.export_yearly(
                &mut workbook,
                &names.claim(&format!("{} Yearly", title)),
                commodity,
            )?;
            self.export_ranking(
                &mut workbook,
                &names.claim(&format!("{} Top Value", title)),
                &commodity.top.by_value,
                &commodity.top_value_series,
                RankMetric::FarmValue,
            )?;
            self.export_ranking(
                &mut workbook,
                &names.claim(&format!("{} Top Prod", title)),
                &commodity.top.by_production,
                &commodity.top_production_series,
                RankMetric::MarketedProduction,
            )?;
            self.export_variability(
                &mut workbook,
                &names.claim(&format!("{} Variability", title)),
                &commodity.variability,
            )?;
        }

        self.export_yield_price(&mut workbook, &names.claim("Yield Price"))?;
        self.export_periods(&mut workbook, &names.claim("Periods"))?;

        workbook
            .save(output_path)
            .map_err(|e| CropError::Export(format!("Failed to save Excel file: {}", e)))?;

        Ok(())
    }

    fn add_sheet<'w>(
        &self,
        workbook: &'w mut Workbook,
        name: &str,
    ) -> CropResult<&'w mut Worksheet> {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(name)
            .map_err(|e| {
                CropError::Export(format!("Failed to set worksheet name '{}': {}", name, e))
            })?;
        Ok(worksheet)
    }

    fn write_headers(
        &self,
        worksheet: &mut Worksheet,
        row: u32,
        first_col: u16,
        headers: &[&str],
    ) -> CropResult<()> {
        for (offset, header) in headers.iter().enumerate() {
            let col = first_col + offset as u16;
            worksheet.write_string_with_format(row, col, *header, &self.header)?;
        }
        Ok(())
    }

    /// Run parameters and per-commodity row accounting
    fn export_summary(&self, workbook: &mut Workbook, sheet: &str) -> CropResult<()> {
        let analysis = self.analysis;
        let worksheet = self.add_sheet(workbook, sheet)?;

        worksheet.write_string_with_format(0, 0, "Crop production report", &self.header)?;
        worksheet.write_string(1, 0, "Generated")?;
        let generated = analysis.generated_at.format("%Y-%m-%d %H:%M:%S");
        worksheet.write_string(1, 1, generated.to_string())?;
        worksheet.write_string(2, 0, "Header rows skipped")?;
        worksheet.write_number(2, 1, analysis.config.header_skip as f64)?;
        worksheet.write_string(3, 0, "Last early-period year")?;
        worksheet.write_number(3, 1, analysis.config.period_boundary as f64)?;
        worksheet.write_string(4, 0, "Aggregate label")?;
        worksheet.write_string(4, 1, &analysis.config.aggregate_label)?;
        worksheet.write_string(5, 0, "Top regions")?;
        worksheet.write_number(5, 1, analysis.config.top_n as f64)?;

        self.write_headers(
            worksheet,
            7,
            0,
            &[
                "Commodity",
                "Source",
                "Sheets",
                "Years",
                "Raw rows",
                "Missing values",
                "Aggregate rows",
                "Kept rows",
                "Top value/production overlap",
            ],
        )?;

        for (idx, commodity) in analysis.commodities.iter().enumerate() {
            let row = 8 + idx as u32;
            let source = analysis
                .config
                .commodities
                .iter()
                .find(|s| s.name == commodity.name)
                .map(|s| s.path.display().to_string())
                .unwrap_or_default();
            let years = match (commodity.load.years.first(), commodity.load.years.last()) {
                (Some(first), Some(last)) => format!("{}-{}", first, last),
                _ => String::new(),
            };

            worksheet.write_string(row, 0, &commodity.name)?;
            worksheet.write_string(row, 1, &source)?;
            worksheet.write_number(row, 2, commodity.load.sheets.len() as f64)?;
            worksheet.write_string(row, 3, &years)?;
            worksheet.write_number(row, 4, commodity.clean.total_rows as f64)?;
            worksheet.write_number(row, 5, commodity.clean.missing_values as f64)?;
            worksheet.write_number(row, 6, commodity.clean.aggregate_rows as f64)?;
            worksheet.write_number(row, 7, commodity.clean.kept as f64)?;
            worksheet.write_string(row, 8, commodity.top.overlap.join(", "))?;
        }

        worksheet.set_column_width(0, 26)?;
        worksheet.set_column_width(1, 40)?;
        Ok(())
    }

    /// Yearly totals with one line chart per metric (the facets)
    fn export_yearly(
        &self,
        workbook: &mut Workbook,
        sheet: &str,
        commodity: &CommodityAnalysis,
    ) -> CropResult<()> {
        let header = &self.header;
        let worksheet = self.add_sheet(workbook, sheet)?;

        let mut headers = vec!["Year"];
        headers.extend(Metric::FACET_ORDER.iter().map(|m| m.label()));
        self.write_headers(worksheet, 0, 0, &headers)?;

        for (idx, summary) in commodity.yearly.iter().enumerate() {
            let row = idx as u32 + 1;
            worksheet.write_number(row, 0, summary.year as f64)?;
            for (offset, metric) in Metric::FACET_ORDER.iter().enumerate() {
                worksheet.write_number(row, offset as u16 + 1, summary.get(*metric))?;
            }
        }
        worksheet.set_column_width(1, 24)?;
        worksheet.set_column_width(2, 20)?;
        worksheet.set_column_width(3, 30)?;

        let last_row = commodity.yearly.len() as u32;
        if last_row == 0 {
            worksheet.write_string_with_format(1, 0, "No data", header)?;
            return Ok(());
        }

        for (offset, metric) in Metric::FACET_ORDER.iter().enumerate() {
            let col = offset as u16 + 1;
            let mut chart = Chart::new(ChartType::Line);
            chart
                .add_series()
                .set_categories((sheet, 1, 0, last_row, 0))
                .set_values((sheet, 1, col, last_row, col))
                .set_name((sheet, 0, col));
            chart
                .title()
                .set_name(format!("{} - {}", title_case(&commodity.name), metric.label()).as_str());
            chart.x_axis().set_name("Year");
            chart.legend().set_hidden();
            worksheet.insert_chart(offset as u32 * CHART_STRIDE, 5, &chart)?;
        }

        Ok(())
    }

    /// Ranking table, bar chart, and year × region pivot with its line chart
    fn export_ranking(
        &self,
        workbook: &mut Workbook,
        sheet: &str,
        ranking: &[RegionTotals],
        series: &[SeriesPoint],
        metric: RankMetric,
    ) -> CropResult<()> {
        let worksheet = self.add_sheet(workbook, sheet)?;

        self.write_headers(
            worksheet,
            0,
            0,
            &[
                "Rank",
                "Region",
                RankMetric::FarmValue.label(),
                RankMetric::MarketedProduction.label(),
            ],
        )?;
        for (idx, region) in ranking.iter().enumerate() {
            let row = idx as u32 + 1;
            worksheet.write_number(row, 0, (idx + 1) as f64)?;
            worksheet.write_string(row, 1, &region.region)?;
            worksheet.write_number(row, 2, region.farm_value)?;
            worksheet.write_number(row, 3, region.marketed_production)?;
        }
        worksheet.set_column_width(1, 22)?;
        worksheet.set_column_width(2, 20)?;
        worksheet.set_column_width(3, 30)?;

        if ranking.is_empty() {
            return Ok(());
        }

        // Pivot: one row per year, one column per ranked region (rank order)
        let regions: Vec<&str> = ranking.iter().map(|r| r.region.as_str()).collect();
        let pivot_top = ranking.len() as u32 + 3;
        let pivot = pivot_series(series, &regions);

        worksheet.write_string_with_format(pivot_top - 1, 0, metric.label(), &self.header)?;
        let mut pivot_headers = vec!["Year"];
        pivot_headers.extend(regions.iter().copied());
        self.write_headers(worksheet, pivot_top, 0, &pivot_headers)?;
        for (idx, (year, values)) in pivot.iter().enumerate() {
            let row = pivot_top + 1 + idx as u32;
            worksheet.write_number(row, 0, *year as f64)?;
            for (offset, value) in values.iter().enumerate() {
                if let Some(v) = value {
                    worksheet.write_number(row, offset as u16 + 1, *v)?;
                }
            }
        }

        let metric_col: u16 = match metric {
            RankMetric::FarmValue => 2,
            RankMetric::MarketedProduction => 3,
        };
        let chart_col = (regions.len() as u16 + 2).max(6);

        let mut bar = Chart::new(ChartType::Bar);
        bar.add_series()
            .set_categories((sheet, 1, 1, ranking.len() as u32, 1))
            .set_values((sheet, 1, metric_col, ranking.len() as u32, metric_col))
            .set_name((sheet, 0, metric_col));
        let bar_title = format!(
            "Top {} regions by lifetime {}",
            ranking.len(),
            metric.label()
        );
        bar.title().set_name(bar_title.as_str());
        bar.legend().set_hidden();
        worksheet.insert_chart(0, chart_col, &bar)?;

        if !pivot.is_empty() {
            let first = pivot_top + 1;
            let last = pivot_top + pivot.len() as u32;
            let mut line = Chart::new(ChartType::Line);
            for offset in 0..regions.len() {
                let col = offset as u16 + 1;
                line.add_series()
                    .set_categories((sheet, first, 0, last, 0))
                    .set_values((sheet, first, col, last, col))
                    .set_name((sheet, pivot_top, col));
            }
            line.title()
                .set_name(format!("{} of top regions by year", metric.label()).as_str());
            line.x_axis().set_name("Year");
            worksheet.insert_chart(CHART_STRIDE, chart_col, &line)?;
        }

        Ok(())
    }

    /// Dispersion table (most stable first) with CV bar charts of the computable rows
    fn export_variability(
        &self,
        workbook: &mut Workbook,
        sheet: &str,
        records: &[VariabilityRecord],
    ) -> CropResult<()> {
        let worksheet = self.add_sheet(workbook, sheet)?;

        self.write_headers(
            worksheet,
            0,
            0,
            &[
                "Region",
                "Years",
                "Production Mean",
                "Production SD",
                "Production CV",
                "Value Mean",
                "Value SD",
                "Value CV",
            ],
        )?;

        for (idx, record) in records.iter().enumerate() {
            let row = idx as u32 + 1;
            worksheet.write_string(row, 0, &record.region)?;
            worksheet.write_number(row, 1, record.years as f64)?;
            worksheet.write_number(row, 2, record.production.mean)?;
            write_measure(worksheet, row, 3, record.production.std_dev)?;
            write_measure(worksheet, row, 4, record.production.cv)?;
            worksheet.write_number(row, 5, record.value.mean)?;
            write_measure(worksheet, row, 6, record.value.std_dev)?;
            write_measure(worksheet, row, 7, record.value.cv)?;
        }
        worksheet.set_column_width(0, 22)?;

        // Value-CV ordering beside the main table so its chart range is contiguous
        let mut by_value: Vec<&VariabilityRecord> =
            records.iter().filter(|r| r.value.cv.is_some()).collect();
        by_value.sort_by(|a, b| {
            a.value
                .cv
                .partial_cmp(&b.value.cv)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.region.cmp(&b.region))
        });
        self.write_headers(worksheet, 0, 9, &["Region (by value CV)", "Value CV"])?;
        for (idx, record) in by_value.iter().enumerate() {
            let row = idx as u32 + 1;
            worksheet.write_string(row, 9, &record.region)?;
            if let Some(cv) = record.value.cv {
                worksheet.write_number(row, 10, cv)?;
            }
        }
        worksheet.set_column_width(9, 22)?;

        // Rows arrive sorted by production CV with undefined last
        let defined_production = records
            .iter()
            .take_while(|r| r.production.cv.is_some())
            .count() as u32;

        if defined_production > 0 {
            let mut chart = Chart::new(ChartType::Bar);
            chart
                .add_series()
                .set_categories((sheet, 1, 0, defined_production, 0))
                .set_values((sheet, 1, 4, defined_production, 4))
                .set_name((sheet, 0, 4));
            chart.title().set_name("Production CV (lower = more stable)");
            chart.legend().set_hidden();
            worksheet.insert_chart(0, 12, &chart)?;
        }

        if !by_value.is_empty() {
            let last = by_value.len() as u32;
            let mut chart = Chart::new(ChartType::Bar);
            chart
                .add_series()
                .set_categories((sheet, 1, 9, last, 9))
                .set_values((sheet, 1, 10, last, 10))
                .set_name((sheet, 0, 10));
            chart.title().set_name("Value CV (lower = more stable)");
            chart.legend().set_hidden();
            worksheet.insert_chart(CHART_STRIDE, 12, &chart)?;
        }

        Ok(())
    }

    /// Year × commodity pivots for yield and price, one line chart each
    fn export_yield_price(&self, workbook: &mut Workbook, sheet: &str) -> CropResult<()> {
        let analysis = self.analysis;
        let worksheet = self.add_sheet(workbook, sheet)?;
        let commodities: Vec<&str> = analysis.commodities.iter().map(|c| c.name.as_str()).collect();
        let years: BTreeSet<i32> = analysis.yield_price.iter().map(|r| r.year).collect();

        let mut top = 0u32;
        let measures = [YieldPriceMeasure::Yield, YieldPriceMeasure::Price];
        for (chart_idx, measure) in measures.iter().enumerate() {
            worksheet.write_string_with_format(top, 0, measure.label(), &self.header)?;
            let mut headers = vec!["Year"];
            headers.extend(commodities.iter().copied());
            self.write_headers(worksheet, top + 1, 0, &headers)?;

            for (idx, year) in years.iter().enumerate() {
                let row = top + 2 + idx as u32;
                worksheet.write_number(row, 0, *year as f64)?;
                for (offset, name) in commodities.iter().enumerate() {
                    let value = analysis
                        .yield_price
                        .iter()
                        .find(|r| r.year == *year && r.measure == *measure && r.commodity == *name)
                        .map(|r| r.value);
                    if let Some(v) = value {
                        worksheet.write_number(row, offset as u16 + 1, v)?;
                    }
                }
            }

            if !years.is_empty() {
                let first = top + 2;
                let last = top + 1 + years.len() as u32;
                let mut chart = Chart::new(ChartType::Line);
                for offset in 0..commodities.len() {
                    let col = offset as u16 + 1;
                    chart
                        .add_series()
                        .set_categories((sheet, first, 0, last, 0))
                        .set_values((sheet, first, col, last, col))
                        .set_name((sheet, top + 1, col));
                }
                chart.title().set_name(measure.label());
                chart.x_axis().set_name("Year");
                let chart_col = (commodities.len() as u16 + 2).max(5);
                worksheet.insert_chart(chart_idx as u32 * CHART_STRIDE, chart_col, &chart)?;
            }

            top += years.len() as u32 + 3;
        }

        Ok(())
    }

    /// Period summary table plus period × commodity pivots and column charts
    fn export_periods(&self, workbook: &mut Workbook, sheet: &str) -> CropResult<()> {
        let analysis = self.analysis;
        let boundary = analysis.config.period_boundary;
        let worksheet = self.add_sheet(workbook, sheet)?;

        self.write_headers(
            worksheet,
            0,
            0,
            &[
                "Period",
                "Years",
                "Commodity",
                "Observations",
                "Mean Production (000 lbs)",
                "Mean Value ($000)",
            ],
        )?;
        for (idx, summary) in analysis.periods.iter().enumerate() {
            let row = idx as u32 + 1;
            worksheet.write_string(row, 0, summary.period.to_string())?;
            worksheet.write_string(row, 1, summary.period.label(boundary))?;
            worksheet.write_string(row, 2, &summary.commodity)?;
            worksheet.write_number(row, 3, summary.observations as f64)?;
            worksheet.write_number(row, 4, summary.mean_production)?;
            worksheet.write_number(row, 5, summary.mean_value)?;
        }
        worksheet.set_column_width(4, 26)?;
        worksheet.set_column_width(5, 20)?;

        if analysis.periods.is_empty() {
            return Ok(());
        }

        let commodities: Vec<&str> = analysis.commodities.iter().map(|c| c.name.as_str()).collect();
        let periods = [Period::Early, Period::Late];
        let mut top = analysis.periods.len() as u32 + 2;

        let facets = [
            ("Mean Production (000 lbs)", true),
            ("Mean Value ($000)", false),
        ];
        for (chart_idx, (label, production)) in facets.iter().enumerate() {
            worksheet.write_string_with_format(top, 0, *label, &self.header)?;
            let mut headers = vec!["Period"];
            headers.extend(commodities.iter().copied());
            self.write_headers(worksheet, top + 1, 0, &headers)?;

            for (idx, period) in periods.iter().enumerate() {
                let row = top + 2 + idx as u32;
                worksheet.write_string(row, 0, period.label(boundary))?;
                for (offset, name) in commodities.iter().enumerate() {
                    let summary = analysis
                        .periods
                        .iter()
                        .find(|s| s.period == *period && s.commodity == *name);
                    if let Some(s) = summary {
                        let v = if *production { s.mean_production } else { s.mean_value };
                        worksheet.write_number(row, offset as u16 + 1, v)?;
                    }
                }
            }

            let first = top + 2;
            let last = top + 1 + periods.len() as u32;
            let mut chart = Chart::new(ChartType::Column);
            for offset in 0..commodities.len() {
                let col = offset as u16 + 1;
                chart
                    .add_series()
                    .set_categories((sheet, first, 0, last, 0))
                    .set_values((sheet, first, col, last, col))
                    .set_name((sheet, top + 1, col));
            }
            chart.title().set_name(*label);
            worksheet.insert_chart(chart_idx as u32 * CHART_STRIDE, 8, &chart)?;

            top += periods.len() as u32 + 3;
        }

        Ok(())
    }
}

/// Write a statistic, or the undefined marker
fn write_measure(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: Option<f64>,
) -> CropResult<()> {
    match value {
        Some(v) => worksheet.write_number(row, col, v)?,
        None => worksheet.write_string(row, col, UNDEFINED)?,
    };
    Ok(())
}

/// Years ascending, each with one slot per region in `regions` order
fn pivot_series(series: &[SeriesPoint], regions: &[&str]) -> Vec<(i32, Vec<Option<f64>>)> {
    let mut by_year: BTreeMap<i32, Vec<Option<f64>>> = BTreeMap::new();
    for point in series {
        if let Some(idx) = regions.iter().position(|r| *r == point.region) {
            let slots = by_year.entry(point.year).or_insert_with(|| vec![None; regions.len()]);
            slots[idx] = Some(slots[idx].unwrap_or(0.0) + point.value);
        }
    }
    by_year.into_iter().collect()
}

fn title_case(name: &str) -> String {
    let mut chars = name.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Hands out unique, Excel-legal worksheet names
#[derive(Default)]
struct SheetNames {
    used: HashSet<String>,
}

impl SheetNames {
    fn claim(&mut self, wanted: &str) -> String {
        let base = sanitize_sheet_name(wanted);
        let mut candidate = base.clone();
        let mut n = 2;
        while self.used.contains(&candidate.to_lowercase()) {
            let suffix = format!(" ({})", n);
            let keep = MAX_SHEET_NAME.saturating_sub(suffix.chars().count());
            candidate = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
            n += 1;
        }
        self.used.insert(candidate.to_lowercase());
        candidate
    }
}

/// Drop characters Excel rejects in sheet names and cap the length
fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(MAX_SHEET_NAME)
        .collect();
    let trimmed = cleaned.trim().trim_matches('\'').to_string();
    if trimmed.is_empty() {
        "Sheet".to_string()
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("Carrot Yearly"), "Carrot Yearly");
        assert_eq!(sanitize_sheet_name("a/b:c*d?"), "abcd");
        assert_eq!(sanitize_sheet_name("'quoted'"), "quoted");
        assert_eq!(sanitize_sheet_name("[]"), "Sheet");
        let long = "Greenhouse Tomatoes And Peppers Variability";
        assert_eq!(sanitize_sheet_name(long).chars().count(), MAX_SHEET_NAME);
    }

    #[test]
    fn test_sheet_names_unique_case_insensitive() {
        let mut names = SheetNames::default();
        assert_eq!(names.claim("Summary"), "Summary");
        assert_eq!(names.claim("summary"), "summary (2)");
        let long = "A very long commodity name for a sheet";
        let first = names.claim(long);
        let second = names.claim(long);
        assert_ne!(first, second);
        assert!(second.chars().count() <= MAX_SHEET_NAME);
        assert!(second.ends_with("(2)"));
    }

    #[test]
    fn test_pivot_series_fills_gaps() {
        let series = vec![
            SeriesPoint {
                year: 2020,
                region: "A".to_string(),
                value: 1.0,
            },
            SeriesPoint {
                year: 2021,
                region: "B".to_string(),
                value: 2.0,
            },
        ];
        let pivot = pivot_series(&series, &["A", "B"]);
        assert_eq!(
            pivot,
            vec![(2020, vec![Some(1.0), None]), (2021, vec![None, Some(2.0)])]
        );
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("carrot"), "Carrot");
        assert_eq!(title_case(""), "");
    }
}
