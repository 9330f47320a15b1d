use crate::config::{CommoditySource, PipelineConfig};
use crate::error::CropResult;
use crate::excel::{ReportExporter, WorkbookLoader};
use crate::pipeline::{self, Analysis, CommodityAnalysis};
use crate::types::{Period, RegionTotals, YieldPriceMeasure};
use crate::writer;
use colored::Colorize;
use std::path::PathBuf;

/// Options for the analyze command; `None` keeps the config file (or default) value
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub config: Option<PathBuf>,
    pub sources: Vec<String>,
    pub skip_rows: Option<usize>,
    pub boundary_year: Option<i32>,
    pub aggregate_label: Option<String>,
    pub top: Option<usize>,
    pub report: Option<PathBuf>,
    pub csv_dir: Option<PathBuf>,
    pub json: Option<PathBuf>,
    pub verbose: bool,
}

impl AnalyzeOptions {
    /// Config file (if any) with command-line overrides applied
    pub fn resolve_config(&self) -> CropResult<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };

        for arg in &self.sources {
            config.upsert_source(CommoditySource::parse_arg(arg)?);
        }
        if let Some(n) = self.skip_rows {
            config.header_skip = n;
        }
        if let Some(year) = self.boundary_year {
            config.period_boundary = year;
        }
        if let Some(label) = &self.aggregate_label {
            config.aggregate_label = label.clone();
        }
        if let Some(n) = self.top {
            config.top_n = n;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Format a number for display: two decimals at most, no trailing zeros
fn format_number(n: f64) -> String {
    let rounded = (n * 100.0).round() / 100.0;
    let formatted = format!("{:.2}", rounded);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn format_optional(value: Option<f64>, digits: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", digits, v),
        None => writer::UNDEFINED.to_string(),
    }
}

/// Execute the analyze command
pub fn analyze(options: AnalyzeOptions) -> CropResult<()> {
    println!("{}", "🌱 Cropscope - Crop production analysis".bold().green());

    let config = options.resolve_config()?;
    for source in &config.commodities {
        println!("   {}: {}", source.name.bright_blue(), source.path.display());
    }
    println!(
        "   Periods: {} | {}   Aggregate label: '{}'\n",
        Period::Early.label(config.period_boundary),
        Period::Late.label(config.period_boundary),
        config.aggregate_label
    );

    if options.verbose {
        println!("{}", "📖 Loading workbooks...".cyan());
    }

    let analysis = pipeline::run(&config)?;

    for commodity in &analysis.commodities {
        print_commodity(commodity, options.verbose);
    }
    print_yield_price(&analysis);
    print_periods(&analysis);

    if let Some(path) = &options.report {
        ReportExporter::new(&analysis).export(path)?;
        println!("{} {}", "📊 Report written:".green(), path.display());
    }
    if let Some(dir) = &options.csv_dir {
        let files = writer::write_csv_tables(&analysis, dir)?;
        println!(
            "{} {} files in {}",
            "📄 CSV tables written:".green(),
            files.len(),
            dir.display()
        );
        if options.verbose {
            for file in &files {
                println!("      {}", file.display());
            }
        }
    }
    if let Some(path) = &options.json {
        writer::write_json(&analysis, path)?;
        println!("{} {}", "🧾 JSON written:".green(), path.display());
    }

    Ok(())
}

fn print_ranking(title: &str, ranking: &[RegionTotals], value: fn(&RegionTotals) -> f64) {
    println!("   {}", title.bold());
    for (idx, region) in ranking.iter().enumerate() {
        println!(
            "      {}. {:<24} {}",
            idx + 1,
            region.region,
            format_number(value(region))
        );
    }
}

fn print_commodity(commodity: &CommodityAnalysis, verbose: bool) {
    println!("{}", format!("🌾 {}", commodity.name).bold().bright_blue());

    let load = &commodity.load;
    let years = match (load.years.first(), load.years.last()) {
        (Some(first), Some(last)) => format!("{}-{}", first, last),
        _ => "none".to_string(),
    };
    println!(
        "   {} sheets ({}), {} rows read",
        load.sheets.len(),
        years,
        load.rows
    );

    let clean = &commodity.clean;
    let dropped = clean.missing_values + clean.aggregate_rows;
    let summary = format!(
        "   {} kept, {} dropped ({} missing values, {} aggregate rows)",
        clean.kept, dropped, clean.missing_values, clean.aggregate_rows
    );
    if clean.missing_values > 0 {
        println!("{}", summary.yellow());
    } else {
        println!("{}", summary);
    }

    if verbose {
        println!("   {}", "Yearly totals (area | value | production):".bold());
        for year in &commodity.yearly {
            println!(
                "      {}  {} | {} | {}",
                year.year,
                format_number(year.harvested_area),
                format_number(year.farm_value),
                format_number(year.marketed_production)
            );
        }
    }

    print_ranking(
        "Top regions by farm value ($000):",
        &commodity.top.by_value,
        |r| r.farm_value,
    );
    print_ranking(
        "Top regions by marketed production (000 lbs):",
        &commodity.top.by_production,
        |r| r.marketed_production,
    );
    if commodity.top.overlap.is_empty() {
        println!("   Overlap: {}", "none".yellow());
    } else {
        println!("   Overlap: {}", commodity.top.overlap.join(", ").green());
    }

    println!("   {}", "Most stable regions (production CV):".bold());
    let shown = if verbose { commodity.variability.len() } else { 5 };
    for record in commodity.variability.iter().take(shown) {
        println!(
            "      {:<24} CV {}  ({} years)",
            record.region,
            format_optional(record.production.cv, 3),
            record.years
        );
    }
    let undefined = commodity
        .variability
        .iter()
        .filter(|r| r.production.cv.is_none())
        .count();
    if undefined > 0 {
        println!(
            "   {}",
            format!("{} regions with a single year have no CV", undefined).yellow()
        );
    }
    println!();
}

fn print_yield_price(analysis: &Analysis) {
    println!("{}", "💲 Yield and price by year".bold().bright_blue());
    for commodity in &analysis.commodities {
        let rows: Vec<_> = analysis
            .yield_price
            .iter()
            .filter(|r| r.commodity == commodity.name)
            .collect();
        let (first, last) = match (rows.first(), rows.last()) {
            (Some(f), Some(l)) => (f.year, l.year),
            _ => continue,
        };
        let value_at = |year: i32, measure: YieldPriceMeasure| {
            rows.iter()
                .find(|r| r.year == year && r.measure == measure)
                .map(|r| r.value)
        };
        println!(
            "   {:<10} yield {} → {} (000 lbs/acre), price ${} → ${} /lb ({}→{})",
            commodity.name,
            format_optional(value_at(first, YieldPriceMeasure::Yield), 2),
            format_optional(value_at(last, YieldPriceMeasure::Yield), 2),
            format_optional(value_at(first, YieldPriceMeasure::Price), 2),
            format_optional(value_at(last, YieldPriceMeasure::Price), 2),
            first,
            last
        );
    }
    println!();
}

fn print_periods(analysis: &Analysis) {
    let boundary = analysis.config.period_boundary;
    println!("{}", "📅 Period comparison".bold().bright_blue());
    println!(
        "   {:<8} {:<10} {:>6} {:>18} {:>18}",
        "Period", "Commodity", "Rows", "Mean production", "Mean value"
    );
    for period in [Period::Early, Period::Late] {
        for summary in analysis.periods.iter().filter(|s| s.period == period) {
            println!(
                "   {:<8} {:<10} {:>6} {:>18} {:>18}",
                period.label(boundary),
                summary.commodity,
                summary.observations,
                format_number(summary.mean_production),
                format_number(summary.mean_value)
            );
        }
    }
    println!();
}

/// Execute the inspect command
pub fn inspect(file: PathBuf, skip_rows: usize) -> CropResult<()> {
    println!("{}", "🔍 Cropscope - Workbook inspection".bold().green());
    println!("   File: {}", file.display());
    println!("   Header rows skipped: {}\n", skip_rows);

    let sheets = WorkbookLoader::new(&file, skip_rows).inspect()?;
    let mut problems = 0;

    for sheet in &sheets {
        let year = sheet
            .year
            .map_or_else(|| "----".to_string(), |y| y.to_string());
        match &sheet.problem {
            None => println!(
                "   {} {:<20} {} {:>5} rows",
                "✅".green(),
                sheet.name,
                year,
                sheet.data_rows
            ),
            Some(problem) => {
                problems += 1;
                println!("   {} {:<20} {}", "❌".red(), sheet.name, problem.red());
            }
        }
    }

    if let Some(first) = sheets.iter().find(|s| !s.columns.is_empty()) {
        println!("\n   {} {}", "Columns:".bold(), first.columns.join(", "));
    }

    println!();
    if problems == 0 {
        println!("{}", format!("✅ {} sheets readable", sheets.len()).bold().green());
    } else {
        println!(
            "{}",
            format!("⚠️  {} of {} sheets have problems", problems, sheets.len())
                .bold()
                .yellow()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(100.0), "100");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(1.005), "1");
        assert_eq!(format_number(1234.5678), "1234.57");
        assert_eq!(format_number(-0.001), "0");
    }

    #[test]
    fn test_format_optional() {
        assert_eq!(format_optional(Some(0.12345), 3), "0.123");
        assert_eq!(format_optional(None, 3), "NA");
    }

    #[test]
    fn test_resolve_config_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cropscope.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "commodities:\n  - name: carrot\n    path: carrots.xlsx\nperiod_boundary: 2010"
        )
        .unwrap();

        let options = AnalyzeOptions {
            config: Some(path),
            sources: vec!["tomato=tomatoes.xlsx".to_string()],
            boundary_year: Some(2013),
            aggregate_label: Some("Ontario".to_string()),
            ..AnalyzeOptions::default()
        };
        let config = options.resolve_config().unwrap();

        assert_eq!(config.commodities.len(), 2);
        assert_eq!(config.period_boundary, 2013);
        assert_eq!(config.aggregate_label, "Ontario");
        assert_eq!(config.header_skip, 2);
    }

    #[test]
    fn test_resolve_config_requires_sources() {
        let options = AnalyzeOptions::default();
        assert!(options.resolve_config().is_err());
    }
}
