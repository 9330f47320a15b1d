//! Workbook loader - one commodity workbook (.xlsx/.xls/.ods) → CommodityTable

use crate::error::{CropError, CropResult};
use crate::types::{Cell, CommodityTable, RawRow};
use calamine::{open_workbook_auto, Data, Range, Reader};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A sheet after header detection, before schema reconciliation
#[derive(Debug, Clone)]
struct ParsedSheet {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

/// Overview of one sheet for `inspect`
#[derive(Debug, Clone, PartialEq)]
pub struct SheetInfo {
    pub name: String,
    pub year: Option<i32>,
    pub columns: Vec<String>,
    pub data_rows: usize,
    /// Why the sheet could not be read, if it could not
    pub problem: Option<String>,
}

/// Loader for a multi-sheet, one-sheet-per-year commodity workbook
pub struct WorkbookLoader {
    path: PathBuf,
    header_skip: usize,
}

impl WorkbookLoader {
    /// Create a loader that skips `header_skip` preamble rows on every sheet
    pub fn new<P: AsRef<Path>>(path: P, header_skip: usize) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            header_skip,
        }
    }

    /// Read every sheet and concatenate them into one table
    ///
    /// Fails on the first sheet without a year token, without a header row,
    /// or whose columns differ from the first sheet's.
    pub fn load(&self, commodity: &str) -> CropResult<CommodityTable> {
        if !self.path.exists() {
            return Err(CropError::workbook(&self.path, "file not found"));
        }

        let mut workbook = open_workbook_auto(&self.path)
            .map_err(|e| CropError::workbook(&self.path, format!("failed to open: {}", e)))?;

        let sheet_names = workbook.sheet_names().to_vec();
        if sheet_names.is_empty() {
            return Err(CropError::workbook(&self.path, "workbook has no sheets"));
        }

        let year_pattern = year_pattern()?;
        let mut table: Option<CommodityTable> = None;

        for sheet_name in &sheet_names {
            let year = extract_year(&year_pattern, sheet_name).ok_or_else(|| {
                CropError::SheetYear {
                    path: self.path.clone(),
                    sheet: sheet_name.clone(),
                }
            })?;

            let range = workbook.worksheet_range(sheet_name).map_err(|e| {
                CropError::workbook(
                    &self.path,
                    format!("failed to read sheet '{}': {}", sheet_name, e),
                )
            })?;

            let parsed = self.parse_sheet(sheet_name, &range)?;
            debug!(
                commodity,
                sheet = sheet_name.as_str(),
                year,
                rows = parsed.rows.len(),
                "read sheet"
            );

            let table = table.get_or_insert_with(|| {
                CommodityTable::new(commodity, parsed.columns.clone())
            });
            let reference = table.sheets.first().cloned().unwrap_or_else(|| sheet_name.clone());
            let rows = align_to_columns(&table.columns, &reference, sheet_name, parsed)?;

            table.sheets.push(sheet_name.clone());
            table.rows.extend(rows.into_iter().map(|cells| RawRow {
                sheet: sheet_name.clone(),
                year,
                cells,
            }));
        }

        let table = table.ok_or_else(|| CropError::workbook(&self.path, "workbook has no sheets"))?;
        info!(
            commodity,
            path = %self.path.display(),
            sheets = table.sheets.len(),
            rows = table.rows.len(),
            "loaded workbook"
        );
        Ok(table)
    }

    /// Describe every sheet without failing on the bad ones
    pub fn inspect(&self) -> CropResult<Vec<SheetInfo>> {
        let mut workbook = open_workbook_auto(&self.path)
            .map_err(|e| CropError::workbook(&self.path, format!("failed to open: {}", e)))?;
        let year_pattern = year_pattern()?;

        let mut infos = Vec::new();
        for sheet_name in workbook.sheet_names().to_vec() {
            let year = extract_year(&year_pattern, &sheet_name);
            let parsed = workbook
                .worksheet_range(&sheet_name)
                .map_err(|e| CropError::workbook(&self.path, e))
                .and_then(|range| self.parse_sheet(&sheet_name, &range));

            let info = match parsed {
                Ok(sheet) => SheetInfo {
                    name: sheet_name.clone(),
                    year,
                    columns: sheet.columns,
                    data_rows: sheet.rows.len(),
                    problem: year.is_none().then(|| "no 4-digit year in sheet name".to_string()),
                },
                Err(e) => SheetInfo {
                    name: sheet_name.clone(),
                    year,
                    columns: Vec::new(),
                    data_rows: 0,
                    problem: Some(e.to_string()),
                },
            };
            infos.push(info);
        }

        Ok(infos)
    }

    /// Locate the header below the preamble and collect the non-blank rows under it
    fn parse_sheet(&self, sheet_name: &str, range: &Range<Data>) -> CropResult<ParsedSheet> {
        // Range coordinates are relative to the first used cell; the preamble is absolute
        let first_row = range.start().map_or(0, |(row, _)| row as usize);

        let mut rows_iter = range
            .rows()
            .enumerate()
            .filter(|(idx, _)| first_row + idx >= self.header_skip)
            .map(|(_, row)| row);

        let header = rows_iter.next().ok_or_else(|| {
            CropError::workbook(
                &self.path,
                format!(
                    "sheet '{}' has no header row after skipping {} rows",
                    sheet_name, self.header_skip
                ),
            )
        })?;

        let labels: Vec<String> = header.iter().map(header_label).collect();
        let columns = unique_headers(&labels);

        let rows = rows_iter
            .map(|row| row.iter().map(convert_cell).collect::<Vec<Cell>>())
            .filter(|cells| !cells.iter().all(Cell::is_empty))
            .collect();

        Ok(ParsedSheet { columns, rows })
    }
}

/// Reorder a sheet's cells to the reference column order; any column difference is fatal
fn align_to_columns(
    reference_columns: &[String],
    reference_sheet: &str,
    sheet_name: &str,
    parsed: ParsedSheet,
) -> CropResult<Vec<Vec<Cell>>> {
    if parsed.columns == reference_columns {
        return Ok(parsed.rows);
    }

    let expected: HashSet<&String> = reference_columns.iter().collect();
    let found: HashSet<&String> = parsed.columns.iter().collect();

    let mut missing: Vec<&str> = reference_columns
        .iter()
        .filter(|c| !found.contains(c))
        .map(String::as_str)
        .collect();
    let mut extra: Vec<&str> = parsed
        .columns
        .iter()
        .filter(|c| !expected.contains(c))
        .map(String::as_str)
        .collect();

    if !missing.is_empty() || !extra.is_empty() {
        missing.sort_unstable();
        extra.sort_unstable();
        let mut detail = Vec::new();
        if !missing.is_empty() {
            detail.push(format!("missing [{}]", missing.join(", ")));
        }
        if !extra.is_empty() {
            detail.push(format!("unexpected [{}]", extra.join(", ")));
        }
        return Err(CropError::SchemaMismatch {
            sheet: sheet_name.to_string(),
            reference: reference_sheet.to_string(),
            detail: detail.join("; "),
        });
    }

    // Same columns, different order
    let position: HashMap<&String, usize> = parsed
        .columns
        .iter()
        .enumerate()
        .map(|(idx, name)| (name, idx))
        .collect();
    let order: Vec<usize> = reference_columns.iter().map(|c| position[c]).collect();

    Ok(parsed
        .rows
        .into_iter()
        .map(|cells| {
            order
                .iter()
                .map(|&idx| cells.get(idx).cloned().unwrap_or(Cell::Empty))
                .collect()
        })
        .collect())
}

fn year_pattern() -> CropResult<Regex> {
    // Exactly four digits, not part of a longer number
    Regex::new(r"(?:^|[^0-9])([0-9]{4})(?:[^0-9]|$)")
        .map_err(|e| CropError::Validation(format!("Regex error: {}", e)))
}

/// First standalone 4-digit year in a sheet name
fn extract_year(pattern: &Regex, sheet_name: &str) -> Option<i32> {
    pattern
        .captures(sheet_name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn header_label(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Empty | Data::Error(_) => String::new(),
        other => other.to_string(),
    }
}

/// Normalize a header label: lowercase, snake_case, units kept as words
pub fn normalize_header(label: &str) -> String {
    let expanded = label
        .trim()
        .to_lowercase()
        .replace('&', " and ")
        .replace('$', " dollars ")
        .replace('%', " percent ")
        .replace('#', " number ");

    let mut result = String::with_capacity(expanded.len());
    for c in expanded.chars() {
        if c.is_alphanumeric() {
            result.push(c);
        } else if !result.is_empty() && !result.ends_with('_') {
            result.push('_');
        }
    }

    result.trim_end_matches('_').to_string()
}

/// Normalize every label; blanks become `col_<n>`, repeats get `_2`, `_3`, ...
fn unique_headers(labels: &[String]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    labels
        .iter()
        .enumerate()
        .map(|(idx, label)| {
            let mut name = normalize_header(label);
            if name.is_empty() {
                name = format!("col_{}", idx + 1);
            }
            let count = seen.entry(name.clone()).or_insert(0);
            *count += 1;
            if *count > 1 {
                format!("{}_{}", name, count)
            } else {
                name
            }
        })
        .collect()
}

fn convert_cell(cell: &Data) -> Cell {
    match cell {
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.trim().to_string()),
        Data::Empty | Data::Error(_) => Cell::Empty,
        other => Cell::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header_units() {
        assert_eq!(normalize_header("Region"), "region");
        assert_eq!(
            normalize_header("Harvested Area (acres)"),
            "harvested_area_acres"
        );
        assert_eq!(
            normalize_header("Average Yield (000 lbs/acre)"),
            "average_yield_000_lbs_acre"
        );
        assert_eq!(
            normalize_header("Marketed Production (000 lbs)"),
            "marketed_production_000_lbs"
        );
        assert_eq!(
            normalize_header("Average Price (cents/lb)"),
            "average_price_cents_lb"
        );
        assert_eq!(normalize_header("Farm Value (000 $)"), "farm_value_000_dollars");
    }

    #[test]
    fn test_normalize_header_symbols() {
        assert_eq!(normalize_header("  Share %  "), "share_percent");
        assert_eq!(normalize_header("R&D"), "r_and_d");
        assert_eq!(normalize_header("# of Farms"), "number_of_farms");
        assert_eq!(normalize_header("---"), "");
    }

    #[test]
    fn test_unique_headers() {
        let labels = vec![
            "Region".to_string(),
            "".to_string(),
            "Region".to_string(),
            "Value".to_string(),
        ];
        assert_eq!(
            unique_headers(&labels),
            vec!["region", "col_2", "region_2", "value"]
        );
    }

    #[test]
    fn test_extract_year() {
        let pattern = year_pattern().unwrap();
        assert_eq!(extract_year(&pattern, "2019"), Some(2019));
        assert_eq!(extract_year(&pattern, "Carrots 2008"), Some(2008));
        assert_eq!(extract_year(&pattern, "2015_tomato"), Some(2015));
        assert_eq!(extract_year(&pattern, "Table (2011)"), Some(2011));
        assert_eq!(extract_year(&pattern, "20190"), None);
        assert_eq!(extract_year(&pattern, "Notes"), None);
        assert_eq!(extract_year(&pattern, "v12"), None);
    }

    #[test]
    fn test_convert_cell() {
        assert_eq!(convert_cell(&Data::Float(1.5)), Cell::Number(1.5));
        assert_eq!(convert_cell(&Data::Int(42)), Cell::Number(42.0));
        assert_eq!(convert_cell(&Data::String(" x ".to_string())), Cell::Text("x".to_string()));
        assert_eq!(convert_cell(&Data::String("  ".to_string())), Cell::Empty);
        assert_eq!(convert_cell(&Data::Empty), Cell::Empty);
        assert_eq!(convert_cell(&Data::Bool(true)), Cell::Text("true".to_string()));
    }

    #[test]
    fn test_align_reorders_same_columns() {
        let reference = vec!["region".to_string(), "value".to_string()];
        let parsed = ParsedSheet {
            columns: vec!["value".to_string(), "region".to_string()],
            rows: vec![vec![Cell::Number(5.0), Cell::Text("A".to_string())]],
        };
        let rows = align_to_columns(&reference, "2019", "2020", parsed).unwrap();
        assert_eq!(
            rows,
            vec![vec![Cell::Text("A".to_string()), Cell::Number(5.0)]]
        );
    }

    #[test]
    fn test_align_rejects_different_columns() {
        let reference = vec!["region".to_string(), "value".to_string()];
        let parsed = ParsedSheet {
            columns: vec!["region".to_string(), "price".to_string()],
            rows: Vec::new(),
        };
        let err = align_to_columns(&reference, "2019", "2020", parsed).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("missing [value]"));
        assert!(msg.contains("unexpected [price]"));
        assert!(msg.contains("'2020'"));
    }

    #[test]
    fn test_load_missing_file() {
        let loader = WorkbookLoader::new("/nonexistent/carrots.xlsx", 2);
        let err = loader.load("carrot").unwrap_err();
        assert!(matches!(err, CropError::Workbook { .. }));
    }
}
