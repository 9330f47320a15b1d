//! Workbook loading tests against real .xlsx fixtures

mod common;

use common::{full, pv, source_headers, write_workbook, write_workbook_with_headers};
use cropscope::error::CropError;
use cropscope::excel::WorkbookLoader;
use cropscope::types::{Cell, Field};
use pretty_assertions::assert_eq;
use rust_xlsxwriter::Workbook;
use tempfile::TempDir;

#[test]
fn test_load_concatenates_sheets_with_years() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("carrots.xlsx");
    write_workbook(
        &path,
        &[
            ("2020", vec![("A", pv(100.0, 50.0)), ("B", pv(10.0, 5.0))]),
            ("2021", vec![("A", pv(200.0, 150.0))]),
        ],
    );

    let table = WorkbookLoader::new(&path, 2).load("carrot").unwrap();

    assert_eq!(table.commodity, "carrot");
    assert_eq!(table.sheets, vec!["2020", "2021"]);
    assert_eq!(table.row_count(), 3);
    assert_eq!(table.years(), vec![2020, 2021]);
    let expected: Vec<String> = Field::ALL
        .iter()
        .map(|f| f.column_name().to_string())
        .collect();
    assert_eq!(table.columns, expected);

    let last = &table.rows[2];
    assert_eq!(last.year, 2021);
    assert_eq!(last.sheet, "2021");
    assert_eq!(last.cells[0], Cell::Text("A".to_string()));
    assert_eq!(last.cells[3], Cell::Number(200.0));
}

#[test]
fn test_blank_cells_load_as_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("blank.xlsx");
    write_workbook(
        &path,
        &[("2019", vec![("A", [Some(1.0), None, Some(3.0), Some(4.0), Some(5.0)])])],
    );

    let table = WorkbookLoader::new(&path, 2).load("carrot").unwrap();
    assert_eq!(table.rows[0].cells[2], Cell::Empty);
}

#[test]
fn test_sheet_without_year_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.xlsx");
    write_workbook(
        &path,
        &[
            ("2020", vec![("A", pv(1.0, 1.0))]),
            ("Notes", vec![("A", pv(1.0, 1.0))]),
        ],
    );

    let err = WorkbookLoader::new(&path, 2).load("carrot").unwrap_err();
    match err {
        CropError::SheetYear { sheet, .. } => assert_eq!(sheet, "Notes"),
        other => panic!("Expected SheetYear, got {:?}", other),
    }
}

#[test]
fn test_schema_mismatch_between_sheets_is_fatal() {
    let dir = TempDir::new().unwrap();
    // Second sheet renames a column
    let path = dir.path().join("drift.xlsx");
    let mut workbook = Workbook::new();
    let mut renamed = source_headers();
    renamed[4] = "Price (cents/lb)";
    for (name, headers) in [("2020", source_headers()), ("2021", renamed)] {
        let sheet = workbook.add_worksheet();
        sheet.set_name(name).unwrap();
        for (col, header) in headers.iter().enumerate() {
            sheet.write_string(2, col as u16, *header).unwrap();
        }
        sheet.write_string(3, 0, "A").unwrap();
    }
    workbook.save(&path).unwrap();

    let err = WorkbookLoader::new(&path, 2).load("carrot").unwrap_err();
    match err {
        CropError::SchemaMismatch {
            sheet,
            reference,
            detail,
        } => {
            assert_eq!(sheet, "2021");
            assert_eq!(reference, "2020");
            assert!(detail.contains("average_price_cents_lb"));
            assert!(detail.contains("price_cents_lb"));
        }
        other => panic!("Expected SchemaMismatch, got {:?}", other),
    }
}

#[test]
fn test_reordered_columns_are_aligned() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reordered.xlsx");

    let mut workbook = Workbook::new();
    let headers = source_headers();
    let mut swapped = headers.clone();
    swapped.swap(3, 5);

    for (name, hdrs) in [("2020", &headers), ("2021", &swapped)] {
        let sheet = workbook.add_worksheet();
        sheet.set_name(name).unwrap();
        for (col, header) in hdrs.iter().enumerate() {
            sheet.write_string(2, col as u16, *header).unwrap();
        }
        sheet.write_string(3, 0, "A").unwrap();
        for col in 1..6u16 {
            sheet.write_number(3, col, col as f64).unwrap();
        }
    }
    workbook.save(&path).unwrap();

    let table = WorkbookLoader::new(&path, 2).load("carrot").unwrap();
    // Column 3 (production) of the second sheet came from its column 5
    assert_eq!(table.rows[0].cells[3], Cell::Number(3.0));
    assert_eq!(table.rows[1].cells[3], Cell::Number(5.0));
    assert_eq!(table.rows[1].cells[5], Cell::Number(3.0));
}

#[test]
fn test_header_skip_is_configurable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("no_preamble.xlsx");

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("2018").unwrap();
    for (col, header) in source_headers().iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    sheet.write_string(1, 0, "A").unwrap();
    workbook.save(&path).unwrap();

    let table = WorkbookLoader::new(&path, 0).load("carrot").unwrap();
    assert_eq!(table.columns[0], "region");
    assert_eq!(table.row_count(), 1);
}

#[test]
fn test_unexpected_headers_are_normalized() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("headers.xlsx");
    write_workbook_with_headers(
        &path,
        &[("2017", vec![("A", full(1.0, 2.0, 3.0, 4.0, 5.0))])],
        &["County", "Area (ha)", "Yield", "Production", "Price %", "Value ($)"],
    );

    let table = WorkbookLoader::new(&path, 2).load("tomato").unwrap();
    assert_eq!(
        table.columns,
        vec![
            "county",
            "area_ha",
            "yield",
            "production",
            "price_percent",
            "value_dollars"
        ]
    );
}

#[test]
fn test_inspect_reports_every_sheet() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mixed.xlsx");
    write_workbook(
        &path,
        &[
            ("2020", vec![("A", pv(1.0, 1.0)), ("B", pv(2.0, 2.0))]),
            ("Notes", vec![("A", pv(1.0, 1.0))]),
        ],
    );

    let sheets = WorkbookLoader::new(&path, 2).inspect().unwrap();

    assert_eq!(sheets.len(), 2);
    assert_eq!(sheets[0].year, Some(2020));
    assert_eq!(sheets[0].data_rows, 2);
    assert!(sheets[0].problem.is_none());
    assert_eq!(sheets[1].year, None);
    assert!(sheets[1].problem.is_some());
}
