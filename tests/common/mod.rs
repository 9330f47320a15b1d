//! Workbook fixtures shared by the integration tests

#![allow(dead_code)]

use cropscope::types::Field;
use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};

/// One data row: region, then area, yield, production, price (cents), value; `None` = blank cell
pub type Row<'a> = (&'a str, [Option<f64>; 5]);

pub fn full(area: f64, yield_: f64, production: f64, price: f64, value: f64) -> [Option<f64>; 5] {
    [Some(area), Some(yield_), Some(production), Some(price), Some(value)]
}

/// Production and value only; the other measures get plausible constants
pub fn pv(production: f64, value: f64) -> [Option<f64>; 5] {
    full(10.0, 20.0, production, 50.0, value)
}

pub fn source_headers() -> Vec<&'static str> {
    Field::ALL.iter().map(|f| f.source_header()).collect()
}

/// Write a workbook with one sheet per `(sheet_name, rows)`, two preamble rows, then the header
pub fn write_workbook(path: &Path, sheets: &[(&str, Vec<Row>)]) {
    write_workbook_with_headers(path, sheets, &source_headers());
}

pub fn write_workbook_with_headers(path: &Path, sheets: &[(&str, Vec<Row>)], headers: &[&str]) {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name).unwrap();
        sheet
            .write_string(0, 0, format!("Area, production and farm value, {}", name))
            .unwrap();
        sheet.write_string(1, 0, "Source: provincial statistics").unwrap();
        for (col, header) in headers.iter().enumerate() {
            sheet.write_string(2, col as u16, *header).unwrap();
        }
        for (idx, (region, values)) in rows.iter().enumerate() {
            let row = 3 + idx as u32;
            sheet.write_string(row, 0, *region).unwrap();
            for (offset, value) in values.iter().enumerate() {
                if let Some(v) = value {
                    sheet.write_number(row, offset as u16 + 1, *v).unwrap();
                }
            }
        }
    }
    workbook.save(path).unwrap();
}

/// Carrot and tomato workbooks spanning both periods
pub fn write_sample_pair(dir: &Path) -> (PathBuf, PathBuf) {
    let carrots = dir.join("carrots.xlsx");
    write_workbook(
        &carrots,
        &[
            (
                "2012",
                vec![
                    ("Essex", pv(900.0, 300.0)),
                    ("Kent", pv(500.0, 200.0)),
                    ("Oldtown", pv(50.0, 20.0)),
                    ("Province", pv(1450.0, 520.0)),
                ],
            ),
            (
                "2013",
                vec![
                    ("Essex", pv(1000.0, 320.0)),
                    ("Kent", pv(600.0, 260.0)),
                    ("Huron", [Some(5.0), Some(9.0), None, Some(40.0), Some(11.0)]),
                    ("Province", pv(1600.0, 580.0)),
                ],
            ),
            (
                "2014",
                vec![
                    ("Essex", pv(1100.0, 350.0)),
                    ("Kent", pv(700.0, 300.0)),
                    ("Huron", pv(300.0, 150.0)),
                    ("Province", pv(2100.0, 800.0)),
                ],
            ),
        ],
    );

    let tomatoes = dir.join("tomatoes.xlsx");
    write_workbook(
        &tomatoes,
        &[
            (
                "Tomatoes 2013",
                vec![
                    ("Essex", full(100.0, 40.0, 4000.0, 12.0, 480.0)),
                    ("Kent", full(80.0, 35.0, 2800.0, 14.0, 392.0)),
                ],
            ),
            (
                "Tomatoes 2014",
                vec![
                    ("Essex", full(110.0, 42.0, 4620.0, 13.0, 600.0)),
                    ("Kent", full(85.0, 36.0, 3060.0, 15.0, 459.0)),
                    ("Province", full(195.0, 39.0, 7680.0, 14.0, 1059.0)),
                ],
            ),
        ],
    );

    (carrots, tomatoes)
}
