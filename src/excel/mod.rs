//! Excel boundary: workbook import and report export
//!
//! - Import: one-sheet-per-year commodity workbooks → CommodityTable
//! - Export: Analysis → .xlsx report with native charts

mod exporter;
mod importer;

pub use exporter::ReportExporter;
pub use importer::{normalize_header, SheetInfo, WorkbookLoader};
