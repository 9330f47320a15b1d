//! Cleaner: CommodityTable → CleanRecord

use crate::error::{CropError, CropResult, MissingColumnContext};
use crate::types::{CleanRecord, CleanStats, CommodityTable, Field, RawRow, Schema};
use tracing::{debug, info};

/// Resolve the six required columns by their normalized names
pub fn resolve_schema(table: &CommodityTable) -> CropResult<Schema> {
    let mut indices = [0usize; 6];
    for field in Field::ALL {
        indices[field as usize] = table.column_index(field.column_name()).ok_or_else(|| {
            CropError::MissingColumn(MissingColumnContext::new(
                &table.commodity,
                field.column_name(),
                table.columns.clone(),
            ))
        })?;
    }
    Ok(Schema::new(indices))
}

/// Project, drop rows with a missing field, then drop aggregate rows
///
/// The input table is left untouched. Drop counts are logged and returned so
/// silent data loss stays auditable.
pub fn clean(
    table: &CommodityTable,
    aggregate_label: &str,
) -> CropResult<(Vec<CleanRecord>, CleanStats)> {
    let schema = resolve_schema(table)?;
    let mut stats = CleanStats {
        total_rows: table.rows.len(),
        ..CleanStats::default()
    };

    let mut records = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let Some(record) = project_row(row, &schema) else {
            stats.missing_values += 1;
            continue;
        };
        if record.region == aggregate_label {
            stats.aggregate_rows += 1;
            continue;
        }
        records.push(record);
    }
    stats.kept = records.len();

    info!(
        commodity = table.commodity.as_str(),
        total = stats.total_rows,
        missing = stats.missing_values,
        aggregate = stats.aggregate_rows,
        kept = stats.kept,
        "cleaned rows"
    );
    if stats.missing_values > 0 {
        debug!(
            commodity = table.commodity.as_str(),
            "{} rows dropped for missing values", stats.missing_values
        );
    }

    Ok((records, stats))
}

/// Typed projection of one raw row; `None` if any of the six fields is missing
fn project_row(row: &RawRow, schema: &Schema) -> Option<CleanRecord> {
    let cell = |field: Field| row.cells.get(schema.index(field));
    let number = |field: Field| cell(field).and_then(|c| c.as_number());

    Some(CleanRecord {
        region: cell(Field::Region)?.as_text()?,
        year: row.year,
        harvested_area: number(Field::HarvestedArea)?,
        average_yield: number(Field::AverageYield)?,
        marketed_production: number(Field::MarketedProduction)?,
        average_price: number(Field::AveragePrice)?,
        farm_value: number(Field::FarmValue)?,
    })
}
