use crate::types::Field;
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

pub type CropResult<T> = Result<T, CropError>;

#[derive(Error, Debug)]
pub enum CropError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Workbook error in {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    #[error("Sheet '{sheet}' in {path} has no 4-digit year in its name")]
    SheetYear { path: PathBuf, sheet: String },

    #[error("Sheet '{sheet}' does not match the schema of '{reference}': {detail}")]
    SchemaMismatch {
        sheet: String,
        reference: String,
        detail: String,
    },

    #[error("{0}")]
    MissingColumn(MissingColumnContext),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl CropError {
    pub fn workbook(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        CropError::Workbook {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for CropError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        CropError::Export(err.to_string())
    }
}

/// Details for a required column that is absent after header normalization
#[derive(Debug, Clone)]
pub struct MissingColumnContext {
    pub commodity: String,
    pub column: String,
    pub available_columns: Vec<String>,
}

impl MissingColumnContext {
    pub fn new(commodity: &str, column: &str, available_columns: Vec<String>) -> Self {
        Self {
            commodity: commodity.to_string(),
            column: column.to_string(),
            available_columns,
        }
    }

    /// Find the closest available column
    ///
    /// An exact (case-insensitive) match wins. Otherwise the candidate sharing
    /// the most `_`-separated words with the required name is returned, never
    /// one that is itself another required column.
    pub fn find_similar(&self) -> Option<String> {
        let wanted = self.column.to_lowercase();

        if let Some(c) = self
            .available_columns
            .iter()
            .find(|c| c.to_lowercase() == wanted)
        {
            return Some(c.clone());
        }

        let wanted_words: HashSet<&str> =
            wanted.split('_').filter(|w| !w.is_empty()).collect();
        let mut best: Option<(usize, &String)> = None;

        for candidate in &self.available_columns {
            let lower = candidate.to_lowercase();
            if Field::ALL.iter().any(|f| f.column_name() == lower) {
                continue;
            }
            let shared = lower
                .split('_')
                .filter(|w| wanted_words.contains(w))
                .collect::<HashSet<_>>()
                .len();
            if shared > 0 && best.map_or(true, |(score, _)| shared > score) {
                best = Some((shared, candidate));
            }
        }

        best.map(|(_, c)| c.clone())
    }
}

impl std::fmt::Display for MissingColumnContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Required column '{}' not found in {} data",
            self.column, self.commodity
        )?;
        if let Some(similar) = self.find_similar() {
            write!(f, " (did you mean '{}'?)", similar)?;
        }
        if !self.available_columns.is_empty() {
            write!(f, "; available: {}", self.available_columns.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_similar_prefix() {
        let ctx = MissingColumnContext::new(
            "carrot",
            "marketed_production_000_lbs",
            vec!["region".to_string(), "marketed_prod_000_lbs".to_string()],
        );
        assert_eq!(ctx.find_similar(), Some("marketed_prod_000_lbs".to_string()));
    }

    #[test]
    fn test_find_similar_skips_columns_bound_to_other_fields() {
        let mut available: Vec<String> = Field::ALL
            .iter()
            .filter(|f| **f != Field::AveragePrice)
            .map(|f| f.column_name().to_string())
            .collect();
        available.push("average_price_dollars_lb".to_string());

        let ctx = MissingColumnContext::new("tomato", "average_price_cents_lb", available);
        assert_eq!(ctx.find_similar(), Some("average_price_dollars_lb".to_string()));
    }

    #[test]
    fn test_find_similar_exact_ignores_case() {
        let ctx = MissingColumnContext::new("carrot", "region", vec!["Region".to_string()]);
        assert_eq!(ctx.find_similar(), Some("Region".to_string()));
    }

    #[test]
    fn test_find_similar_none() {
        let ctx = MissingColumnContext::new(
            "carrot",
            "farm_value_000_dollars",
            vec!["region".into()],
        );
        assert!(ctx.find_similar().is_none());
    }

    #[test]
    fn test_missing_column_message_lists_available() {
        let err = CropError::MissingColumn(MissingColumnContext::new(
            "tomato",
            "region",
            vec!["county".to_string(), "year".to_string()],
        ));
        let msg = err.to_string();
        assert!(msg.contains("'region'"));
        assert!(msg.contains("tomato"));
        assert!(msg.contains("county, year"));
    }
}
