//! Pipeline configuration
//!
//! Everything the pipeline would otherwise hardcode lives here: the workbook
//! for each commodity, the number of preamble rows above each sheet's header,
//! the last year of the early period, and the label of the province-wide
//! aggregate row.
//!
//! ```yaml
//! commodities:
//!   - name: carrot
//!     path: data/carrots.xlsx
//!   - name: tomato
//!     path: data/tomatoes.xlsx
//! header_skip: 2
//! period_boundary: 2013
//! aggregate_label: Province
//! top_n: 5
//! ```
//!
//! Relative workbook paths are resolved against the config file's directory.

use crate::error::{CropError, CropResult};
use serde::{Deserialize, Serialize};
use crate::writer::file_stem;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

pub const DEFAULT_HEADER_SKIP: usize = 2;
pub const DEFAULT_PERIOD_BOUNDARY: i32 = 2013;
pub const DEFAULT_AGGREGATE_LABEL: &str = "Province";
pub const DEFAULT_TOP_N: usize = 5;

/// One commodity workbook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommoditySource {
    pub name: String,
    pub path: PathBuf,
}

impl CommoditySource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Parse a `NAME=PATH` command-line argument
    pub fn parse_arg(arg: &str) -> CropResult<Self> {
        let (name, path) = arg.split_once('=').ok_or_else(|| {
            CropError::Config(format!("Expected NAME=PATH for --source, got '{}'", arg))
        })?;
        let name = name.trim();
        let path = path.trim();
        if name.is_empty() || path.is_empty() {
            return Err(CropError::Config(format!(
                "Expected NAME=PATH for --source, got '{}'",
                arg
            )));
        }
        Ok(Self::new(name, path))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default)]
    pub commodities: Vec<CommoditySource>,

    /// Rows above the header row on every sheet
    #[serde(default = "default_header_skip")]
    pub header_skip: usize,

    /// Last year of the early period; later years are the late period
    #[serde(default = "default_period_boundary")]
    pub period_boundary: i32,

    /// Region label of the aggregate row excluded from analysis
    #[serde(default = "default_aggregate_label")]
    pub aggregate_label: String,

    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_header_skip() -> usize {
    DEFAULT_HEADER_SKIP
}

fn default_period_boundary() -> i32 {
    DEFAULT_PERIOD_BOUNDARY
}

fn default_aggregate_label() -> String {
    DEFAULT_AGGREGATE_LABEL.to_string()
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            commodities: Vec::new(),
            header_skip: DEFAULT_HEADER_SKIP,
            period_boundary: DEFAULT_PERIOD_BOUNDARY,
            aggregate_label: DEFAULT_AGGREGATE_LABEL.to_string(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl PipelineConfig {
    /// Read a YAML config file; relative commodity paths become relative to its directory
    pub fn from_file(path: &Path) -> CropResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CropError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let mut config = Self::from_yaml_str(&content)?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        for source in &mut config.commodities {
            if source.path.is_relative() {
                source.path = base_dir.join(&source.path);
            }
        }

        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> CropResult<Self> {
        let config: PipelineConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Add a commodity, replacing any existing source with the same name
    pub fn upsert_source(&mut self, source: CommoditySource) {
        match self.commodities.iter_mut().find(|s| s.name == source.name) {
            Some(existing) => existing.path = source.path,
            None => self.commodities.push(source),
        }
    }

    pub fn validate(&self) -> CropResult<()> {
        if self.commodities.is_empty() {
            return Err(CropError::Config(
                "No commodities configured (use --source NAME=PATH or a config file)".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut stems: HashMap<String, &str> = HashMap::new();
        for source in &self.commodities {
            if source.name.trim().is_empty() {
                return Err(CropError::Config("Commodity name cannot be empty".to_string()));
            }
            if !seen.insert(source.name.as_str()) {
                return Err(CropError::Config(format!(
                    "Commodity '{}' is configured more than once",
                    source.name
                )));
            }
            // Output files are keyed by the lowercased name
            if let Some(other) = stems.insert(file_stem(&source.name), source.name.as_str()) {
                return Err(CropError::Config(format!(
                    "Commodities '{}' and '{}' differ only in case or punctuation",
                    other, source.name
                )));
            }
        }

        if self.aggregate_label.trim().is_empty() {
            return Err(CropError::Config("Aggregate label cannot be empty".to_string()));
        }

        if self.top_n == 0 {
            return Err(CropError::Config("top_n must be at least 1".to_string()));
        }

        Ok(())
    }
}
