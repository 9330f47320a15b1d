//! Cropscope - county crop production analytics over multi-year workbooks
//!
//! Loads one workbook per commodity (one sheet per year), cleans the rows,
//! and derives yearly totals, top-producer rankings, per-region variability,
//! yield/price averages and early/late period comparisons.
//!
//! # Example
//!
//! ```no_run
//! use cropscope::config::{CommoditySource, PipelineConfig};
//! use cropscope::pipeline;
//!
//! let mut config = PipelineConfig::default();
//! config.upsert_source(CommoditySource::new("carrot", "data/carrots.xlsx"));
//! config.upsert_source(CommoditySource::new("tomato", "data/tomatoes.xlsx"));
//!
//! let analysis = pipeline::run(&config)?;
//! for commodity in &analysis.commodities {
//!     println!("{}: {} years", commodity.name, commodity.yearly.len());
//! }
//! # Ok::<(), cropscope::error::CropError>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod excel;
pub mod pipeline;
pub mod types;
pub mod writer;

// Re-export commonly used types
pub use config::{CommoditySource, PipelineConfig};
pub use error::{CropError, CropResult};
pub use pipeline::{Analysis, CommodityAnalysis};
pub use types::{CleanRecord, CommodityTable, Field};
