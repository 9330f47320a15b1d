//! Analysis stages: cleaning, aggregation, ranking, dispersion and era comparison
//!
//! Every stage is a pure function from its input table(s) to a new table.

pub mod cleaner;
pub mod period;
pub mod ranking;
pub mod stats;
pub mod variability;
pub mod yearly;
pub mod yield_price;

pub use cleaner::{clean, resolve_schema};
pub use period::compare_periods;
pub use ranking::{region_series, region_totals, top_producers, top_regions};
pub use variability::{rank_by_stability, variability, VariabilityMeasure};
pub use yearly::{to_long, yearly_totals};
pub use yield_price::{cents_to_dollars, merge_yield_price, yearly_yield_price};
