//! Yield/Price Aggregator

use crate::types::{CleanRecord, CommodityData, YieldPrice, YieldPriceMeasure, YieldPriceRow};
use std::collections::BTreeMap;

/// Source prices are cents/lb; reports use dollars/lb
pub fn cents_to_dollars(cents: f64) -> f64 {
    cents / 100.0
}

/// Mean yield and mean price ($/lb) per year, years ascending
pub fn yearly_yield_price(records: &[CleanRecord]) -> Vec<YieldPrice> {
    let mut by_year: BTreeMap<i32, (f64, f64, usize)> = BTreeMap::new();
    for record in records {
        let (yield_sum, price_sum, count) = by_year.entry(record.year).or_insert((0.0, 0.0, 0));
        *yield_sum += record.average_yield;
        *price_sum += cents_to_dollars(record.average_price);
        *count += 1;
    }

    by_year
        .into_iter()
        .map(|(year, (yield_sum, price_sum, count))| YieldPrice {
            year,
            average_yield: yield_sum / count as f64,
            average_price_dollars: price_sum / count as f64,
        })
        .collect()
}

/// Long-form yearly averages of every commodity, tagged by commodity
pub fn merge_yield_price(commodities: &[CommodityData]) -> Vec<YieldPriceRow> {
    commodities
        .iter()
        .flat_map(|commodity| {
            yearly_yield_price(&commodity.records)
                .into_iter()
                .flat_map(move |yp| {
                    [
                        YieldPriceRow {
                            commodity: commodity.name.clone(),
                            year: yp.year,
                            measure: YieldPriceMeasure::Yield,
                            value: yp.average_yield,
                        },
                        YieldPriceRow {
                            commodity: commodity.name.clone(),
                            year: yp.year,
                            measure: YieldPriceMeasure::Price,
                            value: yp.average_price_dollars,
                        },
                    ]
                })
        })
        .collect()
}
