//! # Sales Reports
//!
//! Read-only aggregation over committed sale batches.
//!
//! ```text
//! [SaleBatch] ──► summarize()          total profit, units, per-batch average
//!             ──► top_sellers(n)       per (product, size), units desc
//!             ──► profit_by_product()  per product, profit desc
//!             ──► daily_totals()       per sale date, ascending
//!
//! LedgerSnapshot::low_stock(threshold) covers the stock side.
//! ```

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{ItemKey, SaleBatch, SaleRecord};

fn records(batches: &[SaleBatch]) -> impl Iterator<Item = &SaleRecord> {
    batches.iter().flat_map(|b| b.records.iter())
}

// =============================================================================
// Summary
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub total_profit: Money,
    pub units_sold: i64,
    pub batch_count: usize,
    pub line_count: usize,
    /// Mean profit per committed cart; zero when there are no batches.
    pub average_per_batch: Money,
}

pub fn summarize(batches: &[SaleBatch]) -> SalesSummary {
    let total_profit: Money = batches.iter().map(SaleBatch::total_profit).sum();
    SalesSummary {
        total_profit,
        units_sold: batches.iter().map(SaleBatch::units).sum(),
        batch_count: batches.len(),
        line_count: batches.iter().map(|b| b.records.len()).sum(),
        average_per_batch: total_profit.divide_by(batches.len() as i64),
    }
}

// =============================================================================
// Per Item
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSales {
    pub product: String,
    pub size: String,
    pub sku: String,
    pub units: i64,
    pub profit: Money,
}

/// Best sellers by units, ties broken by (product, size).
pub fn top_sellers(batches: &[SaleBatch], limit: usize) -> Vec<ItemSales> {
    let mut by_item: BTreeMap<ItemKey, ItemSales> = BTreeMap::new();
    for record in records(batches) {
        let item = by_item.entry(record.key()).or_insert_with(|| ItemSales {
            product: record.product.clone(),
            size: record.size.clone(),
            sku: record.sku.clone(),
            units: 0,
            profit: Money::zero(),
        });
        item.units += record.quantity_sold;
        item.profit += record.line_profit;
    }

    let mut items: Vec<ItemSales> = by_item.into_values().collect();
    // Stable: equal units keep key order from the BTreeMap.
    items.sort_by(|a, b| b.units.cmp(&a.units));
    items.truncate(limit);
    items
}

// =============================================================================
// Per Product
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductProfit {
    pub product: String,
    pub units: i64,
    pub profit: Money,
    /// Mean of the recorded unit costs across this product's lines.
    pub average_unit_cost: Money,
    pub profit_per_unit: Money,
}

pub fn profit_by_product(batches: &[SaleBatch]) -> Vec<ProductProfit> {
    struct Acc {
        units: i64,
        profit: Money,
        cost_sum: Money,
        lines: i64,
    }

    let mut by_product: BTreeMap<&str, Acc> = BTreeMap::new();
    for record in records(batches) {
        let acc = by_product.entry(record.product.as_str()).or_insert(Acc {
            units: 0,
            profit: Money::zero(),
            cost_sum: Money::zero(),
            lines: 0,
        });
        acc.units += record.quantity_sold;
        acc.profit += record.line_profit;
        acc.cost_sum += record.unit_cost;
        acc.lines += 1;
    }

    let mut products: Vec<ProductProfit> = by_product
        .into_iter()
        .map(|(product, acc)| ProductProfit {
            product: product.to_string(),
            units: acc.units,
            profit: acc.profit,
            average_unit_cost: acc.cost_sum.divide_by(acc.lines),
            profit_per_unit: acc.profit.divide_by(acc.units),
        })
        .collect();
    products.sort_by(|a, b| b.profit.cmp(&a.profit));
    products
}

// =============================================================================
// Per Day
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotals {
    pub date: NaiveDate,
    pub batch_count: usize,
    pub units: i64,
    pub profit: Money,
}

pub fn daily_totals(batches: &[SaleBatch]) -> Vec<DailyTotals> {
    let mut by_day: BTreeMap<NaiveDate, DailyTotals> = BTreeMap::new();
    for batch in batches {
        let day = by_day.entry(batch.sale_date).or_insert(DailyTotals {
            date: batch.sale_date,
            batch_count: 0,
            units: 0,
            profit: Money::zero(),
        });
        day.batch_count += 1;
        day.units += batch.units();
        day.profit += batch.total_profit();
    }
    by_day.into_values().collect()
}
