//! # Report Computation Engine
//!
//! Pure reduction of sale history + ledger state into business metrics.
//!
//! ## Design
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  stockpile-db fetches rows            this module reduces them      │
//! │                                                                     │
//! │  PAID sales in range      ──┐                                       │
//! │  their items (+ product   ──┼──►  summary / trend / performance /   │
//! │    cost, category, ...)     │     inventory stats / recommendations │
//! │  product catalog + stock  ──┘                                       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is a pure function: same inputs, same outputs, no I/O.
//! Money aggregation stays in integer cents; percentages become f64 only
//! at the output edge and are 0.0 (never NaN) when a denominator is zero.
//!
//! Cost figures read the product's *current* cost price, not a snapshot
//! captured at sale time. This mirrors how unit economics were tracked
//! before: changing a cost price retroactively changes historical profit.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::money::Money;
use crate::types::{Category, Supplier};

// =============================================================================
// Constants
// =============================================================================

/// Stock at or above this is "in stock"; below it (but above zero) is low.
pub const LOW_STOCK_THRESHOLD: i64 = 10;

/// Products with ROI above this get a high-profit recommendation.
pub const HIGH_ROI_THRESHOLD_PCT: f64 = 30.0;

/// Sold quantity strictly below this (and above zero) marks a slow mover.
pub const SLOW_MOVER_MAX_QUANTITY: i64 = 5;

/// Default reporting window when the caller omits a range.
pub const DEFAULT_RANGE_DAYS: i64 = 30;

// =============================================================================
// Report Range
// =============================================================================

/// Inclusive UTC date window for report queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        ReportRange { start, end }
    }

    /// The last `days` days, ending now.
    pub fn last_days(days: i64) -> Self {
        let end = Utc::now();
        ReportRange {
            start: end - Duration::days(days),
            end,
        }
    }
}

impl Default for ReportRange {
    fn default() -> Self {
        ReportRange::last_days(DEFAULT_RANGE_DAYS)
    }
}

// =============================================================================
// Inputs (rows fetched by the storage layer)
// =============================================================================

/// A PAID sale inside the report range.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PaidSaleRecord {
    pub sale_id: String,
    pub total_cents: i64,
    pub sale_date: DateTime<Utc>,
}

/// One sold line item of a PAID sale in range, joined with the product's
/// current cost price and classification.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SoldItemRecord {
    pub product_id: String,
    pub quantity: i64,
    /// Line revenue: `quantity * unit_price - discount` at sale time.
    pub subtotal_cents: i64,
    /// The product's current cost price (not a sale-time snapshot).
    pub cost_price_cents: Option<i64>,
    pub category_id: Option<String>,
    pub supplier_id: Option<String>,
    pub sale_date: DateTime<Utc>,
}

impl SoldItemRecord {
    fn cost(&self) -> Money {
        Money::from_cents(self.cost_price_cents.unwrap_or(0)).multiply_quantity(self.quantity)
    }

    fn revenue(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// A catalog product with its ledger-derived current stock.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductRecord {
    pub product_id: String,
    pub name: String,
    pub cost_price_cents: Option<i64>,
    pub selling_price_cents: Option<i64>,
    pub current_stock: i64,
}

// =============================================================================
// Outputs
// =============================================================================

/// Headline financials for a date window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub revenue: Money,
    pub cost: Money,
    pub profit: Money,
    /// Profit as a percentage of revenue (0 when revenue is 0).
    pub profit_margin_pct: f64,
    /// Profit as a percentage of cost (0 when cost is 0).
    pub roi_pct: f64,
    /// Paid-sale count over product count (0 when there are no products).
    pub turnover_rate: f64,
    pub sales_count: u64,
    pub product_count: u64,
}

/// Day-by-day revenue/profit series, oldest first. The three vectors are
/// parallel and always exactly `days` long, zero-valued days included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesTrend {
    /// ISO calendar dates (YYYY-MM-DD).
    pub labels: Vec<String>,
    pub revenue: Vec<Money>,
    pub profit: Vec<Money>,
}

/// Per-product aggregation over a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPerformance {
    pub product_id: String,
    pub name: String,
    /// Units sold in range.
    pub quantity: i64,
    pub revenue: Money,
    pub cost: Money,
    pub profit: Money,
    pub profit_margin_pct: f64,
    pub roi_pct: f64,
}

/// Per-category / per-supplier aggregation over a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupPerformance {
    pub id: String,
    pub name: String,
    pub quantity: i64,
    pub revenue: Money,
    pub cost: Money,
    pub profit: Money,
    pub profit_margin_pct: f64,
    pub roi_pct: f64,
}

/// Counts of products by stock classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockStatusCounts {
    /// stock >= threshold
    pub in_stock: u64,
    /// 0 < stock < threshold
    pub low_stock: u64,
    /// stock == 0
    pub out_of_stock: u64,
}

/// Whole-inventory statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryStats {
    /// Σ current stock over all products.
    pub total_items_in_stock: i64,
    /// Σ `current_stock * cost_price` over all products.
    pub total_inventory_value: Money,
    /// Mean of `(selling - cost) / cost * 100` over products with both
    /// prices set (and a non-zero cost).
    pub average_profit_margin_pct: f64,
    /// Σ item quantities of PAID sales in range.
    pub total_items_sold: i64,
}

/// Severity tag for a recommendation, so callers can render consistently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Warning,
    Success,
    Info,
}

/// One rule-based recommendation derived from the aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub title: String,
    pub message: String,
    pub action: String,
}

// =============================================================================
// Aggregations
// =============================================================================

/// Headline summary of PAID sales in range.
///
/// `sales` and `items` must already be filtered to PAID sales inside the
/// range; `product_count` is the whole catalog, not just sold products.
pub fn summary(
    sales: &[PaidSaleRecord],
    items: &[SoldItemRecord],
    product_count: u64,
) -> Summary {
    let revenue: Money = sales.iter().map(|s| Money::from_cents(s.total_cents)).sum();
    let cost: Money = items.iter().map(SoldItemRecord::cost).sum();
    let profit = revenue - cost;

    let sales_count = sales.len() as u64;
    let turnover_rate = if product_count == 0 {
        0.0
    } else {
        sales_count as f64 / product_count as f64
    };

    Summary {
        revenue,
        cost,
        profit,
        profit_margin_pct: profit.ratio_pct(revenue),
        roi_pct: profit.ratio_pct(cost),
        turnover_rate,
        sales_count,
        product_count,
    }
}

/// Revenue/profit per calendar day for the last `days` days ending at
/// `end_day`, oldest first. Produces exactly `days` entries; days without
/// sales are zero-valued, not skipped.
pub fn sales_trend(
    days: u32,
    end_day: NaiveDate,
    sales: &[PaidSaleRecord],
    items: &[SoldItemRecord],
) -> SalesTrend {
    let mut revenue_by_day: HashMap<NaiveDate, Money> = HashMap::new();
    for sale in sales {
        *revenue_by_day
            .entry(sale.sale_date.date_naive())
            .or_insert_with(Money::zero) += Money::from_cents(sale.total_cents);
    }

    let mut cost_by_day: HashMap<NaiveDate, Money> = HashMap::new();
    for item in items {
        *cost_by_day
            .entry(item.sale_date.date_naive())
            .or_insert_with(Money::zero) += item.cost();
    }

    let mut labels = Vec::with_capacity(days as usize);
    let mut revenue = Vec::with_capacity(days as usize);
    let mut profit = Vec::with_capacity(days as usize);

    for offset in (0..days as i64).rev() {
        let day = end_day - Duration::days(offset);
        let day_revenue = revenue_by_day.get(&day).copied().unwrap_or_default();
        let day_cost = cost_by_day.get(&day).copied().unwrap_or_default();

        labels.push(day.format("%Y-%m-%d").to_string());
        revenue.push(day_revenue);
        profit.push(day_revenue - day_cost);
    }

    SalesTrend {
        labels,
        revenue,
        profit,
    }
}

/// Per-line accumulator shared by the product and group aggregations.
#[derive(Default, Clone, Copy)]
struct LineTotals {
    quantity: i64,
    revenue: Money,
    cost: Money,
}

impl LineTotals {
    fn absorb(&mut self, item: &SoldItemRecord) {
        self.quantity += item.quantity;
        self.revenue += item.revenue();
        self.cost += item.cost();
    }
}

/// One entry per catalog product, zero-valued when nothing sold in range.
/// Sorted by revenue descending.
pub fn product_performance(
    products: &[ProductRecord],
    items: &[SoldItemRecord],
) -> Vec<ProductPerformance> {
    let mut totals: HashMap<&str, LineTotals> = HashMap::new();
    for item in items {
        totals
            .entry(item.product_id.as_str())
            .or_default()
            .absorb(item);
    }

    let mut rows: Vec<ProductPerformance> = products
        .iter()
        .map(|p| {
            let t = totals
                .get(p.product_id.as_str())
                .copied()
                .unwrap_or_default();
            let profit = t.revenue - t.cost;
            ProductPerformance {
                product_id: p.product_id.clone(),
                name: p.name.clone(),
                quantity: t.quantity,
                revenue: t.revenue,
                cost: t.cost,
                profit,
                profit_margin_pct: profit.ratio_pct(t.revenue),
                roi_pct: profit.ratio_pct(t.cost),
            }
        })
        .collect();

    rows.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    rows
}

/// Aggregates sold items by an arbitrary grouping key, keeping only groups
/// with revenue in range, sorted by revenue descending.
fn group_performance<F>(
    labels: &[(String, String)],
    items: &[SoldItemRecord],
    key: F,
) -> Vec<GroupPerformance>
where
    F: Fn(&SoldItemRecord) -> Option<&str>,
{
    let names: HashMap<&str, &str> = labels
        .iter()
        .map(|(id, name)| (id.as_str(), name.as_str()))
        .collect();

    let mut totals: HashMap<&str, LineTotals> = HashMap::new();
    for item in items {
        // Items whose product has no group are not attributable
        if let Some(group_id) = key(item) {
            totals.entry(group_id).or_default().absorb(item);
        }
    }

    let mut rows: Vec<GroupPerformance> = totals
        .into_iter()
        .filter(|(_, t)| t.revenue.is_positive())
        .map(|(id, t)| {
            let profit = t.revenue - t.cost;
            GroupPerformance {
                id: id.to_string(),
                name: names.get(id).unwrap_or(&id).to_string(),
                quantity: t.quantity,
                revenue: t.revenue,
                cost: t.cost,
                profit,
                profit_margin_pct: profit.ratio_pct(t.revenue),
                roi_pct: profit.ratio_pct(t.cost),
            }
        })
        .collect();

    rows.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    rows
}

/// Sold-item aggregation grouped by the product's category.
/// Zero-revenue categories are dropped.
pub fn category_performance(
    categories: &[Category],
    items: &[SoldItemRecord],
) -> Vec<GroupPerformance> {
    let labels: Vec<(String, String)> = categories
        .iter()
        .map(|c| (c.id.clone(), c.name.clone()))
        .collect();
    group_performance(&labels, items, |item| item.category_id.as_deref())
}

/// Sold-item aggregation grouped by the product's supplier.
/// Zero-revenue suppliers are dropped, same as categories.
pub fn supplier_performance(
    suppliers: &[Supplier],
    items: &[SoldItemRecord],
) -> Vec<GroupPerformance> {
    let labels: Vec<(String, String)> = suppliers
        .iter()
        .map(|s| (s.id.clone(), s.name.clone()))
        .collect();
    group_performance(&labels, items, |item| item.supplier_id.as_deref())
}

/// Classifies per-product stock levels into in/low/out counts.
pub fn stock_status_counts<I>(stocks: I, threshold: i64) -> StockStatusCounts
where
    I: IntoIterator<Item = i64>,
{
    let mut counts = StockStatusCounts::default();
    for stock in stocks {
        if stock <= 0 {
            counts.out_of_stock += 1;
        } else if stock < threshold {
            counts.low_stock += 1;
        } else {
            counts.in_stock += 1;
        }
    }
    counts
}

/// Whole-inventory statistics.
pub fn inventory_stats(
    products: &[ProductRecord],
    items_sold: &[SoldItemRecord],
) -> InventoryStats {
    let total_items_in_stock: i64 = products.iter().map(|p| p.current_stock).sum();

    let total_inventory_value: Money = products
        .iter()
        .map(|p| {
            Money::from_cents(p.cost_price_cents.unwrap_or(0)).multiply_quantity(p.current_stock)
        })
        .sum();

    // Markup over cost, averaged over products with both prices set.
    // A zero cost price is skipped rather than dividing by zero.
    let margins: Vec<f64> = products
        .iter()
        .filter_map(|p| match (p.selling_price_cents, p.cost_price_cents) {
            (Some(sell), Some(cost)) if cost > 0 => {
                Some((sell - cost) as f64 / cost as f64 * 100.0)
            }
            _ => None,
        })
        .collect();
    let average_profit_margin_pct = if margins.is_empty() {
        0.0
    } else {
        margins.iter().sum::<f64>() / margins.len() as f64
    };

    let total_items_sold: i64 = items_sold.iter().map(|i| i.quantity).sum();

    InventoryStats {
        total_items_in_stock,
        total_inventory_value,
        average_profit_margin_pct,
        total_items_sold,
    }
}

// =============================================================================
// Recommendations
// =============================================================================

/// Rule-based recommendations over already-computed aggregates.
///
/// `performance` is the last-30-days product performance (revenue
/// descending). Rule order and thresholds are fixed constants:
/// 1. low-stock warning when any product is low
/// 2. out-of-stock warning when any product is out
/// 3. best-seller note for the top-revenue product (if revenue > 0)
/// 4. high-profit note for each product with ROI above the threshold
/// 5. slow-mover note for the lowest-quantity product with 0 < qty < 5
pub fn recommendations(
    status: &StockStatusCounts,
    performance: &[ProductPerformance],
) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if status.low_stock > 0 {
        out.push(Recommendation {
            kind: RecommendationKind::Warning,
            title: "Low stock".to_string(),
            message: format!(
                "{} product(s) are below the low-stock threshold of {} units",
                status.low_stock, LOW_STOCK_THRESHOLD
            ),
            action: "Restock before they run out".to_string(),
        });
    }

    if status.out_of_stock > 0 {
        out.push(Recommendation {
            kind: RecommendationKind::Warning,
            title: "Out of stock".to_string(),
            message: format!("{} product(s) are out of stock", status.out_of_stock),
            action: "Restock or retire these products".to_string(),
        });
    }

    if let Some(best) = performance.iter().find(|p| p.revenue.is_positive()) {
        out.push(Recommendation {
            kind: RecommendationKind::Success,
            title: "Best seller".to_string(),
            message: format!(
                "{} generated {} in revenue over the last 30 days",
                best.name, best.revenue
            ),
            action: "Keep it stocked and visible".to_string(),
        });
    }

    for p in performance
        .iter()
        .filter(|p| p.roi_pct > HIGH_ROI_THRESHOLD_PCT)
    {
        out.push(Recommendation {
            kind: RecommendationKind::Info,
            title: "High-profit opportunity".to_string(),
            message: format!("{} returns {:.0}% on cost", p.name, p.roi_pct),
            action: "Consider stocking more".to_string(),
        });
    }

    let slow_mover = performance
        .iter()
        .filter(|p| p.quantity > 0 && p.quantity < SLOW_MOVER_MAX_QUANTITY)
        .min_by_key(|p| p.quantity);
    if let Some(p) = slow_mover {
        out.push(Recommendation {
            kind: RecommendationKind::Info,
            title: "Slow mover".to_string(),
            message: format!("{} sold only {} unit(s) recently", p.name, p.quantity),
            action: "Review pricing or placement".to_string(),
        });
    }

    out
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn sale(id: &str, total: i64, date: DateTime<Utc>) -> PaidSaleRecord {
        PaidSaleRecord {
            sale_id: id.to_string(),
            total_cents: total,
            sale_date: date,
        }
    }

    fn item(
        product: &str,
        qty: i64,
        subtotal: i64,
        cost_price: Option<i64>,
        date: DateTime<Utc>,
    ) -> SoldItemRecord {
        SoldItemRecord {
            product_id: product.to_string(),
            quantity: qty,
            subtotal_cents: subtotal,
            cost_price_cents: cost_price,
            category_id: None,
            supplier_id: None,
            sale_date: date,
        }
    }

    fn product(id: &str, name: &str, cost: Option<i64>, sell: Option<i64>, stock: i64) -> ProductRecord {
        ProductRecord {
            product_id: id.to_string(),
            name: name.to_string(),
            cost_price_cents: cost,
            selling_price_cents: sell,
            current_stock: stock,
        }
    }

    #[test]
    fn summary_matches_basic_scenario() {
        // One product: cost $10.00, sold 5 units at $25.00
        let date = at(2026, 8, 1);
        let sales = vec![sale("s1", 12500, date)];
        let items = vec![item("p1", 5, 12500, Some(1000), date)];

        let s = summary(&sales, &items, 1);
        assert_eq!(s.revenue.cents(), 12500);
        assert_eq!(s.cost.cents(), 5000);
        assert_eq!(s.profit.cents(), 7500);
        assert_eq!(s.profit_margin_pct, 60.0);
        assert_eq!(s.roi_pct, 150.0);
        assert_eq!(s.sales_count, 1);
        assert_eq!(s.turnover_rate, 1.0);
    }

    #[test]
    fn summary_is_zero_safe() {
        let s = summary(&[], &[], 0);
        assert!(s.revenue.is_zero());
        assert!(s.cost.is_zero());
        assert_eq!(s.profit_margin_pct, 0.0);
        assert_eq!(s.roi_pct, 0.0);
        assert_eq!(s.turnover_rate, 0.0);
    }

    #[test]
    fn summary_is_deterministic() {
        let date = at(2026, 8, 2);
        let sales = vec![sale("s1", 999, date), sale("s2", 2001, date)];
        let items = vec![item("p1", 3, 3000, Some(333), date)];

        let first = summary(&sales, &items, 7);
        let second = summary(&sales, &items, 7);
        assert_eq!(first, second);
    }

    #[test]
    fn trend_has_exactly_n_days_oldest_first() {
        let end = NaiveDate::from_ymd_opt(2026, 8, 10).unwrap();
        let sales = vec![
            sale("s1", 1000, at(2026, 8, 10)),
            sale("s2", 500, at(2026, 8, 8)),
        ];
        let items = vec![
            item("p1", 1, 1000, Some(400), at(2026, 8, 10)),
            item("p1", 1, 500, Some(400), at(2026, 8, 8)),
        ];

        let trend = sales_trend(7, end, &sales, &items);
        assert_eq!(trend.labels.len(), 7);
        assert_eq!(trend.revenue.len(), 7);
        assert_eq!(trend.profit.len(), 7);

        assert_eq!(trend.labels[0], "2026-08-04");
        assert_eq!(trend.labels[6], "2026-08-10");

        // Day without sales is zero, not skipped
        assert!(trend.revenue[5].is_zero()); // 2026-08-09
        assert_eq!(trend.revenue[6].cents(), 1000);
        assert_eq!(trend.profit[6].cents(), 600);
        assert_eq!(trend.revenue[4].cents(), 500); // 2026-08-08
        assert_eq!(trend.profit[4].cents(), 100);
    }

    #[test]
    fn product_performance_includes_unsold_products() {
        let date = at(2026, 8, 5);
        let products = vec![
            product("p1", "Widget", Some(1000), Some(2500), 50),
            product("p2", "Gadget", Some(500), Some(900), 10),
        ];
        let items = vec![item("p1", 5, 12500, Some(1000), date)];

        let rows = product_performance(&products, &items);
        assert_eq!(rows.len(), 2);

        // Sorted by revenue descending: sold product first
        assert_eq!(rows[0].product_id, "p1");
        assert_eq!(rows[0].quantity, 5);
        assert_eq!(rows[0].revenue.cents(), 12500);
        assert_eq!(rows[0].profit.cents(), 7500);
        assert_eq!(rows[0].roi_pct, 150.0);

        assert_eq!(rows[1].product_id, "p2");
        assert_eq!(rows[1].quantity, 0);
        assert!(rows[1].revenue.is_zero());
        assert_eq!(rows[1].profit_margin_pct, 0.0);
        assert_eq!(rows[1].roi_pct, 0.0);
    }

    #[test]
    fn group_performance_drops_zero_revenue_groups() {
        let date = at(2026, 8, 5);
        let categories = vec![
            Category {
                id: "c1".to_string(),
                name: "Beverages".to_string(),
            },
            Category {
                id: "c2".to_string(),
                name: "Snacks".to_string(),
            },
        ];
        let mut sold = item("p1", 2, 4000, Some(1500), date);
        sold.category_id = Some("c1".to_string());

        let rows = category_performance(&categories, &[sold]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "c1");
        assert_eq!(rows[0].name, "Beverages");
        assert_eq!(rows[0].revenue.cents(), 4000);
        assert_eq!(rows[0].cost.cents(), 3000);
    }

    #[test]
    fn supplier_performance_sorts_by_revenue() {
        let date = at(2026, 8, 5);
        let suppliers = vec![
            Supplier {
                id: "sup1".to_string(),
                name: "Acme".to_string(),
            },
            Supplier {
                id: "sup2".to_string(),
                name: "Globex".to_string(),
            },
        ];
        let mut small = item("p1", 1, 1000, Some(500), date);
        small.supplier_id = Some("sup1".to_string());
        let mut large = item("p2", 1, 9000, Some(500), date);
        large.supplier_id = Some("sup2".to_string());

        let rows = supplier_performance(&suppliers, &[small, large]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "sup2");
        assert_eq!(rows[1].id, "sup1");
    }

    #[test]
    fn stock_status_classification() {
        // Three products with stock [15, 5, 0] and threshold 10
        let counts = stock_status_counts([15, 5, 0], LOW_STOCK_THRESHOLD);
        assert_eq!(counts.in_stock, 1);
        assert_eq!(counts.low_stock, 1);
        assert_eq!(counts.out_of_stock, 1);

        // Boundary: exactly the threshold counts as in stock
        let counts = stock_status_counts([10, 9, 1], 10);
        assert_eq!(counts.in_stock, 1);
        assert_eq!(counts.low_stock, 2);
        assert_eq!(counts.out_of_stock, 0);
    }

    #[test]
    fn inventory_stats_values_and_margin() {
        let date = at(2026, 8, 5);
        let products = vec![
            // margin (2500-1000)/1000 = 150%
            product("p1", "Widget", Some(1000), Some(2500), 10),
            // margin (900-500)/500 = 80%
            product("p2", "Gadget", Some(500), Some(900), 4),
            // missing cost price: skipped from margin, zero inventory value
            product("p3", "Gizmo", None, Some(700), 3),
        ];
        let sold = vec![item("p1", 5, 12500, Some(1000), date)];

        let stats = inventory_stats(&products, &sold);
        assert_eq!(stats.total_items_in_stock, 17);
        assert_eq!(stats.total_inventory_value.cents(), 10 * 1000 + 4 * 500);
        assert!((stats.average_profit_margin_pct - 115.0).abs() < 1e-9);
        assert_eq!(stats.total_items_sold, 5);
    }

    #[test]
    fn inventory_stats_empty_is_zero() {
        let stats = inventory_stats(&[], &[]);
        assert_eq!(stats.total_items_in_stock, 0);
        assert!(stats.total_inventory_value.is_zero());
        assert_eq!(stats.average_profit_margin_pct, 0.0);
        assert_eq!(stats.total_items_sold, 0);
    }

    #[test]
    fn recommendations_fire_in_fixed_order() {
        let status = StockStatusCounts {
            in_stock: 3,
            low_stock: 2,
            out_of_stock: 1,
        };
        let performance = vec![
            ProductPerformance {
                product_id: "p1".to_string(),
                name: "Widget".to_string(),
                quantity: 12,
                revenue: Money::from_cents(30000),
                cost: Money::from_cents(12000),
                profit: Money::from_cents(18000),
                profit_margin_pct: 60.0,
                roi_pct: 150.0,
            },
            ProductPerformance {
                product_id: "p2".to_string(),
                name: "Gadget".to_string(),
                quantity: 2,
                revenue: Money::from_cents(1800),
                cost: Money::from_cents(1500),
                profit: Money::from_cents(300),
                profit_margin_pct: 16.7,
                roi_pct: 20.0,
            },
        ];

        let recs = recommendations(&status, &performance);

        assert_eq!(recs.len(), 5);
        assert_eq!(recs[0].kind, RecommendationKind::Warning);
        assert_eq!(recs[0].title, "Low stock");
        assert_eq!(recs[1].title, "Out of stock");
        assert_eq!(recs[2].kind, RecommendationKind::Success);
        assert!(recs[2].message.contains("Widget"));
        assert_eq!(recs[3].title, "High-profit opportunity");
        assert!(recs[3].message.contains("Widget"));
        assert_eq!(recs[4].title, "Slow mover");
        assert!(recs[4].message.contains("Gadget"));
    }

    #[test]
    fn recommendations_silent_when_nothing_to_say() {
        let status = StockStatusCounts {
            in_stock: 5,
            low_stock: 0,
            out_of_stock: 0,
        };
        // No revenue anywhere, nothing sold
        let performance = vec![ProductPerformance {
            product_id: "p1".to_string(),
            name: "Widget".to_string(),
            quantity: 0,
            revenue: Money::zero(),
            cost: Money::zero(),
            profit: Money::zero(),
            profit_margin_pct: 0.0,
            roi_pct: 0.0,
        }];

        let recs = recommendations(&status, &performance);
        assert!(recs.is_empty());
    }
}
