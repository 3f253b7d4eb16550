//! # Report Aggregator
//!
//! Read-only reduction of the sale history and ledger state into business
//! metrics. This service only fetches rows; all math lives in
//! [`stockpile_core::report`], so the numbers are unit-testable without a
//! database and identical inputs always produce identical outputs.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ReportAggregator (this file)          stockpile-core::report           │
//! │                                                                         │
//! │  SELECT paid sales in range   ──────►  summary()                        │
//! │  SELECT sold items + product  ──────►  sales_trend()                    │
//! │         cost/category/supplier──────►  product/category/supplier perf   │
//! │  SELECT catalog + SUM(ledger) ──────►  inventory_stats()                │
//! │                               ──────►  recommendations()                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation takes an optional date range; `None` means the last
//! 30 days. Reads run at the pool's default isolation - sales commit
//! atomically, so a report never sees a half-written sale.

use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::StoreResult;
use crate::repository::ledger::StockLedger;
use stockpile_core::report::{
    self, GroupPerformance, InventoryStats, PaidSaleRecord, ProductPerformance, ProductRecord,
    Recommendation, ReportRange, SalesTrend, SoldItemRecord, StockStatusCounts,
    DEFAULT_RANGE_DAYS,
};
use stockpile_core::{Category, Supplier};

/// Read-only report service.
#[derive(Debug, Clone)]
pub struct ReportAggregator {
    pool: SqlitePool,
}

impl ReportAggregator {
    /// Creates a new ReportAggregator.
    pub fn new(pool: SqlitePool) -> Self {
        ReportAggregator { pool }
    }

    /// Headline financials for the range (default: last 30 days).
    pub async fn summary(&self, range: Option<ReportRange>) -> StoreResult<report::Summary> {
        let range = range.unwrap_or_default();
        debug!(start = %range.start, end = %range.end, "Computing summary");

        let sales = self.paid_sales(range).await?;
        let items = self.sold_items(range).await?;
        let product_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(report::summary(&sales, &items, product_count as u64))
    }

    /// Day-by-day revenue/profit for the last `days` calendar days,
    /// oldest first, zero-valued days included.
    pub async fn sales_trend(&self, days: u32) -> StoreResult<SalesTrend> {
        let end_day = Utc::now().date_naive();
        // Whole calendar days: from midnight of the oldest day through now
        let start = end_day - Duration::days(days as i64 - 1);
        let range = ReportRange::new(
            start.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc(),
            Utc::now(),
        );

        let sales = self.paid_sales(range).await?;
        let items = self.sold_items(range).await?;

        Ok(report::sales_trend(days, end_day, &sales, &items))
    }

    /// Per-product aggregation over the range: one entry per catalog
    /// product (even with zero sales), sorted by revenue descending.
    pub async fn product_performance(
        &self,
        range: Option<ReportRange>,
    ) -> StoreResult<Vec<ProductPerformance>> {
        let range = range.unwrap_or_default();
        let products = self.product_records().await?;
        let items = self.sold_items(range).await?;

        Ok(report::product_performance(&products, &items))
    }

    /// Per-category aggregation; zero-revenue categories dropped, sorted
    /// by revenue descending.
    pub async fn category_performance(
        &self,
        range: Option<ReportRange>,
    ) -> StoreResult<Vec<GroupPerformance>> {
        let range = range.unwrap_or_default();
        let categories =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        let items = self.sold_items(range).await?;

        Ok(report::category_performance(&categories, &items))
    }

    /// Per-supplier aggregation; same shape and filtering as categories.
    pub async fn supplier_performance(
        &self,
        range: Option<ReportRange>,
    ) -> StoreResult<Vec<GroupPerformance>> {
        let range = range.unwrap_or_default();
        let suppliers =
            sqlx::query_as::<_, Supplier>("SELECT id, name FROM suppliers ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        let items = self.sold_items(range).await?;

        Ok(report::supplier_performance(&suppliers, &items))
    }

    /// Counts of products by stock level. Delegates to the ledger.
    pub async fn stock_status(&self) -> StoreResult<StockStatusCounts> {
        StockLedger::new(self.pool.clone()).stock_status().await
    }

    /// Whole-inventory statistics for the range.
    pub async fn inventory_stats(
        &self,
        range: Option<ReportRange>,
    ) -> StoreResult<InventoryStats> {
        let range = range.unwrap_or_default();
        let products = self.product_records().await?;
        let items = self.sold_items(range).await?;

        Ok(report::inventory_stats(&products, &items))
    }

    /// Rule-based recommendations over the last 30 days of activity.
    pub async fn recommendations(&self) -> StoreResult<Vec<Recommendation>> {
        let status = self.stock_status().await?;
        let performance = self
            .product_performance(Some(ReportRange::last_days(DEFAULT_RANGE_DAYS)))
            .await?;

        Ok(report::recommendations(&status, &performance))
    }

    // =========================================================================
    // Row Fetching
    // =========================================================================

    /// PAID sales with a sale date inside the range.
    async fn paid_sales(&self, range: ReportRange) -> StoreResult<Vec<PaidSaleRecord>> {
        let sales = sqlx::query_as::<_, PaidSaleRecord>(
            r#"
            SELECT id AS sale_id, total_cents, sale_date
            FROM sales
            WHERE status = 'paid' AND sale_date >= ?1 AND sale_date <= ?2
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Line items of PAID sales in range, joined with the product's
    /// current cost price and classification.
    async fn sold_items(&self, range: ReportRange) -> StoreResult<Vec<SoldItemRecord>> {
        let items = sqlx::query_as::<_, SoldItemRecord>(
            r#"
            SELECT
                i.product_id,
                i.quantity,
                i.subtotal_cents,
                p.cost_price_cents,
                p.category_id,
                p.supplier_id,
                s.sale_date
            FROM sale_items i
            JOIN sales s ON s.id = i.sale_id
            JOIN products p ON p.id = i.product_id
            WHERE s.status = 'paid' AND s.sale_date >= ?1 AND s.sale_date <= ?2
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// The full catalog with ledger-derived current stock per product.
    async fn product_records(&self) -> StoreResult<Vec<ProductRecord>> {
        let products = sqlx::query_as::<_, ProductRecord>(
            r#"
            SELECT
                p.id AS product_id,
                p.name,
                p.cost_price_cents,
                p.selling_price_cents,
                COALESCE(
                    (SELECT SUM(m.quantity) FROM stock_movements m WHERE m.product_id = p.id),
                    0
                ) AS current_stock
            FROM products p
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use stockpile_core::{NewProduct, NewSale, NewSaleItem, PaymentMethod, SaleStatus};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_product(
        db: &Database,
        sku: &str,
        cost: i64,
        sell: i64,
        stock: i64,
        category_id: Option<String>,
    ) -> String {
        let id = db
            .products()
            .create(NewProduct {
                sku: sku.to_string(),
                name: format!("Product {sku}"),
                cost_price_cents: Some(cost),
                selling_price_cents: Some(sell),
                category_id,
                supplier_id: None,
            })
            .await
            .unwrap()
            .id;
        if stock > 0 {
            db.ledger()
                .record_addition(&id, stock, "purchase", None)
                .await
                .unwrap();
        }
        id
    }

    async fn paid_sale(db: &Database, product_id: &str, quantity: i64) {
        db.sales()
            .create_sale(NewSale {
                client_id: None,
                reference: None,
                payment_method: PaymentMethod::Cash,
                notes: None,
                items: vec![NewSaleItem {
                    product_id: product_id.to_string(),
                    quantity,
                    unit_price_cents: None,
                    discount_cents: 0,
                }],
                initial_status: SaleStatus::Paid,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_summary_end_to_end() {
        let db = test_db().await;
        // cost $10.00, sells at $25.00, 100 on hand
        let product_id = seed_product(&db, "PROD-A", 1000, 2500, 100, None).await;
        paid_sale(&db, &product_id, 5).await;

        let summary = db.reports().summary(None).await.unwrap();
        assert_eq!(summary.revenue.cents(), 12500);
        assert_eq!(summary.cost.cents(), 5000);
        assert_eq!(summary.profit.cents(), 7500);
        assert_eq!(summary.profit_margin_pct, 60.0);
        assert_eq!(summary.roi_pct, 150.0);
        assert_eq!(summary.sales_count, 1);
        assert_eq!(summary.product_count, 1);
        assert_eq!(summary.turnover_rate, 1.0);
    }

    #[tokio::test]
    async fn test_summary_ignores_pending_and_cancelled() {
        let db = test_db().await;
        let product_id = seed_product(&db, "PROD-A", 1000, 2500, 100, None).await;

        // Pending sale: not revenue
        db.sales()
            .create_sale(NewSale {
                client_id: None,
                reference: None,
                payment_method: PaymentMethod::Cash,
                notes: None,
                items: vec![NewSaleItem {
                    product_id: product_id.clone(),
                    quantity: 3,
                    unit_price_cents: None,
                    discount_cents: 0,
                }],
                initial_status: SaleStatus::Pending,
            })
            .await
            .unwrap();

        // Paid then cancelled: also not revenue
        let sale = db
            .sales()
            .create_sale(NewSale {
                client_id: None,
                reference: None,
                payment_method: PaymentMethod::Cash,
                notes: None,
                items: vec![NewSaleItem {
                    product_id: product_id.clone(),
                    quantity: 2,
                    unit_price_cents: None,
                    discount_cents: 0,
                }],
                initial_status: SaleStatus::Paid,
            })
            .await
            .unwrap();
        db.sales()
            .update_status(&sale.id, SaleStatus::Cancelled)
            .await
            .unwrap();

        let summary = db.reports().summary(None).await.unwrap();
        assert!(summary.revenue.is_zero());
        assert_eq!(summary.sales_count, 0);
    }

    #[tokio::test]
    async fn test_summary_is_idempotent() {
        let db = test_db().await;
        let product_id = seed_product(&db, "PROD-A", 1000, 2500, 100, None).await;
        paid_sale(&db, &product_id, 5).await;

        let range = Some(ReportRange::last_days(30));
        let first = db.reports().summary(range).await.unwrap();
        let second = db.reports().summary(range).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_empty_database_is_zero_safe() {
        let db = test_db().await;

        let summary = db.reports().summary(None).await.unwrap();
        assert!(summary.revenue.is_zero());
        assert_eq!(summary.profit_margin_pct, 0.0);
        assert_eq!(summary.roi_pct, 0.0);
        assert_eq!(summary.turnover_rate, 0.0);

        let stats = db.reports().inventory_stats(None).await.unwrap();
        assert_eq!(stats.total_items_in_stock, 0);

        assert!(db.reports().recommendations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_trend_covers_every_day() {
        let db = test_db().await;
        let product_id = seed_product(&db, "PROD-A", 1000, 2500, 100, None).await;
        paid_sale(&db, &product_id, 2).await;

        let trend = db.reports().sales_trend(7).await.unwrap();
        assert_eq!(trend.labels.len(), 7);
        assert_eq!(trend.revenue.len(), 7);
        assert_eq!(trend.profit.len(), 7);

        // Today (last entry) carries the sale; the prior days are zero
        assert_eq!(trend.revenue[6].cents(), 5000);
        assert_eq!(trend.profit[6].cents(), 3000);
        assert!(trend.revenue[..6].iter().all(|m| m.is_zero()));
    }

    #[tokio::test]
    async fn test_product_performance_covers_whole_catalog() {
        let db = test_db().await;
        let sold = seed_product(&db, "PROD-A", 1000, 2500, 100, None).await;
        let _unsold = seed_product(&db, "PROD-B", 500, 900, 50, None).await;
        paid_sale(&db, &sold, 5).await;

        let rows = db.reports().product_performance(None).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].product_id, sold);
        assert_eq!(rows[0].revenue.cents(), 12500);
        assert_eq!(rows[1].quantity, 0);
    }

    #[tokio::test]
    async fn test_category_performance_drops_unsold_categories() {
        let db = test_db().await;
        let beverages = db.directory().create_category("Beverages").await.unwrap();
        let snacks = db.directory().create_category("Snacks").await.unwrap();

        let product_id =
            seed_product(&db, "PROD-A", 1000, 2500, 100, Some(beverages.id.clone())).await;
        let _other = seed_product(&db, "PROD-B", 500, 900, 50, Some(snacks.id)).await;
        paid_sale(&db, &product_id, 5).await;

        let rows = db.reports().category_performance(None).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, beverages.id);
        assert_eq!(rows[0].name, "Beverages");
        assert_eq!(rows[0].revenue.cents(), 12500);
    }

    #[tokio::test]
    async fn test_stock_status_and_inventory_stats() {
        let db = test_db().await;
        seed_product(&db, "SKU-0", 1000, 2500, 15, None).await;
        seed_product(&db, "SKU-1", 500, 900, 5, None).await;
        seed_product(&db, "SKU-2", 200, 400, 0, None).await;

        let status = db.reports().stock_status().await.unwrap();
        assert_eq!(status.in_stock, 1);
        assert_eq!(status.low_stock, 1);
        assert_eq!(status.out_of_stock, 1);

        let stats = db.reports().inventory_stats(None).await.unwrap();
        assert_eq!(stats.total_items_in_stock, 20);
        assert_eq!(
            stats.total_inventory_value.cents(),
            15 * 1000 + 5 * 500
        );
        assert_eq!(stats.total_items_sold, 0);
    }

    #[tokio::test]
    async fn test_recommendations_fire() {
        let db = test_db().await;
        // High-ROI best seller plus an out-of-stock product
        let seller = seed_product(&db, "PROD-A", 1000, 2500, 100, None).await;
        seed_product(&db, "PROD-B", 500, 900, 0, None).await;
        paid_sale(&db, &seller, 10).await;

        let recs = db.reports().recommendations().await.unwrap();
        let titles: Vec<&str> = recs.iter().map(|r| r.title.as_str()).collect();

        assert!(titles.contains(&"Out of stock"));
        assert!(titles.contains(&"Best seller"));
        assert!(titles.contains(&"High-profit opportunity"));
    }
}
