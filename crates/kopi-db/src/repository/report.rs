//! # Report Repository
//!
//! Read-only daily and monthly sales summaries rebuilt from the ledger.
//!
//! ## Bucketing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  daily_summary(user, "2024-03-10")                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ReportingTimezone::day_bounds → [2024-03-09T17:00Z, 2024-03-10T17:00Z)│
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  WHERE created_at >= ?start AND created_at < ?end   (index range scan) │
//! │                                                                         │
//! │  monthly_summary(user)                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  GROUP BY strftime('%Y-%m', created_at, '+420 minutes')                │
//! │  ORDER BY month DESC LIMIT 12                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sums are integer minor units. Each report reads inside one storage
//! transaction so its header and its item list come from the same snapshot.
//!
//! Transactions older than the retention window are purged by the
//! background sweep; reports over those days come back empty.

use chrono::{DateTime, NaiveDate, Utc};
use kopi_core::validation::parse_report_date;
use kopi_core::{
    DailyReportItem, DailySummary, Money, MonthlySummary, PaymentMethod, ReportingTimezone,
    Transaction, TransactionItem, TransactionWithItems, MONTHLY_REPORT_LIMIT,
};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::ledger::group_items;

/// One joined item row of the daily report, before local time formatting.
#[derive(Debug, FromRow)]
struct DailyItemRow {
    item_id: i64,
    transaction_id: i64,
    product_id: i64,
    product_name: Option<String>,
    quantity: i64,
    price_cents: i64,
    subtotal_cents: i64,
    payment_method: PaymentMethod,
    created_at: DateTime<Utc>,
}

/// Repository for sales reports.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
    timezone: ReportingTimezone,
}

impl ReportRepository {
    /// Creates a new ReportRepository bucketing in `timezone`.
    pub fn new(pool: SqlitePool, timezone: ReportingTimezone) -> Self {
        ReportRepository { pool, timezone }
    }

    pub fn timezone(&self) -> ReportingTimezone {
        self.timezone
    }

    /// Daily summary for an ISO `YYYY-MM-DD` date string.
    ///
    /// ## Errors
    /// * `DbError::Validation` - malformed date; storage is not touched
    pub async fn daily_summary(&self, user_id: i64, date: &str) -> DbResult<DailySummary> {
        let date = parse_report_date(date)?;
        self.daily_summary_for(user_id, date).await
    }

    /// Daily summary for today in the reporting timezone.
    pub async fn daily_summary_today(&self, user_id: i64) -> DbResult<DailySummary> {
        let today = self.timezone.today(Utc::now());
        self.daily_summary_for(user_id, today).await
    }

    /// Daily summary for a calendar date.
    ///
    /// A day with no sales returns zero count, zero total and no items.
    pub async fn daily_summary_for(&self, user_id: i64, date: NaiveDate) -> DbResult<DailySummary> {
        let (start, end) = self.timezone.day_bounds(date);

        debug!(user_id, %date, %start, %end, "Building daily summary");

        let mut tx = self.pool.begin().await?;

        let (transaction_count, total_cents): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(total_amount_cents), 0)
            FROM transactions
            WHERE user_id = ?1 AND created_at >= ?2 AND created_at < ?3
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_one(&mut *tx)
        .await?;

        if transaction_count == 0 {
            tx.commit().await?;
            return Ok(DailySummary::empty(date));
        }

        let rows = sqlx::query_as::<_, DailyItemRow>(
            r#"
            SELECT
                ti.id AS item_id,
                ti.transaction_id,
                ti.product_id,
                p.name AS product_name,
                ti.quantity,
                ti.price_cents,
                ti.subtotal_cents,
                t.payment_method,
                t.created_at
            FROM transaction_items ti
            JOIN transactions t ON t.id = ti.transaction_id
            LEFT JOIN products p ON p.id = ti.product_id
            WHERE t.user_id = ?1 AND t.created_at >= ?2 AND t.created_at < ?3
            ORDER BY t.created_at DESC, t.id DESC, ti.id ASC
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let items = rows
            .into_iter()
            .map(|row| DailyReportItem {
                item_id: row.item_id,
                transaction_id: row.transaction_id,
                product_id: row.product_id,
                product_name: row.product_name,
                quantity: row.quantity,
                unit_price: Money::from_cents(row.price_cents),
                subtotal: Money::from_cents(row.subtotal_cents),
                payment_method: row.payment_method,
                transaction_time: self.timezone.local_time_string(row.created_at),
                created_at: row.created_at,
            })
            .collect();

        Ok(DailySummary {
            date,
            transaction_count,
            total_sales: Money::from_cents(total_cents),
            items,
        })
    }

    /// Per-month totals, most recent month first, at most 12 rows.
    pub async fn monthly_summary(&self, user_id: i64) -> DbResult<Vec<MonthlySummary>> {
        let rows: Vec<(String, i64, i64)> = sqlx::query_as(
            r#"
            SELECT
                strftime('%Y-%m', created_at, ?2) AS month,
                COUNT(*) AS total_transactions,
                COALESCE(SUM(total_amount_cents), 0) AS total_revenue
            FROM transactions
            WHERE user_id = ?1
            GROUP BY month
            ORDER BY month DESC
            LIMIT ?3
            "#,
        )
        .bind(user_id)
        .bind(self.timezone.sqlite_modifier())
        .bind(MONTHLY_REPORT_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        debug!(user_id, months = rows.len(), "Built monthly summary");

        rows.into_iter()
            .map(|(month, total_transactions, total_revenue)| {
                Ok(MonthlySummary {
                    month: parse_month(&month)?,
                    total_transactions,
                    total_revenue: Money::from_cents(total_revenue),
                })
            })
            .collect()
    }

    /// Every transaction on an ISO date, newest first, with its items.
    ///
    /// ## Errors
    /// * `DbError::Validation` - malformed date; storage is not touched
    pub async fn transactions_on(
        &self,
        user_id: i64,
        date: &str,
    ) -> DbResult<Vec<TransactionWithItems>> {
        let date = parse_report_date(date)?;
        let (start, end) = self.timezone.day_bounds(date);

        let mut tx = self.pool.begin().await?;

        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT
                id, user_id, total_amount_cents, payment_method,
                notes, receipt, printed_at, created_at
            FROM transactions
            WHERE user_id = ?1 AND created_at >= ?2 AND created_at < ?3
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&mut *tx)
        .await?;

        let items = sqlx::query_as::<_, TransactionItem>(
            r#"
            SELECT
                ti.id, ti.transaction_id, ti.product_id, p.name AS product_name,
                ti.quantity, ti.price_cents, ti.subtotal_cents
            FROM transaction_items ti
            JOIN transactions t ON t.id = ti.transaction_id
            LEFT JOIN products p ON p.id = ti.product_id
            WHERE t.user_id = ?1 AND t.created_at >= ?2 AND t.created_at < ?3
            ORDER BY ti.id
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(user_id, %date, count = transactions.len(), "Listed sales for date");
        Ok(group_items(transactions, items))
    }
}

/// `YYYY-MM` from SQLite → first day of that month.
fn parse_month(month: &str) -> DbResult<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
        .map_err(|e| DbError::Internal(format!("unexpected month bucket '{month}': {e}")))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::{Datelike, Duration, TimeZone};
    use kopi_core::{CartLine, CheckoutRequest, ErrorKind, NewProduct, ProductCategory};

    async fn setup() -> (Database, i64, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut ids = Vec::new();
        for (name, price) in [("Kopi Susu", 25000.0), ("Americano", 30000.0)] {
            let product = db
                .products()
                .create(
                    1,
                    &NewProduct {
                        name: name.to_string(),
                        description: None,
                        category: ProductCategory::Coffee,
                        price,
                        stock: 100,
                    },
                )
                .await
                .unwrap();
            ids.push(product.id);
        }
        (db, ids[0], ids[1])
    }

    fn checkout(lines: &[(i64, i64, f64)], method: &str) -> CheckoutRequest {
        CheckoutRequest {
            items: lines
                .iter()
                .map(|&(product_id, quantity, price)| CartLine {
                    product_id,
                    quantity,
                    price,
                })
                .collect(),
            payment_method: method.to_string(),
            notes: None,
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_empty_day() {
        let (db, _, _) = setup().await;

        let summary = db.reports().daily_summary(1, "2099-01-01").await.unwrap();

        assert_eq!(summary.date, ymd(2099, 1, 1));
        assert_eq!(summary.transaction_count, 0);
        assert_eq!(summary.total_sales, Money::zero());
        assert!(summary.items.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_date_is_validation_error() {
        let (db, _, _) = setup().await;

        for bad in ["", "yesterday", "2024-13-01", "10/03/2024"] {
            let err = db.reports().daily_summary(1, bad).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);

            let err = db.reports().transactions_on(1, bad).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
    }

    #[tokio::test]
    async fn test_daily_summary_items_and_totals() {
        let (db, latte, americano) = setup().await;
        let tz = db.reporting_timezone();
        let ledger = db.ledger();

        // 09:00 and 10:30 local on 2024-03-10
        let (start, _) = tz.day_bounds(ymd(2024, 3, 10));
        let early = start + Duration::hours(9);
        let late = start + Duration::minutes(10 * 60 + 30);

        let first = ledger
            .commit_at(1, &checkout(&[(latte, 2, 25000.0), (americano, 1, 30000.0)], "cash"), early)
            .await
            .unwrap();
        let second = ledger
            .commit_at(1, &checkout(&[(americano, 1, 30000.0)], "qr"), late)
            .await
            .unwrap();

        let summary = db.reports().daily_summary(1, "2024-03-10").await.unwrap();

        assert_eq!(summary.transaction_count, 2);
        assert_eq!(summary.total_sales, Money::from_cents(11_000_000));

        let order: Vec<(i64, i64)> = summary
            .items
            .iter()
            .map(|i| (i.transaction_id, i.product_id))
            .collect();
        assert_eq!(
            order,
            vec![
                (second.transaction_id, americano),
                (first.transaction_id, latte),
                (first.transaction_id, americano),
            ]
        );

        assert_eq!(summary.items[0].transaction_time, "10:30:00");
        assert_eq!(summary.items[0].payment_method, PaymentMethod::Card);
        assert_eq!(summary.items[1].product_name.as_deref(), Some("Kopi Susu"));
        assert_eq!(summary.items[1].subtotal, Money::from_cents(5_000_000));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["totalSales"], 110000);
        assert_eq!(json["items"][1]["unitPrice"], 25000);
        assert_eq!(json["items"][1]["subtotal"], 50000);
    }

    #[tokio::test]
    async fn test_day_boundary_follows_reporting_timezone() {
        let (db, latte, _) = setup().await;

        // 2024-03-09 18:00 UTC is 2024-03-10 01:00 at UTC+07:00
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 18, 0, 0).unwrap();
        db.ledger()
            .commit_at(1, &checkout(&[(latte, 1, 25000.0)], "cash"), at)
            .await
            .unwrap();

        let reports = db.reports();
        assert_eq!(reports.daily_summary(1, "2024-03-10").await.unwrap().transaction_count, 1);
        assert_eq!(reports.daily_summary(1, "2024-03-09").await.unwrap().transaction_count, 0);

        let utc_reports = ReportRepository::new(db.pool().clone(), ReportingTimezone::utc());
        assert_eq!(utc_reports.daily_summary(1, "2024-03-09").await.unwrap().transaction_count, 1);
    }

    #[tokio::test]
    async fn test_reports_are_scoped_to_user() {
        let (db, latte, _) = setup().await;
        let receipt = db
            .ledger()
            .commit(1, &checkout(&[(latte, 1, 25000.0)], "cash"))
            .await
            .unwrap();
        assert!(receipt.total_amount.is_positive());

        let other = db.reports().daily_summary_today(2).await.unwrap();
        assert_eq!(other.transaction_count, 0);
        assert!(db.reports().monthly_summary(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reads_are_idempotent() {
        let (db, latte, _) = setup().await;
        db.ledger()
            .commit(1, &checkout(&[(latte, 3, 25000.0)], "transfer"))
            .await
            .unwrap();

        let reports = db.reports();
        let a = reports.daily_summary_today(1).await.unwrap();
        let b = reports.daily_summary_today(1).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.total_sales, Money::from_cents(7_500_000));

        assert_eq!(
            reports.monthly_summary(1).await.unwrap(),
            reports.monthly_summary(1).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_monthly_summary_newest_first_and_capped() {
        let (db, latte, _) = setup().await;
        let tz = db.reporting_timezone();
        let ledger = db.ledger();

        // one sale on the 15th of each of 14 months: 2023-01 .. 2024-02
        for i in 0..14u32 {
            let (year, month) = (2023 + (i / 12) as i32, i % 12 + 1);
            let (start, _) = tz.day_bounds(ymd(year, month, 15));
            ledger
                .commit_at(1, &checkout(&[(latte, 1, 25000.0)], "cash"), start + Duration::hours(12))
                .await
                .unwrap();
        }
        // a second sale in the latest month
        let (start, _) = tz.day_bounds(ymd(2024, 2, 20));
        ledger
            .commit_at(1, &checkout(&[(latte, 2, 25000.0)], "cash"), start + Duration::hours(12))
            .await
            .unwrap();

        let months = db.reports().monthly_summary(1).await.unwrap();

        assert_eq!(months.len(), 12);
        assert_eq!(months[0].month, ymd(2024, 2, 1));
        assert_eq!(months[0].total_transactions, 2);
        assert_eq!(months[0].total_revenue, Money::from_cents(7_500_000));
        assert_eq!(months[11].month, ymd(2023, 3, 1));
        assert!(months.windows(2).all(|w| w[0].month > w[1].month));
        assert!(months.iter().all(|m| m.month.day() == 1));
    }

    #[tokio::test]
    async fn test_month_boundary_follows_reporting_timezone() {
        let (db, latte, _) = setup().await;

        // 2024-01-31 20:00 UTC is 2024-02-01 03:00 at UTC+07:00
        let at = Utc.with_ymd_and_hms(2024, 1, 31, 20, 0, 0).unwrap();
        db.ledger()
            .commit_at(1, &checkout(&[(latte, 1, 25000.0)], "cash"), at)
            .await
            .unwrap();

        let months = db.reports().monthly_summary(1).await.unwrap();
        assert_eq!(months.len(), 1);
        assert_eq!(months[0].month, ymd(2024, 2, 1));
    }

    #[tokio::test]
    async fn test_transactions_on_date() {
        let (db, latte, americano) = setup().await;
        let tz = db.reporting_timezone();
        let (start, _) = tz.day_bounds(ymd(2024, 5, 1));
        let ledger = db.ledger();

        let a = ledger
            .commit_at(1, &checkout(&[(latte, 1, 25000.0)], "cash"), start + Duration::hours(8))
            .await
            .unwrap();
        let b = ledger
            .commit_at(
                1,
                &checkout(&[(latte, 1, 25000.0), (americano, 2, 30000.0)], "card"),
                start + Duration::hours(15),
            )
            .await
            .unwrap();
        // next day, excluded
        ledger
            .commit_at(1, &checkout(&[(latte, 1, 25000.0)], "cash"), start + Duration::hours(25))
            .await
            .unwrap();

        let sales = db.reports().transactions_on(1, "2024-05-01").await.unwrap();

        assert_eq!(sales.len(), 2);
        assert_eq!(sales[0].transaction.id, b.transaction_id);
        assert_eq!(sales[0].items.len(), 2);
        assert_eq!(sales[1].transaction.id, a.transaction_id);
        assert_eq!(sales[1].items.len(), 1);
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2024-02").unwrap(), ymd(2024, 2, 1));
        assert!(parse_month("garbage").is_err());
    }
}
