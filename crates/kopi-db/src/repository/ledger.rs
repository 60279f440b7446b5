//! # Ledger Repository
//!
//! The ledger writer: turns a validated cart into one transaction row, its
//! line items and the matching stock decrements, all or nothing.
//!
//! ## Commit Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       commit(user_id, request)                          │
//! │                                                                         │
//! │  0. validate_checkout()          ← no storage access on bad input      │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │  1. INSERT transactions (total = 0)            → transaction_id        │
//! │  2. for each line, in cart order:                                      │
//! │     a. UPDATE products SET stock = stock - qty                         │
//! │        WHERE id = ? AND user_id = ? AND is_active = 1                  │
//! │        └── 0 rows? → NotFound, ROLLBACK                                │
//! │     b. INSERT transaction_items (price snapshot, subtotal)             │
//! │  3. UPDATE transactions SET total = Σ subtotals                        │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any failure after BEGIN rolls back: no transaction, no items, no      │
//! │  stock change is ever visible.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stock Can Go Negative
//! The decrement is relative and unguarded. Selling 5 of a product with
//! stock 0 leaves stock at -5. Two concurrent commits on the same product
//! serialize on SQLite's write lock, so neither decrement is lost.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use kopi_core::validation::validate_checkout;
use kopi_core::{
    CheckoutRequest, CommitReceipt, CoreError, Money, Transaction, TransactionItem,
    TransactionWithItems, ValidatedCheckout, ValidationError, RECENT_TRANSACTIONS_LIMIT,
};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};

/// Repository for committing and reading transactions.
///
/// ## Usage
/// ```rust,ignore
/// let receipt = db.ledger().commit(user_id, &request).await?;
/// db.ledger().attach_receipt(receipt.transaction_id, user_id, &text).await?;
/// ```
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Commits a checkout, stamped with the current time.
    ///
    /// ## Errors
    /// * `DbError::Validation` - bad cart, nothing written
    /// * `DbError::NotFound` - a line names a product that is missing,
    ///   inactive or owned by someone else; everything rolled back
    /// * storage errors - everything rolled back; retry the whole call
    pub async fn commit(&self, user_id: i64, request: &CheckoutRequest) -> DbResult<CommitReceipt> {
        self.commit_at(user_id, request, Utc::now()).await
    }

    /// Commits a checkout with an explicit `created_at`.
    ///
    /// Used when importing sales rung up elsewhere (and by the seed tool
    /// to spread demo sales over past days).
    pub async fn commit_at(
        &self,
        user_id: i64,
        request: &CheckoutRequest,
        created_at: DateTime<Utc>,
    ) -> DbResult<CommitReceipt> {
        let checkout = validate_checkout(request)?;

        debug!(
            user_id,
            lines = checkout.lines.len(),
            payment_method = %checkout.payment_method,
            "Committing checkout"
        );

        let mut tx = self.pool.begin().await?;

        match write_checkout(&mut tx, user_id, &checkout, created_at).await {
            Ok(receipt) => {
                tx.commit()
                    .await
                    .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

                info!(
                    user_id,
                    transaction_id = receipt.transaction_id,
                    total = %receipt.total_amount,
                    "Checkout committed"
                );
                Ok(receipt)
            }
            Err(err) => {
                warn!(user_id, error = %err, "Checkout failed, rolling back");
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Stores receipt text on an existing transaction and stamps
    /// `printed_at`. Safe to call again (reprint overwrites).
    ///
    /// ## Errors
    /// * `DbError::Validation` - blank receipt
    /// * `DbError::NotFound` - missing or owned by someone else
    pub async fn attach_receipt(
        &self,
        transaction_id: i64,
        user_id: i64,
        receipt: &str,
    ) -> DbResult<Transaction> {
        if receipt.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "receipt".to_string(),
            }
            .into());
        }

        debug!(user_id, transaction_id, "Attaching receipt");

        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            UPDATE transactions
            SET receipt = ?1, printed_at = ?2
            WHERE id = ?3 AND user_id = ?4
            RETURNING
                id, user_id, total_amount_cents, payment_method,
                notes, receipt, printed_at, created_at
            "#,
        )
        .bind(receipt)
        .bind(Utc::now())
        .bind(transaction_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(CoreError::TransactionNotFound(transaction_id))?;

        info!(user_id, transaction_id, "Receipt attached");
        Ok(transaction)
    }

    /// Deletes every transaction (any owner) created before `cutoff`.
    /// Line items go with them via `ON DELETE CASCADE`.
    ///
    /// ## Returns
    /// Number of transactions deleted.
    pub async fn purge_before(&self, cutoff: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM transactions WHERE created_at < ?1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected();
        info!(%cutoff, deleted, "Purged expired transactions");
        Ok(deleted)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets one transaction with its line items.
    pub async fn get_transaction(
        &self,
        transaction_id: i64,
        user_id: i64,
    ) -> DbResult<TransactionWithItems> {
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT
                id, user_id, total_amount_cents, payment_method,
                notes, receipt, printed_at, created_at
            FROM transactions
            WHERE id = ?1 AND user_id = ?2
            "#,
        )
        .bind(transaction_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(CoreError::TransactionNotFound(transaction_id))?;

        let items = sqlx::query_as::<_, TransactionItem>(
            r#"
            SELECT
                ti.id, ti.transaction_id, ti.product_id, p.name AS product_name,
                ti.quantity, ti.price_cents, ti.subtotal_cents
            FROM transaction_items ti
            LEFT JOIN products p ON p.id = ti.product_id
            WHERE ti.transaction_id = ?1
            ORDER BY ti.id
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(TransactionWithItems { transaction, items })
    }

    /// Lists the user's most recent transactions, newest first.
    ///
    /// `limit` is clamped to `1..=RECENT_TRANSACTIONS_LIMIT`.
    pub async fn list_recent(&self, user_id: i64, limit: i64) -> DbResult<Vec<TransactionWithItems>> {
        let limit = limit.clamp(1, RECENT_TRANSACTIONS_LIMIT);

        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT
                id, user_id, total_amount_cents, payment_method,
                notes, receipt, printed_at, created_at
            FROM transactions
            WHERE user_id = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT ?2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, TransactionItem>(
            r#"
            SELECT
                ti.id, ti.transaction_id, ti.product_id, p.name AS product_name,
                ti.quantity, ti.price_cents, ti.subtotal_cents
            FROM transaction_items ti
            LEFT JOIN products p ON p.id = ti.product_id
            WHERE ti.transaction_id IN (
                SELECT id FROM transactions
                WHERE user_id = ?1
                ORDER BY created_at DESC, id DESC
                LIMIT ?2
            )
            ORDER BY ti.id
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(user_id, count = transactions.len(), "Listed recent transactions");
        Ok(group_items(transactions, items))
    }
}

// =============================================================================
// Unit of Work
// =============================================================================

/// Steps 1-3 of the commit, run on the open storage transaction.
async fn write_checkout(
    conn: &mut SqliteConnection,
    user_id: i64,
    checkout: &ValidatedCheckout,
    created_at: DateTime<Utc>,
) -> DbResult<CommitReceipt> {
    let transaction_id = sqlx::query(
        r#"
        INSERT INTO transactions (user_id, total_amount_cents, payment_method, notes, created_at)
        VALUES (?1, 0, ?2, ?3, ?4)
        "#,
    )
    .bind(user_id)
    .bind(checkout.payment_method)
    .bind(&checkout.notes)
    .bind(created_at)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    debug!(transaction_id, "Inserted transaction header");

    let mut total = Money::zero();

    for line in &checkout.lines {
        let updated = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - ?1, updated_at = ?2
            WHERE id = ?3 AND user_id = ?4 AND is_active = 1
            "#,
        )
        .bind(line.quantity)
        .bind(created_at)
        .bind(line.product_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(line.product_id).into());
        }

        sqlx::query(
            r#"
            INSERT INTO transaction_items
                (transaction_id, product_id, quantity, price_cents, subtotal_cents)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(transaction_id)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(line.unit_price.cents())
        .bind(line.subtotal.cents())
        .execute(&mut *conn)
        .await?;

        total += line.subtotal;

        debug!(
            transaction_id,
            product_id = line.product_id,
            quantity = line.quantity,
            subtotal = %line.subtotal,
            "Inserted line item"
        );
    }

    sqlx::query("UPDATE transactions SET total_amount_cents = ?1 WHERE id = ?2")
        .bind(total.cents())
        .bind(transaction_id)
        .execute(&mut *conn)
        .await?;

    Ok(CommitReceipt {
        transaction_id,
        total_amount: total,
    })
}

/// Attaches items to their parents, keeping the parents' order.
pub(crate) fn group_items(
    transactions: Vec<Transaction>,
    items: Vec<TransactionItem>,
) -> Vec<TransactionWithItems> {
    let mut by_parent: HashMap<i64, Vec<TransactionItem>> = HashMap::new();
    for item in items {
        by_parent.entry(item.transaction_id).or_default().push(item);
    }

    transactions
        .into_iter()
        .map(|transaction| {
            let items = by_parent.remove(&transaction.id).unwrap_or_default();
            TransactionWithItems { transaction, items }
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use kopi_core::{CartLine, ErrorKind, NewProduct, PaymentMethod, ProductCategory, ProductPatch};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn add_product(db: &Database, user_id: i64, name: &str, price: f64, stock: i64) -> i64 {
        db.products()
            .create(
                user_id,
                &NewProduct {
                    name: name.to_string(),
                    description: None,
                    category: ProductCategory::Coffee,
                    price,
                    stock,
                },
            )
            .await
            .unwrap()
            .id
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

    async fn count(db: &Database, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_commit_totals_and_subtotals() {
        let db = setup().await;
        let a = add_product(&db, 1, "Kopi Susu", 25000.0, 10).await;
        let b = add_product(&db, 1, "Americano", 30000.0, 10).await;

        let receipt = db
            .ledger()
            .commit(1, &checkout(&[(a, 2, 25000.0), (b, 1, 30000.0)], "cash"))
            .await
            .unwrap();

        assert_eq!(receipt.total_amount, Money::from_cents(8_000_000));

        let stored = db.ledger().get_transaction(receipt.transaction_id, 1).await.unwrap();
        assert_eq!(stored.transaction.total_amount(), receipt.total_amount);
        assert_eq!(stored.transaction.payment_method, PaymentMethod::Cash);

        let subtotals: Vec<i64> = stored.items.iter().map(|i| i.subtotal_cents).collect();
        assert_eq!(subtotals, vec![5_000_000, 3_000_000]);
        assert_eq!(
            stored.items.iter().map(|i| i.subtotal()).sum::<Money>(),
            stored.transaction.total_amount()
        );
        assert_eq!(stored.items[0].product_name.as_deref(), Some("Kopi Susu"));

        assert_eq!(db.products().get(a, 1).await.unwrap().stock, 8);
        assert_eq!(db.products().get(b, 1).await.unwrap().stock, 9);
    }

    #[tokio::test]
    async fn test_json_amounts_match_cart_units() {
        let db = setup().await;
        let a = add_product(&db, 1, "Kopi Susu", 25000.0, 10).await;
        let b = add_product(&db, 1, "Americano", 30000.0, 10).await;

        let receipt = db
            .ledger()
            .commit(1, &checkout(&[(a, 2, 25000.0), (b, 1, 30000.0)], "cash"))
            .await
            .unwrap();

        let json = serde_json::to_value(receipt).unwrap();
        assert_eq!(json["totalAmount"], 80000);

        let stored = db.ledger().get_transaction(receipt.transaction_id, 1).await.unwrap();
        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["transaction"]["totalAmount"], 80000);
        assert_eq!(json["items"][0]["price"], 25000);
        assert_eq!(json["items"][0]["subtotal"], 50000);
        assert_eq!(json["items"][1]["subtotal"], 30000);
        assert!(json["transaction"].get("totalAmountCents").is_none());
    }

    #[tokio::test]
    async fn test_unknown_product_rolls_back_everything() {
        let db = setup().await;
        let a = add_product(&db, 1, "Kopi Susu", 25000.0, 10).await;

        let err = db
            .ledger()
            .commit(1, &checkout(&[(a, 2, 25000.0), (9999, 1, 10000.0)], "cash"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(matches!(err, DbError::NotFound { ref entity, ref id } if entity == "Product" && id == "9999"));
        assert_eq!(count(&db, "transactions").await, 0);
        assert_eq!(count(&db, "transaction_items").await, 0);
        assert_eq!(db.products().get(a, 1).await.unwrap().stock, 10);
    }

    #[tokio::test]
    async fn test_other_users_product_is_not_found() {
        let db = setup().await;
        let theirs = add_product(&db, 2, "Their Latte", 25000.0, 10).await;

        let err = db
            .ledger()
            .commit(1, &checkout(&[(theirs, 1, 25000.0)], "cash"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(count(&db, "transactions").await, 0);
        assert_eq!(db.products().get(theirs, 2).await.unwrap().stock, 10);
    }

    #[tokio::test]
    async fn test_inactive_product_is_not_found() {
        let db = setup().await;
        let a = add_product(&db, 1, "Seasonal", 25000.0, 10).await;
        db.products().soft_delete(a, 1).await.unwrap();

        let err = db
            .ledger()
            .commit(1, &checkout(&[(a, 1, 25000.0)], "card"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_validation_happens_before_storage() {
        let db = setup().await;
        let a = add_product(&db, 1, "Kopi Susu", 25000.0, 10).await;

        for bad in [
            checkout(&[], "cash"),
            checkout(&[(a, 0, 25000.0)], "cash"),
            checkout(&[(a, 1, -1.0)], "cash"),
            checkout(&[(a, 1, 25000.0)], "crypto"),
        ] {
            let err = db.ledger().commit(1, &bad).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }

        let mut long_notes = checkout(&[(a, 1, 25000.0)], "cash");
        long_notes.notes = Some("x".repeat(501));
        assert_eq!(
            db.ledger().commit(1, &long_notes).await.unwrap_err().kind(),
            ErrorKind::Validation
        );

        assert_eq!(count(&db, "transactions").await, 0);
        assert_eq!(db.products().get(a, 1).await.unwrap().stock, 10);
    }

    #[tokio::test]
    async fn test_stock_goes_negative() {
        let db = setup().await;
        let a = add_product(&db, 1, "Es Teh", 8000.0, 0).await;

        db.ledger()
            .commit(1, &checkout(&[(a, 5, 8000.0)], "cash"))
            .await
            .unwrap();

        assert_eq!(db.products().get(a, 1).await.unwrap().stock, -5);
    }

    #[tokio::test]
    async fn test_price_snapshot_survives_product_edit() {
        let db = setup().await;
        let a = add_product(&db, 1, "Croissant", 10000.0, 10).await;

        let receipt = db
            .ledger()
            .commit(1, &checkout(&[(a, 1, 10000.0)], "cash"))
            .await
            .unwrap();

        db.products()
            .update(
                a,
                1,
                &ProductPatch {
                    price: Some(20000.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let stored = db.ledger().get_transaction(receipt.transaction_id, 1).await.unwrap();
        assert_eq!(stored.items[0].price_cents, 1_000_000);
        assert_eq!(stored.items[0].subtotal_cents, 1_000_000);
        assert_eq!(stored.transaction.total_amount_cents, 1_000_000);
    }

    #[tokio::test]
    async fn test_qr_payment_is_stored_as_card() {
        let db = setup().await;
        let a = add_product(&db, 1, "Kopi Tubruk", 15000.0, 10).await;

        let receipt = db
            .ledger()
            .commit(1, &checkout(&[(a, 1, 15000.0)], "qr"))
            .await
            .unwrap();

        let stored = db.ledger().get_transaction(receipt.transaction_id, 1).await.unwrap();
        assert_eq!(stored.transaction.payment_method, PaymentMethod::Card);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_commits_keep_every_decrement() {
        // In-memory databases pool a single connection; a file lets the
        // commits really overlap.
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("ledger.db")).max_connections(8))
            .await
            .unwrap();
        let a = add_product(&db, 1, "Kopi Susu", 25000.0, 0).await;

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let ledger = db.ledger();
                let req = checkout(&[(a, 1, 25000.0)], "cash");
                tokio::spawn(async move { ledger.commit(1, &req).await })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(db.products().get(a, 1).await.unwrap().stock, -20);
        assert_eq!(count(&db, "transactions").await, 20);
        assert_eq!(count(&db, "transaction_items").await, 20);

        db.close().await;
    }

    #[tokio::test]
    async fn test_attach_receipt() {
        let db = setup().await;
        let a = add_product(&db, 1, "Kopi Susu", 25000.0, 10).await;
        let receipt = db
            .ledger()
            .commit(1, &checkout(&[(a, 1, 25000.0)], "transfer"))
            .await
            .unwrap();

        let printed = db
            .ledger()
            .attach_receipt(receipt.transaction_id, 1, "KOPI POS\nKopi Susu x1 25000.00")
            .await
            .unwrap();
        assert!(printed.is_printed());
        assert_eq!(printed.total_amount_cents, 2_500_000);

        // other user cannot see it
        let err = db
            .ledger()
            .attach_receipt(receipt.transaction_id, 2, "x")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = db
            .ledger()
            .attach_receipt(receipt.transaction_id, 1, "  ")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_list_recent_newest_first() {
        let db = setup().await;
        let a = add_product(&db, 1, "Kopi Susu", 25000.0, 10).await;
        let ledger = db.ledger();

        let first = ledger.commit(1, &checkout(&[(a, 1, 25000.0)], "cash")).await.unwrap();
        let second = ledger.commit(1, &checkout(&[(a, 2, 25000.0)], "cash")).await.unwrap();

        let recent = ledger.list_recent(1, RECENT_TRANSACTIONS_LIMIT).await.unwrap();
        let ids: Vec<i64> = recent.iter().map(|t| t.transaction.id).collect();
        assert_eq!(ids, vec![second.transaction_id, first.transaction_id]);
        assert_eq!(recent[0].items[0].quantity, 2);

        let one = ledger.list_recent(1, 1).await.unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].items.len(), 1);

        assert!(ledger.list_recent(2, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_purge_cascades_to_items() {
        let db = setup().await;
        let a = add_product(&db, 1, "Kopi Susu", 25000.0, 10).await;
        let ledger = db.ledger();

        let old = Utc::now() - chrono::Duration::days(90);
        ledger
            .commit_at(1, &checkout(&[(a, 1, 25000.0)], "cash"), old)
            .await
            .unwrap();
        let fresh = ledger.commit(1, &checkout(&[(a, 1, 25000.0)], "cash")).await.unwrap();

        let deleted = ledger
            .purge_before(Utc::now() - chrono::Duration::days(60))
            .await
            .unwrap();

        assert_eq!(deleted, 1);
        assert_eq!(count(&db, "transactions").await, 1);
        assert_eq!(count(&db, "transaction_items").await, 1);
        assert!(ledger.get_transaction(fresh.transaction_id, 1).await.is_ok());
    }
}
