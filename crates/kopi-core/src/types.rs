//! # Domain Types
//!
//! Core domain types used throughout Kopi POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Persisted records (one per table)                                     │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   Transaction   │   │ TransactionItem │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id, user_id    │   │  id, user_id    │   │  transaction_id │       │
//! │  │  name, category │   │  total_amount   │   │  product_id     │       │
//! │  │  price_cents    │   │  payment_method │   │  quantity       │       │
//! │  │  stock (may <0) │   │  receipt        │   │  price (frozen) │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Requests (client input)        Responses (computed)                   │
//! │  ├── CheckoutRequest/CartLine   ├── CommitReceipt                      │
//! │  ├── NewProduct                 ├── TransactionWithItems               │
//! │  └── ProductPatch               ├── DailySummary/DailyReportItem       │
//! │                                 └── MonthlySummary                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Money in Records vs Responses
//! Persisted records keep the raw `*_cents` column and expose a `Money`
//! accessor. Computed responses carry `Money` directly. On the wire both
//! are major units under plain names (`price`, `totalAmount`), the same
//! unit `CartLine.price` arrives in.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Product Category
// =============================================================================

/// Menu grouping for the cashier screen. Display only, no pricing rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    #[default]
    Coffee,
    NonCoffee,
    Food,
}

impl ProductCategory {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Coffee => "coffee",
            ProductCategory::NonCoffee => "non_coffee",
            ProductCategory::Food => "food",
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer paid.
///
/// The cashier UI labels card payments "qr"; both spellings parse to
/// [`PaymentMethod::Card`] through [`FromStr`], and `card` is what gets
/// stored and serialized.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card or QR payment on an external terminal.
    Card,
    /// Bank transfer.
    Transfer,
}

impl PaymentMethod {
    /// Accepted spellings, in the order reported by validation errors.
    pub const ACCEPTED: [&'static str; 4] = ["cash", "card", "qr", "transfer"];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a payment method string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPaymentMethod(pub String);

impl fmt::Display for UnknownPaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown payment method: {}", self.0)
    }
}

impl std::error::Error for UnknownPaymentMethod {}

impl FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" | "qr" => Ok(PaymentMethod::Card),
            "transfer" => Ok(PaymentMethod::Transfer),
            _ => Err(UnknownPaymentMethod(s.to_string())),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A menu item owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,

    /// Owner. Every catalog query filters on this.
    pub user_id: i64,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    pub description: Option<String>,

    pub category: ProductCategory,

    /// Current list price in minor units, always > 0. `price` on the wire,
    /// in major units.
    #[serde(rename = "price", with = "crate::money::major_units")]
    #[ts(type = "number")]
    pub price_cents: i64,

    /// Stock counter. Checkout decrements without a floor, so this may be
    /// negative.
    pub stock: i64,

    /// False once soft-deleted.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// One committed checkout.
///
/// Immutable after commit except `receipt` / `printed_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    /// Sum of item subtotals, computed by the ledger.
    #[serde(rename = "totalAmount", with = "crate::money::major_units")]
    #[ts(type = "number")]
    pub total_amount_cents: i64,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub receipt: Option<String>,
    #[ts(as = "Option<String>")]
    pub printed_at: Option<DateTime<Utc>>,
    /// Authoritative for reporting.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Returns the total as Money.
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    /// Whether a receipt has been attached.
    #[inline]
    pub fn is_printed(&self) -> bool {
        self.printed_at.is_some()
    }
}

// =============================================================================
// Transaction Item
// =============================================================================

/// A line item in a transaction.
/// Uses snapshot pattern to freeze the unit price at time of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransactionItem {
    pub id: i64,
    pub transaction_id: i64,
    pub product_id: i64,
    /// Product name, joined at read time (None if the row is gone).
    pub product_name: Option<String>,
    pub quantity: i64,
    /// Unit price in minor units at time of sale (frozen).
    #[serde(rename = "price", with = "crate::money::major_units")]
    #[ts(type = "number")]
    pub price_cents: i64,
    /// quantity × price_cents.
    #[serde(rename = "subtotal", with = "crate::money::major_units")]
    #[ts(type = "number")]
    pub subtotal_cents: i64,
}

impl TransactionItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the line subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// A transaction together with its line items, in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransactionWithItems {
    pub transaction: Transaction,
    pub items: Vec<TransactionItem>,
}

// =============================================================================
// Checkout Request / Response
// =============================================================================

/// One cart line as sent by the cashier UI.
///
/// `price` is the client-displayed unit price in major units. It is
/// validated and rounded to minor units exactly once, then frozen into the
/// line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: i64,
    pub quantity: i64,
    pub price: f64,
}

/// The full checkout payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub items: Vec<CartLine>,
    /// Free text on the wire; parsed during validation so that an unknown
    /// value is a field-level validation error, not a decode failure.
    pub payment_method: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A cart line that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedLine {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// A checkout that passed validation. Nothing here has touched storage yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCheckout {
    pub lines: Vec<ValidatedLine>,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    /// Σ subtotals.
    pub total: Money,
}

/// What the ledger hands back after a successful commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CommitReceipt {
    pub transaction_id: i64,
    pub total_amount: Money,
}

// =============================================================================
// Catalog Input
// =============================================================================

/// Fields for a new product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: ProductCategory,
    /// Major units.
    pub price: f64,
    #[serde(default)]
    pub stock: i64,
}

/// Partial product update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(default)]
    pub name: Option<String>,
    /// A blank string clears the description.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<ProductCategory>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub stock: Option<i64>,
}

impl ProductPatch {
    /// True when no field is present.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.price.is_none()
            && self.stock.is_none()
    }
}

/// A validated [`NewProduct`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub description: Option<String>,
    pub category: ProductCategory,
    pub price: Money,
    pub stock: i64,
}

/// A validated, non-empty [`ProductPatch`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductChanges {
    pub name: Option<String>,
    /// `None` keeps the stored description, `Some(None)` clears it.
    pub description: Option<Option<String>>,
    pub category: Option<ProductCategory>,
    pub price: Option<Money>,
    pub stock: Option<i64>,
}

// =============================================================================
// Reports
// =============================================================================

/// One line item in the daily report, joined to its product and parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DailyReportItem {
    pub item_id: i64,
    pub transaction_id: i64,
    pub product_id: i64,
    pub product_name: Option<String>,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
    pub payment_method: PaymentMethod,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// `HH:MM:SS` in the reporting timezone.
    pub transaction_time: String,
}

/// Everything sold on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub transaction_count: i64,
    pub total_sales: Money,
    /// Newest transaction first, then item insertion order.
    pub items: Vec<DailyReportItem>,
}

impl DailySummary {
    /// The summary of a day with no sales.
    pub fn empty(date: NaiveDate) -> Self {
        DailySummary {
            date,
            transaction_count: 0,
            total_sales: Money::zero(),
            items: Vec::new(),
        }
    }
}

/// One calendar month of sales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    /// First day of the month.
    #[ts(as = "String")]
    pub month: NaiveDate,
    pub total_transactions: i64,
    pub total_revenue: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
