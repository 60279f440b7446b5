//! # kopi-core: Pure Business Logic for Kopi POS
//!
//! Money, cart validation, catalog input rules and the reporting calendar,
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kopi POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Cashier UI / HTTP layer (outside this workspace)     │   │
//! │  │    Menu ──► Cart ──► Checkout ──► Receipt ──► Reports           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ user_id + request DTOs                 │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kopi-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ calendar  │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │ day/month │  │ checkout  │  │   │
//! │  │   │  Txn/Item │  │ minor unit│  │ retention │  │  catalog  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kopi-db (Storage Layer)                      │   │
//! │  │        SQLite ledger, catalog, reports, retention sweep         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records and request/response DTOs
//! - [`money`] - Money type with integer arithmetic
//! - [`calendar`] - Reporting timezone and retention window
//! - [`error`] - Domain error types and [`ErrorKind`]
//! - [`validation`] - Input rules, applied before any storage access
//!
//! ## Example Usage
//!
//! ```rust
//! use kopi_core::validation::validate_checkout;
//! use kopi_core::{CartLine, CheckoutRequest, Money};
//!
//! let request = CheckoutRequest {
//!     items: vec![
//!         CartLine { product_id: 1, quantity: 2, price: 25000.0 },
//!         CartLine { product_id: 2, quantity: 1, price: 30000.0 },
//!     ],
//!     payment_method: "cash".to_string(),
//!     notes: None,
//! };
//!
//! let checkout = validate_checkout(&request).unwrap();
//! assert_eq!(checkout.total, Money::from_cents(8_000_000));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod calendar;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use calendar::{ReportingTimezone, RetentionPolicy};
pub use error::{CoreError, ErrorKind, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default reporting offset: UTC+07:00 (WIB), where the shop trades.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 7 * 60;

/// Monthly report keeps the most recent this-many months.
pub const MONTHLY_REPORT_LIMIT: i64 = 12;

/// Default page size for the recent-transactions listing.
pub const RECENT_TRANSACTIONS_LIMIT: i64 = 100;

/// Transactions older than this many months are purged.
pub const DEFAULT_RETENTION_MONTHS: u32 = 2;

/// Product name limit, in characters.
pub const MAX_NAME_LEN: usize = 255;

/// Product description limit, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Checkout notes limit, in characters.
pub const MAX_NOTES_LEN: usize = 500;
