//! # Repository Module
//!
//! Database repository implementations for Kopi POS.
//!
//! ## Who Owns What
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ProductRepository      products             (catalog CRUD)            │
//! │  LedgerRepository       transactions, items  (the only writer)         │
//! │  ReportRepository       transactions, items  (read-only aggregates)    │
//! │                                                                         │
//! │  Every method takes the owner's user_id and filters on it.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`] - Product catalog
//! - [`LedgerRepository`] - Checkout commits, receipts, retention
//! - [`ReportRepository`] - Daily and monthly summaries

pub mod ledger;
pub mod product;
pub mod report;

pub use ledger::LedgerRepository;
pub use product::ProductRepository;
pub use report::ReportRepository;
