//! # kopi-db: Storage Layer for Kopi POS
//!
//! The cashier ledger on SQLite: product catalog, atomic checkout commits,
//! sales reports and the retention sweep.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kopi POS Data Flow                               │
//! │                                                                         │
//! │  HTTP handler / cashier UI (caller supplies the authenticated user_id) │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     kopi-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo   │    │ 001_init.sql │  │   │
//! │  │   │ SqlitePool    │◄───│ LedgerRepo    │    │              │  │   │
//! │  │   │ Report tz     │    │ ReportRepo    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           ▲                                                     │   │
//! │  │   ┌───────┴───────┐    ┌───────────────┐                       │   │
//! │  │   │ LedgerConfig  │    │RetentionWorker│ (background sweep)    │   │
//! │  │   │  (config.rs)  │    │(retention.rs) │                       │   │
//! │  │   └───────────────┘    └───────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL)                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Product, ledger and report repositories
//! - [`config`] - TOML + environment configuration
//! - [`retention`] - Background purge of old transactions
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kopi_db::{Database, LedgerConfig};
//!
//! let config = LedgerConfig::load(None)?;
//! let db = Database::new(config.db_config()?).await?;
//!
//! let receipt = db.ledger().commit(user_id, &request).await?;
//! let today = db.reports().daily_summary_today(user_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod retention;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, LedgerConfig};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use retention::{RetentionHandle, RetentionWorker};

// Repository re-exports for convenience
pub use repository::{LedgerRepository, ProductRepository, ReportRepository};

use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=kopi=trace` - Show trace for kopi crates only
/// - Default: `info,kopi=debug,sqlx=warn`
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kopi=debug,sqlx=warn"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
