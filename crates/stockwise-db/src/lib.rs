//! # stockwise-db: Database Layer for Stockwise
//!
//! This crate provides database access for the Stockwise inventory backend.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockwise Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (POST /api/replacements/order)                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockwise-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo    │   │              │  │   │
//! │  │   │ SqlitePool    │◄───│ SalesOrderRepo │   │ 001_initial_ │  │   │
//! │  │   │ Busy timeout  │    │ ReplacementRepo│   │ schema.sql   │  │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (WAL mode)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockwise_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/stockwise.db")).await?;
//!
//! let outcome = db.replacements().replace_product(&request).await?;
//! println!("{} left in stock", outcome.remaining_stock);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::catalog::CatalogRepository;
pub use repository::product::ProductRepository;
pub use repository::replacement::ReplacementRepository;
pub use repository::returns::ReturnRepository;
pub use repository::sales_order::SalesOrderRepository;
pub use repository::user::UserRepository;
