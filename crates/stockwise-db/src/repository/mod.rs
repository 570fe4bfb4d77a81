//! # Repository Module
//!
//! Database repository implementations for Stockwise.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler                                                          │
//! │       │  state.db.replacements().replace_product(&request)             │
//! │       ▼                                                                 │
//! │  ReplacementRepository                                                 │
//! │  ├── replace_product / replace_with_order   (transactions)             │
//! │  ├── list                                   (flattened view)           │
//! │  └── report                                 (monthly + detail rows)    │
//! │       │  uses the transaction primitives of                            │
//! │       ▼                                                                 │
//! │  ProductRepository / SalesOrderRepository                              │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`] - Product catalog, stock and restocking
//! - [`SalesOrderRepository`] - Sales orders, items and adjustments
//! - [`ReplacementRepository`] - Replacement workflows, list and report
//! - [`ReturnRepository`] - Customer returns and the defect report
//! - [`CatalogRepository`] - Categories, brands, suppliers, payment methods
//! - [`UserRepository`] - Back-office users
//!
//! [`ProductRepository`]: product::ProductRepository
//! [`SalesOrderRepository`]: sales_order::SalesOrderRepository
//! [`ReplacementRepository`]: replacement::ReplacementRepository
//! [`ReturnRepository`]: returns::ReturnRepository
//! [`CatalogRepository`]: catalog::CatalogRepository
//! [`UserRepository`]: user::UserRepository

pub mod catalog;
pub mod product;
pub mod replacement;
pub mod returns;
pub mod sales_order;
pub mod user;

#[cfg(test)]
pub(crate) mod fixtures;
