//! HTTP route handlers.
//!
//! ```text
//! GET  /health
//! POST /api/replacements/product     → replace units, no new order
//! POST /api/replacements/order       → replace through a new sales order
//! GET  /api/replacements             → flattened list, newest first
//! GET  /api/replacement-report       → ?startDate=&endDate=
//! POST /api/returns                  → record a customer return
//! GET  /api/returns                  → newest first
//! GET  /api/product-returns-report   → ?startDate=&endDate=
//! GET  /api/products                 → ?limit=&offset=
//! GET  /api/products/:id
//! GET  /api/orders/:code
//! ```

pub mod catalog;
pub mod health;
pub mod replacements;
pub mod returns;

use axum::http::Uri;

use crate::error::{ApiError, ErrorCode};

/// Fallback for unknown routes and page paths the frontend serves itself.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::new(ErrorCode::NotFound, format!("No route for {}", uri.path()))
}
