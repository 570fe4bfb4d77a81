//! Product and sales order lookups.

use std::sync::Arc;

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use stockwise_core::{Product, SalesOrderDetail};

use crate::error::{ApiError, ApiResponse};
use crate::AppState;

const DEFAULT_PAGE_SIZE: u32 = 50;
const MAX_PAGE_SIZE: u32 = 200;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// `GET /api/products?limit=&offset=`
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Product>>>, ApiError> {
    let Query(page) = query.map_err(|e| ApiError::validation(e.body_text()))?;
    let limit = page.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    let products = state
        .db
        .products()
        .list(limit, page.offset.unwrap_or(0))
        .await?;
    Ok(ApiResponse::ok(products))
}

/// `GET /api/products/:id`
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let Path(product_id) = path.map_err(|e| ApiError::validation(e.body_text()))?;
    let product = state.db.products().get(product_id).await?;
    Ok(ApiResponse::ok(product))
}

/// `GET /api/orders/:code`
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(order_code): Path<String>,
) -> Result<Json<ApiResponse<SalesOrderDetail>>, ApiError> {
    let order = state
        .db
        .orders()
        .get_by_code(&order_code)
        .await?
        .ok_or_else(|| ApiError::not_found("Sales order", &order_code))?;
    Ok(ApiResponse::ok(order))
}
