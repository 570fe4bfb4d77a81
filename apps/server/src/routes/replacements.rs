//! Replacement endpoints.
//!
//! The acting user always comes from the bearer token; a `processed_by_id`
//! in the body is overwritten.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use stockwise_core::replacement::{
    OrderReplacementOutcome, OrderReplacementRequest, ProductReplacementOutcome,
    ProductReplacementRequest,
};
use stockwise_core::report::{ReplacementReport, ReportPeriod};
use stockwise_core::ReplacementSummary;
use tracing::info;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResponse};
use crate::AppState;

type Created<T> = (StatusCode, Json<ApiResponse<T>>);

/// `POST /api/replacements/product`
pub async fn replace_product(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<ProductReplacementRequest>, JsonRejection>,
) -> Result<Created<ProductReplacementOutcome>, ApiError> {
    let Json(mut request) = payload.map_err(|e| ApiError::validation(e.body_text()))?;
    request.processed_by_id = user.user_id;

    let outcome = state.db.replacements().replace_product(&request).await?;

    info!(
        user_id = user.user_id,
        replace_id = outcome.replacement.replace_id,
        "Product replaced"
    );
    Ok((StatusCode::CREATED, ApiResponse::ok(outcome)))
}

/// `POST /api/replacements/order`
pub async fn replace_with_order(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<OrderReplacementRequest>, JsonRejection>,
) -> Result<Created<OrderReplacementOutcome>, ApiError> {
    let Json(mut request) = payload.map_err(|e| ApiError::validation(e.body_text()))?;
    request.processed_by_id = user.user_id;

    let outcome = state.db.replacements().replace_with_order(&request).await?;

    info!(
        user_id = user.user_id,
        order_code = %outcome.order_code,
        "Product replaced through a new order"
    );
    Ok((StatusCode::CREATED, ApiResponse::ok(outcome)))
}

/// `GET /api/replacements`
pub async fn list_replacements(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<ReplacementSummary>>>, ApiError> {
    let replacements = state.db.replacements().list().await?;
    Ok(ApiResponse::ok(replacements))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// `GET /api/replacement-report?startDate=YYYY-MM-DD&endDate=YYYY-MM-DD`
pub async fn replacement_report(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<ReplacementReport>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::validation(e.body_text()))?;

    let period = ReportPeriod::from_query(
        query.start_date.as_deref(),
        query.end_date.as_deref(),
        Utc::now().date_naive(),
    )?;

    let report = state.db.replacements().report(&period).await?;
    Ok(ApiResponse::ok(report))
}
