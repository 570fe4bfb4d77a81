//! Return endpoints and the monthly defect report.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use stockwise_core::report::ReportPeriod;
use stockwise_core::returns::{ReturnReport, ReturnRequest};
use stockwise_core::ProductReturn;
use tracing::info;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResponse};
use crate::routes::replacements::ReportQuery;
use crate::AppState;

/// `POST /api/returns`
pub async fn record_return(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<ReturnRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ProductReturn>>), ApiError> {
    let Json(mut request) = payload.map_err(|e| ApiError::validation(e.body_text()))?;
    request.processed_by_id = user.user_id;

    let recorded = state.db.returns().record(&request).await?;

    info!(user_id = user.user_id, return_id = recorded.return_id, "Return taken in");
    Ok((StatusCode::CREATED, ApiResponse::ok(recorded)))
}

/// `GET /api/returns`
pub async fn list_returns(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<ProductReturn>>>, ApiError> {
    Ok(ApiResponse::ok(state.db.returns().list().await?))
}

/// `GET /api/product-returns-report?startDate=YYYY-MM-DD&endDate=YYYY-MM-DD`
///
/// Months cover the year of `startDate` (current year by default).
pub async fn product_returns_report(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<ReturnReport>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::validation(e.body_text()))?;

    let period = ReportPeriod::from_query(
        query.start_date.as_deref(),
        query.end_date.as_deref(),
        Utc::now().date_naive(),
    )?;

    let report = state.db.returns().report(&period).await?;
    Ok(ApiResponse::ok(report))
}
