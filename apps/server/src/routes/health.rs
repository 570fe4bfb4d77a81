//! Liveness endpoint. Unauthenticated.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: bool,
    /// `None` when the migration table can't be read.
    pub schema: Option<SchemaStatus>,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SchemaStatus {
    pub applied: usize,
    pub embedded: usize,
    pub latest_version: Option<i64>,
}

/// 200 when the database answers and the schema is current, 503 otherwise.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthStatus>) {
    let database = state.db.health_check().await;

    let schema = match state.db.migration_status().await {
        Ok(status) => Some(status),
        Err(err) => {
            tracing::warn!(error = %err, "Health check: migration status unavailable");
            None
        }
    };
    let schema_current = schema.map_or(false, |s| s.is_current());

    let healthy = database && schema_current;
    if !healthy {
        tracing::warn!(database, schema_current, "Health check failed");
    }

    (
        if healthy {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        },
        Json(HealthStatus {
            status: if healthy { "ok" } else { "degraded" },
            database,
            schema: schema.map(|s| SchemaStatus {
                applied: s.applied,
                embedded: s.embedded,
                latest_version: s.latest_version,
            }),
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
