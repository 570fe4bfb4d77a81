//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Stockwise                              │
//! │                                                                         │
//! │  Handler → Result<Json<ApiResponse<T>>, ApiError>                      │
//! │                                                                         │
//! │  ValidationError ─► CoreError ─► DbError::Domain ─┐                    │
//! │                                   DbError::*     ─┼─► ApiError         │
//! │                              access guard        ─┘      │             │
//! │                                                          ▼             │
//! │            HTTP status + { "success": false, "error", "code" }         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use stockwise_core::CoreError;
use stockwise_db::DbError;

/// Successful response envelope: `{ "success": true, "data": ... }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(ApiResponse {
            success: true,
            data,
        })
    }
}

/// API error returned from handlers.
///
/// ## Serialization
/// ```json
/// {
///   "success": false,
///   "error": "Insufficient stock for product 12: available 3, requested 5",
///   "code": "INSUFFICIENT_STOCK"
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Not enough stock (409)
    InsufficientStock,

    /// Request is well-formed but breaks a business rule (422)
    BusinessLogic,

    /// No or invalid bearer token (401)
    Unauthorized,

    /// Role may not use this route (403)
    Forbidden,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::InsufficientStock => StatusCode::CONFLICT,
            ErrorCode::BusinessLogic => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: &'a str,
    code: ErrorCode,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized() -> Self {
        ApiError::new(ErrorCode::Unauthorized, "Authentication required")
    }

    pub fn forbidden(path: &str) -> Self {
        ApiError::new(
            ErrorCode::Forbidden,
            format!("Your role may not access {}", path),
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: &self.message,
            code: self.code,
        };
        (self.code.status(), Json(body)).into_response()
    }
}

/// Converts database errors to API errors.
///
/// Unexpected failures are logged and keep the underlying message.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(core) => ApiError::from(core),
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, format!("Invalid reference: {}", message))
            }
            DbError::CheckViolation { message } => {
                tracing::warn!("Check constraint violation: {}", message);
                ApiError::new(ErrorCode::BusinessLogic, message)
            }
            other => {
                tracing::error!(error = %other, "Database operation failed");
                ApiError::new(ErrorCode::DatabaseError, other.to_string())
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::ProductNotFound(_) | CoreError::OrderNotFound(_) => ErrorCode::NotFound,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::ProductNotInOrder { .. } => ErrorCode::BusinessLogic,
            CoreError::Validation(_) => ErrorCode::ValidationError,
        };
        ApiError::new(code, err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use stockwise_core::ValidationError;

    #[test]
    fn test_core_error_codes() {
        let err = ApiError::from(CoreError::InsufficientStock {
            product_id: 3,
            available: 1,
            requested: 2,
        });
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.code.status(), StatusCode::CONFLICT);

        let err = ApiError::from(DbError::from(CoreError::OrderNotFound(7)));
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Sales order not found: 7");

        let err = ApiError::from(CoreError::Validation(ValidationError::Required {
            field: "reason".to_string(),
        }));
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_unexpected_db_error_keeps_message() {
        let err = ApiError::from(DbError::QueryFailed("disk I/O error".to_string()));
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(err.message.contains("disk I/O error"));
    }

    #[test]
    fn test_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::InsufficientStock).unwrap();
        assert_eq!(json, "\"INSUFFICIENT_STOCK\"");
    }
}
