//! Access guard.
//!
//! Runs on every request. Resolves the caller from the bearer token, then
//! checks the path against the role table in [`stockwise_core::access`]:
//!
//! ```text
//! GET /reports        (page)  forbidden → 303 See Other → role's home page
//! GET /api/...        (API)   forbidden → 401 (no token) / 403 (role)
//! anything else               allowed   → handler, with AuthUser attached
//! ```

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use stockwise_core::access::{api_section, evaluate, AccessDecision};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::AppState;

pub async fn access_guard(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let caller = state.jwt.caller(request.headers());
    let role = caller.map(|user| user.role);
    let path = request.uri().path().to_string();

    if path == "/api" || path.starts_with("/api/") {
        if let Some(section) = api_section(&path) {
            if !evaluate(role, section).is_allowed() {
                warn!(path = %path, role = ?role, "API access denied");
                let err = match caller {
                    None => ApiError::unauthorized(),
                    Some(_) => ApiError::forbidden(&path),
                };
                return err.into_response();
            }
        }
    } else if request.method() == Method::GET {
        if let AccessDecision::Redirect(target) = evaluate(role, &path) {
            debug!(path = %path, role = ?role, target, "Redirecting page navigation");
            return Redirect::to(target).into_response();
        }
    }

    if let Some(user) = caller {
        request.extensions_mut().insert(user);
    }
    next.run(request).await
}
