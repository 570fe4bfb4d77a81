//! # Access Table
//!
//! Which pages each role may open, and where a denied visitor is sent.
//!
//! ```text
//! ┌───────────┬────────────────────────────────────────────────┬───────────────┐
//! │ Role      │ Forbidden pages                                │ Redirect      │
//! ├───────────┼────────────────────────────────────────────────┼───────────────┤
//! │ Admin     │ / /signup /forgot-password /change-password    │ /dashboard    │
//! │ Manager   │ Admin's list + /users                          │ /dashboard    │
//! │ Staff     │ everything but /sales-orders and /signup       │ /sales-orders │
//! │ anonymous │ every application page                         │ /             │
//! └───────────┴────────────────────────────────────────────────┴───────────────┘
//! ```
//!
//! Page paths match exactly. API paths are first mapped to the page section
//! they serve with [`api_section`] and then checked against the same table.

use crate::types::Role;

const ADMIN_FORBIDDEN: &[&str] = &["/", "/signup", "/forgot-password", "/change-password"];

const MANAGER_FORBIDDEN: &[&str] = &[
    "/users",
    "/",
    "/signup",
    "/forgot-password",
    "/change-password",
];

const STAFF_FORBIDDEN: &[&str] = &[
    "/dashboard",
    "/inventory",
    "/returns",
    "/replacements",
    "/suppliers",
    "/categories",
    "/",
    "/brands",
    "/forgot-password",
    "/change-password",
    "/payment-methods",
    "/reports",
    "/users",
];

const ANONYMOUS_FORBIDDEN: &[&str] = &[
    "/dashboard",
    "/inventory",
    "/sales-orders",
    "/returns",
    "/replacements",
    "/suppliers",
    "/categories",
    "/brands",
    "/payment-methods",
    "/reports",
    "/users",
];

/// Every page the guard knows about.
pub const GUARDED_PAGES: &[&str] = &[
    "/dashboard",
    "/inventory",
    "/sales-orders",
    "/returns",
    "/replacements",
    "/suppliers",
    "/categories",
    "/",
    "/brands",
    "/forgot-password",
    "/change-password",
    "/payment-methods",
    "/reports",
    "/users",
];

/// API prefix → page section. Longest prefixes first.
const API_SECTIONS: &[(&str, &str)] = &[
    ("/api/replacement-report", "/reports"),
    ("/api/product-returns-report", "/reports"),
    ("/api/returns", "/returns"),
    ("/api/replacements", "/replacements"),
    ("/api/products", "/inventory"),
    ("/api/orders", "/sales-orders"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    /// Denied; page requests go to this path instead.
    Redirect(&'static str),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }
}

/// Pages `role` may not open (`None` = not signed in).
pub fn forbidden_paths(role: Option<Role>) -> &'static [&'static str] {
    match role {
        Some(Role::Admin) => ADMIN_FORBIDDEN,
        Some(Role::Manager) => MANAGER_FORBIDDEN,
        Some(Role::Staff) => STAFF_FORBIDDEN,
        None => ANONYMOUS_FORBIDDEN,
    }
}

pub fn redirect_target(role: Option<Role>) -> &'static str {
    match role {
        Some(Role::Admin) | Some(Role::Manager) => "/dashboard",
        Some(Role::Staff) => "/sales-orders",
        None => "/",
    }
}

/// Decides whether `role` may open page `path`.
///
/// ```rust
/// use stockwise_core::access::{evaluate, AccessDecision};
/// use stockwise_core::Role;
///
/// assert_eq!(evaluate(Some(Role::Staff), "/reports"), AccessDecision::Redirect("/sales-orders"));
/// assert_eq!(evaluate(Some(Role::Manager), "/reports"), AccessDecision::Allow);
/// assert_eq!(evaluate(None, "/reports"), AccessDecision::Redirect("/"));
/// ```
pub fn evaluate(role: Option<Role>, path: &str) -> AccessDecision {
    if forbidden_paths(role).contains(&path) {
        AccessDecision::Redirect(redirect_target(role))
    } else {
        AccessDecision::Allow
    }
}

/// Page section served by an API path, if the API is guarded.
pub fn api_section(path: &str) -> Option<&'static str> {
    API_SECTIONS
        .iter()
        .find(|(prefix, _)| {
            path.strip_prefix(*prefix)
                .map(|rest| rest.is_empty() || rest.starts_with('/'))
                .unwrap_or(false)
        })
        .map(|(_, section)| *section)
}
