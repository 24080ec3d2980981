use axum::http::StatusCode;

use crate::app::errors;
use crate::context::AuthContext;

/// Route-level role policy: the caller must hold at least one of `allowed`.
///
/// Matches the original deployment's policy surface: any authenticated role
/// may place orders, only `admin` mutates orders and the catalog.
pub fn require_any_role(
    ctx: &AuthContext,
    allowed: &[&str],
) -> Result<(), axum::response::Response> {
    if allowed.iter().any(|role| ctx.has_role(role)) {
        Ok(())
    } else {
        Err(errors::json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "access denied",
        ))
    }
}
