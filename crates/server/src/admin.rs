use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use crate::errors::JsonApiError;
use crate::state::AppState;

pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

/// Middleware: require the configured admin token in `X-Admin-Token`.
pub async fn require_admin_token(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    let Some(expected) = state.admin_token.as_deref() else {
        warn!(path = %req.uri().path(), "admin route called but no admin token is configured");
        return Err(JsonApiError::new(StatusCode::UNAUTHORIZED, "Unauthorized", Some("admin access is disabled".into())));
    };
    let given = req.headers().get(ADMIN_TOKEN_HEADER).and_then(|v| v.to_str().ok());
    match given {
        Some(token) if !token.is_empty() && tokens_match(token.as_bytes(), expected.as_bytes()) => Ok(next.run(req).await),
        _ => Err(JsonApiError::new(StatusCode::UNAUTHORIZED, "Unauthorized", Some("missing or invalid admin token".into()))),
    }
}

/// Compare without short-circuiting on the first differing byte.
fn tokens_match(given: &[u8], expected: &[u8]) -> bool {
    if given.len() != expected.len() {
        return false;
    }
    given.iter().zip(expected).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
}
