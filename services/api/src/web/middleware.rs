//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::web::state::AppState;

/// Middleware that validates the bearer token and extracts its claims.
///
/// If valid, inserts the `Claims` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract the Authorization header
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Strip the bearer scheme
    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 3. Validate the token
    let claims = state
        .auth
        .decode_token(token)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    // 4. Insert the claims into request extensions
    req.extensions_mut().insert(claims);

    // 5. Continue to the handler
    Ok(next.run(req).await)
}
