use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

use chirpy_types::api::Claims;

use crate::auth::{self, AppState};
use crate::error::ApiError;

/// The token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".into()))
}

/// Validate the bearer access token and return its claims.
pub fn extract_claims(headers: &HeaderMap, jwt_secret: &str) -> Result<Claims, ApiError> {
    let token = bearer_token(headers)?;
    auth::validate_token(jwt_secret, token)
        .map_err(|_| ApiError::Unauthorized("Unauthorized request".into()))
}

/// Count every request that reaches the static file server.
pub async fn count_hits(State(state): State<AppState>, req: Request, next: Next) -> Response {
    state.metrics.record_hit();
    next.run(req).await
}
