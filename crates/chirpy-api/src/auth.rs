use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{error, info, warn};

use chirpy_db::DataStore;
use chirpy_types::api::{Claims, LoginRequest, LoginResponse, RefreshResponse};

use crate::error::ApiError;
use crate::metrics::Metrics;
use crate::middleware::bearer_token;
use crate::password;
use crate::with_store;

pub const ISSUER: &str = "chirpy";

/// Access tokens live this long unless the login asks for less.
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 60 * 60;
/// Upper bound on a requested access-token lifetime.
pub const MAX_ACCESS_TTL_SECS: i64 = 24 * 60 * 60;

pub type AppState = Arc<AppStateInner>;

/// Per-server context shared by every handler.
pub struct AppStateInner {
    pub db: DataStore,
    pub jwt_secret: String,
    pub metrics: Metrics,
}

impl AppStateInner {
    pub fn new(db: DataStore, jwt_secret: impl Into<String>) -> Self {
        Self {
            db,
            jwt_secret: jwt_secret.into(),
            metrics: Metrics::default(),
        }
    }
}

const BAD_CREDENTIALS: &str = "Incorrect email or password";

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.clone();
    let account = with_store(&state, move |db| db.find_account_by_email(&email))
        .await
        .map_err(|e| e.not_found_as_unauthorized(BAD_CREDENTIALS))?;

    if !password::verify_password(&account.password_hash, &req.password) {
        warn!("Failed login for account {}", account.id);
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.into()));
    }

    let ttl = access_token_ttl(req.expires_in_seconds);
    let token = create_token(&state.jwt_secret, account.id, ttl).map_err(|e| {
        error!("Failed to sign access token: {}", e);
        ApiError::internal()
    })?;

    let account_id = account.id;
    let refresh_token = with_store(&state, move |db| db.issue_refresh_token(account_id)).await?;

    info!("Account {} logged in", account.id);
    Ok(Json(LoginResponse {
        id: account.id,
        email: account.email,
        token,
        refresh_token: refresh_token.token,
    }))
}

/// Exchange a usable refresh token (sent as the bearer) for a new access token.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let presented = bearer_token(&headers)?.to_string();
    let refresh_token = with_store(&state, move |db| db.find_refresh_token(&presented))
        .await
        .map_err(|e| e.not_found_as_unauthorized("Invalid refresh token"))?;

    if !refresh_token.is_usable() {
        return Err(ApiError::Unauthorized(
            "Refresh token expired or revoked".into(),
        ));
    }

    let token = create_token(
        &state.jwt_secret,
        refresh_token.account_id,
        Duration::seconds(DEFAULT_ACCESS_TTL_SECS),
    )
    .map_err(|e| {
        error!("Failed to sign access token: {}", e);
        ApiError::internal()
    })?;

    Ok(Json(RefreshResponse { token }))
}

/// Invalidate the refresh token sent as the bearer.
pub async fn revoke(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let presented = bearer_token(&headers)?.to_string();
    with_store(&state, move |db| {
        let refresh_token = db.find_refresh_token(&presented)?;
        db.invalidate_token(refresh_token.id)
    })
    .await
    .map_err(|e| e.not_found_as_unauthorized("Invalid refresh token"))?;

    Ok(StatusCode::NO_CONTENT)
}

fn access_token_ttl(requested_secs: Option<i64>) -> Duration {
    match requested_secs {
        Some(secs) if secs > 0 => Duration::seconds(secs.min(MAX_ACCESS_TTL_SECS)),
        _ => Duration::seconds(DEFAULT_ACCESS_TTL_SECS),
    }
}

pub fn create_token(
    secret: &str,
    account_id: u32,
    ttl: Duration,
) -> jsonwebtoken::errors::Result<String> {
    let now = Utc::now();
    let claims = Claims {
        iss: ISSUER.to_string(),
        sub: account_id.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + ttl).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn validate_token(secret: &str, token: &str) -> jsonwebtoken::errors::Result<Claims> {
    let mut validation = Validation::default();
    validation.set_issuer(&[ISSUER]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_roundtrip() {
        let token = create_token("secret", 42, Duration::minutes(5)).unwrap();
        let claims = validate_token("secret", &token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.iss, ISSUER);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = create_token("secret", 1, Duration::minutes(5)).unwrap();
        assert!(validate_token("other", &token).is_err());
    }

    #[test]
    fn expired_token_rejected() {
        // Past the default 60s validation leeway.
        let token = create_token("secret", 1, Duration::minutes(-5)).unwrap();
        assert!(validate_token("secret", &token).is_err());
    }

    #[test]
    fn requested_ttl_is_clamped() {
        assert_eq!(access_token_ttl(None), Duration::seconds(DEFAULT_ACCESS_TTL_SECS));
        assert_eq!(access_token_ttl(Some(0)), Duration::seconds(DEFAULT_ACCESS_TTL_SECS));
        assert_eq!(access_token_ttl(Some(30)), Duration::seconds(30));
        assert_eq!(
            access_token_ttl(Some(10 * MAX_ACCESS_TTL_SECS)),
            Duration::seconds(MAX_ACCESS_TTL_SECS)
        );
    }
}
