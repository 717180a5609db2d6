use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::error;

use chirpy_types::api::UserCredentials;
use chirpy_types::models::Account;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::extract_claims;
use crate::password;
use crate::with_store;

fn validate(req: &UserCredentials) -> Result<(), ApiError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".into(),
        ));
    }
    Ok(())
}

fn hash(plaintext: &str) -> Result<Vec<u8>, ApiError> {
    password::hash_password(plaintext).map_err(|e| {
        error!("Password hashing failed: {}", e);
        ApiError::internal()
    })
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<UserCredentials>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&req)?;
    let password_hash = hash(&req.password)?;

    let account =
        with_store(&state, move |db| db.create_account(&req.email, &password_hash)).await?;

    Ok((StatusCode::CREATED, Json(account)))
}

/// PUT /api/users — replace the caller's email and password. The account is
/// taken from the access token, never from the body.
pub async fn update_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<UserCredentials>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = extract_claims(&headers, &state.jwt_secret)?;
    let account_id: u32 = claims
        .sub
        .parse()
        .map_err(|_| ApiError::Unauthorized("Unauthorized request".into()))?;

    validate(&req)?;
    let password_hash = hash(&req.password)?;

    let account = with_store(&state, move |db| {
        // Keep the refresh-token back-reference across the replace.
        let existing = db.find_account_by_id(account_id)?;
        db.update_account(
            account_id,
            Account {
                id: account_id,
                email: req.email,
                password_hash,
                token: None,
                refresh_token_id: existing.refresh_token_id,
            },
        )
    })
    .await?;

    Ok(Json(account))
}
