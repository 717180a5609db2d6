use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use chirpy_types::api::{ChirpRequest, CleanedChirpResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::profanity;
use crate::with_store;

fn cleaned_body(body: &str) -> Result<String, ApiError> {
    if profanity::is_too_long(body) {
        return Err(ApiError::BadRequest("Chirp is too long".into()));
    }
    Ok(profanity::clean(body))
}

/// POST /api/validate_chirp — check length and return the filtered body.
pub async fn validate_chirp(Json(req): Json<ChirpRequest>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(CleanedChirpResponse {
        cleaned_body: cleaned_body(&req.body)?,
    }))
}

pub async fn create_chirp(
    State(state): State<AppState>,
    Json(req): Json<ChirpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let body = cleaned_body(&req.body)?;
    let post = with_store(&state, move |db| db.create_post(&body)).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn list_chirps(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let posts = with_store(&state, |db| db.list_posts()).await?;
    Ok(Json(posts))
}

pub async fn get_chirp(
    State(state): State<AppState>,
    Path(chirp_id): Path<u32>,
) -> Result<impl IntoResponse, ApiError> {
    let post = with_store(&state, move |db| db.get_post(chirp_id)).await?;
    Ok(Json(post))
}
