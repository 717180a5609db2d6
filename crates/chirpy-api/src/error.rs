use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chirpy_db::StoreError;
use chirpy_types::api::ErrorResponse;
use thiserror::Error;
use tracing::error;

/// Handler failure, rendered as `{"error": "..."}` with a matching status.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal() -> Self {
        Self::Internal("Something went wrong".into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Turn a not-found into a 401 with `msg`; anything else passes through.
    pub(crate) fn not_found_as_unauthorized(self, msg: &str) -> Self {
        match self {
            Self::NotFound(_) => Self::Unauthorized(msg.to_string()),
            other => other,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        if err.is_not_found() {
            return Self::NotFound(err.to_string());
        }
        error!("Store failure: {}", err);
        Self::internal()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}
