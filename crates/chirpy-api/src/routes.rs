use std::path::Path;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::services::ServeDir;

use crate::auth::{self, AppState};
use crate::chirps;
use crate::metrics;
use crate::middleware::count_hits;
use crate::users;

/// All API routes plus the hit-counted static file server under `/app`.
pub fn router(state: AppState, static_dir: &Path) -> Router {
    let file_server = Router::new()
        .nest_service("/app", ServeDir::new(static_dir))
        .layer(middleware::from_fn_with_state(state.clone(), count_hits));

    Router::new()
        .route("/api/healthz", get(metrics::healthz))
        .route("/api/metrics", get(metrics::hits))
        .route("/admin/metrics", get(metrics::admin_metrics))
        .route("/api/reset", post(metrics::reset))
        .route("/api/validate_chirp", post(chirps::validate_chirp))
        .route(
            "/api/chirps",
            get(chirps::list_chirps).post(chirps::create_chirp),
        )
        .route("/api/chirps/{chirp_id}", get(chirps::get_chirp))
        .route("/api/users", post(users::create_user).put(users::update_user))
        .route("/api/login", post(auth::login))
        .route("/api/refresh", post(auth::refresh))
        .route("/api/revoke", post(auth::revoke))
        .merge(file_server)
        .with_state(state)
}
