use std::sync::atomic::{AtomicU64, Ordering};

use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse},
};

use crate::auth::AppState;

/// File-server hit counter, owned by the per-server state.
#[derive(Debug, Default)]
pub struct Metrics {
    hits: AtomicU64,
}

impl Metrics {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
    }
}

const TEXT_PLAIN: [(header::HeaderName, &str); 1] =
    [(header::CONTENT_TYPE, "text/plain; charset=utf-8")];

/// GET /api/healthz
pub async fn healthz() -> impl IntoResponse {
    (TEXT_PLAIN, "OK")
}

/// GET /api/metrics
pub async fn hits(State(state): State<AppState>) -> impl IntoResponse {
    (TEXT_PLAIN, format!("Hits: {}", state.metrics.hits()))
}

/// GET /admin/metrics
pub async fn admin_metrics(State(state): State<AppState>) -> impl IntoResponse {
    Html(format!(
        "<html>\n<body>\n    <h1>Welcome, Chirpy Admin</h1>\n    <p>Chirpy has been visited {} times!</p>\n</body>\n</html>",
        state.metrics.hits()
    ))
}

/// POST /api/reset
pub async fn reset(State(state): State<AppState>) -> impl IntoResponse {
    state.metrics.reset();
    (TEXT_PLAIN, format!("Hits: {}", state.metrics.hits()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_records_and_resets() {
        let metrics = Metrics::default();
        metrics.record_hit();
        metrics.record_hit();
        assert_eq!(metrics.hits(), 2);
        metrics.reset();
        assert_eq!(metrics.hits(), 0);
    }
}
