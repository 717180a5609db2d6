use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use chirpy_api::auth::{AppState, AppStateInner};
use chirpy_api::routes;
use chirpy_db::DataStore;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

const DEFAULT_REFRESH_TTL_DAYS: i64 = 60;
/// Ten years; anything longer is almost certainly a typo.
const MAX_REFRESH_TTL_DAYS: i64 = 3650;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chirpy=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret = std::env::var("CHIRPY_JWT_SECRET").unwrap_or_default();
    if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
        anyhow::bail!("CHIRPY_JWT_SECRET is unset or still a placeholder");
    }

    let host = std::env::var("CHIRPY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("CHIRPY_PORT")
        .unwrap_or_else(|_| "8080".into())
        .parse()?;
    let db_path: PathBuf = std::env::var("CHIRPY_DB_PATH")
        .unwrap_or_else(|_| "database/database.json".into())
        .into();
    let seed_path: PathBuf = std::env::var("CHIRPY_SEED_PATH")
        .unwrap_or_else(|_| "database/template.json".into())
        .into();
    let static_dir: PathBuf = std::env::var("CHIRPY_STATIC_DIR")
        .unwrap_or_else(|_| "public".into())
        .into();
    let refresh_ttl_days = parse_refresh_ttl_days(std::env::var("CHIRPY_REFRESH_TTL_DAYS").ok())?;

    // Init data store
    let db = DataStore::initialize(&db_path, &seed_path)?
        .with_token_ttl(chrono::Duration::days(refresh_ttl_days));

    let state: AppState = Arc::new(AppStateInner::new(db, jwt_secret));

    let app = routes::router(state, &static_dir)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Chirpy server listening on {}", addr);
    info!("Serving files from {}", static_dir.display());
    info!("Refresh tokens expire after {} days", refresh_ttl_days);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Unset means the default; anything else must be a whole number of days in
/// `1..=MAX_REFRESH_TTL_DAYS`.
fn parse_refresh_ttl_days(raw: Option<String>) -> anyhow::Result<i64> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_REFRESH_TTL_DAYS);
    };
    let days: i64 = raw
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("CHIRPY_REFRESH_TTL_DAYS={raw:?} is not a number: {e}"))?;
    if !(1..=MAX_REFRESH_TTL_DAYS).contains(&days) {
        anyhow::bail!("CHIRPY_REFRESH_TTL_DAYS must be between 1 and {MAX_REFRESH_TTL_DAYS}, got {days}");
    }
    Ok(days)
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(signal) => signal,
                Err(e) => {
                    tracing::warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    info!("Received Ctrl+C, shutting down...");
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
