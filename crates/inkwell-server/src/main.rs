mod seed;

use std::net::SocketAddr;
use std::path::PathBuf;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use inkwell_api::AppStateInner;
use inkwell_auth::{DEFAULT_TTL_SECS, TokenService};
use inkwell_db::Database;

/// Placeholder JWT secrets that should never reach production.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkwell_server=debug,inkwell_api=debug,inkwell_db=info,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("INKWELL_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    if PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
        warn!("INKWELL_JWT_SECRET is unset or a placeholder; tokens are forgeable");
    }
    let db_path: PathBuf = std::env::var("INKWELL_DB_PATH")
        .unwrap_or_else(|_| "inkwell.db".into())
        .into();
    let host = std::env::var("INKWELL_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("INKWELL_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let token_ttl_secs: i64 = std::env::var("INKWELL_TOKEN_TTL_SECS")
        .unwrap_or_else(|_| DEFAULT_TTL_SECS.to_string())
        .parse()?;
    let token_ttl = chrono::Duration::try_seconds(token_ttl_secs)
        .filter(|ttl| *ttl > chrono::Duration::zero())
        .ok_or_else(|| anyhow::anyhow!("INKWELL_TOKEN_TTL_SECS must be a positive number of seconds"))?;
    let seed_demo_data = std::env::var("INKWELL_SEED")
        .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);

    // Init database
    let db = Database::open(&db_path)?;
    if seed_demo_data {
        seed::load(&db)?;
    }

    let tokens = TokenService::new(&jwt_secret, token_ttl);
    let state = AppStateInner::new(db, tokens);

    let app = inkwell_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Inkwell listening on {}", addr);
    info!("Tokens expire after {} seconds", token_ttl_secs);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(signal) => signal,
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
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
