//! Application bootstrapper
//!
//! Handles all initialization and setup for the payadmin backend.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::CONFIG;
use crate::db;
use crate::endpoints;
use crate::services::identity::{IdentityAdmin, KeycloakAdminClient};
use crate::state::AppState;

/// Bootstrap and run the application
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting payadmin backend v{}", env!("CARGO_PKG_VERSION"));

    let state = init_services().await?;

    run_bootstrap(&state).await?;

    let app = create_app(state);

    serve(app).await
}

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("payadmin={}", CONFIG.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_ansi(false))
        .init();
}

/// Initialize all application services
async fn init_services() -> anyhow::Result<AppState> {
    let conn = db::connect().await?;
    tracing::info!("Database connection established");

    let identity: Arc<dyn IdentityAdmin> = Arc::new(KeycloakAdminClient::from_config());

    Ok(AppState::new(conn, identity))
}

/// Run the startup bootstrap sequence. In lenient mode (the default) a run
/// that completes with warnings is logged and the service starts serving
/// anyway; strict mode aborts startup instead.
async fn run_bootstrap(state: &AppState) -> anyhow::Result<()> {
    let outcome = state.orchestrator.run().await;

    if outcome.has_failures() {
        if CONFIG.strict_bootstrap {
            let detail = outcome
                .first_failure()
                .and_then(|s| s.error.clone())
                .unwrap_or_else(|| "unknown failure".to_string());
            anyhow::bail!(
                "Bootstrap completed with failures and strict startup is enabled: {}",
                detail
            );
        }
        tracing::warn!("Bootstrap completed with warnings, continuing startup");
    }

    Ok(())
}

/// Create the main application router
fn create_app(state: AppState) -> Router {
    // No configured origins means any origin (dev convenience)
    let origin = if CONFIG.server.allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            CONFIG
                .server
                .allowed_origins
                .iter()
                .filter_map(|o| o.parse().ok()),
        )
    };
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any);

    endpoints::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Start the HTTP server
async fn serve(app: Router) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], CONFIG.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
