//! # TaskHive API Server
//!
//! Multi-tenant project and task management API. Provides:
//! - Sign-in via external identity-provider token exchange
//! - Organizations, projects, members, and tasks
//! - Role-based authorization (owner, member, viewer)
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskhive-api
//! ```

use std::sync::Arc;
use std::time::Duration;

use taskhive_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskhive_shared::auth::identity::GoogleIdentityProvider;
use taskhive_shared::db::{migrations::run_migrations, pool};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskhive_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "TaskHive API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        min_connections: 1,
        acquire_timeout: Duration::from_secs(5),
    })
    .await?;

    run_migrations(&db).await?;

    let identity = Arc::new(GoogleIdentityProvider::new(
        config.identity.project_id.clone(),
        config.identity.jwks_url.clone(),
    ));

    let bind_address = config.bind_address();
    let state = AppState::new(db, config, identity);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
