//! API server entry point.

use std::sync::Arc;

use api::{AppState, Config, Repositories};
use common::{Context, SystemClock};
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() {
    // 1. Configuration and tracing
    let config = Config::from_env().expect("invalid configuration");
    api::init_tracing(&config);
    if config.uses_dev_secret() {
        tracing::warn!("JWT_SECRET is not set, using the development secret");
    }

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Repositories: PostgreSQL when configured, memory otherwise
    let repositories = match config.database_url.as_deref() {
        Some(url) => {
            let pool = storage::connect(url, 10)
                .await
                .expect("failed to connect to database");
            storage::run_migrations(&pool)
                .await
                .expect("failed to run migrations");
            Repositories::postgres(&pool)
        }
        None => {
            tracing::info!("DATABASE_URL is not set, using in-memory repositories");
            Repositories::in_memory()
        }
    };
    let state = AppState::new(
        repositories,
        config.jwt(),
        config.default_prep_time,
        Arc::new(SystemClock),
    );
    state
        .users
        .seed_default_roles(&Context::background())
        .await
        .expect("failed to seed roles");

    // 4. Background tasks
    let shutdown = CancellationToken::new();
    let consumers = state.processor().spawn(&state.bus, shutdown.child_token());
    let cleanup = api::spawn_session_cleanup(
        state.users.clone(),
        config.session_cleanup_interval,
        shutdown.child_token(),
    );

    // 5. Start server
    let app = api::create_app(state, metrics_handle);
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    shutdown.cancel();
    let _ = tokio::join!(consumers, cleanup);
    tracing::info!("server shut down gracefully");
}
