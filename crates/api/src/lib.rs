//! HTTP API for the restaurant services.
//!
//! A thin axum surface over the domain services: orders, kitchen tickets,
//! reservations and login sessions, with structured logging (tracing) and
//! Prometheus metrics. The cross-service consumers and the expired-session
//! sweep run as background tasks next to the server.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use std::time::Duration;

use axum::Router;
use axum::routing::{delete, get, post, put};
use common::Context;
use domain::user::UserService;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub use config::{Config, LogFormat};
pub use error::ApiError;
pub use state::{AppState, Repositories};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: AppState, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::ops::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::ops::health))
        .route("/orders", post(routes::orders::create).get(routes::orders::list))
        .route("/orders/{id}", get(routes::orders::get))
        .route("/orders/{id}/items", post(routes::orders::add_item))
        .route(
            "/orders/{id}/items/{item_id}",
            delete(routes::orders::remove_item),
        )
        .route("/orders/{id}/status", put(routes::orders::update_status))
        .route("/orders/{id}/cancel", post(routes::orders::cancel))
        .route("/kitchen/queue", get(routes::kitchen::queue))
        .route("/kitchen/orders/{id}", get(routes::kitchen::get))
        .route(
            "/kitchen/orders/{id}/status",
            put(routes::kitchen::update_status),
        )
        .route(
            "/kitchen/orders/{id}/items/{item_id}/status",
            put(routes::kitchen::update_item_status),
        )
        .route("/reservations", post(routes::reservations::create))
        .route("/reservations/upcoming", get(routes::reservations::upcoming))
        .route("/reservations/{id}", get(routes::reservations::get))
        .route(
            "/reservations/{id}/confirm",
            post(routes::reservations::confirm),
        )
        .route("/reservations/{id}/cancel", post(routes::reservations::cancel))
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/refresh", post(routes::auth::refresh))
        .route("/auth/logout", post(routes::auth::logout))
        .route("/auth/me", get(routes::auth::me))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Installs the global tracing subscriber. `RUST_LOG` wins over the
/// configured level when set.
pub fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

/// Deletes expired sessions every `interval` until `shutdown` fires.
/// A failed sweep is logged and retried on the next tick.
pub fn spawn_session_cleanup(
    users: UserService,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let ctx = Context::with_token(shutdown.child_token());
                    if let Err(err) = users.cleanup_expired_sessions(&ctx).await {
                        tracing::warn!(error = %err, "session cleanup failed");
                    }
                }
            }
        }
        tracing::info!("session cleanup stopped");
    })
}
