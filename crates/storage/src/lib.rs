//! PostgreSQL implementations of the domain repository contracts.
//!
//! Every aggregate is one row: the columns its queries filter and sort on,
//! plus the whole aggregate (child collections included) as a JSONB
//! document, so a root and its children are always written atomically.
//! Writes are version-checked like the in-memory stores.

mod document;
mod error;
pub mod inventory;
pub mod menus;
pub mod orders;
pub mod reservations;
pub mod users;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub use document::{Column, Document, PgStore};
pub use inventory::{PgInventoryRepository, PgMovementRepository, PgSupplierRepository};
pub use menus::PgMenuRepository;
pub use orders::{PgKitchenOrderRepository, PgOrderRepository};
pub use reservations::PgReservationRepository;
pub use users::{PgRoleRepository, PgSessionRepository, PgUserRepository};

/// Opens a connection pool.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    tracing::info!(max_connections, "connected to postgres");
    Ok(pool)
}

/// Runs the database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}
