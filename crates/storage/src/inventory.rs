//! Inventory items, their movement ledger and suppliers.

use async_trait::async_trait;
use common::{InventoryItemId, MenuItemId, MovementId};
use domain::inventory::{
    InventoryFilter, InventoryItem, InventoryRepository, Movement, MovementRepository,
    MovementType, Supplier, SupplierRepository,
};
use domain::{ListQuery, Page, RepositoryError, RepositoryResult};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::document::{Column, Document, PgStore};
use crate::error::{db_error, write_error};

pub type PgInventoryRepository = PgStore<InventoryItem>;
pub type PgSupplierRepository = PgStore<Supplier>;

impl Document for InventoryItem {
    const TABLE: &'static str = "inventory_items";

    fn columns(&self) -> Vec<(&'static str, Column)> {
        vec![
            ("sku", Column::text(self.sku())),
            ("level", Column::text(self.level().as_str())),
            ("available_stock", Column::Float(self.available_stock())),
            (
                "supplier_id",
                Column::Text(self.supplier_id().map(|s| s.to_string())),
            ),
            ("is_active", Column::Bool(self.is_active())),
        ]
    }
}

#[async_trait]
impl InventoryRepository for PgStore<InventoryItem> {
    async fn list(
        &self,
        query: &ListQuery<InventoryFilter>,
    ) -> RepositoryResult<Page<InventoryItem>> {
        let filter = &query.filter;
        self.select()
            .filter_opt("level = {}", filter.level, |l| Column::text(l.as_str()))
            .filter_opt("supplier_id = {}", filter.supplier_id.as_ref(), |s| {
                Column::text(s.as_str())
            })
            .filter_opt("is_active = {}", filter.is_active, Column::Bool)
            .order_by("sku")
            .fetch_page(self.pool(), query.offset, query.limit)
            .await
    }

    async fn find_by_sku(&self, sku: &str) -> RepositoryResult<Option<InventoryItem>> {
        self.select()
            .filter("sku = {}", Column::text(sku))
            .fetch_optional(self.pool())
            .await
    }

    async fn find_low_stock(&self) -> RepositoryResult<Vec<InventoryItem>> {
        self.select()
            .condition("is_active")
            .condition("level <> 'OK'")
            .order_by("available_stock ASC, sku")
            .fetch_all(self.pool())
            .await
    }

    async fn find_by_menu_item(
        &self,
        menu_item_id: &MenuItemId,
    ) -> RepositoryResult<Vec<InventoryItem>> {
        self.select()
            .filter(
                "document->'menuItemIds' ? {}",
                Column::text(menu_item_id.as_str()),
            )
            .order_by("sku")
            .fetch_all(self.pool())
            .await
    }
}

impl Document for Supplier {
    const TABLE: &'static str = "suppliers";

    fn columns(&self) -> Vec<(&'static str, Column)> {
        vec![
            ("name", Column::text(self.name())),
            ("is_active", Column::Bool(self.is_active())),
        ]
    }
}

#[async_trait]
impl SupplierRepository for PgStore<Supplier> {
    async fn list(&self) -> RepositoryResult<Vec<Supplier>> {
        self.select().order_by("name, id").fetch_all(self.pool()).await
    }

    async fn list_active(&self) -> RepositoryResult<Vec<Supplier>> {
        self.select()
            .condition("is_active")
            .order_by("name, id")
            .fetch_all(self.pool())
            .await
    }
}

/// Append-only movement ledger.
#[derive(Debug, Clone)]
pub struct PgMovementRepository {
    pool: PgPool,
}

impl PgMovementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_movement(row: PgRow) -> RepositoryResult<Movement> {
        let movement_type: String = row.try_get("movement_type").map_err(db_error)?;
        Ok(Movement {
            id: MovementId::from(row.try_get::<String, _>("id").map_err(db_error)?),
            item_id: InventoryItemId::from(row.try_get::<String, _>("item_id").map_err(db_error)?),
            movement_type: movement_type
                .parse::<MovementType>()
                .map_err(RepositoryError::backend)?,
            quantity: row.try_get("quantity").map_err(db_error)?,
            reason: row.try_get("reason").map_err(db_error)?,
            reference: row.try_get("reference").map_err(db_error)?,
            created_at: row.try_get("created_at").map_err(db_error)?,
        })
    }
}

#[async_trait]
impl MovementRepository for PgMovementRepository {
    async fn record(&self, movement: &Movement) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO inventory_movements
                (id, item_id, movement_type, quantity, reason, reference, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(movement.id.as_str())
        .bind(movement.item_id.as_str())
        .bind(movement.movement_type.as_str())
        .bind(movement.quantity)
        .bind(&movement.reason)
        .bind(movement.reference.as_deref())
        .bind(movement.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "Movement", &movement.id))?;
        Ok(())
    }

    async fn list_for_item(
        &self,
        item_id: &InventoryItemId,
        limit: usize,
    ) -> RepositoryResult<Vec<Movement>> {
        let rows = sqlx::query(
            r#"
            SELECT id, item_id, movement_type, quantity, reason, reference, created_at
            FROM inventory_movements
            WHERE item_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(item_id.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(Self::row_to_movement).collect()
    }
}
