//! Append-only log of stock movements.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{InventoryItemId, MovementId};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::repository::RepositoryResult;

use super::MovementType;

/// One change to an item's stock.
///
/// `quantity` is positive except for adjustments, which carry the signed
/// difference between the counted and the recorded stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub id: MovementId,
    pub item_id: InventoryItemId,
    pub movement_type: MovementType,
    pub quantity: f64,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait MovementRepository: Send + Sync {
    async fn record(&self, movement: &Movement) -> RepositoryResult<()>;

    /// Newest first, at most `limit` entries.
    async fn list_for_item(
        &self,
        item_id: &InventoryItemId,
        limit: usize,
    ) -> RepositoryResult<Vec<Movement>>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryMovementRepository {
    movements: Arc<RwLock<Vec<Movement>>>,
}

impl InMemoryMovementRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MovementRepository for InMemoryMovementRepository {
    async fn record(&self, movement: &Movement) -> RepositoryResult<()> {
        self.movements.write().await.push(movement.clone());
        Ok(())
    }

    async fn list_for_item(
        &self,
        item_id: &InventoryItemId,
        limit: usize,
    ) -> RepositoryResult<Vec<Movement>> {
        let movements = self.movements.read().await;
        Ok(movements
            .iter()
            .rev()
            .filter(|m| &m.item_id == item_id)
            .take(limit)
            .cloned()
            .collect())
    }
}
