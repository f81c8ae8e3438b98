//! Inventory item persistence contract.

use async_trait::async_trait;
use common::{MenuItemId, SupplierId};
use serde::{Deserialize, Serialize};

use crate::memory::MemoryStore;
use crate::repository::{ListQuery, Page, Repository, RepositoryResult};

use super::{InventoryItem, StockLevel};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryFilter {
    pub level: Option<StockLevel>,
    pub supplier_id: Option<SupplierId>,
    pub is_active: Option<bool>,
}

impl InventoryFilter {
    fn matches(&self, item: &InventoryItem) -> bool {
        self.level.is_none_or(|l| item.level() == l)
            && self
                .supplier_id
                .as_ref()
                .is_none_or(|s| item.supplier_id() == Some(s))
            && self.is_active.is_none_or(|a| item.is_active() == a)
    }
}

#[async_trait]
pub trait InventoryRepository: Repository<InventoryItem> {
    /// By SKU.
    async fn list(&self, query: &ListQuery<InventoryFilter>)
    -> RepositoryResult<Page<InventoryItem>>;

    async fn find_by_sku(&self, sku: &str) -> RepositoryResult<Option<InventoryItem>>;

    /// Active items at LOW or OUT, emptiest first.
    async fn find_low_stock(&self) -> RepositoryResult<Vec<InventoryItem>>;

    /// Items a dish depends on.
    async fn find_by_menu_item(&self, menu_item_id: &MenuItemId)
    -> RepositoryResult<Vec<InventoryItem>>;
}

pub type InMemoryInventoryRepository = MemoryStore<InventoryItem>;

#[async_trait]
impl InventoryRepository for MemoryStore<InventoryItem> {
    async fn list(
        &self,
        query: &ListQuery<InventoryFilter>,
    ) -> RepositoryResult<Page<InventoryItem>> {
        let mut items = self.filter(|i| query.filter.matches(i)).await;
        items.sort_by(|a, b| a.sku().cmp(b.sku()));
        Ok(Page::from_vec(items, query.offset, query.limit))
    }

    async fn find_by_sku(&self, sku: &str) -> RepositoryResult<Option<InventoryItem>> {
        Ok(self.find_first(|i| i.sku() == sku).await)
    }

    async fn find_low_stock(&self) -> RepositoryResult<Vec<InventoryItem>> {
        let mut items = self
            .filter(|i| i.is_active() && i.level() != StockLevel::Ok)
            .await;
        items.sort_by(|a, b| a.available_stock().total_cmp(&b.available_stock()));
        Ok(items)
    }

    async fn find_by_menu_item(
        &self,
        menu_item_id: &MenuItemId,
    ) -> RepositoryResult<Vec<InventoryItem>> {
        Ok(self
            .filter(|i| i.menu_item_ids().contains(menu_item_id))
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::NewInventoryItem;
    use chrono::Utc;

    async fn store(repo: &InMemoryInventoryRepository, sku: &str, initial: f64, minimum: f64) {
        let (item, _) = InventoryItem::create(
            NewInventoryItem::new(sku, sku, "kg").stock(initial, minimum),
            Utc::now(),
        )
        .unwrap();
        repo.insert(&item).await.unwrap();
    }

    #[tokio::test]
    async fn low_stock_is_emptiest_first() {
        let repo = InMemoryInventoryRepository::new();
        store(&repo, "A", 10.0, 2.0).await;
        store(&repo, "B", 2.0, 5.0).await;
        store(&repo, "C", 0.0, 5.0).await;

        let low: Vec<String> = repo
            .find_low_stock()
            .await
            .unwrap()
            .iter()
            .map(|i| i.sku().to_string())
            .collect();
        assert_eq!(low, ["C", "B"]);

        let out = repo
            .list(&ListQuery::new(InventoryFilter {
                level: Some(StockLevel::Out),
                ..InventoryFilter::default()
            }))
            .await
            .unwrap();
        assert_eq!(out.total, 1);
        assert!(repo.find_by_sku("B").await.unwrap().is_some());
    }
}
