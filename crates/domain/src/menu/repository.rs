//! Menu persistence contract.

use async_trait::async_trait;
use common::MenuItemId;
use serde::{Deserialize, Serialize};

use crate::memory::MemoryStore;
use crate::repository::{ListQuery, Page, Repository, RepositoryResult};

use super::Menu;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuFilter {
    pub is_active: Option<bool>,
}

#[async_trait]
pub trait MenuRepository: Repository<Menu> {
    /// By name.
    async fn list(&self, query: &ListQuery<MenuFilter>) -> RepositoryResult<Page<Menu>>;

    async fn find_active(&self) -> RepositoryResult<Option<Menu>>;

    /// Menus listing the dish.
    async fn find_by_item(&self, item_id: &MenuItemId) -> RepositoryResult<Vec<Menu>>;
}

pub type InMemoryMenuRepository = MemoryStore<Menu>;

#[async_trait]
impl MenuRepository for MemoryStore<Menu> {
    async fn list(&self, query: &ListQuery<MenuFilter>) -> RepositoryResult<Page<Menu>> {
        let mut menus = self
            .filter(|m| query.filter.is_active.is_none_or(|a| m.is_active() == a))
            .await;
        menus.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(Page::from_vec(menus, query.offset, query.limit))
    }

    async fn find_active(&self) -> RepositoryResult<Option<Menu>> {
        Ok(self.find_first(|m| m.is_active()).await)
    }

    async fn find_by_item(&self, item_id: &MenuItemId) -> RepositoryResult<Vec<Menu>> {
        Ok(self.filter(|m| m.contains_item(item_id)).await)
    }
}
