//! Menus, stored with their categories and items in the document.

use async_trait::async_trait;
use common::MenuItemId;
use domain::menu::{Menu, MenuFilter, MenuRepository};
use domain::{ListQuery, Page, RepositoryResult};

use crate::document::{Column, Document, PgStore};

pub type PgMenuRepository = PgStore<Menu>;

impl Document for Menu {
    const TABLE: &'static str = "menus";

    fn columns(&self) -> Vec<(&'static str, Column)> {
        vec![
            ("name", Column::text(self.name())),
            ("is_active", Column::Bool(self.is_active())),
        ]
    }
}

#[async_trait]
impl MenuRepository for PgStore<Menu> {
    async fn list(&self, query: &ListQuery<MenuFilter>) -> RepositoryResult<Page<Menu>> {
        self.select()
            .filter_opt("is_active = {}", query.filter.is_active, Column::Bool)
            .order_by("name, id")
            .fetch_page(self.pool(), query.offset, query.limit)
            .await
    }

    async fn find_active(&self) -> RepositoryResult<Option<Menu>> {
        self.select()
            .condition("is_active")
            .fetch_optional(self.pool())
            .await
    }

    async fn find_by_item(&self, item_id: &MenuItemId) -> RepositoryResult<Vec<Menu>> {
        self.select()
            .filter(
                "jsonb_path_exists(document, '$.categories[*].items[*] ? (@.id == $item)', \
                 jsonb_build_object('item', {}::text))",
                Column::text(item_id.as_str()),
            )
            .order_by("name, id")
            .fetch_all(self.pool())
            .await
    }
}
