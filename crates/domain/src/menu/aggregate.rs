//! Menu aggregate.

use chrono::{DateTime, Utc};
use common::{CategoryId, MenuId, MenuItemId, Version};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;

use super::catalog::{same_name, validate_price};
use super::events::{ItemAvailabilityChangedData, MenuActivationData, MenuCreatedData};
use super::{Category, MenuError, MenuEvent, MenuItem, NewMenuItem};

/// A menu: categories of dishes.
///
/// `revision` counts catalog changes and only ever grows; `version` is the
/// storage concurrency token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    id: MenuId,

    #[serde(default)]
    version: Version,

    name: String,

    #[serde(default)]
    description: String,

    is_active: bool,

    revision: u64,

    categories: Vec<Category>,

    created_at: DateTime<Utc>,

    updated_at: DateTime<Utc>,
}

impl Aggregate for Menu {
    type Id = MenuId;
    type Event = MenuEvent;
    type Error = MenuError;

    fn aggregate_type() -> &'static str {
        "Menu"
    }

    fn id(&self) -> &MenuId {
        &self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

impl Menu {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Categories by sort order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, id: &CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| &c.id == id)
    }

    pub fn item(&self, id: &MenuItemId) -> Option<&MenuItem> {
        self.items().find(|i| &i.id == id)
    }

    pub fn items(&self) -> impl Iterator<Item = &MenuItem> {
        self.categories.iter().flat_map(|c| c.items.iter())
    }

    pub fn contains_item(&self, id: &MenuItemId) -> bool {
        self.item(id).is_some()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Menu {
    pub fn create(
        name: impl Into<String>,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(Self, Vec<MenuEvent>), MenuError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(MenuError::MissingName);
        }

        let menu = Self {
            id: MenuId::generate(),
            version: Version::initial(),
            name,
            description: description.into(),
            is_active: false,
            revision: 1,
            categories: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        let event = MenuEvent::MenuCreated(MenuCreatedData {
            menu_id: menu.id.clone(),
            name: menu.name.clone(),
            created_at: now,
        });
        Ok((menu, vec![event]))
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.revision += 1;
        self.updated_at = now;
    }

    fn item_mut(&mut self, id: &MenuItemId) -> Result<&mut MenuItem, MenuError> {
        self.categories
            .iter_mut()
            .flat_map(|c| c.items.iter_mut())
            .find(|i| &i.id == id)
            .ok_or_else(|| MenuError::ItemNotFound {
                item_id: id.to_string(),
            })
    }

    pub fn add_category(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        sort_order: i32,
        now: DateTime<Utc>,
    ) -> Result<CategoryId, MenuError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(MenuError::MissingName);
        }
        if self.categories.iter().any(|c| same_name(&c.name, &name)) {
            return Err(MenuError::DuplicateCategory { name });
        }

        let category = Category {
            id: CategoryId::generate(),
            name,
            description: description.into(),
            sort_order,
            items: Vec::new(),
        };
        let id = category.id.clone();

        self.categories.push(category);
        self.categories.sort_by_key(|c| c.sort_order);
        self.touch(now);
        Ok(id)
    }

    pub fn remove_category(
        &mut self,
        id: &CategoryId,
        now: DateTime<Utc>,
    ) -> Result<(), MenuError> {
        let index = self
            .categories
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| MenuError::CategoryNotFound {
                category_id: id.to_string(),
            })?;

        self.categories.remove(index);
        self.touch(now);
        Ok(())
    }

    pub fn add_item(
        &mut self,
        category_id: &CategoryId,
        item: NewMenuItem,
        now: DateTime<Utc>,
    ) -> Result<MenuItemId, MenuError> {
        let item = item.into_item()?;
        let category = self
            .categories
            .iter_mut()
            .find(|c| &c.id == category_id)
            .ok_or_else(|| MenuError::CategoryNotFound {
                category_id: category_id.to_string(),
            })?;
        if category.has_item_named(&item.name) {
            return Err(MenuError::DuplicateItem { name: item.name });
        }

        let id = item.id.clone();
        category.items.push(item);
        self.touch(now);
        Ok(id)
    }

    pub fn remove_item(&mut self, id: &MenuItemId, now: DateTime<Utc>) -> Result<(), MenuError> {
        let category = self
            .categories
            .iter_mut()
            .find(|c| c.items.iter().any(|i| &i.id == id))
            .ok_or_else(|| MenuError::ItemNotFound {
                item_id: id.to_string(),
            })?;

        category.items.retain(|i| &i.id != id);
        self.touch(now);
        Ok(())
    }

    pub fn update_item_price(
        &mut self,
        id: &MenuItemId,
        price: f64,
        now: DateTime<Utc>,
    ) -> Result<(), MenuError> {
        validate_price(price)?;
        self.item_mut(id)?.price = price;
        self.touch(now);
        Ok(())
    }

    /// Turns a dish on or off. Emits nothing when it is already so.
    pub fn set_item_availability(
        &mut self,
        id: &MenuItemId,
        available: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<MenuEvent>, MenuError> {
        let item = self.item_mut(id)?;
        if item.is_available == available {
            return Ok(Vec::new());
        }
        item.is_available = available;
        let name = item.name.clone();
        self.touch(now);

        Ok(vec![MenuEvent::ItemAvailabilityChanged(
            ItemAvailabilityChangedData {
                menu_id: self.id.clone(),
                menu_item_id: id.clone(),
                name,
                is_available: available,
                changed_at: now,
            },
        )])
    }

    fn activation(&self, now: DateTime<Utc>) -> MenuActivationData {
        MenuActivationData {
            menu_id: self.id.clone(),
            revision: self.revision,
            changed_at: now,
        }
    }

    pub fn activate(&mut self, now: DateTime<Utc>) -> Result<Vec<MenuEvent>, MenuError> {
        if self.is_active {
            return Ok(Vec::new());
        }
        self.is_active = true;
        self.touch(now);
        Ok(vec![MenuEvent::MenuActivated(self.activation(now))])
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) -> Result<Vec<MenuEvent>, MenuError> {
        if !self.is_active {
            return Ok(Vec::new());
        }
        self.is_active = false;
        self.touch(now);
        Ok(vec![MenuEvent::MenuDeactivated(self.activation(now))])
    }
}
