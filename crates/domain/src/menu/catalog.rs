//! Categories and dishes of a menu.

use std::time::Duration;

use common::{CategoryId, MenuItemId};
use serde::{Deserialize, Serialize};

use super::MenuError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub(crate) id: CategoryId,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) sort_order: i32,
    #[serde(default)]
    pub(crate) items: Vec<MenuItem>,
}

impl Category {
    pub fn id(&self) -> &CategoryId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn sort_order(&self) -> i32 {
        self.sort_order
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub(crate) fn has_item_named(&self, name: &str) -> bool {
        self.items.iter().any(|i| same_name(&i.name, name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub(crate) id: MenuItemId,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) description: String,
    pub(crate) price: f64,
    #[serde(with = "common::serde_secs")]
    pub(crate) prep_time: Duration,
    pub(crate) is_available: bool,
    #[serde(default)]
    pub(crate) allergens: Vec<String>,
}

impl MenuItem {
    pub fn id(&self) -> &MenuItemId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn prep_time(&self) -> Duration {
        self.prep_time
    }

    pub fn is_available(&self) -> bool {
        self.is_available
    }

    pub fn allergens(&self) -> &[String] {
        &self.allergens
    }
}

/// Input for a new dish. Dishes start available.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMenuItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(with = "common::serde_secs")]
    pub prep_time: Duration,
    #[serde(default)]
    pub allergens: Vec<String>,
}

impl NewMenuItem {
    pub fn new(name: impl Into<String>, price: f64, prep_time: Duration) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            price,
            prep_time,
            allergens: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_allergens<I, S>(mut self, allergens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allergens = allergens.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn into_item(self) -> Result<MenuItem, MenuError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(MenuError::MissingName);
        }
        validate_price(self.price)?;

        Ok(MenuItem {
            id: MenuItemId::generate(),
            name,
            description: self.description,
            price: self.price,
            prep_time: self.prep_time,
            is_available: true,
            allergens: self.allergens,
        })
    }
}

pub(crate) fn validate_price(price: f64) -> Result<(), MenuError> {
    if !price.is_finite() || price < 0.0 {
        return Err(MenuError::InvalidPrice { price });
    }
    Ok(())
}

/// Names are unique case-insensitively, ignoring surrounding blanks.
pub(crate) fn same_name(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}
