//! Order line items and pricing.

use common::{MenuItemId, OrderItemId};
use serde::{Deserialize, Serialize};

use super::OrderError;

/// Tax applied on top of the item subtotal.
pub const TAX_RATE: f64 = 0.10;

/// A line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub(crate) id: OrderItemId,
    pub(crate) menu_item_id: MenuItemId,
    pub(crate) name: String,
    pub(crate) quantity: i32,
    pub(crate) unit_price: f64,
    #[serde(default)]
    pub(crate) modifications: Vec<String>,
    #[serde(default)]
    pub(crate) notes: String,
    pub(crate) subtotal: f64,
}

impl OrderItem {
    pub(crate) fn from_new(item: NewOrderItem) -> Result<Self, OrderError> {
        item.validate()?;
        let mut line = Self {
            id: OrderItemId::generate(),
            menu_item_id: item.menu_item_id,
            name: item.name.trim().to_string(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            modifications: normalize_modifications(item.modifications),
            notes: item.notes,
            subtotal: 0.0,
        };
        line.recalculate();
        Ok(line)
    }

    pub(crate) fn set_quantity(&mut self, quantity: i32) -> Result<(), OrderError> {
        if quantity < 1 {
            return Err(OrderError::InvalidQuantity { quantity });
        }
        self.quantity = quantity;
        self.recalculate();
        Ok(())
    }

    fn recalculate(&mut self) {
        self.subtotal = f64::from(self.quantity) * self.unit_price;
    }

    pub fn id(&self) -> &OrderItemId {
        &self.id
    }

    pub fn menu_item_id(&self) -> &MenuItemId {
        &self.menu_item_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    pub fn unit_price(&self) -> f64 {
        self.unit_price
    }

    pub fn modifications(&self) -> &[String] {
        &self.modifications
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn subtotal(&self) -> f64 {
        self.subtotal
    }

    /// Compares modifications as sets; order and repetition are ignored.
    pub fn same_modifications(&self, other: &[String]) -> bool {
        let mut mine: Vec<&str> = self.modifications.iter().map(String::as_str).collect();
        let mut theirs: Vec<&str> = other
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .collect();
        mine.sort_unstable();
        mine.dedup();
        theirs.sort_unstable();
        theirs.dedup();
        mine == theirs
    }
}

/// Input for adding a line to an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub quantity: i32,
    pub unit_price: f64,
    #[serde(default)]
    pub modifications: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

impl NewOrderItem {
    pub fn new(
        menu_item_id: impl Into<MenuItemId>,
        name: impl Into<String>,
        quantity: i32,
        unit_price: f64,
    ) -> Self {
        Self {
            menu_item_id: menu_item_id.into(),
            name: name.into(),
            quantity,
            unit_price,
            modifications: Vec::new(),
            notes: String::new(),
        }
    }

    pub fn with_modifications<I, S>(mut self, modifications: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modifications = modifications.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    fn validate(&self) -> Result<(), OrderError> {
        if self.menu_item_id.is_empty() {
            return Err(OrderError::MissingMenuItem);
        }
        if self.name.trim().is_empty() {
            return Err(OrderError::MissingItemName);
        }
        if self.quantity < 1 {
            return Err(OrderError::InvalidQuantity {
                quantity: self.quantity,
            });
        }
        if !self.unit_price.is_finite() || self.unit_price < 0.0 {
            return Err(OrderError::InvalidPrice {
                price: self.unit_price,
            });
        }
        Ok(())
    }
}

/// Trims, drops blanks and removes duplicates while keeping first-seen order.
fn normalize_modifications(modifications: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(modifications.len());
    for m in modifications {
        let m = m.trim();
        if !m.is_empty() && !seen.iter().any(|s: &String| s == m) {
            seen.push(m.to_string());
        }
    }
    seen
}

/// Subtotal, tax and total of a set of lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pricing {
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
}

impl Pricing {
    pub fn of(items: &[OrderItem]) -> Self {
        let subtotal: f64 = items.iter().map(|i| i.subtotal).sum();
        let tax = subtotal * TAX_RATE;
        Self {
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtotal_is_quantity_times_price() {
        let item = OrderItem::from_new(NewOrderItem::new("m1", "Salad", 2, 10.0)).unwrap();
        assert_eq!(item.subtotal(), 20.0);
        assert!(item.id().has_prefix());
    }

    #[test]
    fn rejects_invalid_lines() {
        assert!(matches!(
            OrderItem::from_new(NewOrderItem::new("m1", "Salad", 0, 10.0)),
            Err(OrderError::InvalidQuantity { quantity: 0 })
        ));
        assert!(matches!(
            OrderItem::from_new(NewOrderItem::new("m1", "Salad", 1, -0.5)),
            Err(OrderError::InvalidPrice { .. })
        ));
        assert!(matches!(
            OrderItem::from_new(NewOrderItem::new("", "Salad", 1, 1.0)),
            Err(OrderError::MissingMenuItem)
        ));
        assert!(matches!(
            OrderItem::from_new(NewOrderItem::new("m1", "  ", 1, 1.0)),
            Err(OrderError::MissingItemName)
        ));
        assert!(OrderItem::from_new(NewOrderItem::new("m1", "Water", 1, 0.0)).is_ok());
    }

    #[test]
    fn modifications_are_set_like_but_keep_order() {
        let item = OrderItem::from_new(
            NewOrderItem::new("m1", "Burger", 1, 12.0)
                .with_modifications(["no onion", " extra cheese ", "no onion", ""]),
        )
        .unwrap();

        assert_eq!(item.modifications(), ["no onion", "extra cheese"]);
        assert!(item.same_modifications(&["extra cheese".into(), "no onion".into()]));
        assert!(!item.same_modifications(&["no onion".into()]));
    }

    #[test]
    fn pricing_adds_ten_percent_tax() {
        let items = vec![
            OrderItem::from_new(NewOrderItem::new("m1", "Salad", 2, 10.0)).unwrap(),
            OrderItem::from_new(NewOrderItem::new("m2", "Pasta", 1, 15.0)).unwrap(),
        ];
        let pricing = Pricing::of(&items);
        assert!((pricing.subtotal - 35.0).abs() < 1e-9);
        assert!((pricing.tax - 3.5).abs() < 1e-9);
        assert!((pricing.total - 38.5).abs() < 1e-9);
    }
}
