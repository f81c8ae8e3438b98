//! Inventory item aggregate.

use chrono::{DateTime, Utc};
use common::{InventoryItemId, MenuItemId, MovementId, SupplierId, Version};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;

use super::events::{InventoryItemCreatedData, StockAlertData, StockReceivedData};
use super::{InventoryError, InventoryEvent, Movement, MovementType, StockLevel};

/// A stocked ingredient or supply.
///
/// `available = currentStock - reservedStock`. Alerts fire when the level
/// changes into LOW or OUT, never while it stays there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    id: InventoryItemId,

    #[serde(default)]
    version: Version,

    sku: String,

    name: String,

    unit: String,

    current_stock: f64,

    reserved_stock: f64,

    minimum_stock: f64,

    cost_per_unit: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    supplier_id: Option<SupplierId>,

    /// Dishes that cannot be served without this item.
    #[serde(default)]
    menu_item_ids: Vec<MenuItemId>,

    is_active: bool,

    created_at: DateTime<Utc>,

    updated_at: DateTime<Utc>,
}

impl Aggregate for InventoryItem {
    type Id = InventoryItemId;
    type Event = InventoryEvent;
    type Error = InventoryError;

    fn aggregate_type() -> &'static str {
        "InventoryItem"
    }

    fn id(&self) -> &InventoryItemId {
        &self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

/// Input for a new inventory item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInventoryItem {
    pub sku: String,
    pub name: String,
    pub unit: String,
    #[serde(default)]
    pub initial_stock: f64,
    #[serde(default)]
    pub minimum_stock: f64,
    #[serde(default)]
    pub cost_per_unit: f64,
    #[serde(default)]
    pub supplier_id: Option<SupplierId>,
    #[serde(default)]
    pub menu_item_ids: Vec<MenuItemId>,
}

impl NewInventoryItem {
    pub fn new(sku: impl Into<String>, name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            sku: sku.into(),
            name: name.into(),
            unit: unit.into(),
            initial_stock: 0.0,
            minimum_stock: 0.0,
            cost_per_unit: 0.0,
            supplier_id: None,
            menu_item_ids: Vec::new(),
        }
    }

    pub fn stock(mut self, initial: f64, minimum: f64) -> Self {
        self.initial_stock = initial;
        self.minimum_stock = minimum;
        self
    }

    pub fn for_menu_item(mut self, menu_item_id: impl Into<MenuItemId>) -> Self {
        self.menu_item_ids.push(menu_item_id.into());
        self
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), InventoryError> {
    if !value.is_finite() || value < 0.0 {
        return Err(InventoryError::NegativeValue { field, value });
    }
    Ok(())
}

fn positive(quantity: f64) -> Result<(), InventoryError> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(InventoryError::InvalidQuantity { quantity });
    }
    Ok(())
}

// Queries
impl InventoryItem {
    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn current_stock(&self) -> f64 {
        self.current_stock
    }

    pub fn reserved_stock(&self) -> f64 {
        self.reserved_stock
    }

    pub fn available_stock(&self) -> f64 {
        self.current_stock - self.reserved_stock
    }

    pub fn minimum_stock(&self) -> f64 {
        self.minimum_stock
    }

    pub fn cost_per_unit(&self) -> f64 {
        self.cost_per_unit
    }

    /// Value of the stock on hand.
    pub fn stock_value(&self) -> f64 {
        self.current_stock * self.cost_per_unit
    }

    pub fn supplier_id(&self) -> Option<&SupplierId> {
        self.supplier_id.as_ref()
    }

    pub fn menu_item_ids(&self) -> &[MenuItemId] {
        &self.menu_item_ids
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn level(&self) -> StockLevel {
        StockLevel::of(self.available_stock(), self.minimum_stock)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

// Command methods
impl InventoryItem {
    pub fn create(
        input: NewInventoryItem,
        now: DateTime<Utc>,
    ) -> Result<(Self, Vec<InventoryEvent>), InventoryError> {
        let sku = input.sku.trim().to_string();
        let name = input.name.trim().to_string();
        if sku.is_empty() {
            return Err(InventoryError::MissingSku);
        }
        if name.is_empty() {
            return Err(InventoryError::MissingName);
        }
        non_negative("initialStock", input.initial_stock)?;
        non_negative("minimumStock", input.minimum_stock)?;
        non_negative("costPerUnit", input.cost_per_unit)?;

        let item = Self {
            id: InventoryItemId::generate(),
            version: Version::initial(),
            sku,
            name,
            unit: input.unit,
            current_stock: input.initial_stock,
            reserved_stock: 0.0,
            minimum_stock: input.minimum_stock,
            cost_per_unit: input.cost_per_unit,
            supplier_id: input.supplier_id,
            menu_item_ids: input.menu_item_ids,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let event = InventoryEvent::InventoryItemCreated(InventoryItemCreatedData {
            item_id: item.id.clone(),
            sku: item.sku.clone(),
            name: item.name.clone(),
            created_at: now,
        });
        Ok((item, vec![event]))
    }

    fn ensure_active(&self) -> Result<(), InventoryError> {
        if !self.is_active {
            return Err(InventoryError::Inactive {
                sku: self.sku.clone(),
            });
        }
        Ok(())
    }

    fn ensure_available(&self, requested: f64) -> Result<(), InventoryError> {
        if requested > self.available_stock() {
            return Err(InventoryError::InsufficientStock {
                sku: self.sku.clone(),
                requested,
                available: self.available_stock(),
            });
        }
        Ok(())
    }

    fn movement(
        &self,
        movement_type: MovementType,
        quantity: f64,
        reason: &str,
        reference: Option<String>,
        now: DateTime<Utc>,
    ) -> Movement {
        Movement {
            id: MovementId::generate(),
            item_id: self.id.clone(),
            movement_type,
            quantity,
            reason: reason.to_string(),
            reference,
            created_at: now,
        }
    }

    /// Alert for entering `level`, if it is one that warrants one.
    fn alert_for(&self, previous: StockLevel, now: DateTime<Utc>) -> Option<InventoryEvent> {
        let level = self.level();
        if level == previous {
            return None;
        }

        let data = StockAlertData {
            item_id: self.id.clone(),
            sku: self.sku.clone(),
            name: self.name.clone(),
            available_stock: self.available_stock(),
            minimum_stock: self.minimum_stock,
            menu_item_ids: self.menu_item_ids.clone(),
            raised_at: now,
        };
        match level {
            StockLevel::Low => Some(InventoryEvent::LowStockAlert(data)),
            StockLevel::Out => Some(InventoryEvent::OutOfStockAlert(data)),
            StockLevel::Ok => None,
        }
    }

    fn stock_received(&self, quantity: f64, now: DateTime<Utc>) -> InventoryEvent {
        InventoryEvent::StockReceived(StockReceivedData {
            item_id: self.id.clone(),
            sku: self.sku.clone(),
            quantity,
            current_stock: self.current_stock,
            available_stock: self.available_stock(),
            level: self.level(),
            menu_item_ids: self.menu_item_ids.clone(),
            received_at: now,
        })
    }

    /// Restock signal for any change that brings the item back from OUT.
    fn restocked(
        &self,
        previous: StockLevel,
        quantity: f64,
        now: DateTime<Utc>,
    ) -> Option<InventoryEvent> {
        (previous == StockLevel::Out && self.level() != StockLevel::Out)
            .then(|| self.stock_received(quantity, now))
    }

    /// Adds delivered stock.
    pub fn receive(
        &mut self,
        quantity: f64,
        reference: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(Movement, Vec<InventoryEvent>), InventoryError> {
        positive(quantity)?;
        self.ensure_active()?;

        let previous = self.level();
        self.current_stock += quantity;
        self.updated_at = now;

        let mut events = vec![self.stock_received(quantity, now)];
        events.extend(self.alert_for(previous, now));

        let movement = self.movement(MovementType::In, quantity, "received", reference, now);
        Ok((movement, events))
    }

    /// Takes stock out for use.
    pub fn consume(
        &mut self,
        quantity: f64,
        reason: &str,
        reference: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(Movement, Vec<InventoryEvent>), InventoryError> {
        positive(quantity)?;
        self.ensure_active()?;
        self.ensure_available(quantity)?;

        let previous = self.level();
        self.current_stock -= quantity;
        self.updated_at = now;

        let events = self.alert_for(previous, now).into_iter().collect();
        let movement = self.movement(MovementType::Out, quantity, reason, reference, now);
        Ok((movement, events))
    }

    /// Writes off spoiled or broken stock.
    pub fn record_waste(
        &mut self,
        quantity: f64,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<(Movement, Vec<InventoryEvent>), InventoryError> {
        positive(quantity)?;
        self.ensure_available(quantity)?;

        let previous = self.level();
        self.current_stock -= quantity;
        self.updated_at = now;

        let events = self.alert_for(previous, now).into_iter().collect();
        let movement = self.movement(MovementType::Waste, quantity, reason, None, now);
        Ok((movement, events))
    }

    /// Sets the counted stock. The movement records the signed difference.
    pub fn adjust(
        &mut self,
        counted: f64,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<(Movement, Vec<InventoryEvent>), InventoryError> {
        non_negative("currentStock", counted)?;

        let previous = self.level();
        let delta = counted - self.current_stock;
        self.current_stock = counted;
        self.updated_at = now;

        let mut events: Vec<InventoryEvent> =
            self.restocked(previous, delta, now).into_iter().collect();
        events.extend(self.alert_for(previous, now));
        let movement = self.movement(MovementType::Adjustment, delta, reason, None, now);
        Ok((movement, events))
    }

    /// Sets stock aside for a pending use.
    pub fn reserve(
        &mut self,
        quantity: f64,
        reference: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(Movement, Vec<InventoryEvent>), InventoryError> {
        positive(quantity)?;
        self.ensure_active()?;
        self.ensure_available(quantity)?;

        let previous = self.level();
        self.reserved_stock += quantity;
        self.updated_at = now;

        let events = self.alert_for(previous, now).into_iter().collect();
        let movement = self.movement(MovementType::Reserved, quantity, "reserved", reference, now);
        Ok((movement, events))
    }

    /// Returns reserved stock to the available pool.
    pub fn release(
        &mut self,
        quantity: f64,
        reference: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(Movement, Vec<InventoryEvent>), InventoryError> {
        positive(quantity)?;
        if quantity > self.reserved_stock {
            return Err(InventoryError::ReleaseExceedsReserved {
                requested: quantity,
                reserved: self.reserved_stock,
            });
        }

        let previous = self.level();
        self.reserved_stock -= quantity;
        self.updated_at = now;

        let mut events: Vec<InventoryEvent> =
            self.restocked(previous, quantity, now).into_iter().collect();
        events.extend(self.alert_for(previous, now));
        let movement = self.movement(MovementType::Released, quantity, "released", reference, now);
        Ok((movement, events))
    }

    pub fn update_minimum_stock(
        &mut self,
        minimum: f64,
        now: DateTime<Utc>,
    ) -> Result<Vec<InventoryEvent>, InventoryError> {
        non_negative("minimumStock", minimum)?;
        let previous = self.level();
        self.minimum_stock = minimum;
        self.updated_at = now;
        Ok(self.alert_for(previous, now).into_iter().collect())
    }

    pub fn link_menu_item(&mut self, menu_item_id: MenuItemId, now: DateTime<Utc>) {
        if !self.menu_item_ids.contains(&menu_item_id) {
            self.menu_item_ids.push(menu_item_id);
            self.updated_at = now;
        }
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.is_active = false;
        self.updated_at = now;
    }
}
