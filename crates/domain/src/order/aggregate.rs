//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{OrderId, OrderItemId, Version};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;

use super::events::{
    OrderCancelledData, OrderCompletedData, OrderCreatedData, OrderPaidData, PaidItem,
};
use super::{NewOrderItem, OrderError, OrderEvent, OrderItem, OrderStatus, OrderType, Pricing};

/// Order aggregate root.
///
/// Totals are derived: every items mutation recomputes `taxAmount` and
/// `totalAmount` from the lines. The serialized form is the persisted
/// shape; repositories store `items` as one JSON column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: OrderId,

    #[serde(default)]
    version: Version,

    customer_id: String,

    #[serde(rename = "type")]
    order_type: OrderType,

    status: OrderStatus,

    items: Vec<OrderItem>,

    total_amount: f64,

    tax_amount: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    table_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    delivery_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,

    created_at: DateTime<Utc>,

    updated_at: DateTime<Utc>,
}

impl Aggregate for Order {
    type Id = OrderId;
    type Event = OrderEvent;
    type Error = OrderError;

    fn aggregate_type() -> &'static str {
        "Order"
    }

    fn id(&self) -> &OrderId {
        &self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

// Query methods
impl Order {
    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn get_item(&self, item_id: &OrderItemId) -> Option<&OrderItem> {
        self.items.iter().find(|i| &i.id == item_id)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of line subtotals before tax.
    pub fn subtotal(&self) -> f64 {
        self.items.iter().map(|i| i.subtotal).sum()
    }

    pub fn total_amount(&self) -> f64 {
        self.total_amount
    }

    pub fn tax_amount(&self) -> f64 {
        self.tax_amount
    }

    pub fn table_id(&self) -> Option<&str> {
        self.table_id.as_deref()
    }

    pub fn delivery_address(&self) -> Option<&str> {
        self.delivery_address.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// Command methods
impl Order {
    /// Opens a new order.
    pub fn create(
        customer_id: impl Into<String>,
        order_type: OrderType,
        now: DateTime<Utc>,
    ) -> Result<(Self, Vec<OrderEvent>), OrderError> {
        let customer_id = customer_id.into();
        if customer_id.trim().is_empty() {
            return Err(OrderError::MissingCustomer);
        }

        let order = Self {
            id: OrderId::generate(),
            version: Version::initial(),
            customer_id,
            order_type,
            status: OrderStatus::Created,
            items: Vec::new(),
            total_amount: 0.0,
            tax_amount: 0.0,
            table_id: None,
            delivery_address: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };

        let event = OrderEvent::OrderCreated(OrderCreatedData {
            order_id: order.id.clone(),
            customer_id: order.customer_id.clone(),
            order_type,
            created_at: now,
        });
        Ok((order, vec![event]))
    }

    fn ensure_modifiable(&self) -> Result<(), OrderError> {
        if !self.status.can_modify_items() {
            return Err(OrderError::NotModifiable {
                status: self.status,
            });
        }
        Ok(())
    }

    fn recalculate(&mut self) {
        let pricing = Pricing::of(&self.items);
        self.tax_amount = pricing.tax;
        self.total_amount = pricing.total;
    }

    /// Appends a line; returns its id.
    pub fn add_item(
        &mut self,
        item: NewOrderItem,
        now: DateTime<Utc>,
    ) -> Result<OrderItemId, OrderError> {
        self.ensure_modifiable()?;
        let line = OrderItem::from_new(item)?;
        let id = line.id.clone();

        self.items.push(line);
        self.recalculate();
        self.updated_at = now;
        Ok(id)
    }

    pub fn remove_item(
        &mut self,
        item_id: &OrderItemId,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        self.ensure_modifiable()?;
        let index = self
            .items
            .iter()
            .position(|i| &i.id == item_id)
            .ok_or_else(|| OrderError::ItemNotFound {
                item_id: item_id.to_string(),
            })?;

        self.items.remove(index);
        self.recalculate();
        self.updated_at = now;
        Ok(())
    }

    pub fn update_item_quantity(
        &mut self,
        item_id: &OrderItemId,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        self.ensure_modifiable()?;
        if quantity < 1 {
            return Err(OrderError::InvalidQuantity { quantity });
        }

        let item = self
            .items
            .iter_mut()
            .find(|i| &i.id == item_id)
            .ok_or_else(|| OrderError::ItemNotFound {
                item_id: item_id.to_string(),
            })?;
        item.set_quantity(quantity)?;

        self.recalculate();
        self.updated_at = now;
        Ok(())
    }

    pub fn set_table_id(
        &mut self,
        table_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        if self.order_type != OrderType::DineIn {
            return Err(OrderError::InvalidOrderType {
                operation: "set table",
                order_type: self.order_type,
            });
        }
        let table_id = table_id.into();
        if table_id.trim().is_empty() {
            return Err(OrderError::EmptyTableId);
        }
        if self.is_terminal() {
            return Err(OrderError::NotModifiable {
                status: self.status,
            });
        }

        self.table_id = Some(table_id);
        self.updated_at = now;
        Ok(())
    }

    pub fn set_delivery_address(
        &mut self,
        address: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        if self.order_type != OrderType::Delivery {
            return Err(OrderError::InvalidOrderType {
                operation: "set delivery address",
                order_type: self.order_type,
            });
        }
        let address = address.into();
        if address.trim().is_empty() {
            return Err(OrderError::EmptyDeliveryAddress);
        }
        if self.is_terminal() {
            return Err(OrderError::NotModifiable {
                status: self.status,
            });
        }

        self.delivery_address = Some(address);
        self.updated_at = now;
        Ok(())
    }

    /// Appends a note; existing notes are kept on separate lines.
    pub fn add_notes(&mut self, notes: &str, now: DateTime<Utc>) -> Result<(), OrderError> {
        let notes = notes.trim();
        if notes.is_empty() {
            return Err(OrderError::EmptyNotes);
        }

        self.notes = Some(match self.notes.take() {
            Some(existing) => format!("{existing}\n{notes}"),
            None => notes.to_string(),
        });
        self.updated_at = now;
        Ok(())
    }

    /// Checks the order is complete enough to be paid.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.customer_id.trim().is_empty() {
            return Err(OrderError::MissingCustomer);
        }
        if self.items.is_empty() {
            return Err(OrderError::NoItems);
        }
        match self.order_type {
            OrderType::DineIn if self.table_id.is_none() => Err(OrderError::MissingTableId),
            OrderType::Delivery if self.delivery_address.is_none() => {
                Err(OrderError::MissingDeliveryAddress)
            }
            _ => Ok(()),
        }
    }

    /// Moves the order to `next` along the status graph.
    ///
    /// Entering PAID runs [`validate`](Self::validate) first. Moving to
    /// CANCELLED behaves like [`cancel`](Self::cancel).
    pub fn update_status(
        &mut self,
        next: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if next == OrderStatus::Cancelled {
            return self.cancel(None, now);
        }
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidStatusTransition {
                from: self.status,
                to: next,
            });
        }
        if next == OrderStatus::Paid {
            self.validate()?;
        }

        let previous = self.status;
        self.status = next;
        self.updated_at = now;

        let mut events = vec![OrderEvent::status_changed(&self.id, previous, next, now)];
        match next {
            OrderStatus::Paid => events.push(OrderEvent::OrderPaid(OrderPaidData {
                order_id: self.id.clone(),
                customer_id: self.customer_id.clone(),
                order_type: self.order_type,
                table_id: self.table_id.clone(),
                total_amount: self.total_amount,
                items: self.items.iter().map(PaidItem::from).collect(),
                paid_at: now,
            })),
            OrderStatus::Completed => {
                events.push(OrderEvent::OrderCompleted(OrderCompletedData {
                    order_id: self.id.clone(),
                    total_amount: self.total_amount,
                    completed_at: now,
                }))
            }
            _ => {}
        }
        Ok(events)
    }

    /// Applies several forward steps as one mutation.
    pub fn advance_through(
        &mut self,
        steps: &[OrderStatus],
        now: DateTime<Utc>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let mut events = Vec::new();
        for step in steps {
            events.extend(self.update_status(*step, now)?);
        }
        Ok(events)
    }

    pub fn cancel(
        &mut self,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if !self.status.can_cancel() {
            return Err(OrderError::NotCancellable {
                status: self.status,
            });
        }

        let previous = self.status;
        self.status = OrderStatus::Cancelled;
        self.updated_at = now;

        Ok(vec![
            OrderEvent::status_changed(&self.id, previous, OrderStatus::Cancelled, now),
            OrderEvent::OrderCancelled(OrderCancelledData {
                order_id: self.id.clone(),
                previous_status: previous,
                reason,
                cancelled_at: now,
            }),
        ])
    }
}
