//! Order service providing the application API for order operations.

use std::sync::Arc;

use common::{Clock, Context, OrderId, OrderItemId};
use event_bus::EventPublisher;

use crate::aggregate::Aggregate;
use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;
use crate::repository::{ListQuery, Page};

use super::{CreateOrder, NewOrderItem, Order, OrderFilter, OrderRepository, OrderStatus};

pub const SERVICE_NAME: &str = "order";

/// Service for managing orders.
///
/// Wraps the command handler; every mutating method loads the order,
/// applies one domain method, persists and publishes what it emitted.
#[derive(Clone)]
pub struct OrderService {
    handler: CommandHandler<Order, dyn OrderRepository>,
}

impl OrderService {
    pub fn new(
        repository: Arc<dyn OrderRepository>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            handler: CommandHandler::new(SERVICE_NAME, repository, publisher, clock),
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<Order, dyn OrderRepository> {
        &self.handler
    }

    fn repository(&self) -> &Arc<dyn OrderRepository> {
        self.handler.repository()
    }

    /// Opens an order, applying location, notes and initial lines before the
    /// first write.
    #[tracing::instrument(skip(self, ctx, cmd), fields(customer_id = %cmd.customer_id))]
    pub async fn create_order(
        &self,
        ctx: &Context,
        cmd: CreateOrder,
    ) -> Result<CommandResult<Order>, DomainError> {
        let now = self.handler.now();
        let (mut order, events) = Order::create(cmd.customer_id, cmd.order_type, now)?;

        if let Some(table_id) = cmd.table_id {
            order.set_table_id(table_id, now)?;
        }
        if let Some(address) = cmd.delivery_address {
            order.set_delivery_address(address, now)?;
        }
        if let Some(notes) = cmd.notes.as_deref() {
            order.add_notes(notes, now)?;
        }
        for item in cmd.items {
            order.add_item(item, now)?;
        }

        let result = self.handler.create(ctx, order, events).await?;
        tracing::info!(order_id = %result.aggregate.id(), "order created");
        Ok(result)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn get_order(&self, ctx: &Context, order_id: &OrderId) -> Result<Order, DomainError> {
        self.handler.load(ctx, order_id).await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn list_orders(
        &self,
        ctx: &Context,
        query: ListQuery<OrderFilter>,
    ) -> Result<Page<Order>, DomainError> {
        Ok(ctx.run(self.repository().list(&query)).await??)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn orders_for_customer(
        &self,
        ctx: &Context,
        customer_id: &str,
    ) -> Result<Vec<Order>, DomainError> {
        Ok(ctx
            .run(self.repository().find_by_customer(customer_id))
            .await??)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn add_item(
        &self,
        ctx: &Context,
        order_id: &OrderId,
        item: NewOrderItem,
    ) -> Result<(CommandResult<Order>, OrderItemId), DomainError> {
        self.handler
            .execute_returning(ctx, order_id, |order, now| {
                let item_id = order.add_item(item, now)?;
                Ok((item_id, Vec::new()))
            })
            .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn remove_item(
        &self,
        ctx: &Context,
        order_id: &OrderId,
        item_id: &OrderItemId,
    ) -> Result<CommandResult<Order>, DomainError> {
        self.handler
            .execute(ctx, order_id, |order, now| {
                order.remove_item(item_id, now).map(|_| Vec::new())
            })
            .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn update_item_quantity(
        &self,
        ctx: &Context,
        order_id: &OrderId,
        item_id: &OrderItemId,
        quantity: i32,
    ) -> Result<CommandResult<Order>, DomainError> {
        self.handler
            .execute(ctx, order_id, |order, now| {
                order
                    .update_item_quantity(item_id, quantity, now)
                    .map(|_| Vec::new())
            })
            .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn set_table_id(
        &self,
        ctx: &Context,
        order_id: &OrderId,
        table_id: String,
    ) -> Result<CommandResult<Order>, DomainError> {
        self.handler
            .execute(ctx, order_id, |order, now| {
                order.set_table_id(table_id, now).map(|_| Vec::new())
            })
            .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn set_delivery_address(
        &self,
        ctx: &Context,
        order_id: &OrderId,
        address: String,
    ) -> Result<CommandResult<Order>, DomainError> {
        self.handler
            .execute(ctx, order_id, |order, now| {
                order.set_delivery_address(address, now).map(|_| Vec::new())
            })
            .await
    }

    #[tracing::instrument(skip(self, ctx, notes))]
    pub async fn add_notes(
        &self,
        ctx: &Context,
        order_id: &OrderId,
        notes: String,
    ) -> Result<CommandResult<Order>, DomainError> {
        self.handler
            .execute(ctx, order_id, |order, now| {
                order.add_notes(&notes, now).map(|_| Vec::new())
            })
            .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn update_status(
        &self,
        ctx: &Context,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> Result<CommandResult<Order>, DomainError> {
        self.handler
            .execute(ctx, order_id, |order, now| order.update_status(status, now))
            .await
    }

    /// Applies several forward transitions in one write.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn advance_status(
        &self,
        ctx: &Context,
        order_id: &OrderId,
        steps: &[OrderStatus],
    ) -> Result<CommandResult<Order>, DomainError> {
        self.handler
            .execute(ctx, order_id, |order, now| order.advance_through(steps, now))
            .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn cancel_order(
        &self,
        ctx: &Context,
        order_id: &OrderId,
        reason: Option<String>,
    ) -> Result<CommandResult<Order>, DomainError> {
        self.handler
            .execute(ctx, order_id, |order, now| order.cancel(reason, now))
            .await
    }
}
