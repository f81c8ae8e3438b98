//! Keeps orders in step with their kitchen tickets.

use async_trait::async_trait;
use common::Context;
use domain::kitchen::{KitchenOrderStatus, KitchenOrderStatusChangedData};
use domain::order::{OrderService, OrderStatus};
use event_bus::EventEnvelope;

use crate::handler::{EventHandler, Outcome, decode};
use crate::Result;

const FORWARD: [OrderStatus; 5] = [
    OrderStatus::Created,
    OrderStatus::Paid,
    OrderStatus::Preparing,
    OrderStatus::Ready,
    OrderStatus::Completed,
];

/// Steps that take an order from `current` to `target`, or `None` when it
/// is already there or beyond. Orders that never got paid, or left the
/// forward path, get the single target step so the state machine rejects
/// it.
fn path_to(current: OrderStatus, target: OrderStatus) -> Option<Vec<OrderStatus>> {
    let position = |s: OrderStatus| FORWARD.iter().position(|f| *f == s);
    match (position(current), position(target)) {
        (Some(from), Some(to)) if from >= to => None,
        (Some(from), Some(to)) if from >= 1 => Some(FORWARD[from + 1..=to].to_vec()),
        _ if current == target => None,
        _ => Some(vec![target]),
    }
}

/// Consumes `KitchenOrderStatusChanged`.
#[derive(Clone)]
pub struct OrderStatusHandler {
    orders: OrderService,
}

impl OrderStatusHandler {
    pub fn new(orders: OrderService) -> Self {
        Self { orders }
    }

    async fn cancel(&self, ctx: &Context, data: &KitchenOrderStatusChangedData) -> Result<Outcome> {
        let order = self.orders.get_order(ctx, &data.order_id).await?;
        if order.status() == OrderStatus::Cancelled {
            return Ok(Outcome::Skipped);
        }
        self.orders
            .cancel_order(ctx, &data.order_id, Some("cancelled by kitchen".to_string()))
            .await?;
        Ok(Outcome::Applied)
    }

    async fn advance(
        &self,
        ctx: &Context,
        data: &KitchenOrderStatusChangedData,
        target: OrderStatus,
    ) -> Result<Outcome> {
        let order = self.orders.get_order(ctx, &data.order_id).await?;
        let Some(steps) = path_to(order.status(), target) else {
            return Ok(Outcome::Skipped);
        };
        self.orders
            .advance_status(ctx, &data.order_id, &steps)
            .await?;
        tracing::info!(order_id = %data.order_id, status = %target, "order follows kitchen");
        Ok(Outcome::Applied)
    }
}

#[async_trait]
impl EventHandler for OrderStatusHandler {
    fn name(&self) -> &'static str {
        "order_status"
    }

    fn event_types(&self) -> &'static [&'static str] {
        &["KitchenOrderStatusChanged"]
    }

    async fn handle(&self, ctx: &Context, event: &EventEnvelope) -> Result<Outcome> {
        let data: KitchenOrderStatusChangedData = decode(event)?;
        match data.new_status {
            KitchenOrderStatus::New => Ok(Outcome::Skipped),
            KitchenOrderStatus::Preparing => {
                self.advance(ctx, &data, OrderStatus::Preparing).await
            }
            KitchenOrderStatus::Ready | KitchenOrderStatus::Completed => {
                self.advance(ctx, &data, OrderStatus::Ready).await
            }
            KitchenOrderStatus::Cancelled => self.cancel(ctx, &data).await,
        }
    }
}
