//! Opens and closes kitchen tickets as orders are paid or cancelled.

use std::time::Duration;

use async_trait::async_trait;
use common::Context;
use domain::kitchen::{CreateKitchenOrder, KitchenService, NewKitchenItem};
use domain::order::{OrderCancelledData, OrderPaidData, PaidItem};
use domain::Aggregate;
use event_bus::EventEnvelope;

use crate::handler::{EventHandler, Outcome, decode};
use crate::Result;

/// Prep time given to each ticket line; order lines carry none.
pub const DEFAULT_PREP_TIME: Duration = Duration::from_secs(15 * 60);

/// Consumes `OrderPaid` and `OrderCancelled`.
#[derive(Clone)]
pub struct KitchenTicketHandler {
    kitchen: KitchenService,
    prep_time: Duration,
}

impl KitchenTicketHandler {
    pub fn new(kitchen: KitchenService) -> Self {
        Self::with_prep_time(kitchen, DEFAULT_PREP_TIME)
    }

    pub fn with_prep_time(kitchen: KitchenService, prep_time: Duration) -> Self {
        Self { kitchen, prep_time }
    }

    fn line(&self, item: PaidItem) -> NewKitchenItem {
        let mut line =
            NewKitchenItem::new(item.menu_item_id, item.name, item.quantity, self.prep_time);
        line.notes = item.notes;
        line.modifications = item.modifications;
        line
    }

    async fn open(&self, ctx: &Context, data: OrderPaidData) -> Result<Outcome> {
        if self.kitchen.find_by_order(ctx, &data.order_id).await?.is_some() {
            return Ok(Outcome::Skipped);
        }

        let mut cmd = CreateKitchenOrder::new(data.order_id);
        cmd.table_id = data.table_id;
        cmd.items = data.items.into_iter().map(|i| self.line(i)).collect();
        self.kitchen.create_ticket(ctx, cmd).await?;
        Ok(Outcome::Applied)
    }

    async fn close(&self, ctx: &Context, data: OrderCancelledData) -> Result<Outcome> {
        let Some(ticket) = self.kitchen.find_by_order(ctx, &data.order_id).await? else {
            return Ok(Outcome::Skipped);
        };
        if ticket.status().is_terminal() {
            return Ok(Outcome::Skipped);
        }
        self.kitchen.cancel_ticket(ctx, ticket.id()).await?;
        tracing::info!(
            order_id = %data.order_id,
            kitchen_order_id = %ticket.id(),
            "ticket cancelled with its order"
        );
        Ok(Outcome::Applied)
    }
}

#[async_trait]
impl EventHandler for KitchenTicketHandler {
    fn name(&self) -> &'static str {
        "kitchen_tickets"
    }

    fn event_types(&self) -> &'static [&'static str] {
        &["OrderPaid", "OrderCancelled"]
    }

    async fn handle(&self, ctx: &Context, event: &EventEnvelope) -> Result<Outcome> {
        match event.event_type.as_str() {
            "OrderPaid" => self.open(ctx, decode(event)?).await,
            "OrderCancelled" => self.close(ctx, decode(event)?).await,
            _ => Ok(Outcome::Skipped),
        }
    }
}
