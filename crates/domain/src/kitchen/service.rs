//! Kitchen service.

use std::sync::Arc;

use common::{Clock, Context, KitchenItemId, KitchenOrderId, OrderId};
use event_bus::EventPublisher;

use crate::aggregate::Aggregate;
use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;
use crate::repository::{ListQuery, Page};

use super::{
    CreateKitchenOrder, KitchenItemStatus, KitchenOrder, KitchenOrderFilter,
    KitchenOrderRepository, KitchenOrderStatus, NewKitchenItem, Priority,
};

pub const SERVICE_NAME: &str = "kitchen";

#[derive(Clone)]
pub struct KitchenService {
    handler: CommandHandler<KitchenOrder, dyn KitchenOrderRepository>,
}

impl KitchenService {
    pub fn new(
        repository: Arc<dyn KitchenOrderRepository>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            handler: CommandHandler::new(SERVICE_NAME, repository, publisher, clock),
        }
    }

    fn repository(&self) -> &Arc<dyn KitchenOrderRepository> {
        self.handler.repository()
    }

    /// Opens a ticket with its lines in one write.
    #[tracing::instrument(skip(self, ctx, cmd), fields(order_id = %cmd.order_id))]
    pub async fn create_ticket(
        &self,
        ctx: &Context,
        cmd: CreateKitchenOrder,
    ) -> Result<CommandResult<KitchenOrder>, DomainError> {
        let now = self.handler.now();
        let (mut ticket, events) =
            KitchenOrder::create(cmd.order_id, cmd.table_id, cmd.priority, now)?;

        if let Some(notes) = cmd.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            ticket.add_notes(notes, now)?;
        }
        for item in cmd.items {
            ticket.add_item(item, now)?;
        }

        let result = self.handler.create(ctx, ticket, events).await?;
        tracing::info!(
            kitchen_order_id = %result.aggregate.id(),
            items = result.aggregate.items().len(),
            "kitchen order created"
        );
        Ok(result)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn get_ticket(
        &self,
        ctx: &Context,
        id: &KitchenOrderId,
    ) -> Result<KitchenOrder, DomainError> {
        self.handler.load(ctx, id).await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn find_by_order(
        &self,
        ctx: &Context,
        order_id: &OrderId,
    ) -> Result<Option<KitchenOrder>, DomainError> {
        Ok(ctx.run(self.repository().find_by_order_id(order_id)).await??)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn list_tickets(
        &self,
        ctx: &Context,
        query: ListQuery<KitchenOrderFilter>,
    ) -> Result<Page<KitchenOrder>, DomainError> {
        Ok(ctx.run(self.repository().list(&query)).await??)
    }

    /// Open tickets in queue order.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn active_queue(&self, ctx: &Context) -> Result<Vec<KitchenOrder>, DomainError> {
        Ok(ctx.run(self.repository().find_active()).await??)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn add_item(
        &self,
        ctx: &Context,
        id: &KitchenOrderId,
        item: NewKitchenItem,
    ) -> Result<(CommandResult<KitchenOrder>, KitchenItemId), DomainError> {
        self.handler
            .execute_returning(ctx, id, |ticket, now| {
                let item_id = ticket.add_item(item, now)?;
                Ok((item_id, Vec::new()))
            })
            .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn remove_item(
        &self,
        ctx: &Context,
        id: &KitchenOrderId,
        item_id: &KitchenItemId,
    ) -> Result<CommandResult<KitchenOrder>, DomainError> {
        self.handler
            .execute(ctx, id, |ticket, now| ticket.remove_item(item_id, now))
            .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn update_item_status(
        &self,
        ctx: &Context,
        id: &KitchenOrderId,
        item_id: &KitchenItemId,
        status: KitchenItemStatus,
    ) -> Result<CommandResult<KitchenOrder>, DomainError> {
        self.handler
            .execute(ctx, id, |ticket, now| {
                ticket.update_item_status(item_id, status, now)
            })
            .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn update_status(
        &self,
        ctx: &Context,
        id: &KitchenOrderId,
        status: KitchenOrderStatus,
    ) -> Result<CommandResult<KitchenOrder>, DomainError> {
        self.handler
            .execute(ctx, id, |ticket, now| ticket.update_status(status, now))
            .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn cancel_ticket(
        &self,
        ctx: &Context,
        id: &KitchenOrderId,
    ) -> Result<CommandResult<KitchenOrder>, DomainError> {
        self.handler
            .execute(ctx, id, |ticket, now| ticket.cancel(now))
            .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn set_priority(
        &self,
        ctx: &Context,
        id: &KitchenOrderId,
        priority: Priority,
    ) -> Result<CommandResult<KitchenOrder>, DomainError> {
        self.handler
            .execute(ctx, id, |ticket, now| {
                ticket.set_priority(priority, now).map(|_| Vec::new())
            })
            .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn assign_station(
        &self,
        ctx: &Context,
        id: &KitchenOrderId,
        station: String,
    ) -> Result<CommandResult<KitchenOrder>, DomainError> {
        self.handler
            .execute(ctx, id, |ticket, now| {
                ticket.assign_station(station, now).map(|_| Vec::new())
            })
            .await
    }

    #[tracing::instrument(skip(self, ctx, notes))]
    pub async fn add_notes(
        &self,
        ctx: &Context,
        id: &KitchenOrderId,
        notes: String,
    ) -> Result<CommandResult<KitchenOrder>, DomainError> {
        self.handler
            .execute(ctx, id, |ticket, now| {
                ticket.add_notes(&notes, now).map(|_| Vec::new())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kitchen::{
        InMemoryKitchenOrderRepository, KitchenEvent, KitchenOrderStatusChangedData,
    };
    use chrono::Utc;
    use common::FixedClock;
    use event_bus::InMemoryEventBus;
    use std::time::Duration;

    fn service(bus: &InMemoryEventBus) -> KitchenService {
        KitchenService::new(
            Arc::new(InMemoryKitchenOrderRepository::new()),
            Arc::new(bus.clone()),
            Arc::new(FixedClock::new(Utc::now())),
        )
    }

    #[tokio::test]
    async fn item_progress_publishes_ticket_status() {
        let bus = InMemoryEventBus::with_capture();
        let service = service(&bus);
        let ctx = Context::background();

        let created = service
            .create_ticket(
                &ctx,
                CreateKitchenOrder::new("o1")
                    .item(NewKitchenItem::new("m1", "Soup", 1, Duration::from_secs(600))),
            )
            .await
            .unwrap();
        let id = created.aggregate.id().clone();
        let item_id = created.aggregate.items()[0].id().clone();

        service
            .update_item_status(&ctx, &id, &item_id, KitchenItemStatus::Preparing)
            .await
            .unwrap();
        let result = service
            .update_item_status(&ctx, &id, &item_id, KitchenItemStatus::Ready)
            .await
            .unwrap();

        assert_eq!(result.aggregate.status(), KitchenOrderStatus::Ready);
        let changes: Vec<KitchenOrderStatus> = bus
            .published_of("KitchenOrderStatusChanged")
            .iter()
            .map(|e| {
                e.data_as::<KitchenOrderStatusChangedData>()
                    .unwrap()
                    .new_status
            })
            .collect();
        assert_eq!(
            changes,
            [KitchenOrderStatus::Preparing, KitchenOrderStatus::Ready]
        );
        assert!(matches!(
            result.events.last(),
            Some(KitchenEvent::KitchenOrderStatusChanged(_))
        ));

        let found = service
            .find_by_order(&ctx, &OrderId::from("o1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id(), &id);
    }

    #[tokio::test]
    async fn removing_the_last_open_item_publishes_ready() {
        let bus = InMemoryEventBus::with_capture();
        let service = service(&bus);
        let ctx = Context::background();

        let created = service
            .create_ticket(
                &ctx,
                CreateKitchenOrder::new("o1")
                    .item(NewKitchenItem::new("m1", "Soup", 1, Duration::from_secs(600)))
                    .item(NewKitchenItem::new("m2", "Steak", 1, Duration::from_secs(900))),
            )
            .await
            .unwrap();
        let id = created.aggregate.id().clone();
        let soup = created.aggregate.items()[0].id().clone();
        let steak = created.aggregate.items()[1].id().clone();

        service
            .update_status(&ctx, &id, KitchenOrderStatus::Preparing)
            .await
            .unwrap();
        service
            .update_item_status(&ctx, &id, &soup, KitchenItemStatus::Ready)
            .await
            .unwrap();
        bus.clear();

        let result = service.remove_item(&ctx, &id, &steak).await.unwrap();

        assert_eq!(result.aggregate.status(), KitchenOrderStatus::Ready);
        let changes = bus.published_of("KitchenOrderStatusChanged");
        assert_eq!(changes.len(), 1);
        let data = changes[0]
            .data_as::<KitchenOrderStatusChangedData>()
            .unwrap();
        assert_eq!(data.old_status, KitchenOrderStatus::Preparing);
        assert_eq!(data.new_status, KitchenOrderStatus::Ready);

        let done = service
            .update_status(&ctx, &id, KitchenOrderStatus::Completed)
            .await
            .unwrap();
        assert_eq!(done.aggregate.status(), KitchenOrderStatus::Completed);
    }
}
