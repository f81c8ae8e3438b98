//! Inventory service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{Clock, Context, InventoryItemId, SupplierId};
use event_bus::EventPublisher;

use crate::aggregate::{Aggregate, DomainEvent};
use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;
use crate::repository::{ListQuery, Page};

use super::{
    InventoryError, InventoryEvent, InventoryFilter, InventoryItem, InventoryRepository, Movement,
    MovementRepository, NewInventoryItem, NewSupplier, Supplier, SupplierRepository,
};

pub const SERVICE_NAME: &str = "inventory";

/// Default number of movements returned per item.
pub const MOVEMENT_HISTORY_LIMIT: usize = 50;

#[derive(Clone)]
pub struct InventoryService {
    items: CommandHandler<InventoryItem, dyn InventoryRepository>,
    suppliers: CommandHandler<Supplier, dyn SupplierRepository>,
    movements: Arc<dyn MovementRepository>,
}

impl InventoryService {
    pub fn new(
        items: Arc<dyn InventoryRepository>,
        movements: Arc<dyn MovementRepository>,
        suppliers: Arc<dyn SupplierRepository>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            items: CommandHandler::new(
                SERVICE_NAME,
                items,
                Arc::clone(&publisher),
                Arc::clone(&clock),
            ),
            suppliers: CommandHandler::new(SERVICE_NAME, suppliers, publisher, clock),
            movements,
        }
    }

    fn repository(&self) -> &Arc<dyn InventoryRepository> {
        self.items.repository()
    }

    /// Registers a new item. SKUs are unique; a linked supplier must be
    /// active.
    #[tracing::instrument(skip(self, ctx, input), fields(sku = %input.sku))]
    pub async fn create_item(
        &self,
        ctx: &Context,
        input: NewInventoryItem,
    ) -> Result<CommandResult<InventoryItem>, DomainError> {
        let sku = input.sku.trim();
        if ctx.run(self.repository().find_by_sku(sku)).await??.is_some() {
            return Err(InventoryError::DuplicateSku {
                sku: sku.to_string(),
            }
            .into());
        }
        if let Some(supplier_id) = &input.supplier_id {
            let supplier = self.suppliers.load(ctx, supplier_id).await?;
            if !supplier.is_active() {
                return Err(InventoryError::SupplierInactive {
                    supplier_id: supplier_id.to_string(),
                }
                .into());
            }
        }

        let (item, events) = InventoryItem::create(input, self.items.now())?;
        let result = self.items.create(ctx, item, events).await?;
        tracing::info!(item_id = %result.aggregate.id(), "inventory item created");
        Ok(result)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn get_item(
        &self,
        ctx: &Context,
        id: &InventoryItemId,
    ) -> Result<InventoryItem, DomainError> {
        self.items.load(ctx, id).await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn list_items(
        &self,
        ctx: &Context,
        query: ListQuery<InventoryFilter>,
    ) -> Result<Page<InventoryItem>, DomainError> {
        Ok(ctx.run(self.repository().list(&query)).await??)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn find_by_sku(
        &self,
        ctx: &Context,
        sku: &str,
    ) -> Result<Option<InventoryItem>, DomainError> {
        Ok(ctx.run(self.repository().find_by_sku(sku)).await??)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn low_stock(&self, ctx: &Context) -> Result<Vec<InventoryItem>, DomainError> {
        Ok(ctx.run(self.repository().find_low_stock()).await??)
    }

    /// Applies a stock change and appends its movement to the log.
    async fn apply_stock<F>(
        &self,
        ctx: &Context,
        id: &InventoryItemId,
        operation: F,
    ) -> Result<(CommandResult<InventoryItem>, Movement), DomainError>
    where
        F: FnOnce(
                &mut InventoryItem,
                DateTime<Utc>,
            ) -> Result<(Movement, Vec<InventoryEvent>), InventoryError>
            + Send,
    {
        let (result, movement) = self.items.execute_returning(ctx, id, operation).await?;
        self.movements.record(&movement).await?;

        metrics::counter!(
            "inventory_movements_total",
            "type" => movement.movement_type.as_str()
        )
        .increment(1);
        for event in &result.events {
            if matches!(
                event,
                InventoryEvent::LowStockAlert(_) | InventoryEvent::OutOfStockAlert(_)
            ) {
                tracing::warn!(
                    item_id = %id,
                    sku = result.aggregate.sku(),
                    available = result.aggregate.available_stock(),
                    alert = event.event_type(),
                    "stock alert raised"
                );
            }
        }
        Ok((result, movement))
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn receive_stock(
        &self,
        ctx: &Context,
        id: &InventoryItemId,
        quantity: f64,
        reference: Option<String>,
    ) -> Result<(CommandResult<InventoryItem>, Movement), DomainError> {
        self.apply_stock(ctx, id, |item, now| item.receive(quantity, reference, now))
            .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn consume_stock(
        &self,
        ctx: &Context,
        id: &InventoryItemId,
        quantity: f64,
        reason: String,
        reference: Option<String>,
    ) -> Result<(CommandResult<InventoryItem>, Movement), DomainError> {
        self.apply_stock(ctx, id, |item, now| {
            item.consume(quantity, &reason, reference, now)
        })
        .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn record_waste(
        &self,
        ctx: &Context,
        id: &InventoryItemId,
        quantity: f64,
        reason: String,
    ) -> Result<(CommandResult<InventoryItem>, Movement), DomainError> {
        self.apply_stock(ctx, id, |item, now| item.record_waste(quantity, &reason, now))
            .await
    }

    /// Sets the stock to a physical count.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn adjust_stock(
        &self,
        ctx: &Context,
        id: &InventoryItemId,
        counted: f64,
        reason: String,
    ) -> Result<(CommandResult<InventoryItem>, Movement), DomainError> {
        self.apply_stock(ctx, id, |item, now| item.adjust(counted, &reason, now))
            .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn reserve_stock(
        &self,
        ctx: &Context,
        id: &InventoryItemId,
        quantity: f64,
        reference: Option<String>,
    ) -> Result<(CommandResult<InventoryItem>, Movement), DomainError> {
        self.apply_stock(ctx, id, |item, now| item.reserve(quantity, reference, now))
            .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn release_stock(
        &self,
        ctx: &Context,
        id: &InventoryItemId,
        quantity: f64,
        reference: Option<String>,
    ) -> Result<(CommandResult<InventoryItem>, Movement), DomainError> {
        self.apply_stock(ctx, id, |item, now| item.release(quantity, reference, now))
            .await
    }

    /// Newest first.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn movements(
        &self,
        ctx: &Context,
        id: &InventoryItemId,
        limit: Option<usize>,
    ) -> Result<Vec<Movement>, DomainError> {
        let limit = limit.unwrap_or(MOVEMENT_HISTORY_LIMIT);
        Ok(ctx.run(self.movements.list_for_item(id, limit)).await??)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn update_minimum_stock(
        &self,
        ctx: &Context,
        id: &InventoryItemId,
        minimum: f64,
    ) -> Result<CommandResult<InventoryItem>, DomainError> {
        self.items
            .execute(ctx, id, |item, now| item.update_minimum_stock(minimum, now))
            .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn deactivate_item(
        &self,
        ctx: &Context,
        id: &InventoryItemId,
    ) -> Result<CommandResult<InventoryItem>, DomainError> {
        self.items
            .execute(ctx, id, |item, now| {
                item.deactivate(now);
                Ok(Vec::new())
            })
            .await
    }

    #[tracing::instrument(skip(self, ctx, input))]
    pub async fn create_supplier(
        &self,
        ctx: &Context,
        input: NewSupplier,
    ) -> Result<CommandResult<Supplier>, DomainError> {
        let (supplier, events) = Supplier::create(input, self.suppliers.now())?;
        let result = self.suppliers.create(ctx, supplier, events).await?;
        tracing::info!(supplier_id = %result.aggregate.id(), "supplier created");
        Ok(result)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn get_supplier(
        &self,
        ctx: &Context,
        id: &SupplierId,
    ) -> Result<Supplier, DomainError> {
        self.suppliers.load(ctx, id).await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn list_suppliers(
        &self,
        ctx: &Context,
        active_only: bool,
    ) -> Result<Vec<Supplier>, DomainError> {
        let repository = self.suppliers.repository();
        let suppliers = if active_only {
            ctx.run(repository.list_active()).await??
        } else {
            ctx.run(repository.list()).await??
        };
        Ok(suppliers)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn deactivate_supplier(
        &self,
        ctx: &Context,
        id: &SupplierId,
    ) -> Result<CommandResult<Supplier>, DomainError> {
        self.suppliers
            .execute(ctx, id, |supplier, now| Ok(supplier.deactivate(now)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{
        InMemoryInventoryRepository, InMemoryMovementRepository, InMemorySupplierRepository,
        MovementType, StockLevel,
    };
    use common::{Classify, ErrorKind, FixedClock, codes};
    use event_bus::InMemoryEventBus;

    fn service(bus: &InMemoryEventBus) -> InventoryService {
        InventoryService::new(
            Arc::new(InMemoryInventoryRepository::new()),
            Arc::new(InMemoryMovementRepository::new()),
            Arc::new(InMemorySupplierRepository::new()),
            Arc::new(bus.clone()),
            Arc::new(FixedClock::new(Utc::now())),
        )
    }

    #[tokio::test]
    async fn stock_operations_are_logged() {
        let bus = InMemoryEventBus::with_capture();
        let service = service(&bus);
        let ctx = Context::background();

        let item = service
            .create_item(
                &ctx,
                NewInventoryItem::new("FLOUR", "Flour", "kg")
                    .stock(10.0, 2.0)
                    .for_menu_item("item_pizza"),
            )
            .await
            .unwrap()
            .aggregate;

        service
            .consume_stock(&ctx, item.id(), 8.0, "dough".into(), None)
            .await
            .unwrap();
        let (result, _) = service
            .record_waste(&ctx, item.id(), 2.0, "spilled".into())
            .await
            .unwrap();
        assert_eq!(result.aggregate.level(), StockLevel::Out);

        let history = service.movements(&ctx, item.id(), None).await.unwrap();
        let types: Vec<MovementType> = history.iter().map(|m| m.movement_type).collect();
        assert_eq!(types, [MovementType::Waste, MovementType::Out]);

        assert_eq!(bus.published_of("LowStockAlert").len(), 1);
        assert_eq!(bus.published_of("OutOfStockAlert").len(), 1);
        assert_eq!(service.low_stock(&ctx).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sku_must_be_unique() {
        let bus = InMemoryEventBus::with_capture();
        let service = service(&bus);
        let ctx = Context::background();

        service
            .create_item(&ctx, NewInventoryItem::new("EGG", "Eggs", "pcs"))
            .await
            .unwrap();
        let err = service
            .create_item(&ctx, NewInventoryItem::new("EGG", "Eggs again", "pcs"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn insufficient_stock_writes_nothing() {
        let bus = InMemoryEventBus::with_capture();
        let service = service(&bus);
        let ctx = Context::background();

        let item = service
            .create_item(&ctx, NewInventoryItem::new("MILK", "Milk", "l").stock(1.0, 0.0))
            .await
            .unwrap()
            .aggregate;

        let err = service
            .reserve_stock(&ctx, item.id(), 5.0, None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(codes::INSUFFICIENT_STOCK));
        assert!(service.movements(&ctx, item.id(), None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn inactive_supplier_cannot_be_linked() {
        let bus = InMemoryEventBus::with_capture();
        let service = service(&bus);
        let ctx = Context::background();

        let supplier = service
            .create_supplier(&ctx, NewSupplier::new("Dairy Co"))
            .await
            .unwrap()
            .aggregate;
        service.deactivate_supplier(&ctx, supplier.id()).await.unwrap();

        let mut input = NewInventoryItem::new("CREAM", "Cream", "l");
        input.supplier_id = Some(supplier.id().clone());
        let err = service.create_item(&ctx, input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Business);
        assert!(service.list_suppliers(&ctx, true).await.unwrap().is_empty());
    }
}
