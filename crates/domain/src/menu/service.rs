//! Menu service.

use std::sync::Arc;

use common::{CategoryId, Clock, Context, MenuId, MenuItemId};
use event_bus::EventPublisher;

use crate::aggregate::Aggregate;
use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;
use crate::repository::{ListQuery, Page};

use super::{Menu, MenuFilter, MenuRepository, NewMenuItem};

pub const SERVICE_NAME: &str = "menu";

#[derive(Clone)]
pub struct MenuService {
    handler: CommandHandler<Menu, dyn MenuRepository>,
}

impl MenuService {
    pub fn new(
        repository: Arc<dyn MenuRepository>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            handler: CommandHandler::new(SERVICE_NAME, repository, publisher, clock),
        }
    }

    fn repository(&self) -> &Arc<dyn MenuRepository> {
        self.handler.repository()
    }

    #[tracing::instrument(skip(self, ctx, description))]
    pub async fn create_menu(
        &self,
        ctx: &Context,
        name: String,
        description: String,
    ) -> Result<CommandResult<Menu>, DomainError> {
        let (menu, events) = Menu::create(name, description, self.handler.now())?;
        let result = self.handler.create(ctx, menu, events).await?;
        tracing::info!(menu_id = %result.aggregate.id(), "menu created");
        Ok(result)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn get_menu(&self, ctx: &Context, id: &MenuId) -> Result<Menu, DomainError> {
        self.handler.load(ctx, id).await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn list_menus(
        &self,
        ctx: &Context,
        query: ListQuery<MenuFilter>,
    ) -> Result<Page<Menu>, DomainError> {
        Ok(ctx.run(self.repository().list(&query)).await??)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn active_menu(&self, ctx: &Context) -> Result<Option<Menu>, DomainError> {
        Ok(ctx.run(self.repository().find_active()).await??)
    }

    #[tracing::instrument(skip(self, ctx, description))]
    pub async fn add_category(
        &self,
        ctx: &Context,
        id: &MenuId,
        name: String,
        description: String,
        sort_order: i32,
    ) -> Result<(CommandResult<Menu>, CategoryId), DomainError> {
        self.handler
            .execute_returning(ctx, id, |menu, now| {
                let category_id = menu.add_category(name, description, sort_order, now)?;
                Ok((category_id, Vec::new()))
            })
            .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn remove_category(
        &self,
        ctx: &Context,
        id: &MenuId,
        category_id: &CategoryId,
    ) -> Result<CommandResult<Menu>, DomainError> {
        self.handler
            .execute(ctx, id, |menu, now| {
                menu.remove_category(category_id, now).map(|_| Vec::new())
            })
            .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn add_item(
        &self,
        ctx: &Context,
        id: &MenuId,
        category_id: &CategoryId,
        item: NewMenuItem,
    ) -> Result<(CommandResult<Menu>, MenuItemId), DomainError> {
        self.handler
            .execute_returning(ctx, id, |menu, now| {
                let item_id = menu.add_item(category_id, item, now)?;
                Ok((item_id, Vec::new()))
            })
            .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn remove_item(
        &self,
        ctx: &Context,
        id: &MenuId,
        item_id: &MenuItemId,
    ) -> Result<CommandResult<Menu>, DomainError> {
        self.handler
            .execute(ctx, id, |menu, now| {
                menu.remove_item(item_id, now).map(|_| Vec::new())
            })
            .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn update_item_price(
        &self,
        ctx: &Context,
        id: &MenuId,
        item_id: &MenuItemId,
        price: f64,
    ) -> Result<CommandResult<Menu>, DomainError> {
        self.handler
            .execute(ctx, id, |menu, now| {
                menu.update_item_price(item_id, price, now).map(|_| Vec::new())
            })
            .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn set_item_availability(
        &self,
        ctx: &Context,
        id: &MenuId,
        item_id: &MenuItemId,
        available: bool,
    ) -> Result<CommandResult<Menu>, DomainError> {
        self.handler
            .execute(ctx, id, |menu, now| {
                menu.set_item_availability(item_id, available, now)
            })
            .await
    }

    /// Sets a dish's availability on every menu listing it. Menus already
    /// in the target state are not written. Returns how many changed.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn set_availability_everywhere(
        &self,
        ctx: &Context,
        item_id: &MenuItemId,
        available: bool,
    ) -> Result<usize, DomainError> {
        let menus = ctx.run(self.repository().find_by_item(item_id)).await??;

        let mut changed = 0;
        for menu in menus {
            let current = menu.item(item_id).map(|i| i.is_available());
            if current == Some(available) {
                continue;
            }
            self.set_item_availability(ctx, menu.id(), item_id, available)
                .await?;
            changed += 1;
        }
        Ok(changed)
    }

    /// Activates a menu, deactivating whichever menu was active before.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn activate_menu(
        &self,
        ctx: &Context,
        id: &MenuId,
    ) -> Result<CommandResult<Menu>, DomainError> {
        if let Some(current) = ctx.run(self.repository().find_active()).await?? {
            if current.id() != id {
                self.deactivate_menu(ctx, current.id()).await?;
            }
        }

        self.handler
            .execute(ctx, id, |menu, now| menu.activate(now))
            .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn deactivate_menu(
        &self,
        ctx: &Context,
        id: &MenuId,
    ) -> Result<CommandResult<Menu>, DomainError> {
        self.handler
            .execute(ctx, id, |menu, now| menu.deactivate(now))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::InMemoryMenuRepository;
    use chrono::Utc;
    use common::FixedClock;
    use event_bus::InMemoryEventBus;
    use std::time::Duration;

    fn service(bus: &InMemoryEventBus) -> MenuService {
        MenuService::new(
            Arc::new(InMemoryMenuRepository::new()),
            Arc::new(bus.clone()),
            Arc::new(FixedClock::new(Utc::now())),
        )
    }

    #[tokio::test]
    async fn only_one_menu_is_active() {
        let bus = InMemoryEventBus::with_capture();
        let service = service(&bus);
        let ctx = Context::background();

        let lunch = service
            .create_menu(&ctx, "Lunch".into(), String::new())
            .await
            .unwrap()
            .aggregate;
        let dinner = service
            .create_menu(&ctx, "Dinner".into(), String::new())
            .await
            .unwrap()
            .aggregate;

        service.activate_menu(&ctx, lunch.id()).await.unwrap();
        service.activate_menu(&ctx, dinner.id()).await.unwrap();

        let active = service.active_menu(&ctx).await.unwrap().unwrap();
        assert_eq!(active.id(), dinner.id());
        assert!(!service.get_menu(&ctx, lunch.id()).await.unwrap().is_active());
        assert_eq!(bus.published_of("MenuDeactivated").len(), 1);
        assert_eq!(bus.published_of("MenuActivated").len(), 2);
    }

    #[tokio::test]
    async fn availability_everywhere_is_idempotent() {
        let bus = InMemoryEventBus::with_capture();
        let service = service(&bus);
        let ctx = Context::background();

        let menu = service
            .create_menu(&ctx, "Dinner".into(), String::new())
            .await
            .unwrap()
            .aggregate;
        let (_, starters) = service
            .add_category(&ctx, menu.id(), "Starters".into(), String::new(), 1)
            .await
            .unwrap();
        let (_, salad) = service
            .add_item(
                &ctx,
                menu.id(),
                &starters,
                NewMenuItem::new("Salad", 10.0, Duration::from_secs(600)),
            )
            .await
            .unwrap();

        assert_eq!(
            service.set_availability_everywhere(&ctx, &salad, false).await.unwrap(),
            1
        );
        assert_eq!(
            service.set_availability_everywhere(&ctx, &salad, false).await.unwrap(),
            0
        );
        assert_eq!(bus.published_of("ItemAvailabilityChanged").len(), 1);
    }
}
