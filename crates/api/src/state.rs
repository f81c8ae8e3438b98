//! Shared application state: one instance of each service, wired to a
//! common event bus and clock.

use std::sync::Arc;
use std::time::Duration;

use auth::{JwtConfig, JwtService, PasswordService};
use common::{Clock, SystemClock};
use consumers::{
    EventProcessor, KitchenTicketHandler, MenuStockHandler, OrderStatusHandler,
    ReservationAdvisoryHandler,
};
use domain::inventory::{
    InMemoryInventoryRepository, InMemoryMovementRepository, InMemorySupplierRepository,
    InventoryRepository, InventoryService, MovementRepository, SupplierRepository,
};
use domain::kitchen::{InMemoryKitchenOrderRepository, KitchenOrderRepository, KitchenService};
use domain::menu::{InMemoryMenuRepository, MenuRepository, MenuService};
use domain::order::{InMemoryOrderRepository, OrderRepository, OrderService};
use domain::reservation::{
    InMemoryReservationRepository, ReservationRepository, ReservationService,
};
use domain::user::{
    InMemoryRoleRepository, InMemorySessionRepository, InMemoryUserRepository, RoleRepository,
    SessionRepository, UserRepository, UserService,
};
use event_bus::{EventPublisher, InMemoryEventBus};
use sqlx::PgPool;

/// One repository per aggregate, behind its trait.
pub struct Repositories {
    pub orders: Arc<dyn OrderRepository>,
    pub kitchen: Arc<dyn KitchenOrderRepository>,
    pub reservations: Arc<dyn ReservationRepository>,
    pub menus: Arc<dyn MenuRepository>,
    pub inventory: Arc<dyn InventoryRepository>,
    pub movements: Arc<dyn MovementRepository>,
    pub suppliers: Arc<dyn SupplierRepository>,
    pub users: Arc<dyn UserRepository>,
    pub roles: Arc<dyn RoleRepository>,
    pub sessions: Arc<dyn SessionRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            orders: Arc::new(InMemoryOrderRepository::new()),
            kitchen: Arc::new(InMemoryKitchenOrderRepository::new()),
            reservations: Arc::new(InMemoryReservationRepository::new()),
            menus: Arc::new(InMemoryMenuRepository::new()),
            inventory: Arc::new(InMemoryInventoryRepository::new()),
            movements: Arc::new(InMemoryMovementRepository::new()),
            suppliers: Arc::new(InMemorySupplierRepository::new()),
            users: Arc::new(InMemoryUserRepository::new()),
            roles: Arc::new(InMemoryRoleRepository::new()),
            sessions: Arc::new(InMemorySessionRepository::new()),
        }
    }

    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            orders: Arc::new(storage::PgOrderRepository::new(pool.clone())),
            kitchen: Arc::new(storage::PgKitchenOrderRepository::new(pool.clone())),
            reservations: Arc::new(storage::PgReservationRepository::new(pool.clone())),
            menus: Arc::new(storage::PgMenuRepository::new(pool.clone())),
            inventory: Arc::new(storage::PgInventoryRepository::new(pool.clone())),
            movements: Arc::new(storage::PgMovementRepository::new(pool.clone())),
            suppliers: Arc::new(storage::PgSupplierRepository::new(pool.clone())),
            users: Arc::new(storage::PgUserRepository::new(pool.clone())),
            roles: Arc::new(storage::PgRoleRepository::new(pool.clone())),
            sessions: Arc::new(storage::PgSessionRepository::new(pool.clone())),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub orders: OrderService,
    pub kitchen: KitchenService,
    pub reservations: ReservationService,
    pub menus: MenuService,
    pub inventory: InventoryService,
    pub users: UserService,
    pub bus: InMemoryEventBus,
    prep_time: Duration,
}

impl AppState {
    pub fn new(
        repos: Repositories,
        jwt: JwtConfig,
        prep_time: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let bus = InMemoryEventBus::new();
        let publisher: Arc<dyn EventPublisher> = Arc::new(bus.clone());

        Self {
            orders: OrderService::new(repos.orders, publisher.clone(), clock.clone()),
            kitchen: KitchenService::new(repos.kitchen, publisher.clone(), clock.clone()),
            reservations: ReservationService::new(
                repos.reservations,
                publisher.clone(),
                clock.clone(),
            ),
            menus: MenuService::new(repos.menus, publisher.clone(), clock.clone()),
            inventory: InventoryService::new(
                repos.inventory,
                repos.movements,
                repos.suppliers,
                publisher.clone(),
                clock.clone(),
            ),
            users: UserService::new(
                repos.users,
                repos.roles,
                repos.sessions,
                JwtService::new(jwt, clock.clone()),
                PasswordService::new(),
                publisher,
                clock,
            ),
            bus,
            prep_time,
        }
    }

    /// In-memory repositories and the system clock.
    pub fn in_memory(config: &crate::Config) -> Self {
        Self::new(
            Repositories::in_memory(),
            config.jwt(),
            config.default_prep_time,
            Arc::new(SystemClock),
        )
    }

    /// The cross-service consumers over these services.
    pub fn processor(&self) -> EventProcessor {
        EventProcessor::new()
            .with_handler(Arc::new(KitchenTicketHandler::with_prep_time(
                self.kitchen.clone(),
                self.prep_time,
            )))
            .with_handler(Arc::new(OrderStatusHandler::new(self.orders.clone())))
            .with_handler(Arc::new(MenuStockHandler::new(self.menus.clone())))
            .with_handler(Arc::new(ReservationAdvisoryHandler::new(
                self.reservations.clone(),
            )))
    }
}
