//! Cross-service flows through the in-process bus.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use common::{Clock, Context, FixedClock, MenuItemId};
use consumers::{
    EventHandler, EventProcessor, KitchenTicketHandler, MenuStockHandler, Outcome,
    OrderStatusHandler, ReservationAdvisoryHandler,
};
use domain::inventory::{
    InMemoryInventoryRepository, InMemoryMovementRepository, InMemorySupplierRepository,
    InventoryService, NewInventoryItem,
};
use domain::kitchen::{
    InMemoryKitchenOrderRepository, KitchenItemStatus, KitchenOrderStatus, KitchenService,
};
use domain::menu::{InMemoryMenuRepository, MenuService, NewMenuItem};
use domain::order::{
    CreateOrder, InMemoryOrderRepository, NewOrderItem, OrderService, OrderStatus, OrderType,
};
use domain::reservation::{CreateReservation, InMemoryReservationRepository, ReservationService};
use domain::Aggregate;
use event_bus::{InMemoryEventBus, Subscription};

struct System {
    orders: OrderService,
    kitchen: KitchenService,
    reservations: ReservationService,
    menus: MenuService,
    inventory: InventoryService,
    bus: InMemoryEventBus,
    clock: FixedClock,
    processor: EventProcessor,
    subscription: Subscription,
}

impl System {
    fn new() -> Self {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap());
        let bus = InMemoryEventBus::with_capture();
        let publisher = Arc::new(bus.clone());
        let shared: Arc<dyn Clock> = Arc::new(clock.clone());

        let orders = OrderService::new(
            Arc::new(InMemoryOrderRepository::new()),
            publisher.clone(),
            shared.clone(),
        );
        let kitchen = KitchenService::new(
            Arc::new(InMemoryKitchenOrderRepository::new()),
            publisher.clone(),
            shared.clone(),
        );
        let reservations = ReservationService::new(
            Arc::new(InMemoryReservationRepository::new()),
            publisher.clone(),
            shared.clone(),
        );
        let menus = MenuService::new(
            Arc::new(InMemoryMenuRepository::new()),
            publisher.clone(),
            shared.clone(),
        );
        let inventory = InventoryService::new(
            Arc::new(InMemoryInventoryRepository::new()),
            Arc::new(InMemoryMovementRepository::new()),
            Arc::new(InMemorySupplierRepository::new()),
            publisher,
            shared,
        );

        let processor = EventProcessor::new()
            .with_handler(Arc::new(OrderStatusHandler::new(orders.clone())))
            .with_handler(Arc::new(KitchenTicketHandler::new(kitchen.clone())))
            .with_handler(Arc::new(MenuStockHandler::new(menus.clone())))
            .with_handler(Arc::new(ReservationAdvisoryHandler::new(
                reservations.clone(),
            )));
        let subscription = bus.subscribe_to(processor.event_types());

        Self {
            orders,
            kitchen,
            reservations,
            menus,
            inventory,
            bus,
            clock,
            processor,
            subscription,
        }
    }

    async fn settle(&mut self) -> usize {
        self.processor
            .drain(&Context::background(), &mut self.subscription)
            .await
    }

    async fn paid_order(&self) -> common::OrderId {
        let ctx = Context::background();
        let order = self
            .orders
            .create_order(&ctx, CreateOrder::new("c1", OrderType::DineIn))
            .await
            .unwrap()
            .aggregate;
        let id = order.id().clone();
        self.orders.set_table_id(&ctx, &id, "t5".into()).await.unwrap();
        self.orders
            .add_item(&ctx, &id, NewOrderItem::new("m1", "Salad", 2, 10.00))
            .await
            .unwrap();
        self.orders
            .update_status(&ctx, &id, OrderStatus::Paid)
            .await
            .unwrap();
        id
    }
}

#[tokio::test]
async fn paid_order_opens_one_ticket() {
    let mut s = System::new();
    let ctx = Context::background();
    let order_id = s.paid_order().await;
    s.settle().await;

    let ticket = s.kitchen.find_by_order(&ctx, &order_id).await.unwrap().unwrap();
    assert_eq!(ticket.status(), KitchenOrderStatus::New);
    assert_eq!(ticket.table_id(), Some("t5"));
    assert_eq!(ticket.items().len(), 1);
    assert_eq!(ticket.items()[0].quantity(), 2);
    assert_eq!(ticket.estimated_time(), Duration::from_secs(900));

    let paid = s.bus.published_of("OrderPaid").pop().unwrap();
    let handler = KitchenTicketHandler::new(s.kitchen.clone());
    assert_eq!(handler.handle(&ctx, &paid).await.unwrap(), Outcome::Skipped);
    assert_eq!(s.bus.published_of("KitchenOrderCreated").len(), 1);
}

#[tokio::test]
async fn kitchen_drives_order_to_ready_once() {
    let mut s = System::new();
    let ctx = Context::background();
    let order_id = s.paid_order().await;
    s.settle().await;

    let ticket = s.kitchen.find_by_order(&ctx, &order_id).await.unwrap().unwrap();
    let item_id = ticket.items()[0].id().clone();

    s.kitchen
        .update_item_status(&ctx, ticket.id(), &item_id, KitchenItemStatus::Preparing)
        .await
        .unwrap();
    s.settle().await;
    let order = s.orders.get_order(&ctx, &order_id).await.unwrap();
    assert_eq!(order.status(), OrderStatus::Preparing);

    s.kitchen
        .update_item_status(&ctx, ticket.id(), &item_id, KitchenItemStatus::Ready)
        .await
        .unwrap();
    s.settle().await;
    let order = s.orders.get_order(&ctx, &order_id).await.unwrap();
    assert_eq!(order.status(), OrderStatus::Ready);
    let changes = s.bus.published_of("OrderStatusChanged").len();

    let ready = s
        .bus
        .published_of("KitchenOrderStatusChanged")
        .into_iter()
        .find(|e| e.data["newStatus"] == "READY")
        .unwrap();
    assert_eq!(s.processor.process_event(&ctx, &ready).await, 0);

    let order = s.orders.get_order(&ctx, &order_id).await.unwrap();
    assert_eq!(order.status(), OrderStatus::Ready);
    assert_eq!(s.bus.published_of("OrderStatusChanged").len(), changes);
}

#[tokio::test]
async fn ready_skips_ahead_from_paid() {
    let mut s = System::new();
    let ctx = Context::background();
    let order_id = s.paid_order().await;
    s.settle().await;

    let ticket = s.kitchen.find_by_order(&ctx, &order_id).await.unwrap().unwrap();
    let item_id = ticket.items()[0].id().clone();
    for status in [KitchenItemStatus::Preparing, KitchenItemStatus::Ready] {
        s.kitchen
            .update_item_status(&ctx, ticket.id(), &item_id, status)
            .await
            .unwrap();
    }
    assert_eq!(
        s.orders.get_order(&ctx, &order_id).await.unwrap().status(),
        OrderStatus::Paid
    );

    let ready = s
        .bus
        .published_of("KitchenOrderStatusChanged")
        .into_iter()
        .find(|e| e.data["newStatus"] == "READY")
        .unwrap();
    let handler = OrderStatusHandler::new(s.orders.clone());
    assert_eq!(handler.handle(&ctx, &ready).await.unwrap(), Outcome::Applied);
    assert_eq!(
        s.orders.get_order(&ctx, &order_id).await.unwrap().status(),
        OrderStatus::Ready
    );
}

#[tokio::test]
async fn cancelling_the_order_cancels_the_ticket() {
    let mut s = System::new();
    let ctx = Context::background();
    let order_id = s.paid_order().await;
    s.settle().await;

    s.orders.cancel_order(&ctx, &order_id, None).await.unwrap();
    s.settle().await;

    let ticket = s.kitchen.find_by_order(&ctx, &order_id).await.unwrap().unwrap();
    assert_eq!(ticket.status(), KitchenOrderStatus::Cancelled);
    let order = s.orders.get_order(&ctx, &order_id).await.unwrap();
    assert_eq!(order.status(), OrderStatus::Cancelled);
    assert_eq!(s.bus.published_of("OrderCancelled").len(), 1);
}

#[tokio::test]
async fn invalid_induced_transition_is_dropped() {
    let mut s = System::new();
    let ctx = Context::background();
    let order_id = s.paid_order().await;
    s.settle().await;

    let ticket = s.kitchen.find_by_order(&ctx, &order_id).await.unwrap().unwrap();
    s.kitchen
        .update_status(&ctx, ticket.id(), KitchenOrderStatus::Preparing)
        .await
        .unwrap();
    let preparing = s.bus.published_of("KitchenOrderStatusChanged").pop().unwrap();

    // An order cancelled out of band cannot be moved to PREPARING.
    s.orders.cancel_order(&ctx, &order_id, None).await.unwrap();
    assert_eq!(s.processor.process_event(&ctx, &preparing).await, 0);
    assert_eq!(
        s.orders.get_order(&ctx, &order_id).await.unwrap().status(),
        OrderStatus::Cancelled
    );
}

#[tokio::test]
async fn stock_flips_menu_and_annotates_reservations() {
    let mut s = System::new();
    let ctx = Context::background();

    let menu = s
        .menus
        .create_menu(&ctx, "Dinner".into(), String::new())
        .await
        .unwrap()
        .aggregate;
    let (_, mains) = s
        .menus
        .add_category(&ctx, menu.id(), "Mains".into(), String::new(), 1)
        .await
        .unwrap();
    let (_, risotto) = s
        .menus
        .add_item(
            &ctx,
            menu.id(),
            &mains,
            NewMenuItem::new("Risotto", 18.0, Duration::from_secs(1200)),
        )
        .await
        .unwrap();

    let at = s.clock.now() + chrono::Duration::hours(3);
    let reservation = s
        .reservations
        .create_reservation(&ctx, CreateReservation::new("c1", "t1", at, 2))
        .await
        .unwrap()
        .aggregate;

    let rice = s
        .inventory
        .create_item(
            &ctx,
            NewInventoryItem::new("RICE-01", "Arborio rice", "kg")
                .stock(2.0, 1.0)
                .for_menu_item(risotto.clone()),
        )
        .await
        .unwrap()
        .aggregate;
    s.settle().await;

    s.inventory
        .consume_stock(&ctx, rice.id(), 2.0, "service".into(), None)
        .await
        .unwrap();
    s.settle().await;

    let item = |m: &domain::menu::Menu, id: &MenuItemId| m.item(id).unwrap().is_available();
    let menu_now = s.menus.get_menu(&ctx, menu.id()).await.unwrap();
    assert!(!item(&menu_now, &risotto));
    let annotated = s.reservations.get_reservation(&ctx, reservation.id()).await.unwrap();
    assert_eq!(
        annotated.advisory(&risotto),
        Some("Risotto is currently unavailable")
    );

    s.inventory
        .receive_stock(&ctx, rice.id(), 5.0, Some("PO-7".into()))
        .await
        .unwrap();
    s.settle().await;

    let menu_now = s.menus.get_menu(&ctx, menu.id()).await.unwrap();
    assert!(item(&menu_now, &risotto));
    let cleared = s.reservations.get_reservation(&ctx, reservation.id()).await.unwrap();
    assert_eq!(cleared.advisory(&risotto), None);
    assert_eq!(s.bus.published_of("ItemAvailabilityChanged").len(), 2);
}

#[tokio::test]
async fn recount_back_from_out_restores_the_menu_item() {
    let mut s = System::new();
    let ctx = Context::background();

    let menu = s
        .menus
        .create_menu(&ctx, "Lunch".into(), String::new())
        .await
        .unwrap()
        .aggregate;
    let (_, soups) = s
        .menus
        .add_category(&ctx, menu.id(), "Soups".into(), String::new(), 1)
        .await
        .unwrap();
    let (_, bisque) = s
        .menus
        .add_item(
            &ctx,
            menu.id(),
            &soups,
            NewMenuItem::new("Bisque", 12.0, Duration::from_secs(600)),
        )
        .await
        .unwrap();

    let lobster = s
        .inventory
        .create_item(
            &ctx,
            NewInventoryItem::new("LOB-01", "Lobster", "pcs")
                .stock(3.0, 1.0)
                .for_menu_item(bisque.clone()),
        )
        .await
        .unwrap()
        .aggregate;
    s.settle().await;

    s.inventory
        .reserve_stock(&ctx, lobster.id(), 3.0, Some("ord_9".into()))
        .await
        .unwrap();
    s.settle().await;
    let available = |m: &domain::menu::Menu| m.item(&bisque).unwrap().is_available();
    assert!(!available(&s.menus.get_menu(&ctx, menu.id()).await.unwrap()));

    s.inventory
        .release_stock(&ctx, lobster.id(), 3.0, Some("ord_9".into()))
        .await
        .unwrap();
    s.settle().await;
    assert!(available(&s.menus.get_menu(&ctx, menu.id()).await.unwrap()));

    s.inventory
        .adjust_stock(&ctx, lobster.id(), 0.0, "spilled".into())
        .await
        .unwrap();
    s.settle().await;
    assert!(!available(&s.menus.get_menu(&ctx, menu.id()).await.unwrap()));

    s.inventory
        .adjust_stock(&ctx, lobster.id(), 4.0, "recount".into())
        .await
        .unwrap();
    s.settle().await;
    assert!(available(&s.menus.get_menu(&ctx, menu.id()).await.unwrap()));
    assert_eq!(s.bus.published_of("StockReceived").len(), 2);
}
