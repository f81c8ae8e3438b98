//! End-to-end scenarios across the domain services, run against the
//! in-memory repositories and bus.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use common::{Classify, Clock, Context, ErrorKind, FixedClock, codes};
use domain::kitchen::{
    CreateKitchenOrder, InMemoryKitchenOrderRepository, KitchenItemStatus, KitchenOrderStatus,
    KitchenService, NewKitchenItem,
};
use domain::order::{
    CreateOrder, InMemoryOrderRepository, NewOrderItem, Order, OrderService, OrderStatus,
    OrderType,
};
use domain::reservation::{
    CreateReservation, InMemoryReservationRepository, ReservationService, ReservationStatus,
};
use domain::user::{Action, Resource, Role, User};
use domain::{Aggregate, DomainEvent};
use event_bus::InMemoryEventBus;

const EPSILON: f64 = 1e-6;

struct Services {
    orders: OrderService,
    kitchen: KitchenService,
    reservations: ReservationService,
    bus: InMemoryEventBus,
    clock: FixedClock,
}

fn services() -> Services {
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap());
    let bus = InMemoryEventBus::with_capture();
    let publisher = Arc::new(bus.clone());
    let shared_clock: Arc<dyn Clock> = Arc::new(clock.clone());

    Services {
        orders: OrderService::new(
            Arc::new(InMemoryOrderRepository::new()),
            publisher.clone(),
            shared_clock.clone(),
        ),
        kitchen: KitchenService::new(
            Arc::new(InMemoryKitchenOrderRepository::new()),
            publisher.clone(),
            shared_clock.clone(),
        ),
        reservations: ReservationService::new(
            Arc::new(InMemoryReservationRepository::new()),
            publisher,
            shared_clock,
        ),
        bus,
        clock,
    }
}

mod order_lifecycle {
    use super::*;

    #[tokio::test]
    async fn happy_path_prices_and_transitions() {
        let s = services();
        let ctx = Context::background();

        let order = s
            .orders
            .create_order(&ctx, CreateOrder::new("c1", OrderType::DineIn))
            .await
            .unwrap()
            .aggregate;
        let id = order.id().clone();

        s.orders.set_table_id(&ctx, &id, "t5".into()).await.unwrap();
        s.orders
            .add_item(&ctx, &id, NewOrderItem::new("m1", "Salad", 2, 10.00))
            .await
            .unwrap();
        let (result, _) = s
            .orders
            .add_item(&ctx, &id, NewOrderItem::new("m2", "Pasta", 1, 15.00))
            .await
            .unwrap();

        let order = result.aggregate;
        assert_eq!(order.items().len(), 2);
        assert!((order.tax_amount() - 3.50).abs() < EPSILON);
        assert!((order.total_amount() - 38.50).abs() < EPSILON);
        assert_eq!(order.status(), OrderStatus::Created);

        s.orders
            .update_status(&ctx, &id, OrderStatus::Paid)
            .await
            .unwrap();
        assert_eq!(s.bus.published_of("OrderPaid").len(), 1);

        s.orders
            .update_status(&ctx, &id, OrderStatus::Preparing)
            .await
            .unwrap();

        let err = s
            .orders
            .update_status(&ctx, &id, OrderStatus::Completed)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Business);
        assert_eq!(err.code(), Some(codes::INVALID_STATUS_TRANSITION));

        let stored = s.orders.get_order(&ctx, &id).await.unwrap();
        assert_eq!(stored.status(), OrderStatus::Preparing);
    }

    #[tokio::test]
    async fn add_then_remove_restores_total() {
        let s = services();
        let ctx = Context::background();

        let id = s
            .orders
            .create_order(
                &ctx,
                CreateOrder::new("c1", OrderType::Takeout)
                    .item(NewOrderItem::new("m1", "Soup", 1, 7.25)),
            )
            .await
            .unwrap()
            .aggregate
            .id()
            .clone();
        let before = s.orders.get_order(&ctx, &id).await.unwrap().total_amount();

        let (_, item_id) = s
            .orders
            .add_item(&ctx, &id, NewOrderItem::new("m9", "Cake", 3, 4.10))
            .await
            .unwrap();
        let after = s
            .orders
            .remove_item(&ctx, &id, &item_id)
            .await
            .unwrap()
            .aggregate
            .total_amount();
        assert!((after - before).abs() < 1e-9);
    }

    #[tokio::test]
    async fn repeated_transition_fails_the_second_time() {
        let s = services();
        let ctx = Context::background();

        let id = s
            .orders
            .create_order(
                &ctx,
                CreateOrder::new("c1", OrderType::Delivery)
                    .delivery_address("1 Main St")
                    .item(NewOrderItem::new("m1", "Pizza", 1, 12.0)),
            )
            .await
            .unwrap()
            .aggregate
            .id()
            .clone();

        s.orders.update_status(&ctx, &id, OrderStatus::Paid).await.unwrap();
        let err = s
            .orders
            .update_status(&ctx, &id, OrderStatus::Paid)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(codes::INVALID_STATUS_TRANSITION));
    }

    #[tokio::test]
    async fn completed_order_cannot_be_cancelled() {
        let s = services();
        let ctx = Context::background();

        let id = s
            .orders
            .create_order(
                &ctx,
                CreateOrder::new("c1", OrderType::Takeout)
                    .item(NewOrderItem::new("m1", "Wrap", 1, 8.0)),
            )
            .await
            .unwrap()
            .aggregate
            .id()
            .clone();
        s.orders
            .advance_status(
                &ctx,
                &id,
                &[
                    OrderStatus::Paid,
                    OrderStatus::Preparing,
                    OrderStatus::Ready,
                    OrderStatus::Completed,
                ],
            )
            .await
            .unwrap();

        let err = s.orders.cancel_order(&ctx, &id, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Business);
        assert_eq!(err.code(), Some(codes::ORDER_NOT_CANCELLABLE));
    }

    #[tokio::test]
    async fn invalid_lines_are_validation_errors() {
        let s = services();
        let ctx = Context::background();

        let (id, item_id) = {
            let order = s
                .orders
                .create_order(&ctx, CreateOrder::new("c1", OrderType::Takeout))
                .await
                .unwrap()
                .aggregate;
            let (_, item_id) = s
                .orders
                .add_item(&ctx, order.id(), NewOrderItem::new("m1", "Tea", 2, 3.0))
                .await
                .unwrap();
            (order.id().clone(), item_id)
        };

        for bad in [
            NewOrderItem::new("m2", "Zero", 0, 1.0),
            NewOrderItem::new("m3", "Negative", 1, -1.0),
        ] {
            let err = s.orders.add_item(&ctx, &id, bad).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }

        let err = s
            .orders
            .update_item_quantity(&ctx, &id, &item_id, 0)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let order = s.orders.get_order(&ctx, &id).await.unwrap();
        assert_eq!(order.get_item(&item_id).unwrap().quantity(), 2);
    }

    #[tokio::test]
    async fn persisted_shape_round_trips() {
        let s = services();
        let ctx = Context::background();

        let order = s
            .orders
            .create_order(
                &ctx,
                CreateOrder::new("c1", OrderType::DineIn).table("t2").item(
                    NewOrderItem::new("m1", "Burger", 1, 11.5)
                        .with_modifications(["no onions", "extra cheese"])
                        .with_notes("well done"),
                ),
            )
            .await
            .unwrap()
            .aggregate;

        let json = serde_json::to_value(&order).unwrap();
        let restored: Order = serde_json::from_value(json).unwrap();
        assert_eq!(restored, order);
        assert_eq!(
            restored.items()[0].modifications(),
            ["no onions", "extra cheese"]
        );
    }
}

mod kitchen_rollup {
    use super::*;

    #[tokio::test]
    async fn items_drive_the_ticket() {
        let s = services();
        let ctx = Context::background();

        let ticket = s
            .kitchen
            .create_ticket(&ctx, CreateKitchenOrder::new("o1"))
            .await
            .unwrap()
            .aggregate;
        let id = ticket.id().clone();

        let (_, a) = s
            .kitchen
            .add_item(&ctx, &id, NewKitchenItem::new("m1", "A", 1, Duration::from_secs(600)))
            .await
            .unwrap();
        let (result, b) = s
            .kitchen
            .add_item(&ctx, &id, NewKitchenItem::new("m2", "B", 1, Duration::from_secs(1200)))
            .await
            .unwrap();
        assert_eq!(result.aggregate.estimated_time(), Duration::from_secs(1200));

        for status in [KitchenItemStatus::Preparing, KitchenItemStatus::Ready] {
            s.kitchen
                .update_item_status(&ctx, &id, &a, status)
                .await
                .unwrap();
        }
        let ticket = s.kitchen.get_ticket(&ctx, &id).await.unwrap();
        assert_eq!(ticket.status(), KitchenOrderStatus::Preparing);

        s.clock.advance(chrono::Duration::minutes(5));
        for status in [KitchenItemStatus::Preparing, KitchenItemStatus::Ready] {
            s.kitchen
                .update_item_status(&ctx, &id, &b, status)
                .await
                .unwrap();
        }
        let ticket = s.kitchen.get_ticket(&ctx, &id).await.unwrap();
        assert_eq!(ticket.status(), KitchenOrderStatus::Ready);
        assert_eq!(ticket.estimated_time(), Duration::ZERO);
        assert_eq!(ticket.time_remaining(s.clock.now()), Duration::ZERO);

        let changes = s.bus.published_of("KitchenOrderStatusChanged");
        let statuses: Vec<String> = changes
            .iter()
            .map(|e| e.data["newStatus"].as_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(statuses, ["PREPARING", "READY"]);
    }

    #[tokio::test]
    async fn cancelling_every_item_cancels_the_ticket() {
        let s = services();
        let ctx = Context::background();

        let ticket = s
            .kitchen
            .create_ticket(
                &ctx,
                CreateKitchenOrder::new("o2")
                    .item(NewKitchenItem::new("m1", "A", 1, Duration::from_secs(60)))
                    .item(NewKitchenItem::new("m2", "B", 2, Duration::from_secs(90))),
            )
            .await
            .unwrap()
            .aggregate;

        let ids: Vec<_> = ticket.items().iter().map(|i| i.id().clone()).collect();
        for item_id in &ids {
            s.kitchen
                .update_item_status(&ctx, ticket.id(), item_id, KitchenItemStatus::Cancelled)
                .await
                .unwrap();
        }

        let ticket = s.kitchen.get_ticket(&ctx, ticket.id()).await.unwrap();
        assert_eq!(ticket.status(), KitchenOrderStatus::Cancelled);
        assert_eq!(ticket.estimated_time(), Duration::ZERO);
    }

    #[tokio::test]
    async fn removing_the_unfinished_item_lets_the_ticket_complete() {
        let s = services();
        let ctx = Context::background();

        let ticket = s
            .kitchen
            .create_ticket(
                &ctx,
                CreateKitchenOrder::new("o3")
                    .item(NewKitchenItem::new("m1", "A", 1, Duration::from_secs(300)))
                    .item(NewKitchenItem::new("m2", "B", 1, Duration::from_secs(600))),
            )
            .await
            .unwrap()
            .aggregate;
        let id = ticket.id().clone();
        let a = ticket.items()[0].id().clone();
        let b = ticket.items()[1].id().clone();

        s.kitchen
            .update_status(&ctx, &id, KitchenOrderStatus::Preparing)
            .await
            .unwrap();
        s.kitchen
            .update_item_status(&ctx, &id, &a, KitchenItemStatus::Ready)
            .await
            .unwrap();

        let removed = s.kitchen.remove_item(&ctx, &id, &b).await.unwrap();
        assert_eq!(removed.aggregate.status(), KitchenOrderStatus::Ready);

        let done = s
            .kitchen
            .update_status(&ctx, &id, KitchenOrderStatus::Completed)
            .await
            .unwrap();
        assert_eq!(done.aggregate.status(), KitchenOrderStatus::Completed);
        assert_eq!(s.bus.published_of("KitchenOrderCompleted").len(), 1);
    }

    #[tokio::test]
    async fn removing_the_last_live_item_cancels_the_ticket() {
        let s = services();
        let ctx = Context::background();

        let ticket = s
            .kitchen
            .create_ticket(
                &ctx,
                CreateKitchenOrder::new("o4")
                    .item(NewKitchenItem::new("m1", "C", 1, Duration::from_secs(60)))
                    .item(NewKitchenItem::new("m2", "D", 1, Duration::from_secs(60))),
            )
            .await
            .unwrap()
            .aggregate;
        let id = ticket.id().clone();
        let c = ticket.items()[0].id().clone();
        let d = ticket.items()[1].id().clone();

        s.kitchen
            .update_item_status(&ctx, &id, &c, KitchenItemStatus::Cancelled)
            .await
            .unwrap();
        s.kitchen.remove_item(&ctx, &id, &d).await.unwrap();

        let ticket = s.kitchen.get_ticket(&ctx, &id).await.unwrap();
        assert_eq!(ticket.status(), KitchenOrderStatus::Cancelled);
        let changes = s.bus.published_of("KitchenOrderStatusChanged");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].data["newStatus"], "CANCELLED");
    }
}

mod reservation_lifecycle {
    use super::*;

    #[tokio::test]
    async fn cancelled_reservation_cannot_be_confirmed() {
        let s = services();
        let ctx = Context::background();
        let at = s.clock.now() + chrono::Duration::hours(2);

        let reservation = s
            .reservations
            .create_reservation(&ctx, CreateReservation::new("c1", "t1", at, 4))
            .await
            .unwrap()
            .aggregate;
        assert_eq!(reservation.status(), ReservationStatus::Pending);
        let id = reservation.id().clone();

        let confirmed = s.reservations.confirm(&ctx, &id).await.unwrap().aggregate;
        assert_eq!(confirmed.status(), ReservationStatus::Confirmed);

        let cancelled = s.reservations.cancel(&ctx, &id, None).await.unwrap().aggregate;
        assert_eq!(cancelled.status(), ReservationStatus::Cancelled);

        let err = s.reservations.confirm(&ctx, &id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Business);
        assert_eq!(err.to_string(), "cannot confirm a cancelled reservation");
    }

    #[tokio::test]
    async fn past_dates_are_rejected() {
        let s = services();
        let ctx = Context::background();
        let at = s.clock.now() + chrono::Duration::hours(3);

        let id = s
            .reservations
            .create_reservation(&ctx, CreateReservation::new("c1", "t1", at, 2))
            .await
            .unwrap()
            .aggregate
            .id()
            .clone();

        let err = s
            .reservations
            .reschedule(&ctx, &id, s.clock.now() - chrono::Duration::minutes(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = s
            .reservations
            .create_reservation(
                &ctx,
                CreateReservation::new("c2", "t2", s.clock.now() - chrono::Duration::hours(1), 2),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn double_booking_is_a_conflict() {
        let s = services();
        let ctx = Context::background();
        let at = s.clock.now() + chrono::Duration::hours(4);

        s.reservations
            .create_reservation(&ctx, CreateReservation::new("c1", "t1", at, 2))
            .await
            .unwrap();

        let err = s
            .reservations
            .create_reservation(
                &ctx,
                CreateReservation::new("c2", "t1", at + chrono::Duration::minutes(90), 2),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        s.reservations
            .create_reservation(
                &ctx,
                CreateReservation::new("c3", "t1", at + chrono::Duration::hours(2), 2),
            )
            .await
            .unwrap();
    }
}

mod authorization {
    use super::*;
    use domain::user::Permission;

    fn kitchen_staff() -> Role {
        Role::new(
            "kitchen_staff",
            "",
            vec![
                Permission::new(Resource::Order, Action::Read),
                Permission::new(Resource::Order, Action::Update),
                Permission::new(Resource::Kitchen, Action::Manage),
                Permission::new(Resource::Inventory, Action::Read),
            ],
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn manage_wildcard() {
        let (user, _) =
            User::create("cook@example.com", "hash".into(), Some(kitchen_staff()), Utc::now())
                .unwrap();

        assert!(user.can_access(Resource::Kitchen, Action::Create));
        assert!(user.can_access(Resource::Kitchen, Action::Delete));
        assert!(!user.can_access(Resource::Order, Action::Delete));
        assert!(!user.can_access(Resource::User, Action::Read));
    }

    #[test]
    fn manage_grants_every_action() {
        let role = kitchen_staff();
        for action in Action::ALL {
            assert!(role.allows(Resource::Kitchen, *action), "{action}");
        }
    }
}

mod sessions {
    use super::*;
    use common::{SessionId, UserId};
    use domain::user::{ClientInfo, UserSession};

    #[test]
    fn expired_session() {
        let now = Utc::now();
        let session = UserSession::open(
            SessionId::generate(),
            UserId::from("user_1"),
            "access-digest".into(),
            "refresh-digest".into(),
            now - chrono::Duration::seconds(1),
            ClientInfo::default(),
            now - chrono::Duration::hours(1),
        );

        assert!(session.is_expired(now));
        assert!(!session.is_valid_session(now));
        let err = session.is_valid(now).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "session has expired");
    }
}

mod events {
    use super::*;

    #[tokio::test]
    async fn envelopes_carry_service_and_stable_shape() {
        let s = services();
        let ctx = Context::background();

        s.orders
            .create_order(&ctx, CreateOrder::new("c1", OrderType::Takeout))
            .await
            .unwrap();

        let created = s.bus.published_of("OrderCreated");
        assert_eq!(created.len(), 1);
        let json = serde_json::to_value(&created[0]).unwrap();
        assert_eq!(json["type"], "OrderCreated");
        assert_eq!(json["metadata"]["service"], "order");
        assert!(json["aggregateId"].as_str().unwrap().starts_with("ord_"));
        assert!(json["occurredAt"].is_string());

        let event = domain::order::OrderEvent::from_envelope(&created[0]).unwrap();
        assert_eq!(event.event_type(), "OrderCreated");
    }
}
