use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::{Context, FixedClock};
use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use domain::kitchen::{KitchenItemStatus, KitchenOrder, NewKitchenItem, Priority};
use domain::order::{
    CreateOrder, InMemoryOrderRepository, NewOrderItem, Order, OrderService, OrderStatus,
    OrderType, Pricing,
};
use domain::Aggregate;
use event_bus::InMemoryEventBus;

fn order_with_items(count: usize) -> Order {
    let now = Utc::now();
    let (mut order, _) = Order::create("bench", OrderType::Takeout, now).unwrap();
    for i in 0..count {
        let item = NewOrderItem::new(format!("item_{i}"), format!("Dish {i}"), 2, 9.5 + i as f64);
        order.add_item(item, now).unwrap();
    }
    order
}

fn bench_pricing(c: &mut Criterion) {
    let order = order_with_items(50);

    c.bench_function("order/pricing_50_lines", |b| {
        b.iter(|| Pricing::of(order.items()));
    });

    c.bench_function("order/add_item_recalculates", |b| {
        b.iter_batched(
            || order_with_items(20),
            |mut order| {
                order
                    .add_item(NewOrderItem::new("item_x", "Extra", 1, 4.0), Utc::now())
                    .unwrap()
            },
            BatchSize::SmallInput,
        );
    });
}

fn ticket_with_items(count: usize) -> KitchenOrder {
    let now = Utc::now();
    let (mut ticket, _) =
        KitchenOrder::create("ord_bench".into(), None, Priority::Normal, now).unwrap();
    for i in 0..count {
        let prep = Duration::from_secs(60 * (i as u64 + 1));
        ticket
            .add_item(NewKitchenItem::new(format!("item_{i}"), format!("Dish {i}"), 1, prep), now)
            .unwrap();
    }
    ticket
}

fn bench_kitchen_rollup(c: &mut Criterion) {
    c.bench_function("kitchen/rollup_10_items_to_ready", |b| {
        b.iter_batched(
            || ticket_with_items(10),
            |mut ticket| {
                let now = Utc::now();
                let ids: Vec<_> = ticket.items().iter().map(|i| i.id().clone()).collect();
                for id in &ids {
                    ticket
                        .update_item_status(id, KitchenItemStatus::Preparing, now)
                        .unwrap();
                    ticket
                        .update_item_status(id, KitchenItemStatus::Ready, now)
                        .unwrap();
                }
                ticket
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_command_cycle(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = OrderService::new(
        Arc::new(InMemoryOrderRepository::new()),
        Arc::new(InMemoryEventBus::new()),
        Arc::new(FixedClock::new(Utc::now())),
    );
    let ctx = Context::background();

    c.bench_function("order/create_add_pay", |b| {
        b.iter(|| {
            rt.block_on(async {
                let order = service
                    .create_order(&ctx, CreateOrder::new("bench", OrderType::Takeout))
                    .await
                    .unwrap()
                    .aggregate;
                service
                    .add_item(&ctx, order.id(), NewOrderItem::new("item_1", "Dish", 2, 10.0))
                    .await
                    .unwrap();
                service
                    .update_status(&ctx, order.id(), OrderStatus::Paid)
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_pricing, bench_kitchen_rollup, bench_command_cycle);
criterion_main!(benches);
