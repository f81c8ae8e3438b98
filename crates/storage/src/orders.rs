//! Orders and kitchen tickets.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::OrderId;
use domain::kitchen::{
    KitchenOrder, KitchenOrderFilter, KitchenOrderRepository, KitchenOrderStatus, Priority,
};
use domain::order::{Order, OrderFilter, OrderRepository, OrderStatus};
use domain::{ListQuery, Page, RepositoryResult};

use crate::document::{Column, Document, PgStore};

pub type PgOrderRepository = PgStore<Order>;
pub type PgKitchenOrderRepository = PgStore<KitchenOrder>;

const NEWEST_FIRST: &str = "created_at DESC, id";
const QUEUE_ORDER: &str = "priority_rank DESC, created_at ASC, id";

impl Document for Order {
    const TABLE: &'static str = "orders";

    fn columns(&self) -> Vec<(&'static str, Column)> {
        vec![
            ("customer_id", Column::text(self.customer_id())),
            ("status", Column::text(self.status().as_str())),
            ("order_type", Column::text(self.order_type().as_str())),
            ("table_id", Column::Text(self.table_id().map(str::to_string))),
            ("created_at", Column::time(self.created_at())),
        ]
    }
}

#[async_trait]
impl OrderRepository for PgStore<Order> {
    async fn list(&self, query: &ListQuery<OrderFilter>) -> RepositoryResult<Page<Order>> {
        let filter = &query.filter;
        self.select()
            .filter_opt("status = {}", filter.status, |s| Column::text(s.as_str()))
            .filter_opt("order_type = {}", filter.order_type, |t| Column::text(t.as_str()))
            .filter_opt("customer_id = {}", filter.customer_id.clone(), Column::text)
            .filter_opt("table_id = {}", filter.table_id.clone(), Column::text)
            .order_by(NEWEST_FIRST)
            .fetch_page(self.pool(), query.offset, query.limit)
            .await
    }

    async fn find_by_customer(&self, customer_id: &str) -> RepositoryResult<Vec<Order>> {
        self.select()
            .filter("customer_id = {}", Column::text(customer_id))
            .order_by(NEWEST_FIRST)
            .fetch_all(self.pool())
            .await
    }

    async fn find_by_status(&self, status: OrderStatus) -> RepositoryResult<Vec<Order>> {
        self.select()
            .filter("status = {}", Column::text(status.as_str()))
            .order_by(NEWEST_FIRST)
            .fetch_all(self.pool())
            .await
    }

    async fn find_by_date_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Order>> {
        self.select()
            .filter("created_at >= {}", Column::time(from))
            .filter("created_at < {}", Column::time(to))
            .order_by(NEWEST_FIRST)
            .fetch_all(self.pool())
            .await
    }
}

fn priority_rank(priority: Priority) -> i64 {
    match priority {
        Priority::Low => 0,
        Priority::Normal => 1,
        Priority::High => 2,
        Priority::Urgent => 3,
    }
}

impl Document for KitchenOrder {
    const TABLE: &'static str = "kitchen_orders";

    fn columns(&self) -> Vec<(&'static str, Column)> {
        vec![
            ("order_id", Column::text(self.order_id().as_str())),
            ("status", Column::text(self.status().as_str())),
            ("priority_rank", Column::Int(priority_rank(self.priority()))),
            (
                "assigned_station",
                Column::Text(self.assigned_station().map(str::to_string)),
            ),
            ("created_at", Column::time(self.created_at())),
        ]
    }
}

#[async_trait]
impl KitchenOrderRepository for PgStore<KitchenOrder> {
    async fn list(
        &self,
        query: &ListQuery<KitchenOrderFilter>,
    ) -> RepositoryResult<Page<KitchenOrder>> {
        let filter = &query.filter;
        self.select()
            .filter_opt("status = {}", filter.status, |s| Column::text(s.as_str()))
            .filter_opt("priority_rank = {}", filter.priority, |p| {
                Column::Int(priority_rank(p))
            })
            .filter_opt("assigned_station = {}", filter.station.clone(), Column::text)
            .order_by(QUEUE_ORDER)
            .fetch_page(self.pool(), query.offset, query.limit)
            .await
    }

    async fn find_by_order_id(
        &self,
        order_id: &OrderId,
    ) -> RepositoryResult<Option<KitchenOrder>> {
        self.select()
            .filter("order_id = {}", Column::text(order_id.as_str()))
            .fetch_optional(self.pool())
            .await
    }

    async fn find_by_status(
        &self,
        status: KitchenOrderStatus,
    ) -> RepositoryResult<Vec<KitchenOrder>> {
        self.select()
            .filter("status = {}", Column::text(status.as_str()))
            .order_by(QUEUE_ORDER)
            .fetch_all(self.pool())
            .await
    }

    async fn find_active(&self) -> RepositoryResult<Vec<KitchenOrder>> {
        self.select()
            .condition("status NOT IN ('COMPLETED', 'CANCELLED')")
            .order_by(QUEUE_ORDER)
            .fetch_all(self.pool())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_follow_priority_order() {
        let ranks: Vec<i64> = [Priority::Low, Priority::Normal, Priority::High, Priority::Urgent]
            .into_iter()
            .map(priority_rank)
            .collect();
        assert!(ranks.windows(2).all(|w| w[0] < w[1]));
    }
}
