//! Order persistence contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::memory::MemoryStore;
use crate::repository::{ListQuery, Page, Repository, RepositoryResult};

use super::{Order, OrderFilter, OrderStatus};

#[async_trait]
pub trait OrderRepository: Repository<Order> {
    /// Newest first.
    async fn list(&self, query: &ListQuery<OrderFilter>) -> RepositoryResult<Page<Order>>;

    async fn find_by_customer(&self, customer_id: &str) -> RepositoryResult<Vec<Order>>;

    async fn find_by_status(&self, status: OrderStatus) -> RepositoryResult<Vec<Order>>;

    /// Orders created in `[from, to)`.
    async fn find_by_date_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Order>>;
}

pub type InMemoryOrderRepository = MemoryStore<Order>;

fn matches_filter(order: &Order, filter: &OrderFilter) -> bool {
    filter.status.is_none_or(|s| order.status() == s)
        && filter.order_type.is_none_or(|t| order.order_type() == t)
        && filter
            .customer_id
            .as_deref()
            .is_none_or(|c| order.customer_id() == c)
        && filter
            .table_id
            .as_deref()
            .is_none_or(|t| order.table_id() == Some(t))
}

fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    orders
}

#[async_trait]
impl OrderRepository for MemoryStore<Order> {
    async fn list(&self, query: &ListQuery<OrderFilter>) -> RepositoryResult<Page<Order>> {
        let orders = newest_first(self.filter(|o| matches_filter(o, &query.filter)).await);
        Ok(Page::from_vec(orders, query.offset, query.limit))
    }

    async fn find_by_customer(&self, customer_id: &str) -> RepositoryResult<Vec<Order>> {
        Ok(newest_first(
            self.filter(|o| o.customer_id() == customer_id).await,
        ))
    }

    async fn find_by_status(&self, status: OrderStatus) -> RepositoryResult<Vec<Order>> {
        Ok(newest_first(self.filter(|o| o.status() == status).await))
    }

    async fn find_by_date_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Order>> {
        Ok(newest_first(
            self.filter(|o| o.created_at() >= from && o.created_at() < to)
                .await,
        ))
    }
}
