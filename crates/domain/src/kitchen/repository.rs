//! Kitchen ticket persistence contract.

use async_trait::async_trait;
use common::OrderId;

use crate::memory::MemoryStore;
use crate::repository::{ListQuery, Page, Repository, RepositoryResult};

use super::{KitchenOrder, KitchenOrderFilter, KitchenOrderStatus};

#[async_trait]
pub trait KitchenOrderRepository: Repository<KitchenOrder> {
    /// Queue order: most urgent first, then oldest first.
    async fn list(
        &self,
        query: &ListQuery<KitchenOrderFilter>,
    ) -> RepositoryResult<Page<KitchenOrder>>;

    async fn find_by_order_id(&self, order_id: &OrderId)
    -> RepositoryResult<Option<KitchenOrder>>;

    async fn find_by_status(
        &self,
        status: KitchenOrderStatus,
    ) -> RepositoryResult<Vec<KitchenOrder>>;

    /// Tickets not yet completed or cancelled, in queue order.
    async fn find_active(&self) -> RepositoryResult<Vec<KitchenOrder>>;
}

pub type InMemoryKitchenOrderRepository = MemoryStore<KitchenOrder>;

fn matches_filter(ticket: &KitchenOrder, filter: &KitchenOrderFilter) -> bool {
    filter.status.is_none_or(|s| ticket.status() == s)
        && filter.priority.is_none_or(|p| ticket.priority() == p)
        && filter
            .station
            .as_deref()
            .is_none_or(|s| ticket.assigned_station() == Some(s))
}

fn queue_order(mut tickets: Vec<KitchenOrder>) -> Vec<KitchenOrder> {
    tickets.sort_by(|a, b| {
        b.priority()
            .cmp(&a.priority())
            .then_with(|| a.created_at().cmp(&b.created_at()))
    });
    tickets
}

#[async_trait]
impl KitchenOrderRepository for MemoryStore<KitchenOrder> {
    async fn list(
        &self,
        query: &ListQuery<KitchenOrderFilter>,
    ) -> RepositoryResult<Page<KitchenOrder>> {
        let tickets = queue_order(self.filter(|t| matches_filter(t, &query.filter)).await);
        Ok(Page::from_vec(tickets, query.offset, query.limit))
    }

    async fn find_by_order_id(
        &self,
        order_id: &OrderId,
    ) -> RepositoryResult<Option<KitchenOrder>> {
        Ok(self.find_first(|t| t.order_id() == order_id).await)
    }

    async fn find_by_status(
        &self,
        status: KitchenOrderStatus,
    ) -> RepositoryResult<Vec<KitchenOrder>> {
        Ok(queue_order(self.filter(|t| t.status() == status).await))
    }

    async fn find_active(&self) -> RepositoryResult<Vec<KitchenOrder>> {
        Ok(queue_order(
            self.filter(|t| !t.status().is_terminal()).await,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kitchen::Priority;
    use chrono::{Duration, TimeZone, Utc};

    #[tokio::test]
    async fn queue_puts_urgent_and_old_first() {
        let repo = InMemoryKitchenOrderRepository::new();
        let t0 = Utc.with_ymd_and_hms(2025, 5, 10, 19, 0, 0).unwrap();

        let (normal_old, _) =
            KitchenOrder::create(OrderId::from("o1"), None, Priority::Normal, t0).unwrap();
        let (normal_new, _) = KitchenOrder::create(
            OrderId::from("o2"),
            None,
            Priority::Normal,
            t0 + Duration::minutes(1),
        )
        .unwrap();
        let (urgent, _) = KitchenOrder::create(
            OrderId::from("o3"),
            None,
            Priority::Urgent,
            t0 + Duration::minutes(2),
        )
        .unwrap();
        for t in [&normal_new, &urgent, &normal_old] {
            repo.insert(t).await.unwrap();
        }

        let active = repo.find_active().await.unwrap();
        let orders: Vec<&str> = active.iter().map(|t| t.order_id().as_str()).collect();
        assert_eq!(orders, ["o3", "o1", "o2"]);

        let found = repo.find_by_order_id(&OrderId::from("o2")).await.unwrap();
        assert_eq!(found.map(|t| t.order_id().clone()), Some(OrderId::from("o2")));
        assert!(
            repo.find_by_order_id(&OrderId::from("o9"))
                .await
                .unwrap()
                .is_none()
        );
    }
}
