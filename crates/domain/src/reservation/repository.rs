//! Reservation persistence contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::memory::MemoryStore;
use crate::repository::{ListQuery, Page, Repository, RepositoryResult};

use super::{OCCUPANCY, Reservation, ReservationFilter, ReservationStatus};

#[async_trait]
pub trait ReservationRepository: Repository<Reservation> {
    /// Earliest first.
    async fn list(
        &self,
        query: &ListQuery<ReservationFilter>,
    ) -> RepositoryResult<Page<Reservation>>;

    async fn find_by_customer(&self, customer_id: &str) -> RepositoryResult<Vec<Reservation>>;

    /// Reservations on `table_id` whose hold may intersect `[from, to]`.
    async fn find_by_table(
        &self,
        table_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Reservation>>;

    /// Reservations starting in `[from, to)`.
    async fn find_by_date_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Reservation>>;

    /// Pending or confirmed reservations starting at or after `now`.
    async fn find_upcoming(&self, now: DateTime<Utc>) -> RepositoryResult<Vec<Reservation>>;
}

pub type InMemoryReservationRepository = MemoryStore<Reservation>;

fn matches_filter(r: &Reservation, filter: &ReservationFilter) -> bool {
    filter.status.is_none_or(|s| r.status() == s)
        && filter
            .customer_id
            .as_deref()
            .is_none_or(|c| r.customer_id() == c)
        && filter
            .table_id
            .as_deref()
            .is_none_or(|t| r.table_id() == t)
        && filter.from.is_none_or(|from| r.date_time() >= from)
        && filter.to.is_none_or(|to| r.date_time() < to)
}

fn earliest_first(mut reservations: Vec<Reservation>) -> Vec<Reservation> {
    reservations.sort_by_key(|r| r.date_time());
    reservations
}

#[async_trait]
impl ReservationRepository for MemoryStore<Reservation> {
    async fn list(
        &self,
        query: &ListQuery<ReservationFilter>,
    ) -> RepositoryResult<Page<Reservation>> {
        let rows = earliest_first(self.filter(|r| matches_filter(r, &query.filter)).await);
        Ok(Page::from_vec(rows, query.offset, query.limit))
    }

    async fn find_by_customer(&self, customer_id: &str) -> RepositoryResult<Vec<Reservation>> {
        Ok(earliest_first(
            self.filter(|r| r.customer_id() == customer_id).await,
        ))
    }

    async fn find_by_table(
        &self,
        table_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Reservation>> {
        let earliest = from - OCCUPANCY;
        Ok(earliest_first(
            self.filter(|r| {
                r.table_id() == table_id && r.date_time() > earliest && r.date_time() <= to
            })
            .await,
        ))
    }

    async fn find_by_date_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Reservation>> {
        Ok(earliest_first(
            self.filter(|r| r.date_time() >= from && r.date_time() < to)
                .await,
        ))
    }

    async fn find_upcoming(&self, now: DateTime<Utc>) -> RepositoryResult<Vec<Reservation>> {
        Ok(earliest_first(
            self.filter(|r| {
                matches!(
                    r.status(),
                    ReservationStatus::Pending | ReservationStatus::Confirmed
                ) && r.date_time() >= now
            })
            .await,
        ))
    }
}
