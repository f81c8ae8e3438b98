//! Reservations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::reservation::{OCCUPANCY, Reservation, ReservationFilter, ReservationRepository};
use domain::{ListQuery, Page, RepositoryResult};

use crate::document::{Column, Document, PgStore};

pub type PgReservationRepository = PgStore<Reservation>;

const EARLIEST_FIRST: &str = "date_time ASC, id";

impl Document for Reservation {
    const TABLE: &'static str = "reservations";

    fn columns(&self) -> Vec<(&'static str, Column)> {
        vec![
            ("customer_id", Column::text(self.customer_id())),
            ("table_id", Column::text(self.table_id())),
            ("status", Column::text(self.status().as_str())),
            ("date_time", Column::time(self.date_time())),
        ]
    }
}

#[async_trait]
impl ReservationRepository for PgStore<Reservation> {
    async fn list(
        &self,
        query: &ListQuery<ReservationFilter>,
    ) -> RepositoryResult<Page<Reservation>> {
        let filter = &query.filter;
        self.select()
            .filter_opt("status = {}", filter.status, |s| Column::text(s.as_str()))
            .filter_opt("customer_id = {}", filter.customer_id.clone(), Column::text)
            .filter_opt("table_id = {}", filter.table_id.clone(), Column::text)
            .filter_opt("date_time >= {}", filter.from, Column::time)
            .filter_opt("date_time < {}", filter.to, Column::time)
            .order_by(EARLIEST_FIRST)
            .fetch_page(self.pool(), query.offset, query.limit)
            .await
    }

    async fn find_by_customer(&self, customer_id: &str) -> RepositoryResult<Vec<Reservation>> {
        self.select()
            .filter("customer_id = {}", Column::text(customer_id))
            .order_by(EARLIEST_FIRST)
            .fetch_all(self.pool())
            .await
    }

    async fn find_by_table(
        &self,
        table_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Reservation>> {
        self.select()
            .filter("table_id = {}", Column::text(table_id))
            .filter("date_time > {}", Column::time(from - OCCUPANCY))
            .filter("date_time <= {}", Column::time(to))
            .order_by(EARLIEST_FIRST)
            .fetch_all(self.pool())
            .await
    }

    async fn find_by_date_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Reservation>> {
        self.select()
            .filter("date_time >= {}", Column::time(from))
            .filter("date_time < {}", Column::time(to))
            .order_by(EARLIEST_FIRST)
            .fetch_all(self.pool())
            .await
    }

    async fn find_upcoming(&self, now: DateTime<Utc>) -> RepositoryResult<Vec<Reservation>> {
        self.select()
            .condition("status IN ('PENDING', 'CONFIRMED')")
            .filter("date_time >= {}", Column::time(now))
            .order_by(EARLIEST_FIRST)
            .fetch_all(self.pool())
            .await
    }
}
