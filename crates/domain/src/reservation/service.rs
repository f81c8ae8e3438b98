//! Reservation service.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use common::{Clock, Context, MenuItemId, ReservationId};
use event_bus::EventPublisher;

use crate::aggregate::Aggregate;
use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;
use crate::repository::{ListQuery, Page};

use super::{
    CreateReservation, OCCUPANCY, Reservation, ReservationError, ReservationFilter,
    ReservationRepository, TableCandidate, available_tables,
};

pub const SERVICE_NAME: &str = "reservation";

#[derive(Clone)]
pub struct ReservationService {
    handler: CommandHandler<Reservation, dyn ReservationRepository>,
}

impl ReservationService {
    pub fn new(
        repository: Arc<dyn ReservationRepository>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            handler: CommandHandler::new(SERVICE_NAME, repository, publisher, clock),
        }
    }

    fn repository(&self) -> &Arc<dyn ReservationRepository> {
        self.handler.repository()
    }

    /// Fails with a conflict if another booking holds the table at that time.
    async fn ensure_table_free(
        &self,
        ctx: &Context,
        table_id: &str,
        date_time: DateTime<Utc>,
        except: Option<&ReservationId>,
    ) -> Result<(), DomainError> {
        let end = date_time + OCCUPANCY;
        let existing = ctx
            .run(self.repository().find_by_table(table_id, date_time, end))
            .await??;

        let taken = existing
            .iter()
            .filter(|r| Some(r.id()) != except)
            .any(|r| r.overlaps(date_time, end));
        if taken {
            return Err(ReservationError::TableUnavailable {
                table_id: table_id.to_string(),
                date_time,
            }
            .into());
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, ctx, cmd), fields(table_id = %cmd.table_id))]
    pub async fn create_reservation(
        &self,
        ctx: &Context,
        cmd: CreateReservation,
    ) -> Result<CommandResult<Reservation>, DomainError> {
        let now = self.handler.now();
        let (mut reservation, events) = Reservation::create(
            cmd.customer_id,
            cmd.table_id,
            cmd.date_time,
            cmd.party_size,
            now,
        )?;
        if let Some(notes) = cmd.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            reservation.add_notes(notes, now)?;
        }

        self.ensure_table_free(ctx, reservation.table_id(), reservation.date_time(), None)
            .await?;

        let result = self.handler.create(ctx, reservation, events).await?;
        tracing::info!(reservation_id = %result.aggregate.id(), "reservation created");
        Ok(result)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn get_reservation(
        &self,
        ctx: &Context,
        id: &ReservationId,
    ) -> Result<Reservation, DomainError> {
        self.handler.load(ctx, id).await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn list_reservations(
        &self,
        ctx: &Context,
        query: ListQuery<ReservationFilter>,
    ) -> Result<Page<Reservation>, DomainError> {
        Ok(ctx.run(self.repository().list(&query)).await??)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn reservations_for_customer(
        &self,
        ctx: &Context,
        customer_id: &str,
    ) -> Result<Vec<Reservation>, DomainError> {
        Ok(ctx
            .run(self.repository().find_by_customer(customer_id))
            .await??)
    }

    /// Open reservations from now on.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn upcoming(&self, ctx: &Context) -> Result<Vec<Reservation>, DomainError> {
        let now = self.handler.now();
        Ok(ctx.run(self.repository().find_upcoming(now)).await??)
    }

    /// Candidate tables free for the whole window and big enough.
    #[tracing::instrument(skip(self, ctx, candidates))]
    pub async fn check_availability(
        &self,
        ctx: &Context,
        candidates: &[TableCandidate],
        start: DateTime<Utc>,
        duration: Duration,
        party_size: i32,
    ) -> Result<Vec<String>, DomainError> {
        let end = start + duration;
        let existing = ctx
            .run(
                self.repository()
                    .find_by_date_range(start - OCCUPANCY, end),
            )
            .await??;
        Ok(available_tables(
            candidates, &existing, start, duration, party_size,
        ))
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn confirm(
        &self,
        ctx: &Context,
        id: &ReservationId,
    ) -> Result<CommandResult<Reservation>, DomainError> {
        self.handler
            .execute(ctx, id, |r, now| r.confirm(now))
            .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn cancel(
        &self,
        ctx: &Context,
        id: &ReservationId,
        reason: Option<String>,
    ) -> Result<CommandResult<Reservation>, DomainError> {
        self.handler
            .execute(ctx, id, |r, now| r.cancel(reason, now))
            .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn complete(
        &self,
        ctx: &Context,
        id: &ReservationId,
    ) -> Result<CommandResult<Reservation>, DomainError> {
        self.handler
            .execute(ctx, id, |r, now| r.complete(now))
            .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn mark_no_show(
        &self,
        ctx: &Context,
        id: &ReservationId,
    ) -> Result<CommandResult<Reservation>, DomainError> {
        self.handler
            .execute(ctx, id, |r, now| r.mark_no_show(now))
            .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn reschedule(
        &self,
        ctx: &Context,
        id: &ReservationId,
        date_time: DateTime<Utc>,
    ) -> Result<CommandResult<Reservation>, DomainError> {
        let current = self.handler.load(ctx, id).await?;
        self.ensure_table_free(ctx, current.table_id(), date_time, Some(id))
            .await?;

        self.handler
            .execute(ctx, id, |r, now| r.update_date_time(date_time, now))
            .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn update_table(
        &self,
        ctx: &Context,
        id: &ReservationId,
        table_id: String,
    ) -> Result<CommandResult<Reservation>, DomainError> {
        let current = self.handler.load(ctx, id).await?;
        self.ensure_table_free(ctx, &table_id, current.date_time(), Some(id))
            .await?;

        self.handler
            .execute(ctx, id, |r, now| {
                r.update_table(table_id, now).map(|_| Vec::new())
            })
            .await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn update_party_size(
        &self,
        ctx: &Context,
        id: &ReservationId,
        party_size: i32,
    ) -> Result<CommandResult<Reservation>, DomainError> {
        self.handler
            .execute(ctx, id, |r, now| {
                r.update_party_size(party_size, now).map(|_| Vec::new())
            })
            .await
    }

    #[tracing::instrument(skip(self, ctx, notes))]
    pub async fn add_notes(
        &self,
        ctx: &Context,
        id: &ReservationId,
        notes: String,
    ) -> Result<CommandResult<Reservation>, DomainError> {
        self.handler
            .execute(ctx, id, |r, now| r.add_notes(&notes, now).map(|_| Vec::new()))
            .await
    }

    /// Sets or clears a menu advisory. Writes only when the advisory
    /// actually changes; returns whether it did.
    #[tracing::instrument(skip(self, ctx, advisory))]
    pub async fn set_advisory(
        &self,
        ctx: &Context,
        id: &ReservationId,
        menu_item_id: &MenuItemId,
        advisory: Option<String>,
    ) -> Result<bool, DomainError> {
        let mut current = self.handler.load(ctx, id).await?;
        if !current.set_advisory(menu_item_id, advisory.clone(), self.handler.now()) {
            return Ok(false);
        }

        self.handler
            .execute(ctx, id, |r, now| {
                r.set_advisory(menu_item_id, advisory, now);
                Ok(Vec::new())
            })
            .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reservation::{InMemoryReservationRepository, ReservationStatus};
    use chrono::TimeZone;
    use common::{Classify, ErrorKind, FixedClock};
    use event_bus::InMemoryEventBus;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 10, 12, 0, 0).unwrap()
    }

    fn service(bus: &InMemoryEventBus) -> ReservationService {
        ReservationService::new(
            Arc::new(InMemoryReservationRepository::new()),
            Arc::new(bus.clone()),
            Arc::new(FixedClock::new(now())),
        )
    }

    #[tokio::test]
    async fn double_booking_is_a_conflict() {
        let bus = InMemoryEventBus::with_capture();
        let service = service(&bus);
        let ctx = Context::background();
        let at = now() + Duration::hours(6);

        service
            .create_reservation(&ctx, CreateReservation::new("c1", "t1", at, 2))
            .await
            .unwrap();
        let err = service
            .create_reservation(
                &ctx,
                CreateReservation::new("c2", "t1", at + Duration::hours(1), 2),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        service
            .create_reservation(
                &ctx,
                CreateReservation::new("c2", "t1", at + Duration::hours(2), 2),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn reschedule_ignores_own_booking() {
        let bus = InMemoryEventBus::with_capture();
        let service = service(&bus);
        let ctx = Context::background();
        let at = now() + Duration::hours(6);

        let created = service
            .create_reservation(&ctx, CreateReservation::new("c1", "t1", at, 2))
            .await
            .unwrap();
        let id = created.aggregate.id().clone();

        let moved = service
            .reschedule(&ctx, &id, at + Duration::minutes(30))
            .await
            .unwrap();
        assert_eq!(moved.aggregate.date_time(), at + Duration::minutes(30));
        assert_eq!(bus.published_of("ReservationRescheduled").len(), 1);
    }

    #[tokio::test]
    async fn advisory_writes_only_on_change() {
        let bus = InMemoryEventBus::with_capture();
        let service = service(&bus);
        let ctx = Context::background();

        let created = service
            .create_reservation(
                &ctx,
                CreateReservation::new("c1", "t1", now() + Duration::hours(3), 2),
            )
            .await
            .unwrap();
        let id = created.aggregate.id().clone();
        let item = MenuItemId::from("item_1");

        assert!(service.set_advisory(&ctx, &id, &item, Some("off".into())).await.unwrap());
        assert!(!service.set_advisory(&ctx, &id, &item, Some("off".into())).await.unwrap());

        let stored = service.get_reservation(&ctx, &id).await.unwrap();
        assert_eq!(stored.advisory(&item), Some("off"));
        assert_eq!(stored.version().as_i64(), 2);
        assert_eq!(stored.status(), ReservationStatus::Pending);
    }

    #[tokio::test]
    async fn availability_query() {
        let bus = InMemoryEventBus::with_capture();
        let service = service(&bus);
        let ctx = Context::background();
        let at = now() + Duration::hours(6);

        service
            .create_reservation(&ctx, CreateReservation::new("c1", "t1", at, 2))
            .await
            .unwrap();

        let free = service
            .check_availability(
                &ctx,
                &[TableCandidate::new("t1", 4), TableCandidate::new("t2", 4)],
                at + Duration::minutes(30),
                OCCUPANCY,
                3,
            )
            .await
            .unwrap();
        assert_eq!(free, ["t2"]);
    }
}
