//! Notes unavailable dishes on upcoming reservations.

use async_trait::async_trait;
use common::Context;
use domain::menu::ItemAvailabilityChangedData;
use domain::reservation::ReservationService;
use domain::Aggregate;
use event_bus::EventEnvelope;

use crate::handler::{EventHandler, Outcome, decode};
use crate::Result;

/// Consumes `ItemAvailabilityChanged`.
#[derive(Clone)]
pub struct ReservationAdvisoryHandler {
    reservations: ReservationService,
}

impl ReservationAdvisoryHandler {
    pub fn new(reservations: ReservationService) -> Self {
        Self { reservations }
    }
}

fn advisory_for(data: &ItemAvailabilityChangedData) -> Option<String> {
    (!data.is_available).then(|| format!("{} is currently unavailable", data.name))
}

#[async_trait]
impl EventHandler for ReservationAdvisoryHandler {
    fn name(&self) -> &'static str {
        "reservation_advisory"
    }

    fn event_types(&self) -> &'static [&'static str] {
        &["ItemAvailabilityChanged"]
    }

    async fn handle(&self, ctx: &Context, event: &EventEnvelope) -> Result<Outcome> {
        let data: ItemAvailabilityChangedData = decode(event)?;
        let advisory = advisory_for(&data);

        let mut changed = 0;
        for reservation in self.reservations.upcoming(ctx).await? {
            if self
                .reservations
                .set_advisory(ctx, reservation.id(), &data.menu_item_id, advisory.clone())
                .await?
            {
                changed += 1;
            }
        }

        if changed == 0 {
            return Ok(Outcome::Skipped);
        }
        tracing::debug!(
            menu_item_id = %data.menu_item_id,
            reservations = changed,
            "advisories updated"
        );
        Ok(Outcome::Applied)
    }
}
