//! Reservation state machine.

use common::wire_enum;

wire_enum! {
    /// ```text
    /// PENDING ──► CONFIRMED ──► COMPLETED
    ///    │            │
    ///    ├────────────┴──► CANCELLED
    ///    └────────────┴──► NO_SHOW
    /// ```
    #[derive(Default)]
    pub enum ReservationStatus: "reservation status" {
        #[default]
        Pending => "PENDING",
        Confirmed => "CONFIRMED",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
        NoShow => "NO_SHOW",
    }
}

impl ReservationStatus {
    pub fn can_transition_to(&self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Confirmed, Completed)
                | (Pending | Confirmed, Cancelled)
                | (Pending | Confirmed, NoShow)
        )
    }

    /// Pending and confirmed reservations can still change.
    pub fn is_open(&self) -> bool {
        matches!(self, ReservationStatus::Pending | ReservationStatus::Confirmed)
    }

    /// Returns true if a reservation in this status occupies its table.
    pub fn blocks_table(&self) -> bool {
        !matches!(self, ReservationStatus::Cancelled | ReservationStatus::NoShow)
    }

    /// Lower-case word used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::NoShow => "no-show",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ReservationStatus::*;

    #[test]
    fn transitions() {
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Pending.can_transition_to(NoShow));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Confirmed));
    }

    #[test]
    fn cancelled_and_no_show_free_the_table() {
        assert!(Pending.blocks_table());
        assert!(Completed.blocks_table());
        assert!(!Cancelled.blocks_table());
        assert!(!NoShow.blocks_table());
    }
}
