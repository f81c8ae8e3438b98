//! Table reservations.

mod aggregate;
mod availability;
mod commands;
mod events;
mod repository;
mod service;
mod state;

pub use aggregate::{OCCUPANCY, Reservation};
pub use availability::{TableCandidate, available_tables};
pub use commands::{CreateReservation, ReservationFilter};
pub use events::{
    ReservationCancelledData, ReservationCreatedData, ReservationEvent,
    ReservationRescheduledData, ReservationTransitionData,
};
pub use repository::{InMemoryReservationRepository, ReservationRepository};
pub use service::ReservationService;
pub use state::ReservationStatus;

use chrono::{DateTime, Utc};
use common::{Classify, ErrorKind, codes};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReservationError {
    #[error("customer id is required")]
    MissingCustomer,

    #[error("table id is required")]
    MissingTable,

    #[error("invalid party size: {party_size} (must be at least 1)")]
    InvalidPartySize { party_size: i32 },

    #[error("reservation time {date_time} is in the past")]
    PastDateTime { date_time: DateTime<Utc> },

    #[error("notes must not be empty")]
    EmptyNotes,

    #[error("cannot {action} a {} reservation", .status.label())]
    InvalidState {
        action: &'static str,
        status: ReservationStatus,
    },

    #[error("table {table_id} is not available at {date_time}")]
    TableUnavailable {
        table_id: String,
        date_time: DateTime<Utc>,
    },
}

impl Classify for ReservationError {
    fn kind(&self) -> ErrorKind {
        match self {
            ReservationError::InvalidState { .. } => ErrorKind::Business,
            ReservationError::TableUnavailable { .. } => ErrorKind::Conflict,
            _ => ErrorKind::Validation,
        }
    }

    fn code(&self) -> Option<&'static str> {
        match self {
            ReservationError::InvalidState { .. } => Some(codes::INVALID_RESERVATION_STATE),
            _ => None,
        }
    }
}
