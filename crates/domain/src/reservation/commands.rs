//! Reservation command inputs and query filters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ReservationStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservation {
    pub customer_id: String,
    pub table_id: String,
    pub date_time: DateTime<Utc>,
    pub party_size: i32,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateReservation {
    pub fn new(
        customer_id: impl Into<String>,
        table_id: impl Into<String>,
        date_time: DateTime<Utc>,
        party_size: i32,
    ) -> Self {
        Self {
            customer_id: customer_id.into(),
            table_id: table_id.into(),
            date_time,
            party_size,
            notes: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationFilter {
    pub status: Option<ReservationStatus>,
    pub customer_id: Option<String>,
    pub table_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}
