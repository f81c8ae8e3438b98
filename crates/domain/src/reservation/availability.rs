//! Table availability policy.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::Reservation;

/// A table that could host a party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCandidate {
    pub table_id: String,
    pub capacity: i32,
}

impl TableCandidate {
    pub fn new(table_id: impl Into<String>, capacity: i32) -> Self {
        Self {
            table_id: table_id.into(),
            capacity,
        }
    }
}

/// Returns the ids of the candidates that seat `party_size` and have no
/// table-holding reservation overlapping `[start, start + duration]`.
///
/// Candidates keep their input order.
pub fn available_tables(
    candidates: &[TableCandidate],
    existing: &[Reservation],
    start: DateTime<Utc>,
    duration: Duration,
    party_size: i32,
) -> Vec<String> {
    let end = start + duration;
    candidates
        .iter()
        .filter(|c| c.capacity >= party_size)
        .filter(|c| {
            !existing
                .iter()
                .any(|r| r.table_id() == c.table_id && r.overlaps(start, end))
        })
        .map(|c| c.table_id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reservation::OCCUPANCY;
    use chrono::TimeZone;

    #[test]
    fn booked_and_small_tables_are_excluded() {
        let now = Utc.with_ymd_and_hms(2025, 5, 10, 12, 0, 0).unwrap();
        let at = now + Duration::hours(6);
        let (booked, _) = Reservation::create("c1", "t1", at, 2, now).unwrap();
        let (mut cancelled, _) = Reservation::create("c2", "t2", at, 2, now).unwrap();
        cancelled.cancel(None, now).unwrap();

        let candidates = [
            TableCandidate::new("t1", 4),
            TableCandidate::new("t2", 4),
            TableCandidate::new("t3", 2),
            TableCandidate::new("t4", 6),
        ];
        let existing = [booked, cancelled];

        let free = available_tables(&candidates, &existing, at + Duration::hours(1), OCCUPANCY, 4);
        assert_eq!(free, ["t2", "t4"]);

        let after = available_tables(&candidates, &existing, at + OCCUPANCY, OCCUPANCY, 4);
        assert_eq!(after, ["t1", "t2", "t4"]);
    }
}
