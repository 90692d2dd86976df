//! Event entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use eventhub_core::{AppError, AppResult};

use super::status::EventStatus;

/// An event with a fixed number of seats.
///
/// `capacity` is the immutable floor of everything ever allocatable
/// (it may only grow post-creation); `available_capacity` is what is
/// left after active reservations. The pair is mutated exclusively
/// through the capacity ledger, and `revision` increases on every
/// write so concurrent writers can be detected.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    /// Unique event identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Venue or address.
    pub location: String,
    /// When the event takes place.
    pub event_date: DateTime<Utc>,
    /// Total seats ever allocatable.
    pub capacity: i32,
    /// Seats not yet held by an active ticket.
    pub available_capacity: i32,
    /// Current lifecycle phase.
    pub status: EventStatus,
    /// Monotonically increasing write counter used for conflict detection.
    pub revision: i64,
    /// When the event row was created.
    pub created_at: DateTime<Utc>,
    /// When the event row was last written.
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Number of seats currently held by active tickets.
    pub fn tickets_sold(&self) -> i32 {
        self.capacity - self.available_capacity
    }

    /// Check if no seats remain.
    pub fn is_sold_out(&self) -> bool {
        self.available_capacity <= 0
    }

    /// Check if the event date has already passed.
    pub fn is_past(&self) -> bool {
        self.event_date <= Utc::now()
    }

    /// Check if new tickets may be purchased right now.
    ///
    /// Requires an active status AND a future date; the two are
    /// independent so a stale scheduled event with a past date is
    /// still rejected.
    pub fn is_purchasable(&self) -> bool {
        self.status.is_active() && !self.is_past()
    }

    /// Fraction of capacity sold, as a percentage.
    pub fn occupancy_rate(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        f64::from(self.tickets_sold()) / f64::from(self.capacity) * 100.0
    }

    /// Validate a lifecycle transition without applying it.
    pub fn ensure_transition(&self, next: EventStatus) -> AppResult<()> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(AppError::invalid_state(format!(
                "Event '{}' cannot transition from {} to {}",
                self.name, self.status, next
            )))
        }
    }
}

/// Data required to create a new event.
///
/// The row is created with `available_capacity = capacity` and
/// `status = scheduled`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEvent {
    /// Display name.
    pub name: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Venue or address.
    pub location: String,
    /// When the event takes place.
    pub event_date: DateTime<Utc>,
    /// Total seats.
    pub capacity: i32,
}

impl CreateEvent {
    /// Validate the creation request.
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("Event name must not be empty"));
        }
        if self.capacity < 1 {
            return Err(AppError::validation(format!(
                "Event capacity must be at least 1, got {}",
                self.capacity
            )));
        }
        if self.event_date <= Utc::now() {
            return Err(AppError::validation("Event date must be in the future"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_event(capacity: i32, available: i32) -> Event {
        let now = Utc::now();
        Event {
            id: Uuid::new_v4(),
            name: "RustConf".to_string(),
            description: None,
            location: "Porto Alegre".to_string(),
            event_date: now + Duration::days(30),
            capacity,
            available_capacity: available,
            status: EventStatus::Scheduled,
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_tickets_sold_is_capacity_minus_available() {
        let event = sample_event(100, 73);
        assert_eq!(event.tickets_sold(), 27);
        assert!(!event.is_sold_out());

        let full = sample_event(100, 0);
        assert_eq!(full.tickets_sold(), 100);
        assert!(full.is_sold_out());
    }

    #[test]
    fn test_purchasable_requires_active_status_and_future_date() {
        let mut event = sample_event(10, 10);
        assert!(event.is_purchasable());

        event.status = EventStatus::Cancelled;
        assert!(!event.is_purchasable());

        // Scheduled but with a past date: the data anomaly is rejected too.
        let mut stale = sample_event(10, 10);
        stale.event_date = Utc::now() - Duration::hours(1);
        assert!(stale.is_past());
        assert!(!stale.is_purchasable());
    }

    #[test]
    fn test_ensure_transition_names_both_states() {
        let event = sample_event(10, 10);
        let err = event
            .ensure_transition(EventStatus::Completed)
            .expect_err("scheduled -> completed is illegal");
        assert!(err.message.contains("scheduled"));
        assert!(err.message.contains("completed"));
    }

    #[test]
    fn test_create_event_validation() {
        let mut create = CreateEvent {
            name: "RustConf".to_string(),
            description: None,
            location: "Porto Alegre".to_string(),
            event_date: Utc::now() + Duration::days(1),
            capacity: 50,
        };
        assert!(create.validate().is_ok());

        create.capacity = 0;
        assert!(create.validate().is_err());

        create.capacity = 50;
        create.event_date = Utc::now() - Duration::days(1);
        assert!(create.validate().is_err());

        create.event_date = Utc::now() + Duration::days(1);
        create.name = "   ".to_string();
        assert!(create.validate().is_err());
    }
}
