//! Ticket entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use eventhub_core::{AppError, AppResult};

use crate::event::Event;

use super::participant::Participant;
use super::status::TicketStatus;

/// A single issued ticket.
///
/// References its event and holder by id only; the event row is looked
/// up when lifecycle rules need it. At most one active ticket may exist
/// per (event, user) pair.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ticket {
    /// Unique ticket identifier.
    pub id: Uuid,
    /// The event this ticket reserves a seat for.
    pub event_id: Uuid,
    /// The user who purchased the ticket.
    pub user_id: Uuid,
    /// Who is attending.
    #[sqlx(flatten)]
    pub participant: Participant,
    /// Current lifecycle state.
    pub status: TicketStatus,
    /// Unique human-presentable confirmation code, immutable once assigned.
    pub confirmation_code: String,
    /// When the purchase completed.
    pub purchase_date: DateTime<Utc>,
    /// When the ticket was redeemed, if it has been.
    pub check_in_at: Option<DateTime<Utc>>,
    /// When the ticket row was created.
    pub created_at: DateTime<Utc>,
    /// When the ticket row was last written.
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Construct a new active ticket for a successful reservation.
    pub fn new(
        event_id: Uuid,
        user_id: Uuid,
        participant: Participant,
        confirmation_code: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            event_id,
            user_id,
            participant,
            status: TicketStatus::Active,
            confirmation_code,
            purchase_date: now,
            check_in_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the ticket currently holds a seat.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Check if the ticket belongs to the given user.
    pub fn belongs_to(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Validate a lifecycle transition without applying it.
    ///
    /// Any attempt to move out of a terminal state fails with
    /// `InvalidState`, naming the current and attempted states.
    pub fn ensure_transition(&self, next: TicketStatus) -> AppResult<()> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(AppError::invalid_state(format!(
                "Ticket {} cannot transition from {} to {}",
                self.id, self.status, next
            )))
        }
    }

    /// Validate that the ticket may be redeemed at check-in: it must be
    /// active and the event date must not have passed.
    pub fn ensure_usable(&self, event: &Event) -> AppResult<()> {
        self.ensure_transition(TicketStatus::Used)?;
        if event.is_past() {
            return Err(AppError::past_event(format!(
                "Cannot check in ticket {} for past event '{}'",
                self.confirmation_code, event.name
            )));
        }
        Ok(())
    }

    /// Validate that the ticket may be cancelled: it must be active and
    /// the event date must not have passed. The seat release happens in
    /// the same atomic store operation as the status change.
    pub fn ensure_cancellable(&self, event: &Event) -> AppResult<()> {
        self.ensure_transition(TicketStatus::Cancelled)?;
        if event.is_past() {
            return Err(AppError::past_event(format!(
                "Cannot cancel ticket {} for past event '{}'",
                self.confirmation_code, event.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventStatus;
    use chrono::Duration;

    fn future_event() -> Event {
        let now = Utc::now();
        Event {
            id: Uuid::new_v4(),
            name: "RustConf".to_string(),
            description: None,
            location: "Porto Alegre".to_string(),
            event_date: now + Duration::days(7),
            capacity: 10,
            available_capacity: 9,
            status: EventStatus::Scheduled,
            revision: 1,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_ticket(event: &Event) -> Ticket {
        Ticket::new(
            event.id,
            Uuid::new_v4(),
            Participant::new("Ada Lovelace", "ada@example.com"),
            "A2C4E6".to_string(),
        )
    }

    #[test]
    fn test_new_ticket_is_active_with_no_check_in() {
        let event = future_event();
        let ticket = sample_ticket(&event);
        assert!(ticket.is_active());
        assert!(ticket.check_in_at.is_none());
        assert!(ticket.ensure_usable(&event).is_ok());
        assert!(ticket.ensure_cancellable(&event).is_ok());
    }

    #[test]
    fn test_usable_rejects_past_event() {
        let mut event = future_event();
        event.event_date = Utc::now() - Duration::hours(2);
        let ticket = sample_ticket(&event);

        let err = ticket.ensure_usable(&event).expect_err("past event");
        assert_eq!(err.kind, eventhub_core::ErrorKind::PastEvent);
        let err = ticket.ensure_cancellable(&event).expect_err("past event");
        assert_eq!(err.kind, eventhub_core::ErrorKind::PastEvent);
    }

    #[test]
    fn test_terminal_ticket_rejects_everything() {
        let event = future_event();
        let mut ticket = sample_ticket(&event);
        ticket.status = TicketStatus::Cancelled;

        let err = ticket
            .ensure_usable(&event)
            .expect_err("cancelled is terminal");
        assert_eq!(err.kind, eventhub_core::ErrorKind::InvalidState);
        assert!(err.message.contains("cancelled"));
        assert!(err.message.contains("used"));

        ticket.status = TicketStatus::Used;
        let err = ticket
            .ensure_cancellable(&event)
            .expect_err("used is terminal");
        assert_eq!(err.kind, eventhub_core::ErrorKind::InvalidState);
    }

    #[test]
    fn test_belongs_to() {
        let event = future_event();
        let ticket = sample_ticket(&event);
        assert!(ticket.belongs_to(ticket.user_id));
        assert!(!ticket.belongs_to(Uuid::new_v4()));
    }
}
