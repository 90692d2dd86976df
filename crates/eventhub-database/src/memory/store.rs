//! In-memory store using a Tokio mutex for single-process deployments.
//!
//! Implements the same contracts and classification rules as the
//! PostgreSQL repositories: every check-then-write runs inside one lock
//! scope, so the conservation invariant and the uniqueness rules hold
//! under concurrent callers exactly as they do behind the row locks and
//! unique indexes in production.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use eventhub_core::error::AppError;
use eventhub_core::result::AppResult;
use eventhub_entity::{CreateEvent, Event, EventStatus, Ticket, TicketStatus};

use crate::store::{CapacityLedger, EventStore, TicketStore};

/// Internal state for the memory store.
#[derive(Debug, Default)]
struct Inner {
    events: HashMap<Uuid, Event>,
    tickets: HashMap<Uuid, Ticket>,
    /// Every confirmation code ever issued, cancelled tickets included.
    issued_codes: HashSet<String>,
}

/// In-memory event and ticket store.
///
/// Suitable for single-process deployments and tests only; capacity here
/// would not survive a multi-instance deployment.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn insert(&self, data: &CreateEvent) -> AppResult<Event> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            name: data.name.clone(),
            description: data.description.clone(),
            location: data.location.clone(),
            event_date: data.event_date,
            capacity: data.capacity,
            available_capacity: data.capacity,
            status: EventStatus::Scheduled,
            revision: 0,
            created_at: now,
            updated_at: now,
        };
        state.events.insert(event.id, event.clone());
        info!(event_id = %event.id, name = %event.name, capacity = event.capacity, "Event created");
        Ok(event)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Event>> {
        let state = self.state.lock().await;
        Ok(state.events.get(&id).cloned())
    }

    async fn list_upcoming(&self) -> AppResult<Vec<Event>> {
        let state = self.state.lock().await;
        let now = Utc::now();
        let mut events: Vec<Event> = state
            .events
            .values()
            .filter(|e| e.status == EventStatus::Scheduled && e.event_date > now)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.event_date);
        Ok(events)
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected_revision: i64,
        next: EventStatus,
    ) -> AppResult<Event> {
        let mut state = self.state.lock().await;
        let event = state
            .events
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Event not found with ID: {id}")))?;
        if event.revision != expected_revision {
            warn!(event_id = %id, expected_revision, actual = event.revision, "Event status update lost the revision race");
            return Err(AppError::conflict(format!(
                "Event {id} was modified concurrently (expected revision {expected_revision})"
            )));
        }
        event.status = next;
        event.revision += 1;
        event.updated_at = Utc::now();
        info!(event_id = %event.id, status = %event.status, "Event status updated");
        Ok(event.clone())
    }

    async fn increase_capacity(
        &self,
        id: Uuid,
        expected_revision: i64,
        additional: i32,
    ) -> AppResult<Event> {
        let mut state = self.state.lock().await;
        let event = state
            .events
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Event not found with ID: {id}")))?;
        if event.revision != expected_revision {
            return Err(AppError::conflict(format!(
                "Event {id} was modified concurrently (expected revision {expected_revision})"
            )));
        }
        event.capacity += additional;
        event.available_capacity += additional;
        event.revision += 1;
        event.updated_at = Utc::now();
        info!(event_id = %event.id, capacity = event.capacity, "Event capacity increased");
        Ok(event.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let event = state
            .events
            .get(&id)
            .ok_or_else(|| AppError::not_found(format!("Event not found with ID: {id}")))?;
        if event.tickets_sold() > 0 {
            return Err(AppError::validation(format!(
                "Event '{}' still has {} sold ticket(s)",
                event.name,
                event.tickets_sold()
            )));
        }
        state.events.remove(&id);
        info!(event_id = %id, "Event deleted");
        Ok(())
    }
}

#[async_trait]
impl CapacityLedger for MemoryStore {
    async fn reserve(&self, event_id: Uuid) -> AppResult<Event> {
        let mut state = self.state.lock().await;
        let event = state
            .events
            .get_mut(&event_id)
            .ok_or_else(|| AppError::not_found(format!("Event not found with ID: {event_id}")))?;

        if !event.status.is_active() || event.is_past() {
            return Err(AppError::past_event(format!(
                "Event '{}' is not open for reservations",
                event.name
            )));
        }
        if event.available_capacity <= 0 {
            return Err(AppError::sold_out(format!(
                "Event '{}' is sold out",
                event.name
            )));
        }

        event.available_capacity -= 1;
        event.revision += 1;
        event.updated_at = Utc::now();
        info!(
            event_id = %event.id,
            available = event.available_capacity,
            revision = event.revision,
            "Seat reserved"
        );
        Ok(event.clone())
    }

    async fn release(&self, event_id: Uuid) -> AppResult<Event> {
        let mut state = self.state.lock().await;
        let event = state
            .events
            .get_mut(&event_id)
            .ok_or_else(|| AppError::not_found(format!("Event not found with ID: {event_id}")))?;

        if event.available_capacity >= event.capacity {
            warn!(event_id = %event.id, "Release attempted with no seats outstanding");
            return Err(AppError::at_capacity(format!(
                "Event '{}' already has all {} seats available",
                event.name, event.capacity
            )));
        }

        event.available_capacity += 1;
        event.revision += 1;
        event.updated_at = Utc::now();
        info!(
            event_id = %event.id,
            available = event.available_capacity,
            revision = event.revision,
            "Seat released"
        );
        Ok(event.clone())
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn insert(&self, ticket: &Ticket) -> AppResult<Ticket> {
        let mut state = self.state.lock().await;

        if state.issued_codes.contains(&ticket.confirmation_code) {
            return Err(AppError::conflict(
                "Confirmation code was claimed concurrently",
            ));
        }
        let duplicate = state.tickets.values().any(|t| {
            t.event_id == ticket.event_id
                && t.user_id == ticket.user_id
                && t.status == TicketStatus::Active
        });
        if duplicate {
            return Err(AppError::duplicate_ticket(
                "User already holds an active ticket for this event",
            ));
        }

        state.issued_codes.insert(ticket.confirmation_code.clone());
        state.tickets.insert(ticket.id, ticket.clone());
        info!(
            ticket_id = %ticket.id,
            event_id = %ticket.event_id,
            code = %ticket.confirmation_code,
            "Ticket issued"
        );
        Ok(ticket.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Ticket>> {
        let state = self.state.lock().await;
        Ok(state.tickets.get(&id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> AppResult<Option<Ticket>> {
        let state = self.state.lock().await;
        Ok(state
            .tickets
            .values()
            .find(|t| t.confirmation_code == code)
            .cloned())
    }

    async fn find_active_for_user(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<Ticket>> {
        let state = self.state.lock().await;
        Ok(state
            .tickets
            .values()
            .find(|t| {
                t.event_id == event_id && t.user_id == user_id && t.status == TicketStatus::Active
            })
            .cloned())
    }

    async fn list_by_event(&self, event_id: Uuid) -> AppResult<Vec<Ticket>> {
        let state = self.state.lock().await;
        let mut tickets: Vec<Ticket> = state
            .tickets
            .values()
            .filter(|t| t.event_id == event_id)
            .cloned()
            .collect();
        tickets.sort_by(|a, b| b.purchase_date.cmp(&a.purchase_date));
        Ok(tickets)
    }

    async fn list_active_by_user(&self, user_id: Uuid) -> AppResult<Vec<Ticket>> {
        let state = self.state.lock().await;
        let mut tickets: Vec<Ticket> = state
            .tickets
            .values()
            .filter(|t| t.user_id == user_id && t.status == TicketStatus::Active)
            .cloned()
            .collect();
        tickets.sort_by(|a, b| b.purchase_date.cmp(&a.purchase_date));
        Ok(tickets)
    }

    async fn count_active_by_event(&self, event_id: Uuid) -> AppResult<i64> {
        let state = self.state.lock().await;
        Ok(state
            .tickets
            .values()
            .filter(|t| t.event_id == event_id && t.status == TicketStatus::Active)
            .count() as i64)
    }

    async fn code_exists(&self, code: &str) -> AppResult<bool> {
        let state = self.state.lock().await;
        Ok(state.issued_codes.contains(code))
    }

    async fn mark_used(&self, ticket_id: Uuid, check_in_at: DateTime<Utc>) -> AppResult<Ticket> {
        let mut state = self.state.lock().await;
        let ticket = state
            .tickets
            .get_mut(&ticket_id)
            .ok_or_else(|| AppError::not_found(format!("Ticket not found with ID: {ticket_id}")))?;
        if ticket.status != TicketStatus::Active {
            return Err(AppError::invalid_state(format!(
                "Ticket {} cannot transition from {} to used",
                ticket.id, ticket.status
            )));
        }
        ticket.status = TicketStatus::Used;
        ticket.check_in_at = Some(check_in_at);
        ticket.updated_at = Utc::now();
        info!(ticket_id = %ticket.id, code = %ticket.confirmation_code, "Ticket checked in");
        Ok(ticket.clone())
    }

    async fn cancel_and_release(&self, ticket_id: Uuid) -> AppResult<Ticket> {
        // Single lock scope: the ticket transition and the seat release
        // are observed together or not at all.
        let mut state = self.state.lock().await;

        let ticket = state
            .tickets
            .get(&ticket_id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Ticket not found with ID: {ticket_id}")))?;
        if ticket.status != TicketStatus::Active {
            return Err(AppError::invalid_state(format!(
                "Ticket {} cannot transition from {} to cancelled",
                ticket.id, ticket.status
            )));
        }

        let event = state.events.get_mut(&ticket.event_id).ok_or_else(|| {
            AppError::not_found(format!("Event not found with ID: {}", ticket.event_id))
        })?;
        if event.available_capacity >= event.capacity {
            warn!(
                ticket_id = %ticket.id,
                event_id = %event.id,
                "Seat release found the event already at full capacity"
            );
            return Err(AppError::at_capacity(format!(
                "Event '{}' already has all seats available",
                event.name
            )));
        }
        event.available_capacity += 1;
        event.revision += 1;
        event.updated_at = Utc::now();

        let ticket = state
            .tickets
            .get_mut(&ticket_id)
            .ok_or_else(|| AppError::internal("Ticket disappeared mid-cancellation"))?;
        ticket.status = TicketStatus::Cancelled;
        ticket.updated_at = Utc::now();
        let cancelled = ticket.clone();

        info!(
            ticket_id = %cancelled.id,
            event_id = %cancelled.event_id,
            code = %cancelled.confirmation_code,
            "Ticket cancelled and seat released"
        );
        Ok(cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use eventhub_core::ErrorKind;
    use eventhub_entity::Participant;

    fn create_event(capacity: i32, days_ahead: i64) -> CreateEvent {
        CreateEvent {
            name: "RustConf".to_string(),
            description: None,
            location: "Porto Alegre".to_string(),
            event_date: Utc::now() + Duration::days(days_ahead),
            capacity,
        }
    }

    fn ticket_for(event: &Event, code: &str) -> Ticket {
        Ticket::new(
            event.id,
            Uuid::new_v4(),
            Participant::new("Ada Lovelace", "ada@example.com"),
            code.to_string(),
        )
    }

    #[tokio::test]
    async fn test_reserve_decrements_and_bumps_revision() {
        let store = MemoryStore::new();
        let event = EventStore::insert(&store, &create_event(2, 7)).await.unwrap();

        let reserved = store.reserve(event.id).await.unwrap();
        assert_eq!(reserved.available_capacity, 1);
        assert_eq!(reserved.revision, event.revision + 1);
    }

    #[tokio::test]
    async fn test_reserve_fails_sold_out_and_past() {
        let store = MemoryStore::new();
        let event = EventStore::insert(&store, &create_event(1, 7)).await.unwrap();
        store.reserve(event.id).await.unwrap();

        let err = store.reserve(event.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::SoldOut);

        let missing = store.reserve(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(missing.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_reserve_rejects_cancelled_event() {
        let store = MemoryStore::new();
        let event = EventStore::insert(&store, &create_event(5, 7)).await.unwrap();
        store
            .update_status(event.id, event.revision, EventStatus::Cancelled)
            .await
            .unwrap();

        let err = store.reserve(event.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::PastEvent);
    }

    #[tokio::test]
    async fn test_release_beyond_capacity_is_an_error() {
        let store = MemoryStore::new();
        let event = EventStore::insert(&store, &create_event(3, 7)).await.unwrap();

        let err = store.release(event.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AtCapacity);

        store.reserve(event.id).await.unwrap();
        let released = store.release(event.id).await.unwrap();
        assert_eq!(released.available_capacity, 3);
    }

    #[tokio::test]
    async fn test_update_status_detects_stale_revision() {
        let store = MemoryStore::new();
        let event = EventStore::insert(&store, &create_event(3, 7)).await.unwrap();
        store.reserve(event.id).await.unwrap();

        let err = store
            .update_status(event.id, event.revision, EventStatus::Ongoing)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_active_ticket_and_code() {
        let store = MemoryStore::new();
        let event = EventStore::insert(&store, &create_event(5, 7)).await.unwrap();

        let first = ticket_for(&event, "AAAAAA");
        TicketStore::insert(&store, &first).await.unwrap();

        let mut same_user = ticket_for(&event, "BBBBBB");
        same_user.user_id = first.user_id;
        let err = TicketStore::insert(&store, &same_user).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateTicket);

        let code_clash = ticket_for(&event, "AAAAAA");
        let err = TicketStore::insert(&store, &code_clash).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_cancelled_code_stays_claimed() {
        let store = MemoryStore::new();
        let event = EventStore::insert(&store, &create_event(5, 7)).await.unwrap();
        store.reserve(event.id).await.unwrap();

        let ticket = ticket_for(&event, "CCCCCC");
        TicketStore::insert(&store, &ticket).await.unwrap();
        store.cancel_and_release(ticket.id).await.unwrap();

        assert!(store.code_exists("CCCCCC").await.unwrap());
    }

    #[tokio::test]
    async fn test_cancel_and_release_is_atomic_per_status() {
        let store = MemoryStore::new();
        let event = EventStore::insert(&store, &create_event(2, 7)).await.unwrap();
        store.reserve(event.id).await.unwrap();
        let ticket = ticket_for(&event, "DDDDDD");
        TicketStore::insert(&store, &ticket).await.unwrap();

        let cancelled = store.cancel_and_release(ticket.id).await.unwrap();
        assert_eq!(cancelled.status, TicketStatus::Cancelled);
        let event = EventStore::find_by_id(&store, event.id).await.unwrap().unwrap();
        assert_eq!(event.available_capacity, 2);

        // A second cancel must not release another seat.
        let err = store.cancel_and_release(ticket.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidState);
        let event = EventStore::find_by_id(&store, event.id).await.unwrap().unwrap();
        assert_eq!(event.available_capacity, 2);
    }

    #[tokio::test]
    async fn test_delete_blocked_while_tickets_sold() {
        let store = MemoryStore::new();
        let event = EventStore::insert(&store, &create_event(2, 7)).await.unwrap();
        store.reserve(event.id).await.unwrap();

        let err = EventStore::delete(&store, event.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        store.release(event.id).await.unwrap();
        EventStore::delete(&store, event.id).await.unwrap();
        assert!(EventStore::find_by_id(&store, event.id).await.unwrap().is_none());
    }
}
