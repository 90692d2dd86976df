//! Event creation, lifecycle transitions, and capacity administration.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use eventhub_core::{AppError, AppResult};
use eventhub_database::EventStore;
use eventhub_entity::{CreateEvent, Event, EventStatus};

/// Administrative operations on events.
///
/// Lifecycle transitions are optimistic: the service reads the event,
/// validates the transition against the state machine, and writes back
/// guarded by the revision it observed. A concurrent writer fails the
/// guard with `Conflict` and the caller decides whether to re-read.
#[derive(Clone)]
pub struct EventService {
    events: Arc<dyn EventStore>,
}

impl EventService {
    /// Create a new event service.
    pub fn new(events: Arc<dyn EventStore>) -> Self {
        Self { events }
    }

    /// Create an event. Capacity starts fully available.
    pub async fn create_event(&self, data: CreateEvent) -> AppResult<Event> {
        info!(name = %data.name, capacity = data.capacity, "Creating event");
        data.validate()?;
        self.events.insert(&data).await
    }

    /// Fetch an event by id.
    pub async fn get_event(&self, event_id: Uuid) -> AppResult<Event> {
        debug!(%event_id, "Fetching event by ID");
        self.events
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Event not found with ID: {event_id}")))
    }

    /// List scheduled events with a future date, soonest first.
    pub async fn list_upcoming_events(&self) -> AppResult<Vec<Event>> {
        debug!("Fetching upcoming events");
        self.events.list_upcoming().await
    }

    /// Mark a scheduled event as ongoing.
    pub async fn start_event(&self, event_id: Uuid) -> AppResult<Event> {
        self.transition(event_id, EventStatus::Ongoing).await
    }

    /// Mark an ongoing event as completed.
    pub async fn complete_event(&self, event_id: Uuid) -> AppResult<Event> {
        self.transition(event_id, EventStatus::Completed).await
    }

    /// Cancel a scheduled event.
    pub async fn cancel_event(&self, event_id: Uuid) -> AppResult<Event> {
        self.transition(event_id, EventStatus::Cancelled).await
    }

    async fn transition(&self, event_id: Uuid, next: EventStatus) -> AppResult<Event> {
        let event = self.get_event(event_id).await?;
        event.ensure_transition(next)?;
        self.events
            .update_status(event_id, event.revision, next)
            .await
    }

    /// Grow the event's capacity by `additional` seats.
    ///
    /// Capacity may only increase post-creation; it can never shrink
    /// below the number of tickets already sold.
    pub async fn increase_capacity(&self, event_id: Uuid, additional: i32) -> AppResult<Event> {
        if additional < 1 {
            return Err(AppError::validation(format!(
                "Capacity increase must be positive, got {additional}"
            )));
        }
        let event = self.get_event(event_id).await?;
        if event.status.is_terminal() {
            return Err(AppError::invalid_state(format!(
                "Cannot change capacity of {} event '{}'",
                event.status, event.name
            )));
        }
        self.events
            .increase_capacity(event_id, event.revision, additional)
            .await
    }

    /// Delete an event. Only possible while no seat is held by a ticket.
    pub async fn delete_event(&self, event_id: Uuid) -> AppResult<()> {
        info!(%event_id, "Deleting event");
        self.events.delete(event_id).await
    }
}
