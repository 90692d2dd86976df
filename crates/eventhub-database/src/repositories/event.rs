//! Event repository implementation.
//!
//! Capacity mutations are single conditional `UPDATE` statements: the row
//! lock taken by the statement is the per-event exclusive right, held only
//! until the statement commits, and the guards in the `WHERE` clause make
//! the read-check-write atomic. When an update matches no row, the row is
//! re-read once to classify the reason.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use eventhub_core::error::AppError;
use eventhub_core::result::AppResult;
use eventhub_entity::{CreateEvent, Event, EventStatus};

use crate::store::{CapacityLedger, EventStore};

use super::map_db_err;

/// PostgreSQL-backed event store and capacity ledger.
#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Create a new event repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Re-read an event to explain why a guarded reserve matched nothing.
    async fn classify_failed_reserve(&self, event_id: Uuid) -> AppError {
        match self.find_by_id(event_id).await {
            Ok(None) => AppError::not_found(format!("Event not found with ID: {event_id}")),
            Ok(Some(event)) => {
                if !event.status.is_active() || event.is_past() {
                    AppError::past_event(format!(
                        "Event '{}' is not open for reservations",
                        event.name
                    ))
                } else if event.is_sold_out() {
                    AppError::sold_out(format!("Event '{}' is sold out", event.name))
                } else {
                    // The guards held on re-read, so another writer moved the
                    // row between our statements. Retryable.
                    AppError::conflict(format!(
                        "Concurrent update on event '{}' capacity",
                        event.name
                    ))
                }
            }
            Err(e) => e,
        }
    }
}

#[async_trait]
impl EventStore for EventRepository {
    async fn insert(&self, data: &CreateEvent) -> AppResult<Event> {
        let event = sqlx::query_as::<_, Event>(
            "INSERT INTO events (id, name, description, location, event_date, capacity, available_capacity) \
             VALUES ($1, $2, $3, $4, $5, $6, $6) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.location)
        .bind(data.event_date)
        .bind(data.capacity)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err("Failed to create event", e))?;

        info!(event_id = %event.id, name = %event.name, capacity = event.capacity, "Event created");
        Ok(event)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Event>> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_err("Failed to find event", e))
    }

    async fn list_upcoming(&self) -> AppResult<Vec<Event>> {
        sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE status = 'scheduled' AND event_date > NOW() \
             ORDER BY event_date ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err("Failed to list upcoming events", e))
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected_revision: i64,
        next: EventStatus,
    ) -> AppResult<Event> {
        let updated = sqlx::query_as::<_, Event>(
            "UPDATE events SET status = $3, revision = revision + 1, updated_at = NOW() \
             WHERE id = $1 AND revision = $2 RETURNING *",
        )
        .bind(id)
        .bind(expected_revision)
        .bind(next)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err("Failed to update event status", e))?;

        match updated {
            Some(event) => {
                info!(event_id = %event.id, status = %event.status, "Event status updated");
                Ok(event)
            }
            None => match self.find_by_id(id).await? {
                None => Err(AppError::not_found(format!("Event not found with ID: {id}"))),
                Some(_) => {
                    warn!(event_id = %id, expected_revision, "Event status update lost the revision race");
                    Err(AppError::conflict(format!(
                        "Event {id} was modified concurrently (expected revision {expected_revision})"
                    )))
                }
            },
        }
    }

    async fn increase_capacity(
        &self,
        id: Uuid,
        expected_revision: i64,
        additional: i32,
    ) -> AppResult<Event> {
        let updated = sqlx::query_as::<_, Event>(
            "UPDATE events SET capacity = capacity + $3, \
             available_capacity = available_capacity + $3, \
             revision = revision + 1, updated_at = NOW() \
             WHERE id = $1 AND revision = $2 RETURNING *",
        )
        .bind(id)
        .bind(expected_revision)
        .bind(additional)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err("Failed to increase event capacity", e))?;

        match updated {
            Some(event) => {
                info!(event_id = %event.id, capacity = event.capacity, "Event capacity increased");
                Ok(event)
            }
            None => match self.find_by_id(id).await? {
                None => Err(AppError::not_found(format!("Event not found with ID: {id}"))),
                Some(_) => Err(AppError::conflict(format!(
                    "Event {id} was modified concurrently (expected revision {expected_revision})"
                ))),
            },
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        // Guarded: an event may only go away once every seat is back.
        let result = sqlx::query("DELETE FROM events WHERE id = $1 AND available_capacity = capacity")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err("Failed to delete event", e))?;

        if result.rows_affected() == 1 {
            info!(event_id = %id, "Event deleted");
            return Ok(());
        }
        match self.find_by_id(id).await? {
            None => Err(AppError::not_found(format!("Event not found with ID: {id}"))),
            Some(event) => Err(AppError::validation(format!(
                "Event '{}' still has {} sold ticket(s)",
                event.name,
                event.tickets_sold()
            ))),
        }
    }
}

#[async_trait]
impl CapacityLedger for EventRepository {
    async fn reserve(&self, event_id: Uuid) -> AppResult<Event> {
        debug!(event_id = %event_id, "Reserving one seat");

        let reserved = sqlx::query_as::<_, Event>(
            "UPDATE events SET available_capacity = available_capacity - 1, \
             revision = revision + 1, updated_at = NOW() \
             WHERE id = $1 AND available_capacity > 0 AND event_date > NOW() \
             AND status IN ('scheduled', 'ongoing') RETURNING *",
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err("Failed to reserve seat", e))?;

        match reserved {
            Some(event) => {
                info!(
                    event_id = %event.id,
                    available = event.available_capacity,
                    revision = event.revision,
                    "Seat reserved"
                );
                Ok(event)
            }
            None => Err(self.classify_failed_reserve(event_id).await),
        }
    }

    async fn release(&self, event_id: Uuid) -> AppResult<Event> {
        let released = sqlx::query_as::<_, Event>(
            "UPDATE events SET available_capacity = available_capacity + 1, \
             revision = revision + 1, updated_at = NOW() \
             WHERE id = $1 AND available_capacity < capacity RETURNING *",
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err("Failed to release seat", e))?;

        match released {
            Some(event) => {
                info!(
                    event_id = %event.id,
                    available = event.available_capacity,
                    revision = event.revision,
                    "Seat released"
                );
                Ok(event)
            }
            None => match self.find_by_id(event_id).await? {
                None => Err(AppError::not_found(format!(
                    "Event not found with ID: {event_id}"
                ))),
                Some(event) => {
                    warn!(event_id = %event.id, "Release attempted with no seats outstanding");
                    Err(AppError::at_capacity(format!(
                        "Event '{}' already has all {} seats available",
                        event.name, event.capacity
                    )))
                }
            },
        }
    }
}
