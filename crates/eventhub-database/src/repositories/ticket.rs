//! Ticket repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use eventhub_core::error::AppError;
use eventhub_core::result::AppResult;
use eventhub_entity::{Event, Ticket};

use crate::store::TicketStore;

use super::map_db_err;

/// PostgreSQL-backed ticket store.
#[derive(Debug, Clone)]
pub struct TicketRepository {
    pool: PgPool,
}

impl TicketRepository {
    /// Create a new ticket repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Translate a unique-constraint violation on insert into its domain error.
fn map_insert_err(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return match db.constraint() {
                Some("uq_tickets_active_per_user_event") => AppError::duplicate_ticket(
                    "User already holds an active ticket for this event",
                ),
                Some("uq_tickets_confirmation_code") => {
                    AppError::conflict("Confirmation code was claimed concurrently")
                }
                _ => AppError::conflict("Unique constraint violated while issuing ticket"),
            };
        }
    }
    map_db_err("Failed to insert ticket", err)
}

#[async_trait]
impl TicketStore for TicketRepository {
    async fn insert(&self, ticket: &Ticket) -> AppResult<Ticket> {
        let saved = sqlx::query_as::<_, Ticket>(
            "INSERT INTO tickets (id, event_id, user_id, participant_name, participant_email, \
             status, confirmation_code, purchase_date, check_in_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
        )
        .bind(ticket.id)
        .bind(ticket.event_id)
        .bind(ticket.user_id)
        .bind(&ticket.participant.name)
        .bind(&ticket.participant.email)
        .bind(ticket.status)
        .bind(&ticket.confirmation_code)
        .bind(ticket.purchase_date)
        .bind(ticket.check_in_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_err)?;

        info!(
            ticket_id = %saved.id,
            event_id = %saved.event_id,
            code = %saved.confirmation_code,
            "Ticket issued"
        );
        Ok(saved)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Ticket>> {
        sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_err("Failed to find ticket", e))
    }

    async fn find_by_code(&self, code: &str) -> AppResult<Option<Ticket>> {
        sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE confirmation_code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_err("Failed to find ticket by code", e))
    }

    async fn find_active_for_user(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<Ticket>> {
        sqlx::query_as::<_, Ticket>(
            "SELECT * FROM tickets WHERE event_id = $1 AND user_id = $2 AND status = 'active'",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err("Failed to find active ticket", e))
    }

    async fn list_by_event(&self, event_id: Uuid) -> AppResult<Vec<Ticket>> {
        sqlx::query_as::<_, Ticket>(
            "SELECT * FROM tickets WHERE event_id = $1 ORDER BY purchase_date DESC",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err("Failed to list event tickets", e))
    }

    async fn list_active_by_user(&self, user_id: Uuid) -> AppResult<Vec<Ticket>> {
        sqlx::query_as::<_, Ticket>(
            "SELECT * FROM tickets WHERE user_id = $1 AND status = 'active' \
             ORDER BY purchase_date DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err("Failed to list user tickets", e))
    }

    async fn count_active_by_event(&self, event_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM tickets WHERE event_id = $1 AND status = 'active'",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err("Failed to count active tickets", e))
    }

    async fn code_exists(&self, code: &str) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM tickets WHERE confirmation_code = $1)",
        )
        .bind(code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err("Failed to check confirmation code", e))
    }

    async fn mark_used(&self, ticket_id: Uuid, check_in_at: DateTime<Utc>) -> AppResult<Ticket> {
        let updated = sqlx::query_as::<_, Ticket>(
            "UPDATE tickets SET status = 'used', check_in_at = $2, updated_at = NOW() \
             WHERE id = $1 AND status = 'active' RETURNING *",
        )
        .bind(ticket_id)
        .bind(check_in_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err("Failed to mark ticket used", e))?;

        match updated {
            Some(ticket) => {
                info!(ticket_id = %ticket.id, code = %ticket.confirmation_code, "Ticket checked in");
                Ok(ticket)
            }
            None => match self.find_by_id(ticket_id).await? {
                None => Err(AppError::not_found(format!(
                    "Ticket not found with ID: {ticket_id}"
                ))),
                Some(ticket) => Err(AppError::invalid_state(format!(
                    "Ticket {} cannot transition from {} to used",
                    ticket.id, ticket.status
                ))),
            },
        }
    }

    async fn cancel_and_release(&self, ticket_id: Uuid) -> AppResult<Ticket> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_err("Failed to begin cancellation", e))?;

        let cancelled = sqlx::query_as::<_, Ticket>(
            "UPDATE tickets SET status = 'cancelled', updated_at = NOW() \
             WHERE id = $1 AND status = 'active' RETURNING *",
        )
        .bind(ticket_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_db_err("Failed to cancel ticket", e))?;

        let Some(ticket) = cancelled else {
            tx.rollback()
                .await
                .map_err(|e| map_db_err("Failed to roll back cancellation", e))?;
            return match self.find_by_id(ticket_id).await? {
                None => Err(AppError::not_found(format!(
                    "Ticket not found with ID: {ticket_id}"
                ))),
                Some(ticket) => Err(AppError::invalid_state(format!(
                    "Ticket {} cannot transition from {} to cancelled",
                    ticket.id, ticket.status
                ))),
            };
        };

        // Seat release rides the same transaction: both commit or neither.
        let released = sqlx::query_as::<_, Event>(
            "UPDATE events SET available_capacity = available_capacity + 1, \
             revision = revision + 1, updated_at = NOW() \
             WHERE id = $1 AND available_capacity < capacity RETURNING *",
        )
        .bind(ticket.event_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_db_err("Failed to release seat", e))?;

        if released.is_none() {
            warn!(
                ticket_id = %ticket.id,
                event_id = %ticket.event_id,
                "Seat release found the event already at full capacity; rolling back"
            );
            tx.rollback()
                .await
                .map_err(|e| map_db_err("Failed to roll back cancellation", e))?;
            return Err(AppError::at_capacity(format!(
                "Event {} already has all seats available",
                ticket.event_id
            )));
        }

        tx.commit()
            .await
            .map_err(|e| map_db_err("Failed to commit cancellation", e))?;

        info!(
            ticket_id = %ticket.id,
            event_id = %ticket.event_id,
            code = %ticket.confirmation_code,
            "Ticket cancelled and seat released"
        );
        Ok(ticket)
    }
}
