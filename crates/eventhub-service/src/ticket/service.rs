//! Ticket purchase, cancellation, and check-in orchestration.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use eventhub_core::config::reservation::ReservationConfig;
use eventhub_core::{AppError, AppResult};
use eventhub_database::{CapacityLedger, EventStore, TicketStore};
use eventhub_entity::{Event, Participant, Ticket};

use super::confirmation::ConfirmationCodeGenerator;

/// Orchestrates a single purchase, cancel, or check-in request.
///
/// The service validates preconditions, drives the capacity ledger and
/// the ticket state machine, retries transient contention within a
/// bounded budget, and compensates any seat it reserved but could not
/// turn into a ticket. Invoked concurrently by many request handlers;
/// holds no mutable state of its own.
#[derive(Clone)]
pub struct TicketService {
    events: Arc<dyn EventStore>,
    ledger: Arc<dyn CapacityLedger>,
    tickets: Arc<dyn TicketStore>,
    codes: ConfirmationCodeGenerator,
    config: ReservationConfig,
}

impl TicketService {
    /// Create a new ticket service.
    pub fn new(
        events: Arc<dyn EventStore>,
        ledger: Arc<dyn CapacityLedger>,
        tickets: Arc<dyn TicketStore>,
        config: ReservationConfig,
    ) -> Self {
        let codes = ConfirmationCodeGenerator::new(tickets.clone(), config.code_attempts);
        Self {
            events,
            ledger,
            tickets,
            codes,
            config,
        }
    }

    /// Purchase one ticket for the event on behalf of the user.
    ///
    /// Fails with `NotFound`, `PastEvent`, `DuplicateTicket`, `SoldOut`,
    /// `Conflict` (contention retries exhausted), or `CodeExhausted`.
    /// `SoldOut` and `DuplicateTicket` are expected, frequent outcomes;
    /// only `Conflict` is worth retrying by the caller.
    pub async fn purchase(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        participant: Participant,
    ) -> AppResult<Ticket> {
        participant.validate()?;
        info!(%event_id, %user_id, "Purchasing ticket");

        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Event not found with ID: {event_id}")))?;
        if !event.is_purchasable() {
            return Err(AppError::past_event(format!(
                "Event '{}' is not open for purchase",
                event.name
            )));
        }
        if self
            .tickets
            .find_active_for_user(event_id, user_id)
            .await?
            .is_some()
        {
            return Err(AppError::duplicate_ticket(
                "You already have a ticket for this event",
            ));
        }

        let reserved = self.reserve_with_retry(event_id).await?;

        // From here on a seat is held: every failure path must give it
        // back before propagating.
        let code = match self.codes.generate().await {
            Ok(code) => code,
            Err(e) => {
                self.compensate_release(event_id).await;
                return Err(e);
            }
        };

        let ticket = Ticket::new(event_id, user_id, participant, code);
        match self.tickets.insert(&ticket).await {
            Ok(saved) => {
                info!(
                    code = %saved.confirmation_code,
                    event = %reserved.name,
                    available = reserved.available_capacity,
                    "Ticket purchased successfully"
                );
                Ok(saved)
            }
            Err(e) => {
                self.compensate_release(event_id).await;
                Err(e)
            }
        }
    }

    /// Reserve a seat, retrying only transient write contention.
    ///
    /// `SoldOut` surfaces immediately — retrying will not manufacture
    /// capacity. Exhausted retries surface as a final `Conflict` so the
    /// caller may re-submit the whole request later.
    async fn reserve_with_retry(&self, event_id: Uuid) -> AppResult<Event> {
        let max_attempts = self.config.max_reserve_attempts.max(1);
        let mut attempt = 1u32;
        loop {
            match self.ledger.reserve(event_id).await {
                Ok(event) => return Ok(event),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    warn!(%event_id, attempt, "Seat reservation hit contention, backing off");
                    sleep(Duration::from_millis(
                        self.config.retry_backoff_ms * u64::from(attempt),
                    ))
                    .await;
                    attempt += 1;
                }
                Err(e) if e.is_retryable() => {
                    warn!(%event_id, attempts = max_attempts, "Seat reservation retries exhausted");
                    return Err(AppError::conflict(format!(
                        "Could not reserve a seat for event {event_id} after {max_attempts} attempts; please retry"
                    )));
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Give back a reserved seat that never became a ticket.
    async fn compensate_release(&self, event_id: Uuid) {
        if let Err(e) = self.ledger.release(event_id).await {
            // The seat is stranded; surfacing the original failure matters
            // more, so log loudly and move on.
            error!(%event_id, error = %e, "Failed to release seat while unwinding a purchase");
        }
    }

    /// Cancel a ticket owned by the user and return its seat.
    ///
    /// Fails with `NotFound`, `NotOwner`, `InvalidState`, or `PastEvent`.
    pub async fn cancel(&self, ticket_id: Uuid, user_id: Uuid) -> AppResult<Ticket> {
        info!(%ticket_id, %user_id, "Cancelling ticket");

        let ticket = self
            .tickets
            .find_by_id(ticket_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Ticket not found with ID: {ticket_id}")))?;
        if !ticket.belongs_to(user_id) {
            return Err(AppError::not_owner("You can only cancel your own tickets"));
        }
        let event = self.events.find_by_id(ticket.event_id).await?.ok_or_else(|| {
            AppError::not_found(format!("Event not found with ID: {}", ticket.event_id))
        })?;
        ticket.ensure_cancellable(&event)?;

        let cancelled = self.tickets.cancel_and_release(ticket_id).await?;
        info!(code = %cancelled.confirmation_code, "Ticket cancelled successfully");
        Ok(cancelled)
    }

    /// Redeem a ticket by confirmation code at the door.
    ///
    /// Fails with `NotFound`, `InvalidState`, or `PastEvent`.
    pub async fn check_in(&self, confirmation_code: &str) -> AppResult<Ticket> {
        info!(code = %confirmation_code, "Checking in ticket");

        let ticket = self
            .tickets
            .find_by_code(confirmation_code)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Ticket not found with confirmation code: {confirmation_code}"
                ))
            })?;
        let event = self.events.find_by_id(ticket.event_id).await?.ok_or_else(|| {
            AppError::not_found(format!("Event not found with ID: {}", ticket.event_id))
        })?;
        ticket.ensure_usable(&event)?;

        let used = self.tickets.mark_used(ticket.id, Utc::now()).await?;
        info!(
            code = %used.confirmation_code,
            participant = %used.participant.name,
            "Ticket checked in successfully"
        );
        Ok(used)
    }

    /// Fetch a ticket by id.
    pub async fn get_ticket(&self, ticket_id: Uuid) -> AppResult<Ticket> {
        debug!(%ticket_id, "Fetching ticket by ID");
        self.tickets
            .find_by_id(ticket_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Ticket not found with ID: {ticket_id}")))
    }

    /// Fetch a ticket by confirmation code.
    pub async fn get_ticket_by_code(&self, confirmation_code: &str) -> AppResult<Ticket> {
        debug!(code = %confirmation_code, "Fetching ticket by confirmation code");
        self.tickets
            .find_by_code(confirmation_code)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Ticket not found with confirmation code: {confirmation_code}"
                ))
            })
    }

    /// List every ticket issued for an event.
    pub async fn list_event_tickets(&self, event_id: Uuid) -> AppResult<Vec<Ticket>> {
        debug!(%event_id, "Fetching tickets for event");
        if self.events.find_by_id(event_id).await?.is_none() {
            return Err(AppError::not_found(format!(
                "Event not found with ID: {event_id}"
            )));
        }
        self.tickets.list_by_event(event_id).await
    }

    /// List the user's active tickets.
    pub async fn list_user_active_tickets(&self, user_id: Uuid) -> AppResult<Vec<Ticket>> {
        debug!(%user_id, "Fetching active tickets for user");
        self.tickets.list_active_by_user(user_id).await
    }
}
