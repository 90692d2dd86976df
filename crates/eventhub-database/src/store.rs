//! Storage contracts for events and tickets.
//!
//! Services depend on these traits rather than on a concrete backend so
//! the same orchestration runs against PostgreSQL in production and the
//! in-memory store in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use eventhub_core::AppResult;
use eventhub_entity::{CreateEvent, Event, EventStatus, Ticket};

/// The atomic counter of remaining seats per event.
///
/// Implementations must guarantee that exactly one mutation of a given
/// event's capacity fields is in flight at a time; mutations for distinct
/// events never contend. Every successful call bumps the event's
/// `revision`. The wait for the per-event exclusive right is bounded;
/// exceeding it fails with a retryable `Conflict` rather than blocking
/// indefinitely.
#[async_trait]
pub trait CapacityLedger: Send + Sync + 'static {
    /// Take one seat from the event.
    ///
    /// Succeeds only if `available_capacity > 0`, the event date is in
    /// the future, and the status accepts reservations. Errors:
    /// `NotFound`, `SoldOut`, `PastEvent`, `Conflict`.
    async fn reserve(&self, event_id: Uuid) -> AppResult<Event>;

    /// Return one seat to the event.
    ///
    /// Releasing beyond `capacity` is a programming error and fails with
    /// `AtCapacity`; it is never silently clamped. Errors: `NotFound`,
    /// `AtCapacity`.
    async fn release(&self, event_id: Uuid) -> AppResult<Event>;
}

/// Event persistence and lifecycle administration.
#[async_trait]
pub trait EventStore: Send + Sync + 'static {
    /// Create a new event with `available_capacity = capacity` and
    /// status `scheduled`.
    async fn insert(&self, data: &CreateEvent) -> AppResult<Event>;

    /// Find an event by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Event>>;

    /// List scheduled events with a future date, soonest first.
    async fn list_upcoming(&self) -> AppResult<Vec<Event>>;

    /// Move the event to `next`, guarded by an optimistic check on
    /// `expected_revision`. A concurrent writer fails the check with
    /// `Conflict`; the caller re-reads and retries or gives up.
    async fn update_status(
        &self,
        id: Uuid,
        expected_revision: i64,
        next: EventStatus,
    ) -> AppResult<Event>;

    /// Grow both `capacity` and `available_capacity` by `additional`
    /// seats, guarded by `expected_revision`. Capacity never shrinks.
    async fn increase_capacity(
        &self,
        id: Uuid,
        expected_revision: i64,
        additional: i32,
    ) -> AppResult<Event>;

    /// Delete the event. Fails with `Validation` while any seat is held
    /// by a ticket (`tickets_sold > 0`).
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

/// Ticket persistence and queries.
#[async_trait]
pub trait TicketStore: Send + Sync + 'static {
    /// Persist a newly issued ticket.
    ///
    /// The store enforces code uniqueness (`Conflict` on collision) and
    /// the one-active-ticket-per-(event, user) rule (`DuplicateTicket`)
    /// as the claim step behind the application-level checks.
    async fn insert(&self, ticket: &Ticket) -> AppResult<Ticket>;

    /// Find a ticket by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Ticket>>;

    /// Find a ticket by its confirmation code.
    async fn find_by_code(&self, code: &str) -> AppResult<Option<Ticket>>;

    /// Find the user's active ticket for an event, if any.
    async fn find_active_for_user(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<Ticket>>;

    /// List every ticket issued for an event, newest first.
    async fn list_by_event(&self, event_id: Uuid) -> AppResult<Vec<Ticket>>;

    /// List a user's active tickets, newest first.
    async fn list_active_by_user(&self, user_id: Uuid) -> AppResult<Vec<Ticket>>;

    /// Count active tickets for an event.
    async fn count_active_by_event(&self, event_id: Uuid) -> AppResult<i64>;

    /// Check whether a confirmation code has already been issued.
    async fn code_exists(&self, code: &str) -> AppResult<bool>;

    /// Mark an active ticket as used and stamp `check_in_at`.
    ///
    /// Fails with `InvalidState` if the ticket is no longer active (a
    /// concurrent transition won).
    async fn mark_used(&self, ticket_id: Uuid, check_in_at: DateTime<Utc>) -> AppResult<Ticket>;

    /// Cancel an active ticket and release its seat as a single atomic
    /// unit: both committed together or neither.
    async fn cancel_and_release(&self, ticket_id: Uuid) -> AppResult<Ticket>;
}
