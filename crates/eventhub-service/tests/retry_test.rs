//! Retry discipline of the seat reservation step.
//!
//! The in-memory store never reports write contention, so these tests
//! substitute ledgers that do. Only transient conflicts may be retried,
//! the attempt budget is a hard bound, and a definitive refusal like
//! sold-out must surface on the first attempt.

mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use eventhub_core::config::reservation::ReservationConfig;
use eventhub_core::{AppError, AppResult, ErrorKind};
use eventhub_database::{CapacityLedger, MemoryStore};
use eventhub_entity::Event;
use eventhub_service::TicketService;

/// Ledger that loses the row-lock race `failures` times, then delegates.
struct ContendedLedger {
    inner: Arc<MemoryStore>,
    failures: u32,
    calls: AtomicU32,
}

impl ContendedLedger {
    fn new(inner: Arc<MemoryStore>, failures: u32) -> Self {
        Self {
            inner,
            failures,
            calls: AtomicU32::new(0),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CapacityLedger for ContendedLedger {
    async fn reserve(&self, event_id: Uuid) -> AppResult<Event> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            return Err(AppError::conflict("Lost the row lock race"));
        }
        self.inner.reserve(event_id).await
    }

    async fn release(&self, event_id: Uuid) -> AppResult<Event> {
        self.inner.release(event_id).await
    }
}

/// Ledger that reports the event sold out on every call.
struct SoldOutLedger {
    calls: AtomicU32,
}

#[async_trait]
impl CapacityLedger for SoldOutLedger {
    async fn reserve(&self, _event_id: Uuid) -> AppResult<Event> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AppError::sold_out("Event is sold out"))
    }

    async fn release(&self, _event_id: Uuid) -> AppResult<Event> {
        Err(AppError::at_capacity("Nothing was reserved"))
    }
}

fn fast_retry_config() -> ReservationConfig {
    ReservationConfig {
        max_reserve_attempts: 4,
        retry_backoff_ms: 1,
        ..ReservationConfig::default()
    }
}

#[tokio::test]
async fn test_transient_conflicts_are_retried_until_success() {
    let app = common::TestApp::new();
    let event = app.seeded_event(5).await;

    let ledger = Arc::new(ContendedLedger::new(app.store.clone(), 2));
    let tickets = TicketService::new(
        app.store.clone(),
        ledger.clone(),
        app.store.clone(),
        fast_retry_config(),
    );

    let ticket = tickets
        .purchase(event.id, Uuid::new_v4(), common::participant(1))
        .await
        .expect("third attempt wins the seat");
    assert_eq!(ticket.event_id, event.id);
    assert_eq!(ledger.calls(), 3);
    assert_eq!(app.available(event.id).await, 4);
}

#[tokio::test]
async fn test_retry_budget_is_a_hard_bound() {
    let app = common::TestApp::new();
    let event = app.seeded_event(5).await;

    // Contention that never clears.
    let ledger = Arc::new(ContendedLedger::new(app.store.clone(), u32::MAX));
    let tickets = TicketService::new(
        app.store.clone(),
        ledger.clone(),
        app.store.clone(),
        fast_retry_config(),
    );

    let err = tickets
        .purchase(event.id, Uuid::new_v4(), common::participant(1))
        .await
        .expect_err("budget exhausted");
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert!(err.message.contains("after 4 attempts"));
    assert_eq!(ledger.calls(), 4);
    // No seat was ever taken.
    assert_eq!(app.available(event.id).await, 5);
}

#[tokio::test]
async fn test_sold_out_surfaces_without_a_retry() {
    let app = common::TestApp::new();
    let event = app.seeded_event(5).await;

    let ledger = Arc::new(SoldOutLedger {
        calls: AtomicU32::new(0),
    });
    let tickets = TicketService::new(
        app.store.clone(),
        ledger.clone(),
        app.store.clone(),
        fast_retry_config(),
    );

    let err = tickets
        .purchase(event.id, Uuid::new_v4(), common::participant(1))
        .await
        .expect_err("definitive refusal");
    assert_eq!(err.kind, ErrorKind::SoldOut);
    assert_eq!(ledger.calls.load(Ordering::SeqCst), 1);
}
