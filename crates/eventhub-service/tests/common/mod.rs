//! Shared test harness wiring the services over the in-memory store.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use eventhub_core::config::reservation::ReservationConfig;
use eventhub_database::{EventStore, MemoryStore};
use eventhub_entity::{CreateEvent, Event, Participant};
use eventhub_service::{EventService, TicketService};

/// Services plus direct store access for invariant checks.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub events: EventService,
    pub tickets: TicketService,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(ReservationConfig::default())
    }

    pub fn with_config(config: ReservationConfig) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("eventhub=debug")
            .try_init();

        let store = Arc::new(MemoryStore::new());
        let events = EventService::new(store.clone());
        let tickets = TicketService::new(store.clone(), store.clone(), store.clone(), config);
        Self {
            store,
            events,
            tickets,
        }
    }

    /// Create a scheduled event 30 days out.
    pub async fn seeded_event(&self, capacity: i32) -> Event {
        self.events
            .create_event(CreateEvent {
                name: "RustConf".to_string(),
                description: Some("Three days of systems programming".to_string()),
                location: "Porto Alegre".to_string(),
                event_date: Utc::now() + Duration::days(30),
                capacity,
            })
            .await
            .expect("create event")
    }

    /// Insert an event whose date already passed, bypassing the service
    /// validation on purpose (the data anomaly the purchase path must
    /// still reject).
    pub async fn seeded_past_event(&self, capacity: i32) -> Event {
        EventStore::insert(
            &*self.store,
            &CreateEvent {
                name: "Yesterday's Meetup".to_string(),
                description: None,
                location: "Porto Alegre".to_string(),
                event_date: Utc::now() - Duration::days(1),
                capacity,
            },
        )
        .await
        .expect("insert past event")
    }

    /// Current available capacity straight from the store.
    pub async fn available(&self, event_id: Uuid) -> i32 {
        EventStore::find_by_id(&*self.store, event_id)
            .await
            .expect("find event")
            .expect("event present")
            .available_capacity
    }
}

/// A distinct participant per index.
pub fn participant(n: usize) -> Participant {
    Participant::new(format!("Attendee {n}"), format!("attendee{n}@example.com"))
}
