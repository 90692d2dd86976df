//! # eventhub-entity
//!
//! Domain entity models for EventHub. Every struct in this crate
//! represents a database table row or a domain value object. All entities
//! derive `Debug`, `Clone`, `Serialize`, `Deserialize`, and database
//! entities additionally derive `sqlx::FromRow`.
//!
//! Lifecycle rules live here as pure methods on the models: the status
//! enums answer "is this transition legal" and the models apply the
//! transition or fail without touching storage. A ticket references its
//! event by id only; the event row is looked up where needed, never
//! embedded.

pub mod event;
pub mod ticket;

pub use event::{CreateEvent, Event, EventStatus};
pub use ticket::{Participant, Ticket, TicketStatus};
