//! # eventhub-service
//!
//! Business logic service layer for EventHub. Each service orchestrates
//! the storage contracts to implement application-level use cases: the
//! ticket service owns the purchase/cancel/check-in flow and its retry
//! discipline, the event service owns the event lifecycle and capacity
//! administration.
//!
//! Services follow constructor injection — all dependencies are provided
//! at construction time via `Arc` references.

pub mod event;
pub mod ticket;

pub use event::EventService;
pub use ticket::{ConfirmationCodeGenerator, TicketService};
