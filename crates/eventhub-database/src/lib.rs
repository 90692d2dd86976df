//! # eventhub-database
//!
//! Storage contracts for the reservation core, their PostgreSQL
//! implementations, and an in-memory implementation for single-process
//! deployments and tests.
//!
//! Capacity is data owned by the store, never in-process shared state:
//! every mutation of an event's `available_capacity`/`revision` pair goes
//! through the [`store::CapacityLedger`] contract, which implementations
//! must make atomic per event.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use repositories::{EventRepository, TicketRepository};
pub use store::{CapacityLedger, EventStore, TicketStore};
