//! Event lifecycle and capacity administration.

pub mod service;

pub use service::EventService;
