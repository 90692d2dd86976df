//! Ticket entity, participant value object, and lifecycle status.

pub mod model;
pub mod participant;
pub mod status;

pub use model::Ticket;
pub use participant::Participant;
pub use status::TicketStatus;
