//! Ticket purchase, cancellation, check-in, and confirmation codes.

pub mod confirmation;
pub mod service;

pub use confirmation::ConfirmationCodeGenerator;
pub use service::TicketService;
