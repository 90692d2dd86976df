//! Unified application error types for EventHub.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. Expected business outcomes such as
//! a sold-out event or a duplicate ticket are ordinary error kinds, never
//! panics: callers branch on [`ErrorKind`] to decide what to retry and
//! what to report back as-is.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested event or ticket was not found.
    NotFound,
    /// The event has no remaining capacity.
    SoldOut,
    /// A concurrent writer won the race; the operation may be retried.
    Conflict,
    /// The event date is already in the past.
    PastEvent,
    /// The user already holds an active ticket for this event.
    DuplicateTicket,
    /// An illegal lifecycle transition was attempted.
    InvalidState,
    /// The caller does not own the ticket being modified.
    NotOwner,
    /// A capacity release would exceed the event's total capacity.
    AtCapacity,
    /// Confirmation code generation exhausted its retry budget.
    CodeExhausted,
    /// Input validation failed.
    Validation,
    /// A database error occurred.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl ErrorKind {
    /// Whether the condition is transient and worth retrying.
    ///
    /// Only write contention qualifies: a sold-out event will not regain
    /// capacity by retrying, and validation failures are deterministic.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::SoldOut => write!(f, "SOLD_OUT"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::PastEvent => write!(f, "PAST_EVENT"),
            Self::DuplicateTicket => write!(f, "DUPLICATE_TICKET"),
            Self::InvalidState => write!(f, "INVALID_STATE"),
            Self::NotOwner => write!(f, "NOT_OWNER"),
            Self::AtCapacity => write!(f, "AT_CAPACITY"),
            Self::CodeExhausted => write!(f, "CODE_EXHAUSTED"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Database => write!(f, "DATABASE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout EventHub.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. This provides a single error type for
/// the entire application boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether the error is transient write contention worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a sold-out error.
    pub fn sold_out(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SoldOut, message)
    }

    /// Create a transient conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a past-event error.
    pub fn past_event(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PastEvent, message)
    }

    /// Create a duplicate-ticket error.
    pub fn duplicate_ticket(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateTicket, message)
    }

    /// Create an invalid-state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidState, message)
    }

    /// Create a not-owner error.
    pub fn not_owner(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotOwner, message)
    }

    /// Create an at-capacity error.
    pub fn at_capacity(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AtCapacity, message)
    }

    /// Create a code-exhausted error.
    pub fn code_exhausted(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CodeExhausted, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_and_message() {
        let err = AppError::sold_out("Event is sold out");
        assert_eq!(err.to_string(), "SOLD_OUT: Event is sold out");
    }

    #[test]
    fn test_only_conflict_is_retryable() {
        assert!(AppError::conflict("lost the race").is_retryable());
        assert!(!AppError::sold_out("full").is_retryable());
        assert!(!AppError::duplicate_ticket("already holds one").is_retryable());
        assert!(!AppError::code_exhausted("no free code").is_retryable());
    }

    #[test]
    fn test_clone_drops_source() {
        let io = std::io::Error::other("boom");
        let err = AppError::with_source(ErrorKind::Database, "query failed", io);
        let cloned = err.clone();
        assert_eq!(cloned.kind, ErrorKind::Database);
        assert!(cloned.source.is_none());
    }
}
