//! Concrete PostgreSQL repository implementations.

pub mod event;
pub mod ticket;

pub use event::EventRepository;
pub use ticket::TicketRepository;

use eventhub_core::error::{AppError, ErrorKind};

/// Map a sqlx error into the unified error type.
///
/// Lock-wait timeouts, serialization failures, and deadlocks are write
/// contention the caller may retry; everything else is a database fault.
pub(crate) fn map_db_err(context: &str, err: sqlx::Error) -> AppError {
    let contention = matches!(
        &err,
        sqlx::Error::Database(db)
            if matches!(db.code().as_deref(), Some("40001" | "40P01" | "55P03"))
    );
    if contention {
        AppError::with_source(
            ErrorKind::Conflict,
            format!("{context}: write contention"),
            err,
        )
    } else {
        AppError::with_source(ErrorKind::Database, context.to_string(), err)
    }
}
