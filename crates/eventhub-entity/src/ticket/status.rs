//! Ticket lifecycle status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a single ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ticket_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    /// Ticket is valid and holds a seat.
    Active,
    /// Ticket was redeemed at check-in.
    Used,
    /// Ticket was cancelled and its seat returned.
    Cancelled,
}

impl TicketStatus {
    /// Check if the ticket currently holds a seat.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Check if this status has no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Used | Self::Cancelled)
    }

    /// Check whether moving from this status to `next` is legal.
    pub fn can_transition_to(&self, next: TicketStatus) -> bool {
        match self {
            Self::Active => matches!(next, Self::Used | Self::Cancelled),
            Self::Used | Self::Cancelled => false,
        }
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Used => "used",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = eventhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "used" => Ok(Self::Used),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(eventhub_core::AppError::validation(format!(
                "Invalid ticket status: '{s}'. Expected one of: active, used, cancelled"
            ))),
        }
    }
}
