//! Event lifecycle status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle phase of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Event is planned for the future.
    Scheduled,
    /// Event is currently happening.
    Ongoing,
    /// Event has ended.
    Completed,
    /// Event was called off before it started.
    Cancelled,
}

impl EventStatus {
    /// Check if the event accepts new reservations in this status.
    ///
    /// The event date is checked separately; a scheduled event with a
    /// past date is a data anomaly and both checks are enforced.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Scheduled | Self::Ongoing)
    }

    /// Check if this status has no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Check whether moving from this status to `next` is legal.
    pub fn can_transition_to(&self, next: EventStatus) -> bool {
        match self {
            Self::Scheduled => matches!(next, Self::Ongoing | Self::Cancelled),
            Self::Ongoing => matches!(next, Self::Completed),
            Self::Completed | Self::Cancelled => false,
        }
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = eventhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scheduled" => Ok(Self::Scheduled),
            "ongoing" => Ok(Self::Ongoing),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(eventhub_core::AppError::validation(format!(
                "Invalid event status: '{s}'. Expected one of: scheduled, ongoing, completed, cancelled"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        assert!(EventStatus::Scheduled.can_transition_to(EventStatus::Ongoing));
        assert!(EventStatus::Scheduled.can_transition_to(EventStatus::Cancelled));
        assert!(EventStatus::Ongoing.can_transition_to(EventStatus::Completed));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!EventStatus::Scheduled.can_transition_to(EventStatus::Completed));
        assert!(!EventStatus::Ongoing.can_transition_to(EventStatus::Cancelled));
        assert!(!EventStatus::Ongoing.can_transition_to(EventStatus::Scheduled));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for terminal in [EventStatus::Completed, EventStatus::Cancelled] {
            assert!(terminal.is_terminal());
            for next in [
                EventStatus::Scheduled,
                EventStatus::Ongoing,
                EventStatus::Completed,
                EventStatus::Cancelled,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_only_scheduled_and_ongoing_accept_reservations() {
        assert!(EventStatus::Scheduled.is_active());
        assert!(EventStatus::Ongoing.is_active());
        assert!(!EventStatus::Completed.is_active());
        assert!(!EventStatus::Cancelled.is_active());
    }

    #[test]
    fn test_from_str_roundtrip() {
        for status in [
            EventStatus::Scheduled,
            EventStatus::Ongoing,
            EventStatus::Completed,
            EventStatus::Cancelled,
        ] {
            let parsed: EventStatus = status.as_str().parse().expect("should parse");
            assert_eq!(parsed, status);
        }
        assert!("postponed".parse::<EventStatus>().is_err());
    }
}
