//! Participant value object embedded in a ticket.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use eventhub_core::{AppError, AppResult};

/// The person attending on a ticket.
///
/// Stored flattened into the ticket row; the ticket holder (`user_id`)
/// and the participant may differ, e.g. when buying for someone else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Participant {
    /// Participant's display name.
    #[sqlx(rename = "participant_name")]
    pub name: String,
    /// Participant's contact email.
    #[sqlx(rename = "participant_email")]
    pub email: String,
}

impl Participant {
    /// Create a participant with normalized fields: trimmed name,
    /// trimmed and lowercased email.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            email: email.into().trim().to_lowercase(),
        }
    }

    /// Validate the participant fields.
    pub fn validate(&self) -> AppResult<()> {
        if self.name.is_empty() {
            return Err(AppError::validation("Participant name must not be empty"));
        }
        if !self.email.contains('@') || self.email.len() < 3 {
            return Err(AppError::validation(format!(
                "Participant email '{}' is not a valid address",
                self.email
            )));
        }
        Ok(())
    }

    /// Case-insensitive email comparison.
    pub fn has_email(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email.trim())
    }
}
