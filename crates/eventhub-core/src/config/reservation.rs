//! Reservation and confirmation-code configuration.

use serde::{Deserialize, Serialize};

/// Tuning knobs for the purchase path.
///
/// The retry budget only covers transient write contention on a single
/// event's capacity row; sold-out and validation outcomes are never
/// retried, so these bounds stay small.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationConfig {
    /// Maximum attempts to reserve a seat before giving up with a conflict.
    #[serde(default = "default_max_reserve_attempts")]
    pub max_reserve_attempts: u32,
    /// Base backoff between reserve attempts, in milliseconds.
    ///
    /// The n-th retry waits `n * retry_backoff_ms`.
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
    /// Maximum confirmation-code draws before surfacing exhaustion.
    #[serde(default = "default_code_attempts")]
    pub code_attempts: u32,
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            max_reserve_attempts: default_max_reserve_attempts(),
            retry_backoff_ms: default_retry_backoff(),
            code_attempts: default_code_attempts(),
        }
    }
}

fn default_max_reserve_attempts() -> u32 {
    4
}

fn default_retry_backoff() -> u64 {
    25
}

fn default_code_attempts() -> u32 {
    10
}
