//! Confirmation code generation.

use std::sync::Arc;

use rand::Rng;
use tracing::warn;

use eventhub_core::{AppError, AppResult};
use eventhub_database::TicketStore;

/// Code alphabet: digits and uppercase letters minus I, L, O, and U,
/// which read ambiguously on printed tickets. 32 symbols.
pub const CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Confirmation codes are 6 characters long.
pub const CODE_LENGTH: usize = 6;

/// Allocates collision-free confirmation codes.
///
/// Each candidate is drawn uniformly at random and checked against the
/// codes already issued; collisions retry with a fresh draw up to a
/// small bound. The storage unique index on `confirmation_code` is the
/// atomic claim behind this check, so two concurrent generators can
/// never both issue the same code.
#[derive(Clone)]
pub struct ConfirmationCodeGenerator {
    tickets: Arc<dyn TicketStore>,
    max_attempts: u32,
}

impl ConfirmationCodeGenerator {
    /// Create a generator checking against the given ticket store.
    pub fn new(tickets: Arc<dyn TicketStore>, max_attempts: u32) -> Self {
        Self {
            tickets,
            max_attempts,
        }
    }

    /// Generate a code not yet issued to any ticket.
    ///
    /// Exhausting the attempt budget surfaces `CodeExhausted`; the
    /// caller must not retry past this bound.
    pub async fn generate(&self) -> AppResult<String> {
        for attempt in 1..=self.max_attempts {
            let code = random_code();
            if !self.tickets.code_exists(&code).await? {
                return Ok(code);
            }
            warn!(code = %code, attempt, "Confirmation code collision, retrying");
        }
        Err(AppError::code_exhausted(format!(
            "Unable to generate a unique confirmation code after {} attempts",
            self.max_attempts
        )))
    }
}

/// Draw one candidate code uniformly at random.
fn random_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphabet_has_no_ambiguous_symbols() {
        assert_eq!(CODE_ALPHABET.len(), 32);
        for banned in [b'I', b'L', b'O', b'U'] {
            assert!(!CODE_ALPHABET.contains(&banned));
        }
    }

    #[test]
    fn test_random_code_shape() {
        for _ in 0..100 {
            let code = random_code();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }
}
