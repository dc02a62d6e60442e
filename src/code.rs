//! Session code generation.
//!
//! Codes are short, human-shareable, and drawn from an unambiguous
//! uppercase alphabet. The generator itself is stateless; the store
//! supplies a collision check and the generator redraws until it finds
//! a free code or runs out of attempts.

use crate::error::SessionError;
use rand::Rng;
use tracing::{instrument, warn};

/// Uppercase letters and digits.
pub const DEFAULT_CODE_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Draws fixed-length session codes from a configured alphabet.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    alphabet: Vec<char>,
    length: usize,
    max_attempts: usize,
}

impl CodeGenerator {
    /// Creates a generator for codes of `length` characters over
    /// `alphabet`, giving up after `max_attempts` collisions.
    pub fn new(alphabet: &str, length: usize, max_attempts: usize) -> Self {
        let alphabet: Vec<char> = alphabet.chars().collect();
        debug_assert!(!alphabet.is_empty(), "code alphabet must not be empty");
        Self {
            alphabet,
            length,
            max_attempts,
        }
    }

    /// Draws one candidate code.
    pub fn draw(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.length)
            .map(|_| self.alphabet[rng.gen_range(0..self.alphabet.len())])
            .collect()
    }

    /// Draws codes until one passes the caller's collision check.
    ///
    /// `is_taken` is consulted for every candidate; the caller is
    /// expected to hold whatever lock makes the answer trustworthy.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::CodeSpaceExhausted`] once the attempt cap
    /// is reached. At practical load this is unreachable, but the
    /// contract must terminate rather than loop forever.
    #[instrument(skip_all)]
    pub fn generate<F>(&self, is_taken: F) -> Result<String, SessionError>
    where
        F: Fn(&str) -> bool,
    {
        for _ in 0..self.max_attempts {
            let candidate = self.draw();
            if !is_taken(&candidate) {
                return Ok(candidate);
            }
        }
        warn!(
            attempts = self.max_attempts,
            length = self.length,
            "Code generation exhausted its attempt budget"
        );
        Err(SessionError::CodeSpaceExhausted)
    }
}
