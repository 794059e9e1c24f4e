//! Answer checking for typed translations.
//!
//! Matching is exact after normalization:
//! - Unicode NFC, so composed and decomposed umlauts compare equal
//! - case-insensitive
//! - leading/trailing whitespace trimmed, inner runs collapsed to one space
//!
//! No typo tolerance: a near miss counts as wrong.

use unicode_normalization::UnicodeNormalization;

/// Normalize an answer for comparison
pub fn normalize_answer(input: &str) -> String {
  input
    .nfc()
    .collect::<String>()
    .to_lowercase()
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
}

/// True if the typed answer matches the expected text
pub fn check_answer(user_input: &str, expected: &str) -> bool {
  let normalized_input = normalize_answer(user_input);
  if normalized_input.is_empty() {
    return false;
  }
  normalized_input == normalize_answer(expected)
}
