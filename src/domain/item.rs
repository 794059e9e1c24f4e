use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lower bound for an item's selection boost
pub const MIN_FREQUENCY_MULTIPLIER: f64 = 1.0;

/// Upper bound for an item's selection boost
pub const MAX_FREQUENCY_MULTIPLIER: f64 = 8.0;

/// Mastery tier of a vocabulary item (1 = newest/weakest, 4 = mastered)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Level {
  New = 1,
  Familiar = 2,
  Advanced = 3,
  Mastered = 4,
}

impl Level {
  pub const ALL: [Level; 4] = [Self::New, Self::Familiar, Self::Advanced, Self::Mastered];

  pub fn from_u8(n: u8) -> Option<Self> {
    match n {
      1 => Some(Self::New),
      2 => Some(Self::Familiar),
      3 => Some(Self::Advanced),
      4 => Some(Self::Mastered),
      _ => None,
    }
  }

  pub fn as_u8(self) -> u8 {
    self as u8
  }

  /// Next level up, or None at the top
  pub fn next(self) -> Option<Self> {
    Self::from_u8(self.as_u8() + 1)
  }

  /// Next level down, or None at the floor
  pub fn previous(self) -> Option<Self> {
    Self::from_u8(self.as_u8() - 1)
  }

  pub fn is_mastered(self) -> bool {
    self == Self::Mastered
  }
}

impl TryFrom<u8> for Level {
  type Error = ItemError;

  fn try_from(n: u8) -> Result<Self, Self::Error> {
    Self::from_u8(n).ok_or(ItemError::InvalidLevel(i64::from(n)))
  }
}

impl From<Level> for u8 {
  fn from(level: Level) -> Self {
    level.as_u8()
  }
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_u8())
  }
}

/// Precondition violations found in a stored item.
///
/// These point at data corruption in the storage layer; the scheduler
/// never produces them itself.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemError {
  InvalidLevel(i64),
  MultiplierOutOfRange(f64),
  NegativeCounter { field: &'static str, value: i64 },
  MasteredMismatch { level: Level, mastered: bool },
}

impl fmt::Display for ItemError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::InvalidLevel(n) => write!(f, "level {} is outside 1..=4", n),
      Self::MultiplierOutOfRange(m) => write!(
        f,
        "frequency multiplier {} is outside {}..={}",
        m, MIN_FREQUENCY_MULTIPLIER, MAX_FREQUENCY_MULTIPLIER
      ),
      Self::NegativeCounter { field, value } => write!(f, "{} is negative ({})", field, value),
      Self::MasteredMismatch { level, mastered } => {
        write!(f, "mastered={} does not match level {}", mastered, level)
      }
    }
  }
}

impl std::error::Error for ItemError {}

/// One word pair in a deck, together with its learning progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyItem {
  pub id: i64,
  pub deck: String,
  pub prompt: String,
  pub answer: String,

  // Lifetime counters
  pub total_correct: i64,
  pub total_wrong: i64,
  pub consecutive_correct: i64,

  // Level-scoped progress, reset on every level change
  pub level: Level,
  pub level_correct_count: i64,
  pub level_total_count: i64,
  pub level_wrong_streak: i64,

  pub frequency_multiplier: f64,
  pub mastered: bool,
  pub last_practiced: Option<DateTime<Utc>>,
}

impl VocabularyItem {
  pub fn new(prompt: String, answer: String, deck: String) -> Self {
    Self {
      id: 0,
      deck,
      prompt,
      answer,
      total_correct: 0,
      total_wrong: 0,
      consecutive_correct: 0,
      level: Level::New,
      level_correct_count: 0,
      level_total_count: 0,
      level_wrong_streak: 0,
      frequency_multiplier: MIN_FREQUENCY_MULTIPLIER,
      mastered: false,
      last_practiced: None,
    }
  }

  /// Total number of recorded answers
  pub fn total_answers(&self) -> i64 {
    self.total_correct + self.total_wrong
  }

  /// Check the invariants a stored item must satisfy before scheduling
  pub fn validate(&self) -> Result<(), ItemError> {
    let counters = [
      ("total_correct", self.total_correct),
      ("total_wrong", self.total_wrong),
      ("consecutive_correct", self.consecutive_correct),
      ("level_correct_count", self.level_correct_count),
      ("level_total_count", self.level_total_count),
      ("level_wrong_streak", self.level_wrong_streak),
    ];
    if let Some((field, value)) = counters.into_iter().find(|(_, v)| *v < 0) {
      return Err(ItemError::NegativeCounter { field, value });
    }

    if !(MIN_FREQUENCY_MULTIPLIER..=MAX_FREQUENCY_MULTIPLIER).contains(&self.frequency_multiplier) {
      return Err(ItemError::MultiplierOutOfRange(self.frequency_multiplier));
    }

    if self.mastered != self.level.is_mastered() {
      return Err(ItemError::MasteredMismatch {
        level: self.level,
        mastered: self.mastered,
      });
    }

    Ok(())
  }
}
