use rand::Rng;
use serde::{Deserialize, Serialize};

use super::VocabularyItem;

/// Direction an item is asked in.
///
/// Chosen by the presentation layer each time an item is shown; never stored
/// on the item itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
  PromptToAnswer, // show prompt, expect answer
  AnswerToPrompt, // show answer, expect prompt
}

impl Direction {
  /// Pick either direction with equal probability
  pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
    if rng.random_bool(0.5) {
      Self::PromptToAnswer
    } else {
      Self::AnswerToPrompt
    }
  }

  /// Text shown to the learner
  pub fn shown<'a>(&self, item: &'a VocabularyItem) -> &'a str {
    match self {
      Self::PromptToAnswer => &item.prompt,
      Self::AnswerToPrompt => &item.answer,
    }
  }

  /// Text the learner has to type
  pub fn expected<'a>(&self, item: &'a VocabularyItem) -> &'a str {
    match self {
      Self::PromptToAnswer => &item.answer,
      Self::AnswerToPrompt => &item.prompt,
    }
  }
}
