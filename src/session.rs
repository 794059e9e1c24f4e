//! Practice session over one deck.
//!
//! Drives the strict alternation the scheduler expects: pick an item, ask
//! it, record the answer to completion, persist, then pick again from the
//! updated snapshot.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::fmt;

use crate::config::DeckConfig;
use crate::db::{self, DbLockError, DbPool, ItemStore, LogOnError};
use crate::domain::{Direction, VocabularyItem};
use crate::srs::{AnswerOutcome, Transition, item_selector, mastery};
use crate::validation;

#[derive(Debug)]
pub enum SessionError {
  Db(rusqlite::Error),
  Lock(DbLockError),
  UnknownDeck(String),
  UnknownItem(i64),
  /// `answer` called without an outstanding question
  NoQuestion,
  /// Items whose progress never reached the store, handed back on `finish`
  Unsaved(Vec<VocabularyItem>),
}

impl fmt::Display for SessionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Db(e) => write!(f, "database error: {}", e),
      Self::Lock(e) => write!(f, "{}", e),
      Self::UnknownDeck(name) => write!(f, "deck '{}' does not exist", name),
      Self::UnknownItem(id) => write!(f, "item {} is not part of this session", id),
      Self::NoQuestion => write!(f, "no question is waiting for an answer"),
      Self::Unsaved(items) => write!(f, "progress for {} item(s) could not be saved", items.len()),
    }
  }
}

impl std::error::Error for SessionError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::Db(e) => Some(e),
      Self::Lock(e) => Some(e),
      _ => None,
    }
  }
}

impl From<rusqlite::Error> for SessionError {
  fn from(e: rusqlite::Error) -> Self {
    Self::Db(e)
  }
}

impl From<DbLockError> for SessionError {
  fn from(e: DbLockError) -> Self {
    Self::Lock(e)
  }
}

/// A question handed to the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
  pub item_id: i64,
  pub direction: Direction,
  pub shown: String,
  pub expected: String,
}

/// What the learner sees after answering
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
  pub correct: bool,
  pub expected: String,
  pub item: VocabularyItem,
  pub transition: Option<Transition>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
  pub deck: String,
  pub words_practiced: i64,
  pub correct_answers: i64,
  pub wrong_answers: i64,
  pub duration_minutes: f64,
}

pub struct PracticeSession<R: Rng> {
  pool: DbPool,
  deck: DeckConfig,
  rng: R,
  /// Deck snapshot, updated in place after every answer
  items: Vec<VocabularyItem>,
  current: Option<Question>,
  /// Items whose last save failed, at most one entry per item id
  unsaved: Vec<VocabularyItem>,
  started_at: DateTime<Utc>,
  words_practiced: i64,
  correct_answers: i64,
}

impl<R: Rng> PracticeSession<R> {
  /// Load the deck snapshot and remember the deck as the last one used
  pub fn start(pool: DbPool, deck: DeckConfig, rng: R) -> Result<Self, SessionError> {
    let items = {
      let conn = db::try_lock(&pool)?;
      if !db::deck_exists(&conn, &deck.name)? {
        return Err(SessionError::UnknownDeck(deck.name));
      }
      db::set_active_deck(&conn, &deck.name).log_warn("Failed to remember active deck");
      conn.load_all_items(&deck.name)?
    };

    tracing::info!(deck = %deck.name, items = items.len(), "practice session started");

    Ok(Self {
      pool,
      deck,
      rng,
      items,
      current: None,
      unsaved: Vec::new(),
      started_at: Utc::now(),
      words_practiced: 0,
      correct_answers: 0,
    })
  }

  pub fn deck(&self) -> &DeckConfig {
    &self.deck
  }

  pub fn items(&self) -> &[VocabularyItem] {
    &self.items
  }

  /// Items whose progress could not be persisted yet
  pub fn pending_saves(&self) -> &[VocabularyItem] {
    &self.unsaved
  }

  fn is_pending(&self, item_id: i64) -> bool {
    self.unsaved.iter().any(|i| i.id == item_id)
  }

  /// Replace the snapshot with the stored deck (e.g. after edits elsewhere)
  pub fn reload(&mut self) -> Result<(), SessionError> {
    let conn = db::try_lock(&self.pool)?;
    self.items = conn.load_all_items(&self.deck.name)?;
    self.current = None;
    Ok(())
  }

  /// Pick the next item and a random direction. None if the deck is empty.
  pub fn next_question(&mut self) -> Option<Question> {
    let item = item_selector::select_next(&self.items, &mut self.rng)?;
    let direction = Direction::random(&mut self.rng);

    let question = Question {
      item_id: item.id,
      direction,
      shown: direction.shown(item).to_string(),
      expected: direction.expected(item).to_string(),
    };
    self.current = Some(question.clone());
    Some(question)
  }

  /// Check typed input against the outstanding question and record the result
  pub fn answer(&mut self, input: &str) -> Result<Feedback, SessionError> {
    let question = self.current.take().ok_or(SessionError::NoQuestion)?;
    let correct = validation::check_answer(input, &question.expected);

    let outcome = self.record(question.item_id, correct)?;
    Ok(Feedback {
      correct,
      expected: question.expected,
      item: outcome.item,
      transition: outcome.transition,
    })
  }

  /// Apply an answer to an item, update the snapshot, then persist.
  ///
  /// Saves of earlier failures are retried alongside. If this item's save
  /// fails the snapshot still holds the new state and the item stays in
  /// `pending_saves` until `retry_save` succeeds.
  pub fn record(&mut self, item_id: i64, correct: bool) -> Result<AnswerOutcome, SessionError> {
    let index = self
      .items
      .iter()
      .position(|i| i.id == item_id)
      .ok_or(SessionError::UnknownItem(item_id))?;

    let outcome = mastery::record_answer(self.items[index].clone(), correct);
    self.items[index] = outcome.item.clone();

    self.words_practiced += 1;
    if correct {
      self.correct_answers += 1;
    }

    self.unsaved.retain(|i| i.id != item_id);
    self.unsaved.push(outcome.item.clone());

    // Only this item's own failure is an error here; older ones stay queued
    if let Err(e) = self.retry_save() {
      if self.is_pending(item_id) {
        return Err(e);
      }
    }
    Ok(outcome)
  }

  /// Persist every item from previously failed saves.
  ///
  /// Items that save are dropped from the queue; the first failure is returned.
  pub fn retry_save(&mut self) -> Result<(), SessionError> {
    if self.unsaved.is_empty() {
      return Ok(());
    }

    let conn = db::try_lock(&self.pool)?;
    let mut first_error = None;
    self.unsaved.retain(|item| match conn.save_item(item) {
      Ok(()) => false,
      Err(e) => {
        tracing::warn!(item_id = item.id, "Failed to save progress: {}", e);
        if first_error.is_none() {
          first_error = Some(e);
        }
        true
      }
    });

    match first_error {
      Some(e) => Err(e.into()),
      None => Ok(()),
    }
  }

  /// Add a word pair to the deck and the running snapshot
  pub fn add_item(&mut self, prompt: &str, answer: &str) -> Result<VocabularyItem, SessionError> {
    let item = {
      let conn = db::try_lock(&self.pool)?;
      conn.create_item(prompt, answer, &self.deck.name)?
    };
    self.items.push(item.clone());
    Ok(item)
  }

  pub fn summary(&self) -> SessionSummary {
    let elapsed = Utc::now() - self.started_at;
    SessionSummary {
      deck: self.deck.name.clone(),
      words_practiced: self.words_practiced,
      correct_answers: self.correct_answers,
      wrong_answers: self.words_practiced - self.correct_answers,
      duration_minutes: elapsed.num_milliseconds() as f64 / 60_000.0,
    }
  }

  /// End the session and write it to the study log (skipped if nothing was answered).
  ///
  /// Progress that still cannot be saved is returned in `SessionError::Unsaved`.
  pub fn finish(mut self) -> Result<SessionSummary, SessionError> {
    if let Err(e) = self.retry_save() {
      tracing::error!("Progress lost on finish: {}", e);
      return Err(SessionError::Unsaved(std::mem::take(&mut self.unsaved)));
    }

    let summary = self.summary();
    if summary.words_practiced > 0 {
      let conn = db::try_lock(&self.pool)?;
      db::insert_study_session(
        &conn,
        &summary.deck,
        self.started_at,
        summary.duration_minutes,
        summary.words_practiced,
        summary.correct_answers,
      )?;
    }

    tracing::info!(
      deck = %summary.deck,
      words = summary.words_practiced,
      correct = summary.correct_answers,
      "practice session finished"
    );
    Ok(summary)
  }
}
