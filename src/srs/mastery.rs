//! Level-based mastery transitions.
//!
//! Every answer moves an item through a small state machine:
//! - correct answers accumulate toward promotion to the next level
//! - wrong answers either demote the item or, at level 1, boost how often
//!   it is selected
//!
//! Counters are the only input. There is no wall-clock scheduling.

use chrono::{DateTime, Utc};

use crate::domain::{Level, VocabularyItem, MAX_FREQUENCY_MULTIPLIER, MIN_FREQUENCY_MULTIPLIER};

/// Factor applied to the multiplier on each wrong answer at level 1
const LEVEL_ONE_BOOST_FACTOR: f64 = 2.0;

/// Attempts and correct answers needed within a level before promotion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromotionRule {
  pub min_total: i64,
  pub required_correct: i64,
}

/// Wrong-answer streak that demotes an item, and the multiplier it lands with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemotionRule {
  pub wrong_streak: i64,
  pub multiplier: f64,
}

pub fn promotion_rule(level: Level) -> Option<PromotionRule> {
  let (min_total, required_correct) = match level {
    Level::New => (5, 4),
    Level::Familiar => (10, 6),
    Level::Advanced => (15, 10),
    Level::Mastered => return None,
  };
  Some(PromotionRule {
    min_total,
    required_correct,
  })
}

pub fn demotion_rule(level: Level) -> Option<DemotionRule> {
  match level {
    Level::New => None,
    Level::Familiar => Some(DemotionRule {
      wrong_streak: 1,
      multiplier: 2.0,
    }),
    Level::Advanced | Level::Mastered => Some(DemotionRule {
      wrong_streak: 2,
      multiplier: 1.5,
    }),
  }
}

/// Side effect of a single answer on the item's level or weight
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
  Promoted { from: Level, to: Level },
  Demoted { from: Level, to: Level },
  Boosted { multiplier: f64 },
}

/// Item state after an answer, plus what (if anything) changed beyond the counters
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
  pub item: VocabularyItem,
  pub transition: Option<Transition>,
}

/// Record an answer, stamping `last_practiced` with the current time.
pub fn record_answer(item: VocabularyItem, correct: bool) -> AnswerOutcome {
  record_answer_at(item, correct, Utc::now())
}

/// Record an answer with an explicit timestamp.
///
/// Identical answer sequences always produce identical counters; `now` only
/// ends up in `last_practiced`.
pub fn record_answer_at(mut item: VocabularyItem, correct: bool, now: DateTime<Utc>) -> AnswerOutcome {
  item.level_total_count += 1;
  item.last_practiced = Some(now);

  let transition = if correct {
    item.total_correct += 1;
    item.consecutive_correct += 1;
    item.level_correct_count += 1;
    item.level_wrong_streak = 0;
    apply_promotion(&mut item)
  } else {
    item.total_wrong += 1;
    item.consecutive_correct = 0;
    item.level_wrong_streak += 1;
    apply_demotion(&mut item)
  };

  item.mastered = item.level.is_mastered();

  if let Some(t) = transition {
    tracing::debug!(item_id = item.id, transition = ?t, "mastery transition");
  }

  AnswerOutcome { item, transition }
}

fn apply_promotion(item: &mut VocabularyItem) -> Option<Transition> {
  let rule = promotion_rule(item.level)?;
  if item.level_total_count < rule.min_total || item.level_correct_count < rule.required_correct {
    return None;
  }

  let from = item.level;
  let to = from.next()?;
  change_level(item, to, MIN_FREQUENCY_MULTIPLIER);
  Some(Transition::Promoted { from, to })
}

fn apply_demotion(item: &mut VocabularyItem) -> Option<Transition> {
  match demotion_rule(item.level) {
    Some(rule) => {
      if item.level_wrong_streak < rule.wrong_streak {
        return None;
      }
      let from = item.level;
      let to = from.previous()?;
      change_level(item, to, rule.multiplier);
      Some(Transition::Demoted { from, to })
    }
    // Floor level: keep the item, show it more often instead
    None => {
      if item.level_wrong_streak < 1 {
        return None;
      }
      let boosted = (item.frequency_multiplier * LEVEL_ONE_BOOST_FACTOR).min(MAX_FREQUENCY_MULTIPLIER);
      if boosted == item.frequency_multiplier {
        return None;
      }
      item.frequency_multiplier = boosted;
      Some(Transition::Boosted { multiplier: boosted })
    }
  }
}

/// Move to `to` and clear everything scoped to the previous level
fn change_level(item: &mut VocabularyItem, to: Level, multiplier: f64) {
  item.level = to;
  item.level_correct_count = 0;
  item.level_total_count = 0;
  item.level_wrong_streak = 0;
  item.frequency_multiplier = multiplier;
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::{Rng, SeedableRng};

  fn new_item() -> VocabularyItem {
    VocabularyItem::new("Wasser".to_string(), "water".to_string(), "English".to_string())
  }

  fn item_at(level: Level) -> VocabularyItem {
    let mut item = new_item();
    item.level = level;
    item.mastered = level.is_mastered();
    item
  }

  fn answer_all(mut item: VocabularyItem, answers: &[bool]) -> VocabularyItem {
    for &correct in answers {
      item = record_answer(item, correct).item;
    }
    item
  }

  fn assert_invariants(item: &VocabularyItem) {
    assert!(item.validate().is_ok(), "invalid item: {:?}", item);
    assert!((1..=4).contains(&item.level.as_u8()));
    assert!(item.frequency_multiplier >= 1.0 && item.frequency_multiplier <= 8.0);
    assert_eq!(item.mastered, item.level == Level::Mastered);
  }

  #[test]
  fn test_rule_table() {
    assert_eq!(
      promotion_rule(Level::New),
      Some(PromotionRule {
        min_total: 5,
        required_correct: 4
      })
    );
    assert_eq!(promotion_rule(Level::Familiar).map(|r| r.min_total), Some(10));
    assert_eq!(promotion_rule(Level::Advanced).map(|r| r.required_correct), Some(10));
    assert_eq!(promotion_rule(Level::Mastered), None);

    assert!(demotion_rule(Level::New).is_none());
    assert_eq!(demotion_rule(Level::Familiar).map(|r| r.wrong_streak), Some(1));
    assert_eq!(demotion_rule(Level::Advanced).map(|r| r.wrong_streak), Some(2));
    assert_eq!(demotion_rule(Level::Mastered).map(|r| r.wrong_streak), Some(2));
  }

  #[test]
  fn test_correct_answer_updates_counters() {
    let now = Utc::now();
    let outcome = record_answer_at(new_item(), true, now);
    let item = outcome.item;

    assert_eq!(item.total_correct, 1);
    assert_eq!(item.total_wrong, 0);
    assert_eq!(item.consecutive_correct, 1);
    assert_eq!(item.level_correct_count, 1);
    assert_eq!(item.level_total_count, 1);
    assert_eq!(item.level_wrong_streak, 0);
    assert_eq!(item.last_practiced, Some(now));
    assert!(outcome.transition.is_none());
  }

  #[test]
  fn test_wrong_answer_resets_consecutive() {
    let item = answer_all(new_item(), &[true, true, false]);

    assert_eq!(item.total_correct, 2);
    assert_eq!(item.total_wrong, 1);
    assert_eq!(item.consecutive_correct, 0);
    assert_eq!(item.level_wrong_streak, 1);
    assert_eq!(item.level_total_count, 3);
  }

  #[test]
  fn test_correct_answer_clears_wrong_streak() {
    let item = answer_all(new_item(), &[false, false, true]);
    assert_eq!(item.level_wrong_streak, 0);
    assert_eq!(item.consecutive_correct, 1);
  }

  #[test]
  fn test_promotion_from_level_one() {
    let mut item = new_item();
    item.level_total_count = 5;
    item.level_correct_count = 4;
    item.frequency_multiplier = 4.0;

    let outcome = record_answer(item, true);

    assert_eq!(
      outcome.transition,
      Some(Transition::Promoted {
        from: Level::New,
        to: Level::Familiar
      })
    );
    assert_eq!(outcome.item.level, Level::Familiar);
    assert_eq!(outcome.item.level_total_count, 0);
    assert_eq!(outcome.item.level_correct_count, 0);
    assert!((outcome.item.frequency_multiplier - 1.0).abs() < f64::EPSILON);
  }

  #[test]
  fn test_first_promotion_needs_five_attempts() {
    // Four correct answers meet required_correct but not min_total
    let item = answer_all(new_item(), &[true, true, true, true]);
    assert_eq!(item.level, Level::New);

    let outcome = record_answer(item, true);
    assert_eq!(outcome.item.level, Level::Familiar);
  }

  #[test]
  fn test_promotion_after_mixed_answers() {
    // Wrong answers at level 1 do not reset the level counters
    let item = answer_all(new_item(), &[false, false, true, true, true]);
    assert_eq!(item.level, Level::New);
    assert!((item.frequency_multiplier - 4.0).abs() < f64::EPSILON);

    let outcome = record_answer(item, true);
    assert_eq!(outcome.item.level, Level::Familiar);
    assert!((outcome.item.frequency_multiplier - 1.0).abs() < f64::EPSILON);
  }

  #[test]
  fn test_promotion_never_skips_a_level() {
    let mut item = new_item();
    item.level_total_count = 40;
    item.level_correct_count = 40;

    let outcome = record_answer(item, true);
    assert_eq!(outcome.item.level, Level::Familiar);
  }

  #[test]
  fn test_full_path_to_mastered() {
    let mut item = new_item();
    let mut answers = 0;
    while item.level != Level::Mastered {
      item = record_answer(item, true).item;
      answers += 1;
      assert!(answers <= 30, "never reached mastered");
    }

    // 5 at level 1, 10 at level 2, 15 at level 3
    assert_eq!(answers, 30);
    assert!(item.mastered);
    assert_eq!(item.consecutive_correct, 30);
  }

  #[test]
  fn test_mastered_stays_mastered_on_correct() {
    let outcome = record_answer(item_at(Level::Mastered), true);
    assert_eq!(outcome.item.level, Level::Mastered);
    assert!(outcome.item.mastered);
    assert!(outcome.transition.is_none());
  }

  #[test]
  fn test_level_one_frequency_escalation() {
    let mut item = new_item();
    let mut seen = Vec::new();
    for _ in 0..4 {
      item = record_answer(item, false).item;
      seen.push(item.frequency_multiplier);
    }

    assert_eq!(seen, vec![2.0, 4.0, 8.0, 8.0]);
    assert_eq!(item.level, Level::New);
  }

  #[test]
  fn test_level_one_boost_transition_reported() {
    let outcome = record_answer(new_item(), false);
    assert_eq!(outcome.transition, Some(Transition::Boosted { multiplier: 2.0 }));

    let mut capped = new_item();
    capped.frequency_multiplier = 8.0;
    let outcome = record_answer(capped, false);
    assert!(outcome.transition.is_none());
    assert!((outcome.item.frequency_multiplier - 8.0).abs() < f64::EPSILON);
  }

  #[test]
  fn test_level_two_demotion() {
    let mut item = item_at(Level::Familiar);
    item.level_total_count = 7;
    item.level_correct_count = 5;

    let outcome = record_answer(item, false);

    assert_eq!(
      outcome.transition,
      Some(Transition::Demoted {
        from: Level::Familiar,
        to: Level::New
      })
    );
    assert_eq!(outcome.item.level, Level::New);
    assert_eq!(outcome.item.level_total_count, 0);
    assert_eq!(outcome.item.level_correct_count, 0);
    assert_eq!(outcome.item.level_wrong_streak, 0);
    assert!((outcome.item.frequency_multiplier - 2.0).abs() < f64::EPSILON);
  }

  #[test]
  fn test_level_three_demotion_threshold() {
    let item = item_at(Level::Advanced);

    let first = record_answer(item, false);
    assert_eq!(first.item.level, Level::Advanced);
    assert!(first.transition.is_none());
    assert_eq!(first.item.level_wrong_streak, 1);

    let second = record_answer(first.item, false);
    assert_eq!(second.item.level, Level::Familiar);
    assert!((second.item.frequency_multiplier - 1.5).abs() < f64::EPSILON);
    assert_eq!(second.item.level_total_count, 0);
    assert_eq!(second.item.level_correct_count, 0);
  }

  #[test]
  fn test_level_three_wrong_streak_broken_by_correct() {
    let item = answer_all(item_at(Level::Advanced), &[false, true, false]);
    assert_eq!(item.level, Level::Advanced);
    assert_eq!(item.level_wrong_streak, 1);
  }

  #[test]
  fn test_single_wrong_at_level_three_counts_toward_total() {
    let item = answer_all(item_at(Level::Advanced), &[true, false]);
    assert_eq!(item.level_total_count, 2);
    assert_eq!(item.level_correct_count, 1);
  }

  #[test]
  fn test_mastered_demotion() {
    let item = answer_all(item_at(Level::Mastered), &[false]);
    assert_eq!(item.level, Level::Mastered);
    assert!(item.mastered);

    let item = answer_all(item, &[false]);
    assert_eq!(item.level, Level::Advanced);
    assert!(!item.mastered);
    assert!((item.frequency_multiplier - 1.5).abs() < f64::EPSILON);
  }

  #[test]
  fn test_demotion_never_skips_a_level() {
    let mut item = item_at(Level::Mastered);
    item.level_wrong_streak = 10;

    let outcome = record_answer(item, false);
    assert_eq!(outcome.item.level, Level::Advanced);
  }

  #[test]
  fn test_identical_sequences_identical_counters() {
    let answers = [true, false, true, true, false, false, true, true, true, true, true, false];
    let now = Utc::now();

    let run = |mut item: VocabularyItem| {
      for &a in &answers {
        item = record_answer_at(item, a, now).item;
      }
      item
    };

    assert_eq!(run(new_item()), run(new_item()));
  }

  #[test]
  fn test_invariants_hold_for_random_sequences() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..50 {
      let mut item = new_item();
      let mut calls = 0;
      for _ in 0..200 {
        let before = item.clone();
        let outcome = record_answer(item, rng.random_bool(0.7));
        item = outcome.item;
        calls += 1;

        assert_invariants(&item);
        assert!(item.total_correct >= before.total_correct);
        assert!(item.total_wrong >= before.total_wrong);
        assert_eq!(item.total_correct + item.total_wrong, calls);

        let step = i16::from(item.level.as_u8()) - i16::from(before.level.as_u8());
        assert!(step.abs() <= 1);
        if step != 0 {
          assert_eq!(item.level_correct_count, 0);
          assert_eq!(item.level_total_count, 0);
          assert_eq!(item.level_wrong_streak, 0);
        }
      }
    }
  }
}
