//! Weighted item selection across a whole deck.
//!
//! Weaker items surface more often:
//! - base weight falls with level (4, 3, 2, 1)
//! - the item's frequency multiplier scales the base weight
//! - every item keeps a weight of at least 1, so nothing is ever starved

use rand::Rng;

use crate::domain::{Level, VocabularyItem};

/// Smallest weight any item can have
const MIN_EFFECTIVE_WEIGHT: u32 = 1;

/// Item id with its selection weight, for reports and debugging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemWeight {
  pub item_id: i64,
  pub weight: u32,
}

/// Base selection weight for a level (inverse of mastery)
pub fn base_weight(level: Level) -> u32 {
  match level {
    Level::New => 4,
    Level::Familiar => 3,
    Level::Advanced => 2,
    Level::Mastered => 1,
  }
}

/// `floor(base_weight × frequency_multiplier)`, never below 1
pub fn effective_weight(item: &VocabularyItem) -> u32 {
  let scaled = (f64::from(base_weight(item.level)) * item.frequency_multiplier).floor();
  // `as` saturates: NaN and negatives become 0 and are lifted by the floor below
  (scaled as u32).max(MIN_EFFECTIVE_WEIGHT)
}

/// Weights for every item in deck order
pub fn calculate_all_weights(items: &[VocabularyItem]) -> Vec<ItemWeight> {
  items
    .iter()
    .map(|item| ItemWeight {
      item_id: item.id,
      weight: effective_weight(item),
    })
    .collect()
}

/// Running totals of the effective weights; the last entry is the total weight
pub fn cumulative_weights(items: &[VocabularyItem]) -> Vec<u64> {
  items
    .iter()
    .scan(0u64, |total, item| {
      *total += u64::from(effective_weight(item));
      Some(*total)
    })
    .collect()
}

/// Pick the next item to ask, with probability proportional to its effective weight.
///
/// Returns None for an empty deck. Never modifies the items.
pub fn select_next<'a, R: Rng + ?Sized>(items: &'a [VocabularyItem], rng: &mut R) -> Option<&'a VocabularyItem> {
  let cumulative = cumulative_weights(items);
  let total = *cumulative.last()?;

  let target = rng.random_range(0..total);
  let index = cumulative.partition_point(|&upper| upper <= target);

  let item = items.get(index)?;
  tracing::debug!(item_id = item.id, total_weight = total, "selected next item");
  Some(item)
}
