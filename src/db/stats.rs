//! Deck statistics and star rewards

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Result};
use serde::Serialize;

use super::decks::list_decks;
use super::items::get_items_by_deck;
use crate::domain::{Level, VocabularyItem};

/// Correct answers per golden star
pub const CORRECT_ANSWERS_PER_STAR: i64 = 50;

/// Word pairs per red star
pub const ITEMS_PER_STAR: i64 = 50;

/// Reward stars for a deck.
///
/// Every golden/red pair is traded in for one unicorn bonus; the
/// `remaining_*` fields hold what is left after the trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StarTally {
    pub golden_stars: i64,
    pub red_stars: i64,
    pub unicorn_bonus: i64,
    pub remaining_golden: i64,
    pub remaining_red: i64,
}

impl StarTally {
    pub fn new(total_correct: i64, item_count: i64) -> Self {
        let golden_stars = total_correct / CORRECT_ANSWERS_PER_STAR;
        let red_stars = item_count / ITEMS_PER_STAR;
        let unicorn_bonus = golden_stars.min(red_stars);

        Self {
            golden_stars,
            red_stars,
            unicorn_bonus,
            remaining_golden: golden_stars - unicorn_bonus,
            remaining_red: red_stars - unicorn_bonus,
        }
    }
}

/// Per-item line of a deck report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemReport {
    pub prompt: String,
    pub answer: String,
    pub correct_answers: i64,
    pub wrong_answers: i64,
    pub level: Level,
    pub mastered: bool,
    pub last_practiced: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckStats {
    pub deck: String,
    pub total_items: i64,
    pub mastered_items: i64,
    pub in_progress_items: i64,
    pub total_correct: i64,
    pub total_wrong: i64,
    /// Item count per level, index 0 = level 1
    pub items_per_level: [i64; 4],
    pub stars: StarTally,
    /// Sorted by answer, case-insensitive
    pub items: Vec<ItemReport>,
}

impl DeckStats {
    /// Read-only fold over a deck snapshot
    pub fn from_items(deck: &str, items: &[VocabularyItem]) -> Self {
        let total_items = items.len() as i64;
        let total_correct: i64 = items.iter().map(|i| i.total_correct).sum();
        let total_wrong: i64 = items.iter().map(|i| i.total_wrong).sum();
        let mastered_items = items.iter().filter(|i| i.mastered).count() as i64;

        let mut items_per_level = [0; 4];
        for item in items {
            items_per_level[usize::from(item.level.as_u8() - 1)] += 1;
        }

        let mut reports: Vec<ItemReport> = items
            .iter()
            .map(|i| ItemReport {
                prompt: i.prompt.clone(),
                answer: i.answer.clone(),
                correct_answers: i.total_correct,
                wrong_answers: i.total_wrong,
                level: i.level,
                mastered: i.mastered,
                last_practiced: i.last_practiced,
            })
            .collect();
        reports.sort_by_key(|r| r.answer.to_lowercase());

        Self {
            deck: deck.to_string(),
            total_items,
            mastered_items,
            in_progress_items: total_items - mastered_items,
            total_correct,
            total_wrong,
            items_per_level,
            stars: StarTally::new(total_correct, total_items),
            items: reports,
        }
    }

    pub fn mastered_percentage(&self) -> f64 {
        if self.total_items > 0 {
            self.mastered_items as f64 * 100.0 / self.total_items as f64
        } else {
            0.0
        }
    }

    pub fn level_count(&self, level: Level) -> i64 {
        self.items_per_level[usize::from(level.as_u8() - 1)]
    }
}

/// Load a deck and fold it into statistics
pub fn get_deck_stats(conn: &Connection, deck: &str) -> Result<DeckStats> {
    let items = get_items_by_deck(conn, deck)?;
    Ok(DeckStats::from_items(deck, &items))
}

/// Statistics for every registered deck, by deck name
pub fn get_all_deck_stats(conn: &Connection) -> Result<Vec<DeckStats>> {
    list_decks(conn)?
        .iter()
        .map(|deck| get_deck_stats(conn, &deck.name))
        .collect()
}
