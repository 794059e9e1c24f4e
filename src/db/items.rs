//! Vocabulary item CRUD and the storage interface used by practice sessions

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Result};

use crate::domain::{ItemError, Level, VocabularyItem};

const ITEM_COLUMNS: &str = "id, deck, prompt, answer, total_correct, total_wrong, consecutive_correct, \
                            level, level_correct_count, level_total_count, level_wrong_streak, \
                            frequency_multiplier, mastered, last_practiced";

/// Narrow storage contract the scheduler's callers depend on.
///
/// The scheduler itself never touches storage: callers load a deck snapshot,
/// run `record_answer`, and persist the returned item through `save_item`.
pub trait ItemStore {
    /// All items currently belonging to `deck`, in insertion order
    fn load_all_items(&self, deck: &str) -> Result<Vec<VocabularyItem>>;

    /// Persist the progress fields of an existing item
    fn save_item(&self, item: &VocabularyItem) -> Result<()>;

    /// Insert a fresh level-1 item and return it with its new id
    fn create_item(&self, prompt: &str, answer: &str, deck: &str) -> Result<VocabularyItem>;
}

impl ItemStore for Connection {
    fn load_all_items(&self, deck: &str) -> Result<Vec<VocabularyItem>> {
        get_items_by_deck(self, deck)
    }

    fn save_item(&self, item: &VocabularyItem) -> Result<()> {
        update_item_progress(self, item)
    }

    fn create_item(&self, prompt: &str, answer: &str, deck: &str) -> Result<VocabularyItem> {
        let mut item = VocabularyItem::new(prompt.trim().to_string(), answer.trim().to_string(), deck.to_string());
        item.id = insert_item(self, &item)?;
        tracing::debug!(item_id = item.id, deck, "created vocabulary item");
        Ok(item)
    }
}

pub fn insert_item(conn: &Connection, item: &VocabularyItem) -> Result<i64> {
    conn.execute(
        r#"
    INSERT INTO vocabulary (deck, prompt, answer, total_correct, total_wrong, consecutive_correct,
                            level, level_correct_count, level_total_count, level_wrong_streak,
                            frequency_multiplier, mastered, last_practiced)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
    "#,
        params![
            item.deck,
            item.prompt,
            item.answer,
            item.total_correct,
            item.total_wrong,
            item.consecutive_correct,
            item.level.as_u8(),
            item.level_correct_count,
            item.level_total_count,
            item.level_wrong_streak,
            item.frequency_multiplier,
            item.mastered,
            item.last_practiced.map(|dt| dt.to_rfc3339()),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_item_by_id(conn: &Connection, id: i64) -> Result<Option<VocabularyItem>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM vocabulary WHERE id = ?1", ITEM_COLUMNS))?;

    let mut rows = stmt.query(params![id])?;
    if let Some(row) = rows.next()? {
        Ok(Some(row_to_item(row)?))
    } else {
        Ok(None)
    }
}

pub fn get_items_by_deck(conn: &Connection, deck: &str) -> Result<Vec<VocabularyItem>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM vocabulary WHERE deck = ?1 ORDER BY id ASC",
        ITEM_COLUMNS
    ))?;

    let items = stmt
        .query_map(params![deck], |row| row_to_item(row))?
        .collect::<Result<Vec<_>>>()?;
    Ok(items)
}

pub fn count_items(conn: &Connection, deck: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM vocabulary WHERE deck = ?1",
        params![deck],
        |row| row.get(0),
    )
}

/// Write back every progress field after an answer
pub fn update_item_progress(conn: &Connection, item: &VocabularyItem) -> Result<()> {
    let updated = conn.execute(
        r#"
    UPDATE vocabulary
    SET total_correct = ?1,
        total_wrong = ?2,
        consecutive_correct = ?3,
        level = ?4,
        level_correct_count = ?5,
        level_total_count = ?6,
        level_wrong_streak = ?7,
        frequency_multiplier = ?8,
        mastered = ?9,
        last_practiced = ?10
    WHERE id = ?11
    "#,
        params![
            item.total_correct,
            item.total_wrong,
            item.consecutive_correct,
            item.level.as_u8(),
            item.level_correct_count,
            item.level_total_count,
            item.level_wrong_streak,
            item.frequency_multiplier,
            item.mastered,
            item.last_practiced.map(|dt| dt.to_rfc3339()),
            item.id,
        ],
    )?;

    if updated == 0 {
        return Err(rusqlite::Error::QueryReturnedNoRows);
    }
    Ok(())
}

/// Edit the word pair without touching progress
pub fn update_item_text(conn: &Connection, id: i64, prompt: &str, answer: &str) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE vocabulary SET prompt = ?1, answer = ?2 WHERE id = ?3",
        params![prompt.trim(), answer.trim(), id],
    )?;
    Ok(updated > 0)
}

pub fn delete_item(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM vocabulary WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

fn corrupt(column: usize, ty: Type, err: ItemError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, ty, Box::new(err))
}

/// Convert a database row to a VocabularyItem, rejecting corrupted progress
pub(crate) fn row_to_item(row: &rusqlite::Row) -> Result<VocabularyItem> {
    let level_raw: i64 = row.get(7)?;
    let level = u8::try_from(level_raw)
        .ok()
        .and_then(Level::from_u8)
        .ok_or_else(|| corrupt(7, Type::Integer, ItemError::InvalidLevel(level_raw)))?;
    let last_practiced_str: Option<String> = row.get(13)?;

    let item = VocabularyItem {
        id: row.get(0)?,
        deck: row.get(1)?,
        prompt: row.get(2)?,
        answer: row.get(3)?,
        total_correct: row.get(4)?,
        total_wrong: row.get(5)?,
        consecutive_correct: row.get(6)?,
        level,
        level_correct_count: row.get(8)?,
        level_total_count: row.get(9)?,
        level_wrong_streak: row.get(10)?,
        frequency_multiplier: row.get(11)?,
        mastered: row.get(12)?,
        last_practiced: last_practiced_str.and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        }),
    };

    item.validate().map_err(|e| corrupt(0, Type::Integer, e))?;
    Ok(item)
}
