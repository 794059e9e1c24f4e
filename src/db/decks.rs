//! Deck registry and settings

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result};
use serde::Serialize;

const ACTIVE_DECK_KEY: &str = "active_deck";

/// A named set of vocabulary items (one language or topic)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deck {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Register a deck. Returns false if a deck with that name already exists.
pub fn create_deck(conn: &Connection, name: &str) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO decks (name, created_at) VALUES (?1, ?2)",
        params![name, Utc::now().to_rfc3339()],
    )?;
    if inserted > 0 {
        tracing::info!(deck = name, "created deck");
    }
    Ok(inserted > 0)
}

pub fn deck_exists(conn: &Connection, name: &str) -> Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM decks WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )
}

pub fn list_decks(conn: &Connection) -> Result<Vec<Deck>> {
    let mut stmt = conn.prepare("SELECT name, created_at FROM decks ORDER BY name")?;

    let decks = stmt
        .query_map([], |row| {
            let created_at_str: String = row.get(1)?;
            Ok(Deck {
                name: row.get(0)?,
                created_at: DateTime::parse_from_rfc3339(&created_at_str)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        })?
        .collect::<Result<Vec<_>>>()?;
    Ok(decks)
}

/// Delete a deck with all its items and session logs.
///
/// If the deleted deck was the active one, another remaining deck becomes active.
pub fn delete_deck(conn: &Connection, name: &str) -> Result<bool> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM vocabulary WHERE deck = ?1", params![name])?;
    tx.execute("DELETE FROM study_sessions WHERE deck = ?1", params![name])?;
    let deleted = tx.execute("DELETE FROM decks WHERE name = ?1", params![name])?;
    tx.commit()?;

    if get_active_deck(conn)?.as_deref() == Some(name) {
        match list_decks(conn)?.into_iter().next() {
            Some(next) => set_active_deck(conn, &next.name)?,
            None => {
                conn.execute("DELETE FROM settings WHERE key = ?1", params![ACTIVE_DECK_KEY])?;
            }
        }
    }

    Ok(deleted > 0)
}

// ==================== Settings ====================

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare("SELECT value FROM settings WHERE key = ?1")?;
    let mut rows = stmt.query(params![key])?;
    if let Some(row) = rows.next()? {
        Ok(Some(row.get(0)?))
    } else {
        Ok(None)
    }
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}

/// Deck used when none is given explicitly
pub fn get_active_deck(conn: &Connection) -> Result<Option<String>> {
    get_setting(conn, ACTIVE_DECK_KEY)
}

pub fn set_active_deck(conn: &Connection, name: &str) -> Result<()> {
    set_setting(conn, ACTIVE_DECK_KEY, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ItemStore;
    use crate::testing::TestEnv;

    #[test]
    fn test_create_and_list_decks() {
        let env = TestEnv::new().unwrap();

        assert!(create_deck(&env.conn, "Spanish").unwrap());
        assert!(create_deck(&env.conn, "English").unwrap());
        assert!(!create_deck(&env.conn, "English").unwrap());

        let names: Vec<_> = list_decks(&env.conn)
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["English", "Spanish"]);
        assert!(deck_exists(&env.conn, "Spanish").unwrap());
        assert!(!deck_exists(&env.conn, "French").unwrap());
    }

    #[test]
    fn test_delete_deck_removes_items() {
        let env = TestEnv::new().unwrap();
        create_deck(&env.conn, "English").unwrap();
        env.conn.create_item("Hund", "dog", "English").unwrap();

        assert!(delete_deck(&env.conn, "English").unwrap());
        assert!(env.conn.load_all_items("English").unwrap().is_empty());
        assert!(!delete_deck(&env.conn, "English").unwrap());
    }

    #[test]
    fn test_delete_active_deck_picks_another() {
        let env = TestEnv::new().unwrap();
        create_deck(&env.conn, "English").unwrap();
        create_deck(&env.conn, "Spanish").unwrap();
        set_active_deck(&env.conn, "English").unwrap();

        delete_deck(&env.conn, "English").unwrap();
        assert_eq!(get_active_deck(&env.conn).unwrap().as_deref(), Some("Spanish"));

        delete_deck(&env.conn, "Spanish").unwrap();
        assert_eq!(get_active_deck(&env.conn).unwrap(), None);
    }

    #[test]
    fn test_settings_roundtrip() {
        let env = TestEnv::new().unwrap();
        assert_eq!(get_setting(&env.conn, "missing").unwrap(), None);

        set_setting(&env.conn, "k", "v1").unwrap();
        set_setting(&env.conn, "k", "v2").unwrap();
        assert_eq!(get_setting(&env.conn, "k").unwrap().as_deref(), Some("v2"));
    }
}
