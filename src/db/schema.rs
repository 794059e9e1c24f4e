use rusqlite::{Connection, Result};

pub fn run_migrations(conn: &Connection) -> Result<()> {
  conn.execute_batch(
    r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS decks (
      name TEXT PRIMARY KEY,
      created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS vocabulary (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      deck TEXT NOT NULL,
      prompt TEXT NOT NULL,
      answer TEXT NOT NULL,
      total_correct INTEGER NOT NULL DEFAULT 0,
      total_wrong INTEGER NOT NULL DEFAULT 0,
      consecutive_correct INTEGER NOT NULL DEFAULT 0,
      last_practiced TEXT,
      mastered INTEGER NOT NULL DEFAULT 0,
      -- Level tracking columns
      level INTEGER NOT NULL DEFAULT 1,
      level_correct_count INTEGER NOT NULL DEFAULT 0,
      level_total_count INTEGER NOT NULL DEFAULT 0,
      level_wrong_streak INTEGER NOT NULL DEFAULT 0,
      frequency_multiplier REAL NOT NULL DEFAULT 1.0,
      FOREIGN KEY (deck) REFERENCES decks(name) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS study_sessions (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      deck TEXT NOT NULL,
      started_at TEXT NOT NULL,
      duration_minutes REAL NOT NULL,
      words_practiced INTEGER NOT NULL,
      correct_answers INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS settings (
      key TEXT PRIMARY KEY,
      value TEXT NOT NULL
    );

    -- Indexes
    CREATE INDEX IF NOT EXISTS idx_vocabulary_deck ON vocabulary(deck);
    CREATE INDEX IF NOT EXISTS idx_study_sessions_started_at ON study_sessions(started_at);
    "#,
  )?;

  Ok(())
}
