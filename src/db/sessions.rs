//! Study session logging

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, Result};
use serde::Serialize;

/// One finished practice session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudySessionLog {
    pub id: i64,
    pub deck: String,
    pub started_at: DateTime<Utc>,
    pub duration_minutes: f64,
    pub words_practiced: i64,
    pub correct_answers: i64,
}

impl StudySessionLog {
    pub fn accuracy(&self) -> f64 {
        if self.words_practiced > 0 {
            self.correct_answers as f64 / self.words_practiced as f64
        } else {
            0.0
        }
    }
}

pub fn insert_study_session(
    conn: &Connection,
    deck: &str,
    started_at: DateTime<Utc>,
    duration_minutes: f64,
    words_practiced: i64,
    correct_answers: i64,
) -> Result<i64> {
    conn.execute(
        r#"
    INSERT INTO study_sessions (deck, started_at, duration_minutes, words_practiced, correct_answers)
    VALUES (?1, ?2, ?3, ?4, ?5)
    "#,
        params![
            deck,
            started_at.to_rfc3339(),
            duration_minutes,
            words_practiced,
            correct_answers,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Sessions started at or after `since`, oldest first
pub fn get_sessions_since(conn: &Connection, since: DateTime<Utc>) -> Result<Vec<StudySessionLog>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT id, deck, started_at, duration_minutes, words_practiced, correct_answers
    FROM study_sessions
    WHERE started_at >= ?1
    ORDER BY started_at ASC
    "#,
    )?;

    let sessions = stmt
        .query_map(params![since.to_rfc3339()], row_to_session)?
        .collect::<Result<Vec<_>>>()?;
    Ok(sessions)
}

/// Sessions from the last 7 days
pub fn get_weekly_sessions(conn: &Connection) -> Result<Vec<StudySessionLog>> {
    get_sessions_since(conn, Utc::now() - Duration::days(7))
}

fn row_to_session(row: &rusqlite::Row) -> Result<StudySessionLog> {
    let started_at_str: String = row.get(2)?;

    Ok(StudySessionLog {
        id: row.get(0)?,
        deck: row.get(1)?,
        started_at: DateTime::parse_from_rfc3339(&started_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        duration_minutes: row.get(3)?,
        words_practiced: row.get(4)?,
        correct_answers: row.get(5)?,
    })
}
