//! Application configuration.
//!
//! Built once at startup and passed to whatever needs it; nothing here is
//! global state.

use rusqlite::Connection;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::db;
use crate::paths;

/// Pause between answering and the next question in the terminal driver
pub const DEFAULT_FEEDBACK_DELAY_MS: u64 = 1500;

// ==================== config.toml ====================

/// Configuration file structure for config.toml
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    database: Option<DatabaseSection>,
    practice: Option<PracticeSection>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabaseSection {
    path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PracticeSection {
    active_deck: Option<String>,
    feedback_delay_ms: Option<u64>,
}

/// Resolved application settings
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_path: PathBuf,
    /// Deck to practice when none is given on the command line
    pub active_deck: Option<String>,
    pub feedback_delay: Duration,
}

impl AppConfig {
    /// Load with priority: config.toml > .env / environment > default
    pub fn load() -> Self {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let contents = std::fs::read_to_string(paths::CONFIG_FILE).ok();
        Self::from_sources(contents.as_deref(), |key| std::env::var(key).ok())
    }

    /// Resolve from raw config.toml contents and an environment lookup
    pub fn from_sources(toml_contents: Option<&str>, env: impl Fn(&str) -> Option<String>) -> Self {
        let file = match toml_contents.map(toml::from_str::<ConfigFile>) {
            Some(Ok(file)) => file,
            Some(Err(e)) => {
                tracing::warn!("Ignoring invalid {}: {}", paths::CONFIG_FILE, e);
                ConfigFile::default()
            }
            None => ConfigFile::default(),
        };
        let database = file.database.unwrap_or_default();
        let practice = file.practice.unwrap_or_default();

        let database_path = if let Some(path) = database.path {
            tracing::info!("Using database from {}: {}", paths::CONFIG_FILE, path);
            PathBuf::from(path)
        } else if let Some(path) = env("DATABASE_PATH") {
            tracing::info!("Using database from DATABASE_PATH env: {}", path);
            PathBuf::from(path)
        } else {
            let default = paths::db_path();
            tracing::info!("Using default database path: {}", default.display());
            default
        };

        let active_deck = practice
            .active_deck
            .or_else(|| env("ACTIVE_DECK"))
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let feedback_delay =
            Duration::from_millis(practice.feedback_delay_ms.unwrap_or(DEFAULT_FEEDBACK_DELAY_MS));

        Self {
            database_path,
            active_deck,
            feedback_delay,
        }
    }
}

// ==================== Deck selection ====================

/// The deck a practice session works on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckConfig {
    pub name: String,
}

impl DeckConfig {
    /// Pick the deck to practice.
    ///
    /// Priority: explicit request > configured deck > last used deck > first deck.
    /// Only registered decks are returned.
    pub fn resolve(
        conn: &Connection,
        requested: Option<&str>,
        config: &AppConfig,
    ) -> rusqlite::Result<Option<Self>> {
        let candidates = [
            requested.map(str::to_string),
            config.active_deck.clone(),
            db::get_active_deck(conn)?,
        ];

        for name in candidates.into_iter().flatten() {
            if db::deck_exists(conn, &name)? {
                return Ok(Some(Self { name }));
            }
            tracing::warn!("Deck {} not found, trying next candidate", name);
        }

        Ok(db::list_decks(conn)?
            .into_iter()
            .next()
            .map(|deck| Self { name: deck.name }))
    }
}
