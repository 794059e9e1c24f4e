pub mod decks;
pub mod items;
pub mod schema;
pub mod sessions;
pub mod stats;

use rusqlite::{Connection, Result};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// Re-export all public items from submodules
pub use decks::*;
pub use items::*;
pub use schema::run_migrations;
pub use sessions::*;
pub use stats::*;

pub type DbPool = Arc<Mutex<Connection>>;

/// Name of the starter deck created by `seed_example_deck`
pub const EXAMPLE_DECK: &str = "English";

/// Extension trait for logging errors before discarding them
pub trait LogOnError<T> {
    /// Log the error at warn level and return None
    fn log_warn(self, context: &str) -> Option<T>;
    /// Log the error at warn level and return the default
    fn log_warn_default(self, context: &str) -> T
    where
        T: Default;
}

impl<T, E: std::fmt::Display> LogOnError<T> for std::result::Result<T, E> {
    fn log_warn(self, context: &str) -> Option<T> {
        match self {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("{}: {}", context, e);
                None
            }
        }
    }

    fn log_warn_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("{}: {}", context, e);
                T::default()
            }
        }
    }
}

/// Error returned when database lock cannot be acquired
#[derive(Debug)]
pub struct DbLockError;

impl std::fmt::Display for DbLockError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "Database unavailable")
  }
}

impl std::error::Error for DbLockError {}

/// Try to acquire the database lock, returning an error if poisoned
pub fn try_lock(pool: &DbPool) -> std::result::Result<MutexGuard<'_, Connection>, DbLockError> {
  pool.lock().map_err(|_: PoisonError<_>| {
    tracing::error!("Database mutex poisoned - a thread panicked while holding the lock");
    DbLockError
  })
}

pub fn init_db(path: &Path) -> Result<DbPool> {
  if let Some(parent) = path.parent() {
    if let Err(e) = std::fs::create_dir_all(parent) {
      tracing::warn!("Could not create database directory {}: {}", parent.display(), e);
    }
  }

  let conn = Connection::open(path)?;
  run_migrations(&conn)?;
  tracing::debug!("Database ready at {}", path.display());
  Ok(Arc::new(Mutex::new(conn)))
}

/// Create the English starter deck with twenty basic word pairs.
///
/// Does nothing if the deck already has items.
pub fn seed_example_deck(conn: &Connection) -> Result<usize> {
  create_deck(conn, EXAMPLE_DECK)?;
  if count_items(conn, EXAMPLE_DECK)? > 0 {
    return Ok(0);
  }

  let pairs = [
    ("Hallo", "hello"),
    ("Tschüss", "goodbye"),
    ("Danke", "thank you"),
    ("Bitte", "please"),
    ("Entschuldigung", "excuse me"),
    ("Familie", "family"),
    ("Mutter", "mother"),
    ("Vater", "father"),
    ("Haus", "house"),
    ("Wasser", "water"),
    ("Brot", "bread"),
    ("Apfel", "apple"),
    ("rot", "red"),
    ("blau", "blue"),
    ("grün", "green"),
    ("Hund", "dog"),
    ("Katze", "cat"),
    ("Schule", "school"),
    ("Buch", "book"),
    ("Zeit", "time"),
  ];

  for (prompt, answer) in pairs {
    conn.create_item(prompt, answer, EXAMPLE_DECK)?;
  }
  tracing::info!("Seeded {} items into deck {}", pairs.len(), EXAMPLE_DECK);
  Ok(pairs.len())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::TestEnv;

  #[test]
  fn test_seed_example_deck_once() {
    let env = TestEnv::new().unwrap();

    assert_eq!(seed_example_deck(&env.conn).unwrap(), 20);
    assert_eq!(seed_example_deck(&env.conn).unwrap(), 0);
    assert_eq!(count_items(&env.conn, EXAMPLE_DECK).unwrap(), 20);
  }

  #[test]
  fn test_init_db_creates_parent_dir() {
    let env = TestEnv::new().unwrap();
    let path = env.path().join("nested").join("vocab.db");

    let pool = init_db(&path).unwrap();
    assert!(path.exists());

    let conn = try_lock(&pool).unwrap();
    assert!(list_decks(&conn).unwrap().is_empty());
  }

  #[test]
  fn test_log_warn_default() {
    let failed: std::result::Result<i64, DbLockError> = Err(DbLockError);
    assert_eq!(failed.log_warn_default("lock"), 0);

    let ok: std::result::Result<i64, DbLockError> = Ok(3);
    assert_eq!(ok.log_warn("lock"), Some(3));
  }
}
