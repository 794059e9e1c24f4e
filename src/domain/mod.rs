pub mod item;
pub mod review;

pub use item::{ItemError, Level, VocabularyItem, MAX_FREQUENCY_MULTIPLIER, MIN_FREQUENCY_MULTIPLIER};
pub use review::Direction;
