pub mod item_selector;
pub mod mastery;

pub use item_selector::{ItemWeight, calculate_all_weights, effective_weight, select_next};
pub use mastery::{AnswerOutcome, Transition, record_answer, record_answer_at};
