//! Orchestration of ingestion, indexing, and question answering per category.

mod initialization;
mod question;

pub use initialization::InitializationController;
pub use question::{ANSWER_FAILED_RESPONSE, Answer, INVALID_QUESTION_RESPONSE, QuestionController};
